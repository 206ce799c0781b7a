use crate::constants::{api, config, rotation};
use crate::error::{BackupError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 应用配置结构
#[derive(Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Vscale API 令牌
    #[serde(default)]
    pub token: String,
    /// 需要自动备份的服务器名称（有序）
    #[serde(default)]
    pub servers: Vec<String>,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub rotation: RotationConfig,
}

/// API 相关配置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// 备份轮换相关配置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RotationConfig {
    /// 备份有效期（小时）
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
    /// 每次创建备份前的等待时间（秒）
    #[serde(default = "default_create_delay_secs")]
    pub create_delay_secs: u64,
    /// 每次删除备份前的等待时间（秒）
    #[serde(default = "default_delete_delay_secs")]
    pub delete_delay_secs: u64,
}

fn default_base_url() -> String {
    api::DEFAULT_BASE_URL.to_string()
}

fn default_ttl_hours() -> u64 {
    rotation::DEFAULT_TTL_HOURS
}

fn default_create_delay_secs() -> u64 {
    rotation::DEFAULT_CREATE_DELAY_SECS
}

fn default_delete_delay_secs() -> u64 {
    rotation::DEFAULT_DELETE_DELAY_SECS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
            create_delay_secs: default_create_delay_secs(),
            delete_delay_secs: default_delete_delay_secs(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            servers: Vec::new(),
            api: ApiConfig::default(),
            rotation: RotationConfig::default(),
        }
    }
}

// 令牌不出现在日志中
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("token", &if self.token.is_empty() { "" } else { "***" })
            .field("servers", &self.servers)
            .field("api", &self.api)
            .field("rotation", &self.rotation)
            .finish()
    }
}

impl AppConfig {
    /// 加载配置：配置文件 + 进程环境变量覆盖，并进行校验
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_env(path, std::env::vars())
    }

    /// 加载配置，环境变量由调用方提供
    ///
    /// 配置文件不存在时使用默认值，只要环境变量提供了令牌和服务器列表即可运行。
    pub fn load_with_env<P, I>(path: P, vars: I) -> Result<Self>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = (String, String)>,
    {
        let path = path.as_ref();
        let mut config = if path.exists() {
            tracing::debug!("读取配置文件: {}", path.display());
            Self::load_from_file(path)?
        } else {
            tracing::warn!("未找到配置文件 {}，仅使用环境变量", path.display());
            Self::default()
        };

        config.apply_env_overrides(vars)?;
        config.validate()?;
        Ok(config)
    }

    /// 从指定文件加载配置（不做校验）
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// 应用环境变量覆盖
    ///
    /// 变量名形如 `VSCALE__ROTATION__TTL_HOURS`，`__` 分隔配置层级。
    pub fn apply_env_overrides<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix = format!("{}{}", config::ENV_PREFIX, config::ENV_SEPARATOR);

        for (key, value) in vars {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            let lowered: Vec<String> = rest
                .split(config::ENV_SEPARATOR)
                .map(|s| s.to_ascii_lowercase())
                .collect();
            let segments: Vec<&str> = lowered.iter().map(String::as_str).collect();

            match segments.as_slice() {
                ["token"] => self.token = value.trim().to_string(),
                ["servers"] => {
                    self.servers = value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                ["api", "base_url"] => self.api.base_url = value.trim().to_string(),
                ["rotation", "ttl_hours"] => {
                    self.rotation.ttl_hours = parse_number(&key, &value)?;
                }
                ["rotation", "create_delay_secs"] => {
                    self.rotation.create_delay_secs = parse_number(&key, &value)?;
                }
                ["rotation", "delete_delay_secs"] => {
                    self.rotation.delete_delay_secs = parse_number(&key, &value)?;
                }
                _ => {
                    tracing::debug!("忽略未知的环境变量: {}", key);
                    continue;
                }
            }
            tracing::debug!("环境变量覆盖配置: {}", key);
        }
        Ok(())
    }

    /// 校验配置，失败时在发起任何API请求之前终止
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(BackupError::config(
                "缺少 API 令牌，请在配置文件中设置 token 或设置环境变量 VSCALE__TOKEN",
            ));
        }
        if self.rotation.ttl_hours == 0 {
            return Err(BackupError::config("rotation.ttl_hours 必须大于 0"));
        }
        if self.rotation.ttl_hours > rotation::MAX_TTL_HOURS {
            return Err(BackupError::config(format!(
                "rotation.ttl_hours 不能超过 {}（当前值: {}）",
                rotation::MAX_TTL_HOURS,
                self.rotation.ttl_hours
            )));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(BackupError::config("api.base_url 不能为空"));
        }
        if self.servers.is_empty() {
            tracing::warn!("配置中没有需要备份的服务器，本次运行不会执行任何操作");
        }
        Ok(())
    }

    /// 备份有效期，超出上限的值按上限计算
    pub fn ttl(&self) -> chrono::Duration {
        let hours = self.rotation.ttl_hours.min(rotation::MAX_TTL_HOURS);
        i64::try_from(hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or(chrono::Duration::MAX)
    }

    pub fn create_delay(&self) -> Duration {
        Duration::from_secs(self.rotation.create_delay_secs)
    }

    pub fn delete_delay(&self) -> Duration {
        Duration::from_secs(self.rotation.delete_delay_secs)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| BackupError::config(format!("环境变量 {key} 的值无效 \"{value}\": {e}")))
}
