use reqwest::header::HeaderMap;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BackupError>;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("配置文件解析失败: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP 请求错误: {0}")]
    Http(#[from] reqwest::Error),

    #[error("序列化错误: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Remote(#[from] RemoteError),

    #[error("[{server}] 创建备份失败: \"{backup_name}\": {source}")]
    CreateBackup {
        server: String,
        backup_name: String,
        #[source]
        source: Box<BackupError>,
    },

    #[error("[{server}] 删除备份失败: \"{backup_name}\" ({backup_id}): {source}")]
    DeleteBackup {
        server: String,
        backup_name: String,
        backup_id: String,
        #[source]
        source: Box<BackupError>,
    },
}

impl BackupError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// 如果错误来自服务端响应，返回其 HTTP 状态码
    pub fn remote_status(&self) -> Option<u16> {
        match self {
            Self::Remote(remote) => Some(remote.status),
            Self::CreateBackup { source, .. } | Self::DeleteBackup { source, .. } => {
                source.remote_status()
            }
            _ => None,
        }
    }
}

/// 服务端返回的非成功响应
///
/// 保留状态码、响应头和响应体，便于在上层错误中附带完整上下文。
#[derive(Debug, Clone)]
pub struct RemoteError {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API请求失败: {} {} -> {} {}",
            self.method, self.url, self.status, self.status_text
        )?;
        if !self.body.is_empty() {
            write!(f, " - {}", self.body)?;
        }
        Ok(())
    }
}

impl std::error::Error for RemoteError {}
