use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

/// 服务端分配的服务器标识（scalet ctid）
pub type ServerId = u64;

/// 服务器信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    #[serde(rename = "ctid")]
    pub id: ServerId,
    pub name: String,
}

/// 备份信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backup {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub name: String,
    /// 所属服务器，服务器被删除后可能为空
    #[serde(rename = "scalet", default)]
    pub server_id: Option<ServerId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
}

/// 创建备份接口的响应
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackupHandle {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// 备份 ID 对调用方不透明，服务端可能返回字符串或数字
fn opaque_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

/// 远程备份服务
///
/// 所有请求使用启动时提供的令牌认证；失败时返回的错误需要带上状态码、
/// 响应头和响应体（见 [`crate::error::RemoteError`]）。
#[async_trait]
pub trait BackupProvider: Send + Sync {
    async fn list_servers(&self) -> Result<Vec<Server>>;

    async fn list_backups(&self) -> Result<Vec<Backup>>;

    async fn create_backup(&self, server_id: ServerId, name: &str) -> Result<BackupHandle>;

    async fn delete_backup(&self, backup_id: &str) -> Result<()>;

    /// 在备份列表中查找指定备份
    async fn find_backup(&self, backup_id: &str) -> Result<Option<Backup>> {
        let backups = self.list_backups().await?;
        Ok(backups.into_iter().find(|backup| backup.id == backup_id))
    }
}
