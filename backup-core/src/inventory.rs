//! 备份清单对账
//!
//! 每次运行都从服务端的服务器列表和备份列表重新构建清单：只保留配置中列出
//! 名称的服务器，并把符合自动备份命名约定的备份挂到所属服务器上。手动备份、
//! 不属于受管服务器的备份、时间戳无法解析的备份都会被跳过，这是正常情况。

use crate::expiry::RetentionPolicy;
use crate::naming;
use crate::provider::{Backup, Server, ServerId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// 已分类的自动备份
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub is_expired: bool,
}

/// 受管服务器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedServer {
    pub id: ServerId,
    pub name: String,
    /// 按服务端列表顺序排列
    pub backups: Vec<BackupRecord>,
}

impl TrackedServer {
    pub fn new(id: ServerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            backups: Vec::new(),
        }
    }

    pub fn active_backups(&self) -> impl Iterator<Item = &BackupRecord> {
        self.backups.iter().filter(|backup| !backup.is_expired)
    }

    pub fn expired_backups(&self) -> impl Iterator<Item = &BackupRecord> {
        self.backups.iter().filter(|backup| backup.is_expired)
    }

    pub fn has_active_backup(&self) -> bool {
        self.active_backups().next().is_some()
    }
}

/// 受管服务器清单，保持服务端列表顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    servers: Vec<TrackedServer>,
    index: HashMap<ServerId, usize>,
}

impl Inventory {
    /// 根据服务端快照构建清单
    pub fn reconcile(
        tracked_names: &[String],
        servers: &[Server],
        backups: &[Backup],
        policy: &RetentionPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        let mut inventory = Self::default();

        for server in servers {
            if !tracked_names.iter().any(|name| name == &server.name) {
                continue;
            }
            inventory.insert(TrackedServer::new(server.id, server.name.clone()));
        }

        for backup in backups {
            if let Some((server_id, record)) = classify_backup(&inventory, backup, policy, now) {
                if let Some(&position) = inventory.index.get(&server_id) {
                    inventory.servers[position].backups.push(record);
                }
            }
        }

        inventory
    }

    /// 重复的服务器 ID 以后出现的为准，位置保持首次出现的位置
    fn insert(&mut self, server: TrackedServer) {
        match self.index.get(&server.id) {
            Some(&position) => self.servers[position] = server,
            None => {
                self.index.insert(server.id, self.servers.len());
                self.servers.push(server);
            }
        }
    }

    pub fn get(&self, id: ServerId) -> Option<&TrackedServer> {
        self.index.get(&id).map(|&position| &self.servers[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedServer> {
        self.servers.iter()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

fn classify_backup(
    inventory: &Inventory,
    backup: &Backup,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Option<(ServerId, BackupRecord)> {
    if !naming::is_auto_backup(&backup.name) {
        return None;
    }

    let server_id = backup.server_id?;
    if inventory.get(server_id).is_none() {
        return None;
    }

    let Some(created_at) = naming::parse_timestamp(&backup.name) else {
        debug!(backup = %backup.name, "无法解析备份时间戳，跳过");
        return None;
    };

    Some((
        server_id,
        BackupRecord {
            id: backup.id.clone(),
            name: backup.name.clone(),
            created_at,
            is_expired: policy.is_expired(created_at, now),
        },
    ))
}
