//! 备份轮换
//!
//! 一次运行分两步：先对每台受管服务器决定是否需要新建备份（创建阶段），
//! 再删除所有过期的自动备份（删除阶段）。创建阶段全部完成后才开始删除，
//! 保证服务器在运行过程中不会出现没有备份的情况。
//!
//! 单台服务器或单个备份的失败只记录到 [`RotationReport`]，不会中断其余处理。

use crate::config::AppConfig;
use crate::error::{BackupError, Result};
use crate::expiry::RetentionPolicy;
use crate::inventory::{BackupRecord, Inventory, TrackedServer};
use crate::naming;
use crate::pacing::{Clock, Pacer};
use crate::provider::{BackupHandle, BackupProvider, ServerId};
use std::fmt;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// 创建阶段对单台服务器的决定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateDecision {
    /// 没有有效备份，需要新建
    Create,
    /// 已有未过期的备份
    Skip { active: Vec<String> },
}

/// 单台服务器的轮换计划
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerPlan {
    pub server_id: ServerId,
    pub server_name: String,
    pub create: CreateDecision,
    /// 需要删除的过期备份
    pub expired: Vec<BackupRecord>,
}

/// 整体轮换计划，服务器顺序与清单一致
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationPlan {
    pub servers: Vec<ServerPlan>,
}

impl RotationPlan {
    /// 根据清单生成计划
    pub fn from_inventory(inventory: &Inventory) -> Self {
        Self {
            servers: inventory.iter().map(plan_server).collect(),
        }
    }

    pub fn create_count(&self) -> usize {
        self.servers
            .iter()
            .filter(|server| server.create == CreateDecision::Create)
            .count()
    }

    pub fn delete_count(&self) -> usize {
        self.servers.iter().map(|server| server.expired.len()).sum()
    }

    /// 输出计划内容（不执行）
    pub fn log(&self) {
        for server in &self.servers {
            match &server.create {
                CreateDecision::Create => {
                    info!(server = %server.server_name, "[计划] 创建新备份");
                }
                CreateDecision::Skip { active } => {
                    info!(
                        server = %server.server_name,
                        active = ?active,
                        "[计划] 已有有效备份，跳过创建"
                    );
                }
            }
            for backup in &server.expired {
                info!(
                    server = %server.server_name,
                    backup = %backup.name,
                    backup_id = %backup.id,
                    "[计划] 删除过期备份"
                );
            }
        }
        info!(
            "[计划] 共创建 {} 个备份，删除 {} 个备份",
            self.create_count(),
            self.delete_count()
        );
    }
}

fn plan_server(server: &TrackedServer) -> ServerPlan {
    let active: Vec<String> = server
        .active_backups()
        .map(|backup| backup.name.clone())
        .collect();

    let create = if active.is_empty() {
        CreateDecision::Create
    } else {
        CreateDecision::Skip { active }
    };

    ServerPlan {
        server_id: server.id,
        server_name: server.name.clone(),
        create,
        expired: server.expired_backups().cloned().collect(),
    }
}

/// 轮换节奏设置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationSettings {
    /// 每次创建备份前的等待
    pub create_delay: Duration,
    /// 每次删除备份前的等待
    pub delete_delay: Duration,
}

impl From<&AppConfig> for RotationSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            create_delay: config.create_delay(),
            delete_delay: config.delete_delay(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedBackup {
    pub server: String,
    pub backup_name: String,
    pub handle: BackupHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedBackup {
    pub server: String,
    pub backup_id: String,
    pub backup_name: String,
}

/// 一次轮换的执行结果
#[derive(Debug, Default)]
pub struct RotationReport {
    pub created: Vec<CreatedBackup>,
    /// 因已有有效备份而跳过创建的服务器
    pub skipped: Vec<String>,
    pub deleted: Vec<DeletedBackup>,
    pub failures: Vec<BackupError>,
}

impl RotationReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl fmt::Display for RotationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "新建备份 {} 个，跳过 {} 台服务器，删除过期备份 {} 个，失败 {} 项",
            self.created.len(),
            self.skipped.len(),
            self.deleted.len(),
            self.failures.len()
        )
    }
}

/// 拉取服务器和备份列表并对账
///
/// 只读操作，不会创建或删除备份。列表请求失败属于致命错误，直接返回。
#[instrument(skip_all)]
pub async fn fetch_inventory(
    provider: &dyn BackupProvider,
    clock: &dyn Clock,
    tracked_names: &[String],
    policy: &RetentionPolicy,
) -> Result<Inventory> {
    let servers = provider.list_servers().await?;
    let backups = provider.list_backups().await?;
    let inventory = Inventory::reconcile(tracked_names, &servers, &backups, policy, clock.now());

    info!(
        "服务端共 {} 台服务器、{} 个备份，其中受管服务器 {} 台",
        servers.len(),
        backups.len(),
        inventory.len()
    );
    for name in tracked_names {
        if !inventory.iter().any(|server| &server.name == name) {
            warn!(server = %name, "配置中的服务器在服务端不存在");
        }
    }
    Ok(inventory)
}

/// 备份轮换执行器
pub struct BackupRotator<'a> {
    provider: &'a dyn BackupProvider,
    clock: &'a dyn Clock,
    pacer: &'a dyn Pacer,
    settings: RotationSettings,
}

impl<'a> BackupRotator<'a> {
    pub fn new(
        provider: &'a dyn BackupProvider,
        clock: &'a dyn Clock,
        pacer: &'a dyn Pacer,
        settings: RotationSettings,
    ) -> Self {
        Self {
            provider,
            clock,
            pacer,
            settings,
        }
    }

    /// 拉取服务器和备份列表并对账，见 [`fetch_inventory`]
    pub async fn fetch_inventory(
        &self,
        tracked_names: &[String],
        policy: &RetentionPolicy,
    ) -> Result<Inventory> {
        fetch_inventory(self.provider, self.clock, tracked_names, policy).await
    }

    /// 完整的一次轮换：拉取 -> 对账 -> 创建阶段 -> 删除阶段
    pub async fn run(
        &self,
        tracked_names: &[String],
        policy: &RetentionPolicy,
    ) -> Result<RotationReport> {
        let inventory = self.fetch_inventory(tracked_names, policy).await?;
        let plan = RotationPlan::from_inventory(&inventory);
        Ok(self.execute(&plan).await)
    }

    /// 执行计划，创建阶段完成后再进入删除阶段
    pub async fn execute(&self, plan: &RotationPlan) -> RotationReport {
        let mut report = RotationReport::default();
        self.create_pass(plan, &mut report).await;
        self.delete_pass(plan, &mut report).await;
        report
    }

    #[instrument(skip_all)]
    async fn create_pass(&self, plan: &RotationPlan, report: &mut RotationReport) {
        for server in &plan.servers {
            info!(server = %server.server_name, "[{}] 检查是否需要创建备份", server.server_name);

            if let CreateDecision::Skip { active } = &server.create {
                for name in active {
                    info!(server = %server.server_name, "[{}] 有效备份 \"{}\"", server.server_name, name);
                }
                info!(
                    server = %server.server_name,
                    "[{}] 仍有未过期的备份，无需创建",
                    server.server_name
                );
                report.skipped.push(server.server_name.clone());
                continue;
            }

            match self.create_for_server(server).await {
                Ok(created) => {
                    info!(
                        server = %server.server_name,
                        backup_id = %created.handle.id,
                        "[{}] 备份创建请求已提交: \"{}\"",
                        server.server_name,
                        created.backup_name
                    );
                    report.created.push(created);
                }
                Err(e) => {
                    error!(server = %server.server_name, error = %e, "创建备份失败");
                    report.failures.push(e);
                }
            }
        }
    }

    async fn create_for_server(&self, server: &ServerPlan) -> Result<CreatedBackup> {
        let backup_name = naming::auto_backup_name(&server.server_name, self.clock.now());

        // 创建备份接口限制为每分钟 12 次请求
        self.throttle(self.settings.create_delay).await;
        info!(
            server = %server.server_name,
            "[{}] 备份名称: \"{}\"",
            server.server_name,
            backup_name
        );

        match self
            .provider
            .create_backup(server.server_id, &backup_name)
            .await
        {
            Ok(handle) => Ok(CreatedBackup {
                server: server.server_name.clone(),
                backup_name,
                handle,
            }),
            Err(e) => Err(BackupError::CreateBackup {
                server: server.server_name.clone(),
                backup_name,
                source: Box::new(e),
            }),
        }
    }

    #[instrument(skip_all)]
    async fn delete_pass(&self, plan: &RotationPlan, report: &mut RotationReport) {
        for server in &plan.servers {
            info!(server = %server.server_name, "[{}] 删除过期备份", server.server_name);

            for backup in &server.expired {
                self.throttle(self.settings.delete_delay).await;
                info!(
                    server = %server.server_name,
                    backup_id = %backup.id,
                    "[{}] 删除备份 \"{}\"",
                    server.server_name,
                    backup.name
                );

                match self.provider.delete_backup(&backup.id).await {
                    Ok(()) => report.deleted.push(DeletedBackup {
                        server: server.server_name.clone(),
                        backup_id: backup.id.clone(),
                        backup_name: backup.name.clone(),
                    }),
                    Err(e) => {
                        let err = BackupError::DeleteBackup {
                            server: server.server_name.clone(),
                            backup_name: backup.name.clone(),
                            backup_id: backup.id.clone(),
                            source: Box::new(e),
                        };
                        error!(server = %server.server_name, error = %err, "删除备份失败");
                        report.failures.push(err);
                    }
                }
            }
        }
    }

    async fn throttle(&self, delay: Duration) {
        if !delay.is_zero() {
            self.pacer.pause(delay).await;
        }
    }
}
