use crate::app::CliApp;
use anyhow::{Context, Result, bail};
use backup_core::expiry::RetentionPolicy;
use backup_core::naming;
use backup_core::provider::BackupProvider;
use tracing::info;

/// 显示指定备份的信息
pub async fn run_show_backup(app: &CliApp, backup_id: &str) -> Result<()> {
    let Some(backup) = app
        .client
        .find_backup(backup_id)
        .await
        .context("获取备份列表失败")?
    else {
        bail!("备份不存在: {backup_id}");
    };

    info!("📦 备份信息");
    info!("   ID:       {}", backup.id);
    info!("   名称:     {}", backup.name);
    info!(
        "   服务器:   {}",
        backup
            .server_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    info!("   状态:     {}", backup.status.as_deref().unwrap_or("-"));
    info!("   创建时间: {}", backup.created.as_deref().unwrap_or("-"));

    let managed = naming::is_auto_backup(&backup.name);
    info!(
        "   类型:     {}",
        if managed { "自动备份" } else { "手动备份" }
    );
    if managed {
        match naming::parse_timestamp(&backup.name) {
            Some(created_at) => {
                let policy = RetentionPolicy::new(app.config.ttl());
                let expired = policy.is_expired(created_at, chrono::Utc::now());
                match created_at.checked_add_signed(policy.ttl()) {
                    Some(expires_at) => info!(
                        "   过期时间: {}{}",
                        expires_at.format("%Y-%m-%d %H:%M:%S UTC"),
                        if expired { " (已过期)" } else { "" }
                    ),
                    None => info!("   过期时间: 超出可表示范围"),
                }
            }
            None => info!("   过期时间: 无法从名称解析时间戳，不参与轮换"),
        }
    }

    Ok(())
}
