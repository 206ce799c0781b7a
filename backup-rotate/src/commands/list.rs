use crate::app::CliApp;
use anyhow::{Context, Result};
use backup_core::expiry::RetentionPolicy;
use backup_core::pacing::SystemClock;
use backup_core::rotation::fetch_inventory;
use tracing::info;

/// 列出受管服务器及其自动备份
pub async fn run_list(app: &CliApp) -> Result<()> {
    let policy = RetentionPolicy::new(app.config.ttl());

    let inventory = fetch_inventory(&app.client, &SystemClock, &app.config.servers, &policy)
        .await
        .context("获取服务器和备份列表失败")?;

    if inventory.is_empty() {
        info!("📦 没有找到受管服务器");
        info!("💡 请检查配置中的 servers 列表是否与服务端的服务器名称一致");
        return Ok(());
    }

    info!("📦 自动备份列表 (有效期 {} 小时)", app.config.rotation.ttl_hours);
    info!("============");
    info!("{:<36} {:<26} {:<6} {}", "ID", "创建时间", "状态", "名称");
    info!("{}", "-".repeat(100));

    for server in inventory.iter() {
        info!("🖥️  {} (ctid {})", server.name, server.id);
        if server.backups.is_empty() {
            info!("   暂无自动备份");
            continue;
        }
        for backup in &server.backups {
            let state = if backup.is_expired { "过期" } else { "有效" };
            info!(
                "{:<36} {:<26} {:<6} {}",
                backup.id,
                backup.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                state,
                backup.name
            );
        }
    }

    Ok(())
}
