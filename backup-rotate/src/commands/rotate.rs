use crate::app::CliApp;
use anyhow::{Context, Result};
use backup_core::expiry::RetentionPolicy;
use backup_core::pacing::{SystemClock, TokioPacer};
use backup_core::rotation::{BackupRotator, RotationPlan, RotationSettings};
use tracing::{info, instrument, warn};

/// 执行一次备份轮换：拉取 -> 对账 -> 创建 -> 删除
///
/// 单台服务器的失败已经在轮换过程中记录，这里只在列表拉取等致命错误时返回错误。
#[instrument(skip(app))]
pub async fn run_rotation(app: &CliApp, dry_run: bool) -> Result<()> {
    let clock = SystemClock;
    let pacer = TokioPacer;
    let rotator = BackupRotator::new(
        &app.client,
        &clock,
        &pacer,
        RotationSettings::from(&app.config),
    );
    let policy = RetentionPolicy::new(app.config.ttl());

    if dry_run {
        let inventory = rotator
            .fetch_inventory(&app.config.servers, &policy)
            .await
            .context("获取服务器和备份列表失败")?;
        RotationPlan::from_inventory(&inventory).log();
        return Ok(());
    }

    let report = rotator
        .run(&app.config.servers, &policy)
        .await
        .context("备份轮换失败")?;

    if report.has_failures() {
        warn!("⚠️  备份轮换完成（部分失败）: {}", report);
    } else {
        info!("✅ 备份轮换完成: {}", report);
    }
    Ok(())
}
