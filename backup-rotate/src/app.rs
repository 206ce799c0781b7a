use backup_core::{api::VscaleClient, config::AppConfig, error::Result};
use std::path::Path;

use crate::cli::Commands;
use crate::commands;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct CliApp {
    pub config: AppConfig,
    pub client: VscaleClient,
}

impl CliApp {
    /// 加载配置并创建 API 客户端
    ///
    /// 配置错误在这里返回，此时尚未发起任何API请求。
    pub fn new<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config = AppConfig::load(config_path)?;
        debug!(?config, "配置加载完成");

        let client = VscaleClient::from_config(&config)?;

        Ok(Self { config, client })
    }

    /// 运行应用命令
    pub async fn run_command(&self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Run { dry_run } => {
                if dry_run {
                    info!("🔍 试运行：只输出轮换计划");
                } else {
                    info!("🔄 开始备份轮换...");
                }
                commands::run_rotation(self, dry_run).await
            }
            Commands::List => commands::run_list(self).await,
            Commands::ShowBackup { backup_id } => commands::run_show_backup(self, &backup_id).await,
        }
    }
}
