use backup_core::constants::config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Vscale 自动备份轮换工具
///
/// 为配置中的每台服务器保留一个有效期内的自动备份，并删除过期的自动备份。
/// 手动创建的备份不受影响。
#[derive(Parser, Debug)]
#[command(name = "backup-rotate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = config::CONFIG_FILE_NAME, env = "VSCALE_BACKUP_CONFIG")]
    pub config: PathBuf,

    /// 详细输出
    #[arg(short, long)]
    pub verbose: bool,

    /// 未指定命令时执行一次备份轮换
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// 执行一次备份轮换：按需创建新备份，然后删除过期备份
    Run {
        /// 只输出计划，不创建也不删除任何备份
        #[arg(long)]
        dry_run: bool,
    },
    /// 列出受管服务器及其自动备份
    List,
    /// 显示指定备份的信息
    ShowBackup {
        /// 备份 ID
        backup_id: String,
    },
}

impl Cli {
    pub fn resolved_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Run { dry_run: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::parse_from(["backup-rotate"]);
        assert_eq!(cli.resolved_command(), Commands::Run { dry_run: false });
        assert_eq!(cli.config, PathBuf::from("config.yml"));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_parse_dry_run_with_config() {
        let cli = Cli::parse_from(["backup-rotate", "-v", "-c", "/etc/vscale.yml", "run", "--dry-run"]);
        assert_eq!(cli.resolved_command(), Commands::Run { dry_run: true });
        assert_eq!(cli.config, PathBuf::from("/etc/vscale.yml"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_parse_show_backup() {
        let cli = Cli::parse_from(["backup-rotate", "show-backup", "b-123"]);
        assert_eq!(
            cli.resolved_command(),
            Commands::ShowBackup {
                backup_id: "b-123".to_string()
            }
        );
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
