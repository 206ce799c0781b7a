use backup_rotate::{Cli, CliApp, setup_logging};
use clap::Parser;
use tracing::error;

#[tokio::main]
async fn main() {
    // 解析命令行参数
    let cli = Cli::parse();

    // 设置日志记录，文件日志的 guard 需要存活到进程结束
    let log_guard = setup_logging(cli.verbose);

    // 配置错误在发起任何API请求之前终止
    let app = match CliApp::new(&cli.config) {
        Ok(app) => app,
        Err(e) => {
            error!("❌ 应用初始化失败: {}", e);
            error!("👉 请检查配置文件 '{}' 或 VSCALE__* 环境变量", cli.config.display());
            drop(log_guard);
            std::process::exit(1);
        }
    };

    if let Err(e) = app.run_command(cli.resolved_command()).await {
        error!("❌ 操作失败: {:#}", e);
        drop(log_guard);
        std::process::exit(1);
    }
}
