use backup_core::constants::logging;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

/// # 日志配置
///
/// 库代码（backup-core）只使用 `tracing` 宏，日志输出由这里统一配置。
///
/// - `-v, --verbose`：启用 DEBUG 级别
/// - `RUST_LOG`：标准的日志级别控制，优先于 `--verbose`
/// - `VSCALE_BACKUP_LOG_FILE`：日志文件路径，设置后日志写入文件而非终端
///
/// ```bash
/// # 详细日志输出到终端
/// backup-rotate -v run
///
/// # 日志输出到文件（适合 cron 定时运行）
/// VSCALE_BACKUP_LOG_FILE=/var/log/vscale-backup.log backup-rotate run
/// ```
///
/// 写入文件时返回的 [`WorkerGuard`] 需要保持到进程结束，否则缓冲中的日志会丢失。
pub fn setup_logging(verbose: bool) -> Option<WorkerGuard> {
    use tracing_subscriber::{EnvFilter, fmt};

    // 根据verbose参数和环境变量确定日志级别
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if let Ok(log_file) = std::env::var(logging::LOG_FILE_ENV) {
        let path = Path::new(&log_file);
        let directory = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = path.file_name().unwrap_or(path.as_os_str());

        let appender = tracing_appender::rolling::never(directory, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        // 输出到文件 - 使用详细格式便于排查
        fmt()
            .with_env_filter(env_filter)
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_line_number(true)
            .init();
        Some(guard)
    } else {
        // 输出到终端 - 使用简洁格式
        fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_line_number(false)
            .without_time()
            .compact()
            .init();
        None
    }
}
