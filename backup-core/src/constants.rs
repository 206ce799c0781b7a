/// Vscale API 相关常量
pub mod api {
    /// 默认API服务器地址
    pub const DEFAULT_BASE_URL: &str = "https://api.vscale.io";

    /// 认证请求头名称
    pub const TOKEN_HEADER: &str = "X-Token";

    /// HTTP请求超时时间（秒）
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// API端点路径
    pub mod endpoints {
        /// 服务器（scalet）列表
        pub const SERVERS: &str = "/v1/scalets";

        /// 备份列表
        pub const BACKUPS: &str = "/v1/backups";

        /// 为指定服务器创建备份（包含占位符）
        pub const SERVER_BACKUP: &str = "/v1/scalets/{server_id}/backup";

        /// 指定备份（包含占位符）
        pub const BACKUP: &str = "/v1/backups/{backup_id}";
    }
}

/// 备份轮换相关常量
pub mod rotation {
    /// 备份有效期（小时）
    pub const DEFAULT_TTL_HOURS: u64 = 24;

    /// 备份有效期上限（小时），约 10 年
    pub const MAX_TTL_HOURS: u64 = 87_600;

    /// 创建备份前的等待时间（秒）
    /// 服务端对创建服务器和备份的接口限制为每分钟 12 次请求
    pub const DEFAULT_CREATE_DELAY_SECS: u64 = 6;

    /// 删除备份前的等待时间（秒）
    pub const DEFAULT_DELETE_DELAY_SECS: u64 = 0;
}

/// 备份命名约定常量
pub mod naming {
    /// 自动备份标记（匹配时不区分大小写）
    pub const AUTO_MARKER: &str = "_auto_";

    /// 生成备份名称时使用的中缀
    pub const AUTO_BACKUP_INFIX: &str = "_auto_backup_";

    /// 时间戳分隔符，时间戳位于最后一个分隔符之后
    pub const TIMESTAMP_SEPARATOR: char = '_';
}

/// 配置相关常量
pub mod config {
    /// 默认配置文件名
    pub const CONFIG_FILE_NAME: &str = "config.yml";

    /// 环境变量前缀
    pub const ENV_PREFIX: &str = "VSCALE";

    /// 环境变量层级分隔符
    pub const ENV_SEPARATOR: &str = "__";
}

/// 日志相关常量
pub mod logging {
    /// 设置后日志输出到该文件而非终端
    pub const LOG_FILE_ENV: &str = "VSCALE_BACKUP_LOG_FILE";
}
