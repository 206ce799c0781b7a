//! 自动备份命名约定
//!
//! 自动备份的名称格式为 `<服务器名>_auto_backup_<ISO8601 时间戳>`，例如
//! `web1_auto_backup_2023-01-01T00:00:00.000Z`。
//!
//! - 名称中包含 `_auto_`（不区分大小写）即视为自动备份，其余为手动备份；
//! - 创建时间取最后一个 `_` 之后的部分；
//! - 时间戳无法解析的备份不属于本工具管理，解析函数返回 `None` 而不是报错。

use crate::constants::naming;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use std::sync::LazyLock;

static AUTO_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i){}", regex::escape(naming::AUTO_MARKER)))
        .expect("自动备份标记正则无效")
});

/// 名称是否带有自动备份标记
pub fn is_auto_backup(name: &str) -> bool {
    AUTO_MARKER_RE.is_match(name)
}

/// 从备份名称中提取创建时间
pub fn parse_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let (head, tail) = name.rsplit_once(naming::TIMESTAMP_SEPARATOR)?;
    if head.is_empty() || tail.is_empty() {
        return None;
    }
    parse_iso8601(tail)
}

/// 解析 ISO8601 时间
///
/// 依次尝试：带时区的 RFC3339、不带时区的日期时间（按 UTC）、纯日期（按 UTC 零点）。
pub fn parse_iso8601(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// 生成新的自动备份名称
pub fn auto_backup_name(server_name: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}{}{}",
        server_name,
        naming::AUTO_BACKUP_INFIX,
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_marker_is_case_insensitive() {
        assert!(is_auto_backup("web1_auto_backup_2023-01-01T00:00:00Z"));
        assert!(is_auto_backup("web1_AUTO_backup_2023-01-01T00:00:00Z"));
        assert!(!is_auto_backup("web1_manual_2023-01-01T00:00:00Z"));
        assert!(!is_auto_backup("web1-auto-backup"));
    }

    #[test]
    fn test_timestamp_after_last_underscore() {
        let parsed = parse_timestamp("my_web_server_auto_backup_2023-01-01T00:00:00Z");
        assert_eq!(parsed, Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_timestamp_with_offset_and_millis() {
        let parsed = parse_timestamp("web1_auto_backup_2023-01-01T03:00:00.250+03:00").unwrap();
        assert_eq!(
            parsed,
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::milliseconds(250)
        );
    }

    #[test]
    fn test_timestamp_without_zone_is_utc() {
        assert_eq!(
            parse_timestamp("web1_auto_backup_2023-06-01T12:30:00"),
            Some(Utc.with_ymd_and_hms(2023, 6, 1, 12, 30, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("web1_auto_backup_2023-06-01"),
            Some(Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_unparsable_timestamp_is_none() {
        assert_eq!(parse_timestamp("web1_auto_backup_yesterday"), None);
        assert_eq!(parse_timestamp("web1_auto_backup_"), None);
        assert_eq!(parse_timestamp("_2023-01-01T00:00:00Z"), None);
        assert_eq!(parse_timestamp("no-separator"), None);
    }

    #[test]
    fn test_generated_name_follows_convention() {
        let now = Utc.with_ymd_and_hms(2023, 1, 3, 0, 0, 0).unwrap();
        let name = auto_backup_name("web1", now);
        assert_eq!(name, "web1_auto_backup_2023-01-03T00:00:00.000Z");
        assert!(is_auto_backup(&name));
        assert_eq!(parse_timestamp(&name), Some(now));
    }
}
