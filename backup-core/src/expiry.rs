use crate::constants::rotation;
use chrono::{DateTime, Duration, Utc};

/// 备份保留策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    ttl: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(Duration::hours(rotation::DEFAULT_TTL_HOURS as i64))
    }
}

impl RetentionPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_expired(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        is_expired(created_at, now, self.ttl)
    }
}

/// 备份是否已过期
///
/// 严格不等式：创建时间恰好为 `now - ttl` 的备份仍然有效。
/// 截止时间超出可表示范围时视为未过期。
pub fn is_expired(created_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now.checked_sub_signed(ttl)
        .is_some_and(|cutoff| cutoff > created_at)
}
