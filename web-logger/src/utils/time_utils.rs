use chrono::{DateTime, Utc};
use std::sync::Mutex;

use crate::utils::lock_unpoisoned;

/// 时钟
///
/// 条目时间戳的唯一来源。以trait注入,测试可以固定时间。
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统墙钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 手动推进的时钟 (测试用)
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// 向前推进指定时长
    pub fn advance(&self, by: chrono::Duration) {
        let mut now = lock_unpoisoned(&self.now);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *lock_unpoisoned(&self.now)
    }
}

/// 毫秒级Unix时间戳
///
/// 例: 2023-11-14T22:13:20.123Z → 1700000000123
pub fn to_epoch_millis(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// 控制台前缀使用的时刻 `HH:MM:SS`
pub fn format_console_time(dt: DateTime<Utc>) -> String {
    dt.format("%H:%M:%S").to_string()
}
