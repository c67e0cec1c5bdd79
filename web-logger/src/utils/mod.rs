//! 工具模块
//!
//! - logger: tracing 订阅器初始化
//! - time_utils: 时钟抽象与时间格式化
//! - page_source: 从导航路径推导来源页面
//! - user_agent: 从 User-Agent 推导设备描述

pub mod logger;
pub mod page_source;
pub mod time_utils;
pub mod user_agent;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// 获取锁,忽略中毒状态
///
/// 日志调用绝不能因为别处的panic而再次panic,
/// 缓冲区内容在任意时刻都是结构完整的。
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// JSON值的真值: `null`、`false`、`0`、空串为假,其余为真
///
/// 会话数据与错误载荷都由网页脚本写入,字段类型并不可靠。
pub(crate) fn is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
