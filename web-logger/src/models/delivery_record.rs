//! 投递记录模型
//!
//! 收集端 `POST {api_base}/logs` 的线上格式。字段名与后端 `AppLogEntry` 对齐,
//! 因此使用 camelCase 并保留历史字段名 (`bguUsername`、`userFullName`)。

use serde::{Deserialize, Serialize};

use crate::models::{LogEntry, LogLevel, UserRole};
use crate::utils::time_utils::to_epoch_millis;

/// 线上 `source` 字段的固定值
pub const WIRE_SOURCE: &str = "WEB";

/// 入队时刻解析出的增强字段
///
/// 在准入时解析而不是在条目创建时解析:
/// 登录在部分条目缓冲之后才完成时,后续入队的记录能带上新身份。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub user_id: Option<String>,
    pub user_display_name: Option<String>,
    pub user_role: UserRole,
    pub device_descriptor: String,
    pub client_version: String,
}

/// 投递记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRecord {
    /// 毫秒级Unix时间戳
    pub timestamp: i64,
    pub level: LogLevel,
    pub tag: String,
    pub message: String,
    /// 恒为 `WEB`
    pub source: String,
    #[serde(rename = "bguUsername")]
    pub user_id: Option<String>,
    #[serde(rename = "userFullName")]
    pub user_display_name: Option<String>,
    pub user_role: UserRole,
    #[serde(rename = "deviceInfo")]
    pub device_descriptor: String,
    #[serde(rename = "appVersion")]
    pub client_version: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub exception_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stack_trace: Option<String>,
}

impl DeliveryRecord {
    /// 把条目投影为线上格式
    ///
    /// `message` 已由调用方截断; 这里只负责字段映射与故障提取。
    pub fn from_entry(entry: &LogEntry, message: String, enrichment: Enrichment) -> Self {
        let (exception_type, stack_trace) = match entry.fault_details() {
            Some((kind, stack)) => (Some(kind), Some(stack)),
            None => (None, None),
        };

        Self {
            timestamp: to_epoch_millis(entry.timestamp),
            level: entry.level,
            tag: entry.tag.clone(),
            message,
            source: WIRE_SOURCE.to_string(),
            user_id: enrichment.user_id,
            user_display_name: enrichment.user_display_name,
            user_role: enrichment.user_role,
            device_descriptor: enrichment.device_descriptor,
            client_version: enrichment.client_version,
            exception_type,
            stack_trace,
        }
    }
}

/// 一次投递请求的请求体 `{ "logs": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogBatch {
    pub logs: Vec<DeliveryRecord>,
}

impl LogBatch {
    pub fn new(logs: Vec<DeliveryRecord>) -> Self {
        Self { logs }
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}
