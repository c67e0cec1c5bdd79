//! 日志条目模型
//!
//! 定义客户端日志事件的数据结构,创建后不可变。
//! 本地环形缓冲区与投递队列都以它为源头。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::is_truthy;

/// 日志级别
///
/// 全序: Debug < Info < Warn < Error,派生的 `Ord` 依赖变体声明顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// 线上格式的级别名称
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    /// 大小写不敏感, `WARNING` 视为 `WARN`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(format!("未知日志级别: {}", other)),
        }
    }
}

/// 捕获到的故障
///
/// 对应浏览器里的 `Error` 对象: 类型名、消息和调用栈。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fault {
    /// 故障类型名, 缺省时投递为 `Error`
    pub name: Option<String>,
    pub message: String,
    /// 调用栈文本, 缺省时投递为空串
    pub stack: Option<String>,
}

impl Fault {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// 从Rust错误捕获故障
    ///
    /// 类型名取自错误类型的末段路径; 调用栈由 `source()` 链拼接而成,
    /// 每层一行 `caused by: ...`。
    pub fn capture<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let type_name = std::any::type_name::<E>();
        let short = type_name.rsplit("::").next().unwrap_or(type_name);

        let mut lines = vec![err.to_string()];
        let mut source = err.source();
        while let Some(cause) = source {
            lines.push(format!("caused by: {}", cause));
            source = cause.source();
        }

        Self {
            name: Some(short.to_string()),
            message: err.to_string(),
            stack: Some(lines.join("\n")),
        }
    }
}

/// 条目附带的结构化载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryData {
    /// 捕获到的故障
    Fault(Fault),
    /// 任意JSON载荷
    Json(serde_json::Value),
}

impl EntryData {
    /// 把任意可序列化的值转为载荷
    ///
    /// 序列化失败时返回 `None`: 丢弃该字段,条目本身照常记录。
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Option<Self> {
        match serde_json::to_value(value) {
            Ok(json) => Some(EntryData::Json(json)),
            Err(e) => {
                tracing::warn!(error = %e, "日志载荷序列化失败,已丢弃该字段");
                None
            }
        }
    }

    /// 载荷的JSON表示,用于导出与控制台镜像
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            EntryData::Json(value) => value.clone(),
            EntryData::Fault(fault) => serde_json::json!({
                "name": fault.name,
                "message": fault.message,
                "stack": fault.stack,
            }),
        }
    }

    /// 提取异常类型与调用栈
    ///
    /// - `Fault`: 类型名缺省为 `Error`, 调用栈缺省为空串
    /// - JSON对象的 `stack` 字段为真值: 类型取 `exceptionType` 字段, 缺省为 `Error`
    /// - 其他载荷: 不是故障,返回 `None`
    pub fn fault_details(&self) -> Option<(String, String)> {
        match self {
            EntryData::Fault(fault) => Some((
                fault.name.clone().unwrap_or_else(|| "Error".to_string()),
                fault.stack.clone().unwrap_or_default(),
            )),
            EntryData::Json(value) => {
                let stack = value.get("stack").filter(|s| is_truthy(s))?;
                let stack = match stack {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let exception_type = value
                    .get("exceptionType")
                    .and_then(|t| t.as_str())
                    .filter(|t| !t.is_empty())
                    .unwrap_or("Error")
                    .to_string();
                Some((exception_type, stack))
            }
        }
    }
}

impl From<serde_json::Value> for EntryData {
    fn from(value: serde_json::Value) -> Self {
        EntryData::Json(value)
    }
}

impl From<Fault> for EntryData {
    fn from(fault: Fault) -> Self {
        EntryData::Fault(fault)
    }
}

/// 日志条目
///
/// 创建即冻结: 字段公开只读,管道内部只会克隆、不会修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// 创建时刻
    pub timestamp: DateTime<Utc>,
    /// 日志级别
    pub level: LogLevel,
    /// 来源页面标识 (如 `PRESENTER-HOME`)
    pub source: String,
    /// 调用方提供的分类标签
    pub tag: String,
    /// 日志消息
    pub message: String,
    /// 可选结构化载荷
    pub data: Option<EntryData>,
}

impl LogEntry {
    pub fn new(
        timestamp: DateTime<Utc>,
        level: LogLevel,
        source: String,
        tag: String,
        message: String,
        data: Option<EntryData>,
    ) -> Self {
        Self {
            timestamp,
            level,
            source,
            tag,
            message,
            data,
        }
    }

    /// 仅ERROR级别且载荷是故障时才有异常信息
    pub fn fault_details(&self) -> Option<(String, String)> {
        if self.level != LogLevel::Error {
            return None;
        }
        self.data.as_ref().and_then(EntryData::fault_details)
    }

    /// 导出格式的一行文本
    ///
    /// `{时间} [{级别}] [{来源}] [{标签}] {消息}`,有载荷时追加 ` | {JSON}`
    pub fn to_export_line(&self) -> String {
        let mut line = format!(
            "{} [{}] [{}] [{}] {}",
            self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            self.level,
            self.source,
            self.tag,
            self.message
        );
        if let Some(data) = &self.data {
            line.push_str(" | ");
            line.push_str(&data.to_json().to_string());
        }
        line
    }
}
