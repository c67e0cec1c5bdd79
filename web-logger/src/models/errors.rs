use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 日志投递相关错误
///
/// 只在传输层内部流转,由刷新流程转换为重新入队。
/// 调用 `log()` 的业务代码永远看不到这些错误。
#[derive(Debug, Error, Serialize, Deserialize)]
#[serde(tag = "error", content = "details")]
pub enum DeliveryError {
    /// 网络请求失败
    ///
    /// 可能原因:
    /// - 网络连接中断
    /// - 收集端不可达
    /// - 请求超时
    #[error("网络请求失败: {0}")]
    NetworkFailed(String),

    /// HTTP状态码错误
    ///
    /// 收集端返回了非2xx状态码
    #[error("HTTP错误 {status}: {message}")]
    HttpStatusError { status: u16, message: String },

    /// 批次序列化失败
    #[error("日志批次序列化失败: {0}")]
    SerializationFailed(String),

    /// 信标通道不可用
    ///
    /// 卸载阶段的信标线程已退出或无法启动,批次只能丢弃
    #[error("信标通道不可用: {0}")]
    BeaconUnavailable(String),
}

/// 身份数据读取错误
///
/// 会话存储中的用户数据缺失或格式错误。
/// 增强字段访问器会把它映射为 null / `UNKNOWN`,不会向外传播。
#[derive(Debug, Error, Serialize, Deserialize, PartialEq)]
#[serde(tag = "error", content = "details")]
pub enum IdentityError {
    /// 存储中没有该键
    #[error("会话存储缺少键: {0}")]
    Missing(String),

    /// 存储的JSON无法解析
    #[error("会话存储键 {key} 格式错误: {reason}")]
    Malformed { key: String, reason: String },
}

/// 配置错误
///
/// 仅在启动阶段出现,失败即拒绝创建日志管道。
#[derive(Debug, Error, Serialize, Deserialize)]
#[serde(tag = "error", content = "details")]
pub enum ConfigError {
    /// 配置值无效
    #[error("配置项 {key} 的值无效 ({value}): {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// I/O错误
    ///
    /// 读取 .env 文件时的文件系统错误
    #[error("I/O错误: {0}")]
    IoError(String),

    /// 没有可用的tokio运行时
    ///
    /// 日志管道需要在运行时内创建,以便调度定时器和后台投递
    #[error("没有可用的tokio运行时: {0}")]
    RuntimeUnavailable(String),

    /// HTTP客户端构建失败
    #[error("HTTP客户端构建失败: {0}")]
    ClientBuildFailed(String),
}

/// 实现从reqwest::Error到DeliveryError的转换
impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DeliveryError::NetworkFailed("请求超时".to_string())
        } else if err.is_connect() {
            DeliveryError::NetworkFailed("无法连接到收集端".to_string())
        } else {
            DeliveryError::NetworkFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DeliveryError {
    fn from(err: serde_json::Error) -> Self {
        DeliveryError::SerializationFailed(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::PermissionDenied => ConfigError::IoError(format!("权限不足: {}", err)),
            _ => ConfigError::IoError(err.to_string()),
        }
    }
}

impl From<dotenvy::Error> for ConfigError {
    fn from(err: dotenvy::Error) -> Self {
        ConfigError::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_error_serializes_with_tag() {
        let err = DeliveryError::HttpStatusError {
            status: 500,
            message: "boom".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"], "HttpStatusError");
        assert_eq!(json["details"]["status"], 500);
    }

    #[test]
    fn test_identity_error_display() {
        let err = IdentityError::Malformed {
            key: "user_data".to_string(),
            reason: "expected value".to_string(),
        };
        assert!(err.to_string().contains("user_data"));
    }
}
