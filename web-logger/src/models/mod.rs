//! 数据模型模块
//!
//! 包含日志管道的全部数据结构:
//! - errors: 错误类型定义 (投递、身份数据、配置)
//! - log_entry: 日志条目 (级别、载荷、故障提取)
//! - delivery_record: 收集端线上格式与批次
//! - identity: 会话存储中的身份数据解析
//! - lifecycle: 宿主生命周期信号
//! - logger_config: 管道配置与默认常量
//!
//! # 设计原则
//!
//! 1. **条目不可变**: 创建后只克隆、不修改
//! 2. **错误不外泄**: 所有可失败的解析返回 Result,由服务层映射为哨兵值
//! 3. **线上格式稳定**: 字段名与收集端DTO逐一对齐

pub mod delivery_record;
pub mod errors;
pub mod identity;
pub mod lifecycle;
pub mod log_entry;
pub mod logger_config;

// 重导出常用类型,简化外部引用
pub use delivery_record::{DeliveryRecord, Enrichment, LogBatch, WIRE_SOURCE};
pub use errors::{ConfigError, DeliveryError, IdentityError};
pub use identity::{StoredUserData, UserRole};
pub use lifecycle::{LifecycleEvent, Visibility};
pub use log_entry::{EntryData, Fault, LogEntry, LogLevel};
pub use logger_config::LoggerConfig;
