//! SemScan 网页客户端日志管道
//!
//! 有界的本地缓冲、按门槛入队、定时/事件驱动刷新、失败重新入队、卸载信标。

pub mod commands;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;
