//! 服务层模块
//!
//! 包含日志管道的全部运行逻辑:
//! - `ring_buffer`: 定长FIFO缓冲区
//! - `delivery_queue`: 投递队列与在途批次
//! - `flush_scheduler`: IDLE/WAITING/FLUSHING 状态机与定时器
//! - `enrichment`: 会话存储、身份增强、导航上下文
//! - `transport` / `beacon`: 交互式投递与卸载信标
//! - `client_logger`: 把以上组件组装成管道
//! - `config_service`: 从 .env 与环境变量加载配置
//!
//! # 设计原则
//!
//! 1. **写入不阻塞**: `log()` 只做内存操作,网络交给后台任务
//! 2. **错误不外泄**: 投递与身份读取的错误在服务内部消化
//! 3. **协作者可注入**: 时钟、会话存储、传输层都是trait
//!
//! # 服务架构
//!
//! ```text
//! 调用方 ──log()──► ClientLogger
//!                     │
//!          ┌──────────┼─────────────┐
//!          ▼          ▼             ▼
//!     RingBuffer  DeliveryQueue  FlushScheduler
//!                     │             │
//!                     └──────┬──────┘
//!                            ▼
//!                      LogTransport ──► 收集端
//!                     (HTTP / 信标线程)
//! ```
//!
//! # 使用示例
//!
//! ```no_run
//! use semscan_logger::models::LoggerConfig;
//! use semscan_logger::services::ClientLogger;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let logger = ClientLogger::create(LoggerConfig::default())?;
//! logger.page_load("Presenter Home");
//! logger.api_request("GET", "/api/v1/presenters/7/home", None);
//! logger.flush().await;
//! logger.teardown();
//! # Ok(())
//! # }
//! ```

pub mod beacon;
pub mod client_logger;
pub mod config_service;
pub mod delivery_queue;
pub mod enrichment;
pub mod flush_scheduler;
pub mod ring_buffer;
pub mod transport;

// 重导出常用类型,简化外部引用
pub use beacon::BeaconWorker;
pub use client_logger::{api_tag, ClientLogger, ClientLoggerBuilder, FlushOutcome};
pub use config_service::ConfigService;
pub use delivery_queue::DeliveryQueue;
pub use enrichment::{
    EnrichmentSource, MemorySessionStore, NavigationContext, SessionStore, StaticNavigation,
    StoredEnrichment,
};
pub use flush_scheduler::{FlushScheduler, SchedulerState};
pub use ring_buffer::BoundedBuffer;
pub use transport::{HttpTransport, LogTransport};
