//! 客户端日志管道
//!
//! 职责:
//! - 接收日志调用,写入本地环形缓冲区 (用于导出与排查)
//! - 达到投递门槛的条目在准入时增强,进入投递队列
//! - 按定时器、ERROR条目、切后台触发刷新,卸载时交给信标
//!
//! 策略: 日志调用永不阻塞、永不报错;投递失败只会重新入队并留下诊断警告。

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::{
    ConfigError, DeliveryRecord, Enrichment, EntryData, LifecycleEvent, LogBatch, LogEntry,
    LogLevel, LoggerConfig, Visibility,
};
use crate::services::delivery_queue::DeliveryQueue;
use crate::services::enrichment::{
    EnrichmentSource, MemorySessionStore, NavigationContext, StaticNavigation, StoredEnrichment,
};
use crate::services::flush_scheduler::{spawn_ticker, FlushScheduler, FlushTrigger, SchedulerState};
use crate::services::ring_buffer::BoundedBuffer;
use crate::services::transport::{HttpTransport, LogTransport};
use crate::utils::lock_unpoisoned;
use crate::utils::time_utils::{format_console_time, Clock, SystemClock};

/// 截断后缀
pub const TRUNCATION_SUFFIX: &str = "...[truncated]";

/// 一次刷新的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// 收集端已接收,批次被丢弃
    Delivered(usize),
    /// 投递失败,批次放回队首; `dropped` 为容量裁剪掉的数量
    Requeued { count: usize, dropped: usize },
    /// 已有投递在途或已卸载,本次触发被合并
    Skipped,
    /// 队列为空
    Empty,
}

/// 客户端日志管道
///
/// 通过 [`ClientLogger::builder`] 创建,以 `Arc` 共享。
pub struct ClientLogger {
    config: LoggerConfig,
    clock: Arc<dyn Clock>,
    enrichment: Arc<dyn EnrichmentSource>,
    navigation: Arc<dyn NavigationContext>,
    transport: Arc<dyn LogTransport>,
    local: Mutex<BoundedBuffer<LogEntry>>,
    queue: Mutex<DeliveryQueue>,
    scheduler: FlushScheduler,
    runtime: Handle,
    weak_self: Weak<ClientLogger>,
}

/// 管道构建器
///
/// 未注入的协作者使用默认实现: 系统时钟、空会话存储、HTTP传输。
pub struct ClientLoggerBuilder {
    config: LoggerConfig,
    clock: Option<Arc<dyn Clock>>,
    enrichment: Option<Arc<dyn EnrichmentSource>>,
    navigation: Option<Arc<dyn NavigationContext>>,
    transport: Option<Arc<dyn LogTransport>>,
    runtime: Option<Handle>,
}

impl ClientLoggerBuilder {
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            config,
            clock: None,
            enrichment: None,
            navigation: None,
            transport: None,
            runtime: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_enrichment(mut self, enrichment: Arc<dyn EnrichmentSource>) -> Self {
        self.enrichment = Some(enrichment);
        self
    }

    pub fn with_navigation(mut self, navigation: Arc<dyn NavigationContext>) -> Self {
        self.navigation = Some(navigation);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn LogTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// 指定运行定时器与投递任务的运行时,缺省为当前运行时
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// 创建管道
    ///
    /// # 错误
    /// - `ConfigError::RuntimeUnavailable`: 不在tokio运行时内且未指定运行时
    /// - `ConfigError::ClientBuildFailed`: 默认HTTP传输创建失败
    pub fn build(self) -> Result<Arc<ClientLogger>, ConfigError> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current()
                .map_err(|e| ConfigError::RuntimeUnavailable(e.to_string()))?,
        };
        let transport: Arc<dyn LogTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.config)?),
        };
        let enrichment = self.enrichment.unwrap_or_else(|| {
            Arc::new(StoredEnrichment::new(MemorySessionStore::new(), ""))
        });
        let navigation = self
            .navigation
            .unwrap_or_else(|| Arc::new(StaticNavigation::default()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let config = self.config;

        tracing::info!(config = %config.summary_for_logging(), "客户端日志管道已创建");

        Ok(Arc::new_cyclic(|weak_self| ClientLogger {
            local: Mutex::new(BoundedBuffer::new(config.max_local)),
            queue: Mutex::new(DeliveryQueue::new(config.max_queue)),
            scheduler: FlushScheduler::new(),
            config,
            clock,
            enrichment,
            navigation,
            transport,
            runtime,
            weak_self: weak_self.clone(),
        }))
    }
}

impl ClientLogger {
    pub fn builder(config: LoggerConfig) -> ClientLoggerBuilder {
        ClientLoggerBuilder::new(config)
    }

    /// 使用默认协作者创建
    pub fn create(config: LoggerConfig) -> Result<Arc<Self>, ConfigError> {
        ClientLoggerBuilder::new(config).build()
    }

    // ---------------------------------------------------------------
    // 写入
    // ---------------------------------------------------------------

    /// 记录一条日志
    ///
    /// 低于本地门槛的条目直接丢弃;其余写入环形缓冲区,
    /// 达到投递门槛的再进入投递队列。ERROR条目立即触发刷新。
    pub fn log(
        &self,
        level: LogLevel,
        tag: impl Into<String>,
        message: impl Into<String>,
        data: Option<EntryData>,
    ) {
        if level < self.config.console_level {
            return;
        }

        let entry = LogEntry::new(
            self.clock.now(),
            level,
            self.navigation.current_source(),
            tag.into(),
            message.into(),
            data,
        );

        mirror_to_console(&entry);

        lock_unpoisoned(&self.local).push(entry.clone());

        if level >= self.config.min_server_level {
            self.admit(&entry);
        }
    }

    /// 记录一条带任意可序列化载荷的日志
    ///
    /// 载荷序列化失败时丢弃载荷,条目照常记录。
    pub fn log_with<T: Serialize + ?Sized>(
        &self,
        level: LogLevel,
        tag: impl Into<String>,
        message: impl Into<String>,
        data: &T,
    ) {
        self.log(level, tag, message, EntryData::from_serializable(data));
    }

    pub fn debug(&self, tag: &str, message: impl Into<String>, data: Option<EntryData>) {
        self.log(LogLevel::Debug, tag, message, data);
    }

    pub fn info(&self, tag: &str, message: impl Into<String>, data: Option<EntryData>) {
        self.log(LogLevel::Info, tag, message, data);
    }

    pub fn warn(&self, tag: &str, message: impl Into<String>, data: Option<EntryData>) {
        self.log(LogLevel::Warn, tag, message, data);
    }

    pub fn error(&self, tag: &str, message: impl Into<String>, data: Option<EntryData>) {
        self.log(LogLevel::Error, tag, message, data);
    }

    /// API请求日志,标签 `{API_TAG}_API_REQUEST`
    pub fn api_request(&self, method: &str, endpoint: &str, body: Option<serde_json::Value>) {
        let data = body.map(|body| EntryData::Json(serde_json::json!({ "body": body })));
        self.log(
            LogLevel::Info,
            format!("{}_API_REQUEST", api_tag(endpoint)),
            format!("{} {}", method, endpoint),
            data,
        );
    }

    /// API响应日志,状态码 >= 400 记为ERROR
    pub fn api_response(
        &self,
        method: &str,
        endpoint: &str,
        status: u16,
        data: Option<serde_json::Value>,
    ) {
        let level = if status >= 400 {
            LogLevel::Error
        } else {
            LogLevel::Info
        };
        self.log(
            level,
            format!("{}_API_RESPONSE", api_tag(endpoint)),
            format!("{} {} -> {}", method, endpoint, status),
            Some(EntryData::Json(serde_json::json!({
                "status": status,
                "data": data,
            }))),
        );
    }

    /// API调用失败 (网络层异常)
    pub fn api_error(&self, method: &str, endpoint: &str, message: &str, stack: Option<&str>) {
        self.log(
            LogLevel::Error,
            format!("{}_API_ERROR", api_tag(endpoint)),
            format!("{} {} FAILED", method, endpoint),
            Some(EntryData::Json(serde_json::json!({
                "message": message,
                "stack": stack,
            }))),
        );
    }

    pub fn page_load(&self, page: &str) {
        self.log(LogLevel::Info, "PAGE_LOAD", format!("{} loaded", page), None);
    }

    pub fn page_init(&self, page: &str) {
        self.log(LogLevel::Info, "PAGE_INIT", format!("{} initializing...", page), None);
    }

    pub fn page_ready(&self, page: &str) {
        self.log(LogLevel::Info, "PAGE_READY", format!("{} ready", page), None);
    }

    pub fn user_action(&self, action: &str, details: Option<serde_json::Value>) {
        self.log(
            LogLevel::Info,
            "USER_ACTION",
            action,
            details.map(EntryData::Json),
        );
    }

    pub fn ui_state(&self, component: &str, state: &str, details: Option<serde_json::Value>) {
        self.log(
            LogLevel::Debug,
            "UI_STATE",
            format!("{}: {}", component, state),
            details.map(EntryData::Json),
        );
    }

    /// 准入: 解析增强字段、截断消息、写入队列并通知调度器
    fn admit(&self, entry: &LogEntry) {
        let enrichment = Enrichment {
            user_id: self.enrichment.user_id(),
            user_display_name: self.enrichment.user_display_name(),
            user_role: self.enrichment.user_role(),
            device_descriptor: self.enrichment.device_descriptor(),
            client_version: self.config.app_version.clone(),
        };
        let message = truncate_message(&entry.message, self.config.message_max_len);
        let record = DeliveryRecord::from_entry(entry, message, enrichment);

        let evicted = lock_unpoisoned(&self.queue).admit(record);
        if let Some(evicted) = evicted {
            tracing::debug!(tag = %evicted.tag, "投递队列已满,淘汰最旧记录");
        }

        if let Some(token) = self.scheduler.note_admission() {
            self.start_timer(token);
        }

        if entry.level == LogLevel::Error {
            self.trigger(FlushTrigger::ErrorEntry);
        }
    }

    // ---------------------------------------------------------------
    // 刷新
    // ---------------------------------------------------------------

    /// 后台触发一次刷新,投递在运行时上异步完成
    fn trigger(&self, trigger: FlushTrigger) {
        let Some(logger) = self.weak_self.upgrade() else {
            return;
        };
        let batch = self
            .scheduler
            .begin_flush(|| lock_unpoisoned(&self.queue).take_snapshot());
        if let Some(batch) = batch {
            tracing::debug!(trigger = trigger.as_str(), records = batch.len(), "开始刷新");
            self.runtime.spawn(async move {
                logger.deliver(batch, trigger).await;
            });
        }
    }

    /// 立即刷新并等待结果
    pub async fn flush(&self) -> FlushOutcome {
        let mut empty = false;
        let batch = self.scheduler.begin_flush(|| {
            let snapshot = lock_unpoisoned(&self.queue).take_snapshot();
            empty = snapshot.is_none();
            snapshot
        });
        match batch {
            Some(batch) => self.deliver(batch, FlushTrigger::Manual).await,
            None if empty => FlushOutcome::Empty,
            None => FlushOutcome::Skipped,
        }
    }

    /// 投递一个在途批次,并根据结果更新队列与调度器
    async fn deliver(&self, batch: Arc<LogBatch>, trigger: FlushTrigger) -> FlushOutcome {
        let result = self.transport.send(&batch).await;
        drop(batch);

        let outcome = match result {
            Ok(()) => {
                let count = lock_unpoisoned(&self.queue).complete_in_flight();
                tracing::debug!(trigger = trigger.as_str(), records = count, "日志批次已送达");
                FlushOutcome::Delivered(count)
            }
            Err(e) => {
                let (count, dropped) = lock_unpoisoned(&self.queue).requeue_in_flight();
                tracing::warn!(
                    trigger = trigger.as_str(),
                    records = count,
                    dropped = dropped,
                    error = %e,
                    "日志投递失败,已重新入队"
                );
                FlushOutcome::Requeued { count, dropped }
            }
        };

        if let Some(token) = self
            .scheduler
            .finish_flush(|| lock_unpoisoned(&self.queue).is_empty())
        {
            self.start_timer(token);
        }

        outcome
    }

    fn start_timer(&self, token: CancellationToken) {
        let weak = self.weak_self.clone();
        spawn_ticker(&self.runtime, token, self.config.flush_interval, move || {
            match weak.upgrade() {
                Some(logger) => {
                    logger.trigger(FlushTrigger::Timer);
                    true
                }
                None => false,
            }
        });
    }

    // ---------------------------------------------------------------
    // 生命周期
    // ---------------------------------------------------------------

    /// 处理宿主生命周期信号
    pub fn handle_lifecycle(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::VisibilityChanged(visibility) => self.on_visibility_change(visibility),
            LifecycleEvent::Teardown => {
                self.teardown();
            }
        }
    }

    /// 切到后台时立即刷新
    pub fn on_visibility_change(&self, visibility: Visibility) {
        if visibility == Visibility::Hidden {
            self.trigger(FlushTrigger::Hidden);
        }
    }

    /// 卸载: 取消定时器,把队列剩余记录交给信标
    ///
    /// 不经过 `FLUSHING`,也不等待任何结果。返回交给信标的记录数。
    /// 在途批次不受影响,它的结果晚于卸载到达时接受丢失。
    pub fn teardown(&self) -> usize {
        let first = self.scheduler.teardown();
        let records = lock_unpoisoned(&self.queue).drain_pending();
        let count = records.len();

        if count > 0 {
            if let Err(e) = self.transport.send_beacon(LogBatch::new(records)) {
                tracing::debug!(records = count, error = %e, "卸载信标交付失败,接受丢失");
            }
        }

        if first {
            tracing::info!(records = count, "日志管道已卸载");
        }
        count
    }

    /// 卸载并等待信标发送完毕
    ///
    /// 阻塞当前线程至多 `timeout`。在异步上下文中应放到 `spawn_blocking` 里调用。
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.teardown();
        self.transport.drain_beacons(timeout)
    }

    /// 启动生命周期监听任务
    ///
    /// 收到 `Teardown` 或通道关闭后退出。
    pub fn spawn_lifecycle_listener(
        logger: Arc<Self>,
        mut events: mpsc::Receiver<LifecycleEvent>,
    ) -> JoinHandle<()> {
        let runtime = logger.runtime.clone();
        runtime.spawn(async move {
            while let Some(event) = events.recv().await {
                tracing::debug!(event = ?event, "收到生命周期信号");
                logger.handle_lifecycle(event);
                if event == LifecycleEvent::Teardown {
                    break;
                }
            }
        })
    }

    /// 等待监听任务结束
    ///
    /// 任务panic或被取消时记警告并返回 `false`。
    pub async fn join_lifecycle_listener(listener: JoinHandle<()>) -> bool {
        match listener.await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "生命周期监听任务异常退出");
                false
            }
        }
    }

    // ---------------------------------------------------------------
    // 查询
    // ---------------------------------------------------------------

    /// 本地环形缓冲区快照
    pub fn logs(&self) -> Vec<LogEntry> {
        lock_unpoisoned(&self.local).to_vec()
    }

    /// 导出为文本,每行一条
    pub fn export_logs(&self) -> String {
        let local = lock_unpoisoned(&self.local);
        local
            .iter()
            .map(LogEntry::to_export_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 清空本地缓冲区,投递队列不受影响
    pub fn clear_logs(&self) {
        lock_unpoisoned(&self.local).clear();
        self.info("LOGGER", "Logs cleared", None);
    }

    pub fn queue_len(&self) -> usize {
        lock_unpoisoned(&self.queue).len()
    }

    /// 投递队列中待发送记录的副本
    pub fn queued(&self) -> Vec<DeliveryRecord> {
        lock_unpoisoned(&self.queue).pending()
    }

    pub fn in_flight_len(&self) -> usize {
        lock_unpoisoned(&self.queue).in_flight_len()
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn timer_armed(&self) -> bool {
        self.scheduler.timer_armed()
    }
}

/// 从接口路径推导API标签,先匹配者优先
pub fn api_tag(endpoint: &str) -> &'static str {
    const TABLE: [(&str, &str); 7] = [
        ("/auth/login", "AUTH_LOGIN"),
        ("/register", "REGISTRATION"),
        ("/attendance", "ATTENDANCE"),
        ("/waiting-list", "WAITING_LIST"),
        ("/home", "PRESENTER_HOME"),
        ("/slots", "SLOTS"),
        ("/sessions", "SESSIONS"),
    ];
    TABLE
        .iter()
        .find(|(fragment, _)| endpoint.contains(*fragment))
        .map(|(_, tag)| *tag)
        .unwrap_or("API")
}

/// 按字符数截断消息,超长时追加后缀
pub fn truncate_message(message: &str, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &message[..cut], TRUNCATION_SUFFIX),
        None => message.to_string(),
    }
}

/// 镜像到诊断日志,对应浏览器控制台输出
fn mirror_to_console(entry: &LogEntry) {
    let time = format_console_time(entry.timestamp);
    let data = entry.data.as_ref().map(|d| d.to_json().to_string());
    match entry.level {
        LogLevel::Error => {
            tracing::error!(
                target: "semscan_client",
                time = %time,
                source = %entry.source,
                tag = %entry.tag,
                data = ?data,
                "{}",
                entry.message
            );
        }
        LogLevel::Warn => {
            tracing::warn!(
                target: "semscan_client",
                time = %time,
                source = %entry.source,
                tag = %entry.tag,
                data = ?data,
                "{}",
                entry.message
            );
        }
        LogLevel::Info => {
            tracing::info!(
                target: "semscan_client",
                time = %time,
                source = %entry.source,
                tag = %entry.tag,
                data = ?data,
                "{}",
                entry.message
            );
        }
        LogLevel::Debug => {
            tracing::debug!(
                target: "semscan_client",
                time = %time,
                source = %entry.source,
                tag = %entry.tag,
                data = ?data,
                "{}",
                entry.message
            );
        }
    }
}
