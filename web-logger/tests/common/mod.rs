//! 测试公共模块
//!
//! 提供Mock传输层和测试工具,避免真实网络依赖。
//! 场景测试 (工作区 tests/integration) 通过 `#[path]` 复用本模块。
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use semscan_logger::models::{DeliveryError, LogBatch, LoggerConfig};
use semscan_logger::services::enrichment::KEY_USERNAME;
use semscan_logger::services::{
    ClientLogger, LogTransport, MemorySessionStore, StaticNavigation, StoredEnrichment,
};
use tokio::sync::Notify;

pub const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Mock传输层
///
/// - 记录每次交互式投递与信标投递的批次
/// - 按脚本依次返回结果,脚本耗尽后返回成功
/// - 可选闸门: 投递挂起直到测试调用 `release()`
pub struct MockTransport {
    sends: Mutex<Vec<LogBatch>>,
    beacons: Mutex<Vec<LogBatch>>,
    responses: Mutex<VecDeque<Result<(), DeliveryError>>>,
    gate: Option<Notify>,
}

impl MockTransport {
    /// 总是成功、立即返回
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sends: Mutex::new(Vec::new()),
            beacons: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            gate: None,
        })
    }

    /// 每次投递都等待 `release()`
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            sends: Mutex::new(Vec::new()),
            beacons: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            gate: Some(Notify::new()),
        })
    }

    /// 追加一个脚本化结果
    pub fn push_response(&self, response: Result<(), DeliveryError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// 追加一次HTTP 500
    pub fn fail_next(&self) {
        self.push_response(Err(DeliveryError::HttpStatusError {
            status: 500,
            message: "Internal Server Error".to_string(),
        }));
    }

    /// 放行一次挂起的投递
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn sends(&self) -> Vec<LogBatch> {
        self.sends.lock().unwrap().clone()
    }

    pub fn send_count(&self) -> usize {
        self.sends.lock().unwrap().len()
    }

    pub fn beacons(&self) -> Vec<LogBatch> {
        self.beacons.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LogTransport for MockTransport {
    async fn send(&self, batch: &LogBatch) -> Result<(), DeliveryError> {
        self.sends.lock().unwrap().push(batch.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or(Ok(()))
    }

    fn send_beacon(&self, batch: LogBatch) -> Result<(), DeliveryError> {
        self.beacons.lock().unwrap().push(batch);
        Ok(())
    }
}

/// 测试用管道及其协作者
pub struct Harness {
    pub logger: Arc<ClientLogger>,
    pub transport: Arc<MockTransport>,
    pub store: Arc<MemorySessionStore>,
    pub navigation: Arc<StaticNavigation>,
}

/// 用指定配置和传输层创建管道
///
/// 当前页面为 `/presenter-home.html`,会话存储为空。
pub fn harness_with(config: LoggerConfig, transport: Arc<MockTransport>) -> Harness {
    let store = Arc::new(MemorySessionStore::new());
    let navigation = Arc::new(StaticNavigation::new("/presenter-home.html"));
    let logger = ClientLogger::builder(config)
        .with_transport(transport.clone())
        .with_enrichment(Arc::new(StoredEnrichment::new(store.clone(), CHROME_UA)))
        .with_navigation(navigation.clone())
        .build()
        .expect("管道创建失败");

    Harness {
        logger,
        transport,
        store,
        navigation,
    }
}

/// 默认配置 + 总是成功的传输层
pub fn harness() -> Harness {
    harness_with(LoggerConfig::default(), MockTransport::new())
}

/// 模拟登录
pub fn login(store: &MemorySessionStore, username: &str) {
    store.set_item(KEY_USERNAME, username);
}

/// 轮询等待条件成立 (真实时间,最多2秒)
pub async fn wait_until<F>(condition: F) -> bool
where
    F: Fn() -> bool,
{
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// 被投递记录的消息列表
pub fn messages(batch: &LogBatch) -> Vec<String> {
    batch.logs.iter().map(|r| r.message.clone()).collect()
}
