//! 投递传输层
//!
//! 两条路径:
//! - 交互式投递: 异步POST,结果决定批次丢弃还是重新入队
//! - 信标投递: 卸载时交给信标线程,不观察响应

use std::time::Duration;

use crate::models::{ConfigError, DeliveryError, LogBatch, LoggerConfig};
use crate::services::beacon::BeaconWorker;

/// 投递传输
///
/// 以trait注入,测试使用脚本化的模拟实现。
#[async_trait::async_trait]
pub trait LogTransport: Send + Sync {
    /// 交互式投递,任何2xx视为成功
    async fn send(&self, batch: &LogBatch) -> Result<(), DeliveryError>;

    /// 信标投递: 同步交付后立即返回,永不挂起
    fn send_beacon(&self, batch: LogBatch) -> Result<(), DeliveryError>;

    /// 等待已交付的信标发送完毕,超时返回 `false`
    fn drain_beacons(&self, _timeout: Duration) -> bool {
        true
    }
}

/// 基于reqwest的HTTP传输
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    beacon: BeaconWorker,
}

impl HttpTransport {
    /// 按配置创建传输层并启动信标线程
    pub fn new(config: &LoggerConfig) -> Result<Self, ConfigError> {
        let endpoint = config.endpoint();
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::ClientBuildFailed(e.to_string()))?;
        let beacon = BeaconWorker::spawn(endpoint.clone(), config.request_timeout)
            .map_err(|e| ConfigError::ClientBuildFailed(e.to_string()))?;

        tracing::info!(endpoint = %endpoint, "日志传输层已初始化");

        Ok(Self {
            client,
            endpoint,
            beacon,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl LogTransport for HttpTransport {
    async fn send(&self, batch: &LogBatch) -> Result<(), DeliveryError> {
        let response = self.client.post(&self.endpoint).json(batch).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response
            .text()
            .await
            .ok()
            .filter(|body| !body.is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
        Err(DeliveryError::HttpStatusError {
            status: status.as_u16(),
            message,
        })
    }

    fn send_beacon(&self, batch: LogBatch) -> Result<(), DeliveryError> {
        self.beacon.enqueue(&batch)
    }

    fn drain_beacons(&self, timeout: Duration) -> bool {
        self.beacon.drain(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_collector_is_network_failure() {
        let config = LoggerConfig::new("http://127.0.0.1:9/api/v1");
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.endpoint(), "http://127.0.0.1:9/api/v1/logs");

        let err = transport.send(&LogBatch::new(vec![])).await.unwrap_err();
        assert!(matches!(err, DeliveryError::NetworkFailed(_)));
    }
}
