//! 信标线程
//!
//! 页面卸载时的"入队即忘"投递原语。
//! 交付动作只是把请求体放进通道,永不挂起调用方;
//! 真正的POST在独立的系统线程上用阻塞客户端完成,
//! 即使异步运行时已经关闭也能继续发送。

use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;

use crate::models::{DeliveryError, LogBatch};
use crate::utils::lock_unpoisoned;

const THREAD_NAME: &str = "semscan-beacon";

struct BeaconJob {
    body: Vec<u8>,
    records: usize,
}

/// 未完成信标计数
#[derive(Default)]
struct PendingCounter {
    count: Mutex<usize>,
    idle: Condvar,
}

impl PendingCounter {
    fn increment(&self) {
        *lock_unpoisoned(&self.count) += 1;
    }

    fn decrement(&self) {
        let mut count = lock_unpoisoned(&self.count);
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = lock_unpoisoned(&self.count);
        while *count > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            count = match self.idle.wait_timeout(count, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }
}

/// 信标线程句柄
pub struct BeaconWorker {
    sender: Mutex<Option<mpsc::Sender<BeaconJob>>>,
    pending: Arc<PendingCounter>,
}

impl BeaconWorker {
    /// 启动信标线程
    ///
    /// # 参数
    /// - `endpoint`: 收集端地址 `{api_base}/logs`
    /// - `timeout`: 单次POST超时
    pub fn spawn(endpoint: String, timeout: Duration) -> Result<Self, DeliveryError> {
        let (sender, receiver) = mpsc::channel::<BeaconJob>();
        let pending = Arc::new(PendingCounter::default());
        let worker_pending = Arc::clone(&pending);

        thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run(endpoint, timeout, receiver, worker_pending))
            .map_err(|e| DeliveryError::BeaconUnavailable(e.to_string()))?;

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            pending,
        })
    }

    /// 交付一个批次,立即返回
    ///
    /// 序列化失败或线程已退出时返回错误,批次被丢弃。
    pub fn enqueue(&self, batch: &LogBatch) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(batch)?;
        let job = BeaconJob {
            body,
            records: batch.len(),
        };

        let sender = lock_unpoisoned(&self.sender);
        let Some(sender) = sender.as_ref() else {
            return Err(DeliveryError::BeaconUnavailable("信标线程已关闭".to_string()));
        };

        self.pending.increment();
        sender.send(job).map_err(|_| {
            self.pending.decrement();
            DeliveryError::BeaconUnavailable("信标线程已退出".to_string())
        })
    }

    /// 等待已交付的信标发送完毕
    ///
    /// 超时返回 `false`,未完成的信标继续在后台发送。
    pub fn drain(&self, timeout: Duration) -> bool {
        self.pending.wait_idle(timeout)
    }

    /// 未完成的信标数量
    pub fn pending(&self) -> usize {
        *lock_unpoisoned(&self.pending.count)
    }

    /// 关闭通道,线程处理完剩余信标后退出
    pub fn close(&self) {
        lock_unpoisoned(&self.sender).take();
    }
}

impl Drop for BeaconWorker {
    fn drop(&mut self) {
        self.close();
    }
}

fn run(
    endpoint: String,
    timeout: Duration,
    receiver: mpsc::Receiver<BeaconJob>,
    pending: Arc<PendingCounter>,
) {
    let client = match reqwest::blocking::Client::builder().timeout(timeout).build() {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::error!(error = %e, "信标HTTP客户端构建失败,信标将被丢弃");
            None
        }
    };

    for job in receiver {
        if let Some(client) = &client {
            let result = client
                .post(&endpoint)
                .header(CONTENT_TYPE, "application/json")
                .body(job.body)
                .send();
            match result {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!(records = job.records, "信标已送达");
                }
                Ok(resp) => {
                    tracing::debug!(
                        records = job.records,
                        status = resp.status().as_u16(),
                        "信标被收集端拒绝,接受丢失"
                    );
                }
                Err(e) => {
                    tracing::debug!(records = job.records, error = %e, "信标发送失败,接受丢失");
                }
            }
        }
        pending.decrement();
    }

    tracing::trace!("信标线程退出");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_without_work_is_immediate() {
        let worker = BeaconWorker::spawn("http://127.0.0.1:9/logs".to_string(), Duration::from_millis(200))
            .unwrap();
        assert!(worker.drain(Duration::from_millis(10)));
        assert_eq!(worker.pending(), 0);
    }

    #[test]
    fn test_enqueue_after_close_is_unavailable() {
        let worker = BeaconWorker::spawn("http://127.0.0.1:9/logs".to_string(), Duration::from_millis(200))
            .unwrap();
        worker.close();
        let err = worker.enqueue(&LogBatch::new(vec![])).unwrap_err();
        assert!(matches!(err, DeliveryError::BeaconUnavailable(_)));
    }

    #[test]
    fn test_unreachable_collector_is_silent_loss() {
        // 端口9 (discard) 通常没有监听者,连接被拒绝后计数仍归零
        let worker = BeaconWorker::spawn("http://127.0.0.1:9/logs".to_string(), Duration::from_millis(500))
            .unwrap();
        worker.enqueue(&LogBatch::new(vec![])).unwrap();
        assert!(worker.drain(Duration::from_secs(5)));
    }
}
