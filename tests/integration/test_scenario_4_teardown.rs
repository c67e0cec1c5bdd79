//! 集成测试 - 场景4: 页面卸载
//!
//! 验证目标:
//! - 队列中有5条记录时卸载,信标恰好被调用一次且携带这5条
//! - 定时器被取消,卸载不经过 FLUSHING
//! - 卸载前已在途的批次不受影响

#[path = "../../web-logger/tests/common/mod.rs"]
mod common;

use std::sync::Arc;

use common::{harness, harness_with, messages, MockTransport};
use semscan_logger::models::{LifecycleEvent, LoggerConfig};
use semscan_logger::services::{ClientLogger, SchedulerState};
use tokio::sync::mpsc;

#[tokio::test]
async fn test_teardown_with_five_queued() {
    let h = harness();
    for i in 1..=5 {
        h.logger.warn("HOME", format!("pending {}", i), None);
    }
    assert!(h.logger.timer_armed());

    let (tx, rx) = mpsc::channel(1);
    let listener = ClientLogger::spawn_lifecycle_listener(Arc::clone(&h.logger), rx);
    tx.send(LifecycleEvent::Teardown).await.unwrap();
    listener.await.unwrap();

    let beacons = h.transport.beacons();
    assert_eq!(beacons.len(), 1);
    assert_eq!(
        messages(&beacons[0]),
        vec!["pending 1", "pending 2", "pending 3", "pending 4", "pending 5"]
    );
    assert!(!h.logger.timer_armed());
    assert_eq!(h.logger.state(), SchedulerState::Idle);
    assert_eq!(h.transport.send_count(), 0);
    assert_eq!(h.logger.queue_len(), 0);
}

#[tokio::test]
async fn test_teardown_leaves_in_flight_batch_alone() {
    let transport = MockTransport::gated();
    let h = harness_with(LoggerConfig::default(), transport.clone());

    h.logger.error("HOME", "in flight", None);
    h.logger.info("HOME", "queued 1", None);
    h.logger.info("HOME", "queued 2", None);

    assert_eq!(h.logger.teardown(), 2);
    assert_eq!(h.logger.in_flight_len(), 1);
    assert_eq!(messages(&transport.beacons()[0]), vec!["queued 1", "queued 2"]);

    // 第二次卸载: 队列已空,不再调用信标
    assert_eq!(h.logger.teardown(), 0);
    assert_eq!(transport.beacons().len(), 1);
}
