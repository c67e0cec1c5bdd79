//! 集成测试 - 场景3: 失败重新入队的顺序
//!
//! 验证目标:
//! - 3条记录的快照遇到 HTTP 500,期间新准入2条
//! - 结束后队列为 [s1, s2, s3, n1, n2]
//! - 下一次投递按同样顺序送出

#[path = "../../web-logger/tests/common/mod.rs"]
mod common;

use common::{harness_with, messages, wait_until, MockTransport};
use semscan_logger::models::{LogBatch, LoggerConfig};
use semscan_logger::services::{FlushOutcome, SchedulerState};

#[tokio::test]
async fn test_failed_snapshot_goes_back_ahead_of_new_entries() {
    let transport = MockTransport::gated();
    let h = harness_with(LoggerConfig::default(), transport.clone());
    transport.fail_next();

    h.logger.info("ATTENDANCE", "s1", None);
    h.logger.info("ATTENDANCE", "s2", None);
    h.logger.error("ATTENDANCE", "s3", None);
    assert_eq!(h.logger.in_flight_len(), 3);

    h.logger.info("ATTENDANCE", "n1", None);
    h.logger.info("ATTENDANCE", "n2", None);

    transport.release();
    assert!(wait_until(|| h.logger.in_flight_len() == 0 && h.logger.queue_len() == 5).await);
    assert!(wait_until(|| h.logger.state() == SchedulerState::Waiting).await);

    let queued = LogBatch::new(h.logger.queued());
    assert_eq!(messages(&queued), vec!["s1", "s2", "s3", "n1", "n2"]);

    transport.release();
    assert_eq!(h.logger.flush().await, FlushOutcome::Delivered(5));
    assert_eq!(
        messages(&transport.sends()[1]),
        vec!["s1", "s2", "s3", "n1", "n2"]
    );
}
