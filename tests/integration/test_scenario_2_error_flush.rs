//! 集成测试 - 场景2: ERROR条目立即刷新
//!
//! 验证目标:
//! - IDLE 状态下记录一条ERROR,调度器直接进入 FLUSHING
//! - 投递期间的触发被合并,至多一个在途批次
//! - 投递成功且队列为空时回到 IDLE 并取消定时器

#[path = "../../web-logger/tests/common/mod.rs"]
mod common;

use common::{harness_with, wait_until, MockTransport};
use semscan_logger::models::{Fault, LoggerConfig};
use semscan_logger::services::SchedulerState;

#[tokio::test]
async fn test_error_while_idle_goes_directly_to_flushing() {
    let transport = MockTransport::gated();
    let h = harness_with(LoggerConfig::default(), transport.clone());
    assert_eq!(h.logger.state(), SchedulerState::Idle);

    let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "camera timed out");
    h.logger.error("SCAN", "scanner crashed", Some(Fault::capture(&io_err).into()));

    assert_eq!(h.logger.state(), SchedulerState::Flushing);
    assert_eq!(h.logger.in_flight_len(), 1);

    // 投递期间再来一条ERROR: 合并,不产生第二次投递
    h.logger.error("SCAN", "second crash", None);
    assert_eq!(h.logger.queue_len(), 1);

    transport.release();
    assert!(wait_until(|| h.logger.state() == SchedulerState::Waiting).await);
    assert_eq!(transport.send_count(), 1);

    let first = &transport.sends()[0].logs[0];
    assert_eq!(first.exception_type.as_deref(), Some("Error"));
    assert!(first.stack_trace.is_some());

    // 队列中剩余的一条由手动刷新送出
    transport.release();
    h.logger.flush().await;
    assert_eq!(h.logger.state(), SchedulerState::Idle);
    assert!(!h.logger.timer_armed());
    assert_eq!(transport.send_count(), 2);
}
