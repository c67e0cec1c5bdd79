//! 集成测试 - 场景1: 投递队列溢出
//!
//! 验证目标:
//! - 队列容量为100时,101条INFO准入后保留 #2 至 #101
//! - 本地环形缓冲区同时保留全部101条 (容量500)
//!
//! 测试覆盖:
//! 1. 溢出淘汰最旧记录,永不拒绝最新记录
//! 2. 插入顺序保持不变
//! 3. 低于投递门槛的条目不占用队列容量

#[path = "../../web-logger/tests/common/mod.rs"]
mod common;

use common::{harness, messages};
use semscan_logger::models::LogBatch;
use semscan_logger::services::SchedulerState;

#[tokio::test]
async fn test_101_admissions_keep_2_through_101() {
    let h = harness();
    for i in 1..=101 {
        h.logger.info("OVERFLOW", format!("#{}", i), None);
    }

    let queued = LogBatch::new(h.logger.queued());
    let msgs = messages(&queued);
    assert_eq!(msgs.len(), 100);
    assert_eq!(msgs.first().map(String::as_str), Some("#2"));
    assert_eq!(msgs.last().map(String::as_str), Some("#101"));
    for (offset, message) in msgs.iter().enumerate() {
        assert_eq!(message, &format!("#{}", offset + 2));
    }

    assert_eq!(h.logger.logs().len(), 101);
    assert_eq!(h.logger.state(), SchedulerState::Waiting);
}

#[tokio::test]
async fn test_debug_entries_do_not_consume_queue_capacity() {
    let h = harness();
    for i in 1..=100 {
        h.logger.info("OVERFLOW", format!("#{}", i), None);
        h.logger.debug("NOISE", format!("debug {}", i), None);
    }

    assert_eq!(h.logger.queue_len(), 100);
    assert_eq!(h.logger.queued()[0].message, "#1");
    assert_eq!(h.logger.logs().len(), 200);
}
