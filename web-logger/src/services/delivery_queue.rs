//! 投递队列
//!
//! 职责: 保存待投递记录,并把正在投递的批次与队列隔离开
//! 策略: 最近N条 - 超载时淘汰最旧记录,失败批次放回队首后再按容量裁剪

use std::sync::Arc;

use crate::models::{DeliveryRecord, LogBatch};
use crate::services::ring_buffer::BoundedBuffer;

/// 投递队列
///
/// 两个互不相交的区域:
/// - `pending`: 等待下一次刷新的记录
/// - `in_flight`: 已交给传输层、等待结果的批次 (同一时刻至多一个)
#[derive(Debug)]
pub struct DeliveryQueue {
    pending: BoundedBuffer<DeliveryRecord>,
    in_flight: Option<Arc<LogBatch>>,
}

impl DeliveryQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: BoundedBuffer::new(capacity),
            in_flight: None,
        }
    }

    /// 准入一条记录,满时返回被淘汰的最旧记录
    pub fn admit(&mut self, record: DeliveryRecord) -> Option<DeliveryRecord> {
        self.pending.push(record)
    }

    /// 拍快照: 把全部待投递记录移入在途批次
    ///
    /// 队列为空或已有在途批次时返回 `None`。
    pub fn take_snapshot(&mut self) -> Option<Arc<LogBatch>> {
        if self.in_flight.is_some() || self.pending.is_empty() {
            return None;
        }
        let batch = Arc::new(LogBatch::new(self.pending.drain_all()));
        self.in_flight = Some(Arc::clone(&batch));
        Some(batch)
    }

    /// 投递成功: 丢弃在途批次,返回其大小
    pub fn complete_in_flight(&mut self) -> usize {
        self.in_flight.take().map(|b| b.len()).unwrap_or(0)
    }

    /// 投递失败: 在途批次按原顺序放回队首,再按容量裁剪
    ///
    /// 返回 `(放回数量, 裁掉数量)`。
    pub fn requeue_in_flight(&mut self) -> (usize, usize) {
        let Some(batch) = self.in_flight.take() else {
            return (0, 0);
        };
        let records = Arc::try_unwrap(batch)
            .map(|b| b.logs)
            .unwrap_or_else(|shared| shared.logs.clone());
        let count = records.len();
        let dropped = self.pending.prepend(records);
        (count, dropped)
    }

    /// 取出全部待投递记录 (卸载路径)
    ///
    /// 在途批次不受影响,它的结果仍由投递任务处理。
    pub fn drain_pending(&mut self) -> Vec<DeliveryRecord> {
        self.pending.drain_all()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.as_ref().map(|b| b.len()).unwrap_or(0)
    }

    pub fn has_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// 当前待投递记录的副本
    pub fn pending(&self) -> Vec<DeliveryRecord> {
        self.pending.to_vec()
    }
}
