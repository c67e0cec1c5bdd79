//! 定长FIFO缓冲区
//!
//! 本地环形缓冲区与投递队列的共同底座:
//! 满时淘汰最旧的元素,永不拒绝最新的元素。

use std::collections::VecDeque;

/// 定长缓冲区
#[derive(Debug, Clone)]
pub struct BoundedBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedBuffer<T> {
    /// 创建指定容量的缓冲区
    ///
    /// 容量为0时按1处理,保证最新元素总能留下
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// 追加到尾部,溢出时返回被淘汰的最旧元素
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// 把一批元素按原顺序插到头部,然后从头部裁剪到容量
    ///
    /// 返回被裁掉的数量。裁剪总是丢弃最旧的元素。
    pub fn prepend(&mut self, batch: Vec<T>) -> usize {
        for item in batch.into_iter().rev() {
            self.items.push_front(item);
        }
        self.trim()
    }

    /// 取出全部元素,缓冲区清空
    pub fn drain_all(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    fn trim(&mut self) -> usize {
        let overflow = self.items.len().saturating_sub(self.capacity);
        self.items.drain(..overflow);
        overflow
    }
}

impl<T: Clone> BoundedBuffer<T> {
    /// 按插入顺序复制当前内容
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_evicts_oldest() {
        let mut buffer = BoundedBuffer::new(500);
        for i in 1..=501 {
            buffer.push(i);
        }
        assert_eq!(buffer.len(), 500);
        assert_eq!(buffer.iter().next(), Some(&2));
        assert_eq!(buffer.iter().last(), Some(&501));
    }

    #[test]
    fn test_push_returns_evicted() {
        let mut buffer = BoundedBuffer::new(2);
        assert_eq!(buffer.push("a"), None);
        assert_eq!(buffer.push("b"), None);
        assert_eq!(buffer.push("c"), Some("a"));
    }

    #[test]
    fn test_prepend_preserves_order() {
        let mut buffer = BoundedBuffer::new(10);
        buffer.push("n1");
        buffer.push("n2");
        let dropped = buffer.prepend(vec!["s1", "s2", "s3"]);
        assert_eq!(dropped, 0);
        assert_eq!(buffer.to_vec(), vec!["s1", "s2", "s3", "n1", "n2"]);
    }

    #[test]
    fn test_prepend_trims_oldest() {
        let mut buffer = BoundedBuffer::new(4);
        buffer.push("n1");
        buffer.push("n2");
        let dropped = buffer.prepend(vec!["s1", "s2", "s3"]);
        assert_eq!(dropped, 1);
        assert_eq!(buffer.to_vec(), vec!["s2", "s3", "n1", "n2"]);
    }

    #[test]
    fn test_drain_all() {
        let mut buffer = BoundedBuffer::new(3);
        buffer.push(1);
        buffer.push(2);
        assert_eq!(buffer.drain_all(), vec![1, 2]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_zero_capacity_keeps_newest() {
        let mut buffer = BoundedBuffer::new(0);
        buffer.push(1);
        buffer.push(2);
        assert_eq!(buffer.to_vec(), vec![2]);
    }
}
