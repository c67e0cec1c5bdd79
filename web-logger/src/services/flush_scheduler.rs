//! 刷新调度器
//!
//! 职责: 决定投递队列何时被清空
//! 状态: IDLE → WAITING → FLUSHING → (WAITING | IDLE)
//!
//! 所有转换都在同一把锁内完成。需要读写投递队列的转换以闭包形式传入,
//! 锁顺序固定为 调度器 → 队列,准入路径则先写队列、释放后再通知调度器,
//! 因此不会出现"刷新刚结束、新准入的记录无人调度"的情况。

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::utils::lock_unpoisoned;

/// 调度器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchedulerState {
    /// 队列为空,没有定时器
    Idle,
    /// 定时器运行中,等待下一次触发
    Waiting,
    /// 有一个批次正在投递
    Flushing,
}

impl SchedulerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerState::Idle => "IDLE",
            SchedulerState::Waiting => "WAITING",
            SchedulerState::Flushing => "FLUSHING",
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 刷新触发原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    Timer,
    ErrorEntry,
    Hidden,
    Manual,
}

impl FlushTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlushTrigger::Timer => "timer",
            FlushTrigger::ErrorEntry => "error_entry",
            FlushTrigger::Hidden => "visibility_hidden",
            FlushTrigger::Manual => "manual",
        }
    }
}

#[derive(Debug)]
struct SchedulerInner {
    state: SchedulerState,
    timer: Option<CancellationToken>,
    torn_down: bool,
}

/// 刷新调度器
#[derive(Debug)]
pub struct FlushScheduler {
    inner: Mutex<SchedulerInner>,
}

impl FlushScheduler {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SchedulerInner {
                state: SchedulerState::Idle,
                timer: None,
                torn_down: false,
            }),
        }
    }

    pub fn state(&self) -> SchedulerState {
        lock_unpoisoned(&self.inner).state
    }

    pub fn timer_armed(&self) -> bool {
        lock_unpoisoned(&self.inner)
            .timer
            .as_ref()
            .map(|t| !t.is_cancelled())
            .unwrap_or(false)
    }

    /// 记录已写入队列后调用
    ///
    /// `IDLE` 且没有定时器时转为 `WAITING`,返回新定时器的取消令牌,
    /// 由调用方启动定时器。其他状态下无动作。
    pub fn note_admission(&self) -> Option<CancellationToken> {
        let mut inner = lock_unpoisoned(&self.inner);
        if inner.torn_down || inner.state != SchedulerState::Idle {
            return None;
        }
        inner.state = SchedulerState::Waiting;
        Some(arm_timer(&mut inner))
    }

    /// 尝试开始一次刷新
    ///
    /// - `FLUSHING` 或已卸载: 合并为无操作,返回 `None`,不调用 `take`
    /// - `take` 取到批次: 转为 `FLUSHING` 并返回该批次
    /// - 队列为空: 转为 `IDLE` 并取消定时器
    pub fn begin_flush<T, F>(&self, take: F) -> Option<T>
    where
        F: FnOnce() -> Option<T>,
    {
        let mut inner = lock_unpoisoned(&self.inner);
        if inner.torn_down || inner.state == SchedulerState::Flushing {
            return None;
        }
        match take() {
            Some(batch) => {
                inner.state = SchedulerState::Flushing;
                Some(batch)
            }
            None => {
                inner.state = SchedulerState::Idle;
                disarm_timer(&mut inner);
                None
            }
        }
    }

    /// 一次投递尝试结束后调用 (结果已写回队列)
    ///
    /// 队列非空转为 `WAITING`,若此时没有定时器则返回新令牌;
    /// 队列为空转为 `IDLE` 并取消定时器。
    pub fn finish_flush<F>(&self, is_empty: F) -> Option<CancellationToken>
    where
        F: FnOnce() -> bool,
    {
        let mut inner = lock_unpoisoned(&self.inner);
        if inner.torn_down {
            inner.state = SchedulerState::Idle;
            return None;
        }
        if is_empty() {
            inner.state = SchedulerState::Idle;
            disarm_timer(&mut inner);
            return None;
        }
        inner.state = SchedulerState::Waiting;
        let armed = inner.timer.as_ref().map(|t| !t.is_cancelled()).unwrap_or(false);
        if armed {
            None
        } else {
            Some(arm_timer(&mut inner))
        }
    }

    /// 卸载: 无条件取消定时器,此后不再调度任何刷新
    ///
    /// 只有第一次调用返回 `true`。
    pub fn teardown(&self) -> bool {
        let mut inner = lock_unpoisoned(&self.inner);
        disarm_timer(&mut inner);
        inner.state = SchedulerState::Idle;
        !std::mem::replace(&mut inner.torn_down, true)
    }
}

impl Default for FlushScheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn arm_timer(inner: &mut SchedulerInner) -> CancellationToken {
    disarm_timer(inner);
    let token = CancellationToken::new();
    inner.timer = Some(token.clone());
    token
}

fn disarm_timer(inner: &mut SchedulerInner) {
    if let Some(token) = inner.timer.take() {
        token.cancel();
    }
}

/// 启动周期定时器
///
/// 首次触发在一个周期之后。`on_tick` 返回 `false` 或令牌被取消时退出。
pub fn spawn_ticker<F>(
    handle: &Handle,
    token: CancellationToken,
    period: Duration,
    mut on_tick: F,
) -> tokio::task::JoinHandle<()>
where
    F: FnMut() -> bool + Send + 'static,
{
    handle.spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::trace!("刷新定时器已取消");
                    break;
                }
                _ = ticker.tick() => {
                    if !on_tick() {
                        break;
                    }
                }
            }
        }
    })
}
