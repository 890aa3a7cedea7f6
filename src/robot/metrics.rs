//! 后端循环性能指标模块
//!
//! 零开销的原子计数器，用于观察循环的健康状态。
//! 所有计数器使用原子操作，可以在任何线程安全读取，不引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 后端循环实时指标
///
/// 由循环线程更新、任意线程读取。读取用 [`BackendMetrics::snapshot`]
/// 获取一致的人类可读快照。
#[derive(Debug, Default)]
pub struct BackendMetrics {
    /// 已提交的周期数（status 追加次数）
    pub ticks_total: AtomicU64,

    /// 已施加的动作数
    pub actions_applied_total: AtomicU64,

    /// 实时模式下动作未按时到位的周期数
    ///
    /// 如果这个值持续增长，说明动作生产侧跟不上循环节拍。
    pub deadline_misses_total: AtomicU64,

    /// 自动重复上一动作的次数
    pub action_repetitions_total: AtomicU64,

    /// 驱动上报错误的次数
    pub driver_errors_total: AtomicU64,
}

impl BackendMetrics {
    /// 创建新的指标实例（所有计数器为 0）
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取当前计数的快照
    ///
    /// 各计数器独立原子读取（Relaxed），彼此之间可能有微小时间差。
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks_total: self.ticks_total.load(Ordering::Relaxed),
            actions_applied_total: self.actions_applied_total.load(Ordering::Relaxed),
            deadline_misses_total: self.deadline_misses_total.load(Ordering::Relaxed),
            action_repetitions_total: self.action_repetitions_total.load(Ordering::Relaxed),
            driver_errors_total: self.driver_errors_total.load(Ordering::Relaxed),
        }
    }
}

/// 指标快照（普通整数，便于打印和断言）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub ticks_total: u64,
    pub actions_applied_total: u64,
    pub deadline_misses_total: u64,
    pub action_repetitions_total: u64,
    pub driver_errors_total: u64,
}
