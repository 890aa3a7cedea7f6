//! 有界时间序列实现
//!
//! 环形缓冲区以 `index mod max_length` 定位槽位，由一把 Mutex 和一个 Condvar 保护。
//! 追加在锁内完成 O(1) 工作后唤醒全部等待者；读取在锁内检查可用性，
//! 未产生则在条件变量上等待（可带截止时间），醒来后重新检查。

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::series::SeriesError;

/// 时间索引：从 0 开始单调递增的周期计数
pub type TimeIndex = u64;

/// 单个槽位：元素值 + 追加时的墙钟时间戳 + 其全局索引
///
/// 槽位记录自己的索引，读取时据此区分"命中"与"已被覆盖（驱逐）"。
struct Slot<T> {
    value: T,
    timestamp_ms: f64,
    index: TimeIndex,
}

struct Inner<T> {
    /// 环形存储，容量固定为 `max_length`
    slots: Vec<Option<Slot<T>>>,
    /// 下一次追加将被赋予的索引
    next_index: TimeIndex,
    /// 关闭标志：置位后追加失败，所有等待者被唤醒
    is_shutdown: bool,
}

/// 有界、单写多读、可阻塞等待未来索引的时间序列
///
/// # 同步语义
///
/// - 追加由单一生产者线程驱动（不做类型层面的强制，靠使用约定）
/// - 任意数量的读取线程可以按索引读取，读取尚未产生的索引会阻塞
/// - `shutdown()` 唤醒所有阻塞读者；已有元素在关闭后仍然可读，
///   只有追加和对未来索引的等待会失败
///
/// # 驱逐
///
/// 最多保留 `max_length` 个最新元素。被覆盖的索引读取时返回
/// [`SeriesError::Evicted`]。
pub struct TimeSeries<T> {
    inner: Mutex<Inner<T>>,
    element_appended: Condvar,
    max_length: usize,
}

impl<T> TimeSeries<T> {
    /// 创建固定容量的时间序列
    ///
    /// # Panics
    ///
    /// `max_length` 为 0 时 panic（无法保存任何历史的序列没有意义）。
    pub fn new(max_length: usize) -> Self {
        assert!(max_length > 0, "TimeSeries requires max_length >= 1");
        let mut slots = Vec::with_capacity(max_length);
        slots.resize_with(max_length, || None);
        Self {
            inner: Mutex::new(Inner {
                slots,
                next_index: 0,
                is_shutdown: false,
            }),
            element_appended: Condvar::new(),
            max_length,
        }
    }

    /// 追加一个元素，返回其被赋予的索引
    ///
    /// 在锁内完成：分配 `next_index`、记录墙钟时间戳、写入槽位（隐式驱逐
    /// 同槽位的旧元素），随后唤醒全部阻塞读者。
    ///
    /// # 错误
    /// - [`SeriesError::ShutDown`]: 序列已关闭
    pub fn append(&self, value: T) -> Result<TimeIndex, SeriesError> {
        let mut inner = self.inner.lock();
        if inner.is_shutdown {
            return Err(SeriesError::ShutDown);
        }
        let index = inner.next_index;
        inner.next_index += 1;
        let pos = (index % self.max_length as u64) as usize;
        inner.slots[pos] = Some(Slot {
            value,
            timestamp_ms: wall_clock_ms(),
            index,
        });
        drop(inner);
        self.element_appended.notify_all();
        Ok(index)
    }

    /// 读取索引对应元素的追加时间戳（墙钟毫秒，阻塞语义同 [`TimeSeries::get`]）
    pub fn timestamp_ms(&self, timeindex: TimeIndex) -> Result<f64, SeriesError> {
        let mut inner = self.inner.lock();
        loop {
            if timeindex < inner.next_index {
                return self.read_slot(&inner, timeindex).map(|slot| slot.timestamp_ms);
            }
            if inner.is_shutdown {
                return Err(SeriesError::ShutDown);
            }
            self.element_appended.wait(&mut inner);
        }
    }

    /// 等待索引 >= `timeindex` 的元素出现
    ///
    /// 阻塞直到元素产生、超时或序列关闭。返回该索引是否已可用；
    /// 超时与关闭都表现为 `false`，不产生错误。
    pub fn wait_for_timeindex(&self, timeindex: TimeIndex, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut inner = self.inner.lock();
        loop {
            if timeindex < inner.next_index {
                return true;
            }
            if inner.is_shutdown {
                return false;
            }
            match deadline {
                Some(deadline) => {
                    if self.element_appended.wait_until(&mut inner, deadline).timed_out() {
                        return timeindex < inner.next_index;
                    }
                },
                // 超大 Duration 溢出 Instant 的表示范围，等同于无限等待
                None => self.element_appended.wait(&mut inner),
            }
        }
    }

    /// 最新元素的索引（尚无元素时为 `None`）
    pub fn newest_timeindex(&self) -> Option<TimeIndex> {
        self.inner.lock().next_index.checked_sub(1)
    }

    /// 仍保留在历史中的最旧索引（尚无元素时为 `None`）
    pub fn oldest_timeindex(&self) -> Option<TimeIndex> {
        let inner = self.inner.lock();
        if inner.next_index == 0 {
            None
        } else {
            Some(inner.next_index.saturating_sub(self.max_length as u64))
        }
    }

    /// 当前保留的元素个数（0 ..= `max_length`）
    pub fn length(&self) -> usize {
        let inner = self.inner.lock();
        inner.next_index.min(self.max_length as u64) as usize
    }

    /// 是否尚无任何元素
    pub fn is_empty(&self) -> bool {
        self.inner.lock().next_index == 0
    }

    /// 历史容量
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// 关闭序列（幂等）
    ///
    /// 唤醒所有阻塞读者；此后追加返回 [`SeriesError::ShutDown`]，
    /// 对未来索引的等待立即失败，已有元素仍然可读。
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock();
        inner.is_shutdown = true;
        drop(inner);
        self.element_appended.notify_all();
    }

    /// 序列是否已关闭
    pub fn is_shutdown(&self) -> bool {
        self.inner.lock().is_shutdown
    }

    /// 锁内槽位读取，调用方保证 `timeindex < next_index`
    fn read_slot<'a>(
        &self,
        inner: &'a Inner<T>,
        timeindex: TimeIndex,
    ) -> Result<&'a Slot<T>, SeriesError> {
        let pos = (timeindex % self.max_length as u64) as usize;
        match inner.slots[pos].as_ref() {
            Some(slot) if slot.index == timeindex => Ok(slot),
            _ => Err(SeriesError::Evicted {
                index: timeindex,
                oldest: inner.next_index.saturating_sub(self.max_length as u64),
            }),
        }
    }
}

impl<T: Clone> TimeSeries<T> {
    /// 按索引读取（阻塞）
    ///
    /// 索引尚未产生时无限期阻塞，直到元素产生或序列关闭。
    /// 环形槽位可能被驱逐覆盖，无法越过锁交出 `&T`，
    /// 因此阻塞读取返回值的克隆。
    ///
    /// # 错误
    /// - [`SeriesError::Evicted`]: 索引已被驱逐出历史
    /// - [`SeriesError::ShutDown`]: 等待期间序列被关闭
    pub fn get(&self, timeindex: TimeIndex) -> Result<T, SeriesError> {
        let mut inner = self.inner.lock();
        loop {
            if timeindex < inner.next_index {
                return self.read_slot(&inner, timeindex).map(|slot| slot.value.clone());
            }
            if inner.is_shutdown {
                return Err(SeriesError::ShutDown);
            }
            self.element_appended.wait(&mut inner);
        }
    }

    /// 按索引读取（非阻塞）
    ///
    /// # 错误
    /// - [`SeriesError::NotYetProduced`]: 索引尚未产生
    /// - [`SeriesError::Evicted`]: 索引已被驱逐出历史
    /// - [`SeriesError::ShutDown`]: 索引尚未产生且序列已关闭（永远不会产生）
    pub fn try_get(&self, timeindex: TimeIndex) -> Result<T, SeriesError> {
        let inner = self.inner.lock();
        if timeindex < inner.next_index {
            return self.read_slot(&inner, timeindex).map(|slot| slot.value.clone());
        }
        if inner.is_shutdown {
            return Err(SeriesError::ShutDown);
        }
        Err(SeriesError::NotYetProduced(timeindex))
    }

    /// 读取最新元素
    ///
    /// # 错误
    /// - [`SeriesError::Empty`]: 尚未有任何追加
    pub fn newest_element(&self) -> Result<T, SeriesError> {
        let inner = self.inner.lock();
        match inner.next_index.checked_sub(1) {
            Some(newest) => self.read_slot(&inner, newest).map(|slot| slot.value.clone()),
            None => Err(SeriesError::Empty),
        }
    }
}

/// 当前墙钟时间（UNIX 纪元以来的毫秒数）
fn wall_clock_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64()
        * 1000.0
}
