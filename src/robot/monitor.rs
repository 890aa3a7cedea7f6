//! 驱动时序看门狗
//!
//! 包装任意 [`RobotDriver`] 并转发全部操作，同时用后台线程监控动作时序：
//!
//! 1. 单个动作的执行时间不得超过 `max_action_duration`
//! 2. 上一动作结束到下一动作到达（`apply_action` 被调用）的间隔
//!    不得超过 `max_inter_action_duration`
//!
//! 任一约束被违反时机器人立即停机，之后外部动作被静默忽略。
//! 包装器析构时保证内层驱动的 `shutdown()` 被调用，机器人总是停在安全状态。

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{error, warn};

use crate::robot::driver::{DriverError, RobotDriver};
use crate::series::TimeSeries;

/// 动作起止日志的历史长度
const MONITOR_LOG_LENGTH: usize = 1000;

/// 等待第一个动作时的停机检查间隔
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 带时序监控的驱动包装器
///
/// 只有当两个超时都有限（`Some`）时才启动监控线程；
/// 否则记录警告并退化为纯转发（此时直接使用内层驱动更合适）。
pub struct MonitoredRobotDriver<D: RobotDriver> {
    /// 实际驱动（与看门狗线程共享）
    inner: Arc<Mutex<D>>,
    /// 停机标志
    is_shutdown: Arc<AtomicBool>,
    /// 每次 `apply_action` 进入时追加一个元素
    action_start_log: Arc<TimeSeries<bool>>,
    /// 每次 `apply_action` 返回时追加一个元素
    action_end_log: Arc<TimeSeries<bool>>,
    /// 看门狗发现的违约消息（先到先得）
    error_message: Arc<ArcSwapOption<String>>,
    /// 看门狗线程句柄（Drop 时 join）
    watchdog: Option<JoinHandle<()>>,
}

impl<D> MonitoredRobotDriver<D>
where
    D: RobotDriver + Send + 'static,
{
    /// 包装驱动并（在两个超时都有限时）启动监控线程
    ///
    /// # 参数
    /// - `driver`: 实际驱动
    /// - `max_action_duration`: 单个动作允许的最长执行时间
    /// - `max_inter_action_duration`: 上一动作结束到下一动作到达的最长间隔
    pub fn new(
        driver: D,
        max_action_duration: Option<Duration>,
        max_inter_action_duration: Option<Duration>,
    ) -> Self {
        let inner = Arc::new(Mutex::new(driver));
        let is_shutdown = Arc::new(AtomicBool::new(false));
        let action_start_log = Arc::new(TimeSeries::new(MONITOR_LOG_LENGTH));
        let action_end_log = Arc::new(TimeSeries::new(MONITOR_LOG_LENGTH));
        let error_message = Arc::new(ArcSwapOption::empty());

        let watchdog = match (max_action_duration, max_inter_action_duration) {
            (Some(max_action), Some(max_inter_action)) => Some(std::thread::spawn({
                let inner = inner.clone();
                let is_shutdown = is_shutdown.clone();
                let action_start_log = action_start_log.clone();
                let action_end_log = action_end_log.clone();
                let error_message = error_message.clone();
                move || {
                    watchdog_loop(
                        &inner,
                        &is_shutdown,
                        &action_start_log,
                        &action_end_log,
                        &error_message,
                        max_action,
                        max_inter_action,
                    );
                }
            })),
            _ => {
                warn!(
                    "MonitoredRobotDriver was created with an unbounded timeout; \
                     the monitoring loop is NOT running. If monitoring is not needed, \
                     consider using the driver directly without the wrapper."
                );
                None
            },
        };

        Self {
            inner,
            is_shutdown,
            action_start_log,
            action_end_log,
            error_message,
            watchdog,
        }
    }

    /// 机器人是否已停机
    pub fn is_shutdown(&self) -> bool {
        self.is_shutdown.load(Ordering::Acquire)
    }
}

impl<D> RobotDriver for MonitoredRobotDriver<D>
where
    D: RobotDriver + Send + 'static,
{
    type Action = D::Action;
    type Observation = D::Observation;

    fn initialize(&mut self) -> Result<(), DriverError> {
        self.inner.lock().initialize()
    }

    fn get_latest_observation(&mut self) -> Self::Observation {
        self.inner.lock().get_latest_observation()
    }

    /// 下发动作并记录起止时刻
    ///
    /// 停机后不再接受动作：期望动作被原样返回而不触碰硬件。
    fn apply_action(&mut self, desired: Self::Action) -> Self::Action {
        if self.is_shutdown.load(Ordering::Acquire) {
            return desired;
        }
        let _ = self.action_start_log.append(true);
        let applied = self.inner.lock().apply_action(desired);
        let _ = self.action_end_log.append(true);
        applied
    }

    fn get_error(&mut self) -> Option<String> {
        // 内层驱动的错误优先
        if let Some(message) = self.inner.lock().get_error() {
            return Some(message);
        }
        self.error_message.load_full().map(|message| (*message).clone())
    }

    /// 安全停机（幂等：只有第一次调用到达内层驱动）
    fn shutdown(&mut self) {
        shutdown_robot(
            &self.inner,
            &self.is_shutdown,
            &self.action_start_log,
            &self.action_end_log,
        );
    }
}

impl<D: RobotDriver> Drop for MonitoredRobotDriver<D> {
    fn drop(&mut self) {
        shutdown_robot(
            &self.inner,
            &self.is_shutdown,
            &self.action_start_log,
            &self.action_end_log,
        );
        if let Some(handle) = self.watchdog.take()
            && handle.join().is_err()
        {
            error!("monitor watchdog thread panicked");
        }
    }
}

/// 停机实现：置位标志（先到先得地调用内层 `shutdown`），
/// 并关闭起止日志以唤醒看门狗的挂起等待
fn shutdown_robot<D: RobotDriver>(
    inner: &Mutex<D>,
    is_shutdown: &AtomicBool,
    action_start_log: &TimeSeries<bool>,
    action_end_log: &TimeSeries<bool>,
) {
    if !is_shutdown.swap(true, Ordering::AcqRel) {
        inner.lock().shutdown();
    }
    action_start_log.shutdown();
    action_end_log.shutdown();
}

/// 看门狗主循环
///
/// 对每个动作 `t`：结束必须在开始后 `max_action_duration` 内出现，
/// 下一个开始必须在 `max_inter_action_duration` 内出现。
/// 等待失败时先确认不是主动停机，再记录违约并停机。
fn watchdog_loop<D: RobotDriver>(
    inner: &Mutex<D>,
    is_shutdown: &AtomicBool,
    action_start_log: &TimeSeries<bool>,
    action_end_log: &TimeSeries<bool>,
    error_message: &ArcSwapOption<String>,
    max_action_duration: Duration,
    max_inter_action_duration: Duration,
) {
    let trip = |message: &str| {
        error_message.store(Some(Arc::new(message.to_string())));
        error!("{}", message);
        shutdown_robot(inner, is_shutdown, action_start_log, action_end_log);
    };

    // 等待第一个动作开始
    while !is_shutdown.load(Ordering::Acquire)
        && !action_start_log.wait_for_timeindex(0, STARTUP_POLL_INTERVAL)
    {}

    let mut t = 0;
    while !is_shutdown.load(Ordering::Acquire) {
        if !action_end_log.wait_for_timeindex(t, max_action_duration) {
            if is_shutdown.load(Ordering::Acquire) {
                return;
            }
            trip("Action did not end on time, shutting down.");
            return;
        }
        if !action_start_log.wait_for_timeindex(t + 1, max_inter_action_duration) {
            if is_shutdown.load(Ordering::Acquire) {
                return;
            }
            trip("Action did not start on time, shutting down.");
            return;
        }
        t += 1;
    }
}
