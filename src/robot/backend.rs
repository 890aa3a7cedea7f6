//! 后端句柄模块
//!
//! 对外的 `RobotBackend` 结构体：构造即启动循环线程，封装停机标志、
//! 重复额度与指标的共享细节。

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::error;

use crate::robot::cycle::{BackendConfig, SharedDriver, control_loop};
use crate::robot::data::RobotData;
use crate::robot::driver::{DriverError, RobotDriver};
use crate::robot::metrics::{BackendMetrics, MetricsSnapshot};
use crate::signal;

/// `wait_until_terminated` 的轮询间隔
const TERMINATION_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 驱动与数据束之间的通信后端
///
/// 构造时安装进程级中断闩锁（惰性、一次），随后启动循环线程。
/// 每个周期循环从驱动读取观测写入数据束，从数据束取出期望动作
/// 施加到驱动。析构请求停机并 join 线程，然后把关闭传播到数据束。
/// 不支持重新启动：停机后需构造新的后端。
pub struct RobotBackend<A, O> {
    /// 驱动共享句柄（句柄侧只用于 `initialize`）
    driver: SharedDriver<A, O>,
    /// 共享数据束
    data: Arc<RobotData<A, O>>,
    /// 停机请求标志（`request_shutdown` 置位，循环轮询）
    is_shutdown_requested: Arc<AtomicBool>,
    /// 循环是否仍在运行
    loop_is_running: Arc<AtomicBool>,
    /// 动作未到位时自动重复上一动作的最大次数（实时模式）
    max_action_repetitions: Arc<AtomicU32>,
    /// 循环指标
    metrics: Arc<BackendMetrics>,
    /// 循环线程句柄（Drop 时 join）
    thread: Option<JoinHandle<()>>,
}

impl<A, O> RobotBackend<A, O>
where
    A: Clone + Send + 'static,
    O: Clone + Send + 'static,
{
    /// 创建后端并启动循环线程
    ///
    /// # 参数
    /// - `driver`: 硬件驱动（循环运行期间由后端独占）
    /// - `data`: 共享数据束
    /// - `config`: 后端配置（`None` 使用默认值：实时模式、首动作不超时、
    ///   动作数不设上限）
    pub fn new(
        driver: impl RobotDriver<Action = A, Observation = O> + Send + 'static,
        data: Arc<RobotData<A, O>>,
        config: Option<BackendConfig>,
    ) -> Self {
        signal::install_interrupt_latch();

        let driver: SharedDriver<A, O> = Arc::new(Mutex::new(driver));
        let config = config.unwrap_or_default();
        let is_shutdown_requested = Arc::new(AtomicBool::new(false));
        let loop_is_running = Arc::new(AtomicBool::new(true));
        let max_action_repetitions = Arc::new(AtomicU32::new(0));
        let metrics = Arc::new(BackendMetrics::new());

        let thread = std::thread::spawn({
            let driver = driver.clone();
            let data = data.clone();
            let max_action_repetitions = max_action_repetitions.clone();
            let is_shutdown_requested = is_shutdown_requested.clone();
            let loop_is_running = loop_is_running.clone();
            let metrics = metrics.clone();
            move || {
                control_loop(
                    driver,
                    data,
                    config,
                    max_action_repetitions,
                    is_shutdown_requested,
                    loop_is_running,
                    metrics,
                );
            }
        });

        Self {
            driver,
            data,
            is_shutdown_requested,
            loop_is_running,
            max_action_repetitions,
            metrics,
            thread: Some(thread),
        }
    }

    /// 初始化驱动（委托给 [`RobotDriver::initialize`]）
    ///
    /// 在开始生产动作之前调用；失败会原样返回给调用方。
    pub fn initialize(&self) -> Result<(), DriverError> {
        self.driver.lock().initialize()
    }

    /// 动作未到位时自动重复上一动作的最大次数
    pub fn get_max_action_repetitions(&self) -> u32 {
        self.max_action_repetitions.load(Ordering::Acquire)
    }

    /// 设置动作重复额度
    ///
    /// 实时模式下，新动作未按时到位时上一动作会被自动重新追加；
    /// 本值限制这种重复的连续次数（默认 0，即完全不重复），
    /// 超过后循环以错误停机。非实时模式下忽略。
    pub fn set_max_action_repetitions(&self, max_action_repetitions: u32) {
        self.max_action_repetitions.store(max_action_repetitions, Ordering::Release);
    }

    /// 请求循环停机（幂等）
    ///
    /// 循环最迟在下一个 100ms 等待边界退出。
    /// 用 [`RobotBackend::wait_until_terminated`] 确认已真正停止。
    pub fn request_shutdown(&self) {
        self.is_shutdown_requested.store(true, Ordering::Release);
    }

    /// 循环是否仍在运行
    pub fn is_running(&self) -> bool {
        self.loop_is_running.load(Ordering::Acquire)
    }

    /// 阻塞等待循环终止（每 100ms 轮询一次）
    pub fn wait_until_terminated(&self) {
        while self.is_running() {
            std::thread::sleep(TERMINATION_POLL_INTERVAL);
        }
    }

    /// 循环指标快照
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl<A, O> Drop for RobotBackend<A, O> {
    fn drop(&mut self) {
        self.is_shutdown_requested.store(true, Ordering::Release);
        if let Some(handle) = self.thread.take()
            && handle.join().is_err()
        {
            error!("backend control loop thread panicked");
        }
        // 关闭传播到数据束：仍在阻塞等待未来索引的前端读者被唤醒，
        // 历史数据保持可读
        self.data.shutdown();
    }
}
