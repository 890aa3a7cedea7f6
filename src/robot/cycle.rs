//! 后端控制循环
//!
//! 在专用线程上执行"观测 → 截止检查 → 驱动错误轮询 → 状态提交 → 施加动作"
//! 的周期，并实现超时策略（实时/阻塞模式、动作重复、首动作超时、动作上限、
//! 错误发布、协作式停机）。循环不做节拍限制：节奏由驱动的
//! `apply_action` 和动作生产侧的频率决定。

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::{Duration, Instant};
use thread_priority::{ThreadPriority, set_current_thread_priority};
use tracing::{debug, error, warn};

use crate::robot::data::RobotData;
use crate::robot::driver::RobotDriver;
use crate::robot::metrics::BackendMetrics;
use crate::signal;
use crate::status::{ErrorStatus, Status};

/// 循环检查停机请求的间隔
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 后端配置
///
/// # Example
///
/// ```
/// use robot_loop::BackendConfig;
/// use std::time::Duration;
///
/// // 默认配置：实时模式，首动作永不超时，动作数不设上限
/// let config = BackendConfig::default();
///
/// // 自定义配置
/// let config = BackendConfig {
///     real_time_mode: false,
///     first_action_timeout: Some(Duration::from_secs(10)),
///     max_number_of_actions: 5000,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// 实时模式开关
    ///
    /// 开启时，新动作必须在周期开始前到位：未到位则自动重复上一动作，
    /// 重复额度（`max_action_repetitions`）用尽后以错误停机。
    /// 关闭时，循环阻塞等待动作到位，不重复、不报错。
    pub real_time_mode: bool,

    /// 首动作超时
    ///
    /// 从循环启动到收到第一个期望动作的最长等待时间。
    /// `None` 表示无限等待。超时后以后端错误停机。
    pub first_action_timeout: Option<Duration>,

    /// 动作数上限（0 = 不设上限）
    ///
    /// 施加了指定数量的动作后，循环以统一的状态驱动路径自动停机。
    pub max_number_of_actions: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            real_time_mode: true,
            first_action_timeout: None,
            max_number_of_actions: 0,
        }
    }
}

/// 驱动的共享句柄
///
/// 后端句柄持有它以便转发 `initialize()`，循环线程持有它执行其余操作；
/// 启动之后只有循环线程触碰驱动（行为上的独占）。
pub(crate) type SharedDriver<A, O> =
    Arc<Mutex<dyn RobotDriver<Action = A, Observation = O> + Send>>;

/// 控制循环主体（在专用线程上运行）
///
/// 退出路径唯一：任何致命条件（错误状态提交、停机请求、序列关闭）
/// 都落到循环末尾的 `driver.shutdown()`，恰好执行一次，
/// 随后 `loop_is_running` 置为 false。
pub(crate) fn control_loop<A, O>(
    driver: SharedDriver<A, O>,
    data: Arc<RobotData<A, O>>,
    config: BackendConfig,
    max_action_repetitions: Arc<AtomicU32>,
    is_shutdown_requested: Arc<AtomicBool>,
    loop_is_running: Arc<AtomicBool>,
    metrics: Arc<BackendMetrics>,
) where
    A: Clone + 'static,
    O: Clone + 'static,
{
    // 提升线程优先级（尽力而为：多数系统需要额外权限）
    match set_current_thread_priority(ThreadPriority::Max) {
        Ok(()) => debug!("control loop thread priority set to max"),
        Err(e) => warn!(
            "Failed to set control loop thread priority: {:?}. \
             On Linux this usually needs CAP_SYS_NICE; continuing at normal priority.",
            e
        ),
    }

    let has_shutdown_request =
        || is_shutdown_requested.load(Ordering::Acquire) || signal::has_received_interrupt();

    let start_time = Instant::now();

    // === AwaitingFirstAction：等待 desired_action 产生索引 0 ===
    while !has_shutdown_request()
        && !data.desired_action.wait_for_timeindex(0, SHUTDOWN_POLL_INTERVAL)
    {
        if let Some(timeout) = config.first_action_timeout
            && start_time.elapsed() > timeout
        {
            let mut status = Status::default();
            status.set_error(
                ErrorStatus::BackendError,
                "First action was not provided in time",
            );
            error!("Error: {}. Robot is shut down.", status.error_message);
            let _ = data.status.append(status);
            is_shutdown_requested.store(true, Ordering::Release);
            break;
        }
    }

    // === Running：周期 t 的五步 ===
    let mut t: u64 = 0;
    while !has_shutdown_request() {
        let mut status = Status::default();

        if config.max_number_of_actions > 0 && t >= u64::from(config.max_number_of_actions) {
            // 语义上是正常完成，走统一的状态驱动退出路径
            status.set_error(ErrorStatus::BackendError, "Maximum number of actions reached.");
        }

        // 1. 采集并发布观测
        let observation = driver.lock().get_latest_observation();
        if data.observation.append(observation).is_err() {
            break;
        }

        // 2. 实时模式的截止检查：本周期动作未到位则先重复上一动作，
        //    重复额度用尽后报错
        if config.real_time_mode
            && data.desired_action.newest_timeindex().is_none_or(|newest| newest < t)
        {
            metrics.deadline_misses_total.fetch_add(1, Ordering::Relaxed);

            // 上一周期的重复计数；t=0 时状态序列还是空的，按 0 处理
            let repetitions = data
                .status
                .newest_element()
                .map(|s| s.action_repetitions)
                .unwrap_or(0);

            if repetitions < max_action_repetitions.load(Ordering::Acquire) {
                match data.desired_action.newest_element() {
                    Ok(last_action) => {
                        if data.desired_action.append(last_action).is_err() {
                            break;
                        }
                        status.action_repetitions = repetitions + 1;
                        metrics.action_repetitions_total.fetch_add(1, Ordering::Relaxed);
                    },
                    // Running 状态下动作序列非空；仅并发关闭时可达
                    Err(_) => break,
                }
            } else {
                status.set_error(ErrorStatus::BackendError, "Next action was not provided in time");
            }
        }

        // 3. 轮询驱动错误
        if let Some(message) = driver.lock().get_error() {
            metrics.driver_errors_total.fetch_add(1, Ordering::Relaxed);
            status.set_error(ErrorStatus::DriverError, message);
        }

        // 4. 周期提交点：追加 status[t]
        let has_error = status.has_error();
        if has_error {
            error!("Error: {}. Robot is shut down.", status.error_message);
        }
        if data.status.append(status).is_err() {
            break;
        }
        metrics.ticks_total.fetch_add(1, Ordering::Relaxed);
        if has_error {
            break;
        }

        // 5. 等待本周期动作到位（每 100ms 检查一次停机请求），施加并发布
        while !has_shutdown_request()
            && !data.desired_action.wait_for_timeindex(t, SHUTDOWN_POLL_INTERVAL)
        {}
        if has_shutdown_request() {
            break;
        }

        let desired = match data.desired_action.get(t) {
            Ok(action) => action,
            Err(_) => break,
        };
        let applied = driver.lock().apply_action(desired);
        if data.applied_action.append(applied).is_err() {
            break;
        }
        metrics.actions_applied_total.fetch_add(1, Ordering::Relaxed);

        t += 1;
    }

    // === Draining → Stopped：安全停机，恰好一次 ===
    driver.lock().shutdown();
    // Release: loop_is_running 变为 false 时，停机副作用对观察者可见
    loop_is_running.store(false, Ordering::Release);
}
