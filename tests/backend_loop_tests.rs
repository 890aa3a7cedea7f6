//! 后端循环集成测试
//!
//! 用 Mock 驱动端到端地验证循环的周期语义、超时策略与停机路径。

use robot_loop::{
    BackendConfig, ErrorStatus, RobotBackend, RobotData, RobotDriver, RobotFrontend, SeriesError,
};
use robot_loop::DriverError;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

type Action = [f64; 3];
type Observation = [f64; 3];

/// 简单 Mock 驱动：固定观测，原样施加动作，统计停机次数
struct MirrorDriver {
    observation: Observation,
    /// 返回 `Some(error)` 的 get_error 调用序号（0 起）
    error_on_tick: Option<u32>,
    error_message: &'static str,
    get_error_calls: u32,
    shutdown_probe: Arc<AtomicU32>,
}

impl MirrorDriver {
    fn new(observation: Observation, shutdown_probe: Arc<AtomicU32>) -> Self {
        Self {
            observation,
            error_on_tick: None,
            error_message: "",
            get_error_calls: 0,
            shutdown_probe,
        }
    }

    fn with_error_on_tick(mut self, tick: u32, message: &'static str) -> Self {
        self.error_on_tick = Some(tick);
        self.error_message = message;
        self
    }
}

impl RobotDriver for MirrorDriver {
    type Action = Action;
    type Observation = Observation;

    fn initialize(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    fn get_latest_observation(&mut self) -> Observation {
        self.observation
    }

    fn apply_action(&mut self, desired: Action) -> Action {
        desired
    }

    fn get_error(&mut self) -> Option<String> {
        let tick = self.get_error_calls;
        self.get_error_calls += 1;
        match self.error_on_tick {
            Some(error_tick) if tick >= error_tick => Some(self.error_message.to_string()),
            _ => None,
        }
    }

    fn shutdown(&mut self) {
        self.shutdown_probe.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_single_tick_roundtrip() {
    // 周期 0：观测 O 被发布，动作 A 被原样施加，状态无错误
    let observation = [1.0, 2.0, 3.0];
    let action = [0.1, 0.2, 0.3];
    let probe = Arc::new(AtomicU32::new(0));

    let data = Arc::new(RobotData::<Action, Observation>::new(100));
    let backend = RobotBackend::new(
        MirrorDriver::new(observation, probe.clone()),
        data.clone(),
        None,
    );
    backend.initialize().unwrap();

    let frontend = RobotFrontend::new(data);
    let t = frontend.append_desired_action(action).unwrap();
    assert_eq!(t, 0);

    frontend.wait_until_timeindex(0).unwrap();
    assert_eq!(frontend.get_observation(0).unwrap(), observation);
    assert_eq!(frontend.get_desired_action(0).unwrap(), action);
    assert_eq!(frontend.get_applied_action(0).unwrap(), action);
    assert_eq!(frontend.get_status(0).unwrap().error_status, ErrorStatus::None);
    assert!(frontend.get_timestamp_ms(0).unwrap() > 0.0);

    backend.request_shutdown();
    backend.wait_until_terminated();
    assert!(!backend.is_running());
    assert_eq!(probe.load(Ordering::SeqCst), 1);
}

#[test]
fn test_driver_error_stops_loop() {
    // 驱动在周期 7 上报 "overheat"：status[7] 为 DriverError，
    // applied_action[7] 不存在，循环停机
    let probe = Arc::new(AtomicU32::new(0));
    let driver =
        MirrorDriver::new([0.0; 3], probe.clone()).with_error_on_tick(7, "overheat");

    let data = Arc::new(RobotData::<Action, Observation>::new(100));
    let config = BackendConfig {
        real_time_mode: false,
        ..BackendConfig::default()
    };
    let backend = RobotBackend::new(driver, data.clone(), Some(config));

    let frontend = RobotFrontend::new(data.clone());
    for i in 0..10 {
        frontend.append_desired_action([i as f64; 3]).unwrap();
    }

    backend.wait_until_terminated();

    let status = frontend.get_status(7).unwrap();
    assert_eq!(status.error_status, ErrorStatus::DriverError);
    assert_eq!(status.error_message, "overheat");
    for t in 0..7 {
        assert_eq!(frontend.get_status(t).unwrap().error_status, ErrorStatus::None);
    }
    // 周期 7 没有施加动作
    assert_eq!(data.applied_action.newest_timeindex(), Some(6));
    assert_eq!(probe.load(Ordering::SeqCst), 1);

    let metrics = backend.metrics();
    assert_eq!(metrics.ticks_total, 8);
    assert_eq!(metrics.actions_applied_total, 7);
    assert_eq!(metrics.driver_errors_total, 1);
}

#[test]
fn test_first_action_timeout() {
    // 超时为 0 且没有任何动作：以后端错误停机，status[0] 携带原因
    let probe = Arc::new(AtomicU32::new(0));
    let data = Arc::new(RobotData::<Action, Observation>::new(100));
    let config = BackendConfig {
        first_action_timeout: Some(Duration::ZERO),
        ..BackendConfig::default()
    };
    let backend = RobotBackend::new(
        MirrorDriver::new([0.0; 3], probe.clone()),
        data.clone(),
        Some(config),
    );

    backend.wait_until_terminated();
    assert!(!backend.is_running());

    let frontend = RobotFrontend::new(data);
    let status = frontend.get_status(0).unwrap();
    assert_eq!(status.error_status, ErrorStatus::BackendError);
    assert_eq!(status.error_message, "First action was not provided in time");
    assert_eq!(probe.load(Ordering::SeqCst), 1);
}

#[test]
fn test_max_number_of_actions() {
    // 上限 3：恰好施加 3 个动作，status[3] 携带上限错误
    let probe = Arc::new(AtomicU32::new(0));
    let data = Arc::new(RobotData::<Action, Observation>::new(100));
    let config = BackendConfig {
        real_time_mode: false,
        max_number_of_actions: 3,
        ..BackendConfig::default()
    };
    let backend = RobotBackend::new(
        MirrorDriver::new([0.0; 3], probe.clone()),
        data.clone(),
        Some(config),
    );

    let frontend = RobotFrontend::new(data.clone());
    for i in 0..3 {
        frontend.append_desired_action([i as f64; 3]).unwrap();
    }

    backend.wait_until_terminated();

    for t in 0..3 {
        assert_eq!(frontend.get_status(t).unwrap().error_status, ErrorStatus::None);
        assert_eq!(frontend.get_applied_action(t).unwrap(), [t as f64; 3]);
    }
    let status = frontend.get_status(3).unwrap();
    assert_eq!(status.error_status, ErrorStatus::BackendError);
    assert_eq!(status.error_message, "Maximum number of actions reached.");
    assert_eq!(data.applied_action.newest_timeindex(), Some(2));
    assert_eq!(backend.metrics().actions_applied_total, 3);
}

#[test]
fn test_action_repetitions_then_deadline_error() {
    // 实时模式，重复额度 2，只提供索引 0 的动作：
    // status[1]、status[2] 的重复计数为 1、2，status[3] 携带截止错误
    let probe = Arc::new(AtomicU32::new(0));
    let data = Arc::new(RobotData::<Action, Observation>::new(100));
    let backend = RobotBackend::new(
        MirrorDriver::new([0.0; 3], probe.clone()),
        data.clone(),
        None,
    );
    backend.set_max_action_repetitions(2);
    assert_eq!(backend.get_max_action_repetitions(), 2);

    let action = [0.5, 0.5, 0.5];
    let frontend = RobotFrontend::new(data.clone());
    frontend.append_desired_action(action).unwrap();

    backend.wait_until_terminated();

    assert_eq!(frontend.get_status(0).unwrap().action_repetitions, 0);
    assert_eq!(frontend.get_status(1).unwrap().action_repetitions, 1);
    assert_eq!(frontend.get_status(2).unwrap().action_repetitions, 2);

    let status = frontend.get_status(3).unwrap();
    assert_eq!(status.error_status, ErrorStatus::BackendError);
    assert_eq!(status.error_message, "Next action was not provided in time");

    // 重复的动作与原动作一致，且恰好施加 3 次（原始 + 2 次重复）
    for t in 0..3 {
        assert_eq!(frontend.get_desired_action(t).unwrap(), action);
        assert_eq!(frontend.get_applied_action(t).unwrap(), action);
    }
    assert_eq!(data.applied_action.newest_timeindex(), Some(2));

    let metrics = backend.metrics();
    assert_eq!(metrics.action_repetitions_total, 2);
    assert_eq!(metrics.deadline_misses_total, 3);
}

#[test]
fn test_non_real_time_mode_blocks_without_error() {
    // 非实时模式：动作迟到不报错、不重复，循环阻塞等待
    let probe = Arc::new(AtomicU32::new(0));
    let data = Arc::new(RobotData::<Action, Observation>::new(100));
    let config = BackendConfig {
        real_time_mode: false,
        ..BackendConfig::default()
    };
    let backend = RobotBackend::new(
        MirrorDriver::new([9.0; 3], probe.clone()),
        data.clone(),
        Some(config),
    );

    let (applied_tx, applied_rx) = crossbeam_channel::unbounded::<Action>();
    let frontend = RobotFrontend::new(data.clone());
    let producer = std::thread::spawn({
        let frontend = frontend.clone();
        move || {
            for i in 0..3 {
                std::thread::sleep(Duration::from_millis(150));
                let action = [i as f64; 3];
                frontend.append_desired_action(action).unwrap();
                applied_tx.send(action).unwrap();
            }
        }
    });
    producer.join().unwrap();

    // 等全部三个周期提交
    frontend.wait_until_timeindex(2).unwrap();
    for t in 0..3 {
        let status = frontend.get_status(t).unwrap();
        assert_eq!(status.error_status, ErrorStatus::None);
        assert_eq!(status.action_repetitions, 0);
        assert_eq!(frontend.get_applied_action(t).unwrap(), applied_rx.recv().unwrap());
    }
    assert_eq!(backend.metrics().deadline_misses_total, 0);
    assert!(backend.is_running());

    backend.request_shutdown();
    backend.request_shutdown(); // 幂等
    backend.wait_until_terminated();
    assert_eq!(probe.load(Ordering::SeqCst), 1);
}

#[test]
fn test_immediate_destruction_is_clean() {
    // 构造后立即析构：干净终止，驱动 shutdown 恰好一次
    let probe = Arc::new(AtomicU32::new(0));
    {
        let data = Arc::new(RobotData::<Action, Observation>::new(10));
        let _backend = RobotBackend::new(
            MirrorDriver::new([0.0; 3], probe.clone()),
            data,
            None,
        );
    }
    assert_eq!(probe.load(Ordering::SeqCst), 1);
}

#[test]
fn test_shutdown_propagates_to_bundle_on_drop() {
    // 后端析构后关闭传播到数据束：追加失败，但历史仍可读
    let probe = Arc::new(AtomicU32::new(0));
    let data = Arc::new(RobotData::<Action, Observation>::new(10));
    let frontend = RobotFrontend::new(data.clone());

    {
        let backend = RobotBackend::new(
            MirrorDriver::new([4.0; 3], probe.clone()),
            data.clone(),
            None,
        );
        frontend.append_desired_action([1.0; 3]).unwrap();
        frontend.wait_until_timeindex(0).unwrap();
        backend.request_shutdown();
        backend.wait_until_terminated();
        // 停机过程中序列仍是纯缓冲，追加成功
        assert!(frontend.append_desired_action([2.0; 3]).is_ok());
    }

    assert!(matches!(
        frontend.append_desired_action([3.0; 3]),
        Err(SeriesError::ShutDown)
    ));
    assert_eq!(frontend.get_observation(0).unwrap(), [4.0; 3]);
    assert_eq!(frontend.get_status(0).unwrap().error_status, ErrorStatus::None);
}
