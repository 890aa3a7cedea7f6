//! Robot Loop - 机器人实时控制循环运行时
//!
//! 在用户侧控制程序（按固定节拍产生期望动作）与机器人硬件驱动之间，
//! 提供按时间索引（TimeIndex）同步的有界历史数据交换，并保证每个控制周期：
//! 观测被采集并发布、恰好一个动作被施加、超时违约以结构化状态暴露。
//!
//! # 架构层次
//!
//! - **同步基底** (`series`): 有界、单写多读、可阻塞等待未来索引的时间序列
//! - **控制循环层** (`robot`): 后端实时循环、数据束（bundle）、驱动契约、前端读写门面
//! - **横切关注** (`status`, `signal`): 每周期状态值、进程级中断闩锁
//!
//! # 使用方式
//!
//! ```no_run
//! use robot_loop::{BackendConfig, RobotBackend, RobotData, RobotFrontend};
//! # use robot_loop::{DriverError, RobotDriver};
//! # struct MyDriver;
//! # impl RobotDriver for MyDriver {
//! #     type Action = [f64; 3];
//! #     type Observation = [f64; 3];
//! #     fn initialize(&mut self) -> Result<(), DriverError> { Ok(()) }
//! #     fn get_latest_observation(&mut self) -> Self::Observation { [0.0; 3] }
//! #     fn apply_action(&mut self, desired: Self::Action) -> Self::Action { desired }
//! #     fn get_error(&mut self) -> Option<String> { None }
//! #     fn shutdown(&mut self) {}
//! # }
//! use std::sync::Arc;
//!
//! let data = Arc::new(RobotData::<[f64; 3], [f64; 3]>::new(1000));
//! let backend = RobotBackend::new(MyDriver, data.clone(), None);
//! backend.initialize().unwrap();
//!
//! let frontend = RobotFrontend::new(data);
//! let t = frontend.append_desired_action([0.1, 0.2, 0.3]).unwrap();
//! let observation = frontend.get_observation(t).unwrap();
//! # let _ = observation;
//! ```

pub mod robot;
pub mod series;
pub mod signal;
pub mod status;

// Re-export 核心类型（简化用户导入）
pub use robot::{
    BackendConfig, BackendMetrics, DriverError, MetricsSnapshot, MonitoredRobotDriver,
    NJointAction, RobotBackend, RobotData, RobotDriver, RobotFrontend,
};
pub use series::{SeriesError, TimeIndex, TimeSeries};
pub use status::{ErrorStatus, Status};
