//! Robot 模块
//!
//! Robot 模块是控制循环层，负责：
//! - 后端循环：实时线程驱动"观测 → 期望动作 → 施加动作 → 状态提交"的周期
//! - 数据束：四条共享历史长度的时间序列（期望动作/实际动作/观测/状态）
//! - 驱动契约：硬件驱动需要实现的五个同步操作
//! - 前端门面：按时间索引读写数据束，支持阻塞等待未来索引
//! - 守护包装：对驱动施加动作时序约束的看门狗（`MonitoredRobotDriver`）

mod backend;
mod cycle;
mod data;
mod driver;
mod frontend;
mod metrics;
mod monitor;
mod njoint;

pub use backend::RobotBackend;
pub use cycle::BackendConfig;
pub use data::RobotData;
pub use driver::{DriverError, RobotDriver};
pub use frontend::RobotFrontend;
pub use metrics::{BackendMetrics, MetricsSnapshot};
pub use monitor::MonitoredRobotDriver;
pub use njoint::NJointAction;
