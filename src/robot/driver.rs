//! 驱动契约定义
//!
//! 后端从硬件侧消费的抽象操作。实现者在构造后端时注入，
//! 循环运行期间驱动被后端独占（除 `initialize` 外的方法只在循环线程调用）。

use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// 初始化失败
    #[error("Driver initialization failed: {0}")]
    Initialization(String),

    /// 硬件故障
    #[error("Hardware fault: {0}")]
    Fault(String),
}

/// 机器人硬件驱动契约
///
/// 五个同步操作；动作与观测类型由实现者通过关联类型给定，
/// 它们只需可克隆并能跨线程移动。
///
/// # 契约
///
/// - [`initialize`](RobotDriver::initialize): 一次性准备，可以阻塞，
///   在循环首次使用驱动之前调用
/// - [`get_latest_observation`](RobotDriver::get_latest_observation):
///   非破坏性读取最近一次传感器快照，必须远快于循环周期返回
/// - [`apply_action`](RobotDriver::apply_action): 把期望动作下发到硬件，
///   返回实际施加的动作（可能因安全钳位而不同），同步执行
/// - [`get_error`](RobotDriver::get_error): `None` 表示无错误；
///   任何 `Some` 消息在当前周期按致命处理
/// - [`shutdown`](RobotDriver::shutdown): 把硬件置于安全状态，
///   循环退出时恰好调用一次
pub trait RobotDriver {
    /// 期望/实际动作类型
    type Action;
    /// 传感器观测类型
    type Observation;

    /// 一次性初始化（可阻塞）
    fn initialize(&mut self) -> Result<(), DriverError>;

    /// 读取最近的传感器快照
    fn get_latest_observation(&mut self) -> Self::Observation;

    /// 下发期望动作，返回实际施加的动作
    fn apply_action(&mut self, desired: Self::Action) -> Self::Action;

    /// 查询驱动错误（`None` = 无错误）
    fn get_error(&mut self) -> Option<String>;

    /// 安全停机
    fn shutdown(&mut self);
}
