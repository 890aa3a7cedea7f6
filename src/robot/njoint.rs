//! 通用 n 关节动作类型
//!
//! 适用于任何在关节层面接受力矩/位置指令的 n 关节机器人。
//! 发送到机器人的最终力矩是 `torque + PD(position)`：
//! 把目标位置设为 NaN 可以逐关节关闭位置控制器，
//! 把增益设为 NaN 则使用驱动侧的默认增益。

use serde::{Deserialize, Serialize};

/// n 关节机器人的期望动作
///
/// 所有字段都是逐关节数组。[`NJointAction::UNSET`]（全 NaN）表示
/// "未指定"：位置为 NaN 的关节不做位置控制，增益为 NaN 的关节用默认增益。
///
/// 构造建议使用语义明确的工厂方法
/// （[`torque`](NJointAction::torque)、[`position`](NJointAction::position)、
/// [`torque_and_position`](NJointAction::torque_and_position)、
/// [`zero`](NJointAction::zero)）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "[f64; N]: Serialize", deserialize = "[f64; N]: Deserialize<'de>"))]
pub struct NJointAction<const N: usize> {
    /// 期望力矩（叠加在位置控制器的输出之上）
    pub torque: [f64; N],
    /// 期望位置（NaN = 该关节关闭位置控制器）
    pub position: [f64; N],
    /// 位置控制器 P 增益（NaN = 使用默认值）
    pub position_kp: [f64; N],
    /// 位置控制器 D 增益（NaN = 使用默认值）
    pub position_kd: [f64; N],
}

impl<const N: usize> NJointAction<N> {
    /// "未指定"哨兵：全 NaN 数组
    pub const UNSET: [f64; N] = [f64::NAN; N];

    /// 纯力矩动作（位置控制关闭）
    pub fn torque(torque: [f64; N]) -> Self {
        Self {
            torque,
            position: Self::UNSET,
            position_kp: Self::UNSET,
            position_kd: Self::UNSET,
        }
    }

    /// 纯位置动作（力矩为零，增益用默认值）
    pub fn position(position: [f64; N]) -> Self {
        Self {
            torque: [0.0; N],
            position,
            position_kp: Self::UNSET,
            position_kd: Self::UNSET,
        }
    }

    /// 力矩 + 位置组合动作
    pub fn torque_and_position(torque: [f64; N], position: [f64; N]) -> Self {
        Self {
            torque,
            position,
            position_kp: Self::UNSET,
            position_kd: Self::UNSET,
        }
    }

    /// 零力矩动作（位置控制关闭），常用作安全的初始/停机动作
    pub fn zero() -> Self {
        Self::default()
    }

    /// 替换位置控制器增益（NaN 表示对应关节用默认值）
    pub fn with_gains(mut self, position_kp: [f64; N], position_kd: [f64; N]) -> Self {
        self.position_kp = position_kp;
        self.position_kd = position_kd;
        self
    }
}

impl<const N: usize> Default for NJointAction<N> {
    fn default() -> Self {
        Self::torque([0.0; N])
    }
}
