//! 每周期状态值
//!
//! 循环在每个周期的提交点向 `status` 序列追加一个 [`Status`]。
//! 观察者通过读取状态发现错误；错误不抛出，只发布。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 错误来源分类
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorStatus {
    /// 本周期成功
    #[default]
    None,
    /// 循环内部的时序/生命周期违约
    BackendError,
    /// 驱动上报的硬件错误
    DriverError,
}

/// 单个控制周期的结果
///
/// 后端与驱动的错误至多设置其一；[`Status::set_error`] 先到先得，
/// 已有错误时后续设置被忽略。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Status {
    /// 错误来源（`None` 表示本周期成功）
    pub error_status: ErrorStatus,
    /// 人类可读的错误描述（无错误时为空）
    pub error_message: String,
    /// 本周期为止上一动作被自动重复的次数
    pub action_repetitions: u32,
}

impl Status {
    /// 设置错误（先到先得）
    ///
    /// 已有错误时忽略后续调用，保证一个周期只报告最先发现的错误。
    pub fn set_error(&mut self, error_status: ErrorStatus, message: impl Into<String>) {
        if self.error_status != ErrorStatus::None {
            return;
        }
        self.error_status = error_status;
        self.error_message = message.into();
    }

    /// 本周期是否携带错误
    pub fn has_error(&self) -> bool {
        self.error_status != ErrorStatus::None
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error_status {
            ErrorStatus::None => write!(f, "ok (repetitions: {})", self.action_repetitions),
            ErrorStatus::BackendError => write!(f, "backend error: {}", self.error_message),
            ErrorStatus::DriverError => write!(f, "driver error: {}", self.error_message),
        }
    }
}
