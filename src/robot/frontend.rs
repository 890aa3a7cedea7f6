//! 前端门面模块
//!
//! 按时间索引读写数据束的用户侧入口。前端只持有数据束的共享引用，
//! 可以廉价克隆，任意数量实例可以共存。

use std::sync::Arc;

use crate::robot::data::RobotData;
use crate::series::{SeriesError, TimeIndex};
use crate::status::Status;

/// 数据束的读写门面
///
/// 所有按索引的读取都是阻塞的：索引尚未产生时等待，直到元素产生
/// 或数据束被关闭。观察者约定在 `status[t]`（周期提交点）上同步——
/// 看到 `status[t]` 即可保证 `observation[t]` 已可读。
pub struct RobotFrontend<A, O> {
    data: Arc<RobotData<A, O>>,
}

impl<A: Clone, O: Clone> RobotFrontend<A, O> {
    /// 基于共享数据束创建前端
    pub fn new(data: Arc<RobotData<A, O>>) -> Self {
        Self { data }
    }

    /// 读取周期 `t` 的观测（阻塞）
    pub fn get_observation(&self, t: TimeIndex) -> Result<O, SeriesError> {
        self.data.observation.get(t)
    }

    /// 读取周期 `t` 的期望动作（阻塞）
    pub fn get_desired_action(&self, t: TimeIndex) -> Result<A, SeriesError> {
        self.data.desired_action.get(t)
    }

    /// 读取周期 `t` 实际施加的动作（阻塞）
    pub fn get_applied_action(&self, t: TimeIndex) -> Result<A, SeriesError> {
        self.data.applied_action.get(t)
    }

    /// 读取周期 `t` 的状态（阻塞）
    pub fn get_status(&self, t: TimeIndex) -> Result<Status, SeriesError> {
        self.data.status.get(t)
    }

    /// 读取周期 `t` 的观测时间戳（墙钟毫秒，阻塞）
    pub fn get_timestamp_ms(&self, t: TimeIndex) -> Result<f64, SeriesError> {
        self.data.observation.timestamp_ms(t)
    }

    /// 追加期望动作，返回其被赋予的时间索引
    ///
    /// 序列是纯缓冲：后端停机过程中追加仍然成功，
    /// 直到关闭传播到数据束后返回 [`SeriesError::ShutDown`]。
    pub fn append_desired_action(&self, action: A) -> Result<TimeIndex, SeriesError> {
        self.data.desired_action.append(action)
    }

    /// 阻塞等待周期 `t` 提交（即 `status[t]` 出现）
    pub fn wait_until_timeindex(&self, t: TimeIndex) -> Result<(), SeriesError> {
        self.data.status.timestamp_ms(t).map(|_| ())
    }

    /// 最新已提交周期的索引（尚无周期时为 `None`）
    pub fn get_current_timeindex(&self) -> Option<TimeIndex> {
        self.data.status.newest_timeindex()
    }
}

impl<A, O> Clone for RobotFrontend<A, O> {
    fn clone(&self) -> Self {
        Self { data: self.data.clone() }
    }
}
