//! 机器人数据束
//!
//! 把四条时间序列绑定在一起，历史长度一致、生命周期一致。
//! 除所有权归组外不含任何逻辑。

use crate::series::TimeSeries;
use crate::status::Status;

/// 后端与前端共享的数据束
///
/// 四条序列共享一个逻辑索引空间：循环在周期 `t` 结束时保证
/// `observation`、`applied_action`、`status` 都有索引 `t` 的元素
/// （`status[t]` 是周期的提交点）。`desired_action` 由前端写入，
/// 其余三条由循环独占写入。
///
/// 通过 `Arc<RobotData<A, O>>` 在后端与任意数量前端之间共享。
pub struct RobotData<A, O> {
    /// 期望动作（前端写，循环读）
    pub desired_action: TimeSeries<A>,
    /// 实际施加的动作（循环写）
    pub applied_action: TimeSeries<A>,
    /// 传感器观测（循环写）
    pub observation: TimeSeries<O>,
    /// 每周期状态（循环写，周期提交点）
    pub status: TimeSeries<Status>,
}

impl<A, O> RobotData<A, O> {
    /// 创建数据束，四条序列使用相同的历史长度
    pub fn new(history_length: usize) -> Self {
        Self {
            desired_action: TimeSeries::new(history_length),
            applied_action: TimeSeries::new(history_length),
            observation: TimeSeries::new(history_length),
            status: TimeSeries::new(history_length),
        }
    }

    /// 历史长度（四条序列一致）
    pub fn history_length(&self) -> usize {
        self.status.max_length()
    }

    /// 关闭全部序列（幂等），唤醒所有阻塞读者
    ///
    /// 已有元素仍然可读；只有追加和对未来索引的等待失败。
    pub fn shutdown(&self) {
        self.desired_action.shutdown();
        self.applied_action.shutdown();
        self.observation.shutdown();
        self.status.shutdown();
    }
}
