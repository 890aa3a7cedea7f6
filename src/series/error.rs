//! 时间序列错误类型定义

use crate::series::TimeIndex;
use thiserror::Error;

/// 时间序列统一错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeriesError {
    /// 序列已关闭（追加失败，或等待的索引永远不会产生）
    #[error("Series has been shut down")]
    ShutDown,

    /// 索引已被驱逐出历史缓冲区
    ///
    /// 环形缓冲区只保留 `max_length` 个最新元素，更早的索引不可再读。
    #[error("Time index {index} is no longer in the history buffer (oldest available: {oldest})")]
    Evicted {
        /// 请求的索引
        index: TimeIndex,
        /// 当前可读的最旧索引
        oldest: TimeIndex,
    },

    /// 索引尚未产生（仅非阻塞读取返回）
    #[error("Time index {0} has not been produced yet")]
    NotYetProduced(TimeIndex),

    /// 序列为空（尚未有任何追加）
    #[error("Series is empty")]
    Empty,
}
