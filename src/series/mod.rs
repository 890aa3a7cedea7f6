//! 时间序列模块
//!
//! 时间序列是循环与任意数量观察者/生产者之间的同步基底，负责：
//! - 有界历史：环形缓冲区最多保留 `max_length` 个最新元素，旧索引被驱逐
//! - 阻塞读取：读取尚未产生的索引会阻塞，直到元素产生、超时或序列关闭
//! - 单写多读：追加由单一生产者线程驱动，读取在任意线程安全
//! - 时间戳：每个元素在追加时记录墙钟时间（毫秒）

mod error;
mod time_series;

pub use error::SeriesError;
pub use time_series::{TimeIndex, TimeSeries};
