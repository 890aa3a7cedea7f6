//! 进程级中断闩锁
//!
//! 把 OS 中断信号（Ctrl-C / SIGINT）折叠进一个进程级的原子布尔。
//! 闩锁在首个后端构造时惰性安装，初始化后只读（内部原子）；
//! 后端的关闭条件是自身关闭标志与该闩锁的逻辑或。

use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

static INTERRUPT_RECEIVED: AtomicBool = AtomicBool::new(false);
static INSTALL: Once = Once::new();

/// 安装中断信号处理器（幂等）
///
/// 第一次调用注册 Ctrl-C 处理器，此后的调用不做任何事。
/// 注册失败（例如嵌入程序已自行注册处理器）只记录警告——
/// 此时程序侧负责转发中断，或改用 [`crate::RobotBackend::request_shutdown`]。
pub fn install_interrupt_latch() {
    INSTALL.call_once(|| match ctrlc::set_handler(|| {
        INTERRUPT_RECEIVED.store(true, Ordering::SeqCst);
    }) {
        Ok(()) => debug!("interrupt latch installed"),
        Err(e) => warn!(
            "Failed to install interrupt handler: {}. \
             Shutdown on Ctrl-C must be forwarded via request_shutdown().",
            e
        ),
    });
}

/// 进程是否已收到中断信号
pub fn has_received_interrupt() -> bool {
    INTERRUPT_RECEIVED.load(Ordering::SeqCst)
}
