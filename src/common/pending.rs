//! 在途请求计数
//!
//! 每个被接纳的请求登记一个计数单位，在其耗时消息入队之后释放。
//! 关闭流程通过 [`PendingWork::wait_idle`] 等待计数归零后再关闭耗时日志通道。

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    count: AtomicUsize,
    idle: Notify,
}

/// 共享的在途工作计数器
#[derive(Debug, Clone, Default)]
pub struct PendingWork {
    inner: Arc<Inner>,
}

impl PendingWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个工作单位，返回的守卫在释放时递减计数
    pub fn admit(&self) -> PendingGuard {
        self.inner.count.fetch_add(1, Ordering::AcqRel);
        PendingGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn count(&self) -> usize {
        self.inner.count.load(Ordering::Acquire)
    }

    /// 等待所有已登记的工作单位完成
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            // 先注册等待者再检查计数，避免错过唤醒
            notified.as_mut().enable();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// 工作单位守卫，任何退出路径（包括 panic 展开）都会递减计数
#[derive(Debug)]
pub struct PendingGuard {
    inner: Arc<Inner>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.inner.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}
