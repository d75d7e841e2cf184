//! 查询保护：取消与超时
//!
//! 每个执行器调用都携带一个 `QueryGuard`，实现方在开始工作前
//! 以及长时间循环中调用 `check()`

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::error::StorageError;

/// 可跨线程共享的取消标记
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryGuard {
    token: CancellationToken,
    started: Option<Instant>,
    deadline: Option<Instant>,
}

impl QueryGuard {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            started: None,
            deadline: None,
        }
    }

    /// 从当前时刻开始计时
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let now = Instant::now();
        self.started = Some(now);
        self.deadline = now.checked_add(timeout);
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn check(&self) -> Result<(), StorageError> {
        if self.token.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        if let (Some(started), Some(deadline)) = (self.started, self.deadline) {
            let now = Instant::now();
            if now >= deadline {
                let elapsed_ms = now.duration_since(started).as_millis() as u64;
                return Err(StorageError::Timeout { elapsed_ms });
            }
        }
        Ok(())
    }
}
