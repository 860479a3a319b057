//! 关闭信号
//!
//! 单写多读，只能从活动状态切换到取消状态一次。

use tokio::sync::watch;

/// 关闭信号的写端
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// 构造处于活动状态的信号
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// 获取信号的读端
    pub fn signal(&self) -> Signal {
        Signal {
            rx: self.tx.subscribe(),
        }
    }

    /// 触发关闭，仅首次调用返回 `true`
    pub fn trigger(&self) -> bool {
        self.tx.send_if_modified(|cancelled| {
            if *cancelled {
                false
            } else {
                *cancelled = true;
                true
            }
        })
    }

    /// 是否已触发
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// 关闭信号的读端
#[derive(Debug, Clone)]
pub struct Signal {
    rx: watch::Receiver<bool>,
}

impl Signal {
    /// 是否已取消，写端被丢弃同样视为取消
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// 等待取消，写端被丢弃同样视为取消
    pub async fn cancelled(&mut self) {
        let _ = self.rx.wait_for(|cancelled| *cancelled).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, timeout};

    #[test]
    fn trigger_flips_once() {
        let shutdown = Shutdown::new();
        let signal = shutdown.signal();
        assert!(!signal.is_cancelled());
        assert!(shutdown.trigger());
        assert!(!shutdown.trigger());
        assert!(shutdown.is_triggered());
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_wakes_waiters() {
        let shutdown = Shutdown::new();
        let mut first = shutdown.signal();
        let mut second = first.clone();
        let waiter = tokio::spawn(async move { first.cancelled().await });
        shutdown.trigger();
        timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        timeout(Duration::from_secs(1), second.cancelled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn late_subscriber_sees_cancellation() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let mut signal = shutdown.signal();
        assert!(signal.is_cancelled());
        timeout(Duration::from_millis(100), signal.cancelled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn dropped_writer_counts_as_cancelled() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.signal();
        assert!(!signal.is_cancelled());
        drop(shutdown);
        assert!(signal.is_cancelled());
        timeout(Duration::from_millis(100), signal.cancelled())
            .await
            .unwrap();
    }
}
