//! 进程生命周期控制

use crate::{
    Exit, Registry, Report, RestartPolicy, Shutdown, Signal, Supervisor,
    config::ConsumerConfig, domain::Broker,
};
use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::{
    sync::Mutex,
    time::{Duration, sleep, timeout},
};
use tracing::{error, info, warn};

/// 消费进程上下文
pub struct App {
    initiated: AtomicBool,
    shutdown: Shutdown,
    supervisor: Mutex<Option<Supervisor>>,
    grace: Duration,
    policy: RestartPolicy,
}

impl App {
    /// 构造函数
    pub fn new(cfg: &ConsumerConfig) -> Self {
        Self::with_policy(cfg.grace(), cfg.restart_policy())
    }

    /// 以指定的等待时长与重启策略构造
    pub fn with_policy(grace: Duration, policy: RestartPolicy) -> Self {
        Self {
            initiated: AtomicBool::new(false),
            shutdown: Shutdown::new(),
            supervisor: Mutex::new(None),
            grace,
            policy,
        }
    }

    /// 启动注册表中全部主题的消费循环
    pub async fn launch<B: Broker>(&self, registry: Registry, broker: Arc<B>) {
        if self.shutdown.is_triggered() {
            warn!("已开始退出，忽略启动请求");
            return;
        }
        let mut supervisor = self.supervisor.lock().await;
        match supervisor.as_mut() {
            Some(s) => s.spawn(registry, broker, &self.shutdown),
            None => {
                *supervisor = Some(Supervisor::launch(
                    registry,
                    broker,
                    &self.shutdown,
                    self.policy.clone(),
                ))
            }
        }
    }

    /// 获取关闭信号
    pub fn signal(&self) -> Signal {
        self.shutdown.signal()
    }

    /// 等待触发条件后优雅关闭
    pub async fn run_until<F>(&self, trigger: F) -> Vec<Report>
    where
        F: Future<Output = ()>,
    {
        trigger.await;
        self.shutdown().await
    }

    /// 优雅关闭，仅首次调用生效
    pub async fn shutdown(&self) -> Vec<Report> {
        if self
            .initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
            .is_err()
        {
            return Vec::new();
        }

        info!("开始优雅退出");
        self.shutdown.trigger();
        let mut guard = self.supervisor.lock().await;
        let Some(supervisor) = guard.as_mut() else {
            info!("没有运行中的消费循环");
            return Vec::new();
        };

        let mut reports = Vec::with_capacity(supervisor.len());
        if timeout(self.grace, supervisor.join_into(&mut reports))
            .await
            .is_err()
        {
            warn!("等待 {:?} 后仍有消费循环未退出，强制中止", self.grace);
            supervisor.abort();
            supervisor.join_into(&mut reports).await;
        }

        for report in &reports {
            match &report.exit {
                Exit::Cancelled => info!(topic = %report.topic, "消费循环已退出"),
                Exit::Failed(e) => error!(
                    topic = %report.topic,
                    restarts = report.restarts,
                    "消费循环曾失败：{e}"
                ),
            }
        }
        info!("优雅退出所有消费循环");
        reports
    }
}

/// 等待终止条件：Ctrl-C、SIGTERM，或到达固定运行时长
pub async fn terminate(lifetime: Option<Duration>) {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(_) => info!("收到 Ctrl-C 信号"),
            Err(e) => {
                error!("监听 Ctrl-C 信号失败: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let term = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
                info!("收到 SIGTERM 信号");
            }
            Err(e) => {
                error!("监听 SIGTERM 信号失败: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let term = std::future::pending::<()>();

    let deadline = async {
        match lifetime {
            Some(d) => {
                sleep(d).await;
                info!("到达固定运行时长 {d:?}");
            }
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = ctrl_c => (),
        _ = term => (),
        _ = deadline => (),
    }
}
