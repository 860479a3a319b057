//! 消费循环监管

use crate::{
    Handler, Registry, Shutdown, Signal,
    consumer::{Exit, consume},
    domain::Broker,
};
use std::sync::Arc;
use tokio::{
    task::JoinSet,
    time::{Duration, sleep},
};
use tracing::{error, info, instrument, warn};

/// 重启策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartPolicy {
    /// 是否重启失败的消费循环
    pub enabled: bool,
    /// 首次重启前的等待时长
    pub initial: Duration,
    /// 等待时长上限
    pub max: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            initial: Duration::from_millis(500),
            max: Duration::from_secs(30),
        }
    }
}

impl RestartPolicy {
    /// 第 `attempt` 次重启前的等待时长，从 0 开始计数
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial
            .saturating_mul(1 << attempt.min(31))
            .min(self.max)
    }
}

/// 消费循环的最终结果
#[derive(Debug)]
pub struct Report {
    /// 主题
    pub topic: String,
    /// 退出原因
    pub exit: Exit,
    /// 重启次数
    pub restarts: u32,
}

/// 消费循环监管者，每个主题一个独立任务
pub struct Supervisor {
    tasks: JoinSet<Report>,
    policy: RestartPolicy,
}

impl Supervisor {
    /// 为注册表中的每个主题启动消费循环
    pub fn launch<B: Broker>(
        registry: Registry,
        broker: Arc<B>,
        shutdown: &Shutdown,
        policy: RestartPolicy,
    ) -> Self {
        let mut supervisor = Self {
            tasks: JoinSet::new(),
            policy,
        };
        supervisor.spawn(registry, broker, shutdown);
        supervisor
    }

    /// 追加启动消费循环
    pub fn spawn<B: Broker>(&mut self, registry: Registry, broker: Arc<B>, shutdown: &Shutdown) {
        for (topic, handler) in registry {
            info!("启动主题 {topic} 消费循环");
            self.tasks.spawn(supervise(
                Arc::clone(&broker),
                topic,
                handler,
                shutdown.signal(),
                self.policy.clone(),
            ));
        }
    }

    /// 运行中的任务数量
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// 是否没有运行中的任务
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// 等待全部任务结束并收集结果
    pub async fn join(&mut self) -> Vec<Report> {
        let mut reports = Vec::with_capacity(self.tasks.len());
        self.join_into(&mut reports).await;
        reports
    }

    /// 等待全部任务结束，结果逐个写入 `reports`
    ///
    /// future 中途被丢弃时，已结束任务的结果仍保留在 `reports` 中。
    pub async fn join_into(&mut self, reports: &mut Vec<Report>) {
        while let Some(result) = self.tasks.join_next().await {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => error!("消费任务发生错误：{e}"),
            }
        }
    }

    /// 中止剩余任务
    pub fn abort(&mut self) {
        self.tasks.abort_all();
    }
}

#[instrument(name = "supervise_topic", skip(broker, handler, signal, policy))]
async fn supervise<B: Broker>(
    broker: Arc<B>,
    topic: String,
    handler: Handler,
    mut signal: Signal,
    policy: RestartPolicy,
) -> Report {
    let mut restarts = 0;
    loop {
        let exit = consume(
            Arc::clone(&broker),
            topic.clone(),
            Arc::clone(&handler),
            signal.clone(),
        )
        .await;

        let err = match exit {
            Exit::Failed(e) if policy.enabled && !signal.is_cancelled() => e,
            exit => {
                return Report {
                    topic,
                    exit,
                    restarts,
                };
            }
        };

        let delay = policy.backoff(restarts);
        warn!("消费循环失败：{err}，{delay:?} 后重启");
        tokio::select! {
            biased;
            _ = signal.cancelled() => {
                info!("等待重启期间收到关闭信号");
                return Report {
                    topic,
                    exit: Exit::Failed(err),
                    restarts,
                };
            }
            _ = sleep(delay) => restarts += 1,
        }
    }
}
