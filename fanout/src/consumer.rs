//! 主题消费循环

use crate::{
    Handler, Message, Signal,
    domain::{Broker, Subscription},
    errors::SubscriberError,
};
use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};
use tracing::{debug, error, info, instrument};

/// 消费循环退出原因
#[derive(Debug)]
pub enum Exit {
    /// 收到关闭信号
    Cancelled,
    /// 订阅或读取失败
    Failed(SubscriberError),
}

impl Exit {
    /// 是否因关闭信号退出
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Exit::Cancelled)
    }
}

/// 消费单个主题，直到收到关闭信号或读取失败
///
/// 订阅在退出时释放且仅释放一次；循环自身不会重启。
#[instrument(name = "consume_topic", skip(broker, handler, signal))]
pub async fn consume<B: Broker>(
    broker: Arc<B>,
    topic: String,
    handler: Handler,
    mut signal: Signal,
) -> Exit {
    let mut subscription = match broker.subscribe(&topic) {
        Ok(s) => s,
        Err(e) => {
            error!("订阅主题 {topic} 失败：{e}");
            return Exit::Failed(e);
        }
    };
    info!("成功订阅主题 {topic}");

    let exit = loop {
        tokio::select! {
            biased;
            _ = signal.cancelled() => {
                info!("收到关闭信号，开始优雅退出");
                break Exit::Cancelled;
            }
            data = subscription.recv() => match data {
                Ok(msg) => dispatch(&handler, &msg),
                Err(e) => {
                    error!("读取主题 {topic} 消息失败：{e}");
                    break Exit::Failed(e);
                }
            }
        }
    };

    subscription.close();
    debug!("释放主题 {topic} 订阅");
    exit
}

fn dispatch(handler: &Handler, msg: &Message) {
    debug!(partition = msg.partition, offset = msg.offset, "处理消息");
    if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(msg))) {
        error!(
            partition = msg.partition,
            offset = msg.offset,
            "处理函数异常：{}",
            panic_message(panic.as_ref())
        );
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "未知异常"
    }
}
