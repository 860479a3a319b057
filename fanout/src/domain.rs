//! # **fanout** 特征

use crate::{Message, errors::SubscriberError};
use std::future::Future;

/// 消息代理特征
///
/// 绑定代理地址与消费组，按主题打开订阅。
pub trait Broker: Send + Sync + 'static {
    /// 订阅类型
    type Subscription: Subscription;

    /// 打开主题订阅
    fn subscribe(&self, topic: &str) -> Result<Self::Subscription, SubscriberError>;
}

/// 订阅特征
pub trait Subscription: Send + 'static {
    /// 获取下一条消息，阻塞直到有消息或发生错误
    ///
    /// 返回的 future 被丢弃即中止等待。
    fn recv(&mut self) -> impl Future<Output = Result<Message, SubscriberError>> + Send;

    /// 释放订阅
    fn close(self);
}
