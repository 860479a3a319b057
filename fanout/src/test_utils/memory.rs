use crate::{
    Message,
    domain::{Broker, Subscription},
    errors::SubscriberError,
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::mpsc;

type Feed = Result<Message, SubscriberError>;

struct Topic {
    tx: mpsc::UnboundedSender<Feed>,
    rx: Option<mpsc::UnboundedReceiver<Feed>>,
    offset: i64,
    refused: bool,
    opened: usize,
    released: usize,
}

impl Topic {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Some(rx),
            offset: 0,
            refused: false,
            opened: 0,
            released: 0,
        }
    }
}

/// 内存消息代理
///
/// 每个主题一条单分区队列，同一时刻只允许一个订阅。释放的订阅把未读消息交还代理，
/// 后续订阅从断点继续读取。
#[derive(Clone, Default)]
pub struct MemoryBroker {
    topics: Arc<Mutex<HashMap<String, Topic>>>,
}

impl MemoryBroker {
    /// 构造函数
    pub fn new() -> Self {
        Self::default()
    }

    fn topics(&self) -> MutexGuard<'_, HashMap<String, Topic>> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_topic<R>(&self, topic: &str, f: impl FnOnce(&mut Topic) -> R) -> R {
        let mut topics = self.topics();
        f(topics.entry(topic.to_string()).or_insert_with(Topic::new))
    }

    /// 发布消息，返回偏移量
    pub fn publish(&self, topic: &str, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> i64 {
        self.with_topic(topic, |t| {
            let offset = t.offset;
            t.offset += 1;
            let _ = t.tx.send(Ok(Message {
                topic: topic.to_string(),
                partition: 0,
                offset,
                key: key.into(),
                value: value.into(),
                timestamp: None,
            }));
            offset
        })
    }

    /// 注入读取错误
    pub fn fail(&self, topic: &str, reason: &str) {
        self.with_topic(topic, |t| {
            let _ = t.tx.send(Err(SubscriberError::Read(reason.to_string())));
        });
    }

    /// 拒绝后续对该主题的订阅
    pub fn refuse(&self, topic: &str) {
        self.with_topic(topic, |t| t.refused = true);
    }

    /// 打开订阅的次数
    pub fn opened(&self, topic: &str) -> usize {
        self.with_topic(topic, |t| t.opened)
    }

    /// 释放订阅的次数
    pub fn released(&self, topic: &str) -> usize {
        self.with_topic(topic, |t| t.released)
    }

    /// 是否存在活动订阅
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.with_topic(topic, |t| t.rx.is_none())
    }
}

impl Broker for MemoryBroker {
    type Subscription = MemorySubscription;

    fn subscribe(&self, topic: &str) -> Result<MemorySubscription, SubscriberError> {
        self.with_topic(topic, |t| {
            if t.refused {
                return Err(SubscriberError::Subscribe(format!("主题 {topic} 拒绝订阅")));
            }
            let rx = t
                .rx
                .take()
                .ok_or_else(|| SubscriberError::Subscribe(format!("主题 {topic} 已被订阅")))?;
            t.opened += 1;
            Ok(MemorySubscription {
                topic: topic.to_string(),
                rx,
                topics: Arc::clone(&self.topics),
            })
        })
    }
}

/// 内存订阅
pub struct MemorySubscription {
    topic: String,
    rx: mpsc::UnboundedReceiver<Feed>,
    topics: Arc<Mutex<HashMap<String, Topic>>>,
}

impl Subscription for MemorySubscription {
    async fn recv(&mut self) -> Result<Message, SubscriberError> {
        match self.rx.recv().await {
            Some(feed) => feed,
            None => Err(SubscriberError::Closed),
        }
    }

    fn close(self) {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(t) = topics.get_mut(&self.topic) {
            t.rx = Some(self.rx);
            t.released += 1;
        }
    }
}
