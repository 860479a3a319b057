//! Kafka 主题订阅

use crate::config::KafkaConfig;
use fanout::{
    Message,
    domain::{Broker, Subscription},
    errors::SubscriberError,
};
use rdkafka::{
    ClientConfig, Message as KafkaMessage,
    consumer::{Consumer, StreamConsumer},
    error::{KafkaError, RDKafkaErrorCode},
};
use tracing::{debug, info, warn};

/// Kafka 消息代理，绑定代理地址、消费组与拉取参数
pub struct KafkaBroker {
    config: ClientConfig,
}

impl KafkaBroker {
    /// 构造函数
    pub fn new(cfg: &KafkaConfig) -> Self {
        info!(bootstrap = %cfg.bootstrap, group = %cfg.group, "创建 Kafka 消息代理");
        Self {
            config: cfg.client_config(),
        }
    }
}

impl Broker for KafkaBroker {
    type Subscription = KafkaSubscription;

    fn subscribe(&self, topic: &str) -> Result<KafkaSubscription, SubscriberError> {
        let consumer: StreamConsumer = self
            .config
            .create()
            .map_err(|e| SubscriberError::Subscribe(format!("消费者创建失败：{e}")))?;
        consumer
            .subscribe(&[topic])
            .map_err(|e| SubscriberError::Subscribe(format!("订阅主题 {topic} 失败：{e}")))?;
        Ok(KafkaSubscription {
            consumer,
            topic: topic.to_string(),
        })
    }
}

/// Kafka 主题订阅，释放时退出消费组
pub struct KafkaSubscription {
    consumer: StreamConsumer,
    topic: String,
}

impl Subscription for KafkaSubscription {
    /// 代理连接中断等 librdkafka 自行恢复的错误只记录日志，继续等待
    async fn recv(&mut self) -> Result<Message, SubscriberError> {
        loop {
            match self.consumer.recv().await {
                Ok(msg) => return Ok(to_message(&msg)),
                Err(e) if is_transient(&e) => {
                    warn!("主题 {} 暂时不可用，等待恢复：{e}", self.topic)
                }
                Err(e) => return Err(SubscriberError::Read(e.to_string())),
            }
        }
    }

    fn close(self) {
        self.consumer.unsubscribe();
        debug!("退出主题 {} 消费组", self.topic);
    }
}

fn is_transient(e: &KafkaError) -> bool {
    matches!(
        e,
        KafkaError::MessageConsumption(
            RDKafkaErrorCode::BrokerTransportFailure | RDKafkaErrorCode::AllBrokersDown
        )
    )
}

/// 转换为独立于消费者生命周期的消息
pub(crate) fn to_message<M: KafkaMessage>(msg: &M) -> Message {
    Message {
        topic: msg.topic().to_string(),
        partition: msg.partition(),
        offset: msg.offset(),
        key: msg.key().map(<[u8]>::to_vec).unwrap_or_default(),
        value: msg.payload().map(<[u8]>::to_vec).unwrap_or_default(),
        timestamp: msg.timestamp().to_millis(),
    }
}
