//! # **fanout** 的 Kafka 实现
//!
//! 每个主题一个 `StreamConsumer`，偏移量按时间间隔自动提交。

pub mod config;
pub mod subscription;

pub use config::{FetchConfig, KafkaConfig};
pub use subscription::{KafkaBroker, KafkaSubscription};
