//! Kafka 消费配置

use config::Config;
use fanout::{config::load_section, errors::ConfigError};
use rdkafka::ClientConfig;
use serde::Deserialize;
use std::collections::HashMap;
use validator::{Validate, ValidationError};

/// librdkafka 的 `receive.message.max.bytes` 缺省值
const RECEIVE_MAX_BYTES: u64 = 100_000_000;

/// Kafka 消费配置
#[derive(Debug, Deserialize, Validate, Clone)]
#[serde(default)]
pub struct KafkaConfig {
    /// 代理地址
    #[validate(length(min = 1))]
    pub bootstrap: String,
    /// 消费组
    #[validate(length(min = 1))]
    pub group: String,
    /// 拉取配置
    #[validate(nested)]
    pub fetch: FetchConfig,
    /// 附加的 librdkafka 配置
    pub cc: HashMap<String, String>,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            bootstrap: "localhost:9092".to_string(),
            group: String::new(),
            fetch: FetchConfig::default(),
            cc: HashMap::new(),
        }
    }
}

impl KafkaConfig {
    /// 从配置节 `kafka` 加载
    pub fn load(config: &Config) -> Result<Self, ConfigError> {
        load_section(config, "kafka")
    }

    /// 生成消费者配置，附加配置先于受管配置写入
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("auto.offset.reset", "earliest");
        for (key, value) in &self.cc {
            config.set(key, value);
        }
        config
            .set("bootstrap.servers", &self.bootstrap)
            .set("group.id", &self.group)
            .set("fetch.min.bytes", self.fetch.min_bytes.to_string())
            .set("fetch.max.bytes", self.fetch.max_bytes.to_string())
            .set("enable.auto.commit", "true")
            .set(
                "auto.commit.interval.ms",
                self.fetch.commit_interval.to_string(),
            );
        let receive = u64::from(self.fetch.max_bytes) + 512;
        if receive > RECEIVE_MAX_BYTES {
            config.set("receive.message.max.bytes", receive.to_string());
        }
        config
    }
}

/// 拉取配置
#[derive(Debug, Deserialize, Validate, Clone)]
#[serde(default)]
#[validate(schema(function = "validate_fetch"))]
pub struct FetchConfig {
    /// 单次拉取的最小字节数
    #[validate(range(min = 1))]
    pub min_bytes: u32,
    /// 单次拉取的最大字节数
    #[validate(range(min = 1))]
    pub max_bytes: u32,
    /// 偏移量自动提交间隔（毫秒）
    #[validate(range(min = 1))]
    pub commit_interval: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            min_bytes: 10_000,
            max_bytes: 10_000_000,
            commit_interval: 1000,
        }
    }
}

fn validate_fetch(cfg: &FetchConfig) -> Result<(), ValidationError> {
    if cfg.min_bytes > cfg.max_bytes {
        return Err(ValidationError::new("fetch_range"));
    }
    Ok(())
}
