//! # **fanout** 配置

use crate::{errors::ConfigError, supervisor::RestartPolicy};
use config::{Config, Environment, File};
use serde::{Deserialize, de::DeserializeOwned};
use std::path::PathBuf;
use tokio::time::Duration;
use validator::{Validate, ValidationError};

/// 构建分层配置
///
/// 依次加载 `default`、`FANOUT_ENV` 指定的环境配置文件（缺省为 `dev`），
/// 最后是前缀为 `FANOUT` 的环境变量。配置目录由 `FANOUT_CONFIG_ROOT` 指定，
/// 缺省为 `crate_dir/config`。
pub fn build_config(crate_dir: PathBuf) -> Result<Config, ConfigError> {
    let config_root = std::env::var("FANOUT_CONFIG_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| crate_dir.join("config"));
    let env = std::env::var("FANOUT_ENV").unwrap_or_else(|_| "dev".to_string());
    let config = Config::builder()
        .add_source(File::from(config_root.join("default")).required(false))
        .add_source(File::from(config_root.join(env)).required(false))
        .add_source(
            Environment::with_prefix("FANOUT")
                .separator("__")
                .list_separator(","),
        )
        .build()?;
    Ok(config)
}

/// 加载并验证配置节，配置节不存在时使用缺省值
pub fn load_section<T>(config: &Config, section: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Validate + Default,
{
    let cfg = match config.get::<T>(section) {
        Ok(c) => c,
        Err(config::ConfigError::NotFound(_)) => T::default(),
        Err(e) => return Err(e.into()),
    };
    cfg.validate().map_err(|e| ConfigError::Validation {
        section: section.to_string(),
        message: e.to_string(),
    })?;
    Ok(cfg)
}

/// 消费进程配置
#[derive(Debug, Deserialize, Validate, Clone)]
#[serde(default)]
pub struct ConsumerConfig {
    /// 优雅退出的等待时长（秒）
    #[validate(range(min = 1))]
    pub grace: u64,
    /// 固定运行时长（秒），到期后触发关闭
    pub lifetime: Option<u64>,
    /// 消费循环重启配置
    #[validate(nested)]
    pub restart: RestartConfig,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            grace: 10,
            lifetime: None,
            restart: RestartConfig::default(),
        }
    }
}

impl ConsumerConfig {
    /// 从配置节 `consumer` 加载
    pub fn load(config: &Config) -> Result<Self, ConfigError> {
        load_section(config, "consumer")
    }

    /// 优雅退出的等待时长
    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace)
    }

    /// 固定运行时长
    pub fn lifetime(&self) -> Option<Duration> {
        self.lifetime.map(Duration::from_secs)
    }

    /// 重启策略
    pub fn restart_policy(&self) -> RestartPolicy {
        RestartPolicy {
            enabled: self.restart.enabled,
            initial: Duration::from_millis(self.restart.initial),
            max: Duration::from_millis(self.restart.max),
        }
    }
}

/// 消费循环重启配置
#[derive(Debug, Deserialize, Validate, Clone)]
#[serde(default)]
#[validate(schema(function = "validate_backoff"))]
pub struct RestartConfig {
    /// 是否重启失败的消费循环
    pub enabled: bool,
    /// 首次重启前的等待时长（毫秒）
    #[validate(range(min = 1))]
    pub initial: u64,
    /// 重启等待时长上限（毫秒）
    pub max: u64,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            initial: 500,
            max: 30_000,
        }
    }
}

fn validate_backoff(cfg: &RestartConfig) -> Result<(), ValidationError> {
    if cfg.max < cfg.initial {
        return Err(ValidationError::new("backoff_range"));
    }
    Ok(())
}
