mod handlers;

use fanout::{
    App,
    app::terminate,
    config::{ConsumerConfig, build_config},
    errors::ConfigError,
};
use fanout_kafka::{KafkaBroker, KafkaConfig};
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info};
use tracing_appender::non_blocking;
use tracing_subscriber::fmt;

fn load() -> Result<(ConsumerConfig, KafkaConfig), ConfigError> {
    let config = build_config(PathBuf::from(env!("CARGO_MANIFEST_DIR")))?;
    Ok((ConsumerConfig::load(&config)?, KafkaConfig::load(&config)?))
}

#[tokio::main]
async fn main() {
    let (non_blocking, guard) = non_blocking(std::io::stdout());
    fmt()
        .with_writer(non_blocking)
        .with_target(false)
        .pretty()
        .init();

    let (consumer, kafka) = match load() {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            drop(guard);
            std::process::exit(1);
        }
    };
    let registry = match handlers::registry() {
        Ok(r) => r,
        Err(e) => {
            error!("注册处理函数失败：{e}");
            drop(guard);
            std::process::exit(1);
        }
    };

    let app = App::new(&consumer);
    app.launch(registry, Arc::new(KafkaBroker::new(&kafka))).await;
    info!("消费者已启动，等待退出信号");

    app.run_until(terminate(consumer.lifetime())).await;
    info!("消费者已退出");
}
