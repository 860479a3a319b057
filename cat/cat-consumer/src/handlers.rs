//! 猫咪事件处理函数

use fanout::{Message, Registry, errors::RegistryError};
use tracing::info;

/// 主题与处理函数的绑定
pub fn registry() -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    registry
        .register("cat_created", created_cat)?
        .register("cat_updated", updated_cat)?
        .register("cat_deleted", deleted_cat)?;
    Ok(registry)
}

fn created_cat(msg: &Message) {
    info!(
        key = %String::from_utf8_lossy(&msg.key),
        value = %String::from_utf8_lossy(&msg.value),
        "处理 cat_created"
    );
}

fn updated_cat(msg: &Message) {
    info!(
        key = %String::from_utf8_lossy(&msg.key),
        value = %String::from_utf8_lossy(&msg.value),
        "处理 cat_updated"
    );
}

fn deleted_cat(msg: &Message) {
    info!(
        key = %String::from_utf8_lossy(&msg.key),
        value = %String::from_utf8_lossy(&msg.value),
        "处理 cat_deleted"
    );
}
