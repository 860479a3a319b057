//! 主题处理函数注册表

use crate::{Message, errors::RegistryError};
use std::{
    collections::{BTreeMap, btree_map},
    sync::Arc,
};

/// 消息处理函数
pub type Handler = Arc<dyn Fn(&Message) + Send + Sync>;

/// 主题到处理函数的映射，启动前构建，之后只读
#[derive(Default, Clone)]
pub struct Registry {
    handlers: BTreeMap<String, Handler>,
}

impl Registry {
    /// 构造空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册主题处理函数
    pub fn register<F>(
        &mut self,
        topic: impl Into<String>,
        handler: F,
    ) -> Result<&mut Self, RegistryError>
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(RegistryError::EmptyTopic);
        }
        match self.handlers.entry(topic) {
            btree_map::Entry::Occupied(e) => Err(RegistryError::Duplicate(e.key().clone())),
            btree_map::Entry::Vacant(e) => {
                e.insert(Arc::new(handler));
                Ok(self)
            }
        }
    }

    /// 获取主题处理函数
    pub fn get(&self, topic: &str) -> Option<&Handler> {
        self.handlers.get(topic)
    }

    /// 已注册的主题
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// 主题数量
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl IntoIterator for Registry {
    type Item = (String, Handler);
    type IntoIter = btree_map::IntoIter<String, Handler>;

    fn into_iter(self) -> Self::IntoIter {
        self.handlers.into_iter()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}
