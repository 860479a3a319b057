//! # **fanout** 错误定义

use thiserror::Error;

/// 订阅错误枚举
#[derive(Debug, Error)]
pub enum SubscriberError {
    /// 打开订阅失败
    #[error("订阅错误：{0}")]
    Subscribe(String),
    /// 读取消息失败
    #[error("读取消息错误：{0}")]
    Read(String),
    /// 消息源已关闭
    #[error("消息源已关闭")]
    Closed,
}

/// 处理函数注册错误枚举
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// 主题名称为空
    #[error("主题名称为空")]
    EmptyTopic,
    /// 主题重复注册
    #[error("主题'{0}'重复注册")]
    Duplicate(String),
}

/// 配置错误枚举
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 加载配置失败
    #[error("加载配置失败：{0}")]
    Load(#[from] config::ConfigError),
    /// 配置验证失败
    #[error("配置'{section}'验证失败：{message}")]
    Validation {
        /// 配置节
        section: String,
        /// 验证信息
        message: String,
    },
}
