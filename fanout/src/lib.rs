//! # **fanout** 多主题消费核心库
//!
//! 每个主题一个独立的消费循环，共享同一个关闭信号。

#![warn(missing_docs)]

mod message;

pub mod app;
pub mod config;
pub mod consumer;
pub mod domain;
pub mod errors;
pub mod registry;
pub mod signal;
pub mod supervisor;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use app::App;
pub use consumer::Exit;
pub use message::Message;
pub use registry::{Handler, Registry};
pub use signal::{Shutdown, Signal};
pub use supervisor::{Report, RestartPolicy, Supervisor};
