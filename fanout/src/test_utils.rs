//! # **fanout** 测试工具

mod memory;

pub use memory::{MemoryBroker, MemorySubscription};
