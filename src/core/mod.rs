//! 核心基础层模块
//!
//! 提供加载器共用的基础设施：内部事件总线、一次性完成原语和资源状态表

pub mod completion;
pub mod event_bus;
pub mod resource_table;

pub use completion::*;
pub use event_bus::*;
pub use resource_table::*;
