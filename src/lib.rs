//! Pi - 组件资源加载与初始化编排框架
//!
//! 把页面上的挂载点变成已初始化的组件：按需获取组件脚本、服务脚本、模板和
//! 样式表，每个资源只获取一次，全部就绪后恰好调用一次组件的 `init`。
//!
//! # 架构分层
//!
//! - **宿主接口层**: [`HttpClient`]、[`ScriptHost`]、[`Document`] 等外部协作者
//! - **加载层**: 脚本、模板、样式表加载器，按路径去重并缓存
//! - **注册层**: 组件与服务注册表，支持先注册后查找和先查找后注册
//! - **编排层**: [`ComponentInitializer`] 与 [`Pi`] 实例
//!
//! # 示例
//!
//! ```no_run
//! use pi_runtime::{ComponentDescriptor, MemoryDocument, Pi};
//! use std::sync::Arc;
//!
//! # async fn demo(host: Arc<dyn pi_runtime::ScriptHost>) -> pi_runtime::Result<()> {
//! let document = Arc::new(MemoryDocument::new("data-pi-component"));
//! document.add_mount_point("r1");
//!
//! let pi = Pi::builder().script_host(host).document(document.clone()).build()?;
//! pi.define(ComponentDescriptor::new("/card").init(|_, root| root.set_inner_html("ready")))?;
//! pi.mount("r1", "/card").await?;
//! # Ok(())
//! # }
//! ```

pub mod component;
pub mod config;
pub mod core;
pub mod document;
pub mod error;
pub mod framework;
pub mod host;
pub mod http;
pub mod loader;
pub mod manifest;
pub mod mount;
pub mod registrar;
pub mod service;

// 重新导出核心类型
pub use component::*;
pub use config::{ConfigManager, PiConfig};
pub use crate::core::*;
pub use document::*;
pub use error::*;
pub use framework::*;
pub use host::*;
pub use http::*;
pub use loader::*;
pub use manifest::{Manifest, ManifestScriptHost};
pub use mount::*;
pub use registrar::*;
pub use service::*;

/// 框架信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const FRAMEWORK_NAME: &str = "Pi";

/// 初始化日志系统，日志写到标准错误，标准输出留给渲染结果
pub fn initialize(level: config::LogLevel) -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::from(level))
        .try_init()
        .map_err(|e| PiError::config(&format!("Failed to initialize logging: {}", e)))?;

    tracing::info!("Initializing {} v{}", FRAMEWORK_NAME, VERSION);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_info() {
        assert_eq!(FRAMEWORK_NAME, "Pi");
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_initialize_applies_level_once() {
        initialize(config::LogLevel::Warn).unwrap();
        assert!(tracing::enabled!(tracing::Level::WARN));
        assert!(!tracing::enabled!(tracing::Level::INFO));

        assert!(matches!(initialize(config::LogLevel::Debug), Err(PiError::Config { .. })));
        assert!(!tracing::enabled!(tracing::Level::DEBUG));
    }
}
