//! 脚本加载器
//!
//! 每个路径最多注入一次脚本。脚本获取后立即对注册器执行，执行完成后状态
//! 才切换为 `Loaded` 并通知等待者，所以等待者观察到完成时注册已经发生。

use crate::core::{Completion, LoadOutcome, ResourceState, ResourceTable};
use crate::error::LoadError;
use crate::host::ScriptHost;
use crate::loader::asset_url;
use crate::registrar::Registrar;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// 脚本加载器
pub struct ScriptLoader {
    host: Arc<dyn ScriptHost>,
    registrar: Registrar,
    base_url: String,
    extension: String,
    table: ResourceTable<()>,
}

impl ScriptLoader {
    pub fn new(host: Arc<dyn ScriptHost>, registrar: Registrar, base_url: &str, extension: &str) -> Self {
        Self {
            host,
            registrar,
            base_url: base_url.to_string(),
            extension: extension.to_string(),
            table: ResourceTable::new("script"),
        }
    }

    /// 加载 `path` 的脚本，完成后调用 `callback`。
    ///
    /// 已加载时立即回调；加载中只登记回调。
    pub fn load<F>(&self, path: &str, callback: F)
    where
        F: FnOnce(LoadOutcome<()>) + Send + 'static,
    {
        self.request(path).on_complete(callback);
    }

    /// `load` 的 future 形式
    pub fn ensure(&self, path: &str) -> impl Future<Output = LoadOutcome<()>> + Send + 'static {
        let waiting = self.request(path).wait();
        let key = path.to_string();
        async move {
            waiting
                .await
                .unwrap_or(Err(LoadError::Abandoned { key }))
        }
    }

    /// 当前状态
    pub fn state(&self, path: &str) -> ResourceState {
        self.table.state(path)
    }

    /// 注入的脚本地址
    pub fn source_url(&self, path: &str) -> String {
        format!("{}{}", asset_url(&self.base_url, path), self.extension)
    }

    fn request(&self, path: &str) -> Arc<Completion<LoadOutcome<()>>> {
        let src = self.source_url(path);
        let host = self.host.clone();
        let registrar = self.registrar.clone();

        self.table.request(path, move || async move {
            debug!(src = %src, "Injecting script");
            let script = host.fetch_script(&src).await?;
            script.execute(&registrar);
            info!(src = %src, "Script loaded");
            Ok(())
        })
    }
}
