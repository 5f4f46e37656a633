//! 模板加载器
//!
//! 与脚本加载器相同的状态机，获取方式为 HTTP GET。成功的文本按路径缓存；
//! 失败通过显式的错误回调报告，并把路径重置为未请求，下次加载会重新获取。

use crate::core::{Completion, LoadOutcome, ResourceState, ResourceTable};
use crate::error::LoadError;
use crate::host::HttpClient;
use crate::loader::asset_url;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// 模板标记
pub type Markup = Arc<str>;

pub struct TemplateLoader {
    http: Arc<dyn HttpClient>,
    base_url: String,
    table: ResourceTable<Markup>,
}

impl TemplateLoader {
    pub fn new(http: Arc<dyn HttpClient>, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            table: ResourceTable::new("template"),
        }
    }

    /// 加载模板；成功时以文本调用 `on_success`，失败时调用 `on_error`
    pub fn load<S, E>(&self, path: &str, on_success: S, on_error: E)
    where
        S: FnOnce(Markup) + Send + 'static,
        E: FnOnce(LoadError) + Send + 'static,
    {
        self.request(path).on_complete(move |outcome| match outcome {
            Ok(markup) => on_success(markup),
            Err(error) => on_error(error),
        });
    }

    /// `load` 的 future 形式；请求在调用时立即发起
    pub fn fetch(&self, path: &str) -> impl Future<Output = LoadOutcome<Markup>> + Send + 'static {
        let waiting = self.request(path).wait();
        let key = path.to_string();
        async move {
            waiting
                .await
                .unwrap_or(Err(LoadError::Abandoned { key }))
        }
    }

    /// 已缓存的模板文本，不会发起请求
    pub fn cached(&self, path: &str) -> Option<Markup> {
        self.table.cached(path)
    }

    pub fn state(&self, path: &str) -> ResourceState {
        self.table.state(path)
    }

    fn request(&self, path: &str) -> Arc<Completion<LoadOutcome<Markup>>> {
        let url = asset_url(&self.base_url, path);
        let http = self.http.clone();

        self.table.request(path, move || async move {
            debug!(url = %url, "Fetching template");
            let text = http.get_text(&url).await?;
            Ok(Markup::from(text))
        })
    }
}
