//! 样式表加载器：每个路径最多注入一次链接，不通知完成

use crate::host::Document;
use crate::loader::asset_url;
use dashmap::DashSet;
use std::sync::Arc;
use tracing::debug;

pub struct StylesheetLoader {
    document: Arc<dyn Document>,
    base_url: String,
    injected: DashSet<String>,
}

impl StylesheetLoader {
    pub fn new(document: Arc<dyn Document>, base_url: &str) -> Self {
        Self {
            document,
            base_url: base_url.to_string(),
            injected: DashSet::new(),
        }
    }

    /// 注入样式表；已注入过的路径直接忽略
    pub fn load(&self, path: &str) {
        if !self.injected.insert(path.to_string()) {
            return;
        }
        let href = asset_url(&self.base_url, path);
        debug!(href = %href, "Injecting stylesheet");
        self.document.append_stylesheet(&href);
    }

    pub fn is_injected(&self, path: &str) -> bool {
        self.injected.contains(path)
    }
}
