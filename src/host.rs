//! 外部协作者接口
//!
//! 编排器只通过这些 trait 接触网络和 DOM：
//! - [`HttpClient`]：模板加载器使用的文本获取
//! - [`ScriptHost`]：获取脚本并返回可执行的 [`Script`]
//! - [`Document`] / [`MountPoint`]：挂载点查找、样式表注入和标记写入

use crate::error::LoadError;
use crate::registrar::Registrar;
use async_trait::async_trait;
use std::sync::Arc;

/// 无凭据的文本获取
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET `url` 并返回响应文本；非 2xx 响应返回 [`LoadError::Transport`]
    async fn get_text(&self, url: &str) -> Result<String, LoadError>;
}

/// 已获取、可执行的脚本。
///
/// 执行时同步调用 `Registrar::define` / `Registrar::register` 完成注册。
pub trait Script: Send + Sync {
    fn execute(&self, registrar: &Registrar);
}

impl<F> Script for F
where
    F: Fn(&Registrar) + Send + Sync,
{
    fn execute(&self, registrar: &Registrar) {
        self(registrar)
    }
}

/// 从闭包创建脚本
pub fn script_fn<F>(body: F) -> Arc<dyn Script>
where
    F: Fn(&Registrar) + Send + Sync + 'static,
{
    Arc::new(body)
}

/// 脚本宿主
#[async_trait]
pub trait ScriptHost: Send + Sync {
    /// 获取 `src` 指向的脚本
    async fn fetch_script(&self, src: &str) -> Result<Arc<dyn Script>, LoadError>;
}

/// 带有框架标记属性的挂载元素
pub trait MountPoint: Send + Sync {
    /// 标记属性的值
    fn root(&self) -> &str;

    fn inner_html(&self) -> String;

    fn set_inner_html(&self, html: &str);
}

/// 文档
pub trait Document: Send + Sync {
    /// 查找标记属性等于 `root` 的唯一元素
    fn mount_point(&self, root: &str) -> Option<Arc<dyn MountPoint>>;

    /// 追加样式表链接
    fn append_stylesheet(&self, href: &str);
}
