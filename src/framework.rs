//! 编排器实例
//!
//! `Pi` 拥有全部资源状态和注册表，没有任何进程级单例。实例可以廉价克隆，
//! 克隆之间共享同一份状态。

use crate::component::{ComponentDescriptor, ComponentRegistry, ComponentStore};
use crate::config::{ConfigManager, PiConfig};
use crate::error::{MountError, RegistrationError};
use crate::host::{Document, HttpClient, ScriptHost};
use crate::http::ReqwestClient;
use crate::loader::{ScriptLoader, StylesheetLoader, TemplateLoader};
use crate::mount::{ComponentInitializer, Mounted};
use crate::registrar::Registrar;
use crate::service::{ServiceRegistry, ServiceStore};
use crate::{PiError, Result};
use std::any::Any;
use std::sync::Arc;

struct PiInner {
    config: PiConfig,
    registrar: Registrar,
    scripts: Arc<ScriptLoader>,
    styles: Arc<StylesheetLoader>,
    templates: Arc<TemplateLoader>,
    services: Arc<ServiceRegistry>,
    components: Arc<ComponentRegistry>,
    initializer: ComponentInitializer,
}

/// 组件资源加载与初始化编排器
#[derive(Clone)]
pub struct Pi {
    inner: Arc<PiInner>,
}

/// `Pi` 构建器
#[derive(Default)]
pub struct PiBuilder {
    config: Option<PiConfig>,
    script_host: Option<Arc<dyn ScriptHost>>,
    http: Option<Arc<dyn HttpClient>>,
    document: Option<Arc<dyn Document>>,
}

impl PiBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: PiConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn script_host(mut self, host: Arc<dyn ScriptHost>) -> Self {
        self.script_host = Some(host);
        self
    }

    /// 模板获取使用的 HTTP 客户端；未设置时使用 [`ReqwestClient`]
    pub fn http(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn document(mut self, document: Arc<dyn Document>) -> Self {
        self.document = Some(document);
        self
    }

    /// 构建编排器
    pub fn build(self) -> Result<Pi> {
        let config = self.config.unwrap_or_default();
        ConfigManager::from_config(config.clone()).validate()?;
        let script_host = self
            .script_host
            .ok_or_else(|| PiError::config("A script host is required"))?;
        let document = self
            .document
            .ok_or_else(|| PiError::config("A document is required"))?;
        let http = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestClient::new()),
        };

        let registrar = Registrar::new(Arc::new(ServiceStore::new()), Arc::new(ComponentStore::new()));
        let base_url = config.assets.base_url.as_str();

        let scripts = Arc::new(ScriptLoader::new(
            script_host,
            registrar.clone(),
            base_url,
            &config.assets.script_extension,
        ));
        let styles = Arc::new(StylesheetLoader::new(document.clone(), base_url));
        let templates = Arc::new(TemplateLoader::new(http, base_url));
        let services = Arc::new(ServiceRegistry::new(registrar.services().clone(), scripts.clone()));
        let components = Arc::new(ComponentRegistry::new(
            registrar.components().clone(),
            scripts.clone(),
            &config.components.component_script,
        ));
        let initializer = ComponentInitializer::new(
            components.clone(),
            services.clone(),
            styles.clone(),
            templates.clone(),
            document,
            config.components.clone(),
        );

        tracing::debug!(base_url, "Pi orchestrator built");
        Ok(Pi {
            inner: Arc::new(PiInner {
                config,
                registrar,
                scripts,
                styles,
                templates,
                services,
                components,
                initializer,
            }),
        })
    }
}

impl Pi {
    pub fn builder() -> PiBuilder {
        PiBuilder::new()
    }

    /// 在 `root` 挂载 `path` 组件，`init` 调用后返回
    pub async fn mount(&self, root: &str, path: &str) -> std::result::Result<Mounted, MountError> {
        self.inner.initializer.mount(root, path).await
    }

    /// 在后台挂载组件；失败时调用 `on_error`，成功时不回调。
    ///
    /// 必须在 Tokio 运行时中调用。
    pub fn load<E>(&self, root: &str, path: &str, on_error: E)
    where
        E: FnOnce(MountError) + Send + 'static,
    {
        let pi = self.clone();
        let root = root.to_string();
        let path = path.to_string();
        tokio::spawn(async move {
            if let Err(err) = pi.mount(&root, &path).await {
                on_error(err);
            }
        });
    }

    /// 注册组件描述符
    pub fn define(&self, descriptor: ComponentDescriptor) -> std::result::Result<(), RegistrationError> {
        self.inner.registrar.define(descriptor)
    }

    /// 注册服务
    pub fn register<T>(&self, name: &str, path: &str, body: T) -> std::result::Result<(), RegistrationError>
    where
        T: Any + Send + Sync,
    {
        self.inner.registrar.register(name, path, body)
    }

    pub fn config(&self) -> &PiConfig {
        &self.inner.config
    }

    pub fn registrar(&self) -> &Registrar {
        &self.inner.registrar
    }

    pub fn scripts(&self) -> &ScriptLoader {
        &self.inner.scripts
    }

    pub fn styles(&self) -> &StylesheetLoader {
        &self.inner.styles
    }

    pub fn templates(&self) -> &TemplateLoader {
        &self.inner.templates
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.inner.services
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.inner.components
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use crate::error::LoadError;
    use crate::host::Script;
    use async_trait::async_trait;

    struct NoScripts;

    #[async_trait]
    impl ScriptHost for NoScripts {
        async fn fetch_script(&self, src: &str) -> std::result::Result<Arc<dyn Script>, LoadError> {
            Err(LoadError::transport(src, 404, "no scripts"))
        }
    }

    #[test]
    fn test_builder_requires_collaborators() {
        assert!(matches!(Pi::builder().build(), Err(PiError::Config { .. })));
        assert!(matches!(
            Pi::builder().script_host(Arc::new(NoScripts)).build(),
            Err(PiError::Config { .. })
        ));
    }

    #[test]
    fn test_builder_validates_config() {
        let mut config = PiConfig::default();
        config.components.component_script = String::new();
        let result = Pi::builder()
            .config(config)
            .script_host(Arc::new(NoScripts))
            .document(Arc::new(MemoryDocument::new("data-pi-component")))
            .build();
        assert!(matches!(result, Err(PiError::Config { .. })));
    }

    #[tokio::test]
    async fn test_unknown_root_is_rejected() {
        let pi = Pi::builder()
            .script_host(Arc::new(NoScripts))
            .document(Arc::new(MemoryDocument::new("data-pi-component")))
            .build()
            .unwrap();

        let err = pi.mount("nowhere", "/card").await.unwrap_err();
        assert_eq!(err, MountError::root_not_found("nowhere"));
        assert_eq!(pi.scripts().state("/card/component"), crate::core::ResourceState::NotRequested);
    }

    #[tokio::test]
    async fn test_missing_component_script_surfaces_error() {
        let document = Arc::new(MemoryDocument::new("data-pi-component"));
        document.add_mount_point("r1");
        let pi = Pi::builder()
            .script_host(Arc::new(NoScripts))
            .document(document)
            .build()
            .unwrap();

        let err = pi.mount("r1", "/card").await.unwrap_err();
        assert!(matches!(err, MountError::Component(LoadError::Transport { status: 404, .. })));
    }
}
