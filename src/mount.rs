//! 组件初始化器
//!
//! 对一个挂载点并发加载组件的服务导入、样式表和模板，全部完成后恰好调用一次
//! 组件的 `init`。屏障由 `try_join` 组合：k 个服务导入加上模板，任意一个失败
//! 都会让本次挂载失败且不调用 `init`；样式表不参与屏障。

use crate::component::{Component, ComponentRegistry, Imports};
use crate::config::ComponentConventions;
use crate::error::MountError;
use crate::host::{Document, MountPoint};
use crate::loader::{StylesheetLoader, TemplateLoader};
use crate::service::ServiceRegistry;
use futures::future::{try_join, try_join_all};
use futures::TryFutureExt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 一次成功挂载的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mounted {
    pub mount_id: Uuid,
    pub root: String,
    pub path: String,
    /// 注入到 `init` 的服务名称（已排序）
    pub imports: Vec<String>,
}

/// 组件初始化器
pub struct ComponentInitializer {
    components: Arc<ComponentRegistry>,
    services: Arc<ServiceRegistry>,
    styles: Arc<StylesheetLoader>,
    templates: Arc<TemplateLoader>,
    document: Arc<dyn Document>,
    conventions: ComponentConventions,
}

impl ComponentInitializer {
    pub fn new(
        components: Arc<ComponentRegistry>,
        services: Arc<ServiceRegistry>,
        styles: Arc<StylesheetLoader>,
        templates: Arc<TemplateLoader>,
        document: Arc<dyn Document>,
        conventions: ComponentConventions,
    ) -> Self {
        Self {
            components,
            services,
            styles,
            templates,
            document,
            conventions,
        }
    }

    /// 在 `root` 挂载 `path` 组件
    pub async fn mount(&self, root: &str, path: &str) -> Result<Mounted, MountError> {
        let mount_id = Uuid::new_v4();
        debug!(%mount_id, root, path, "Mount requested");

        let mount_point = self.document.mount_point(root).ok_or_else(|| {
            let err = MountError::root_not_found(root);
            error!(%mount_id, root, path, "{}", err);
            err
        })?;

        let component = self
            .components
            .resolve(path)
            .await
            .map_err(MountError::Component)?;

        self.initialize(mount_id, mount_point, component).await
    }

    /// 对已解析的组件执行编排
    pub async fn initialize(
        &self,
        mount_id: Uuid,
        mount_point: Arc<dyn MountPoint>,
        component: Arc<Component>,
    ) -> Result<Mounted, MountError> {
        let imports_total = component.imports().len();
        let imports = try_join_all(
            component
                .imports()
                .iter()
                .map(|service_path| self.services.resolve_entry(service_path)),
        )
        .map_err(MountError::Service);

        self.styles
            .load(&component.stylesheet_path(&self.conventions.default_stylesheet));

        let template_path = component.template_path(&self.conventions.default_template);
        let target = mount_point.clone();
        let template = self
            .templates
            .fetch(&template_path)
            .map_ok(move |markup| target.set_inner_html(&markup))
            .map_err(MountError::Template);

        let (entries, ()) = match try_join(imports, template).await {
            Ok(joined) => joined,
            Err(err) => {
                warn!(
                    %mount_id,
                    root = mount_point.root(),
                    path = component.path(),
                    error = %err,
                    "Mount failed, init will not run"
                );
                return Err(err);
            }
        };

        let mut resolved = Imports::default();
        for entry in &entries {
            resolved.insert(entry.name(), entry.body().clone());
        }
        let names = resolved.names();

        component.initialize(resolved, mount_point.clone());
        info!(
            %mount_id,
            root = mount_point.root(),
            path = component.path(),
            imports = imports_total,
            "Component initialized"
        );

        Ok(Mounted {
            mount_id,
            root: mount_point.root().to_string(),
            path: component.path().to_string(),
            imports: names,
        })
    }
}
