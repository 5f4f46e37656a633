//! 组件注册表
//!
//! 组件脚本在执行时调用 `define` 注册描述符。描述符不可变，同一路径的重复
//! 注册被拒绝并记录日志，原描述符保持不变。

use crate::core::{settle_once, InternalEventBus, WaiterId};
use crate::error::{LoadError, RegistrationError, RegistrationKind};
use crate::host::MountPoint;
use crate::loader::{resolve_asset, ScriptLoader};
use crate::service::ServiceBody;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 组件初始化回调
pub type InitFn = Arc<dyn Fn(Imports, Arc<dyn MountPoint>) + Send + Sync>;

/// 一次挂载解析出的服务，按服务声明的名称索引
#[derive(Clone, Default)]
pub struct Imports {
    services: HashMap<String, ServiceBody>,
}

impl Imports {
    pub(crate) fn insert(&mut self, name: &str, body: ServiceBody) {
        self.services.insert(name.to_string(), body);
    }

    /// 按名称和具体类型取出服务
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.services.get(name)?.clone().downcast::<T>().ok()
    }

    pub fn body(&self, name: &str) -> Option<&ServiceBody> {
        self.services.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// 排序后的服务名称
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServiceBody)> {
        self.services.iter().map(|(name, body)| (name.as_str(), body))
    }
}

impl fmt::Debug for Imports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Imports").field("names", &self.names()).finish()
    }
}

/// 组件描述符（公开的注册契约）
#[derive(Clone, Default)]
pub struct ComponentDescriptor {
    pub path: String,
    pub template_url: Option<String>,
    pub styles: Option<String>,
    pub imports: Vec<String>,
    pub init: Option<InitFn>,
}

impl ComponentDescriptor {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Self::default()
        }
    }

    /// 模板地址，相对地址按组件路径解析
    pub fn template(mut self, url: &str) -> Self {
        self.template_url = Some(url.to_string());
        self
    }

    /// 样式表地址，相对地址按组件路径解析
    pub fn styles(mut self, url: &str) -> Self {
        self.styles = Some(url.to_string());
        self
    }

    /// 声明一个服务导入
    pub fn import(mut self, service_path: &str) -> Self {
        self.imports.push(service_path.to_string());
        self
    }

    pub fn init<F>(mut self, init: F) -> Self
    where
        F: Fn(Imports, Arc<dyn MountPoint>) + Send + Sync + 'static,
    {
        self.init = Some(Arc::new(init));
        self
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("path", &self.path)
            .field("template_url", &self.template_url)
            .field("styles", &self.styles)
            .field("imports", &self.imports)
            .field("init", &self.init.is_some())
            .finish()
    }
}

/// 校验通过的组件
pub struct Component {
    path: String,
    template_url: Option<String>,
    styles: Option<String>,
    imports: Vec<String>,
    init: InitFn,
}

impl Component {
    fn from_descriptor(descriptor: ComponentDescriptor) -> Result<Self, RegistrationError> {
        if descriptor.path.is_empty() {
            return Err(RegistrationError::malformed(
                RegistrationKind::Component,
                "component path is required",
            ));
        }
        let init = descriptor.init.ok_or_else(|| {
            RegistrationError::malformed(
                RegistrationKind::Component,
                &format!("component {} has no init callback", descriptor.path),
            )
        })?;

        Ok(Self {
            path: descriptor.path,
            template_url: descriptor.template_url,
            styles: descriptor.styles,
            imports: descriptor.imports,
            init,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// 模板路径；未声明时使用 `default_template`
    pub fn template_path(&self, default_template: &str) -> String {
        let asset = self.template_url.as_deref().unwrap_or(default_template);
        resolve_asset(&self.path, asset)
    }

    /// 样式表路径；未声明时使用 `default_stylesheet`
    pub fn stylesheet_path(&self, default_stylesheet: &str) -> String {
        let asset = self.styles.as_deref().unwrap_or(default_stylesheet);
        resolve_asset(&self.path, asset)
    }

    /// 调用初始化回调
    pub fn initialize(&self, imports: Imports, root: Arc<dyn MountPoint>) {
        (self.init)(imports, root)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("path", &self.path)
            .field("imports", &self.imports)
            .finish_non_exhaustive()
    }
}

fn loaded_key(path: &str) -> String {
    format!("component-loaded:{}", path)
}

/// 组件存储：描述符和注册通知
#[derive(Default)]
pub struct ComponentStore {
    components: RwLock<HashMap<String, Arc<Component>>>,
    bus: InternalEventBus<Arc<Component>>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册组件并发出 `component-loaded:path`
    pub fn define(&self, descriptor: ComponentDescriptor) -> Result<(), RegistrationError> {
        let path = descriptor.path.clone();
        let component = match Component::from_descriptor(descriptor) {
            Ok(component) => Arc::new(component),
            Err(err) => {
                error!(path = %path, "{}", err);
                return Err(err);
            }
        };

        {
            let mut components = self.components.write();
            if components.contains_key(&path) {
                let err = RegistrationError::duplicate(RegistrationKind::Component, &path);
                error!(path = %path, "{}", err);
                return Err(err);
            }
            components.insert(path.clone(), component.clone());
        }

        info!(path = %path, imports = component.imports.len(), "Defined component");
        self.bus.emit(&loaded_key(&path), component);
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<Arc<Component>> {
        self.components.read().get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.components.read().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.components.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.read().is_empty()
    }

    /// 正在等待 `path` 注册的回调数量
    pub fn waiting(&self, path: &str) -> usize {
        self.bus.waiting(&loaded_key(path))
    }

    /// 已注册时同步调用 `on_ready` 并返回 `None`；否则登记等待者并返回其标识
    pub(crate) fn get_or_subscribe<F>(&self, path: &str, on_ready: F) -> Option<WaiterId>
    where
        F: FnOnce(Arc<Component>) + Send + 'static,
    {
        let component = {
            let components = self.components.read();
            match components.get(path) {
                Some(component) => component.clone(),
                None => return Some(self.bus.subscribe(&loaded_key(path), on_ready)),
            }
        };
        on_ready(component);
        None
    }

    pub(crate) fn unsubscribe(&self, path: &str, waiter: WaiterId) -> bool {
        self.bus.unsubscribe(&loaded_key(path), waiter)
    }
}

/// 组件注册表
pub struct ComponentRegistry {
    store: Arc<ComponentStore>,
    scripts: Arc<ScriptLoader>,
    component_script: String,
}

impl ComponentRegistry {
    pub fn new(store: Arc<ComponentStore>, scripts: Arc<ScriptLoader>, component_script: &str) -> Self {
        Self {
            store,
            scripts,
            component_script: component_script.to_string(),
        }
    }

    pub fn define(&self, descriptor: ComponentDescriptor) -> Result<(), RegistrationError> {
        self.store.define(descriptor)
    }

    pub fn get(&self, path: &str) -> Option<Arc<Component>> {
        self.store.get(path)
    }

    /// 组件脚本路径，例如 `/card` -> `/card/component`
    pub fn script_path(&self, path: &str) -> String {
        format!("{}/{}", path.trim_end_matches('/'), self.component_script)
    }

    /// 组件已注册时同步回调，否则等待 `component-loaded:path` 并加载组件脚本
    pub fn when_defined<F>(&self, path: &str, on_ready: F)
    where
        F: FnOnce(Arc<Component>) + Send + 'static,
    {
        if self.store.get_or_subscribe(path, on_ready).is_none() {
            debug!(path, "Component already defined");
            return;
        }

        let script = self.script_path(path);
        let owned = script.clone();
        self.scripts.load(&script, move |outcome| {
            if let Err(err) = outcome {
                warn!(script = %owned, error = %err, "Component script failed to load");
            }
        });
    }

    /// `when_defined` 的 future 形式
    pub async fn resolve(&self, path: &str) -> Result<Arc<Component>, LoadError> {
        let (settler, settled) = settle_once();

        let ready = settler.clone();
        let waiter = self.store.get_or_subscribe(path, move |component| {
            ready.settle(Ok(component));
        });

        if let Some(waiter) = waiter {
            let script = self.script_path(path);
            let owned = path.to_string();
            let store = self.store.clone();
            self.scripts.load(&script, move |outcome| {
                let err = match outcome {
                    Err(err) => err,
                    Ok(()) => LoadError::not_registered(&owned),
                };
                // 失败后不再需要这个等待者
                store.unsubscribe(&owned, waiter);
                if settler.settle(Err(err.clone())) {
                    warn!(path = %owned, error = %err, "Component could not be resolved");
                }
            });
        }

        settled.await.unwrap_or_else(|_| {
            Err(LoadError::Abandoned {
                key: loaded_key(path),
            })
        })
    }
}
