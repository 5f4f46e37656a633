//! 注册器
//!
//! 脚本执行时拿到的句柄，只暴露 `define` 和 `register`。注册器只引用存储，
//! 不引用加载器，因此脚本加载器可以持有它而不形成引用环。

use crate::component::{ComponentDescriptor, ComponentStore};
use crate::error::RegistrationError;
use crate::service::{ServiceBody, ServiceStore};
use std::any::Any;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct Registrar {
    services: Arc<ServiceStore>,
    components: Arc<ComponentStore>,
}

impl Registrar {
    pub fn new(services: Arc<ServiceStore>, components: Arc<ComponentStore>) -> Self {
        Self { services, components }
    }

    /// 注册组件描述符
    pub fn define(&self, descriptor: ComponentDescriptor) -> Result<(), RegistrationError> {
        self.components.define(descriptor)
    }

    /// 以 `name` 注册 `path` 的服务
    pub fn register<T>(&self, name: &str, path: &str, body: T) -> Result<(), RegistrationError>
    where
        T: Any + Send + Sync,
    {
        self.services.register(name, path, Arc::new(body))
    }

    /// 注册已经共享的服务主体
    pub fn register_shared(&self, name: &str, path: &str, body: ServiceBody) -> Result<(), RegistrationError> {
        self.services.register(name, path, body)
    }

    pub fn services(&self) -> &Arc<ServiceStore> {
        &self.services
    }

    pub fn components(&self) -> &Arc<ComponentStore> {
        &self.components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registrar_writes_through_to_stores() {
        let registrar = Registrar::default();
        registrar.register("A", "/svc/a", serde_json::json!({ "x": 1 })).unwrap();
        registrar
            .define(ComponentDescriptor::new("/card").import("/svc/a").init(|_, _| {}))
            .unwrap();

        assert!(registrar.services().contains("/svc/a"));
        assert!(registrar.components().contains("/card"));

        let clone = registrar.clone();
        assert!(clone.register("A", "/svc/a", 2u8).is_err());
    }
}
