//! 服务注册表
//!
//! 服务由定义它的脚本在执行时注册，按脚本路径存储，以声明的名称暴露给组件。
//! 解析一个尚未注册的服务会登记等待者并触发该路径的脚本加载。

use crate::core::{settle_once, InternalEventBus, WaiterId};
use crate::error::{LoadError, RegistrationError, RegistrationKind};
use crate::loader::ScriptLoader;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 服务主体
pub type ServiceBody = Arc<dyn Any + Send + Sync>;

/// 已注册的服务，注册后不可变
#[derive(Clone)]
pub struct ServiceEntry {
    name: String,
    path: String,
    body: ServiceBody,
}

impl ServiceEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &ServiceBody {
        &self.body
    }

    /// 按具体类型取出服务主体
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.body.clone().downcast::<T>().ok()
    }
}

impl fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn loaded_key(path: &str) -> String {
    format!("service-loaded:{}", path)
}

/// 服务存储：条目和注册通知
#[derive(Default)]
pub struct ServiceStore {
    entries: RwLock<HashMap<String, ServiceEntry>>,
    bus: InternalEventBus<ServiceEntry>,
}

impl ServiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册服务并无条件发出 `service-loaded:path`
    pub fn register(&self, name: &str, path: &str, body: ServiceBody) -> Result<(), RegistrationError> {
        if name.is_empty() || path.is_empty() {
            let err = RegistrationError::malformed(RegistrationKind::Service, "service name and path are required");
            error!(service = name, path, "{}", err);
            return Err(err);
        }

        let entry = ServiceEntry {
            name: name.to_string(),
            path: path.to_string(),
            body,
        };

        {
            let mut entries = self.entries.write();
            if entries.contains_key(path) {
                let err = RegistrationError::duplicate(RegistrationKind::Service, path);
                error!(service = name, path, "{}", err);
                return Err(err);
            }
            entries.insert(path.to_string(), entry.clone());
        }

        info!(service = name, path, "Registered service");
        self.bus.emit(&loaded_key(path), entry);
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<ServiceEntry> {
        self.entries.read().get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.read().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// 正在等待 `path` 注册的回调数量
    pub fn waiting(&self, path: &str) -> usize {
        self.bus.waiting(&loaded_key(path))
    }

    /// 已注册时同步调用 `on_ready` 并返回 `None`；否则登记等待者并返回其标识。
    ///
    /// 查找和登记在同一个读锁内完成，不会错过并发的注册。
    pub(crate) fn get_or_subscribe<F>(&self, path: &str, on_ready: F) -> Option<WaiterId>
    where
        F: FnOnce(ServiceEntry) + Send + 'static,
    {
        let entry = {
            let entries = self.entries.read();
            match entries.get(path) {
                Some(entry) => entry.clone(),
                None => return Some(self.bus.subscribe(&loaded_key(path), on_ready)),
            }
        };
        on_ready(entry);
        None
    }

    pub(crate) fn unsubscribe(&self, path: &str, waiter: WaiterId) -> bool {
        self.bus.unsubscribe(&loaded_key(path), waiter)
    }
}

/// 服务注册表
pub struct ServiceRegistry {
    store: Arc<ServiceStore>,
    scripts: Arc<ScriptLoader>,
}

impl ServiceRegistry {
    pub fn new(store: Arc<ServiceStore>, scripts: Arc<ScriptLoader>) -> Self {
        Self { store, scripts }
    }

    /// 注册服务
    pub fn register(&self, name: &str, path: &str, body: ServiceBody) -> Result<(), RegistrationError> {
        self.store.register(name, path, body)
    }

    pub fn get(&self, path: &str) -> Option<ServiceEntry> {
        self.store.get(path)
    }

    /// 解析服务：已注册时同步回调，否则等待注册并触发脚本加载。
    ///
    /// 脚本加载失败或脚本没有注册服务时 `on_ready` 永远不会被调用。
    pub fn resolve<F>(&self, path: &str, on_ready: F)
    where
        F: FnOnce(ServiceEntry) + Send + 'static,
    {
        if self.store.get_or_subscribe(path, on_ready).is_none() {
            debug!(path, "Service already registered");
            return;
        }

        let owned = path.to_string();
        self.scripts.load(path, move |outcome| {
            if let Err(err) = outcome {
                warn!(path = %owned, error = %err, "Service script failed to load");
            }
        });
    }

    /// `resolve` 的 future 形式。
    ///
    /// 脚本加载失败时返回传输错误；脚本加载完成却没有注册服务时返回
    /// [`LoadError::NotRegistered`]。
    pub async fn resolve_entry(&self, path: &str) -> Result<ServiceEntry, LoadError> {
        let (settler, settled) = settle_once();

        let ready = settler.clone();
        let waiter = self.store.get_or_subscribe(path, move |entry| {
            ready.settle(Ok(entry));
        });

        if let Some(waiter) = waiter {
            let owned = path.to_string();
            let store = self.store.clone();
            self.scripts.load(path, move |outcome| {
                let err = match outcome {
                    Err(err) => err,
                    Ok(()) => LoadError::not_registered(&owned),
                };
                // 失败后不再需要这个等待者
                store.unsubscribe(&owned, waiter);
                if settler.settle(Err(err.clone())) {
                    warn!(path = %owned, error = %err, "Service could not be resolved");
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

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_register_and_get() {
        let store = ServiceStore::new();
        store.register("A", "/svc/a", Arc::new(7u32)).unwrap();

        let entry = store.get("/svc/a").unwrap();
        assert_eq!(entry.name(), "A");
        assert_eq!(entry.path(), "/svc/a");
        assert_eq!(*entry.downcast::<u32>().unwrap(), 7);
        assert!(entry.downcast::<String>().is_none());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let store = ServiceStore::new();
        store.register("A", "/svc/a", Arc::new(1u32)).unwrap();

        let err = store.register("B", "/svc/a", Arc::new(2u32)).unwrap_err();
        assert!(matches!(err, RegistrationError::Duplicate { .. }));

        let entry = store.get("/svc/a").unwrap();
        assert_eq!(entry.name(), "A");
        assert_eq!(*entry.downcast::<u32>().unwrap(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_malformed_registration_rejected() {
        let store = ServiceStore::new();
        assert!(store.register("", "/svc/a", Arc::new(())).is_err());
        assert!(store.register("A", "", Arc::new(())).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_waiters_notified_on_register() {
        let store = ServiceStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..2 {
            let seen = seen.clone();
            let waiter = store.get_or_subscribe("/svc/a", move |entry| seen.lock().push(entry.name().to_string()));
            assert!(waiter.is_some());
        }
        assert_eq!(store.waiting("/svc/a"), 2);

        store.register("A", "/svc/a", Arc::new(())).unwrap();
        assert_eq!(*seen.lock(), vec!["A".to_string(), "A".to_string()]);
        assert_eq!(store.waiting("/svc/a"), 0);

        let s = seen.clone();
        assert!(store
            .get_or_subscribe("/svc/a", move |entry| s.lock().push(entry.path().to_string()))
            .is_none());
        assert_eq!(seen.lock().len(), 3);
    }

    #[test]
    fn test_unsubscribed_waiter_not_notified() {
        let store = ServiceStore::new();
        let seen = Arc::new(Mutex::new(0));

        let s = seen.clone();
        let waiter = store.get_or_subscribe("/svc/a", move |_| *s.lock() += 1).unwrap();
        assert!(store.unsubscribe("/svc/a", waiter));
        assert!(!store.unsubscribe("/svc/a", waiter));
        assert_eq!(store.waiting("/svc/a"), 0);

        store.register("A", "/svc/a", Arc::new(())).unwrap();
        assert_eq!(*seen.lock(), 0);
    }
}
