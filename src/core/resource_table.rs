//! 资源状态表
//!
//! 每个键对应一个 [`Completion`]：第一次请求时创建并启动唯一的一次获取，
//! 之后的请求共享同一个完成值。成功后状态保持 `Loaded`；失败时先把键重置为
//! `NotRequested`，再通知等待者，因此在错误回调里重试会重新发起获取。

use crate::core::completion::Completion;
use crate::error::LoadError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// 单个资源的加载状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    NotRequested,
    Loading,
    Loaded,
}

/// 加载结果
pub type LoadOutcome<T> = Result<T, LoadError>;

struct Slot<T> {
    generation: u64,
    completion: Arc<Completion<LoadOutcome<T>>>,
}

/// 按键去重的资源表
pub struct ResourceTable<T> {
    kind: &'static str,
    slots: Arc<DashMap<String, Slot<T>>>,
    generation: AtomicU64,
}

impl<T> ResourceTable<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// 创建新的资源表，`kind` 仅用于日志
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            slots: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// 获取 `key` 的完成值；键尚未请求时调用 `start` 并在独立任务上驱动获取。
    ///
    /// 必须在 Tokio 运行时中调用。
    pub fn request<F, Fut>(&self, key: &str, start: F) -> Arc<Completion<LoadOutcome<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LoadOutcome<T>> + Send + 'static,
    {
        let (completion, generation) = match self.slots.entry(key.to_string()) {
            Entry::Occupied(slot) => {
                debug!(kind = self.kind, key, "Resource already requested");
                return slot.get().completion.clone();
            }
            Entry::Vacant(vacant) => {
                let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                let completion = Arc::new(Completion::new());
                vacant.insert(Slot {
                    generation,
                    completion: completion.clone(),
                });
                (completion, generation)
            }
        };

        debug!(kind = self.kind, key, generation, "Starting resource fetch");
        let fetch = start();
        let slots = self.slots.clone();
        let done = completion.clone();
        let kind = self.kind;
        let key = key.to_string();

        tokio::spawn(async move {
            let outcome = fetch.await;
            if let Err(error) = &outcome {
                slots.remove_if(&key, |_, slot| slot.generation == generation);
                warn!(kind, key = %key, %error, "Resource fetch failed, state reset");
            }
            done.resolve(outcome);
        });

        completion
    }

    /// 当前状态
    pub fn state(&self, key: &str) -> ResourceState {
        match self.slots.get(key) {
            None => ResourceState::NotRequested,
            Some(slot) if slot.completion.is_resolved() => ResourceState::Loaded,
            Some(_) => ResourceState::Loading,
        }
    }

    /// 已成功加载的缓存值
    pub fn cached(&self, key: &str) -> Option<T> {
        let completion = self.slots.get(key)?.completion.clone();
        completion.peek().and_then(Result::ok)
    }

    /// 已请求过的键数量
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_single_fetch_for_concurrent_requests() {
        let table = ResourceTable::<u32>::new("test");
        let starts = Arc::new(AtomicUsize::new(0));
        let (release, gate) = oneshot::channel::<()>();
        let mut gate = Some(gate);

        let mut completions = Vec::new();
        for _ in 0..3 {
            let starts = starts.clone();
            let gate = gate.take();
            completions.push(table.request("k", move || {
                starts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if let Some(gate) = gate {
                        let _ = gate.await;
                    }
                    Ok(5)
                }
            }));
        }

        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(table.state("k"), ResourceState::Loading);

        release.send(()).unwrap();
        for completion in completions {
            assert_eq!(completion.wait().await, Some(Ok(5)));
        }
        assert_eq!(table.state("k"), ResourceState::Loaded);
        assert_eq!(table.cached("k"), Some(5));
    }

    #[tokio::test]
    async fn test_failure_resets_state() {
        let table = ResourceTable::<u32>::new("test");

        let failed = table.request("k", || async { Err(LoadError::transport("k", 500, "boom")) });
        let outcome = failed.wait().await.unwrap();
        assert_eq!(outcome.unwrap_err().status(), Some(500));
        assert_eq!(table.state("k"), ResourceState::NotRequested);
        assert_eq!(table.cached("k"), None);

        let retried = table.request("k", || async { Ok(9) });
        assert_eq!(retried.wait().await, Some(Ok(9)));
        assert_eq!(table.state("k"), ResourceState::Loaded);
    }

    #[tokio::test]
    async fn test_state_for_unknown_key() {
        let table = ResourceTable::<String>::new("test");
        assert_eq!(table.state("missing"), ResourceState::NotRequested);
        assert!(table.is_empty());
    }
}
