//! 内部事件总线
//!
//! 按键划分的一次性回调注册表，仅用于加载器之间的内部协调。
//! `emit` 会依次调用当前注册的全部等待者，然后删除该键的等待者列表；
//! 之后订阅的等待者不会收到已经发出的事件。

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// 等待者回调
pub type Waiter<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// 等待者标识，用于撤销订阅
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaiterId(u64);

/// 一次性内部事件总线
pub struct InternalEventBus<T> {
    waiters: Mutex<HashMap<String, Vec<(WaiterId, Waiter<T>)>>>,
    next_id: AtomicU64,
}

impl<T: Clone> InternalEventBus<T> {
    /// 创建新的内部事件总线
    pub fn new() -> Self {
        Self {
            waiters: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// 将回调追加到 `key` 的等待者列表
    pub fn subscribe<F>(&self, key: &str, callback: F) -> WaiterId
    where
        F: FnOnce(T) + Send + 'static,
    {
        let id = WaiterId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut waiters = self.waiters.lock();
        let list = waiters.entry(key.to_string()).or_default();
        list.push((id, Box::new(callback)));
        debug!(key, waiting = list.len(), "Subscribed internal waiter");
        id
    }

    /// 撤销尚未触发的等待者；已触发或不存在时返回 `false`
    pub fn unsubscribe(&self, key: &str, id: WaiterId) -> bool {
        let mut waiters = self.waiters.lock();
        let Some(list) = waiters.get_mut(key) else {
            return false;
        };
        let before = list.len();
        list.retain(|(waiter, _)| *waiter != id);
        let removed = list.len() != before;
        if list.is_empty() {
            waiters.remove(key);
        }
        removed
    }

    /// 按注册顺序通知 `key` 的全部等待者，然后清空列表。
    ///
    /// 回调在锁外执行，回调内部可以重新订阅或发出事件。
    pub fn emit(&self, key: &str, value: T) {
        let Some(list) = self.waiters.lock().remove(key) else {
            return;
        };

        debug!(key, waiters = list.len(), "Emitting internal event");
        for (_, waiter) in list {
            waiter(value.clone());
        }
    }

    /// 当前等待 `key` 的回调数量
    pub fn waiting(&self, key: &str) -> usize {
        self.waiters.lock().get(key).map_or(0, Vec::len)
    }
}

impl<T: Clone> Default for InternalEventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
