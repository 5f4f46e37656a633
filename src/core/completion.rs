//! 一次性完成原语
//!
//! `Completion<T>` 只创建一次、最多解析一次。任意数量的后续回调都可以挂接，
//! 解析之前挂接的回调按顺序在解析时执行，解析之后挂接的回调立即以缓存值执行。

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;

type Continuation<T> = Box<dyn FnOnce(T) + Send + 'static>;

enum State<T> {
    Pending(Vec<Continuation<T>>),
    Resolved(T),
}

/// 可共享的一次性完成值
pub struct Completion<T> {
    state: Mutex<State<T>>,
}

impl<T> Completion<T>
where
    T: Clone + Send + 'static,
{
    /// 创建未解析的完成值
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Pending(Vec::new())),
        }
    }

    /// 挂接后续回调
    pub fn on_complete<F>(&self, continuation: F)
    where
        F: FnOnce(T) + Send + 'static,
    {
        let value = {
            let mut state = self.state.lock();
            match &mut *state {
                State::Pending(continuations) => {
                    continuations.push(Box::new(continuation));
                    return;
                }
                State::Resolved(value) => value.clone(),
            }
        };
        continuation(value);
    }

    /// 解析完成值并按挂接顺序通知所有回调。
    ///
    /// 状态先切换为已解析，再执行回调；重复解析返回 `false` 且不产生任何效果。
    pub fn resolve(&self, value: T) -> bool {
        let previous = {
            let mut state = self.state.lock();
            if matches!(*state, State::Resolved(_)) {
                return false;
            }
            std::mem::replace(&mut *state, State::Resolved(value.clone()))
        };

        if let State::Pending(continuations) = previous {
            for continuation in continuations {
                continuation(value.clone());
            }
        }
        true
    }

    /// 以 future 的形式等待解析结果；完成值在解析前被丢弃时返回 `None`
    pub fn wait(&self) -> impl Future<Output = Option<T>> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        self.on_complete(move |value| {
            let _ = tx.send(value);
        });
        async move { rx.await.ok() }
    }

    /// 是否已经解析
    pub fn is_resolved(&self) -> bool {
        matches!(*self.state.lock(), State::Resolved(_))
    }

    /// 已解析的值（如果有）
    pub fn peek(&self) -> Option<T> {
        match &*self.state.lock() {
            State::Resolved(value) => Some(value.clone()),
            State::Pending(_) => None,
        }
    }
}

impl<T> Default for Completion<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// 只接受第一个结果的一次性发送端，可被多个回调共享
pub struct Settler<T> {
    sender: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> Clone for Settler<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> Settler<T> {
    /// 发送结果；已经有结果时返回 `false`
    pub fn settle(&self, value: T) -> bool {
        match self.sender.lock().take() {
            Some(sender) => sender.send(value).is_ok(),
            None => false,
        }
    }
}

/// 创建一对 `Settler` 和接收端
pub fn settle_once<T>() -> (Settler<T>, oneshot::Receiver<T>) {
    let (tx, rx) = oneshot::channel();
    (
        Settler {
            sender: Arc::new(Mutex::new(Some(tx))),
        },
        rx,
    )
}
