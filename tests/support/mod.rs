//! 集成测试用的可控宿主
//!
//! 每个请求都要经过 [`Gate`]，测试决定各个资源以什么顺序完成。

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use pi_runtime::{HttpClient, LoadError, MemoryDocument, Pi, PiConfig, Script, ScriptHost};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::oneshot;

#[derive(Default)]
struct GateState {
    open: HashSet<String>,
    pending: HashMap<String, Vec<oneshot::Sender<()>>>,
    requests: Vec<String>,
}

/// 按键放行的闸门
#[derive(Default)]
pub struct Gate {
    state: Mutex<GateState>,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 记录请求并等待放行
    pub async fn pass(&self, key: &str) {
        let released = {
            let mut state = self.state.lock();
            state.requests.push(key.to_string());
            if state.open.contains(key) {
                return;
            }
            let (tx, rx) = oneshot::channel();
            state.pending.entry(key.to_string()).or_default().push(tx);
            rx
        };
        let _ = released.await;
    }

    /// 放行 `key` 的当前和之后的所有请求
    pub fn release(&self, key: &str) {
        let waiters = {
            let mut state = self.state.lock();
            state.open.insert(key.to_string());
            state.pending.remove(key).unwrap_or_default()
        };
        for waiter in waiters {
            let _ = waiter.send(());
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().requests.clone()
    }

    pub fn count(&self, key: &str) -> usize {
        self.state.lock().requests.iter().filter(|r| r.as_str() == key).count()
    }

    /// 等到 `key` 至少被请求一次
    pub async fn wait_for(&self, key: &str) {
        for _ in 0..10_000 {
            if self.count(key) > 0 {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("{} was never requested", key);
    }
}

/// 让出足够多次，使已就绪的任务都能推进
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

/// 经过闸门的脚本宿主
pub struct GatedScriptHost {
    gate: Arc<Gate>,
    scripts: Mutex<HashMap<String, Arc<dyn Script>>>,
    fail_next: Mutex<HashSet<String>>,
}

impl GatedScriptHost {
    pub fn new(gate: Arc<Gate>) -> Arc<Self> {
        Arc::new(Self {
            gate,
            scripts: Mutex::new(HashMap::new()),
            fail_next: Mutex::new(HashSet::new()),
        })
    }

    pub fn add(&self, src: &str, script: Arc<dyn Script>) {
        self.scripts.lock().insert(src.to_string(), script);
    }

    /// 下一次获取 `src` 返回 500
    pub fn fail_once(&self, src: &str) {
        self.fail_next.lock().insert(src.to_string());
    }
}

#[async_trait]
impl ScriptHost for GatedScriptHost {
    async fn fetch_script(&self, src: &str) -> Result<Arc<dyn Script>, LoadError> {
        self.gate.pass(src).await;
        if self.fail_next.lock().remove(src) {
            return Err(LoadError::transport(src, 500, "injected failure"));
        }
        self.scripts
            .lock()
            .get(src)
            .cloned()
            .ok_or_else(|| LoadError::transport(src, 404, "no such script"))
    }
}

/// 经过闸门的 HTTP 客户端
pub struct GatedHttpClient {
    gate: Arc<Gate>,
    pages: Mutex<HashMap<String, String>>,
    fail_next: Mutex<HashSet<String>>,
}

impl GatedHttpClient {
    pub fn new(gate: Arc<Gate>) -> Arc<Self> {
        Arc::new(Self {
            gate,
            pages: Mutex::new(HashMap::new()),
            fail_next: Mutex::new(HashSet::new()),
        })
    }

    pub fn add(&self, url: &str, body: &str) {
        self.pages.lock().insert(url.to_string(), body.to_string());
    }

    pub fn fail_once(&self, url: &str) {
        self.fail_next.lock().insert(url.to_string());
    }
}

#[async_trait]
impl HttpClient for GatedHttpClient {
    async fn get_text(&self, url: &str) -> Result<String, LoadError> {
        self.gate.pass(url).await;
        if self.fail_next.lock().remove(url) {
            return Err(LoadError::transport(url, 500, "injected failure"));
        }
        self.pages
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| LoadError::transport(url, 404, "no such page"))
    }
}

/// 一套共享同一个闸门的测试环境
pub struct Harness {
    pub gate: Arc<Gate>,
    pub scripts: Arc<GatedScriptHost>,
    pub http: Arc<GatedHttpClient>,
    pub document: Arc<MemoryDocument>,
    pub pi: Pi,
}

impl Harness {
    pub fn new(roots: &[&str]) -> Self {
        let gate = Gate::new();
        let scripts = GatedScriptHost::new(gate.clone());
        let http = GatedHttpClient::new(gate.clone());
        let document = Arc::new(MemoryDocument::new("data-pi-component"));
        for root in roots {
            document.add_mount_point(root);
        }

        let pi = Pi::builder()
            .config(PiConfig::default())
            .script_host(scripts.clone())
            .http(http.clone())
            .document(document.clone())
            .build()
            .unwrap();

        Self {
            gate,
            scripts,
            http,
            document,
            pi,
        }
    }
}
