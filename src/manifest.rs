//! 清单脚本宿主
//!
//! 原生环境没有脚本引擎，脚本由 YAML 清单表示：
//!
//! ```yaml
//! kind: component
//! path: /card
//! template: card.html
//! imports: [/svc/a]
//! ```
//!
//! ```yaml
//! kind: service
//! name: A
//! path: /svc/a
//! body: { x: 1 }
//! ```
//!
//! 执行清单即调用 `define` / `register`。清单组件的 `init` 用导入的服务主体
//! 替换已写入挂载点的模板中的 `{{Name.key}}` 占位符。

use crate::component::{ComponentDescriptor, Imports};
use crate::error::LoadError;
use crate::host::{MountPoint, Script, ScriptHost};
use crate::registrar::Registrar;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// 脚本清单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Manifest {
    Component(ComponentManifest),
    Service(ServiceManifest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentManifest {
    pub path: String,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub styles: Option<String>,
    #[serde(default)]
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceManifest {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub body: Value,
}

impl Manifest {
    pub fn from_yaml(src: &str, content: &str) -> Result<Self, LoadError> {
        serde_yaml::from_str(content).map_err(|e| LoadError::invalid(src, &e.to_string()))
    }
}

impl Script for Manifest {
    fn execute(&self, registrar: &Registrar) {
        let result = match self {
            Manifest::Component(component) => registrar.define(component.descriptor()),
            Manifest::Service(service) => registrar.register(&service.name, &service.path, service.body.clone()),
        };
        if let Err(err) = result {
            warn!("Manifest registration rejected: {}", err);
        }
    }
}

impl ComponentManifest {
    /// 转换为组件描述符，`init` 渲染占位符
    pub fn descriptor(&self) -> ComponentDescriptor {
        let mut descriptor = ComponentDescriptor::new(&self.path).init(render_into);
        if let Some(template) = &self.template {
            descriptor = descriptor.template(template);
        }
        if let Some(styles) = &self.styles {
            descriptor = descriptor.styles(styles);
        }
        for import in &self.imports {
            descriptor = descriptor.import(import);
        }
        descriptor
    }
}

fn render_into(imports: Imports, root: Arc<dyn MountPoint>) {
    let html = render(&root.inner_html(), &imports);
    root.set_inner_html(&html);
}

/// 替换 `{{Name}}` 和 `{{Name.a.b}}` 占位符；无法解析的占位符原样保留
pub fn render(markup: &str, imports: &Imports) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let expr = after[..end].trim();
        match lookup(expr, imports) {
            Some(value) => out.push_str(&display(value)),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

fn lookup<'a>(expr: &str, imports: &'a Imports) -> Option<&'a Value> {
    let mut segments = expr.split('.');
    let name = segments.next()?;
    let mut value = imports.body(name)?.downcast_ref::<Value>()?;
    for segment in segments {
        value = match value {
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            other => other.get(segment)?,
        };
    }
    Some(value)
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// 从本地目录读取清单的脚本宿主
#[derive(Debug, Clone)]
pub struct ManifestScriptHost {
    root: PathBuf,
}

impl ManifestScriptHost {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ScriptHost for ManifestScriptHost {
    async fn fetch_script(&self, src: &str) -> Result<Arc<dyn Script>, LoadError> {
        let file = self.root.join(src.trim_start_matches('/'));
        let content = tokio::fs::read_to_string(&file).await.map_err(|e| {
            let status = if e.kind() == ErrorKind::NotFound { 404 } else { 500 };
            LoadError::transport(src, status, &e.to_string())
        })?;

        let manifest = Manifest::from_yaml(src, &content)?;
        debug!(src, file = %file.display(), "Manifest fetched");
        Ok(Arc::new(manifest))
    }
}
