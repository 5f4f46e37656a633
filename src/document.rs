//! 内存文档
//!
//! [`Document`] 的内存实现，供原生宿主、命令行和测试使用。

use crate::host::{Document, MountPoint};
use parking_lot::RwLock;
use std::sync::Arc;

/// 内存中的挂载元素
pub struct MemoryElement {
    root: String,
    html: RwLock<String>,
}

impl MemoryElement {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.to_string(),
            html: RwLock::new(String::new()),
        }
    }
}

impl MountPoint for MemoryElement {
    fn root(&self) -> &str {
        &self.root
    }

    fn inner_html(&self) -> String {
        self.html.read().clone()
    }

    fn set_inner_html(&self, html: &str) {
        *self.html.write() = html.to_string();
    }
}

/// 内存文档
pub struct MemoryDocument {
    attribute: String,
    elements: RwLock<Vec<Arc<MemoryElement>>>,
    stylesheets: RwLock<Vec<String>>,
}

impl MemoryDocument {
    /// 使用标记属性名创建文档
    pub fn new(attribute: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
            elements: RwLock::new(Vec::new()),
            stylesheets: RwLock::new(Vec::new()),
        }
    }

    /// 添加挂载点；同名挂载点已存在时返回已有元素
    pub fn add_mount_point(&self, root: &str) -> Arc<MemoryElement> {
        let mut elements = self.elements.write();
        if let Some(existing) = elements.iter().find(|e| e.root == root) {
            return existing.clone();
        }
        let element = Arc::new(MemoryElement::new(root));
        elements.push(element.clone());
        element
    }

    /// 已注入的样式表，按注入顺序
    pub fn stylesheets(&self) -> Vec<String> {
        self.stylesheets.read().clone()
    }

    /// 渲染整个文档
    pub fn render(&self) -> String {
        let mut out = String::new();
        for href in self.stylesheets.read().iter() {
            out.push_str(&format!("<link rel=\"stylesheet\" type=\"text/css\" href=\"{}\">\n", href));
        }
        for element in self.elements.read().iter() {
            out.push_str(&format!(
                "<div {}=\"{}\">{}</div>\n",
                self.attribute,
                element.root,
                element.inner_html()
            ));
        }
        out
    }
}

impl Document for MemoryDocument {
    fn mount_point(&self, root: &str) -> Option<Arc<dyn MountPoint>> {
        self.elements
            .read()
            .iter()
            .find(|e| e.root == root)
            .map(|e| e.clone() as Arc<dyn MountPoint>)
    }

    fn append_stylesheet(&self, href: &str) {
        self.stylesheets.write().push(href.to_string());
    }
}
