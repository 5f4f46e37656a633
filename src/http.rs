//! HTTP 客户端实现
//!
//! - [`ReqwestClient`]：基于 reqwest 的网络获取
//! - [`FsHttpClient`]：把 URL 路径映射到本地目录，用于离线运行和测试

use crate::error::LoadError;
use crate::host::HttpClient;
use async_trait::async_trait;
use reqwest::Client;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// 基于 reqwest 的 HTTP 客户端
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_text(&self, url: &str) -> Result<String, LoadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::transport(url, 0, &e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LoadError::transport(url, status.as_u16(), &e.to_string()))?;

        if status.is_success() {
            Ok(body)
        } else {
            tracing::debug!(url, status = status.as_u16(), "Non-success response");
            Err(LoadError::transport(url, status.as_u16(), &body))
        }
    }
}

/// 从本地目录读取文本的客户端，文件不存在时返回 404
#[derive(Debug, Clone)]
pub struct FsHttpClient {
    root: PathBuf,
}

impl FsHttpClient {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// URL 对应的本地文件
    pub fn file_path(&self, url: &str) -> PathBuf {
        self.root.join(url.trim_start_matches('/'))
    }
}

#[async_trait]
impl HttpClient for FsHttpClient {
    async fn get_text(&self, url: &str) -> Result<String, LoadError> {
        let file = self.file_path(url);
        tokio::fs::read_to_string(&file).await.map_err(|e| {
            let status = if e.kind() == ErrorKind::NotFound { 404 } else { 500 };
            LoadError::transport(url, status, &e.to_string())
        })
    }
}
