//! Pi 配置管理系统
//!
//! 资源命名约定、地址前缀和日志设置；支持 YAML 与 TOML 配置文件

use crate::{PiError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 框架配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiConfig {
    /// 资源地址设置
    pub assets: AssetConfig,
    /// 组件约定
    pub components: ComponentConventions,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 资源地址设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// 所有资源地址的前缀
    pub base_url: String,
    /// 脚本扩展名
    pub script_extension: String,
    /// 原生宿主读取资源的根目录
    pub asset_root: PathBuf,
}

/// 组件约定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentConventions {
    /// 组件脚本名，`/card` 的脚本为 `/card/<component_script>`
    pub component_script: String,
    /// 描述符未声明模板时使用的文件名
    pub default_template: String,
    /// 描述符未声明样式表时使用的文件名
    pub default_stylesheet: String,
    /// 挂载点标记属性
    pub mount_attribute: String,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl Default for PiConfig {
    fn default() -> Self {
        Self {
            assets: AssetConfig {
                base_url: String::new(),
                script_extension: ".js".to_string(),
                asset_root: PathBuf::from("."),
            },
            components: ComponentConventions {
                component_script: "component".to_string(),
                default_template: "component.html".to_string(),
                default_stylesheet: "component.css".to_string(),
                mount_attribute: "data-pi-component".to_string(),
            },
            logging: LoggingConfig { level: LogLevel::Info },
        }
    }
}

/// 配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    config: PiConfig,
}

impl ConfigManager {
    /// 从文件加载配置，`.toml` 按 TOML 解析，其余按 YAML 解析
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PiError::config(&format!("Failed to read config file: {}", e)))?;

        let config: PiConfig = if is_toml(path) {
            toml::from_str(&content)
                .map_err(|e| PiError::config(&format!("Failed to parse config file: {}", e)))?
        } else {
            serde_yaml::from_str(&content)
                .map_err(|e| PiError::config(&format!("Failed to parse config file: {}", e)))?
        };

        Ok(Self { config })
    }

    /// 创建默认配置
    pub fn new_default() -> Self {
        Self {
            config: PiConfig::default(),
        }
    }

    pub fn from_config(config: PiConfig) -> Self {
        Self { config }
    }

    /// 保存配置到文件
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = if is_toml(path) {
            toml::to_string_pretty(&self.config)
                .map_err(|e| PiError::config(&format!("Failed to serialize config: {}", e)))?
        } else {
            serde_yaml::to_string(&self.config)?
        };

        tokio::fs::write(path, content)
            .await
            .map_err(|e| PiError::config(&format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn get_config(&self) -> &PiConfig {
        &self.config
    }

    pub fn get_config_mut(&mut self) -> &mut PiConfig {
        &mut self.config
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        let assets = &self.config.assets;
        if !assets.script_extension.is_empty() && !assets.script_extension.starts_with('.') {
            return Err(PiError::config("Script extension must start with '.'"));
        }

        let components = &self.config.components;
        if components.component_script.is_empty() {
            return Err(PiError::config("Component script name cannot be empty"));
        }
        if components.component_script.contains('/') {
            return Err(PiError::config("Component script name cannot contain '/'"));
        }
        if components.default_template.is_empty() || components.default_stylesheet.is_empty() {
            return Err(PiError::config("Default template and stylesheet names cannot be empty"));
        }
        if components.mount_attribute.is_empty() || components.mount_attribute.contains(char::is_whitespace) {
            return Err(PiError::config("Mount attribute must be a non-empty attribute name"));
        }

        tracing::info!("Configuration validation passed");
        Ok(())
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "toml")
}

/// 生成默认配置文件
pub async fn generate_default_config_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let config_manager = ConfigManager::new_default();
    config_manager.save_to_file(path).await?;
    Ok(())
}
