//! Pi 错误处理系统
//!
//! 统一的错误类型和错误处理机制。加载错误需要在多个等待者之间共享，因此实现 `Clone`。

use thiserror::Error;

/// 资源加载错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Transport error: {url} responded with status {status}")]
    Transport {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Script {path} finished loading without registering anything")]
    NotRegistered { path: String },

    #[error("Load of {key} was abandoned before completion")]
    Abandoned { key: String },

    #[error("Invalid resource at {url}: {reason}")]
    Invalid { url: String, reason: String },
}

impl LoadError {
    /// 创建传输错误
    pub fn transport(url: &str, status: u16, body: &str) -> Self {
        Self::Transport {
            url: url.to_string(),
            status,
            body: body.to_string(),
        }
    }

    /// 创建未注册错误
    pub fn not_registered(path: &str) -> Self {
        Self::NotRegistered {
            path: path.to_string(),
        }
    }

    pub fn invalid(url: &str, reason: &str) -> Self {
        Self::Invalid {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// HTTP 状态码（仅传输错误）
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// 注册对象的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationKind {
    Component,
    Service,
}

impl std::fmt::Display for RegistrationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Component => write!(f, "component"),
            Self::Service => write!(f, "service"),
        }
    }
}

/// 注册错误（配置错误），不改变任何状态
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Duplicate {kind} registration for path: {path}")]
    Duplicate { kind: RegistrationKind, path: String },

    #[error("Malformed {kind} registration: {reason}")]
    Malformed { kind: RegistrationKind, reason: String },
}

impl RegistrationError {
    pub fn duplicate(kind: RegistrationKind, path: &str) -> Self {
        Self::Duplicate {
            kind,
            path: path.to_string(),
        }
    }

    pub fn malformed(kind: RegistrationKind, reason: &str) -> Self {
        Self::Malformed {
            kind,
            reason: reason.to_string(),
        }
    }
}

/// 组件挂载错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MountError {
    #[error("No mount point found for root: {root}")]
    RootNotFound { root: String },

    #[error("Component could not be resolved: {0}")]
    Component(LoadError),

    #[error("Service import could not be resolved: {0}")]
    Service(LoadError),

    #[error("Template could not be loaded: {0}")]
    Template(LoadError),
}

impl MountError {
    pub fn root_not_found(root: &str) -> Self {
        Self::RootNotFound {
            root: root.to_string(),
        }
    }

    /// 底层的加载错误（如果有）
    pub fn load_error(&self) -> Option<&LoadError> {
        match self {
            Self::RootNotFound { .. } => None,
            Self::Component(e) | Self::Service(e) | Self::Template(e) => Some(e),
        }
    }
}

/// 框架统一错误类型
#[derive(Error, Debug)]
pub enum PiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Mount(#[from] MountError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

impl PiError {
    /// 创建配置相关错误
    pub fn config(message: &str) -> Self {
        Self::Config {
            message: message.to_string(),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, PiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = PiError::config("bad extension");
        assert!(matches!(error, PiError::Config { .. }));
        assert_eq!(error.to_string(), "Configuration error: bad extension");
    }

    #[test]
    fn test_error_from_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let pi_error = PiError::from(io_error);
        assert!(matches!(pi_error, PiError::Io(_)));
    }

    #[test]
    fn test_mount_error_exposes_load_error() {
        let error = MountError::Template(LoadError::transport("/card/tpl.html", 404, "missing"));
        assert_eq!(error.load_error().and_then(LoadError::status), Some(404));
        assert!(MountError::root_not_found("r1").load_error().is_none());
    }

    #[test]
    fn test_registration_error_message() {
        let error = RegistrationError::duplicate(RegistrationKind::Component, "/card");
        assert_eq!(error.to_string(), "Duplicate component registration for path: /card");
    }
}
