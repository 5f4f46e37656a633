//! 资源加载层
//!
//! 三个互相独立的子加载器，各自有去重和状态策略：
//! - [`ScriptLoader`]：注入并执行脚本，完成后通知
//! - [`StylesheetLoader`]：只注入一次，不通知
//! - [`TemplateLoader`]：HTTP 获取模板文本，失败可重试

pub mod script;
pub mod stylesheet;
pub mod template;

pub use script::*;
pub use stylesheet::*;
pub use template::*;

/// 把组件目录内的相对资源地址解析为完整路径。
///
/// 以 `/` 开头或带协议的地址原样返回。
pub fn resolve_asset(component_path: &str, asset: &str) -> String {
    if asset.starts_with('/') || asset.contains("://") {
        return asset.to_string();
    }
    format!("{}/{}", component_path.trim_end_matches('/'), asset)
}

/// 给资源路径加上 `base_url` 前缀；已带协议的地址原样返回
pub fn asset_url(base_url: &str, path: &str) -> String {
    if path.contains("://") {
        return path.to_string();
    }
    format!("{}{}", base_url, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_asset() {
        assert_eq!(resolve_asset("/card", "tpl.html"), "/card/tpl.html");
        assert_eq!(resolve_asset("/card/", "tpl.html"), "/card/tpl.html");
        assert_eq!(resolve_asset("/card", "/shared/tpl.html"), "/shared/tpl.html");
        assert_eq!(
            resolve_asset("/card", "https://cdn.example/tpl.html"),
            "https://cdn.example/tpl.html"
        );
    }

    #[test]
    fn test_asset_url() {
        assert_eq!(asset_url("", "/card/tpl.html"), "/card/tpl.html");
        assert_eq!(asset_url("https://cdn.example", "/card/tpl.html"), "https://cdn.example/card/tpl.html");
        assert_eq!(
            asset_url("https://cdn.example", "https://other.example/tpl.html"),
            "https://other.example/tpl.html"
        );
    }
}
