//! Pi 命令行 - 配置驱动挂载
//!
//! 从本地目录读取组件清单、服务清单和模板，把组件挂载到内存文档并输出渲染结果

use pi_runtime::{
    config::{ConfigManager, LogLevel},
    FsHttpClient, ManifestScriptHost, MemoryDocument, Pi, PiError, Result,
};
use std::env;
use std::path::Path;
use std::sync::Arc;

/// 程序入口点
#[tokio::main]
async fn main() {
    if let Err(e) = run_main().await {
        // 日志可能尚未初始化
        let _ = pi_runtime::initialize(LogLevel::Error);
        tracing::error!("Run failed: {}", e);
        std::process::exit(1);
    }
}

async fn run_main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.as_slice() {
        [_, command] if command == "init" => generate_config_file().await,
        [_, config_path, root, path] => mount_from_config(config_path, root, path).await,
        _ => {
            print_usage();
            Ok(())
        }
    }
}

/// 按配置文件挂载组件
async fn mount_from_config(config_path: &str, root: &str, path: &str) -> Result<()> {
    if !Path::new(config_path).exists() {
        return Err(PiError::config(&format!(
            "Config file not found: {} (use 'pi_runtime init' to generate one)",
            config_path
        )));
    }

    let config_manager = ConfigManager::load_from_file(config_path).await?;
    config_manager.validate()?;
    let config = config_manager.get_config().clone();
    pi_runtime::initialize(config.logging.level)?;
    tracing::info!(
        asset_root = %config.assets.asset_root.display(),
        root,
        path,
        "Mounting component"
    );

    let document = Arc::new(MemoryDocument::new(&config.components.mount_attribute));
    document.add_mount_point(root);

    let asset_root = config.assets.asset_root.clone();
    let pi = Pi::builder()
        .config(config)
        .script_host(Arc::new(ManifestScriptHost::new(&asset_root)))
        .http(Arc::new(FsHttpClient::new(&asset_root)))
        .document(document.clone())
        .build()?;

    let mounted = pi.mount(root, path).await?;
    tracing::info!(
        mount_id = %mounted.mount_id,
        imports = ?mounted.imports,
        "Mount completed"
    );

    println!("{}", document.render());
    Ok(())
}

/// 生成默认配置文件
async fn generate_config_file() -> Result<()> {
    let config_path = "pi_config.yaml";
    pi_runtime::initialize(LogLevel::Info)?;

    tracing::info!("Generating default config file: {}", config_path);
    // 清单宿主的脚本是 YAML 文件
    let mut config_manager = ConfigManager::new_default();
    config_manager.get_config_mut().assets.script_extension = ".yaml".to_string();
    config_manager.save_to_file(config_path).await?;

    tracing::info!("Edit the config file, then run: pi_runtime {} <root> <component-path>", config_path);
    Ok(())
}

fn print_usage() {
    println!("Usage:");
    println!("  pi_runtime init                          generate pi_config.yaml");
    println!("  pi_runtime <config> <root> <path>        mount <path> at <root> and print the document");
}
