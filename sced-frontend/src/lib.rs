pub mod cli;
pub mod errors;
pub mod script;
pub mod session;

use std::path::Path;

use errors::FrontendError;
use sced_config::AppConfig;
use tracing::info;

/// 回放内置演示脚本并打印场景概览。
pub fn run_cli_demo(config: &AppConfig) -> Result<(), FrontendError> {
    info!("启动 CLI 演示前端");
    cli::run_demo(config)
}

/// 回放指定的输入脚本。
pub fn run_script(path: &Path, config: &AppConfig) -> Result<(), FrontendError> {
    info!(path = %path.display(), "启动脚本回放");
    cli::run_script_file(path, config)
}
