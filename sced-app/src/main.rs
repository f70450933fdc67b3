use std::path::PathBuf;

use sced_config::{AppConfig, ConfigError, OutputFormat};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let mut args = std::env::args().skip(1);
    let mut output_override: Option<OutputFormat> = None;
    let mut config_override: Option<PathBuf> = None;
    let mut script: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => output_override = Some(OutputFormat::Json),
            "--text" => output_override = Some(OutputFormat::Text),
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("`--config` 需要提供配置文件路径");
                    std::process::exit(1);
                };
                config_override = Some(PathBuf::from(path));
            }
            "--script" => {
                let Some(path) = args.next() else {
                    eprintln!("`--script` 需要提供脚本路径");
                    std::process::exit(1);
                };
                script = Some(PathBuf::from(path));
            }
            other => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
        }
    }

    let mut config = load_configuration(config_override);
    init_logging(&config);
    info!("启动场景编辑器");

    if let Some(output) = output_override {
        config.frontend.output = output;
    }

    match script {
        Some(path) => {
            info!(path = %path.display(), "以脚本模式启动");
            if let Err(err) = sced_frontend::run_script(&path, &config) {
                error!(error = %err, "脚本回放失败");
                eprintln!("{err}");
                std::process::exit(1);
            }
        }
        None => {
            info!("以 CLI 演示模式启动");
            if let Err(err) = sced_frontend::run_cli_demo(&config) {
                error!(error = %err, "执行 CLI 演示失败");
                std::process::exit(1);
            }
        }
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

/// 日志写到 stderr，stdout 只留给场景概览。
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
