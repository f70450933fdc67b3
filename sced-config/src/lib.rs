use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 指定配置文件路径的环境变量。
pub const CONFIG_ENV: &str = "SCED_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `SCED_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GizmoMode {
    #[default]
    Translate,
    Rotate,
    Scale,
    Combined,
}

/// 编辑交互参数。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// 添加立方体时吸附的步长。
    pub snap_increment: f64,
    /// 撤销历史深度，0 表示不限。
    pub history_limit: usize,
    /// 顶点标记的屏幕半径（像素）。
    pub vertex_marker_pixels: f64,
    pub marker_min_radius: f64,
    pub marker_max_radius: f64,
    /// 拉伸高度时的额外倍率。
    pub height_drag_gain: f64,
    pub gizmo_enabled: bool,
    pub default_transform_mode: GizmoMode,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_increment: 1.0,
            history_limit: 256,
            vertex_marker_pixels: 14.0,
            marker_min_radius: 0.02,
            marker_max_radius: 5.0,
            height_drag_gain: 1.75,
            gizmo_enabled: true,
            default_transform_mode: GizmoMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrontendConfig {
    #[serde(default)]
    pub output: OutputFormat,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_returned_when_file_missing() {
        let cfg = AppConfig::discover().expect("discover should succeed");
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.frontend.output, OutputFormat::Text);
        assert_eq!(cfg.editor.history_limit, 256);
        assert_eq!(cfg.editor.default_transform_mode, GizmoMode::Translate);
        assert!(cfg.editor.gizmo_enabled);
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [editor]
            snap_increment = 0.25
            history_limit = 0
            default_transform_mode = "scale"

            [frontend]
            output = "json"
            "#
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.editor.snap_increment, 0.25);
        assert_eq!(cfg.editor.history_limit, 0);
        assert_eq!(cfg.editor.default_transform_mode, GizmoMode::Scale);
        // 未写出的字段保持默认
        assert_eq!(cfg.editor.vertex_marker_pixels, 14.0);
        assert_eq!(cfg.frontend.output, OutputFormat::Json);
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[editor]\ndefault_transform_mode = \"skew\"").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let missing = AppConfig::from_file("/nonexistent/sced.toml").unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
