use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("读取脚本 {path:?} 失败: {source}")]
    ScriptIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("脚本第 {line} 行无法解析: {message}")]
    ScriptParse { line: usize, message: String },
    #[error("序列化场景摘要失败: {0}")]
    Summary(#[from] serde_json::Error),
}
