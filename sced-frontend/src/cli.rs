use std::fs;
use std::path::Path;

use sced_config::{AppConfig, OutputFormat};
use tracing::info;

use crate::errors::FrontendError;
use crate::script::{ScriptStep, parse_script};
use crate::session::{SceneSummary, Session};

/// 内置演示：数值输入添加立方体，复制、旋转副本、添加聚光灯后撤销一步。
pub const DEMO_SCRIPT: &str = "\
# 添加 4×4×3 立方体，锚点在地面原点
action tool.add_cube
down 50 50
up 50 50
type 4
key d
type 4
key enter
type 3
key enter
# 复制并绕 Z 轴旋转副本
action duplicate_selected
action gizmo.rotate
gizmo begin
gizmo turn 45
gizmo end
action light.add spot
action undo
select cube
color 0.8 0.3 0.2
render
";

/// 回放内置演示脚本，打印支持的动作与场景概览。
pub fn run_demo(config: &AppConfig) -> Result<(), FrontendError> {
    let steps = parse_script(DEMO_SCRIPT)?;
    let session = replay(&steps, config);
    if config.frontend.output == OutputFormat::Text {
        println!("Rust 版场景编辑器 CLI 演示");
        println!("支持的动作: {}", session.available_actions().join(", "));
    }
    println!("{}", render_summary(&session.summary(), config.frontend.output)?);
    Ok(())
}

/// 读取并回放脚本文件。
pub fn run_script_file(path: &Path, config: &AppConfig) -> Result<(), FrontendError> {
    let text = fs::read_to_string(path).map_err(|source| FrontendError::ScriptIo {
        path: path.to_path_buf(),
        source,
    })?;
    let steps = parse_script(&text)?;
    info!(path = %path.display(), steps = steps.len(), "脚本解析完成");
    let session = replay(&steps, config);
    println!("{}", render_summary(&session.summary(), config.frontend.output)?);
    Ok(())
}

pub fn replay(steps: &[ScriptStep], config: &AppConfig) -> Session {
    let mut session = Session::new(&config.editor);
    session.run(steps);
    let summary = session.summary();
    info!(
        objects = summary.objects.len(),
        history = summary.history.index,
        "脚本回放完成"
    );
    session
}

pub fn render_summary(
    summary: &SceneSummary,
    format: OutputFormat,
) -> Result<String, FrontendError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
        OutputFormat::Text => Ok(render_text(summary)),
    }
}

fn render_text(summary: &SceneSummary) -> String {
    let mut lines = Vec::new();
    for message in &summary.messages {
        lines.push(message.clone());
    }

    lines.push(format!("场景对象 ({}):", summary.objects.len()));
    for object in &summary.objects {
        let [x, y, z] = object.center;
        let mut line = format!(
            "  - {} [{}] 中心=({x:.2}, {y:.2}, {z:.2})",
            object.name,
            if object.kind == "light" { "灯光" } else { "网格" }
        );
        if let (Some(vertices), Some(faces)) = (object.vertices, object.faces) {
            line.push_str(&format!(" 顶点={vertices} 面={faces}"));
        }
        lines.push(line);
    }

    if summary.selection.is_empty() {
        lines.push("当前未选中任何对象。".to_string());
    } else {
        lines.push(format!("选中: {}", summary.selection.join(", ")));
    }
    if let Some(tool) = summary.active_tool {
        lines.push(format!("活动工具: {tool}"));
    }
    if let Some(mode) = summary.edit_mode {
        lines.push(format!("编辑模式: {mode}"));
    }
    lines.push(format!(
        "变换模式: {} (gizmo {})",
        summary.transform_mode,
        if summary.gizmo_enabled { "启用" } else { "关闭" }
    ));
    lines.push(format!(
        "历史: {}/{} 撤销={} 重做={}",
        summary.history.index,
        summary.history.len,
        summary.history.undo.as_deref().unwrap_or("<无>"),
        summary.history.redo.as_deref().unwrap_or("<无>")
    ));
    if let Some(status) = &summary.status {
        lines.push(format!("状态栏: {status}"));
    }
    lines.join("\n")
}
