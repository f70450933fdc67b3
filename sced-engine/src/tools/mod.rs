//! 模态工具：交互式添加立方体、顶点编辑、面编辑，以及常驻的变换 gizmo。

pub mod add_cube;
pub mod face_edit;
pub mod gizmo;
pub mod vertex_edit;

use sced_core::geometry::Point3;

use crate::backend::SceneBackend;
use crate::command::CommandStack;
use crate::editor::EditorSettings;
use crate::errors::ToolError;
use crate::interaction::{EventMask, Modifiers, NumericEntry, NumericField, ToolInput};
use crate::registry::SceneRegistry;

pub use add_cube::AddCubeTool;
pub use face_edit::FaceEditTool;
pub use vertex_edit::VertexEditTool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    AddCube,
    VertexEdit,
    FaceEdit,
}

impl ToolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolKind::AddCube => "add_cube",
            ToolKind::VertexEdit => "vertex_edit",
            ToolKind::FaceEdit => "face_edit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolFlow {
    Continue,
    /// 工具请求结束；控制器随后调用 `stop(cancelled)`。
    Finished { cancelled: bool },
}

/// 一次工具回调可访问的场景与交互状态。
pub struct ToolContext<'a> {
    pub backend: &'a mut dyn SceneBackend,
    pub registry: &'a mut SceneRegistry,
    pub history: &'a mut CommandStack,
    pub settings: &'a EditorSettings,
    pub modifiers: Modifiers,
    pub numeric: &'a mut NumericEntry,
}

impl ToolContext<'_> {
    /// 按设置的步长取整。
    pub fn snap(&self, value: f64) -> f64 {
        snap_to(value, self.settings.snap_increment)
    }

    pub fn status(&mut self, message: &str) {
        self.backend.show_status(message);
    }

    /// 在 `at` 处一个屏幕像素对应的世界长度。
    pub fn units_per_pixel(&self, at: Point3) -> f64 {
        self.backend.camera().world_units_per_pixel(at)
    }
}

/// `round(value / step) * step`；步长非正时按 1 处理。
pub fn snap_to(value: f64, step: f64) -> f64 {
    let step = if step > 0.0 && step.is_finite() { step } else { 1.0 };
    (value / step).round() * step
}

/// 模态工具的生命周期：`start` → 若干 `handle` → `stop`。
///
/// 工具实例的临时状态不会在 `stop` 之后保留。
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// 启动时订阅的事件类别。
    fn subscriptions(&self) -> EventMask;

    /// 当前阶段接受数值输入的字段，首个为默认字段。
    fn numeric_fields(&self) -> &'static [NumericField] {
        &[]
    }

    fn start(&mut self, ctx: &mut ToolContext<'_>) -> Result<(), ToolError>;

    fn handle(&mut self, input: &ToolInput, ctx: &mut ToolContext<'_>) -> ToolFlow;

    /// `cancel` 为 `false` 时提交会话中的改动。
    fn stop(&mut self, cancel: bool, ctx: &mut ToolContext<'_>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapping_rounds_to_increment() {
        assert_eq!(snap_to(3.7, 1.0), 4.0);
        assert_eq!(snap_to(-1.26, 0.5), -1.5);
        assert_eq!(snap_to(2.4, 0.0), 2.0);
    }
}
