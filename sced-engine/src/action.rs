use std::collections::HashMap;

use sced_core::snapshot::LightKind;

use crate::backend::SceneBackend;
use crate::editor::{EditSubmode, Editor, ResetPart};
use crate::tools::gizmo::TransformMode;

#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub name: String,
    pub args: Vec<String>,
}

impl ActionRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActionResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

pub trait ActionHandler<B: SceneBackend>: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        request: &ActionRequest,
        context: &mut ActionContext<'_, B>,
    ) -> ActionResponse;
}

pub struct ActionContext<'a, B: SceneBackend> {
    pub editor: &'a mut Editor<B>,
}

/// 菜单、快捷键与脚本共用的命名动作表。
pub struct ActionBus<B: SceneBackend> {
    handlers: HashMap<&'static str, Box<dyn ActionHandler<B>>>,
}

impl<B: SceneBackend> Default for ActionBus<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: SceneBackend> ActionBus<B> {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(UndoAction);
        bus.register(RedoAction);
        bus.register(DeleteSelectedAction);
        bus.register(DuplicateSelectedAction);
        bus.register(AddCubeAction);
        bus.register(AddLightAction);
        bus.register(ResetTransformAction);
        bus.register(EditModeAction("edit.vertex", EditSubmode::Vertex));
        bus.register(EditModeAction("edit.face", EditSubmode::Face));
        bus.register(ExitEditModeAction);
        bus.register(GizmoModeAction("gizmo.translate", TransformMode::Translate));
        bus.register(GizmoModeAction("gizmo.rotate", TransformMode::Rotate));
        bus.register(GizmoModeAction("gizmo.scale", TransformMode::Scale));
        bus.register(GizmoModeAction("gizmo.combined", TransformMode::Combined));
        bus.register(ToggleGizmoAction);
        bus
    }

    pub fn register<H: ActionHandler<B> + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &ActionRequest,
        context: &mut ActionContext<'_, B>,
    ) -> ActionResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            handler.execute(request, context)
        } else {
            ActionResponse::err(format!("未知动作: {}", request.name))
        }
    }

    /// 按名称排序的动作列表。
    pub fn available_actions(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

struct UndoAction;

impl<B: SceneBackend> ActionHandler<B> for UndoAction {
    fn name(&self) -> &'static str {
        "undo"
    }

    fn execute(
        &self,
        _request: &ActionRequest,
        context: &mut ActionContext<'_, B>,
    ) -> ActionResponse {
        let label = context.editor.undo_label();
        match label {
            Some(label) if context.editor.undo() => ActionResponse::ok(format!("已撤销: {label}")),
            _ => ActionResponse::err("没有可撤销的操作"),
        }
    }
}

struct RedoAction;

impl<B: SceneBackend> ActionHandler<B> for RedoAction {
    fn name(&self) -> &'static str {
        "redo"
    }

    fn execute(
        &self,
        _request: &ActionRequest,
        context: &mut ActionContext<'_, B>,
    ) -> ActionResponse {
        let label = context.editor.redo_label();
        match label {
            Some(label) if context.editor.redo() => ActionResponse::ok(format!("已重做: {label}")),
            _ => ActionResponse::err("没有可重做的操作"),
        }
    }
}

struct DeleteSelectedAction;

impl<B: SceneBackend> ActionHandler<B> for DeleteSelectedAction {
    fn name(&self) -> &'static str {
        "delete_selected"
    }

    fn execute(
        &self,
        _request: &ActionRequest,
        context: &mut ActionContext<'_, B>,
    ) -> ActionResponse {
        match context.editor.delete_selected() {
            Ok(count) => ActionResponse::ok(format!("已删除 {count} 个对象")),
            Err(err) => ActionResponse::err(err.to_string()),
        }
    }
}

struct DuplicateSelectedAction;

impl<B: SceneBackend> ActionHandler<B> for DuplicateSelectedAction {
    fn name(&self) -> &'static str {
        "duplicate_selected"
    }

    fn execute(
        &self,
        _request: &ActionRequest,
        context: &mut ActionContext<'_, B>,
    ) -> ActionResponse {
        match context.editor.duplicate_selected() {
            Ok(copies) => ActionResponse::ok(format!("已复制 {} 个对象", copies.len())),
            Err(err) => ActionResponse::err(err.to_string()),
        }
    }
}

struct AddCubeAction;

impl<B: SceneBackend> ActionHandler<B> for AddCubeAction {
    fn name(&self) -> &'static str {
        "tool.add_cube"
    }

    fn execute(
        &self,
        _request: &ActionRequest,
        context: &mut ActionContext<'_, B>,
    ) -> ActionResponse {
        match context.editor.start_add_cube() {
            Ok(()) => ActionResponse::ok("添加立方体：点击地面放置第一个角点"),
            Err(err) => ActionResponse::err(err.to_string()),
        }
    }
}

/// `light.add [point|directional|spot]`，缺省为点光。
struct AddLightAction;

impl<B: SceneBackend> ActionHandler<B> for AddLightAction {
    fn name(&self) -> &'static str {
        "light.add"
    }

    fn execute(
        &self,
        request: &ActionRequest,
        context: &mut ActionContext<'_, B>,
    ) -> ActionResponse {
        let kind = match request.args.first().map(|arg| arg.to_ascii_lowercase()) {
            None => LightKind::Point,
            Some(arg) => match arg.as_str() {
                "point" => LightKind::Point,
                "directional" => LightKind::Directional,
                "spot" => LightKind::Spot,
                other => return ActionResponse::err(format!("未知灯光类型: {other}")),
            },
        };
        match context.editor.add_light(kind) {
            Some(target) => {
                let name = context.editor.registry().name_of(target).unwrap_or("light");
                ActionResponse::ok(format!("已添加灯光 {name}"))
            }
            None => ActionResponse::err("灯光创建失败"),
        }
    }
}

/// `transform.reset <position|rotation|scale|all>`，作用于主选中对象。
struct ResetTransformAction;

impl<B: SceneBackend> ActionHandler<B> for ResetTransformAction {
    fn name(&self) -> &'static str {
        "transform.reset"
    }

    fn execute(
        &self,
        request: &ActionRequest,
        context: &mut ActionContext<'_, B>,
    ) -> ActionResponse {
        let part = match request.args.first() {
            None => ResetPart::All,
            Some(arg) => match ResetPart::parse(arg) {
                Some(part) => part,
                None => return ActionResponse::err(format!("未知重置部件: {arg}")),
            },
        };
        let Some(target) = context.editor.primary() else {
            return ActionResponse::err("未选中对象");
        };
        match context.editor.reset_transform(target, part) {
            Ok(true) => ActionResponse::ok("变换已重置"),
            Ok(false) => ActionResponse::ok("变换无变化"),
            Err(err) => ActionResponse::err(err.to_string()),
        }
    }
}

struct EditModeAction(&'static str, EditSubmode);

impl<B: SceneBackend> ActionHandler<B> for EditModeAction {
    fn name(&self) -> &'static str {
        self.0
    }

    fn execute(
        &self,
        _request: &ActionRequest,
        context: &mut ActionContext<'_, B>,
    ) -> ActionResponse {
        let result = if context.editor.edit_mode().is_some() {
            context.editor.switch_edit_submode(self.1)
        } else {
            context.editor.enter_edit_mode(self.1)
        };
        match result {
            Ok(()) => ActionResponse::ok(format!("编辑模式: {}", self.1.as_str())),
            Err(err) => ActionResponse::err(err.to_string()),
        }
    }
}

struct ExitEditModeAction;

impl<B: SceneBackend> ActionHandler<B> for ExitEditModeAction {
    fn name(&self) -> &'static str {
        "edit.exit"
    }

    fn execute(
        &self,
        _request: &ActionRequest,
        context: &mut ActionContext<'_, B>,
    ) -> ActionResponse {
        if context.editor.exit_edit_mode() {
            ActionResponse::ok("已退出编辑模式")
        } else {
            ActionResponse::err("当前不在编辑模式")
        }
    }
}

struct GizmoModeAction(&'static str, TransformMode);

impl<B: SceneBackend> ActionHandler<B> for GizmoModeAction {
    fn name(&self) -> &'static str {
        self.0
    }

    fn execute(
        &self,
        _request: &ActionRequest,
        context: &mut ActionContext<'_, B>,
    ) -> ActionResponse {
        context.editor.set_transform_mode(self.1);
        ActionResponse::ok(format!("变换模式: {}", self.1))
    }
}

struct ToggleGizmoAction;

impl<B: SceneBackend> ActionHandler<B> for ToggleGizmoAction {
    fn name(&self) -> &'static str {
        "gizmo.toggle"
    }

    fn execute(
        &self,
        _request: &ActionRequest,
        context: &mut ActionContext<'_, B>,
    ) -> ActionResponse {
        if context.editor.toggle_gizmo() {
            ActionResponse::ok("gizmo 已启用")
        } else {
            ActionResponse::ok("gizmo 已关闭")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditorSettings;
    use crate::memory::MemoryBackend;

    #[test]
    fn undo_redo_and_unknown_actions() {
        let mut editor = Editor::new(MemoryBackend::new(), EditorSettings::default());
        let bus = ActionBus::new();
        let mut context = ActionContext { editor: &mut editor };

        let add = ActionRequest::with_args("light.add", vec!["spot".to_string()]);
        assert!(bus.dispatch(&add, &mut context).success);
        assert_eq!(context.editor.backend().object_count(), 1);

        let undo = bus.dispatch(&ActionRequest::new("undo"), &mut context);
        assert!(undo.success);
        assert_eq!(undo.message.as_deref(), Some("已撤销: Add spot_light"));
        assert_eq!(context.editor.backend().object_count(), 0);
        assert!(!bus.dispatch(&ActionRequest::new("undo"), &mut context).success);

        assert!(bus.dispatch(&ActionRequest::new("redo"), &mut context).success);
        assert_eq!(context.editor.backend().object_count(), 1);

        let unknown = bus.dispatch(&ActionRequest::new("file.open"), &mut context);
        assert!(!unknown.success);
        assert_eq!(unknown.message.as_deref(), Some("未知动作: file.open"));
    }

    #[test]
    fn gizmo_actions_switch_mode_and_toggle() {
        let mut editor = Editor::new(MemoryBackend::new(), EditorSettings::default());
        let bus = ActionBus::new();
        let mut context = ActionContext { editor: &mut editor };

        assert!(bus.dispatch(&ActionRequest::new("gizmo.scale"), &mut context).success);
        assert_eq!(context.editor.gizmo().mode(), TransformMode::Scale);
        bus.dispatch(&ActionRequest::new("gizmo.toggle"), &mut context);
        assert!(!context.editor.gizmo().is_enabled());

        let edit = bus.dispatch(&ActionRequest::new("edit.vertex"), &mut context);
        assert!(!edit.success);
        assert!(bus.available_actions().contains(&"tool.add_cube"));
    }
}
