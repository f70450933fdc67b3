//! 编辑器门面：持有后端、注册表、历史、交互控制器与 gizmo，向 GUI/菜单层暴露操作。

use glam::{DQuat, DVec3};
use sced_core::geometry::{Point2, Point3, Vector3};
use sced_core::object::SceneObjectRef;
use sced_core::snapshot::{
    LightKind, LightSnapshot, ObjectSpec, PropertySnapshot, TransformSnapshot,
};
use tracing::{debug, info, warn};

use crate::backend::SceneBackend;
use crate::command::{Command, CommandStack, DeletedObject, PropertyEntry};
use crate::errors::EngineError;
use crate::interaction::{
    EventOutcome, InputEvent, InteractionController, Key, Modifiers, PointerButton, SceneParts,
};
use crate::registry::SceneRegistry;
use crate::tools::gizmo::{TransformGizmo, TransformMode};
use crate::tools::{AddCubeTool, FaceEditTool, Tool, ToolKind, VertexEditTool};

/// 复制对象时相对原对象的平移。
const DUPLICATE_OFFSET: Vector3 = Vector3(DVec3::new(1.0, 1.0, 0.0));

/// 编辑器可调参数，由配置层填充。
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSettings {
    /// 添加立方体时 Ctrl 吸附的步长。
    pub snap_increment: f64,
    /// 历史深度上限，0 表示不限。
    pub history_limit: usize,
    /// 顶点标记的屏幕半径（像素）。
    pub vertex_marker_pixels: f64,
    pub marker_min_radius: f64,
    pub marker_max_radius: f64,
    /// 拉伸高度时在每像素世界长度上的额外倍率。
    pub height_drag_gain: f64,
    pub gizmo_enabled: bool,
    pub default_transform_mode: TransformMode,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            snap_increment: 1.0,
            history_limit: 256,
            vertex_marker_pixels: 14.0,
            marker_min_radius: 0.02,
            marker_max_radius: 5.0,
            height_drag_gain: 1.75,
            gizmo_enabled: true,
            default_transform_mode: TransformMode::Translate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditSubmode {
    Vertex,
    Face,
}

impl EditSubmode {
    pub fn as_str(self) -> &'static str {
        match self {
            EditSubmode::Vertex => "vertex",
            EditSubmode::Face => "face",
        }
    }
}

/// 变换面板的“重置”按钮。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetPart {
    Position,
    Rotation,
    Scale,
    All,
}

impl ResetPart {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "position" | "location" | "loc" => Some(Self::Position),
            "rotation" | "rot" => Some(Self::Rotation),
            "scale" => Some(Self::Scale),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// 灯光面板的输入；方向无需归一化。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightPanel {
    pub kind: LightKind,
    pub position: Point3,
    pub direction: Vector3,
    pub intensity: f64,
    pub color: [f64; 3],
    pub cone_angle: f64,
    pub exponent: f64,
}

impl LightPanel {
    /// 以灯光当前状态预填面板。
    pub fn from_light(light: &LightSnapshot) -> Self {
        Self {
            kind: light.kind,
            position: light.position,
            direction: light.direction(),
            intensity: light.intensity,
            color: light.color,
            cone_angle: light.cone_angle,
            exponent: light.exponent,
        }
    }
}

pub struct Editor<B: SceneBackend> {
    backend: B,
    registry: SceneRegistry,
    history: CommandStack,
    controller: InteractionController,
    gizmo: TransformGizmo,
    /// 末尾为主选中对象。
    selection: Vec<SceneObjectRef>,
    settings: EditorSettings,
    edit_mode: Option<EditSubmode>,
    property_edit: Option<Vec<(SceneObjectRef, PropertySnapshot)>>,
}

impl<B: SceneBackend> Editor<B> {
    pub fn new(backend: B, settings: EditorSettings) -> Self {
        let history = CommandStack::with_limit(settings.history_limit);
        let gizmo = TransformGizmo::new(settings.gizmo_enabled, settings.default_transform_mode);
        Self {
            backend,
            registry: SceneRegistry::new(),
            history,
            controller: InteractionController::new(),
            gizmo,
            selection: Vec::new(),
            settings,
            edit_mode: None,
            property_edit: None,
        }
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[inline]
    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    #[inline]
    pub fn history(&self) -> &CommandStack {
        &self.history
    }

    #[inline]
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    #[inline]
    pub fn gizmo(&self) -> &TransformGizmo {
        &self.gizmo
    }

    #[inline]
    pub fn selection(&self) -> &[SceneObjectRef] {
        &self.selection
    }

    #[inline]
    pub fn primary(&self) -> Option<SceneObjectRef> {
        self.selection.last().copied()
    }

    #[inline]
    pub fn edit_mode(&self) -> Option<EditSubmode> {
        self.edit_mode
    }

    pub fn active_tool(&self) -> Option<ToolKind> {
        self.controller.active_kind()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.controller.modifiers()
    }

    pub fn render(&mut self) {
        self.backend.render();
    }

    fn split(&mut self) -> (&mut InteractionController, SceneParts<'_>) {
        (
            &mut self.controller,
            SceneParts {
                backend: &mut self.backend,
                registry: &mut self.registry,
                history: &mut self.history,
                settings: &self.settings,
            },
        )
    }

    // ---- 输入 ----

    /// 活动工具优先；工具不处理的事件用于选择、gizmo 拖动与快捷键。
    pub fn handle_event(&mut self, event: InputEvent) -> EventOutcome {
        let had_tool = self.controller.has_active_tool();
        let index_before = self.history.index();
        let (controller, parts) = self.split();
        let outcome = controller.dispatch(event, parts);
        match outcome {
            EventOutcome::ToolFinished { kind, cancelled } => {
                self.after_tool(kind, cancelled, index_before);
                outcome
            }
            EventOutcome::Consumed => outcome,
            EventOutcome::Ignored if had_tool => outcome,
            EventOutcome::Ignored => self.handle_idle(event),
        }
    }

    fn handle_idle(&mut self, event: InputEvent) -> EventOutcome {
        let modifiers = self.controller.modifiers();
        match event {
            InputEvent::PointerDown { position, button: PointerButton::Left } => {
                self.press(position, modifiers);
                EventOutcome::Consumed
            }
            InputEvent::PointerMove { position } if self.gizmo.is_dragging() => {
                if self.backend.is_primary_button_down() {
                    self.gizmo.drag_to(position, modifiers, &mut self.backend);
                } else {
                    debug!("主键已释放但未收到抬起事件，结束 gizmo 拖动");
                    self.gizmo.end_drag(&mut self.history, &mut self.backend);
                }
                EventOutcome::Consumed
            }
            InputEvent::PointerUp { button: PointerButton::Left, .. }
                if self.gizmo.is_dragging() =>
            {
                self.gizmo.end_drag(&mut self.history, &mut self.backend);
                EventOutcome::Consumed
            }
            InputEvent::KeyDown(Key::Shift) | InputEvent::KeyUp(Key::Shift) => {
                self.gizmo.update_hints(modifiers, &mut self.backend);
                self.backend.render();
                EventOutcome::Consumed
            }
            InputEvent::KeyDown(Key::Delete) => {
                if let Err(err) = self.delete_selected() {
                    debug!(%err, "删除快捷键无效");
                }
                EventOutcome::Consumed
            }
            InputEvent::KeyDown(Key::Char('z' | 'Z')) if modifiers.ctrl => {
                self.undo();
                EventOutcome::Consumed
            }
            InputEvent::KeyDown(Key::Char('y' | 'Y')) if modifiers.ctrl => {
                self.redo();
                EventOutcome::Consumed
            }
            _ => EventOutcome::Ignored,
        }
    }

    /// 点中当前 gizmo 目标时开始拖动，否则按点击结果更新选择。
    fn press(&mut self, position: Point2, modifiers: Modifiers) {
        let picked = self.backend.pick_object(position);
        if picked.is_some()
            && picked == self.gizmo.target()
            && self.gizmo.begin_drag(Some(position), &mut self.backend)
        {
            return;
        }
        match picked {
            Some(target) if modifiers.shift => self.add_to_selection(target),
            other => self.select(other),
        }
    }

    // ---- 选择 ----

    pub fn select(&mut self, target: Option<SceneObjectRef>) {
        let backend = &self.backend;
        self.selection = target.into_iter().filter(|t| backend.resolve(*t)).collect();
        debug!(selection = ?self.selection, "选择已更新");
        self.sync_gizmo();
        self.backend.render();
    }

    pub fn select_by_name(&mut self, name: &str) -> Result<SceneObjectRef, EngineError> {
        let target = self
            .registry
            .lookup(name)
            .ok_or_else(|| EngineError::UnknownName(name.to_string()))?;
        self.select(Some(target));
        Ok(target)
    }

    /// 追加选择；已选中的对象变为主选中。
    pub fn add_to_selection(&mut self, target: SceneObjectRef) {
        if !self.backend.resolve(target) {
            return;
        }
        self.selection.retain(|t| *t != target);
        self.selection.push(target);
        self.sync_gizmo();
        self.backend.render();
    }

    fn sync_gizmo(&mut self) {
        let primary = self.primary();
        self.gizmo.attach(primary, &mut self.backend);
        if self.controller.has_active_tool() {
            self.gizmo.suspend(&mut self.backend);
        } else if self.gizmo.is_suspended() {
            self.gizmo.resume(&mut self.backend);
        }
    }

    fn drop_stale_selection(&mut self) {
        let backend = &self.backend;
        let before = self.selection.len();
        self.selection.retain(|t| backend.resolve(*t));
        if self.selection.len() != before {
            debug!(removed = before - self.selection.len(), "移除已失效的选中对象");
        }
    }

    // ---- 工具与模式 ----

    pub fn start_add_cube(&mut self) -> Result<(), EngineError> {
        self.settle_active_tool();
        self.start_tool(Box::new(AddCubeTool::new()))
    }

    fn start_tool(&mut self, tool: Box<dyn Tool>) -> Result<(), EngineError> {
        self.gizmo.end_drag(&mut self.history, &mut self.backend);
        self.gizmo.suspend(&mut self.backend);
        let (controller, parts) = self.split();
        let result = controller.start_tool(tool, parts);
        if let Err(err) = &result {
            warn!(%err, "工具启动失败");
            self.sync_gizmo();
        }
        result.map_err(EngineError::from)
    }

    /// 对主选中网格进入编辑模式；已有编辑会话时先提交。
    pub fn enter_edit_mode(&mut self, submode: EditSubmode) -> Result<(), EngineError> {
        let target = self.primary().ok_or(EngineError::NothingSelected)?;
        if target.is_light() {
            return Err(EngineError::NotAMesh(target));
        }
        self.settle_active_tool();
        let tool: Box<dyn Tool> = match submode {
            EditSubmode::Vertex => Box::new(VertexEditTool::new(target)),
            EditSubmode::Face => Box::new(FaceEditTool::new(target)),
        };
        self.start_tool(tool)?;
        self.edit_mode = Some(submode);
        info!(%target, submode = submode.as_str(), "进入编辑模式");
        Ok(())
    }

    pub fn switch_edit_submode(&mut self, submode: EditSubmode) -> Result<(), EngineError> {
        if self.edit_mode == Some(submode) {
            return Ok(());
        }
        self.enter_edit_mode(submode)
    }

    /// 退出编辑模式并提交会话。
    pub fn exit_edit_mode(&mut self) -> bool {
        if self.edit_mode.is_none() {
            return false;
        }
        self.stop_tool(false);
        self.edit_mode = None;
        true
    }

    pub fn stop_tool(&mut self, cancel: bool) -> Option<ToolKind> {
        let index_before = self.history.index();
        let (controller, parts) = self.split();
        let stopped = controller.stop_tool(cancel, parts);
        if let Some(kind) = stopped {
            self.after_tool(kind, cancel, index_before);
        }
        stopped
    }

    /// 打开阻塞对话框前调用：结束手势并提交编辑会话。
    pub fn prepare_for_modal(&mut self) -> Option<ToolKind> {
        self.gizmo.end_drag(&mut self.history, &mut self.backend);
        self.end_property_edit();
        let stopped = self.settle_active_tool();
        if let Some(kind) = stopped {
            debug!(tool = kind.as_str(), "模态对话框前已停止工具");
        }
        stopped
    }

    /// 编辑会话提交，未完成的添加操作取消。
    fn settle_active_tool(&mut self) -> Option<ToolKind> {
        match self.controller.active_kind()? {
            ToolKind::VertexEdit | ToolKind::FaceEdit => self.stop_tool(false),
            ToolKind::AddCube => self.stop_tool(true),
        }
    }

    fn after_tool(&mut self, kind: ToolKind, cancelled: bool, index_before: usize) {
        match kind {
            ToolKind::AddCube if !cancelled && self.history.index() > index_before => {
                if let Some(Command::AddObject { target, .. }) = self.history.done().last() {
                    self.selection = vec![*target];
                }
            }
            ToolKind::VertexEdit | ToolKind::FaceEdit => self.edit_mode = None,
            ToolKind::AddCube => {}
        }
        self.sync_gizmo();
        self.backend.render();
    }

    // ---- 历史 ----

    pub fn undo(&mut self) -> bool {
        self.settle_active_tool();
        self.gizmo.end_drag(&mut self.history, &mut self.backend);
        let undone = self.history.undo(&mut self.backend, &mut self.registry);
        if undone {
            self.after_history();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        self.settle_active_tool();
        self.gizmo.end_drag(&mut self.history, &mut self.backend);
        let redone = self.history.redo(&mut self.backend, &mut self.registry);
        if redone {
            self.after_history();
        }
        redone
    }

    fn after_history(&mut self) {
        self.drop_stale_selection();
        self.sync_gizmo();
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_label(&self) -> Option<String> {
        self.history.undo_label()
    }

    pub fn redo_label(&self) -> Option<String> {
        self.history.redo_label()
    }

    // ---- 变换面板 ----

    /// 数值输入的变换；与当前相同时不记录。
    pub fn set_transform(
        &mut self,
        target: SceneObjectRef,
        transform: TransformSnapshot,
    ) -> Result<bool, EngineError> {
        if target.is_light() {
            return Err(EngineError::NotAMesh(target));
        }
        let before = self
            .backend
            .transform(target)
            .ok_or(EngineError::ObjectNotFound(target))?;
        let Some(command) = Command::transform(target, before, transform) else {
            return Ok(false);
        };
        self.backend.set_transform(target, &transform);
        self.history.push(command);
        self.gizmo.rebuild(&mut self.backend);
        self.backend.render();
        Ok(true)
    }

    /// 网格按部件重置；灯光只响应位置（保持照射方向）。
    pub fn reset_transform(
        &mut self,
        target: SceneObjectRef,
        part: ResetPart,
    ) -> Result<bool, EngineError> {
        match target {
            SceneObjectRef::Light(_) => {
                let before = self.backend.light(target).ok_or(EngineError::ObjectNotFound(target))?;
                let after = match part {
                    ResetPart::Position | ResetPart::All => {
                        before.moved_keeping_direction(Point3::ORIGIN)
                    }
                    ResetPart::Rotation | ResetPart::Scale => before,
                };
                Ok(self.commit_light(target, before, after))
            }
            SceneObjectRef::Mesh(_) => {
                let current = self
                    .backend
                    .transform(target)
                    .ok_or(EngineError::ObjectNotFound(target))?;
                let (scale, rotation, translation) = current.scale_rotation_translation();
                let reset = match part {
                    ResetPart::Position => current.with_translation(Point3::ORIGIN),
                    ResetPart::Rotation => {
                        TransformSnapshot::from_scale_rotation_translation(
                            scale,
                            DQuat::IDENTITY,
                            translation,
                        )
                    }
                    ResetPart::Scale => {
                        TransformSnapshot::from_scale_rotation_translation(
                            DVec3::ONE,
                            rotation,
                            translation,
                        )
                    }
                    ResetPart::All => TransformSnapshot::identity(),
                };
                self.set_transform(target, reset)
            }
        }
    }

    // ---- 外观面板 ----

    /// 对选中网格应用离散外观修改；成组拖动期间只做实时预览。
    pub fn edit_properties<F>(&mut self, mut edit: F) -> Result<bool, EngineError>
    where
        F: FnMut(&mut PropertySnapshot),
    {
        let targets = self.selected_meshes();
        if targets.is_empty() {
            return Err(EngineError::NothingSelected);
        }
        let mut entries = Vec::with_capacity(targets.len());
        for target in targets {
            let Some(before) = self.backend.properties(target) else {
                continue;
            };
            let mut after = before;
            edit(&mut after);
            if after != before {
                self.backend.set_properties(target, &after);
            }
            entries.push(PropertyEntry { target, before, after });
        }
        self.backend.render();
        if self.property_edit.is_some() {
            return Ok(false);
        }
        match Command::property_batch(entries) {
            Some(command) => {
                info!(label = %command.label(), "外观已修改");
                self.history.push(command);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// 成组滑块拖动开始：记录选中网格的外观。
    pub fn begin_property_edit(&mut self) -> bool {
        let backend = &self.backend;
        let captured: Vec<_> = self
            .selected_meshes()
            .into_iter()
            .filter_map(|target| backend.properties(target).map(|props| (target, props)))
            .collect();
        if captured.is_empty() {
            return false;
        }
        self.property_edit = Some(captured);
        true
    }

    /// 成组滑块拖动结束：有变化时记录为一步。
    pub fn end_property_edit(&mut self) -> bool {
        let Some(captured) = self.property_edit.take() else {
            return false;
        };
        let entries = captured
            .into_iter()
            .filter_map(|(target, before)| {
                self.backend
                    .properties(target)
                    .map(|after| PropertyEntry { target, before, after })
            })
            .collect();
        match Command::property_batch(entries) {
            Some(command) => {
                self.history.push(command);
                true
            }
            None => false,
        }
    }

    fn selected_meshes(&self) -> Vec<SceneObjectRef> {
        self.selection
            .iter()
            .copied()
            .filter(|target| !target.is_light() && self.backend.resolve(*target))
            .collect()
    }

    // ---- 对象 ----

    pub fn delete_object(&mut self, target: SceneObjectRef) -> Result<(), EngineError> {
        if self.edit_mode.is_some() {
            self.exit_edit_mode();
        }
        let spec = self
            .backend
            .object_spec(target)
            .ok_or(EngineError::ObjectNotFound(target))?;
        let name = self
            .registry
            .remove(target)
            .unwrap_or_else(|| target.to_string());
        self.backend.destroy_object(target);
        info!(%target, name = %name, "已删除对象");
        self.history.push(Command::DeleteObject { target, name, spec });
        self.selection.retain(|t| *t != target);
        self.sync_gizmo();
        self.backend.render();
        Ok(())
    }

    /// 删除全部选中对象，作为一步撤销；任一对象失效时不做任何修改。
    pub fn delete_selected(&mut self) -> Result<usize, EngineError> {
        if self.selection.is_empty() {
            return Err(EngineError::NothingSelected);
        }
        let mut specs = Vec::with_capacity(self.selection.len());
        for &target in &self.selection {
            let spec = self
                .backend
                .object_spec(target)
                .ok_or(EngineError::ObjectNotFound(target))?;
            specs.push((target, spec));
        }
        if self.edit_mode.is_some() {
            self.exit_edit_mode();
        }

        let mut objects = Vec::with_capacity(specs.len());
        for (target, spec) in specs {
            let name = self
                .registry
                .remove(target)
                .unwrap_or_else(|| target.to_string());
            self.backend.destroy_object(target);
            objects.push(DeletedObject { target, name, spec });
        }
        let count = objects.len();
        info!(count, "已删除选中对象");
        if let Some(command) = Command::deletion(objects) {
            self.history.push(command);
        }
        self.selection.clear();
        self.sync_gizmo();
        self.backend.render();
        Ok(count)
    }

    /// 深拷贝对象为 `<名称>_copy`，并在 XY 方向各偏移一个单位。
    pub fn duplicate(&mut self, target: SceneObjectRef) -> Result<SceneObjectRef, EngineError> {
        let spec = self
            .backend
            .object_spec(target)
            .ok_or(EngineError::ObjectNotFound(target))?;
        let name = self
            .registry
            .name_of(target)
            .ok_or(EngineError::ObjectNotFound(target))?;
        let base = format!("{name}_copy");
        let spec = match spec {
            ObjectSpec::Mesh(mut mesh) => {
                let moved = mesh.transform.translation().translate(DUPLICATE_OFFSET);
                mesh.transform = mesh.transform.with_translation(moved);
                ObjectSpec::Mesh(mesh)
            }
            ObjectSpec::Light(light) => {
                let moved = light.position.translate(DUPLICATE_OFFSET);
                ObjectSpec::Light(light.moved_keeping_direction(moved))
            }
        };
        let copy = self.spawn(&base, spec).ok_or(EngineError::ObjectNotFound(target))?;
        self.select(Some(copy));
        Ok(copy)
    }

    pub fn duplicate_selected(&mut self) -> Result<Vec<SceneObjectRef>, EngineError> {
        if self.selection.is_empty() {
            return Err(EngineError::NothingSelected);
        }
        let mut copies = Vec::with_capacity(self.selection.len());
        for target in self.selection.clone() {
            copies.push(self.duplicate(target)?);
        }
        self.selection = copies.clone();
        self.sync_gizmo();
        self.backend.render();
        Ok(copies)
    }

    /// 添加网格（导入或基本体）并选中；名称由 `base_name` 去重得到。
    pub fn add_mesh(&mut self, base_name: &str, spec: ObjectSpec) -> Option<SceneObjectRef> {
        if !matches!(spec, ObjectSpec::Mesh(_)) {
            return None;
        }
        let target = self.spawn(base_name, spec)?;
        self.select(Some(target));
        Some(target)
    }

    /// 以默认参数添加灯光并选中。
    pub fn add_light(&mut self, kind: LightKind) -> Option<SceneObjectRef> {
        let target = self.spawn(kind.base_name(), ObjectSpec::Light(LightSnapshot::new(kind)))?;
        self.select(Some(target));
        Some(target)
    }

    fn spawn(&mut self, base_name: &str, spec: ObjectSpec) -> Option<SceneObjectRef> {
        let command = Command::spawn(&mut self.backend, &mut self.registry, base_name, spec);
        let target = command.targets().first().copied();
        self.history.push(command);
        self.backend.render();
        target
    }

    // ---- 灯光面板 ----

    /// 应用灯光面板；焦点 = 位置 + 单位方向，切换为点光时重置锥角与指数。
    pub fn apply_light_settings(
        &mut self,
        target: SceneObjectRef,
        panel: LightPanel,
    ) -> Result<bool, EngineError> {
        if !target.is_light() {
            return Err(EngineError::NotALight(target));
        }
        let before = self.backend.light(target).ok_or(EngineError::ObjectNotFound(target))?;
        let direction = panel.direction.normalize().unwrap_or(before.direction());
        let (cone_angle, exponent) = match panel.kind {
            LightKind::Point => (180.0, 1.0),
            LightKind::Directional | LightKind::Spot => {
                (panel.cone_angle.clamp(0.0, 180.0), panel.exponent)
            }
        };
        let after = LightSnapshot {
            kind: panel.kind,
            position: panel.position,
            focal_point: panel.position.translate(direction),
            intensity: panel.intensity.max(0.0),
            color: panel.color.map(|channel| channel.clamp(0.0, 1.0)),
            cone_angle,
            exponent,
        };
        Ok(self.commit_light(target, before, after))
    }

    fn commit_light(
        &mut self,
        target: SceneObjectRef,
        before: LightSnapshot,
        after: LightSnapshot,
    ) -> bool {
        let Some(command) = Command::light_edit(target, before, after) else {
            return false;
        };
        self.backend.set_light(target, &after);
        self.history.push(command);
        self.gizmo.rebuild(&mut self.backend);
        self.backend.render();
        true
    }

    // ---- gizmo ----

    pub fn set_gizmo_enabled(&mut self, enabled: bool) {
        self.gizmo.set_enabled(enabled, &mut self.backend);
        self.backend.render();
    }

    pub fn toggle_gizmo(&mut self) -> bool {
        let enabled = !self.gizmo.is_enabled();
        self.set_gizmo_enabled(enabled);
        enabled
    }

    pub fn set_transform_mode(&mut self, mode: TransformMode) {
        self.gizmo.set_mode(mode, &mut self.backend);
        self.backend.render();
    }

    /// 叠加层驱动的拖动开始。
    pub fn begin_gizmo_drag(&mut self) -> bool {
        self.gizmo.begin_drag(None, &mut self.backend)
    }

    /// 叠加层提出的变换，按当前模式约束后应用。
    pub fn gizmo_interact(&mut self, proposed: &TransformSnapshot) -> bool {
        let modifiers = self.controller.modifiers();
        self.gizmo.interact(proposed, modifiers, &mut self.backend)
    }

    pub fn end_gizmo_drag(&mut self) -> bool {
        self.gizmo.end_drag(&mut self.history, &mut self.backend)
    }
}
