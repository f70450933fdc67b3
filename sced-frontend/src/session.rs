//! 无窗口的编辑会话：内存后端 + 编辑器 + 动作表，按脚本步骤驱动。

use glam::DQuat;
use sced_config::{EditorConfig, GizmoMode};
use sced_core::camera::CameraState;
use sced_core::snapshot::TransformSnapshot;
use sced_engine::action::{ActionBus, ActionContext, ActionRequest};
use sced_engine::backend::SceneBackend;
use sced_engine::editor::{Editor, EditorSettings};
use sced_engine::interaction::{InputEvent, Key, PointerButton};
use sced_engine::memory::MemoryBackend;
use sced_engine::tools::gizmo::TransformMode;
use serde::Serialize;
use tracing::{debug, warn};

use crate::script::ScriptStep;

/// 脚本视口：100×100 像素俯视，屏幕 (50 + 10x, 50 - 10y) 对应地面 (x, y)。
pub fn script_camera() -> CameraState {
    CameraState::top_down(10.0, 5.0, (100.0, 100.0))
}

/// 把配置文件中的编辑参数映射为引擎设置。
pub fn editor_settings(config: &EditorConfig) -> EditorSettings {
    EditorSettings {
        snap_increment: config.snap_increment,
        history_limit: config.history_limit,
        vertex_marker_pixels: config.vertex_marker_pixels,
        marker_min_radius: config.marker_min_radius,
        marker_max_radius: config.marker_max_radius,
        height_drag_gain: config.height_drag_gain,
        gizmo_enabled: config.gizmo_enabled,
        default_transform_mode: match config.default_transform_mode {
            GizmoMode::Translate => TransformMode::Translate,
            GizmoMode::Rotate => TransformMode::Rotate,
            GizmoMode::Scale => TransformMode::Scale,
            GizmoMode::Combined => TransformMode::Combined,
        },
    }
}

pub struct Session {
    editor: Editor<MemoryBackend>,
    actions: ActionBus<MemoryBackend>,
    messages: Vec<String>,
}

impl Session {
    pub fn new(config: &EditorConfig) -> Self {
        let backend = MemoryBackend::with_camera(script_camera());
        Self {
            editor: Editor::new(backend, editor_settings(config)),
            actions: ActionBus::new(),
            messages: Vec::new(),
        }
    }

    #[inline]
    pub fn editor(&self) -> &Editor<MemoryBackend> {
        &self.editor
    }

    #[inline]
    pub fn editor_mut(&mut self) -> &mut Editor<MemoryBackend> {
        &mut self.editor
    }

    /// 动作与失败步骤产生的消息，按执行顺序排列。
    #[inline]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn available_actions(&self) -> Vec<&'static str> {
        self.actions.available_actions()
    }

    pub fn run(&mut self, steps: &[ScriptStep]) {
        for step in steps {
            self.apply(step);
        }
    }

    /// 执行单个步骤；失败只记录消息，不中断回放。
    pub fn apply(&mut self, step: &ScriptStep) {
        debug!(?step, "回放脚本步骤");
        match step {
            ScriptStep::Down { position, button } => {
                if *button == PointerButton::Left {
                    self.editor.backend_mut().set_primary_button(true);
                }
                self.editor.handle_event(InputEvent::PointerDown {
                    position: *position,
                    button: *button,
                });
            }
            ScriptStep::Up { position, button } => {
                if *button == PointerButton::Left {
                    self.editor.backend_mut().set_primary_button(false);
                }
                self.editor.handle_event(InputEvent::PointerUp {
                    position: *position,
                    button: *button,
                });
            }
            ScriptStep::Move { position } => {
                self.editor
                    .handle_event(InputEvent::PointerMove { position: *position });
            }
            ScriptStep::KeyDown(key) => {
                self.editor.handle_event(InputEvent::KeyDown(*key));
            }
            ScriptStep::KeyUp(key) => {
                self.editor.handle_event(InputEvent::KeyUp(*key));
            }
            ScriptStep::Type(text) => {
                for c in text.chars() {
                    self.editor.handle_event(InputEvent::KeyDown(Key::Char(c)));
                }
            }
            ScriptStep::Frame => {
                self.editor.handle_event(InputEvent::Frame);
                self.editor.render();
            }
            ScriptStep::Action { name, args } => {
                let request = ActionRequest::with_args(name.clone(), args.clone());
                let mut context = ActionContext {
                    editor: &mut self.editor,
                };
                let response = self.actions.dispatch(&request, &mut context);
                let message = response.message.unwrap_or_else(|| "未知错误".to_string());
                if response.success {
                    self.messages.push(format!("[动作] {message}"));
                } else {
                    self.fail(format!("动作 {name} 失败: {message}"));
                }
            }
            ScriptStep::Select(None) => self.editor.select(None),
            ScriptStep::Select(Some(name)) => {
                if let Err(err) = self.editor.select_by_name(name) {
                    self.fail(format!("选择失败: {err}"));
                }
            }
            ScriptStep::PrimaryButton(down) => {
                self.editor.backend_mut().set_primary_button(*down);
            }
            ScriptStep::Color(color) => {
                let color = *color;
                if let Err(err) = self
                    .editor
                    .edit_properties(|properties| *properties = properties.with_color(color))
                {
                    self.fail(format!("修改颜色失败: {err}"));
                }
            }
            ScriptStep::GizmoBegin => {
                if !self.editor.begin_gizmo_drag() {
                    self.fail("gizmo 未附着到任何对象".to_string());
                }
            }
            ScriptStep::GizmoPropose(proposed) => {
                self.editor.gizmo_interact(proposed);
            }
            ScriptStep::GizmoTurn(degrees) => match self.turned_transform(*degrees) {
                Some(proposed) => {
                    self.editor.gizmo_interact(&proposed);
                }
                None => self.fail("gizmo 旋转需要选中对象".to_string()),
            },
            ScriptStep::GizmoEnd => {
                self.editor.end_gizmo_drag();
            }
        }
    }

    /// 主选中对象当前变换绕世界 Z 轴旋转后的结果。
    fn turned_transform(&self, degrees: f64) -> Option<TransformSnapshot> {
        let target = self.editor.primary()?;
        let backend = self.editor.backend();
        let current = backend.transform(target).or_else(|| {
            backend
                .light(target)
                .map(|light| TransformSnapshot::from_translation(light.position))
        })?;
        let (scale, rotation, translation) = current.scale_rotation_translation();
        let turned = DQuat::from_rotation_z(degrees.to_radians()) * rotation;
        Some(TransformSnapshot::from_scale_rotation_translation(scale, turned, translation))
    }

    fn fail(&mut self, message: String) {
        warn!(%message, "脚本步骤失败");
        self.messages.push(format!("[失败] {message}"));
    }

    pub fn summary(&self) -> SceneSummary {
        let registry = self.editor.registry();
        let backend = self.editor.backend();
        let mut named: Vec<_> = registry.iter().collect();
        named.sort_by_key(|(target, _)| *target);

        let objects = named
            .into_iter()
            .filter(|(target, _)| backend.resolve(*target))
            .map(|(target, name)| {
                let center = backend
                    .world_bounds(target)
                    .map(|bounds| bounds.center())
                    .map(|c| [c.x(), c.y(), c.z()])
                    .unwrap_or_default();
                let geometry = backend.geometry(target);
                ObjectSummary {
                    name: name.to_string(),
                    kind: if target.is_light() { "light" } else { "mesh" },
                    center,
                    vertices: geometry.as_ref().map(|g| g.vertex_count()),
                    faces: geometry.as_ref().map(|g| g.face_count()),
                }
            })
            .collect();

        let selection = self
            .editor
            .selection()
            .iter()
            .filter_map(|target| registry.name_of(*target).map(str::to_string))
            .collect();

        let history = self.editor.history();
        SceneSummary {
            objects,
            selection,
            active_tool: self.editor.active_tool().map(|kind| kind.as_str()),
            edit_mode: self.editor.edit_mode().map(|mode| mode.as_str()),
            transform_mode: self.editor.gizmo().mode().as_str(),
            gizmo_enabled: self.editor.gizmo().is_enabled(),
            history: HistorySummary {
                index: history.index(),
                len: history.len(),
                undo: self.editor.undo_label(),
                redo: self.editor.redo_label(),
            },
            status: backend.last_status().map(str::to_string),
            messages: self.messages.clone(),
            renders: backend.render_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectSummary {
    pub name: String,
    pub kind: &'static str,
    /// 世界包围盒中心。
    pub center: [f64; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertices: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faces: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistorySummary {
    pub index: usize,
    pub len: usize,
    pub undo: Option<String>,
    pub redo: Option<String>,
}

/// 回放结束后的场景概览，文本与 JSON 输出共用。
#[derive(Debug, Clone, Serialize)]
pub struct SceneSummary {
    pub objects: Vec<ObjectSummary>,
    pub selection: Vec<String>,
    pub active_tool: Option<&'static str>,
    pub edit_mode: Option<&'static str>,
    pub transform_mode: &'static str,
    pub gizmo_enabled: bool,
    pub history: HistorySummary,
    pub status: Option<String>,
    pub messages: Vec<String>,
    pub renders: usize,
}
