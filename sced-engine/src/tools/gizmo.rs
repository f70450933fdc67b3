//! 常驻变换 gizmo：跟随选中对象，按模式约束拖动结果，拖动结束时记录一条命令。

use std::fmt;

use sced_core::geometry::{Plane, Point2, Point3};
use sced_core::object::SceneObjectRef;
use sced_core::snapshot::{LightKind, LightSnapshot, TransformSnapshot};
use tracing::debug;

use crate::backend::{Overlay, OverlaySlot, SceneBackend};
use crate::command::{Command, CommandStack};
use crate::interaction::Modifiers;

/// 等比缩放提示标记相对包围盒最大边长的比例。
const HINT_SCALE_RATIO: f64 = 0.08;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransformMode {
    #[default]
    Translate,
    Rotate,
    Scale,
    Combined,
}

impl TransformMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "translate" | "move" => Some(Self::Translate),
            "rotate" => Some(Self::Rotate),
            "scale" => Some(Self::Scale),
            "combined" | "all" => Some(Self::Combined),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Translate => "translate",
            Self::Rotate => "rotate",
            Self::Scale => "scale",
            Self::Combined => "combined",
        }
    }

    /// 指针拖动是否直接驱动平移。
    #[inline]
    fn translates(self) -> bool {
        matches!(self, Self::Translate | Self::Combined)
    }
}

impl fmt::Display for TransformMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
enum DragStart {
    Mesh(TransformSnapshot),
    Light(LightSnapshot),
}

#[derive(Debug, Clone, Copy)]
struct GizmoDrag {
    target: SceneObjectRef,
    start: DragStart,
    plane: Plane,
    anchor: Option<Point3>,
    start_position: Point3,
}

#[derive(Debug)]
pub struct TransformGizmo {
    enabled: bool,
    mode: TransformMode,
    target: Option<SceneObjectRef>,
    suspended: bool,
    drag: Option<GizmoDrag>,
}

impl TransformGizmo {
    pub fn new(enabled: bool, mode: TransformMode) -> Self {
        Self {
            enabled,
            mode,
            target: None,
            suspended: false,
            drag: None,
        }
    }

    #[inline]
    pub fn mode(&self) -> TransformMode {
        self.mode
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    #[inline]
    pub fn target(&self) -> Option<SceneObjectRef> {
        self.target
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// 叠加层当前是否可见并可交互。
    pub fn is_visible(&self, backend: &dyn SceneBackend) -> bool {
        self.enabled && !self.suspended && self.target.is_some_and(|target| backend.resolve(target))
    }

    pub fn attach(&mut self, target: Option<SceneObjectRef>, backend: &mut dyn SceneBackend) {
        self.drag = None;
        self.target = target;
        self.rebuild(backend);
    }

    /// 切换模式并重建叠加层；挂起期间只记住模式。
    pub fn set_mode(&mut self, mode: TransformMode, backend: &mut dyn SceneBackend) {
        self.mode = mode;
        if !self.suspended {
            self.rebuild(backend);
        }
    }

    pub fn set_enabled(&mut self, enabled: bool, backend: &mut dyn SceneBackend) {
        self.enabled = enabled;
        self.drag = None;
        self.rebuild(backend);
    }

    /// 模态工具运行期间挂起。
    pub fn suspend(&mut self, backend: &mut dyn SceneBackend) {
        self.suspended = true;
        self.drag = None;
        self.rebuild(backend);
    }

    pub fn resume(&mut self, backend: &mut dyn SceneBackend) {
        self.suspended = false;
        self.rebuild(backend);
    }

    /// 按目标当前变换重新放置叠加层（撤销/重做之后调用）。
    pub fn rebuild(&mut self, backend: &mut dyn SceneBackend) {
        backend.set_overlay(OverlaySlot::ScaleHints, None);
        let overlay = match self.target {
            Some(target) if self.is_visible(backend) => {
                current_transform(backend, target).map(|transform| Overlay::Gizmo {
                    target,
                    mode: self.mode,
                    transform,
                })
            }
            _ => None,
        };
        backend.set_overlay(OverlaySlot::Gizmo, overlay);
    }

    /// 抓取 gizmo：记录拖动前状态与面向相机的拖动平面。
    pub fn begin_drag(&mut self, screen: Option<Point2>, backend: &mut dyn SceneBackend) -> bool {
        let Some(target) = self.target.filter(|_| self.is_visible(backend)) else {
            return false;
        };
        let start = match target {
            SceneObjectRef::Mesh(_) => backend.transform(target).map(DragStart::Mesh),
            SceneObjectRef::Light(_) => backend.light(target).map(DragStart::Light),
        };
        let (Some(start), Some(start_position)) = (start, backend.world_position(target)) else {
            return false;
        };
        let plane = Plane::new(start_position, backend.camera().view_plane_normal());
        let anchor =
            screen.and_then(|screen| backend.project_screen_to_world_plane(screen, &plane));
        debug!(%target, mode = %self.mode, "开始 gizmo 拖动");
        self.drag = Some(GizmoDrag {
            target,
            start,
            plane,
            anchor,
            start_position,
        });
        true
    }

    /// 指针拖动平移（平移与组合模式）。
    pub fn drag_to(
        &mut self,
        screen: Point2,
        modifiers: Modifiers,
        backend: &mut dyn SceneBackend,
    ) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        if !self.mode.translates() {
            return false;
        }
        let (Some(anchor), Some(hit)) = (
            drag.anchor,
            backend.project_screen_to_world_plane(screen, &drag.plane),
        ) else {
            return false;
        };
        let position = drag.start_position.translate(anchor.vector_to(hit));
        match drag.start {
            DragStart::Mesh(start) => {
                backend.set_transform(drag.target, &start.with_translation(position));
            }
            DragStart::Light(start) => {
                let Some(current) = backend.light(drag.target) else {
                    return false;
                };
                backend.set_light(drag.target, &translated_light(&start, &current, position));
            }
        }
        self.after_interaction(drag.target, modifiers, backend);
        true
    }

    /// 叠加层提出的新变换；按模式约束后写回对象。
    pub fn interact(
        &mut self,
        proposed: &TransformSnapshot,
        modifiers: Modifiers,
        backend: &mut dyn SceneBackend,
    ) -> bool {
        if self.drag.is_none() && !self.begin_drag(None, backend) {
            return false;
        }
        let Some(drag) = self.drag else {
            return false;
        };
        match drag.start {
            DragStart::Mesh(start) => {
                let constrained = match self.mode {
                    TransformMode::Translate => start.with_translation(proposed.translation()),
                    TransformMode::Rotate => start.with_rotation_from(proposed),
                    TransformMode::Scale if modifiers.shift => {
                        start.with_scale_from(proposed).uniform_scaled()
                    }
                    TransformMode::Scale => start.with_scale_from(proposed),
                    TransformMode::Combined => *proposed,
                };
                if !constrained.is_finite() {
                    return false;
                }
                backend.set_transform(drag.target, &constrained);
            }
            DragStart::Light(start) => {
                let Some(current) = backend.light(drag.target) else {
                    return false;
                };
                let updated = if self.mode == TransformMode::Translate {
                    translated_light(&start, &current, proposed.translation())
                } else {
                    aimed_light(&current, proposed, self.mode)
                };
                backend.set_light(drag.target, &updated);
            }
        }
        self.after_interaction(drag.target, modifiers, backend);
        true
    }

    /// 松开 gizmo：状态有变化时记录一条命令。
    pub fn end_drag(&mut self, history: &mut CommandStack, backend: &mut dyn SceneBackend) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        let command = match drag.start {
            DragStart::Mesh(before) => backend
                .transform(drag.target)
                .and_then(|after| Command::transform(drag.target, before, after)),
            DragStart::Light(before) => backend
                .light(drag.target)
                .and_then(|after| Command::light_edit(drag.target, before, after)),
        };
        self.rebuild(backend);
        backend.render();
        match command {
            Some(command) => {
                history.push(command);
                true
            }
            None => false,
        }
    }

    /// 缩放模式下按住 Shift 时在包围盒 X 向两端显示提示。
    pub fn update_hints(&self, modifiers: Modifiers, backend: &mut dyn SceneBackend) {
        let hints = match self.target {
            Some(target @ SceneObjectRef::Mesh(_))
                if modifiers.shift
                    && self.mode == TransformMode::Scale
                    && self.is_visible(backend) =>
            {
                backend.world_bounds(target).map(|bounds| {
                    let center = bounds.center();
                    let extent = bounds.size().as_vec3().max_element();
                    Overlay::ScaleHints {
                        left: Point3::new(bounds.min().x(), center.y(), center.z()),
                        right: Point3::new(bounds.max().x(), center.y(), center.z()),
                        scale: HINT_SCALE_RATIO * extent,
                    }
                })
            }
            _ => None,
        };
        backend.set_overlay(OverlaySlot::ScaleHints, hints);
    }

    fn after_interaction(
        &self,
        target: SceneObjectRef,
        modifiers: Modifiers,
        backend: &mut dyn SceneBackend,
    ) {
        if let Some(transform) = current_transform(backend, target) {
            backend.set_overlay(
                OverlaySlot::Gizmo,
                Some(Overlay::Gizmo {
                    target,
                    mode: self.mode,
                    transform,
                }),
            );
        }
        self.update_hints(modifiers, backend);
        backend.render();
    }
}

/// 网格取其变换；灯光以位置构造纯平移变换。
fn current_transform(
    backend: &dyn SceneBackend,
    target: SceneObjectRef,
) -> Option<TransformSnapshot> {
    match target {
        SceneObjectRef::Mesh(_) => backend.transform(target),
        SceneObjectRef::Light(_) => backend
            .light(target)
            .map(|light| TransformSnapshot::from_translation(light.position)),
    }
}

/// 平移灯光：方向光保持焦点不动（改变照射方向），点光与聚光保持方向。
fn translated_light(
    start: &LightSnapshot,
    current: &LightSnapshot,
    position: Point3,
) -> LightSnapshot {
    match start.kind {
        LightKind::Directional => LightSnapshot {
            position,
            ..*current
        },
        LightKind::Point | LightKind::Spot => start.moved_keeping_direction(position),
    }
}

/// 旋转/缩放模式只改朝向：位置不变；点光忽略朝向。
fn aimed_light(
    current: &LightSnapshot,
    proposed: &TransformSnapshot,
    mode: TransformMode,
) -> LightSnapshot {
    let position = match mode {
        TransformMode::Rotate | TransformMode::Scale => current.position,
        TransformMode::Translate | TransformMode::Combined => proposed.translation(),
    };
    let moved = LightSnapshot {
        position,
        focal_point: current.focal_point,
        ..*current
    };
    if current.kind == LightKind::Point {
        return moved;
    }
    match proposed.forward() {
        Some(direction) => moved.aimed(direction),
        None => moved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sced_core::geometry::Vector3;

    #[test]
    fn modes_parse_case_insensitively() {
        assert_eq!(TransformMode::parse("Rotate"), Some(TransformMode::Rotate));
        assert_eq!(TransformMode::parse("all"), Some(TransformMode::Combined));
        assert_eq!(TransformMode::parse("skew"), None);
        assert_eq!(TransformMode::Scale.to_string(), "scale");
    }

    #[test]
    fn directional_light_keeps_focal_point_when_translated() {
        let start = LightSnapshot::new(LightKind::Directional);
        let moved = translated_light(&start, &start, Point3::new(0.0, 0.0, 5.0));
        assert_eq!(moved.focal_point, start.focal_point);
        assert_eq!(moved.position, Point3::new(0.0, 0.0, 5.0));

        let spot = LightSnapshot::new(LightKind::Spot);
        let moved = translated_light(&spot, &spot, Point3::new(1.0, 1.0, 1.0));
        assert!((moved.direction().dot(spot.direction()) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rotating_spot_light_aims_along_negative_z() {
        let spot = LightSnapshot::new(LightKind::Spot);
        let aimed = aimed_light(&spot, &TransformSnapshot::identity(), TransformMode::Rotate);
        assert_eq!(aimed.position, spot.position);
        let direction = aimed.direction();
        assert!((direction.dot(Vector3::new(0.0, 0.0, -1.0)) - 1.0).abs() < 1e-12);

        let point = LightSnapshot::new(LightKind::Point);
        let unchanged = aimed_light(&point, &TransformSnapshot::identity(), TransformMode::Rotate);
        assert_eq!(unchanged, point);
    }
}
