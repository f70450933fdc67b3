//! 交互式添加立方体：先定底面锚点，再拉出底面矩形，最后拉出高度。

use sced_core::geometry::{Plane, Point2, Point3, Vector3};
use sced_core::snapshot::{
    GeometryDescriptor, MeshSpec, ObjectSpec, PropertySnapshot, TransformSnapshot,
};
use tracing::{debug, info};

use super::{Tool, ToolContext, ToolFlow, ToolKind, snap_to};
use crate::backend::{Overlay, OverlaySlot};
use crate::command::Command;
use crate::errors::ToolError;
use crate::interaction::{EventMask, Modifiers, NumericField, PointerButton, ToolInput};

/// 底面尺寸低于该值视为退化。
pub const MIN_EXTENT: f64 = 1e-9;
/// 预览盒在底面阶段的厚度。
const GHOST_BASE_THICKNESS: f64 = 1e-3;

const BASE_FIELDS: &[NumericField] = &[NumericField::Width, NumericField::Depth];
const HEIGHT_FIELDS: &[NumericField] = &[NumericField::Height];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddCubeStage {
    AwaitFirstPoint,
    SizingBase,
    SizingHeight,
}

/// 地面上的底面矩形；宽深带符号，表示相对锚点的方向。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseRect {
    pub center: Point3,
    pub width: f64,
    pub depth: f64,
}

/// 由锚点与光标计算底面。
///
/// 默认锚点为一角；`alt` 时锚点为中心；`shift` 取两向最大幅值并保留象限；
/// `ctrl` 按 `snap_increment` 取整。
pub fn compute_base(
    anchor: Point3,
    cursor: Point3,
    modifiers: Modifiers,
    snap_increment: f64,
) -> BaseRect {
    let mut dx = cursor.x() - anchor.x();
    let mut dy = cursor.y() - anchor.y();
    if modifiers.shift {
        let magnitude = dx.abs().max(dy.abs());
        dx = magnitude.copysign(if dx >= 0.0 { 1.0 } else { -1.0 });
        dy = magnitude.copysign(if dy >= 0.0 { 1.0 } else { -1.0 });
    }
    if modifiers.ctrl {
        dx = snap_to(dx, snap_increment);
        dy = snap_to(dy, snap_increment);
    }
    if modifiers.alt {
        BaseRect {
            center: Point3::new(anchor.x(), anchor.y(), 0.0),
            width: 2.0 * dx,
            depth: 2.0 * dy,
        }
    } else {
        BaseRect {
            center: Point3::new(anchor.x() + dx * 0.5, anchor.y() + dy * 0.5, 0.0),
            width: dx,
            depth: dy,
        }
    }
}

#[derive(Debug)]
pub struct AddCubeTool {
    stage: AddCubeStage,
    anchor: Option<Point3>,
    base: BaseRect,
    height: f64,
}

impl Default for AddCubeTool {
    fn default() -> Self {
        Self::new()
    }
}

impl AddCubeTool {
    pub fn new() -> Self {
        Self {
            stage: AddCubeStage::AwaitFirstPoint,
            anchor: None,
            base: BaseRect {
                center: Point3::ORIGIN,
                width: 0.0,
                depth: 0.0,
            },
            height: 0.0,
        }
    }

    #[inline]
    pub fn stage(&self) -> AddCubeStage {
        self.stage
    }

    #[inline]
    pub fn base(&self) -> BaseRect {
        self.base
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    fn ground_point(ctx: &ToolContext<'_>, screen: Point2) -> Option<Point3> {
        ctx.backend.project_screen_to_world_plane(screen, &Plane::ground())
    }

    fn show_ghost(&self, ctx: &mut ToolContext<'_>) {
        let (center_z, thickness) = match self.stage {
            AddCubeStage::SizingHeight => (self.height * 0.5, self.height.abs().max(1e-6)),
            _ => (0.0, GHOST_BASE_THICKNESS),
        };
        let center = Point3::new(self.base.center.x(), self.base.center.y(), center_z);
        let lengths = [self.base.width.abs(), self.base.depth.abs(), thickness];
        ctx.backend
            .set_overlay(OverlaySlot::Ghost, Some(Overlay::GhostBox { center, lengths }));
        ctx.backend.render();
    }

    fn place_anchor(&mut self, screen: Point2, ctx: &mut ToolContext<'_>) {
        let Some(anchor) = Self::ground_point(ctx, screen) else {
            ctx.status("Add Cube: cursor does not hit the ground plane");
            return;
        };
        self.anchor = Some(anchor);
        self.stage = AddCubeStage::SizingBase;
        self.base = BaseRect {
            center: Point3::new(anchor.x(), anchor.y(), 0.0),
            width: 0.0,
            depth: 0.0,
        };
        debug!(x = anchor.x(), y = anchor.y(), "已放置锚点");
        self.show_ghost(ctx);
        ctx.status(
            "Add Cube: move to size base, click/Enter to confirm. \
             Shift=square, Ctrl=snap, Alt=center",
        );
    }

    fn confirm_base(&mut self, ctx: &mut ToolContext<'_>) {
        if self.base.width.abs() < MIN_EXTENT && self.base.depth.abs() < MIN_EXTENT {
            debug!("底面尺寸为零，忽略确认");
            ctx.status("Add Cube: base is empty");
            return;
        }
        self.stage = AddCubeStage::SizingHeight;
        self.height = 0.0;
        ctx.numeric.reset();
        self.show_ghost(ctx);
        ctx.status("Add Cube: set height (drag up/down). Click/Enter to confirm. Esc to go back.");
    }

    fn back_to_base(&mut self, ctx: &mut ToolContext<'_>) {
        self.stage = AddCubeStage::SizingBase;
        self.height = 0.0;
        ctx.numeric.reset();
        self.show_ghost(ctx);
        ctx.status("Add Cube: back to base. Esc again to cancel.");
    }

    fn commit(&mut self, ctx: &mut ToolContext<'_>) -> ToolFlow {
        let width = self.base.width.abs();
        let depth = self.base.depth.abs();
        if width < MIN_EXTENT || depth < MIN_EXTENT {
            info!(width, depth, "立方体底面退化，拒绝提交");
            ctx.status("Add Cube: width and depth must be non-zero");
            return ToolFlow::Continue;
        }
        let spec = ObjectSpec::Mesh(MeshSpec {
            geometry: GeometryDescriptor::Cuboid {
                lengths: Vector3::new(width, depth, self.height.abs().max(MIN_EXTENT)),
                center: Point3::new(0.0, 0.0, self.height * 0.5),
            },
            transform: TransformSnapshot::from_translation(self.base.center),
            properties: PropertySnapshot::default(),
        });
        let command = Command::spawn(ctx.backend, ctx.registry, "cube", spec);
        ctx.history.push(command);
        ToolFlow::Finished { cancelled: false }
    }

    fn track_base(&mut self, screen: Point2, ctx: &mut ToolContext<'_>) {
        let Some(anchor) = self.anchor else {
            return;
        };
        let Some(cursor) = Self::ground_point(ctx, screen) else {
            return;
        };
        self.base = compute_base(anchor, cursor, ctx.modifiers, ctx.settings.snap_increment);
        self.show_ghost(ctx);
    }

    fn track_height(&mut self, screen: Point2, ctx: &mut ToolContext<'_>) {
        let Some(base_screen) = ctx.backend.world_to_screen(self.base.center) else {
            return;
        };
        let units =
            (ctx.units_per_pixel(self.base.center) * ctx.settings.height_drag_gain).max(1e-5);
        let mut height = (base_screen.y() - screen.y()) * units;
        if ctx.modifiers.ctrl {
            height = ctx.snap(height);
        }
        self.height = height;
        self.show_ghost(ctx);
    }

    fn apply_numeric(&mut self, ctx: &mut ToolContext<'_>) {
        let mut value = ctx.numeric.value();
        if ctx.modifiers.ctrl {
            value = ctx.snap(value);
        }
        let keep_sign = |current: f64| if current >= 0.0 { value } else { -value };
        let free = ctx.modifiers.alt || self.anchor.is_none();
        match (self.stage, ctx.numeric.field()) {
            (AddCubeStage::SizingBase, Some(NumericField::Width)) => {
                self.base.width = if free { value } else { keep_sign(self.base.width) };
            }
            (AddCubeStage::SizingBase, Some(NumericField::Depth)) => {
                self.base.depth = if free { value } else { keep_sign(self.base.depth) };
            }
            (AddCubeStage::SizingHeight, Some(NumericField::Height)) => {
                self.height = value;
            }
            _ => return,
        }
        // 角点模式下锚点仍是一角
        if let (AddCubeStage::SizingBase, Some(anchor), false) =
            (self.stage, self.anchor, ctx.modifiers.alt)
        {
            self.base.center = Point3::new(
                anchor.x() + self.base.width * 0.5,
                anchor.y() + self.base.depth * 0.5,
                0.0,
            );
        }
        self.show_ghost(ctx);
    }
}

impl Tool for AddCubeTool {
    fn kind(&self) -> ToolKind {
        ToolKind::AddCube
    }

    fn subscriptions(&self) -> EventMask {
        EventMask::POINTER_DOWN
            .union(EventMask::POINTER_MOVE)
            .union(EventMask::KEYS)
    }

    fn numeric_fields(&self) -> &'static [NumericField] {
        match self.stage {
            AddCubeStage::AwaitFirstPoint => &[],
            AddCubeStage::SizingBase => BASE_FIELDS,
            AddCubeStage::SizingHeight => HEIGHT_FIELDS,
        }
    }

    fn start(&mut self, ctx: &mut ToolContext<'_>) -> Result<(), ToolError> {
        *self = Self::new();
        ctx.status(
            "Add Cube: click to set first corner (or center with Alt). \
             Shift: square, Ctrl: snap, Esc: cancel",
        );
        ctx.backend.render();
        Ok(())
    }

    fn handle(&mut self, input: &ToolInput, ctx: &mut ToolContext<'_>) -> ToolFlow {
        match *input {
            ToolInput::PointerDown { button: PointerButton::Right, .. } => {
                return ToolFlow::Finished { cancelled: true };
            }
            ToolInput::PointerDown { position, button: PointerButton::Left } => match self.stage {
                AddCubeStage::AwaitFirstPoint => self.place_anchor(position, ctx),
                AddCubeStage::SizingBase => self.confirm_base(ctx),
                AddCubeStage::SizingHeight => return self.commit(ctx),
            },
            ToolInput::PointerMove { position } if !ctx.numeric.is_active() => match self.stage {
                AddCubeStage::SizingBase => self.track_base(position, ctx),
                AddCubeStage::SizingHeight => self.track_height(position, ctx),
                AddCubeStage::AwaitFirstPoint => {}
            },
            ToolInput::Confirm => match self.stage {
                AddCubeStage::SizingBase => self.confirm_base(ctx),
                AddCubeStage::SizingHeight => return self.commit(ctx),
                AddCubeStage::AwaitFirstPoint => {}
            },
            ToolInput::Cancel => {
                if self.stage == AddCubeStage::SizingHeight {
                    self.back_to_base(ctx);
                } else {
                    return ToolFlow::Finished { cancelled: true };
                }
            }
            ToolInput::NumericChanged => self.apply_numeric(ctx),
            _ => {}
        }
        ToolFlow::Continue
    }

    fn stop(&mut self, cancel: bool, ctx: &mut ToolContext<'_>) {
        ctx.backend.set_overlay(OverlaySlot::Ghost, None);
        if cancel {
            ctx.status("Add Cube: cancelled");
        } else {
            ctx.status("Add Cube: done");
        }
        self.stage = AddCubeStage::AwaitFirstPoint;
        self.anchor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(shift: bool, ctrl: bool, alt: bool) -> Modifiers {
        Modifiers { shift, ctrl, alt }
    }

    #[test]
    fn corner_mode_spans_anchor_to_cursor() {
        let base =
            compute_base(Point3::ORIGIN, Point3::new(4.0, 4.0, 0.0), Modifiers::default(), 1.0);
        assert_eq!(base.center, Point3::new(2.0, 2.0, 0.0));
        assert_eq!((base.width, base.depth), (4.0, 4.0));
    }

    #[test]
    fn square_mode_uses_larger_extent_and_keeps_quadrant() {
        let square = held(true, false, false);
        let base = compute_base(Point3::ORIGIN, Point3::new(4.0, 1.0, 0.0), square, 1.0);
        assert_eq!((base.width, base.depth), (4.0, 4.0));

        let base = compute_base(Point3::ORIGIN, Point3::new(-4.0, 1.0, 0.0), square, 1.0);
        assert_eq!((base.width, base.depth), (-4.0, 4.0));
        assert_eq!(base.center, Point3::new(-2.0, 2.0, 0.0));
    }

    #[test]
    fn center_mode_doubles_extent_around_anchor() {
        let centered = held(false, false, true);
        let base = compute_base(Point3::ORIGIN, Point3::new(4.0, 4.0, 0.0), centered, 1.0);
        assert_eq!(base.center, Point3::ORIGIN);
        assert_eq!((base.width, base.depth), (8.0, 8.0));
    }

    #[test]
    fn snapping_rounds_each_extent() {
        let base = compute_base(
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(3.3, -0.6, 0.0),
            held(false, true, false),
            0.5,
        );
        assert_eq!((base.width, base.depth), (2.5, -1.5));
    }
}
