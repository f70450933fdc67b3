//! 面编辑：两次点击纪律（先选中，再次点击同一面才开始拖动），沿法向挤出或删除面。

use sced_core::geometry::{Point2, Point3, Vector3};
use sced_core::object::SceneObjectRef;
use sced_core::snapshot::{GeometrySnapshot, TransformSnapshot};
use tracing::{debug, info};

use super::{Tool, ToolContext, ToolFlow, ToolKind};
use crate::backend::{Overlay, OverlaySlot};
use crate::command::{Command, GeometryEditKind};
use crate::errors::ToolError;
use crate::interaction::{EventMask, Key, PointerButton, ToolInput};

#[derive(Debug, Clone)]
struct FaceDrag {
    start_y: f64,
    normal: Vector3,
    start_points: Vec<(usize, Point3)>,
}

#[derive(Debug)]
struct Session {
    baseline: GeometrySnapshot,
    live: GeometrySnapshot,
    matrix: TransformSnapshot,
}

#[derive(Debug)]
pub struct FaceEditTool {
    target: SceneObjectRef,
    session: Option<Session>,
    selected: Option<usize>,
    drag: Option<FaceDrag>,
}

impl FaceEditTool {
    pub fn new(target: SceneObjectRef) -> Self {
        Self {
            target,
            session: None,
            selected: None,
            drag: None,
        }
    }

    #[inline]
    pub fn target(&self) -> SceneObjectRef {
        self.target
    }

    #[inline]
    pub fn selected_face(&self) -> Option<usize> {
        self.selected
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn highlight(&mut self, face: Option<usize>, ctx: &mut ToolContext<'_>) {
        self.selected = face;
        let overlay = face.map(|face| Overlay::FaceHighlight {
            target: self.target,
            face,
        });
        ctx.backend.set_overlay(OverlaySlot::FaceHighlight, overlay);
        ctx.backend.render();
    }

    fn press(&mut self, screen: Point2, ctx: &mut ToolContext<'_>) {
        self.drag = None;
        let picked = ctx.backend.pick_face(self.target, screen);
        match picked {
            None => {
                debug!(x = screen.x(), y = screen.y(), "未拾取到面，清除选中");
                self.highlight(None, ctx);
            }
            Some(face) if self.selected != Some(face) => {
                debug!(face, "选中面");
                self.highlight(Some(face), ctx);
            }
            Some(face) => self.begin_drag(face, screen),
        }
    }

    fn begin_drag(&mut self, face: usize, screen: Point2) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(indices) = session.live.face(face) else {
            return;
        };
        let normal = session.live.face_normal(face).unwrap_or(Vector3::UNIT_Z);
        let start_points = indices
            .iter()
            .filter_map(|&i| session.live.point(i).map(|p| (i, p)))
            .collect();
        debug!(face, "开始沿法向拖动面");
        self.drag = Some(FaceDrag {
            start_y: screen.y(),
            normal,
            start_points,
        });
    }

    fn drag_to(&mut self, screen: Point2, ctx: &mut ToolContext<'_>) {
        let (Some(drag), Some(session), Some(face)) =
            (self.drag.as_ref(), self.session.as_mut(), self.selected)
        else {
            return;
        };
        let Some(centroid) = session.live.face_centroid(face) else {
            return;
        };
        let world_centroid = session.matrix.transform_point(centroid);
        let distance = (drag.start_y - screen.y()) * ctx.units_per_pixel(world_centroid);
        let offset = drag.normal.scale(distance);
        let updates: Vec<(usize, Point3)> = drag
            .start_points
            .iter()
            .map(|&(i, start)| (i, start.translate(offset)))
            .collect();
        for &(i, position) in &updates {
            session.live.set_point(i, position);
        }
        ctx.backend.set_vertex_positions(self.target, &updates);
        ctx.backend.render();
    }

    /// 删除选中面：先把会话内未提交的拖动作为一步，再单独记录删除。
    fn delete_selected(&mut self, ctx: &mut ToolContext<'_>) {
        let (Some(face), Some(session)) = (self.selected, self.session.as_mut()) else {
            return;
        };
        if let Some(pending) = Command::geometry_edit(
            self.target,
            GeometryEditKind::Faces,
            session.baseline.clone(),
            session.live.clone(),
        ) {
            ctx.history.push(pending);
        }
        let before = session.live.clone();
        if !session.live.delete_face(face) {
            return;
        }
        ctx.backend.set_geometry(self.target, &session.live);
        if let Some(command) = Command::geometry_edit(
            self.target,
            GeometryEditKind::DeleteFace,
            before,
            session.live.clone(),
        ) {
            ctx.history.push(command);
        }
        session.baseline = session.live.clone();
        info!(target = %self.target, face, "已删除面");
        self.drag = None;
        self.highlight(None, ctx);
    }
}

impl Tool for FaceEditTool {
    fn kind(&self) -> ToolKind {
        ToolKind::FaceEdit
    }

    fn subscriptions(&self) -> EventMask {
        EventMask::POINTER.union(EventMask::KEYS)
    }

    fn start(&mut self, ctx: &mut ToolContext<'_>) -> Result<(), ToolError> {
        let target = self.target;
        if target.is_light() {
            return Err(ToolError::NoEditableMesh(target));
        }
        let geometry = ctx
            .backend
            .geometry(target)
            .ok_or(ToolError::NoEditableMesh(target))?;
        if geometry.polygon_count() == 0 {
            return Err(ToolError::NoPolygons(target));
        }
        let matrix = ctx
            .backend
            .transform(target)
            .ok_or(ToolError::NoEditableMesh(target))?;
        info!(%target, faces = geometry.face_count(), "面编辑会话开始");
        self.session = Some(Session {
            baseline: geometry.clone(),
            live: geometry,
            matrix,
        });
        self.selected = None;
        self.drag = None;
        ctx.status(
            "Face Edit: click a face to select; click it again and drag to move along normal; \
             Delete removes it.",
        );
        Ok(())
    }

    fn handle(&mut self, input: &ToolInput, ctx: &mut ToolContext<'_>) -> ToolFlow {
        match *input {
            ToolInput::PointerDown { position, button: PointerButton::Left } => {
                self.press(position, ctx)
            }
            ToolInput::PointerUp { button: PointerButton::Left, .. } => self.drag = None,
            ToolInput::PointerMove { position } if self.drag.is_some() => {
                if ctx.backend.is_primary_button_down() {
                    self.drag_to(position, ctx);
                } else {
                    debug!("主键已释放但未收到抬起事件，结束拖动");
                    self.drag = None;
                }
            }
            ToolInput::Delete | ToolInput::Key(Key::Char('x' | 'X')) => self.delete_selected(ctx),
            _ => {}
        }
        ToolFlow::Continue
    }

    fn stop(&mut self, cancel: bool, ctx: &mut ToolContext<'_>) {
        self.drag = None;
        self.selected = None;
        ctx.backend.set_overlay(OverlaySlot::FaceHighlight, None);
        let Some(session) = self.session.take() else {
            return;
        };
        if session.live == session.baseline || !ctx.backend.resolve(self.target) {
            return;
        }
        if cancel {
            ctx.backend.set_geometry(self.target, &session.baseline);
            info!(target = %self.target, "面编辑已取消，几何已还原");
        } else if let Some(command) = Command::geometry_edit(
            self.target,
            GeometryEditKind::Faces,
            session.baseline,
            session.live,
        ) {
            ctx.history.push(command);
        }
    }
}
