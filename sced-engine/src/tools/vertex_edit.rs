//! 顶点编辑：拾取最近顶点，在面向相机的平面内拖动。

use sced_core::geometry::{Plane, Point2, Point3};
use sced_core::object::SceneObjectRef;
use sced_core::snapshot::{GeometrySnapshot, TransformSnapshot};
use sced_core::spatial::PointIndex;
use tracing::{debug, info};

use super::{Tool, ToolContext, ToolFlow, ToolKind};
use crate::backend::{Overlay, OverlaySlot};
use crate::command::{Command, GeometryEditKind};
use crate::errors::ToolError;
use crate::interaction::{EventMask, PointerButton, ToolInput};

#[derive(Debug, Clone, Copy)]
struct VertexDrag {
    vertex: usize,
    plane: Plane,
    start_world: Point3,
    start_local: Point3,
    current_local: Point3,
}

#[derive(Debug)]
struct Session {
    baseline: GeometrySnapshot,
    live: GeometrySnapshot,
    index: PointIndex,
    matrix: TransformSnapshot,
    inverse: TransformSnapshot,
}

#[derive(Debug)]
pub struct VertexEditTool {
    target: SceneObjectRef,
    session: Option<Session>,
    drag: Option<VertexDrag>,
    marker: Option<Point3>,
}

impl VertexEditTool {
    pub fn new(target: SceneObjectRef) -> Self {
        Self {
            target,
            session: None,
            drag: None,
            marker: None,
        }
    }

    #[inline]
    pub fn target(&self) -> SceneObjectRef {
        self.target
    }

    /// 正在拖动的顶点下标。
    pub fn dragged_vertex(&self) -> Option<usize> {
        self.drag.map(|drag| drag.vertex)
    }

    fn marker_radius(ctx: &ToolContext<'_>, at: Point3) -> f64 {
        let settings = ctx.settings;
        let radius = ctx.units_per_pixel(at) * settings.vertex_marker_pixels;
        let max = settings.marker_max_radius.max(settings.marker_min_radius);
        radius.clamp(settings.marker_min_radius, max)
    }

    fn show_marker(&mut self, position: Option<Point3>, ctx: &mut ToolContext<'_>) {
        self.marker = position;
        let overlay = position.map(|position| Overlay::VertexMarker {
            position,
            radius: Self::marker_radius(ctx, position),
        });
        ctx.backend.set_overlay(OverlaySlot::VertexMarker, overlay);
    }

    fn begin_drag(&mut self, screen: Point2, ctx: &mut ToolContext<'_>) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let picked = ctx
            .backend
            .pick_point(self.target, screen)
            .map(|world| session.inverse.transform_point(world))
            .and_then(|local| session.index.nearest(local));
        let Some(vertex) = picked else {
            debug!(x = screen.x(), y = screen.y(), "未拾取到顶点");
            self.drag = None;
            self.show_marker(None, ctx);
            ctx.backend.render();
            return;
        };
        let Some(start_local) = session.live.point(vertex) else {
            return;
        };
        let start_world = session.matrix.transform_point(start_local);
        let normal = ctx.backend.camera().view_plane_normal();
        self.drag = Some(VertexDrag {
            vertex,
            plane: Plane::new(start_world, normal),
            start_world,
            start_local,
            current_local: start_local,
        });
        debug!(vertex, "开始拖动顶点");
        self.show_marker(Some(start_world), ctx);
        ctx.backend.render();
    }

    fn drag_to(&mut self, screen: Point2, ctx: &mut ToolContext<'_>) {
        let (Some(drag), Some(session)) = (self.drag.as_mut(), self.session.as_mut()) else {
            return;
        };
        let hit = ctx
            .backend
            .project_screen_to_world_plane(screen, &drag.plane)
            .unwrap_or(drag.start_world);
        let delta = session.inverse.transform_vector(drag.start_world.vector_to(hit));
        let position = drag.start_local.translate(delta);
        if !position.is_finite() {
            return;
        }
        drag.current_local = position;
        session.live.set_point(drag.vertex, position);
        ctx.backend.set_vertex_positions(self.target, &[(drag.vertex, position)]);
        let world = session.matrix.transform_point(position);
        self.show_marker(Some(world), ctx);
        ctx.backend.render();
    }

    /// 结束拖动并把新位置同步进点索引。
    fn end_drag(&mut self, ctx: &mut ToolContext<'_>) {
        if let (Some(drag), Some(session)) = (self.drag.take(), self.session.as_mut()) {
            session.index.relocate(drag.vertex, drag.current_local);
        }
        self.show_marker(None, ctx);
        ctx.backend.render();
    }
}

impl Tool for VertexEditTool {
    fn kind(&self) -> ToolKind {
        ToolKind::VertexEdit
    }

    fn subscriptions(&self) -> EventMask {
        EventMask::POINTER.union(EventMask::FRAME)
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
        let matrix = ctx
            .backend
            .transform(target)
            .ok_or(ToolError::NoEditableMesh(target))?;
        let inverse = matrix.inverse().ok_or(ToolError::SingularTransform(target))?;
        let index = PointIndex::build(&geometry.points);
        info!(%target, vertices = geometry.vertex_count(), "顶点编辑会话开始");
        self.session = Some(Session {
            baseline: geometry.clone(),
            live: geometry,
            index,
            matrix,
            inverse,
        });
        self.drag = None;
        ctx.status("Vertex Edit: click a vertex then drag to move it.");
        Ok(())
    }

    fn handle(&mut self, input: &ToolInput, ctx: &mut ToolContext<'_>) -> ToolFlow {
        match *input {
            ToolInput::PointerDown { position, button: PointerButton::Left } => {
                self.begin_drag(position, ctx);
            }
            ToolInput::PointerMove { position } if self.drag.is_some() => {
                if ctx.backend.is_primary_button_down() {
                    self.drag_to(position, ctx);
                } else {
                    debug!("主键已释放但未收到抬起事件，结束拖动");
                    self.end_drag(ctx);
                }
            }
            ToolInput::PointerUp { button: PointerButton::Left, .. } => self.end_drag(ctx),
            ToolInput::Frame => {
                if let Some(position) = self.marker {
                    self.show_marker(Some(position), ctx);
                }
            }
            _ => {}
        }
        ToolFlow::Continue
    }

    fn stop(&mut self, cancel: bool, ctx: &mut ToolContext<'_>) {
        self.drag = None;
        self.show_marker(None, ctx);
        let Some(session) = self.session.take() else {
            return;
        };
        if session.live == session.baseline || !ctx.backend.resolve(self.target) {
            return;
        }
        if cancel {
            ctx.backend.set_geometry(self.target, &session.baseline);
            info!(target = %self.target, "顶点编辑已取消，几何已还原");
        } else if let Some(command) = Command::geometry_edit(
            self.target,
            GeometryEditKind::Vertices,
            session.baseline,
            session.live,
        ) {
            ctx.history.push(command);
        }
    }
}
