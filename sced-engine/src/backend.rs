//! 渲染层对编辑核心暴露的能力接口。
//!
//! 核心只通过 [`SceneBackend`] 读写场景对象；网格构建、文件格式与渲染管线都在实现方。

use sced_core::camera::CameraState;
use sced_core::geometry::{Bounds3D, Plane, Point2, Point3, Ray};
use sced_core::object::SceneObjectRef;
use sced_core::snapshot::{
    GeometrySnapshot, LightSnapshot, ObjectSpec, PropertySnapshot, TransformSnapshot,
};

use crate::tools::gizmo::TransformMode;

/// 叠加层槽位；同一槽位同时只显示一个叠加物。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverlaySlot {
    Ghost,
    VertexMarker,
    FaceHighlight,
    ScaleHints,
    Gizmo,
}

/// 临时显示物，不进入场景注册表，也不进入历史。
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    /// 交互式添加时的半透明预览盒。
    GhostBox { center: Point3, lengths: [f64; 3] },
    /// 顶点编辑的高亮球，半径为世界单位。
    VertexMarker { position: Point3, radius: f64 },
    FaceHighlight { target: SceneObjectRef, face: usize },
    /// 等比缩放提示：包围盒 X 向两端的标记。
    ScaleHints { left: Point3, right: Point3, scale: f64 },
    Gizmo {
        target: SceneObjectRef,
        mode: TransformMode,
        transform: TransformSnapshot,
    },
}

pub trait SceneBackend {
    /// 判定引用当前是否对应一个存活对象。
    fn resolve(&self, target: SceneObjectRef) -> bool;

    /// 以给定引用创建对象；引用已存在时返回 `false`。
    fn create_object(&mut self, target: SceneObjectRef, spec: &ObjectSpec) -> bool;

    fn destroy_object(&mut self, target: SceneObjectRef) -> bool;

    /// 当前对象的完整描述，用于删除后恢复与复制。
    fn object_spec(&self, target: SceneObjectRef) -> Option<ObjectSpec>;

    fn transform(&self, target: SceneObjectRef) -> Option<TransformSnapshot>;

    fn set_transform(&mut self, target: SceneObjectRef, transform: &TransformSnapshot) -> bool;

    fn properties(&self, target: SceneObjectRef) -> Option<PropertySnapshot>;

    fn set_properties(&mut self, target: SceneObjectRef, properties: &PropertySnapshot) -> bool;

    fn geometry(&self, target: SceneObjectRef) -> Option<GeometrySnapshot>;

    fn set_geometry(&mut self, target: SceneObjectRef, geometry: &GeometrySnapshot) -> bool;

    /// 只更新部分顶点，拖动过程中逐帧调用。
    fn set_vertex_positions(
        &mut self,
        target: SceneObjectRef,
        updates: &[(usize, Point3)],
    ) -> bool {
        let Some(mut geometry) = self.geometry(target) else {
            return false;
        };
        for &(index, position) in updates {
            if !geometry.set_point(index, position) {
                return false;
            }
        }
        self.set_geometry(target, &geometry)
    }

    fn light(&self, target: SceneObjectRef) -> Option<LightSnapshot>;

    fn set_light(&mut self, target: SceneObjectRef, light: &LightSnapshot) -> bool;

    /// 屏幕点下对象表面上的世界坐标；未命中 `target` 时返回 `None`。
    fn pick_point(&self, target: SceneObjectRef, screen: Point2) -> Option<Point3>;

    /// 屏幕点下 `target` 的面下标。
    fn pick_face(&self, target: SceneObjectRef, screen: Point2) -> Option<usize>;

    /// 屏幕点下最近的可选对象。
    fn pick_object(&self, screen: Point2) -> Option<SceneObjectRef>;

    fn camera(&self) -> CameraState;

    fn set_overlay(&mut self, slot: OverlaySlot, overlay: Option<Overlay>);

    /// 轮询指针主键的真实状态，用于发现丢失的释放事件。
    fn is_primary_button_down(&self) -> bool;

    fn show_status(&mut self, _message: &str) {}

    fn render(&mut self);

    fn screen_ray(&self, screen: Point2) -> Option<Ray> {
        self.camera().screen_ray(screen)
    }

    fn project_screen_to_world_plane(&self, screen: Point2, plane: &Plane) -> Option<Point3> {
        self.screen_ray(screen)?.intersect_plane(plane)
    }

    fn world_to_screen(&self, point: Point3) -> Option<Point2> {
        self.camera().world_to_screen(point)
    }

    /// 对象在世界坐标中的位置：网格取变换平移，灯光取灯光位置。
    fn world_position(&self, target: SceneObjectRef) -> Option<Point3> {
        match target {
            SceneObjectRef::Mesh(_) => self.transform(target).map(|t| t.translation()),
            SceneObjectRef::Light(_) => self.light(target).map(|light| light.position),
        }
    }

    /// 世界坐标包围盒；灯光退化为其位置一点。
    fn world_bounds(&self, target: SceneObjectRef) -> Option<Bounds3D> {
        match target {
            SceneObjectRef::Mesh(_) => {
                let transform = self.transform(target)?;
                let geometry = self.geometry(target)?;
                let world: Vec<Point3> = geometry
                    .points
                    .iter()
                    .map(|point| transform.transform_point(*point))
                    .collect();
                Bounds3D::from_points(world.iter())
            }
            SceneObjectRef::Light(_) => {
                let position = self.light(target)?.position;
                Some(Bounds3D::new(position, position))
            }
        }
    }
}
