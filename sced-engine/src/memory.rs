//! 纯内存场景后端：用于无界面运行、脚本回放与测试。
//!
//! 拾取以相机射线对世界空间三角扇求交（Möller–Trumbore），灯光按固定半径球体命中。

use std::collections::BTreeMap;

use sced_core::camera::CameraState;
use sced_core::geometry::{Point2, Point3, Ray};
use sced_core::object::SceneObjectRef;
use sced_core::snapshot::{
    GeometryDescriptor, GeometrySnapshot, LightSnapshot, MeshSpec, ObjectSpec, PropertySnapshot,
    TransformSnapshot,
};
use tracing::debug;

use crate::backend::{Overlay, OverlaySlot, SceneBackend};

/// 灯光拾取球半径（世界单位）。
pub const LIGHT_PICK_RADIUS: f64 = 0.6;
const HIT_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
enum StoredObject {
    Mesh {
        geometry: GeometrySnapshot,
        transform: TransformSnapshot,
        properties: PropertySnapshot,
    },
    Light(LightSnapshot),
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    distance: f64,
    point: Point3,
    face: usize,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    objects: BTreeMap<SceneObjectRef, StoredObject>,
    camera: CameraState,
    overlays: BTreeMap<OverlaySlot, Overlay>,
    primary_button_down: bool,
    statuses: Vec<String>,
    render_count: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(camera: CameraState) -> Self {
        Self {
            camera,
            ..Self::default()
        }
    }

    #[inline]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn objects(&self) -> impl Iterator<Item = SceneObjectRef> + '_ {
        self.objects.keys().copied()
    }

    pub fn set_camera(&mut self, camera: CameraState) {
        self.camera = camera;
    }

    #[inline]
    pub fn overlay(&self, slot: OverlaySlot) -> Option<&Overlay> {
        self.overlays.get(&slot)
    }

    /// 模拟指针主键的真实状态。
    pub fn set_primary_button(&mut self, down: bool) {
        self.primary_button_down = down;
    }

    pub fn statuses(&self) -> &[String] {
        &self.statuses
    }

    pub fn last_status(&self) -> Option<&str> {
        self.statuses.last().map(String::as_str)
    }

    #[inline]
    pub fn render_count(&self) -> usize {
        self.render_count
    }

    fn mesh_hit(&self, target: SceneObjectRef, screen: Point2) -> Option<Hit> {
        let StoredObject::Mesh { geometry, transform, .. } = self.objects.get(&target)? else {
            return None;
        };
        let ray = self.camera.screen_ray(screen)?;
        let mut best: Option<Hit> = None;
        for (face_index, face) in geometry.faces.iter().enumerate() {
            if face.len() < 3 {
                continue;
            }
            let world: Vec<Point3> = face
                .iter()
                .filter_map(|&vertex| geometry.point(vertex))
                .map(|point| transform.transform_point(point))
                .collect();
            if world.len() != face.len() {
                continue;
            }
            for i in 1..world.len() - 1 {
                let Some(distance) = intersect_triangle(&ray, world[0], world[i], world[i + 1])
                else {
                    continue;
                };
                if best.is_none_or(|hit| distance < hit.distance) {
                    best = Some(Hit {
                        distance,
                        point: ray.at(distance),
                        face: face_index,
                    });
                }
            }
        }
        best
    }

    /// 射线最先命中的对象及距离。
    fn nearest_object(&self, screen: Point2) -> Option<(SceneObjectRef, f64)> {
        self.objects
            .iter()
            .filter_map(|(target, stored)| {
                let distance = match stored {
                    StoredObject::Mesh { .. } => self.mesh_hit(*target, screen)?.distance,
                    StoredObject::Light(light) => self.light_hit(light, screen)?,
                };
                Some((*target, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// `target` 上的命中；最先命中的是其他对象时视为未命中。
    fn unoccluded_hit(&self, target: SceneObjectRef, screen: Point2) -> Option<Hit> {
        let hit = self.mesh_hit(target, screen)?;
        match self.nearest_object(screen) {
            Some((front, distance)) if front != target && distance < hit.distance - HIT_EPSILON => {
                debug!(%target, %front, "拾取被遮挡");
                None
            }
            _ => Some(hit),
        }
    }

    fn light_hit(&self, light: &LightSnapshot, screen: Point2) -> Option<f64> {
        let ray = self.camera.screen_ray(screen)?;
        let to_center = ray.origin.vector_to(light.position);
        let along = to_center.dot(ray.direction);
        if along < 0.0 {
            return None;
        }
        let closest = ray.at(along);
        (closest.distance(light.position) <= LIGHT_PICK_RADIUS).then_some(along)
    }
}

/// 射线与三角形求交，返回沿射线的距离（仅正向）。
fn intersect_triangle(ray: &Ray, a: Point3, b: Point3, c: Point3) -> Option<f64> {
    let edge1 = a.vector_to(b);
    let edge2 = a.vector_to(c);
    let p = ray.direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < HIT_EPSILON {
        return None;
    }
    let inv = 1.0 / det;
    let s = a.vector_to(ray.origin);
    let u = s.dot(p) * inv;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv;
    (t > HIT_EPSILON).then_some(t)
}

impl SceneBackend for MemoryBackend {
    fn resolve(&self, target: SceneObjectRef) -> bool {
        self.objects.contains_key(&target)
    }

    fn create_object(&mut self, target: SceneObjectRef, spec: &ObjectSpec) -> bool {
        if self.objects.contains_key(&target) {
            return false;
        }
        let stored = match spec {
            ObjectSpec::Mesh(mesh) => StoredObject::Mesh {
                geometry: mesh.geometry.build(),
                transform: mesh.transform,
                properties: mesh.properties,
            },
            ObjectSpec::Light(light) => StoredObject::Light(*light),
        };
        self.objects.insert(target, stored);
        debug!(%target, "内存后端已创建对象");
        true
    }

    fn destroy_object(&mut self, target: SceneObjectRef) -> bool {
        self.objects.remove(&target).is_some()
    }

    fn object_spec(&self, target: SceneObjectRef) -> Option<ObjectSpec> {
        match self.objects.get(&target)? {
            StoredObject::Mesh { geometry, transform, properties } => {
                Some(ObjectSpec::Mesh(MeshSpec {
                    geometry: GeometryDescriptor::Mesh(geometry.clone()),
                    transform: *transform,
                    properties: *properties,
                }))
            }
            StoredObject::Light(light) => Some(ObjectSpec::Light(*light)),
        }
    }

    fn transform(&self, target: SceneObjectRef) -> Option<TransformSnapshot> {
        match self.objects.get(&target)? {
            StoredObject::Mesh { transform, .. } => Some(*transform),
            StoredObject::Light(_) => None,
        }
    }

    fn set_transform(&mut self, target: SceneObjectRef, value: &TransformSnapshot) -> bool {
        match self.objects.get_mut(&target) {
            Some(StoredObject::Mesh { transform, .. }) => {
                *transform = *value;
                true
            }
            _ => false,
        }
    }

    fn properties(&self, target: SceneObjectRef) -> Option<PropertySnapshot> {
        match self.objects.get(&target)? {
            StoredObject::Mesh { properties, .. } => Some(*properties),
            StoredObject::Light(_) => None,
        }
    }

    fn set_properties(&mut self, target: SceneObjectRef, value: &PropertySnapshot) -> bool {
        match self.objects.get_mut(&target) {
            Some(StoredObject::Mesh { properties, .. }) => {
                *properties = *value;
                true
            }
            _ => false,
        }
    }

    fn geometry(&self, target: SceneObjectRef) -> Option<GeometrySnapshot> {
        match self.objects.get(&target)? {
            StoredObject::Mesh { geometry, .. } => Some(geometry.clone()),
            StoredObject::Light(_) => None,
        }
    }

    fn set_geometry(&mut self, target: SceneObjectRef, value: &GeometrySnapshot) -> bool {
        match self.objects.get_mut(&target) {
            Some(StoredObject::Mesh { geometry, .. }) => {
                geometry.clone_from(value);
                true
            }
            _ => false,
        }
    }

    fn set_vertex_positions(
        &mut self,
        target: SceneObjectRef,
        updates: &[(usize, Point3)],
    ) -> bool {
        let Some(StoredObject::Mesh { geometry, .. }) = self.objects.get_mut(&target) else {
            return false;
        };
        updates
            .iter()
            .all(|&(index, position)| geometry.set_point(index, position))
    }

    fn light(&self, target: SceneObjectRef) -> Option<LightSnapshot> {
        match self.objects.get(&target)? {
            StoredObject::Light(light) => Some(*light),
            StoredObject::Mesh { .. } => None,
        }
    }

    fn set_light(&mut self, target: SceneObjectRef, value: &LightSnapshot) -> bool {
        match self.objects.get_mut(&target) {
            Some(StoredObject::Light(light)) => {
                *light = *value;
                true
            }
            _ => false,
        }
    }

    fn pick_point(&self, target: SceneObjectRef, screen: Point2) -> Option<Point3> {
        self.unoccluded_hit(target, screen).map(|hit| hit.point)
    }

    fn pick_face(&self, target: SceneObjectRef, screen: Point2) -> Option<usize> {
        self.unoccluded_hit(target, screen).map(|hit| hit.face)
    }

    fn pick_object(&self, screen: Point2) -> Option<SceneObjectRef> {
        self.nearest_object(screen).map(|(target, _)| target)
    }

    fn camera(&self) -> CameraState {
        self.camera
    }

    fn set_overlay(&mut self, slot: OverlaySlot, overlay: Option<Overlay>) {
        match overlay {
            Some(overlay) => {
                self.overlays.insert(slot, overlay);
            }
            None => {
                self.overlays.remove(&slot);
            }
        }
    }

    fn is_primary_button_down(&self) -> bool {
        self.primary_button_down
    }

    fn show_status(&mut self, message: &str) {
        debug!(message, "状态栏");
        self.statuses.push(message.to_string());
    }

    fn render(&mut self) {
        self.render_count += 1;
    }
}
