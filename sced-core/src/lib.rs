pub mod camera;
pub mod snapshot;
pub mod spatial;

pub mod geometry {
    use glam::{DVec2, DVec3};
    use serde::{Deserialize, Serialize};

    /// 平面判定使用的容差，低于该值视为射线与平面平行。
    pub const PARALLEL_EPSILON: f64 = 1e-9;

    /// 屏幕坐标（像素），原点位于视口左上角，y 轴向下。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 三维点，内部以 `glam::DVec3` 表示。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point3(pub DVec3);

    impl Point3 {
        pub const ORIGIN: Point3 = Point3(DVec3::ZERO);

        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn z(self) -> f64 {
            self.0.z
        }

        #[inline]
        pub fn as_vec3(self) -> DVec3 {
            self.0
        }

        #[inline]
        pub fn translate(self, offset: Vector3) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point3) -> Vector3 {
            Vector3(other.0 - self.0)
        }

        #[inline]
        pub fn distance(self, other: Point3) -> f64 {
            self.0.distance(other.0)
        }

        #[inline]
        pub fn is_finite(self) -> bool {
            self.0.is_finite()
        }
    }

    impl From<DVec3> for Point3 {
        fn from(value: DVec3) -> Self {
            Self(value)
        }
    }

    /// 三维向量，提供法向、投影等基础运算。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector3(pub DVec3);

    impl Vector3 {
        pub const UNIT_Z: Vector3 = Vector3(DVec3::Z);

        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn as_vec3(self) -> DVec3 {
            self.0
        }

        #[inline]
        pub fn length(self) -> f64 {
            self.0.length()
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        #[inline]
        pub fn normalize(self) -> Option<Self> {
            let len = self.0.length();
            if len <= f64::EPSILON || !len.is_finite() {
                None
            } else {
                Some(Self(self.0 / len))
            }
        }

        #[inline]
        pub fn dot(self, other: Vector3) -> f64 {
            self.0.dot(other.0)
        }

        #[inline]
        pub fn cross(self, other: Vector3) -> Vector3 {
            Self(self.0.cross(other.0))
        }

        #[inline]
        pub fn scale(self, factor: f64) -> Vector3 {
            Self(self.0 * factor)
        }
    }

    impl From<DVec3> for Vector3 {
        fn from(value: DVec3) -> Self {
            Self(value)
        }
    }

    /// 轴对齐包围盒，用于放置 gizmo 与提示标记。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds3D {
        min: Point3,
        max: Point3,
    }

    impl Bounds3D {
        #[inline]
        pub fn new(min: Point3, max: Point3) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
                max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
            let mut bounds = Self::empty();
            for point in points {
                bounds.include_point(*point);
            }
            if bounds.is_empty() { None } else { Some(bounds) }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x()
                || self.min.y() > self.max.y()
                || self.min.z() > self.max.z()
        }

        #[inline]
        pub fn include_point(&mut self, point: Point3) {
            self.min = Point3(self.min.0.min(point.0));
            self.max = Point3(self.max.0.max(point.0));
        }

        pub fn include_bounds(&mut self, other: &Bounds3D) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }

        #[inline]
        pub fn min(&self) -> Point3 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point3 {
            self.max
        }

        #[inline]
        pub fn center(&self) -> Point3 {
            Point3((self.min.0 + self.max.0) * 0.5)
        }

        #[inline]
        pub fn size(&self) -> Vector3 {
            Vector3(self.max.0 - self.min.0)
        }
    }

    /// 射线：起点加单位方向。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Ray {
        pub origin: Point3,
        pub direction: Vector3,
    }

    impl Ray {
        pub fn new(origin: Point3, direction: Vector3) -> Option<Self> {
            direction.normalize().map(|direction| Self { origin, direction })
        }

        #[inline]
        pub fn at(&self, t: f64) -> Point3 {
            self.origin.translate(self.direction.scale(t))
        }

        /// 射线（视作直线）与平面求交；平行时返回 `None`。
        pub fn intersect_plane(&self, plane: &Plane) -> Option<Point3> {
            let denom = self.direction.dot(plane.normal);
            if denom.abs() < PARALLEL_EPSILON {
                return None;
            }
            let t = self.origin.vector_to(plane.origin).dot(plane.normal) / denom;
            let hit = self.at(t);
            hit.is_finite().then_some(hit)
        }
    }

    /// 由一点和法向确定的平面。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Plane {
        pub origin: Point3,
        pub normal: Vector3,
    }

    impl Plane {
        #[inline]
        pub fn new(origin: Point3, normal: Vector3) -> Self {
            Self { origin, normal }
        }

        /// 地面（z = 0）。
        #[inline]
        pub fn ground() -> Self {
            Self::new(Point3::ORIGIN, Vector3::UNIT_Z)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn ray_hits_ground_plane() {
            let ray = Ray::new(Point3::new(1.0, 2.0, 10.0), Vector3::new(0.0, 0.0, -2.0))
                .expect("direction is not degenerate");
            let hit = ray.intersect_plane(&Plane::ground()).expect("should hit");
            assert!((hit.x() - 1.0).abs() < 1e-12);
            assert!((hit.y() - 2.0).abs() < 1e-12);
            assert!(hit.z().abs() < 1e-12);
        }

        #[test]
        fn parallel_ray_misses_plane() {
            let ray = Ray::new(Point3::new(0.0, 0.0, 1.0), Vector3::new(1.0, 0.0, 0.0)).unwrap();
            assert!(ray.intersect_plane(&Plane::ground()).is_none());
            assert!(Ray::new(Point3::ORIGIN, Vector3::new(0.0, 0.0, 0.0)).is_none());
        }

        #[test]
        fn bounds_track_points() {
            let points = [
                Point3::new(-1.0, 2.0, 0.5),
                Point3::new(3.0, -4.0, 1.5),
                Point3::new(0.0, 0.0, -2.0),
            ];
            let bounds = Bounds3D::from_points(points.iter()).expect("non-empty");
            assert_eq!(bounds.min(), Point3::new(-1.0, -4.0, -2.0));
            assert_eq!(bounds.max(), Point3::new(3.0, 2.0, 1.5));
            assert_eq!(bounds.center(), Point3::new(1.0, -1.0, -0.25));
            assert!(Bounds3D::from_points(std::iter::empty()).is_none());
        }
    }
}

pub mod object {
    use std::fmt;

    use serde::{Deserialize, Serialize};

    /// 场景对象的稳定编号，由注册表分配，永不复用。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct ObjectId(u64);

    impl ObjectId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 提供原始数值，便于日志输出。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum ObjectKind {
        Mesh,
        Light,
    }

    /// 指向场景中一个网格或灯光的不透明句柄。
    ///
    /// 变体在边界处一次性区分网格与灯光，命令与工具据此做模式匹配，
    /// 不再在各处重复判断对象类型。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub enum SceneObjectRef {
        Mesh(ObjectId),
        Light(ObjectId),
    }

    impl SceneObjectRef {
        #[inline]
        pub fn new(kind: ObjectKind, id: ObjectId) -> Self {
            match kind {
                ObjectKind::Mesh => Self::Mesh(id),
                ObjectKind::Light => Self::Light(id),
            }
        }

        #[inline]
        pub fn id(self) -> ObjectId {
            match self {
                Self::Mesh(id) | Self::Light(id) => id,
            }
        }

        #[inline]
        pub fn kind(self) -> ObjectKind {
            match self {
                Self::Mesh(_) => ObjectKind::Mesh,
                Self::Light(_) => ObjectKind::Light,
            }
        }

        #[inline]
        pub fn is_light(self) -> bool {
            matches!(self, Self::Light(_))
        }
    }

    impl fmt::Display for SceneObjectRef {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Mesh(id) => write!(f, "mesh#{}", id.get()),
                Self::Light(id) => write!(f, "light#{}", id.get()),
            }
        }
    }
}
