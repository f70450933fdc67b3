//! 可逆编辑使用的快照值类型：变换、外观属性、几何与灯光。
//!
//! 快照一经捕获即不可变，命令以 before/after 两份快照描述一次编辑。

use glam::{DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds3D, Point3, Vector3};

/// 4×4 齐次变换（行主序 16 个分量），表示对象的局部到父级变换。
///
/// 两个快照当且仅当 16 个分量逐一相等时相等，用于识别无效编辑。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformSnapshot([f64; 16]);

impl Default for TransformSnapshot {
    fn default() -> Self {
        Self::identity()
    }
}

impl TransformSnapshot {
    #[rustfmt::skip]
    pub const IDENTITY: TransformSnapshot = TransformSnapshot([
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ]);

    #[inline]
    pub fn identity() -> Self {
        Self::IDENTITY
    }

    #[inline]
    pub fn from_row_major(values: [f64; 16]) -> Self {
        Self(values)
    }

    #[inline]
    pub fn to_row_major(&self) -> [f64; 16] {
        self.0
    }

    #[inline]
    pub fn element(&self, row: usize, column: usize) -> f64 {
        self.0[row * 4 + column]
    }

    pub fn from_translation(translation: Point3) -> Self {
        Self::identity().with_translation(translation)
    }

    pub fn from_mat4(matrix: DMat4) -> Self {
        Self(matrix.transpose().to_cols_array())
    }

    pub fn to_mat4(&self) -> DMat4 {
        DMat4::from_cols_array(&self.0).transpose()
    }

    pub fn from_scale_rotation_translation(
        scale: DVec3,
        rotation: DQuat,
        translation: DVec3,
    ) -> Self {
        Self::from_mat4(DMat4::from_scale_rotation_translation(scale, rotation, translation))
    }

    /// 分解为 (缩放, 旋转, 平移)。
    pub fn scale_rotation_translation(&self) -> (DVec3, DQuat, DVec3) {
        self.to_mat4().to_scale_rotation_translation()
    }

    #[inline]
    pub fn translation(&self) -> Point3 {
        Point3::new(self.0[3], self.0[7], self.0[11])
    }

    /// 只替换平移列，旋转与缩放保持不变。
    pub fn with_translation(&self, translation: Point3) -> Self {
        let mut values = self.0;
        values[3] = translation.x();
        values[7] = translation.y();
        values[11] = translation.z();
        Self(values)
    }

    /// 取 `proposed` 的朝向，保留自身的平移与缩放。
    pub fn with_rotation_from(&self, proposed: &TransformSnapshot) -> Self {
        let (scale, _, translation) = self.scale_rotation_translation();
        let (_, rotation, _) = proposed.scale_rotation_translation();
        Self::from_scale_rotation_translation(scale, rotation, translation)
    }

    /// 取 `proposed` 的缩放，保留自身的平移与朝向。
    pub fn with_scale_from(&self, proposed: &TransformSnapshot) -> Self {
        let (_, rotation, translation) = self.scale_rotation_translation();
        let (scale, _, _) = proposed.scale_rotation_translation();
        Self::from_scale_rotation_translation(scale, rotation, translation)
    }

    /// 等比缩放：三个轴向缩放取绝对值后求平均（零按 1 处理），平移与朝向不变。
    pub fn uniform_scaled(&self) -> Self {
        let (scale, rotation, translation) = self.scale_rotation_translation();
        let axis = |value: f64| if value == 0.0 { 1.0 } else { value.abs() };
        let average = (axis(scale.x) + axis(scale.y) + axis(scale.z)) / 3.0;
        Self::from_scale_rotation_translation(DVec3::splat(average), rotation, translation)
    }

    /// 变换的 -Z 轴方向（单位化），灯光用它作为照射方向。
    pub fn forward(&self) -> Option<Vector3> {
        Vector3::new(-self.0[2], -self.0[6], -self.0[10]).normalize()
    }

    pub fn transform_point(&self, point: Point3) -> Point3 {
        Point3(self.to_mat4().transform_point3(point.as_vec3()))
    }

    pub fn transform_vector(&self, vector: Vector3) -> Vector3 {
        Vector3(self.to_mat4().transform_vector3(vector.as_vec3()))
    }

    /// 求逆；奇异矩阵返回 `None`。
    pub fn inverse(&self) -> Option<Self> {
        let matrix = self.to_mat4();
        let det = matrix.determinant();
        if det.abs() <= f64::EPSILON || !det.is_finite() {
            return None;
        }
        Some(Self::from_mat4(matrix.inverse()))
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|value| value.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Interpolation {
    Flat,
    #[default]
    Gouraud,
    Phong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Representation {
    Points,
    Wireframe,
    #[default]
    Surface,
}

/// 外观属性快照，离散编辑（下拉框、复选框）与成组滑块拖动前后各捕获一次。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    /// RGB，分量范围 0..1。
    pub color: [f64; 3],
    pub opacity: f64,
    pub ambient: f64,
    pub diffuse: f64,
    pub specular: f64,
    pub specular_power: f64,
    pub interpolation: Interpolation,
    pub representation: Representation,
    pub edge_visibility: bool,
    pub backface_culling: bool,
    pub frontface_culling: bool,
}

impl Default for PropertySnapshot {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            opacity: 1.0,
            ambient: 0.0,
            diffuse: 1.0,
            specular: 0.0,
            specular_power: 1.0,
            interpolation: Interpolation::default(),
            representation: Representation::default(),
            edge_visibility: false,
            backface_culling: false,
            frontface_culling: false,
        }
    }
}

impl PropertySnapshot {
    pub fn with_color(mut self, color: [f64; 3]) -> Self {
        self.color = color.map(|channel| channel.clamp(0.0, 1.0));
        self
    }
}

/// 一个网格的完整几何：顶点坐标（对象局部空间）与面拓扑。
///
/// 面以顶点下标列表表示；删除面不会重排顶点，共享顶点可能变为孤立点。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometrySnapshot {
    pub points: Vec<Point3>,
    pub faces: Vec<Vec<usize>>,
}

impl GeometrySnapshot {
    pub fn new(points: Vec<Point3>, faces: Vec<Vec<usize>>) -> Self {
        Self { points, faces }
    }

    /// 以 `center` 为中心、边长为 `lengths` 的长方体，六个外法向四边形面。
    pub fn cuboid(lengths: Vector3, center: Point3) -> Self {
        let half = lengths.as_vec3().abs() * 0.5;
        let c = center.as_vec3();
        let points = (0..8)
            .map(|bits| {
                let pick = |bit: usize, h: f64| if bits & bit != 0 { h } else { -h };
                Point3(c + DVec3::new(pick(1, half.x), pick(2, half.y), pick(4, half.z)))
            })
            .collect();
        let faces = vec![
            vec![0, 2, 3, 1],
            vec![4, 5, 7, 6],
            vec![0, 1, 5, 4],
            vec![2, 6, 7, 3],
            vec![0, 4, 6, 2],
            vec![1, 3, 7, 5],
        ];
        Self { points, faces }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// 至少三个顶点的多边形面数量。
    pub fn polygon_count(&self) -> usize {
        self.faces.iter().filter(|face| face.len() >= 3).count()
    }

    #[inline]
    pub fn point(&self, index: usize) -> Option<Point3> {
        self.points.get(index).copied()
    }

    #[inline]
    pub fn face(&self, index: usize) -> Option<&[usize]> {
        self.faces.get(index).map(Vec::as_slice)
    }

    pub fn set_point(&mut self, index: usize, position: Point3) -> bool {
        match self.points.get_mut(index) {
            Some(slot) => {
                *slot = position;
                true
            }
            None => false,
        }
    }

    /// 由面的前三个顶点叉积得到的单位法向；退化或越界时返回 `None`。
    pub fn face_normal(&self, index: usize) -> Option<Vector3> {
        let face = self.face(index)?;
        if face.len() < 3 {
            return None;
        }
        let p0 = self.point(face[0])?;
        let p1 = self.point(face[1])?;
        let p2 = self.point(face[2])?;
        p0.vector_to(p1).cross(p0.vector_to(p2)).normalize()
    }

    pub fn face_centroid(&self, index: usize) -> Option<Point3> {
        let face = self.face(index)?;
        if face.is_empty() {
            return None;
        }
        let mut sum = DVec3::ZERO;
        for &vertex in face {
            sum += self.point(vertex)?.as_vec3();
        }
        Some(Point3(sum / face.len() as f64))
    }

    /// 从拓扑中移除一个面，其余面保持原有顺序。
    pub fn delete_face(&mut self, index: usize) -> bool {
        if index >= self.faces.len() {
            return false;
        }
        self.faces.remove(index);
        true
    }

    pub fn bounds(&self) -> Option<Bounds3D> {
        Bounds3D::from_points(self.points.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightKind {
    Point,
    Directional,
    Spot,
}

impl LightKind {
    /// 注册表使用的基础名。
    pub fn base_name(self) -> &'static str {
        match self {
            LightKind::Point => "point_light",
            LightKind::Directional => "directional_light",
            LightKind::Spot => "spot_light",
        }
    }
}

/// 灯光状态快照；位置与焦点共同决定照射方向。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightSnapshot {
    pub kind: LightKind,
    pub position: Point3,
    pub focal_point: Point3,
    pub intensity: f64,
    pub color: [f64; 3],
    pub cone_angle: f64,
    pub exponent: f64,
}

impl LightSnapshot {
    /// 按类型给出默认参数：方向光强度更高，聚光灯锥角更窄。
    pub fn new(kind: LightKind) -> Self {
        let (intensity, cone_angle, exponent) = match kind {
            LightKind::Point => (1.0, 180.0, 1.0),
            LightKind::Directional => (1.5, 30.0, 1.0),
            LightKind::Spot => (1.0, 25.0, 15.0),
        };
        Self {
            kind,
            position: Point3::new(10.0, -10.0, 10.0),
            focal_point: Point3::ORIGIN,
            intensity,
            color: [1.0, 1.0, 1.0],
            cone_angle,
            exponent,
        }
    }

    /// 从位置指向焦点的单位方向。
    pub fn direction(&self) -> Vector3 {
        self.position
            .vector_to(self.focal_point)
            .normalize()
            .unwrap_or(Vector3::new(0.0, 0.0, -1.0))
    }

    /// 移动位置并保持照射方向（焦点随之平移）。
    pub fn moved_keeping_direction(&self, position: Point3) -> Self {
        let offset = self.position.vector_to(self.focal_point);
        Self {
            position,
            focal_point: position.translate(offset),
            ..*self
        }
    }

    /// 沿 `direction` 瞄准：焦点 = 位置 + 单位方向。
    pub fn aimed(&self, direction: Vector3) -> Self {
        let direction = direction.normalize().unwrap_or(self.direction());
        Self {
            focal_point: self.position.translate(direction),
            ..*self
        }
    }
}

/// 创建网格时交给渲染层的几何描述。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryDescriptor {
    Cuboid { lengths: Vector3, center: Point3 },
    Mesh(GeometrySnapshot),
}

impl GeometryDescriptor {
    pub fn build(&self) -> GeometrySnapshot {
        match self {
            GeometryDescriptor::Cuboid { lengths, center } => {
                GeometrySnapshot::cuboid(*lengths, *center)
            }
            GeometryDescriptor::Mesh(geometry) => geometry.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshSpec {
    pub geometry: GeometryDescriptor,
    pub transform: TransformSnapshot,
    pub properties: PropertySnapshot,
}

/// 重新创建一个场景对象所需的全部数据（添加、删除撤销、复制时使用）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectSpec {
    Mesh(MeshSpec),
    Light(LightSnapshot),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_matrix_close(actual: &TransformSnapshot, expected: &TransformSnapshot) {
        for (a, e) in actual.to_row_major().iter().zip(expected.to_row_major()) {
            assert!((a - e).abs() < 1e-12, "{actual:?} != {expected:?}");
        }
    }

    #[rustfmt::skip]
    fn diag_with_translation(x: f64, y: f64, z: f64, t: [f64; 3]) -> TransformSnapshot {
        TransformSnapshot::from_row_major([
            x, 0.0, 0.0, t[0],
            0.0, y, 0.0, t[1],
            0.0, 0.0, z, t[2],
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    #[test]
    fn uniform_scale_averages_axes_and_keeps_translation() {
        let source = diag_with_translation(2.0, 4.0, 6.0, [1.0, -2.0, 3.0]);
        let uniform = source.uniform_scaled();
        assert_matrix_close(&uniform, &diag_with_translation(4.0, 4.0, 4.0, [1.0, -2.0, 3.0]));
    }

    #[test]
    fn row_major_round_trips_through_glam() {
        let source = diag_with_translation(1.0, 2.0, 3.0, [7.0, 8.0, 9.0]);
        let matrix = source.to_mat4();
        assert_eq!(matrix.w_axis.x, 7.0);
        assert_eq!(TransformSnapshot::from_mat4(matrix), source);
        assert_eq!(source.translation(), Point3::new(7.0, 8.0, 9.0));
        assert_eq!(source.element(1, 1), 2.0);
    }

    #[test]
    fn rotation_and_scale_filters_keep_the_other_components() {
        let start = diag_with_translation(2.0, 2.0, 2.0, [1.0, 0.0, 0.0]);
        let rotated = TransformSnapshot::from_scale_rotation_translation(
            DVec3::splat(5.0),
            DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2),
            DVec3::new(9.0, 9.0, 9.0),
        );

        let rotation_only = start.with_rotation_from(&rotated);
        let (scale, rotation, translation) = rotation_only.scale_rotation_translation();
        assert!((scale - DVec3::splat(2.0)).length() < 1e-9);
        let quarter = DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2);
        assert!((rotation.dot(quarter).abs() - 1.0).abs() < 1e-9);
        assert!((translation - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-9);

        let scale_only = start.with_scale_from(&rotated);
        let (scale, rotation, translation) = scale_only.scale_rotation_translation();
        assert!((scale - DVec3::splat(5.0)).length() < 1e-9);
        assert!((rotation.dot(DQuat::IDENTITY).abs() - 1.0).abs() < 1e-9);
        assert!((translation - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn singular_transform_has_no_inverse() {
        let flat = diag_with_translation(1.0, 1.0, 0.0, [0.0; 3]);
        assert!(flat.inverse().is_none());
        let source = diag_with_translation(2.0, 4.0, 8.0, [1.0, 1.0, 1.0]);
        let inverse = source.inverse().expect("invertible");
        let back = inverse.transform_point(source.transform_point(Point3::new(3.0, -1.0, 2.0)));
        assert!(back.distance(Point3::new(3.0, -1.0, 2.0)) < 1e-12);
    }

    #[test]
    fn cuboid_faces_point_outward() {
        let cube =
            GeometrySnapshot::cuboid(Vector3::new(2.0, 4.0, 6.0), Point3::new(0.0, 0.0, 3.0));
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.face_count(), 6);
        let center = Point3::new(0.0, 0.0, 3.0);
        for index in 0..cube.face_count() {
            let normal = cube.face_normal(index).expect("non-degenerate face");
            let centroid = cube.face_centroid(index).expect("centroid");
            assert!(center.vector_to(centroid).dot(normal) > 0.0, "face {index} points inward");
        }
        let bounds = cube.bounds().expect("bounds");
        assert_eq!(bounds.min(), Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max(), Point3::new(1.0, 2.0, 6.0));
    }

    #[test]
    fn deleting_a_face_keeps_vertices_and_order() {
        let mut cube = GeometrySnapshot::cuboid(Vector3::new(1.0, 1.0, 1.0), Point3::ORIGIN);
        let original = cube.clone();
        assert!(cube.delete_face(2));
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.face_count(), 5);
        assert_eq!(cube.faces[1], original.faces[1]);
        assert_eq!(cube.faces[2], original.faces[3]);
        assert!(!cube.delete_face(17));
    }

    #[test]
    fn light_moves_keep_direction_and_aim_normalises() {
        let light = LightSnapshot::new(LightKind::Spot);
        let moved = light.moved_keeping_direction(Point3::new(0.0, 0.0, 5.0));
        assert!((moved.direction().dot(light.direction()) - 1.0).abs() < 1e-12);

        let aimed = moved.aimed(Vector3::new(0.0, 0.0, -3.0));
        assert_eq!(aimed.focal_point, Point3::new(0.0, 0.0, 4.0));
        assert_eq!(LightSnapshot::new(LightKind::Directional).intensity, 1.5);
    }
}
