use glam::{DMat4, DVec3, DVec4};
use serde::{Deserialize, Serialize};

use crate::geometry::{Point2, Point3, Ray, Vector3};

/// 视口相机状态，由渲染层在每次查询时提供。
///
/// 屏幕坐标约定：原点在左上角，y 向下，单位为像素。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub position: Point3,
    pub focal_point: Point3,
    pub view_up: Vector3,
    /// 垂直视场角（度）。
    pub view_angle: f64,
    pub parallel_projection: bool,
    /// 平行投影时视口半高（世界单位）。
    pub parallel_scale: f64,
    pub clipping_range: (f64, f64),
    /// 视口像素尺寸 (宽, 高)。
    pub viewport: (f64, f64),
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: Point3::new(20.0, -20.0, 15.0),
            focal_point: Point3::ORIGIN,
            view_up: Vector3::UNIT_Z,
            view_angle: 40.0,
            parallel_projection: false,
            parallel_scale: 1.0,
            clipping_range: (0.01, 1_000.0),
            viewport: (1280.0, 720.0),
        }
    }
}

impl CameraState {
    /// 俯视正交相机：位于 z = `height`，沿 -Z 观察，屏幕上方对应 +Y。
    pub fn top_down(height: f64, half_extent: f64, viewport: (f64, f64)) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, height),
            focal_point: Point3::ORIGIN,
            view_up: Vector3::new(0.0, 1.0, 0.0),
            view_angle: 30.0,
            parallel_projection: true,
            parallel_scale: half_extent,
            clipping_range: (0.01, height.abs() * 4.0 + 1.0),
            viewport,
        }
    }

    /// 观察方向（相机指向焦点）。
    pub fn direction_of_projection(&self) -> Vector3 {
        self.position
            .vector_to(self.focal_point)
            .normalize()
            .unwrap_or(Vector3::new(0.0, 0.0, -1.0))
    }

    /// 视平面法向，指向相机一侧。
    pub fn view_plane_normal(&self) -> Vector3 {
        self.direction_of_projection().scale(-1.0)
    }

    #[inline]
    pub fn viewport_height_px(&self) -> f64 {
        self.viewport.1.max(1.0)
    }

    #[inline]
    fn aspect(&self) -> f64 {
        self.viewport.0.max(1.0) / self.viewport_height_px()
    }

    fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(
            self.position.as_vec3(),
            self.focal_point.as_vec3(),
            self.view_up.as_vec3(),
        )
    }

    fn projection_matrix(&self) -> DMat4 {
        let (near, far) = self.clipping_range;
        if self.parallel_projection {
            let half_h = self.parallel_scale;
            let half_w = half_h * self.aspect();
            DMat4::orthographic_rh(-half_w, half_w, -half_h, half_h, near, far)
        } else {
            DMat4::perspective_rh(self.view_angle.to_radians(), self.aspect(), near, far)
        }
    }

    pub fn view_projection(&self) -> DMat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// 从屏幕点发出的拾取射线（近裁剪面指向远裁剪面）。
    pub fn screen_ray(&self, screen: Point2) -> Option<Ray> {
        let inverse = self.view_projection().inverse();
        if !inverse.is_finite() {
            return None;
        }
        let ndc_x = 2.0 * screen.x() / self.viewport.0.max(1.0) - 1.0;
        let ndc_y = 1.0 - 2.0 * screen.y() / self.viewport_height_px();
        let near = inverse.project_point3(DVec3::new(ndc_x, ndc_y, 0.0));
        let far = inverse.project_point3(DVec3::new(ndc_x, ndc_y, 1.0));
        Ray::new(Point3(near), Vector3(far - near))
    }

    /// 世界坐标投影到屏幕；位于相机背后时返回 `None`。
    pub fn world_to_screen(&self, point: Point3) -> Option<Point2> {
        let clip = self.view_projection() * DVec4::from((point.as_vec3(), 1.0));
        if clip.w <= 1e-12 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let screen = Point2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.0,
            (1.0 - ndc.y) * 0.5 * self.viewport.1,
        );
        screen.as_vec2().is_finite().then_some(screen)
    }

    /// 在 `at` 处一个垂直像素对应的世界长度，区分透视与平行投影。
    pub fn world_units_per_pixel(&self, at: Point3) -> f64 {
        let pixels = self.viewport_height_px();
        if self.parallel_projection {
            self.parallel_scale * 2.0 / pixels
        } else {
            let distance = self.position.distance(at);
            let half_angle = self.view_angle.to_radians() * 0.5;
            2.0 * distance * half_angle.tan() / pixels
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Plane;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn top_down_camera_maps_screen_to_ground() {
        let camera = CameraState::top_down(10.0, 5.0, (100.0, 100.0));
        let ray = camera.screen_ray(Point2::new(90.0, 10.0)).expect("ray");
        let hit = ray.intersect_plane(&Plane::ground()).expect("hit");
        assert_close(hit.x(), 4.0);
        assert_close(hit.y(), 4.0);
        assert_close(hit.z(), 0.0);

        let center = camera.world_to_screen(Point3::ORIGIN).expect("visible");
        assert_close(center.x(), 50.0);
        assert_close(center.y(), 50.0);
    }

    #[test]
    fn units_per_pixel_follow_projection() {
        let parallel = CameraState::top_down(10.0, 5.0, (100.0, 100.0));
        assert_close(parallel.world_units_per_pixel(Point3::ORIGIN), 0.1);

        let mut perspective = CameraState::default();
        perspective.position = Point3::new(0.0, 0.0, 10.0);
        perspective.view_up = Vector3::new(0.0, 1.0, 0.0);
        perspective.view_angle = 90.0;
        perspective.viewport = (200.0, 200.0);
        // 距离 10、视场 90° 时可见高度为 20。
        assert_close(perspective.world_units_per_pixel(Point3::ORIGIN), 0.1);
    }

    #[test]
    fn points_behind_perspective_camera_are_not_projected() {
        let mut camera = CameraState::default();
        camera.position = Point3::new(0.0, 0.0, 10.0);
        camera.view_up = Vector3::new(0.0, 1.0, 0.0);
        assert!(camera.world_to_screen(Point3::new(0.0, 0.0, 20.0)).is_none());
        assert!(camera.world_to_screen(Point3::ORIGIN).is_some());
    }
}
