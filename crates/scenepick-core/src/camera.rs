//! Camera view, bounds, and view-frustum geometry.

use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Creates a box from two corners.
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Creates a box centered at `center` with half extents `half`.
    #[must_use]
    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        let half = half.abs();
        Self::new(center - half, center + half)
    }

    /// Unit cube centered at the origin.
    #[must_use]
    pub fn unit() -> Self {
        Self::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5))
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// The eight corners.
    #[must_use]
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounds of this box after an affine transform.
    #[must_use]
    pub fn transformed(&self, transform: &Mat4) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for corner in self.corners() {
            let p = transform.transform_point3(corner);
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }
}

/// A plane `n · p + d = 0` with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal pointing into the positive half-space.
    pub normal: Vec3,
    /// Signed offset from the origin.
    pub distance: f32,
}

impl Plane {
    /// Builds a normalized plane from raw coefficients.
    #[must_use]
    pub fn from_coefficients(c: Vec4) -> Self {
        let len = c.truncate().length();
        if len > 0.0 {
            Self {
                normal: c.truncate() / len,
                distance: c.w / len,
            }
        } else {
            Self {
                normal: Vec3::ZERO,
                distance: 0.0,
            }
        }
    }

    /// Signed distance from the plane; positive is inside.
    #[inline]
    #[must_use]
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// Six inward-facing clip planes: left, right, bottom, top, near, far.
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// The clip planes.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extracts planes from a view-projection matrix (Gribb/Hartmann) for
    /// the `[0, 1]` depth range used by wgpu.
    #[must_use]
    pub fn from_view_projection(vp: Mat4) -> Self {
        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        Self {
            planes: [
                Plane::from_coefficients(row3 + row0),
                Plane::from_coefficients(row3 - row0),
                Plane::from_coefficients(row3 + row1),
                Plane::from_coefficients(row3 - row1),
                Plane::from_coefficients(row2),
                Plane::from_coefficients(row3 - row2),
            ],
        }
    }

    /// Whether a sphere touches the frustum.
    ///
    /// Inclusive: a center exactly `radius` outside a plane is still visible.
    #[inline]
    #[must_use]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(center) >= -radius)
    }

    /// Whether a world-space box touches the frustum.
    #[must_use]
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            // Positive vertex: the corner furthest along the plane normal.
            let p = Vec3::select(plane.normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            plane.distance_to_point(p) >= 0.0
        })
    }
}

/// Camera matrices and viewport size consumed by the passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    /// World to view transform.
    pub view: Mat4,
    /// View to clip transform (`[0, 1]` depth).
    pub projection: Mat4,
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
}

impl CameraView {
    /// Creates a camera view from explicit matrices.
    #[must_use]
    pub fn new(view: Mat4, projection: Mat4, width: u32, height: u32) -> Self {
        Self {
            view,
            projection,
            width,
            height,
        }
    }

    /// Right-handed perspective camera looking from `eye` to `target`.
    #[must_use]
    pub fn look_at_perspective(
        eye: Vec3,
        target: Vec3,
        fov_y: f32,
        near: f32,
        far: f32,
        width: u32,
        height: u32,
    ) -> Self {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Self::new(
            Mat4::look_at_rh(eye, target, Vec3::Y),
            Mat4::perspective_rh(fov_y, aspect, near, far),
            width,
            height,
        )
    }

    /// Returns a copy with a different viewport size; the projection is kept.
    #[must_use]
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Combined view-projection matrix.
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// The view frustum.
    #[must_use]
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(self.view_projection())
    }

    /// Camera position in world space.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.view.inverse().w_axis.truncate()
    }

    /// Projects a world point to pixel coordinates (top-left origin) and
    /// normalized depth. Returns `None` behind the camera.
    #[must_use]
    pub fn project(&self, point: Vec3) -> Option<(Vec2, f32)> {
        let clip = self.view_projection() * point.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let x = (ndc.x * 0.5 + 0.5) * self.width as f32;
        let y = (0.5 - ndc.y * 0.5) * self.height as f32;
        Some((Vec2::new(x, y), ndc.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera() -> CameraView {
        CameraView::look_at_perspective(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::ZERO,
            45.0_f32.to_radians(),
            0.1,
            100.0,
            200,
            200,
        )
    }

    #[test]
    fn test_frustum_contains_origin() {
        let frustum = test_camera().frustum();
        assert!(frustum.intersects_sphere(Vec3::ZERO, 0.0));
        assert!(!frustum.intersects_sphere(Vec3::new(0.0, 0.0, 20.0), 1.0));
    }

    #[test]
    fn test_aabb_intersection() {
        let frustum = test_camera().frustum();
        assert!(frustum.intersects_aabb(&Aabb::unit()));
        let behind = Aabb::from_center_half_extents(Vec3::new(0.0, 0.0, 30.0), Vec3::ONE);
        assert!(!frustum.intersects_aabb(&behind));
        // Straddles the left plane.
        let straddling =
            Aabb::from_center_half_extents(Vec3::new(-200.0, 0.0, -50.0), Vec3::new(250.0, 1.0, 1.0));
        assert!(frustum.intersects_aabb(&straddling));
    }

    #[test]
    fn test_project_center() {
        let camera = test_camera();
        let (pixel, depth) = camera.project(Vec3::ZERO).expect("origin is in front");
        assert!((pixel.x - 100.0).abs() < 1e-3);
        assert!((pixel.y - 100.0).abs() < 1e-3);
        assert!((0.0..=1.0).contains(&depth));
        assert!(camera.project(Vec3::new(0.0, 0.0, 20.0)).is_none());
    }

    #[test]
    fn test_project_y_points_down() {
        let camera = test_camera();
        let (above, _) = camera.project(Vec3::new(0.0, 1.0, 0.0)).expect("visible");
        assert!(above.y < 100.0);
    }

    #[test]
    fn test_transformed_aabb() {
        let moved = Aabb::unit().transformed(&Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
        assert!((moved.center() - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_camera_position() {
        let camera = test_camera();
        assert!((camera.position() - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-4);
    }
}
