/// Camera, projection and pointer hit-testing
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// Horizontal reach of a die around its projected center, in NDC times depth
const PICK_HALF_WIDTH: f32 = 0.4;
/// Vertical reach of a die around its projected center, in NDC times depth
const PICK_HALF_HEIGHT: f32 = 0.8;

pub const MIN_ZOOM: f32 = -1.5;
pub const MAX_ZOOM: f32 = 10.0;
/// Zoom change for one wheel notch or key press
pub const ZOOM_STEP: f32 = 0.2;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Camera looking down -Z at the origin from `2 + zoom` units away
#[derive(Debug, Clone)]
pub struct Camera {
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub mode: ProjectionMode,
    zoom: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::PI / 4.0, // 45 degrees
            aspect: width as f32 / height.max(1) as f32,
            near: 0.1,
            far: 25.0,
            mode: ProjectionMode::Perspective,
            zoom: 0.0,
        }
    }

    pub fn position(&self) -> Point3<f32> {
        Point3::new(0.0, 0.0, 2.0 + self.zoom)
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom_by(&mut self, delta: f32) {
        self.set_zoom(self.zoom + delta);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            ProjectionMode::Perspective => ProjectionMode::Orthographic,
            ProjectionMode::Orthographic => ProjectionMode::Perspective,
        };
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position(), &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let height = (self.position() - self.target).norm().max(self.near);
                let width = height * self.aspect;
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Project a 3D point to 2D screen space as `(x, y, ndc_depth)`
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let mvp = self.projection_matrix() * self.view_matrix() * model_matrix;
        let clip = mvp * point.to_homogeneous();

        // Behind the eye or degenerate
        if clip.w < 1e-6 {
            return None;
        }

        let ndc = clip.xyz() / clip.w;

        // Clip test
        if ndc.x < -1.0 || ndc.x > 1.0 || ndc.y < -1.0 || ndc.y > 1.0 {
            return None;
        }

        // Convert to screen space
        let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

        Some((screen_x, screen_y, ndc.z))
    }

    /// Whether a pointer at `(x, y)` screen pixels lands on an object placed at
    /// `position` under the `base` scene rotation.
    ///
    /// In perspective the test divides by clip-space z rather than w and uses
    /// fixed reach constants, so it is tuned for dice of standardized size.
    /// In orthographic mode the projected center is `clip.xy / w` and the same
    /// reach is divided by the object's distance in front of the eye.
    pub fn hit_test(
        &self,
        pointer: (f32, f32),
        viewport: (u32, u32),
        base: &Matrix4<f32>,
        position: &Point3<f32>,
    ) -> bool {
        let (width, height) = viewport;
        if width == 0 || height == 0 {
            return false;
        }

        let eye: Vector4<f32> = self.view_matrix() * base * position.to_homogeneous();
        let clip: Vector4<f32> = self.projection_matrix() * eye;
        let (center_x, center_y, depth) = match self.mode {
            ProjectionMode::Perspective => (clip.x / clip.z, clip.y / clip.z, clip.z),
            ProjectionMode::Orthographic => (clip.x / clip.w, clip.y / clip.w, -eye.z),
        };
        if depth <= 0.0 || !depth.is_finite() {
            return false;
        }

        let pointer_x = pointer.0 * (2.0 / width as f32) - 1.0;
        let pointer_y = pointer.1 * (-2.0 / height as f32) + 1.0;
        let distance_x = (pointer_x - center_x).abs();
        let distance_y = (pointer_y - center_y).abs();

        distance_x <= PICK_HALF_WIDTH / depth && distance_y < PICK_HALF_HEIGHT / depth
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(800, 600);
        assert_eq!(camera.mode, ProjectionMode::Perspective);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert_eq!(camera.position(), Point3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn test_view_matrix() {
        let camera = Camera::new(800, 600);
        let view = camera.view_matrix();
        // View matrix should be non-zero
        assert!(view.norm() > 0.0);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = Camera::default();
        for _ in 0..100 {
            camera.zoom_by(ZOOM_STEP);
        }
        assert_eq!(camera.zoom(), MAX_ZOOM);
        for _ in 0..100 {
            camera.zoom_by(-ZOOM_STEP);
        }
        assert_eq!(camera.zoom(), MIN_ZOOM);
    }

    #[test]
    fn test_origin_projects_to_center() {
        let camera = Camera::new(800, 600);
        let (x, y, _) = camera
            .project_to_screen(&Point3::origin(), &Matrix4::identity(), 800, 600)
            .unwrap();
        assert!((x - 400.0).abs() < 1e-3);
        assert!((y - 300.0).abs() < 1e-3);

        let behind = Point3::new(0.0, 0.0, 5.0);
        assert!(camera
            .project_to_screen(&behind, &Matrix4::identity(), 800, 600)
            .is_none());
    }

    #[test]
    fn test_hit_test_center_and_corner() {
        let camera = Camera::new(800, 600);
        let base = Matrix4::identity();
        let die = Point3::origin();
        assert!(camera.hit_test((400.0, 300.0), (800, 600), &base, &die));
        assert!(!camera.hit_test((5.0, 5.0), (800, 600), &base, &die));
        assert!(!camera.hit_test((400.0, 300.0), (0, 0), &base, &die));
    }

    #[test]
    fn test_hit_test_in_both_projections() {
        let mut camera = Camera::new(800, 600);
        camera.set_zoom(3.0);
        let base = Matrix4::identity();
        let die = Point3::origin();

        for mode in [ProjectionMode::Perspective, ProjectionMode::Orthographic] {
            camera.mode = mode;
            assert!(camera.hit_test((400.0, 300.0), (800, 600), &base, &die), "{mode:?}");
            assert!(!camera.hit_test((5.0, 5.0), (800, 600), &base, &die), "{mode:?}");
        }
    }

    #[test]
    fn test_orthographic_hit_follows_projected_center() {
        let mut camera = Camera::new(800, 600);
        camera.set_zoom(3.0);
        camera.mode = ProjectionMode::Orthographic;
        let base = Matrix4::identity();
        let die = Point3::new(1.0, 0.0, 0.0);

        let (x, y, _) = camera.project_to_screen(&die, &base, 800, 600).unwrap();
        assert!(camera.hit_test((x, y), (800, 600), &base, &die));
        assert!(!camera.hit_test((400.0, 300.0), (800, 600), &base, &die));

        let behind = Point3::new(0.0, 0.0, 6.0);
        assert!(!camera.hit_test((400.0, 300.0), (800, 600), &base, &behind));
    }
}
