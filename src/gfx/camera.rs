//! Perspective camera with eagerly cached view/projection matrices

use cgmath::{perspective, Deg, InnerSpace, Matrix4, Point3, Vector3};

/// Converts from OpenGL clip-space depth (-1..1) to wgpu depth (0..1).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

const WORLD_UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

/// First-person style perspective camera.
///
/// Orientation is pitch/yaw only (no roll); up is always world +Y. The view
/// and projection matrices are recomputed synchronously inside every setter,
/// so reads never observe stale state.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vector3<f32>,
    /// Up/down rotation, radians
    pitch: f32,
    /// Left/right rotation, radians
    yaw: f32,

    /// Vertical field of view, degrees
    fov: f32,
    aspect_ratio: f32,
    near_plane: f32,
    far_plane: f32,

    view: Matrix4<f32>,
    projection: Matrix4<f32>,
}

impl Camera {
    pub fn new(fov: f32, aspect_ratio: f32, near_plane: f32, far_plane: f32) -> Self {
        let mut camera = Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            pitch: 0.0,
            yaw: 0.0,
            fov,
            aspect_ratio,
            near_plane,
            far_plane,
            view: Matrix4::from_scale(1.0),
            projection: Matrix4::from_scale(1.0),
        };
        camera.recalculate_view();
        camera.recalculate_projection();
        camera
    }

    // Setters - each keeps the affected matrix in sync

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
        self.recalculate_view();
    }

    pub fn set_rotation(&mut self, pitch: f32, yaw: f32) {
        self.pitch = pitch;
        self.yaw = yaw;
        self.recalculate_view();
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
        self.recalculate_projection();
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
        self.recalculate_projection();
    }

    pub fn set_clip_planes(&mut self, near_plane: f32, far_plane: f32) {
        self.near_plane = near_plane;
        self.far_plane = far_plane;
        self.recalculate_projection();
    }

    /// Updates the aspect ratio from a surface size in pixels
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.set_aspect_ratio(width as f32 / height as f32);
        }
    }

    // Movement

    pub fn translate(&mut self, offset: Vector3<f32>) {
        self.position += offset;
        self.recalculate_view();
    }

    pub fn move_forward(&mut self, amount: f32) {
        self.position += self.forward() * amount;
        self.recalculate_view();
    }

    pub fn move_right(&mut self, amount: f32) {
        self.position += self.right() * amount;
        self.recalculate_view();
    }

    pub fn move_up(&mut self, amount: f32) {
        self.position += self.up() * amount;
        self.recalculate_view();
    }

    // Direction vectors, derived from pitch/yaw

    pub fn forward(&self) -> Vector3<f32> {
        Vector3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vector3<f32> {
        self.forward().cross(WORLD_UP).normalize()
    }

    pub fn up(&self) -> Vector3<f32> {
        self.right().cross(self.forward()).normalize()
    }

    // Getters

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn near_plane(&self) -> f32 {
        self.near_plane
    }

    pub fn far_plane(&self) -> f32 {
        self.far_plane
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection * self.view
    }

    /// Builds the uniform data uploaded to the GPU each frame
    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_position: [self.position.x, self.position.y, self.position.z, 1.0],
            view_proj: self.view_projection_matrix().into(),
        }
    }

    fn recalculate_view(&mut self) {
        let eye = Point3::new(self.position.x, self.position.y, self.position.z);
        let target = eye + self.forward();
        self.view = Matrix4::look_at_rh(eye, target, WORLD_UP);
    }

    fn recalculate_projection(&mut self) {
        self.projection = OPENGL_TO_WGPU_MATRIX
            * perspective(
                Deg(self.fov),
                self.aspect_ratio,
                self.near_plane,
                self.far_plane,
            );
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(45.0, 1.0, 0.1, 100.0)
    }
}

/// Per-frame camera data shared with shaders.
///
/// The eye position is stored in homogeneous coordinates to satisfy the
/// 16-byte uniform alignment requirement.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::from_scale(1.0).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn matrices_equal(a: Matrix4<f32>, b: Matrix4<f32>) -> bool {
        (0..4).all(|col| (0..4).all(|row| (a[col][row] - b[col][row]).abs() < EPS))
    }

    #[test]
    fn forward_matches_spherical_formula() {
        let mut camera = Camera::default();
        camera.set_rotation(0.3, 1.2);
        let f = camera.forward();
        assert!((f.x - 0.3f32.cos() * 1.2f32.sin()).abs() < EPS);
        assert!((f.y - 0.3f32.sin()).abs() < EPS);
        assert!((f.z - 0.3f32.cos() * 1.2f32.cos()).abs() < EPS);
    }

    #[test]
    fn zero_rotation_looks_down_positive_z() {
        let camera = Camera::default();
        let f = camera.forward();
        assert!(f.x.abs() < EPS);
        assert!(f.y.abs() < EPS);
        assert!((f.z - 1.0).abs() < EPS);
    }

    #[test]
    fn basis_vectors_are_orthonormal() {
        let mut camera = Camera::default();
        camera.set_rotation(-0.5, 2.3);
        let (f, r, u) = (camera.forward(), camera.right(), camera.up());
        assert!(f.dot(r).abs() < EPS);
        assert!(f.dot(u).abs() < EPS);
        assert!(r.dot(u).abs() < EPS);
        assert!((f.magnitude() - 1.0).abs() < EPS);
    }

    #[test]
    fn projection_setters_recompute_projection() {
        let mut camera = Camera::new(45.0, 1.5, 0.1, 100.0);
        let before = camera.projection_matrix();

        camera.set_fov(60.0);
        assert!(!matrices_equal(before, camera.projection_matrix()));

        let before = camera.projection_matrix();
        camera.set_aspect_ratio(2.0);
        assert!(!matrices_equal(before, camera.projection_matrix()));

        let before = camera.projection_matrix();
        camera.set_clip_planes(0.5, 50.0);
        assert!(!matrices_equal(before, camera.projection_matrix()));
    }

    #[test]
    fn view_setters_do_not_touch_projection() {
        let mut camera = Camera::default();
        let projection = camera.projection_matrix();
        camera.set_position(Vector3::new(4.0, 5.0, 6.0));
        camera.set_rotation(0.2, -0.9);
        camera.move_forward(3.0);
        assert!(matrices_equal(projection, camera.projection_matrix()));
    }

    #[test]
    fn position_setter_recomputes_view() {
        let mut camera = Camera::default();
        let before = camera.view_matrix();
        camera.set_position(Vector3::new(0.0, 0.0, -5.0));
        assert!(!matrices_equal(before, camera.view_matrix()));
    }

    #[test]
    fn view_projection_is_projection_times_view() {
        let mut camera = Camera::new(60.0, 1.3, 0.1, 200.0);
        camera.set_position(Vector3::new(1.0, 2.0, 3.0));
        camera.set_rotation(0.1, 0.4);
        let expected = camera.projection_matrix() * camera.view_matrix();
        assert!(matrices_equal(expected, camera.view_projection_matrix()));
    }
}
