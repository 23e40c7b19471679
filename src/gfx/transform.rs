//! Object transform: position, rotation, scale

use cgmath::{Deg, Matrix4, Rad, Vector3};

/// Position, rotation and scale of a scene object.
///
/// Rotation is stored as Euler angles in radians. The model matrix applies
/// scale, then rotation (X, Y, Z order), then translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    /// Euler angles in radians
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn new(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_rotation(position: Vector3<f32>, rotation: Vector3<f32>) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Builds the model matrix: `T * Rx * Ry * Rz * S`
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_z(Rad(self.rotation.z))
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Sets the rotation from Euler angles in degrees
    pub fn set_rotation_degrees(&mut self, degrees: Vector3<f32>) {
        self.rotation = Vector3::new(
            Rad::from(Deg(degrees.x)).0,
            Rad::from(Deg(degrees.y)).0,
            Rad::from(Deg(degrees.z)).0,
        );
    }

    /// Returns the rotation as Euler angles in degrees
    pub fn rotation_degrees(&self) -> Vector3<f32> {
        Vector3::new(
            Deg::from(Rad(self.rotation.x)).0,
            Deg::from(Rad(self.rotation.y)).0,
            Deg::from(Rad(self.rotation.z)).0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{SquareMatrix, Vector4};

    const EPS: f32 = 1e-5;

    #[test]
    fn default_is_identity() {
        let t = Transform::default();
        let m = t.model_matrix();
        let identity = Matrix4::<f32>::identity();
        for col in 0..4 {
            for row in 0..4 {
                assert!((m[col][row] - identity[col][row]).abs() < EPS);
            }
        }
    }

    #[test]
    fn rotation_degrees_round_trips() {
        let mut t = Transform::default();
        t.set_rotation_degrees(Vector3::new(30.0, -45.0, 120.5));
        let before = t.rotation;
        let degrees = t.rotation_degrees();
        t.set_rotation_degrees(degrees);
        assert!((t.rotation.x - before.x).abs() < EPS);
        assert!((t.rotation.y - before.y).abs() < EPS);
        assert!((t.rotation.z - before.z).abs() < EPS);
    }

    #[test]
    fn translation_lands_in_last_column() {
        let t = Transform::new(Vector3::new(1.0, 2.0, 3.0));
        let m = t.model_matrix();
        assert!((m[3][0] - 1.0).abs() < EPS);
        assert!((m[3][1] - 2.0).abs() < EPS);
        assert!((m[3][2] - 3.0).abs() < EPS);
    }

    #[test]
    fn scale_applies_before_rotation() {
        // Rotating 90 degrees about Y maps +X to -Z; with scale 2 the
        // transformed X basis vector must have length 2 along -Z.
        let mut t = Transform::default();
        t.scale = Vector3::new(2.0, 1.0, 1.0);
        t.rotation = Vector3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0);
        let v = t.model_matrix() * Vector4::new(1.0, 0.0, 0.0, 0.0);
        assert!(v.x.abs() < EPS);
        assert!(v.y.abs() < EPS);
        assert!((v.z + 2.0).abs() < EPS);
    }

    #[test]
    fn rotation_order_is_x_then_y_then_z() {
        let mut t = Transform::default();
        t.rotation = Vector3::new(0.3, 0.7, -0.2);
        let expected = Matrix4::from_angle_x(Rad(0.3))
            * Matrix4::from_angle_y(Rad(0.7))
            * Matrix4::from_angle_z(Rad(-0.2));
        let m = t.model_matrix();
        for col in 0..4 {
            for row in 0..4 {
                assert!((m[col][row] - expected[col][row]).abs() < EPS);
            }
        }
    }
}
