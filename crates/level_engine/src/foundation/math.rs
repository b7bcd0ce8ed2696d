//! Math utilities and types
//!
//! Provides fundamental math types for the level model and render-data
//! generation, built on nalgebra.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Scale / rotate / translate triple used for entity and node transforms.
///
/// Composition order when converted to a matrix is translate * rotate * scale,
/// i.e. scale is applied first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Per-axis scale factors
    pub scale: Vec3,

    /// Rotation quaternion
    pub rotate: Quat,

    /// Translation in world units
    pub translate: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: Vec3::new(1.0, 1.0, 1.0),
            rotate: Quat::identity(),
            translate: Vec3::zeros(),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only a translation
    pub fn from_translation(translate: Vec3) -> Self {
        Self {
            translate,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.translate)
            * self.rotate.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Build a rotation quaternion from an x/y/z/w component array.
pub fn quat_from_xyzw(q: [f32; 4]) -> Quat {
    Unit::new_normalize(Quaternion::new(q[3], q[0], q[1], q[2]))
}

/// Extract the x/y/z/w components of a rotation quaternion.
pub fn quat_to_xyzw(q: &Quat) -> [f32; 4] {
    [q.i, q.j, q.k, q.w]
}

/// Spherical interpolation that stays defined for near-opposite rotations.
pub fn quat_slerp(a: &Quat, b: &Quat, t: f32) -> Quat {
    a.try_slerp(b, t, 1.0e-6).unwrap_or(*b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn transform_matrix_applies_scale_before_translation() {
        let transform = Transform {
            scale: Vec3::new(2.0, 2.0, 2.0),
            rotate: Quat::identity(),
            translate: Vec3::new(1.0, 0.0, 0.0),
        };
        let p = transform.to_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 3.0, epsilon = 1.0e-6);
    }

    #[test]
    fn quat_xyzw_round_trip() {
        let q = quat_from_xyzw([0.0, 0.382_683_43, 0.0, 0.923_879_5]);
        let xyzw = quat_to_xyzw(&q);
        assert_relative_eq!(xyzw[1], 0.382_683_43, epsilon = 1.0e-6);
        assert_relative_eq!(xyzw[3], 0.923_879_5, epsilon = 1.0e-6);
    }

    #[test]
    fn slerp_midpoint_of_quarter_turn() {
        let a = Quat::identity();
        let b = Quat::from_axis_angle(&Vector3::y_axis(), std::f32::consts::FRAC_PI_2);
        let mid = quat_slerp(&a, &b, 0.5);
        assert_relative_eq!(mid.angle(), std::f32::consts::FRAC_PI_4, epsilon = 1.0e-5);
    }
}
