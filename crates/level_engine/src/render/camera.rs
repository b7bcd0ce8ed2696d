//! View and projection math

use nalgebra::{Matrix4, Orthographic3, Perspective3};

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Depth range and Y flip correction applied after the GL-convention
/// projections nalgebra produces.
#[rustfmt::skip]
fn clip_correction() -> Mat4 {
    Matrix4::new(
        1.0,  0.0, 0.0, 0.0,
        0.0, -1.0, 0.0, 0.0,
        0.0,  0.0, 0.5, 0.5,
        0.0,  0.0, 0.0, 1.0,
    )
}

/// Perspective camera state consumed by render-data generation.
#[derive(Debug, Clone)]
pub struct Camera {
    /// World-space eye position
    pub position: Vec3,
    /// View matrix (world to eye)
    pub view: Mat4,
    /// Vertical field of view in radians
    pub fovy: f32,
    /// Viewport aspect ratio, width over height
    pub aspect: f32,
    /// Near clip distance
    pub znear: f32,
    /// Far clip distance
    pub zfar: f32,
}

impl Camera {
    /// Camera at `position` looking at `target`, Y up.
    pub fn look_at(position: Vec3, target: Vec3, aspect: f32) -> Self {
        Self {
            position,
            view: Matrix4::look_at_rh(&Point3::from(position), &Point3::from(target), &Vec3::y()),
            fovy: 50.0f32.to_radians(),
            aspect,
            znear: 0.1,
            zfar: 1000.0,
        }
    }

    /// Clip-corrected projection matrix.
    pub fn projection(&self) -> Mat4 {
        clip_correction()
            * Perspective3::new(self.aspect, self.fovy, self.znear, self.zfar).to_homogeneous()
    }

    /// Clip-corrected view-projection matrix.
    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view
    }
}

/// Shadow map extent on each side of the origin
const SHADOW_EXTENT: f32 = 50.0;

/// Shadow map far clip distance
const SHADOW_ZFAR: f32 = 100.0;

/// Orthographic view-projection for the shadow pass, looking along the
/// directional light towards the origin.
pub fn shadow_map_projection(light_direction: &Vec3) -> Mat4 {
    let direction = light_direction
        .try_normalize(1.0e-6)
        .unwrap_or_else(|| Vec3::new(0.0, -1.0, 0.0));
    let eye = Point3::from(-direction * SHADOW_EXTENT);
    let up = if direction.x.abs() < 1.0e-4 && direction.z.abs() < 1.0e-4 {
        Vec3::x()
    } else {
        Vec3::y()
    };
    let view = Matrix4::look_at_rh(&eye, &Point3::origin(), &up);
    let projection = Orthographic3::new(
        -SHADOW_EXTENT,
        SHADOW_EXTENT,
        -SHADOW_EXTENT,
        SHADOW_EXTENT,
        0.1,
        SHADOW_ZFAR,
    );
    clip_correction() * projection.to_homogeneous() * view
}
