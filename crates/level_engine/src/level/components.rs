//! Entity component types
//!
//! Components are stored in dense per-kind arrays ordered by entity index;
//! the [`ComponentFlags`](ComponentFlags) bitset on each entity records which
//! arrays hold an element for it.

use bitflags::bitflags;

use crate::foundation::math::{Transform, Vec3};
use crate::physics::{CollisionObjectHandle, RigidBodyHandle, ShapeDesc};

bitflags! {
    /// Which components an entity carries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ComponentFlags: u32 {
        /// Entity has a [`ModelComponent`]
        const MODEL = 1;
        /// Entity has a [`CollisionComponent`]
        const COLLISION = 1 << 1;
        /// Entity has a [`PhysicsComponent`]
        const PHYSICS = 1 << 2;
        /// Entity has a [`LightComponent`]
        const LIGHT = 1 << 3;
        /// Entity has a [`TerrainComponent`]
        const TERRAIN = 1 << 4;
    }
}

/// Per-entity identity data.
#[derive(Debug, Clone, Default)]
pub struct EntityInfo {
    /// Entity name; the player entity is found by name lookup
    pub name: String,
}

/// Renders a model asset at the entity transform.
#[derive(Debug, Clone)]
pub struct ModelComponent {
    /// Model asset index, `None` while the asset is unresolved
    pub model_index: Option<usize>,
    /// Adjustment applied between the entity transform and the model root
    pub transform: Transform,
    /// Animation to sample, indexing the model's animation table
    pub animation_index: Option<usize>,
    /// Animation playback position in seconds
    pub animation_time: f32,
    /// Skip this model during render-data generation
    pub hidden: bool,
}

impl Default for ModelComponent {
    fn default() -> Self {
        Self {
            model_index: None,
            transform: Transform::identity(),
            animation_index: None,
            animation_time: 0.0,
            hidden: false,
        }
    }
}

/// Collision geometry attached to the entity.
#[derive(Debug, Clone)]
pub struct CollisionComponent {
    /// Shape used to build the physics-side object
    pub shape: CollisionShape,
    /// Static collision object; present only when the entity has no
    /// [`PhysicsComponent`] (otherwise the shape rides on the rigid body)
    pub object: Option<CollisionObjectHandle>,
}

/// Collision shape selection, serialized with the entity.
#[derive(Debug, Clone)]
pub enum CollisionShape {
    /// Sphere of the given radius
    Sphere {
        /// Sphere radius
        radius: f32,
    },
    /// Capsule aligned to the local Y axis
    Capsule {
        /// Distance between the cap centers
        height: f32,
        /// Cap radius
        radius: f32,
    },
    /// Axis-aligned box
    Box {
        /// Half extents along each axis
        half_extents: Vec3,
    },
    /// Heightfield shared with a terrain asset
    Terrain {
        /// Terrain asset index, `None` while the asset is unresolved
        terrain_index: Option<usize>,
    },
}

impl CollisionShape {
    /// Physics-side shape parameters, when the shape is self-contained.
    /// Terrain shapes reuse the heightfield owned by the terrain asset.
    pub fn to_shape_desc(&self) -> Option<ShapeDesc> {
        match *self {
            Self::Sphere { radius } => Some(ShapeDesc::Sphere { radius }),
            Self::Capsule { height, radius } => Some(ShapeDesc::Capsule { height, radius }),
            Self::Box { half_extents } => Some(ShapeDesc::Box { half_extents }),
            Self::Terrain { .. } => None,
        }
    }
}

/// Dynamics state mirrored into the physics engine.
#[derive(Debug, Clone)]
pub struct PhysicsComponent {
    /// Linear velocity
    pub velocity: Vec3,
    /// Mass in kilograms; zero makes the body static
    pub mass: f32,
    /// Speed clamp applied by gameplay systems
    pub max_speed: f32,
    /// Rigid body handle, created when the component is committed or loaded
    pub body: Option<RigidBodyHandle>,
}

impl Default for PhysicsComponent {
    fn default() -> Self {
        Self {
            velocity: Vec3::zeros(),
            mass: 0.0,
            max_speed: 0.0,
            body: None,
        }
    }
}

/// Light source carried by the entity.
///
/// Render-data generation resolves one light of each kind per frame,
/// last entity wins.
#[derive(Debug, Clone)]
pub enum LightComponent {
    /// Unattenuated base lighting
    Ambient {
        /// Light color
        color: Vec3,
    },
    /// Infinitely distant light; also drives the shadow map
    Directional {
        /// Light color
        color: Vec3,
        /// Direction the light travels
        direction: Vec3,
    },
    /// Positional light with distance attenuation
    Point {
        /// Light color
        color: Vec3,
        /// World-space position
        position: Vec3,
        /// Attenuation factor
        attenuation: f32,
    },
}

/// Renders a terrain asset.
#[derive(Debug, Clone)]
pub struct TerrainComponent {
    /// Terrain asset index, `None` while the asset is unresolved
    pub terrain_index: Option<usize>,
    /// Placement of the terrain patch
    pub transform: Transform,
}

impl Default for TerrainComponent {
    fn default() -> Self {
        Self {
            terrain_index: None,
            transform: Transform::identity(),
        }
    }
}
