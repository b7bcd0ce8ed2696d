//! Physics engine collaborator interface
//!
//! The level never looks inside the physics engine; it only creates and
//! destroys shapes, rigid bodies and static collision objects through the
//! [`PhysicsWorld`] trait and stores the returned opaque handles inside
//! components. Handle lifetime mirrors component lifetime exactly: the
//! serializer creates handles on load and the commit step destroys them when
//! the owning component or entity is removed.

use std::sync::Arc;

use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::{Transform, Vec3};

new_key_type! {
    /// Opaque handle to a collision shape
    pub struct ShapeHandle;

    /// Opaque handle to a rigid body
    pub struct RigidBodyHandle;

    /// Opaque handle to a static (mass-less) collision object
    pub struct CollisionObjectHandle;
}

/// Shape construction parameters.
#[derive(Debug, Clone)]
pub enum ShapeDesc {
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
    /// Square heightfield built from raw terrain height samples
    Heightfield {
        /// Samples per side
        resolution: u32,
        /// World-space distance between adjacent samples
        row_scale: f32,
        /// World-space height corresponding to the maximum sample value
        height_scale: f32,
        /// Raw signed 16-bit height samples, row major
        samples: Arc<[i16]>,
    },
}

/// Rigid body construction parameters.
#[derive(Debug, Clone)]
pub struct RigidBodyDesc {
    /// Body mass in kilograms; zero makes the body static
    pub mass: f32,
    /// Initial world transform
    pub transform: Transform,
    /// Initial linear velocity
    pub velocity: Vec3,
    /// Shape attached at creation, if any
    pub shape: Option<ShapeHandle>,
}

/// External physics engine surface consumed by the level.
pub trait PhysicsWorld {
    /// Construct a collision shape and return its handle
    fn create_shape(&mut self, desc: ShapeDesc) -> ShapeHandle;

    /// Construct a rigid body, optionally with a shape already attached
    fn create_rigid_body(&mut self, desc: RigidBodyDesc) -> RigidBodyHandle;

    /// Construct a static collision object with the given shape
    fn create_collision_object(
        &mut self,
        transform: &Transform,
        shape: ShapeHandle,
    ) -> CollisionObjectHandle;

    /// Destroy a rigid body; its handle must not be reused afterwards
    fn destroy_rigid_body(&mut self, handle: RigidBodyHandle);

    /// Destroy a static collision object
    fn destroy_collision_object(&mut self, handle: CollisionObjectHandle);
}

/// Book-keeping implementation of [`PhysicsWorld`].
///
/// Stores the descriptors it is given and nothing else. Used by the editor for
/// authoring-time queries and by tests to observe handle lifetimes; a real
/// simulation backend implements the same trait.
#[derive(Default)]
pub struct BasicPhysicsWorld {
    shapes: SlotMap<ShapeHandle, ShapeDesc>,
    bodies: SlotMap<RigidBodyHandle, RigidBodyDesc>,
    objects: SlotMap<CollisionObjectHandle, (Transform, ShapeHandle)>,
}

impl BasicPhysicsWorld {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live rigid bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of live static collision objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Look up a rigid body descriptor
    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBodyDesc> {
        self.bodies.get(handle)
    }

    /// Look up a shape descriptor
    pub fn shape(&self, handle: ShapeHandle) -> Option<&ShapeDesc> {
        self.shapes.get(handle)
    }
}

impl PhysicsWorld for BasicPhysicsWorld {
    fn create_shape(&mut self, desc: ShapeDesc) -> ShapeHandle {
        self.shapes.insert(desc)
    }

    fn create_rigid_body(&mut self, desc: RigidBodyDesc) -> RigidBodyHandle {
        self.bodies.insert(desc)
    }

    fn create_collision_object(
        &mut self,
        transform: &Transform,
        shape: ShapeHandle,
    ) -> CollisionObjectHandle {
        self.objects.insert((*transform, shape))
    }

    fn destroy_rigid_body(&mut self, handle: RigidBodyHandle) {
        if self.bodies.remove(handle).is_none() {
            log::warn!("destroy_rigid_body called with a dead handle");
        }
    }

    fn destroy_collision_object(&mut self, handle: CollisionObjectHandle) {
        if self.objects.remove(handle).is_none() {
            log::warn!("destroy_collision_object called with a dead handle");
        }
    }
}
