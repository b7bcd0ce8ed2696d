//! Runtime level model
//!
//! A [`Level`] is the unit the editor operates on: an [`EntityStore`] of live
//! entities, the [`AssetStore`] their components reference, and the identity
//! of the player entity. Levels load from and save to a JSON document; see
//! [`json`](self::json) for the format.

pub mod components;
pub mod edits;
pub mod json;
pub mod store;

use crate::assets::{AssetError, AssetStore};
use crate::config::LevelConfig;
use crate::foundation::math::{Mat4, Vec3};
use crate::physics::PhysicsWorld;
use crate::render::camera::Camera;
use crate::render::gpu::GpuRegions;

pub use components::{
    CollisionComponent, CollisionShape, ComponentFlags, EntityInfo, LightComponent,
    ModelComponent, PhysicsComponent, TerrainComponent,
};
pub use edits::{EntityAddition, EntityModification};
pub use store::EntityStore;

/// Level load/save errors
#[derive(thiserror::Error, Debug)]
pub enum LevelError {
    /// Level file could not be read or written
    #[error("Level file IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Level document is not valid JSON or misses required fields
    #[error("Level parse error: {0}")]
    Parse(String),

    /// Level document could not be serialized
    #[error("Level serialize error: {0}")]
    Serialize(String),

    /// A referenced asset pack failed to load
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// A collision shape references a terrain pack the level never loaded
    #[error("Collision shape references unloaded terrain '{path}'")]
    UnresolvedTerrain {
        /// Offending pack file path
        path: String,
    },
}

/// One editable level: entities, their assets and the player identity.
pub struct Level {
    pub(crate) config: LevelConfig,
    /// Live entities and queued edits
    pub store: EntityStore,
    /// Assets referenced by entity components
    pub assets: AssetStore,
    pub(crate) player_entity: Option<usize>,
    pub(crate) json_path: Option<String>,
}

impl Level {
    /// Create an empty level, registering persistent GPU resources.
    pub fn new(config: LevelConfig, gpu: &mut dyn GpuRegions) -> Self {
        Self {
            store: EntityStore::new(&config),
            assets: AssetStore::new(&config, gpu),
            config,
            player_entity: None,
            json_path: None,
        }
    }

    /// Apply every queued entity edit.
    ///
    /// The player entity is re-resolved by name afterwards, since removals
    /// shift entity indices.
    pub fn commit_entity_edits(&mut self, physics: &mut dyn PhysicsWorld) {
        let player_name = self
            .player_entity
            .map(|entity| self.store.info(entity).name.clone());
        self.store.commit(physics);
        self.player_entity = player_name.and_then(|name| self.store.find_entity(&name));
    }

    /// Capacities and loader settings this level was created with.
    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// Player entity index, if one is set and still alive.
    pub fn player_entity(&self) -> Option<usize> {
        self.player_entity
    }

    /// Select the player entity.
    pub fn set_player_entity(&mut self, entity: Option<usize>) {
        if let Some(entity) = entity {
            assert!(entity < self.store.entity_count(), "player entity out of range");
        }
        self.player_entity = entity;
    }

    /// Path of the document this level was loaded from, if any.
    pub fn json_path(&self) -> Option<&str> {
        self.json_path.as_deref()
    }

    /// Third-person orbit camera around the player entity.
    ///
    /// `radius` is the orbit distance, `theta` the pitch about the X axis and
    /// `phi` the yaw about the Y axis. Without a player the camera orbits the
    /// origin from a fixed high-behind direction.
    pub fn player_camera(&self, radius: f32, theta: f32, phi: f32, aspect: f32) -> Camera {
        match self.player_entity {
            Some(entity) => {
                let target = self.store.transform(entity).translate;
                let pitch = Mat4::from_axis_angle(&Vec3::x_axis(), theta);
                let yaw = Mat4::from_axis_angle(&Vec3::y_axis(), phi);
                let offset = (yaw * pitch).transform_vector(&Vec3::new(0.0, 0.0, -radius));
                Camera::look_at(target + offset, target, aspect)
            }
            None => {
                let position = Vec3::new(0.0, 1.0, -1.0).normalize() * radius;
                Camera::look_at(position, Vec3::zeros(), aspect)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::BasicPhysicsWorld;
    use crate::render::gpu::InMemoryRegions;
    use approx::assert_relative_eq;

    fn level() -> Level {
        let mut gpu = InMemoryRegions::new();
        Level::new(LevelConfig::default(), &mut gpu)
    }

    #[test]
    fn player_survives_commits_by_name() {
        let mut level = level();
        let mut physics = BasicPhysicsWorld::new();
        level.store.queue_addition(EntityAddition::named("prop"));
        level.store.queue_addition(EntityAddition::named("player"));
        level.commit_entity_edits(&mut physics);
        level.set_player_entity(level.store.find_entity("player"));
        assert_eq!(level.player_entity(), Some(1));

        level.store.modification(0).remove = true;
        level.commit_entity_edits(&mut physics);
        assert_eq!(level.player_entity(), Some(0));
    }

    #[test]
    fn camera_without_player_orbits_the_origin() {
        let level = level();
        let camera = level.player_camera(10.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(camera.position.norm(), 10.0, epsilon = 1.0e-4);
        assert!(camera.position.y > 0.0);
        assert!(camera.position.z < 0.0);
    }

    #[test]
    fn camera_orbit_radius_matches_request() {
        let mut level = level();
        let mut physics = BasicPhysicsWorld::new();
        let mut addition = EntityAddition::named("player");
        addition.transform.translate = Vec3::new(5.0, 0.0, 3.0);
        level.store.queue_addition(addition);
        level.commit_entity_edits(&mut physics);
        level.set_player_entity(Some(0));

        let camera = level.player_camera(4.0, 0.3, 1.2, 1.0);
        let target = Vec3::new(5.0, 0.0, 3.0);
        assert_relative_eq!((camera.position - target).norm(), 4.0, epsilon = 1.0e-4);
    }
}
