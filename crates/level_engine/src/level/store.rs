//! Entity storage
//!
//! Entities live in a structure-of-arrays buffer: parallel arrays of flags,
//! infos and transforms indexed by entity, plus one dense packed array per
//! component kind holding elements in entity order. An entity's element sits
//! at its rank: the number of lower-indexed entities carrying the same flag.
//!
//! Storage is double buffered. Reads and queued edits target the active
//! buffer; [`commit`](super::edits) rebuilds the inactive buffer and flips,
//! so entity indices and ranks are stable between commits.

use super::components::{
    CollisionComponent, ComponentFlags, EntityInfo, LightComponent, ModelComponent,
    PhysicsComponent, TerrainComponent,
};
use super::edits::{EntityAddition, EntityModification};
use crate::config::LevelConfig;
use crate::foundation::math::Transform;

/// One generation of entity storage.
#[derive(Default)]
pub(super) struct EntityBuffer {
    pub(super) flags: Vec<ComponentFlags>,
    pub(super) infos: Vec<EntityInfo>,
    pub(super) transforms: Vec<Transform>,
    pub(super) models: Vec<ModelComponent>,
    pub(super) collisions: Vec<CollisionComponent>,
    pub(super) physics: Vec<PhysicsComponent>,
    pub(super) lights: Vec<LightComponent>,
    pub(super) terrains: Vec<TerrainComponent>,
}

impl EntityBuffer {
    pub(super) fn clear(&mut self) {
        self.flags.clear();
        self.infos.clear();
        self.transforms.clear();
        self.models.clear();
        self.collisions.clear();
        self.physics.clear();
        self.lights.clear();
        self.terrains.clear();
    }
}

/// Double-buffered entity storage plus the queued edits for the next commit.
pub struct EntityStore {
    pub(super) buffers: [EntityBuffer; 2],
    pub(super) active: usize,
    pub(super) modifications: Vec<EntityModification>,
    pub(super) additions: Vec<EntityAddition>,
    pub(super) max_entity_count: usize,
}

impl EntityStore {
    /// Create empty storage with the configured entity bound.
    pub fn new(config: &LevelConfig) -> Self {
        Self {
            buffers: [EntityBuffer::default(), EntityBuffer::default()],
            active: 0,
            modifications: Vec::new(),
            additions: Vec::new(),
            max_entity_count: config.max_entity_count,
        }
    }

    pub(super) fn active_buffer(&self) -> &EntityBuffer {
        &self.buffers[self.active]
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.active_buffer().flags.len()
    }

    /// Upper bound on live entities, including queued additions.
    pub fn max_entity_count(&self) -> usize {
        self.max_entity_count
    }

    /// Component flags of an entity.
    pub fn flags(&self, entity: usize) -> ComponentFlags {
        self.active_buffer().flags[entity]
    }

    /// Identity data of an entity.
    pub fn info(&self, entity: usize) -> &EntityInfo {
        &self.active_buffer().infos[entity]
    }

    /// World transform of an entity.
    pub fn transform(&self, entity: usize) -> &Transform {
        &self.active_buffer().transforms[entity]
    }

    /// Rank of an entity within one packed component array: the number of
    /// lower-indexed entities carrying `flag`. The entity must carry `flag`.
    pub fn component_rank(&self, entity: usize, flag: ComponentFlags) -> usize {
        let flags = &self.active_buffer().flags;
        assert!(
            flags[entity].contains(flag),
            "entity {entity} has no {flag:?} component"
        );
        flags[..entity].iter().filter(|f| f.contains(flag)).count()
    }

    /// Entity whose component sits at `rank` in the packed array for `flag`.
    pub fn entity_of_component(&self, flag: ComponentFlags, rank: usize) -> usize {
        let mut remaining = rank;
        for (entity, flags) in self.active_buffer().flags.iter().enumerate() {
            if flags.contains(flag) {
                if remaining == 0 {
                    return entity;
                }
                remaining -= 1;
            }
        }
        panic!("no entity holds {flag:?} component at rank {rank}");
    }

    /// Model component of an entity; the entity must carry one.
    pub fn model_component(&self, entity: usize) -> &ModelComponent {
        let rank = self.component_rank(entity, ComponentFlags::MODEL);
        &self.active_buffer().models[rank]
    }

    /// Collision component of an entity; the entity must carry one.
    pub fn collision_component(&self, entity: usize) -> &CollisionComponent {
        let rank = self.component_rank(entity, ComponentFlags::COLLISION);
        &self.active_buffer().collisions[rank]
    }

    /// Physics component of an entity; the entity must carry one.
    pub fn physics_component(&self, entity: usize) -> &PhysicsComponent {
        let rank = self.component_rank(entity, ComponentFlags::PHYSICS);
        &self.active_buffer().physics[rank]
    }

    /// Light component of an entity; the entity must carry one.
    pub fn light_component(&self, entity: usize) -> &LightComponent {
        let rank = self.component_rank(entity, ComponentFlags::LIGHT);
        &self.active_buffer().lights[rank]
    }

    /// Terrain component of an entity; the entity must carry one.
    pub fn terrain_component(&self, entity: usize) -> &TerrainComponent {
        let rank = self.component_rank(entity, ComponentFlags::TERRAIN);
        &self.active_buffer().terrains[rank]
    }

    /// Number of entities carrying a model component.
    pub fn model_count(&self) -> usize {
        self.active_buffer().models.len()
    }

    /// Number of entities carrying a collision component.
    pub fn collision_count(&self) -> usize {
        self.active_buffer().collisions.len()
    }

    /// Number of entities carrying a physics component.
    pub fn physics_count(&self) -> usize {
        self.active_buffer().physics.len()
    }

    /// Number of entities carrying a light component.
    pub fn light_count(&self) -> usize {
        self.active_buffer().lights.len()
    }

    /// Number of entities carrying a terrain component.
    pub fn terrain_count(&self) -> usize {
        self.active_buffer().terrains.len()
    }

    /// First entity with the given name.
    pub fn find_entity(&self, name: &str) -> Option<usize> {
        self.active_buffer().infos.iter().position(|info| info.name == name)
    }

    /// Queued modification record for an entity, applied at the next commit.
    pub fn modification(&mut self, entity: usize) -> &mut EntityModification {
        &mut self.modifications[entity]
    }

    /// Queue a new entity, appended after the survivors at the next commit.
    pub fn queue_addition(&mut self, addition: EntityAddition) {
        assert!(
            self.entity_count() + self.additions.len() < self.max_entity_count,
            "entity capacity {} exceeded",
            self.max_entity_count
        );
        self.additions.push(addition);
    }

    /// Queued addition count.
    pub fn pending_addition_count(&self) -> usize {
        self.additions.len()
    }

    /// Packed-array length must equal the flag population, per kind.
    #[cfg(test)]
    pub(super) fn check_packed_invariant(&self) {
        let buffer = self.active_buffer();
        let population = |flag: ComponentFlags| {
            buffer.flags.iter().filter(|f| f.contains(flag)).count()
        };
        assert_eq!(buffer.models.len(), population(ComponentFlags::MODEL));
        assert_eq!(buffer.collisions.len(), population(ComponentFlags::COLLISION));
        assert_eq!(buffer.physics.len(), population(ComponentFlags::PHYSICS));
        assert_eq!(buffer.lights.len(), population(ComponentFlags::LIGHT));
        assert_eq!(buffer.terrains.len(), population(ComponentFlags::TERRAIN));
        assert_eq!(buffer.infos.len(), buffer.flags.len());
        assert_eq!(buffer.transforms.len(), buffer.flags.len());
        assert_eq!(self.modifications.len(), buffer.flags.len());
    }
}

#[cfg(test)]
mod tests {
    use super::super::edits::EntityAddition;
    use super::*;
    use crate::foundation::math::Vec3;

    fn store_with_lights() -> EntityStore {
        // entities 0..5; lights on 0, 2 and 4
        let mut store = EntityStore::new(&LevelConfig::default());
        for entity in 0..5 {
            let mut addition = EntityAddition::named(&format!("e{entity}"));
            if entity % 2 == 0 {
                addition.light = Some(LightComponent::Ambient {
                    color: Vec3::new(entity as f32, 0.0, 0.0),
                });
            }
            store.queue_addition(addition);
        }
        let mut physics = crate::physics::BasicPhysicsWorld::new();
        store.commit(&mut physics);
        store
    }

    #[test]
    fn rank_counts_preceding_entities_with_flag() {
        let store = store_with_lights();
        assert_eq!(store.component_rank(0, ComponentFlags::LIGHT), 0);
        assert_eq!(store.component_rank(2, ComponentFlags::LIGHT), 1);
        assert_eq!(store.component_rank(4, ComponentFlags::LIGHT), 2);
        assert_eq!(store.light_count(), 3);
    }

    #[test]
    fn reverse_lookup_inverts_rank() {
        let store = store_with_lights();
        assert_eq!(store.entity_of_component(ComponentFlags::LIGHT, 0), 0);
        assert_eq!(store.entity_of_component(ComponentFlags::LIGHT, 1), 2);
        assert_eq!(store.entity_of_component(ComponentFlags::LIGHT, 2), 4);
    }

    #[test]
    #[should_panic(expected = "has no")]
    fn component_access_without_flag_panics() {
        let store = store_with_lights();
        store.light_component(1);
    }

    #[test]
    fn find_entity_matches_by_name() {
        let store = store_with_lights();
        assert_eq!(store.find_entity("e3"), Some(3));
        assert_eq!(store.find_entity("missing"), None);
    }

    #[test]
    #[should_panic(expected = "capacity")]
    fn addition_past_capacity_panics() {
        let config = LevelConfig {
            max_entity_count: 1,
            ..LevelConfig::default()
        };
        let mut store = EntityStore::new(&config);
        store.queue_addition(EntityAddition::named("a"));
        store.queue_addition(EntityAddition::named("b"));
    }
}
