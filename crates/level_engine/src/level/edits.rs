//! Queued entity edits and the commit step
//!
//! Edits never touch live storage directly. Each live entity owns one
//! [`EntityModification`] record and new entities queue as
//! [`EntityAddition`]s; [`EntityStore::commit`] applies everything at once by
//! rebuilding the inactive buffer, so readers in the same frame always see a
//! consistent pre-edit view.

use super::components::{
    CollisionComponent, ComponentFlags, EntityInfo, LightComponent, ModelComponent,
    PhysicsComponent, TerrainComponent,
};
use super::store::{EntityBuffer, EntityStore};
use crate::foundation::math::Transform;
use crate::physics::PhysicsWorld;

/// Pending edits for one live entity, applied at the next commit.
///
/// A supplied component replaces the existing one, granting the flag if the
/// entity did not carry it. Supplying both a replacement and the matching
/// remove flag is contradictory; removal wins.
#[derive(Debug, Clone, Default)]
pub struct EntityModification {
    /// Remove the whole entity; per-component edits are then ignored
    pub remove: bool,
    /// Replacement identity data
    pub info: Option<EntityInfo>,
    /// Replacement world transform
    pub transform: Option<Transform>,
    /// Replacement model component
    pub model: Option<ModelComponent>,
    /// Remove the model component
    pub remove_model: bool,
    /// Replacement collision component
    pub collision: Option<CollisionComponent>,
    /// Remove the collision component
    pub remove_collision: bool,
    /// Replacement physics component
    pub physics: Option<PhysicsComponent>,
    /// Remove the physics component
    pub remove_physics: bool,
    /// Replacement light component
    pub light: Option<LightComponent>,
    /// Remove the light component
    pub remove_light: bool,
    /// Replacement terrain component
    pub terrain: Option<TerrainComponent>,
    /// Remove the terrain component
    pub remove_terrain: bool,
}

/// A new entity, queued until the next commit.
#[derive(Debug, Clone, Default)]
pub struct EntityAddition {
    /// Identity data
    pub info: EntityInfo,
    /// World transform
    pub transform: Transform,
    /// Model component, if the entity starts with one
    pub model: Option<ModelComponent>,
    /// Collision component, if the entity starts with one
    pub collision: Option<CollisionComponent>,
    /// Physics component, if the entity starts with one
    pub physics: Option<PhysicsComponent>,
    /// Light component, if the entity starts with one
    pub light: Option<LightComponent>,
    /// Terrain component, if the entity starts with one
    pub terrain: Option<TerrainComponent>,
}

impl EntityAddition {
    /// Component-less entity with the given name.
    pub fn named(name: &str) -> Self {
        Self {
            info: EntityInfo {
                name: name.to_owned(),
            },
            ..Self::default()
        }
    }
}

fn resolve<T>(replacement: Option<T>, remove: bool, old: Option<T>, kind: &str) -> Option<T> {
    if remove {
        if replacement.is_some() {
            log::warn!("{kind} component has both a replacement and a removal queued; removing");
        }
        None
    } else {
        replacement.or(old)
    }
}

impl EntityStore {
    /// Survivor count after applying the queued edits.
    fn predicted_entity_count(&self) -> usize {
        let removals = self.modifications.iter().filter(|m| m.remove).count();
        self.entity_count() - removals + self.additions.len()
    }

    /// Apply every queued modification and addition.
    ///
    /// The inactive buffer is rebuilt from the active one: surviving entities
    /// carry forward in order with their edits applied, then queued additions
    /// append in queue order. Physics handles owned by removed or replaced
    /// components are destroyed here; this is the only place that does so.
    pub fn commit(&mut self, physics: &mut dyn PhysicsWorld) {
        let predicted = self.predicted_entity_count();
        assert!(
            predicted <= self.max_entity_count,
            "entity capacity {} exceeded",
            self.max_entity_count
        );

        let inactive = 1 - self.active;
        let mut next = std::mem::take(&mut self.buffers[inactive]);
        next.clear();
        next.flags.reserve(predicted);
        next.infos.reserve(predicted);
        next.transforms.reserve(predicted);

        let mut modifications = std::mem::take(&mut self.modifications);
        carry_forward(
            &self.buffers[self.active],
            modifications.drain(..),
            &mut next,
            physics,
        );

        for addition in std::mem::take(&mut self.additions) {
            let mut flags = ComponentFlags::empty();
            next.infos.push(addition.info);
            next.transforms.push(addition.transform);
            if let Some(model) = addition.model {
                flags |= ComponentFlags::MODEL;
                next.models.push(model);
            }
            if let Some(collision) = addition.collision {
                flags |= ComponentFlags::COLLISION;
                next.collisions.push(collision);
            }
            if let Some(physics_component) = addition.physics {
                flags |= ComponentFlags::PHYSICS;
                next.physics.push(physics_component);
            }
            if let Some(light) = addition.light {
                flags |= ComponentFlags::LIGHT;
                next.lights.push(light);
            }
            if let Some(terrain) = addition.terrain {
                flags |= ComponentFlags::TERRAIN;
                next.terrains.push(terrain);
            }
            next.flags.push(flags);
        }

        self.buffers[inactive] = next;
        self.active = inactive;

        modifications.resize_with(self.entity_count(), EntityModification::default);
        self.modifications = modifications;
    }
}

fn carry_forward(
    current: &EntityBuffer,
    modifications: impl Iterator<Item = EntityModification>,
    next: &mut EntityBuffer,
    physics: &mut dyn PhysicsWorld,
) {
    let mut model_cursor = 0;
    let mut collision_cursor = 0;
    let mut physics_cursor = 0;
    let mut light_cursor = 0;
    let mut terrain_cursor = 0;

    for (entity, edit) in modifications.enumerate() {
        let flags = current.flags[entity];
        let old_model = flags.contains(ComponentFlags::MODEL).then(|| {
            model_cursor += 1;
            current.models[model_cursor - 1].clone()
        });
        let old_collision = flags.contains(ComponentFlags::COLLISION).then(|| {
            collision_cursor += 1;
            current.collisions[collision_cursor - 1].clone()
        });
        let old_physics = flags.contains(ComponentFlags::PHYSICS).then(|| {
            physics_cursor += 1;
            current.physics[physics_cursor - 1].clone()
        });
        let old_light = flags.contains(ComponentFlags::LIGHT).then(|| {
            light_cursor += 1;
            current.lights[light_cursor - 1].clone()
        });
        let old_terrain = flags.contains(ComponentFlags::TERRAIN).then(|| {
            terrain_cursor += 1;
            current.terrains[terrain_cursor - 1].clone()
        });

        if edit.remove {
            if let Some(handle) = old_collision.as_ref().and_then(|c| c.object) {
                physics.destroy_collision_object(handle);
            }
            if let Some(handle) = old_physics.as_ref().and_then(|p| p.body) {
                physics.destroy_rigid_body(handle);
            }
            continue;
        }

        next.infos.push(match edit.info {
            Some(info) => info,
            None => current.infos[entity].clone(),
        });
        next.transforms
            .push(edit.transform.unwrap_or(current.transforms[entity]));

        let mut new_flags = ComponentFlags::empty();

        let old_object = old_collision.as_ref().and_then(|c| c.object);
        let kept = resolve(edit.collision, edit.remove_collision, old_collision, "collision");
        if let Some(handle) = old_object {
            if kept.as_ref().and_then(|c| c.object) != Some(handle) {
                physics.destroy_collision_object(handle);
            }
        }
        if let Some(collision) = kept {
            new_flags |= ComponentFlags::COLLISION;
            next.collisions.push(collision);
        }

        let old_body = old_physics.as_ref().and_then(|p| p.body);
        let kept = resolve(edit.physics, edit.remove_physics, old_physics, "physics");
        if let Some(handle) = old_body {
            if kept.as_ref().and_then(|p| p.body) != Some(handle) {
                physics.destroy_rigid_body(handle);
            }
        }
        if let Some(physics_component) = kept {
            new_flags |= ComponentFlags::PHYSICS;
            next.physics.push(physics_component);
        }

        if let Some(model) = resolve(edit.model, edit.remove_model, old_model, "model") {
            new_flags |= ComponentFlags::MODEL;
            next.models.push(model);
        }
        if let Some(light) = resolve(edit.light, edit.remove_light, old_light, "light") {
            new_flags |= ComponentFlags::LIGHT;
            next.lights.push(light);
        }
        if let Some(terrain) = resolve(edit.terrain, edit.remove_terrain, old_terrain, "terrain") {
            new_flags |= ComponentFlags::TERRAIN;
            next.terrains.push(terrain);
        }

        next.flags.push(new_flags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LevelConfig;
    use crate::foundation::math::Vec3;
    use crate::physics::{BasicPhysicsWorld, RigidBodyDesc, ShapeDesc};

    fn named_entities(names: &[&str]) -> (EntityStore, BasicPhysicsWorld) {
        let mut store = EntityStore::new(&LevelConfig::default());
        let mut physics = BasicPhysicsWorld::new();
        for name in names {
            store.queue_addition(EntityAddition::named(name));
        }
        store.commit(&mut physics);
        (store, physics)
    }

    fn names(store: &EntityStore) -> Vec<String> {
        (0..store.entity_count())
            .map(|entity| store.info(entity).name.clone())
            .collect()
    }

    #[test]
    fn additions_append_in_queue_order() {
        let (store, _) = named_entities(&["a", "b", "c"]);
        assert_eq!(names(&store), ["a", "b", "c"]);
        store.check_packed_invariant();
    }

    #[test]
    fn removal_compacts_and_additions_follow_survivors() {
        let (mut store, mut physics) = named_entities(&["a", "b", "c", "d"]);
        store.modification(1).remove = true;
        store.queue_addition(EntityAddition::named("e"));
        store.commit(&mut physics);
        assert_eq!(names(&store), ["a", "c", "d", "e"]);
        store.check_packed_invariant();
    }

    #[test]
    fn empty_commit_changes_nothing() {
        let (mut store, mut physics) = named_entities(&["a", "b"]);
        store.commit(&mut physics);
        store.commit(&mut physics);
        assert_eq!(names(&store), ["a", "b"]);
        store.check_packed_invariant();
    }

    #[test]
    fn supplying_a_component_grants_its_flag() {
        let (mut store, mut physics) = named_entities(&["a"]);
        assert!(store.flags(0).is_empty());
        store.modification(0).light = Some(LightComponent::Ambient {
            color: Vec3::new(1.0, 1.0, 1.0),
        });
        store.commit(&mut physics);
        assert!(store.flags(0).contains(ComponentFlags::LIGHT));
        assert_eq!(store.light_count(), 1);
        store.check_packed_invariant();
    }

    #[test]
    fn removal_wins_over_replacement() {
        let mut store = EntityStore::new(&LevelConfig::default());
        let mut physics = BasicPhysicsWorld::new();
        let mut addition = EntityAddition::named("a");
        addition.light = Some(LightComponent::Ambient {
            color: Vec3::zeros(),
        });
        store.queue_addition(addition);
        store.commit(&mut physics);

        let modification = store.modification(0);
        modification.light = Some(LightComponent::Ambient {
            color: Vec3::new(1.0, 0.0, 0.0),
        });
        modification.remove_light = true;
        store.commit(&mut physics);
        assert!(!store.flags(0).contains(ComponentFlags::LIGHT));
        assert_eq!(store.light_count(), 0);
        store.check_packed_invariant();
    }

    #[test]
    fn removing_an_absent_component_is_a_no_op() {
        let (mut store, mut physics) = named_entities(&["a"]);
        store.modification(0).remove_model = true;
        store.commit(&mut physics);
        assert_eq!(store.entity_count(), 1);
        store.check_packed_invariant();
    }

    #[test]
    fn modified_transform_and_info_apply() {
        let (mut store, mut physics) = named_entities(&["a"]);
        let modification = store.modification(0);
        modification.info = Some(EntityInfo {
            name: "renamed".to_owned(),
        });
        modification.transform = Some(Transform::from_translation(Vec3::new(3.0, 0.0, 0.0)));
        store.commit(&mut physics);
        assert_eq!(store.info(0).name, "renamed");
        assert_eq!(store.transform(0).translate.x, 3.0);
    }

    #[test]
    fn entity_removal_destroys_owned_physics_handles() {
        let mut store = EntityStore::new(&LevelConfig::default());
        let mut physics = BasicPhysicsWorld::new();
        let shape = physics.create_shape(ShapeDesc::Sphere { radius: 1.0 });
        let body = physics.create_rigid_body(RigidBodyDesc {
            mass: 1.0,
            transform: Transform::identity(),
            velocity: Vec3::zeros(),
            shape: Some(shape),
        });
        let object = physics.create_collision_object(&Transform::identity(), shape);

        let mut with_body = EntityAddition::named("dynamic");
        with_body.physics = Some(PhysicsComponent {
            body: Some(body),
            mass: 1.0,
            ..PhysicsComponent::default()
        });
        store.queue_addition(with_body);
        let mut with_object = EntityAddition::named("static");
        with_object.collision = Some(CollisionComponent {
            shape: super::super::components::CollisionShape::Sphere { radius: 1.0 },
            object: Some(object),
        });
        store.queue_addition(with_object);
        store.commit(&mut physics);
        assert_eq!(physics.body_count(), 1);
        assert_eq!(physics.object_count(), 1);

        store.modification(0).remove = true;
        store.modification(1).remove = true;
        store.commit(&mut physics);
        assert_eq!(physics.body_count(), 0);
        assert_eq!(physics.object_count(), 0);
        store.check_packed_invariant();
    }

    #[test]
    fn component_replacement_destroys_the_old_handle() {
        let mut store = EntityStore::new(&LevelConfig::default());
        let mut physics = BasicPhysicsWorld::new();
        let body = physics.create_rigid_body(RigidBodyDesc {
            mass: 1.0,
            transform: Transform::identity(),
            velocity: Vec3::zeros(),
            shape: None,
        });
        let mut addition = EntityAddition::named("dynamic");
        addition.physics = Some(PhysicsComponent {
            body: Some(body),
            mass: 1.0,
            ..PhysicsComponent::default()
        });
        store.queue_addition(addition);
        store.commit(&mut physics);

        store.modification(0).physics = Some(PhysicsComponent::default());
        store.commit(&mut physics);
        assert_eq!(physics.body_count(), 0);
        assert!(store.physics_component(0).body.is_none());
        store.check_packed_invariant();
    }
}
