//! Level document format
//!
//! Levels serialize to a JSON document: asset pack path lists, an entity
//! array and the player selection. Paths are the asset identity, so the
//! document references assets by pack file and the loader resolves them back
//! to indices. Read and write both expose a raw-document hook so embedding
//! tools can piggyback their own sections on the same file.

use serde::{Deserialize, Serialize};

use super::components::{
    CollisionComponent, CollisionShape, ComponentFlags, EntityInfo, LightComponent,
    ModelComponent, PhysicsComponent, TerrainComponent,
};
use super::edits::EntityAddition;
use super::{Level, LevelError};
use crate::foundation::math::{quat_from_xyzw, quat_to_xyzw, Transform, Vec3};
use crate::physics::{PhysicsWorld, RigidBodyDesc, ShapeHandle};
use crate::render::gpu::GpuRegions;

#[derive(Serialize, Deserialize, Default)]
struct LevelDoc {
    #[serde(default)]
    models: Vec<String>,
    #[serde(default)]
    skyboxes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    skybox_index: Option<usize>,
    #[serde(default)]
    terrains: Vec<String>,
    #[serde(default)]
    entities: Vec<EntityDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    player: Option<PlayerDoc>,
}

#[derive(Serialize, Deserialize)]
struct EntityDoc {
    name: String,
    #[serde(default)]
    transform: TransformDoc,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model_component: Option<ModelDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    collision_component: Option<CollisionDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    physics_component: Option<PhysicsDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    light_component: Option<LightDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    terrain_component: Option<TerrainDoc>,
}

#[derive(Serialize, Deserialize, Clone, Copy)]
#[serde(default)]
struct TransformDoc {
    scale: [f32; 3],
    rotate: [f32; 4],
    translate: [f32; 3],
}

impl Default for TransformDoc {
    fn default() -> Self {
        Self {
            scale: [1.0, 1.0, 1.0],
            rotate: [0.0, 0.0, 0.0, 1.0],
            translate: [0.0, 0.0, 0.0],
        }
    }
}

impl From<&Transform> for TransformDoc {
    fn from(transform: &Transform) -> Self {
        Self {
            scale: transform.scale.into(),
            rotate: quat_to_xyzw(&transform.rotate),
            translate: transform.translate.into(),
        }
    }
}

impl TransformDoc {
    fn to_transform(self) -> Transform {
        Transform {
            scale: Vec3::from(self.scale),
            rotate: quat_from_xyzw(self.rotate),
            translate: Vec3::from(self.translate),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ModelDoc {
    gpk_file: String,
    #[serde(default)]
    adjustment_transform: TransformDoc,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    animation_index: Option<usize>,
    #[serde(default)]
    animation_time: f32,
    #[serde(default)]
    hidden: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
enum CollisionDoc {
    Sphere { radius: f32 },
    Capsule { height: f32, radius: f32 },
    // the document stores the full box size, components keep half extents
    Box { size: [f32; 3] },
    Terrain { gpk_file: String },
}

#[derive(Serialize, Deserialize)]
struct PhysicsDoc {
    mass: f32,
    #[serde(default)]
    velocity: [f32; 3],
    #[serde(default)]
    max_speed: f32,
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "light_type", rename_all = "snake_case")]
enum LightDoc {
    Ambient {
        color: [f32; 3],
    },
    Directional {
        color: [f32; 3],
        direction: [f32; 3],
    },
    Point {
        color: [f32; 3],
        position: [f32; 3],
        attenuation: f32,
    },
}

#[derive(Serialize, Deserialize)]
struct TerrainDoc {
    gpk_file: String,
    #[serde(default)]
    transform: TransformDoc,
}

#[derive(Serialize, Deserialize)]
struct PlayerDoc {
    #[serde(default)]
    entity_name: Option<String>,
}

impl Level {
    /// Load a level document, its asset packs and its entities.
    ///
    /// `extra_read` sees the raw parsed document before the level consumes
    /// it. Entities append through the normal addition queue and a commit, so
    /// physics handles get created under the same rules as editor additions.
    pub fn read_json(
        &mut self,
        path: &str,
        gpu: &mut dyn GpuRegions,
        physics: &mut dyn PhysicsWorld,
        extra_read: Option<&mut dyn FnMut(&serde_json::Value)>,
    ) -> Result<(), LevelError> {
        let text = std::fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            log::error!("level '{path}' is not valid JSON: {e}");
            LevelError::Parse(e.to_string())
        })?;
        if let Some(hook) = extra_read {
            hook(&value);
        }
        let doc: LevelDoc =
            serde_json::from_value(value).map_err(|e| LevelError::Parse(e.to_string()))?;

        for gpk_file in &doc.models {
            self.assets.add_model(gpk_file, gpu)?;
        }
        for gpk_file in &doc.skyboxes {
            self.assets.add_skybox(gpk_file, gpu)?;
        }
        for gpk_file in &doc.terrains {
            self.assets.add_terrain(gpk_file, gpu, physics)?;
        }
        if let Some(index) = doc.skybox_index {
            if index < self.assets.skyboxes().len() {
                self.assets.set_skybox_index(Some(index));
            } else {
                log::warn!("level '{path}' selects out-of-range skybox {index}");
            }
        }

        for entity_doc in doc.entities {
            let addition = self.addition_from_doc(entity_doc, physics)?;
            self.store.queue_addition(addition);
        }
        self.store.commit(physics);

        self.player_entity = doc
            .player
            .and_then(|player| player.entity_name)
            .and_then(|name| {
                let found = self.store.find_entity(&name);
                if found.is_none() {
                    log::warn!("player entity '{name}' not found in level '{path}'");
                }
                found
            });
        self.json_path = Some(path.to_owned());
        log::info!(
            "loaded level '{path}' ({} entities)",
            self.store.entity_count()
        );
        Ok(())
    }

    fn addition_from_doc(
        &self,
        doc: EntityDoc,
        physics: &mut dyn PhysicsWorld,
    ) -> Result<EntityAddition, LevelError> {
        let transform = doc.transform.to_transform();

        let model = doc.model_component.map(|model_doc| {
            let model_index = self.assets.model_index(&model_doc.gpk_file);
            if model_index.is_none() {
                log::warn!("entity '{}' references unloaded model '{}'", doc.name, model_doc.gpk_file);
            }
            ModelComponent {
                model_index,
                transform: model_doc.adjustment_transform.to_transform(),
                animation_index: model_doc.animation_index,
                animation_time: model_doc.animation_time,
                hidden: model_doc.hidden,
            }
        });

        let shape = doc
            .collision_component
            .map(|collision_doc| -> Result<CollisionShape, LevelError> {
                Ok(match collision_doc {
                    CollisionDoc::Sphere { radius } => CollisionShape::Sphere { radius },
                    CollisionDoc::Capsule { height, radius } => {
                        CollisionShape::Capsule { height, radius }
                    }
                    CollisionDoc::Box { size } => CollisionShape::Box {
                        half_extents: Vec3::from(size) * 0.5,
                    },
                    CollisionDoc::Terrain { gpk_file } => {
                        let terrain_index = self.assets.terrain_index(&gpk_file);
                        if terrain_index.is_none() {
                            return Err(LevelError::UnresolvedTerrain { path: gpk_file });
                        }
                        CollisionShape::Terrain { terrain_index }
                    }
                })
            })
            .transpose()?;

        let shape_handle: Option<ShapeHandle> = shape.as_ref().map(|shape| match shape {
            CollisionShape::Terrain { terrain_index } => {
                self.assets.terrains()[terrain_index.unwrap_or_default()].shape
            }
            other => physics.create_shape(
                other
                    .to_shape_desc()
                    .unwrap_or_else(|| unreachable!("non-terrain shapes are self-contained")),
            ),
        });

        let physics_component = doc.physics_component.map(|physics_doc| {
            let body = physics.create_rigid_body(RigidBodyDesc {
                mass: physics_doc.mass,
                transform,
                velocity: Vec3::from(physics_doc.velocity),
                shape: shape_handle,
            });
            PhysicsComponent {
                velocity: Vec3::from(physics_doc.velocity),
                mass: physics_doc.mass,
                max_speed: physics_doc.max_speed,
                body: Some(body),
            }
        });

        // Without dynamics the shape becomes a static collision object.
        let collision = shape.map(|shape| {
            let object = (physics_component.is_none())
                .then(|| {
                    shape_handle
                        .map(|handle| physics.create_collision_object(&transform, handle))
                })
                .flatten();
            CollisionComponent { shape, object }
        });

        let light = doc.light_component.map(|light_doc| match light_doc {
            LightDoc::Ambient { color } => LightComponent::Ambient {
                color: Vec3::from(color),
            },
            LightDoc::Directional { color, direction } => LightComponent::Directional {
                color: Vec3::from(color),
                direction: Vec3::from(direction),
            },
            LightDoc::Point {
                color,
                position,
                attenuation,
            } => LightComponent::Point {
                color: Vec3::from(color),
                position: Vec3::from(position),
                attenuation,
            },
        });

        let terrain = doc.terrain_component.map(|terrain_doc| {
            let terrain_index = self.assets.terrain_index(&terrain_doc.gpk_file);
            if terrain_index.is_none() {
                log::warn!(
                    "entity '{}' references unloaded terrain '{}'",
                    doc.name,
                    terrain_doc.gpk_file
                );
            }
            TerrainComponent {
                terrain_index,
                transform: terrain_doc.transform.to_transform(),
            }
        });

        Ok(EntityAddition {
            info: EntityInfo { name: doc.name },
            transform,
            model,
            collision,
            physics: physics_component,
            light,
            terrain,
        })
    }

    /// Save the level as a JSON document.
    ///
    /// `extra_write` may mutate the document before it is written, to embed
    /// tool-specific sections. Unresolved asset references serialize as empty
    /// paths.
    pub fn write_json(
        &self,
        path: &str,
        extra_write: Option<&dyn Fn(&mut serde_json::Value)>,
    ) -> Result<(), LevelError> {
        let doc = self.to_doc();
        let mut value =
            serde_json::to_value(&doc).map_err(|e| LevelError::Serialize(e.to_string()))?;
        if let Some(hook) = extra_write {
            hook(&mut value);
        }
        let text =
            serde_json::to_string_pretty(&value).map_err(|e| LevelError::Serialize(e.to_string()))?;
        std::fs::write(path, text)?;
        log::info!("saved level '{path}'");
        Ok(())
    }

    fn to_doc(&self) -> LevelDoc {
        let model_path = |index: Option<usize>| {
            index
                .and_then(|i| self.assets.models().get(i))
                .map(|m| m.gpk_file.clone())
                .unwrap_or_default()
        };
        let terrain_path = |index: Option<usize>| {
            index
                .and_then(|i| self.assets.terrains().get(i))
                .map(|t| t.gpk_file.clone())
                .unwrap_or_default()
        };

        let entities = (0..self.store.entity_count())
            .map(|entity| {
                let flags = self.store.flags(entity);
                EntityDoc {
                    name: self.store.info(entity).name.clone(),
                    transform: TransformDoc::from(self.store.transform(entity)),
                    model_component: flags.contains(ComponentFlags::MODEL).then(|| {
                        let model = self.store.model_component(entity);
                        ModelDoc {
                            gpk_file: model_path(model.model_index),
                            adjustment_transform: TransformDoc::from(&model.transform),
                            animation_index: model.animation_index,
                            animation_time: model.animation_time,
                            hidden: model.hidden,
                        }
                    }),
                    collision_component: flags.contains(ComponentFlags::COLLISION).then(|| {
                        match &self.store.collision_component(entity).shape {
                            CollisionShape::Sphere { radius } => {
                                CollisionDoc::Sphere { radius: *radius }
                            }
                            CollisionShape::Capsule { height, radius } => CollisionDoc::Capsule {
                                height: *height,
                                radius: *radius,
                            },
                            CollisionShape::Box { half_extents } => CollisionDoc::Box {
                                size: (*half_extents * 2.0).into(),
                            },
                            CollisionShape::Terrain { terrain_index } => CollisionDoc::Terrain {
                                gpk_file: terrain_path(*terrain_index),
                            },
                        }
                    }),
                    physics_component: flags.contains(ComponentFlags::PHYSICS).then(|| {
                        let physics = self.store.physics_component(entity);
                        PhysicsDoc {
                            mass: physics.mass,
                            velocity: physics.velocity.into(),
                            max_speed: physics.max_speed,
                        }
                    }),
                    light_component: flags.contains(ComponentFlags::LIGHT).then(|| {
                        match self.store.light_component(entity) {
                            LightComponent::Ambient { color } => LightDoc::Ambient {
                                color: (*color).into(),
                            },
                            LightComponent::Directional { color, direction } => {
                                LightDoc::Directional {
                                    color: (*color).into(),
                                    direction: (*direction).into(),
                                }
                            }
                            LightComponent::Point {
                                color,
                                position,
                                attenuation,
                            } => LightDoc::Point {
                                color: (*color).into(),
                                position: (*position).into(),
                                attenuation: *attenuation,
                            },
                        }
                    }),
                    terrain_component: flags.contains(ComponentFlags::TERRAIN).then(|| {
                        let terrain = self.store.terrain_component(entity);
                        TerrainDoc {
                            gpk_file: terrain_path(terrain.terrain_index),
                            transform: TransformDoc::from(&terrain.transform),
                        }
                    }),
                }
            })
            .collect();

        LevelDoc {
            models: self.assets.models().iter().map(|m| m.gpk_file.clone()).collect(),
            skyboxes: self.assets.skyboxes().iter().map(|s| s.gpk_file.clone()).collect(),
            skybox_index: self.assets.skybox_index(),
            terrains: self.assets.terrains().iter().map(|t| t.gpk_file.clone()).collect(),
            entities,
            player: self.player_entity.map(|entity| PlayerDoc {
                entity_name: Some(self.store.info(entity).name.clone()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::testkit;
    use crate::config::LevelConfig;
    use crate::foundation::math::Quat;
    use crate::physics::BasicPhysicsWorld;
    use crate::render::gpu::InMemoryRegions;
    use approx::assert_relative_eq;

    struct TempDir {
        root: std::path::PathBuf,
    }

    impl TempDir {
        fn new(tag: &str) -> Self {
            let root = std::env::temp_dir().join(format!(
                "level_engine_{tag}_{}",
                std::process::id()
            ));
            std::fs::create_dir_all(&root).expect("create temp dir");
            Self { root }
        }

        fn file(&self, name: &str, bytes: &[u8]) -> String {
            let path = self.root.join(name);
            std::fs::write(&path, bytes).expect("write temp file");
            path.to_string_lossy().into_owned()
        }

        fn path(&self, name: &str) -> String {
            self.root.join(name).to_string_lossy().into_owned()
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.root);
        }
    }

    fn level_with_gpu() -> (Level, InMemoryRegions) {
        let mut gpu = InMemoryRegions::new();
        let level = Level::new(LevelConfig::default(), &mut gpu);
        (level, gpu)
    }

    fn sample_document(dir: &TempDir) -> String {
        let model_path = dir.file("tri.gpk", &testkit::triangle_model_pack());
        let terrain_path = dir.file("ground.gpk", &testkit::terrain_pack(4, 4));
        let skybox_path = dir.file("sky.gpk", &testkit::skybox_pack());
        let doc = serde_json::json!({
            "models": [model_path],
            "skyboxes": [skybox_path],
            "terrains": [terrain_path],
            "entities": [
                {
                    "name": "ground",
                    "terrain_component": { "gpk_file": terrain_path },
                    "collision_component": { "shape": "terrain", "gpk_file": terrain_path }
                },
                {
                    "name": "crate",
                    "transform": { "translate": [1.0, 2.0, 3.0] },
                    "model_component": { "gpk_file": model_path },
                    "collision_component": { "shape": "box", "size": [1.0, 1.0, 1.0] },
                    "physics_component": { "mass": 10.0, "velocity": [0.0, -1.0, 0.0] }
                },
                {
                    "name": "sun",
                    "light_component": { "light_type": "directional", "color": [1.0, 1.0, 0.9], "direction": [0.0, -1.0, 0.2] }
                }
            ],
            "player": { "entity_name": "crate" }
        });
        dir.file("level.json", serde_json::to_string_pretty(&doc).unwrap().as_bytes())
    }

    #[test]
    fn read_builds_entities_assets_and_physics_state() {
        let dir = TempDir::new("read");
        let json_path = sample_document(&dir);
        let (mut level, mut gpu) = level_with_gpu();
        let mut physics = BasicPhysicsWorld::new();
        level
            .read_json(&json_path, &mut gpu, &mut physics, None)
            .expect("valid level");

        assert_eq!(level.store.entity_count(), 3);
        assert_eq!(level.assets.models().len(), 1);
        assert_eq!(level.assets.terrains().len(), 1);
        assert_eq!(level.assets.skybox_index(), Some(0));
        assert_eq!(level.player_entity(), Some(1));
        level.store.check_packed_invariant();

        // ground: static collision object on the terrain heightfield
        let ground = level.store.collision_component(0);
        assert!(ground.object.is_some());
        assert!(matches!(ground.shape, CollisionShape::Terrain { terrain_index: Some(0) }));

        // crate: rigid body carries the shape, no separate collision object
        let crate_collision = level.store.collision_component(1);
        assert!(crate_collision.object.is_none());
        // the document holds the full box size, the component half extents
        match crate_collision.shape {
            CollisionShape::Box { half_extents } => assert_eq!(half_extents.x, 0.5),
            ref other => panic!("expected a box shape, got {other:?}"),
        }
        let body = level.store.physics_component(1).body.expect("rigid body");
        let desc = physics.body(body).expect("live body");
        assert!(desc.shape.is_some());
        assert_eq!(desc.mass, 10.0);
        assert_eq!(physics.object_count(), 1);
        assert_eq!(physics.body_count(), 1);
    }

    #[test]
    fn round_trip_preserves_the_document_semantics() {
        let dir = TempDir::new("round_trip");
        let json_path = sample_document(&dir);
        let (mut level, mut gpu) = level_with_gpu();
        let mut physics = BasicPhysicsWorld::new();
        level
            .read_json(&json_path, &mut gpu, &mut physics, None)
            .expect("valid level");

        let saved = dir.path("saved.json");
        level.write_json(&saved, None).expect("save");

        let (mut reloaded, mut gpu2) = level_with_gpu();
        let mut physics2 = BasicPhysicsWorld::new();
        reloaded
            .read_json(&saved, &mut gpu2, &mut physics2, None)
            .expect("reload");

        assert_eq!(reloaded.store.entity_count(), 3);
        assert_eq!(reloaded.player_entity(), Some(1));
        assert_eq!(reloaded.store.info(2).name, "sun");
        let transform = reloaded.store.transform(1);
        assert_relative_eq!(transform.translate, Vec3::new(1.0, 2.0, 3.0), epsilon = 1.0e-6);
        assert_relative_eq!(transform.scale, Vec3::new(1.0, 1.0, 1.0), epsilon = 1.0e-6);
        assert!(transform.rotate.angle() < 1.0e-6);
        match reloaded.store.collision_component(1).shape {
            CollisionShape::Box { half_extents } => {
                assert_relative_eq!(half_extents, Vec3::new(0.5, 0.5, 0.5), epsilon = 1.0e-6);
            }
            ref other => panic!("expected a box shape, got {other:?}"),
        }
        assert!(matches!(
            reloaded.store.light_component(2),
            LightComponent::Directional { .. }
        ));
    }

    #[test]
    fn empty_level_round_trips() {
        let dir = TempDir::new("empty");
        let (level, _gpu) = level_with_gpu();
        let saved = dir.path("empty.json");
        level.write_json(&saved, None).expect("save");

        let (mut reloaded, mut gpu) = level_with_gpu();
        let mut physics = BasicPhysicsWorld::new();
        reloaded
            .read_json(&saved, &mut gpu, &mut physics, None)
            .expect("reload");
        assert_eq!(reloaded.store.entity_count(), 0);
        assert_eq!(reloaded.player_entity(), None);
        assert!(reloaded.assets.models().is_empty());
    }

    #[test]
    fn single_entity_round_trips_exactly() {
        let dir = TempDir::new("single");
        let (mut level, _gpu) = level_with_gpu();
        let mut physics = BasicPhysicsWorld::new();
        let mut addition = EntityAddition::named("lamp");
        addition.transform = Transform {
            scale: Vec3::new(2.0, 1.0, 0.5),
            rotate: Quat::from_axis_angle(&Vec3::y_axis(), 0.7),
            translate: Vec3::new(-4.0, 2.5, 9.0),
        };
        addition.light = Some(LightComponent::Point {
            color: Vec3::new(1.0, 0.8, 0.6),
            position: Vec3::new(0.0, 3.0, 0.0),
            attenuation: 2.0,
        });
        level.store.queue_addition(addition);
        level.store.commit(&mut physics);

        let saved = dir.path("single.json");
        level.write_json(&saved, None).expect("save");

        let (mut reloaded, mut gpu) = level_with_gpu();
        let mut physics2 = BasicPhysicsWorld::new();
        reloaded
            .read_json(&saved, &mut gpu, &mut physics2, None)
            .expect("reload");

        assert_eq!(reloaded.store.entity_count(), 1);
        assert_eq!(reloaded.store.info(0).name, "lamp");
        let original = level.store.transform(0);
        let transform = reloaded.store.transform(0);
        assert_relative_eq!(transform.translate, original.translate, epsilon = 1.0e-6);
        assert_relative_eq!(transform.scale, original.scale, epsilon = 1.0e-6);
        assert!(transform.rotate.angle_to(&original.rotate) < 1.0e-6);
        match reloaded.store.light_component(0) {
            LightComponent::Point { attenuation, .. } => {
                assert_relative_eq!(*attenuation, 2.0, epsilon = 1.0e-6);
            }
            other => panic!("expected a point light, got {other:?}"),
        }
    }

    #[test]
    fn extension_hooks_round_trip_extra_sections() {
        let dir = TempDir::new("hooks");
        let json_path = sample_document(&dir);
        let (mut level, mut gpu) = level_with_gpu();
        let mut physics = BasicPhysicsWorld::new();
        level
            .read_json(&json_path, &mut gpu, &mut physics, None)
            .expect("valid level");

        let saved = dir.path("extra.json");
        level
            .write_json(
                &saved,
                Some(&|value: &mut serde_json::Value| {
                    value["editor_state"] = serde_json::json!({ "selected": "crate" });
                }),
            )
            .expect("save");

        let (mut reloaded, mut gpu2) = level_with_gpu();
        let mut physics2 = BasicPhysicsWorld::new();
        let mut seen = None;
        reloaded
            .read_json(
                &saved,
                &mut gpu2,
                &mut physics2,
                Some(&mut |value: &serde_json::Value| {
                    seen = Some(value["editor_state"]["selected"].clone());
                }),
            )
            .expect("reload");
        assert_eq!(seen, Some(serde_json::json!("crate")));
    }

    #[test]
    fn collision_terrain_must_reference_a_loaded_pack() {
        let dir = TempDir::new("unresolved");
        let doc = serde_json::json!({
            "entities": [
                {
                    "name": "ground",
                    "collision_component": { "shape": "terrain", "gpk_file": "missing.gpk" }
                }
            ]
        });
        let json_path = dir.file("level.json", serde_json::to_string(&doc).unwrap().as_bytes());
        let (mut level, mut gpu) = level_with_gpu();
        let mut physics = BasicPhysicsWorld::new();
        let err = level
            .read_json(&json_path, &mut gpu, &mut physics, None)
            .unwrap_err();
        assert!(matches!(err, LevelError::UnresolvedTerrain { .. }));
    }

    #[test]
    fn invalid_json_reports_a_parse_error() {
        let dir = TempDir::new("parse");
        let json_path = dir.file("level.json", b"{ not json");
        let (mut level, mut gpu) = level_with_gpu();
        let mut physics = BasicPhysicsWorld::new();
        let err = level
            .read_json(&json_path, &mut gpu, &mut physics, None)
            .unwrap_err();
        assert!(matches!(err, LevelError::Parse(_)));
    }
}
