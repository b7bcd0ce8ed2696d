//! Per-frame render data generation
//!
//! Walks the committed entity state once per frame and produces
//! [`LevelRenderData`]: every uniform block appended into the frame's uniform
//! region plus the descriptor indices each draw needs. The command builder
//! consumes this without touching the level again, so generation is the only
//! place entity state and GPU state meet.

use crate::assets::model::{
    global_node_transforms, visit_scene_nodes_with_transform, ChannelPath, Model, ModelNode,
};
use crate::foundation::math::{quat_slerp, Quat, Vec3};
use crate::level::{ComponentFlags, Level, LightComponent};

use super::camera::{shadow_map_projection, Camera};
use super::gpu::{
    append_uniform, GpuRegions, LevelUniform, MeshUniform, ModelUniform, PrimitiveUniform,
};

/// One draw batch, ready for command recording.
#[derive(Debug, Clone)]
pub struct PrimitiveRenderData {
    /// Number of u16 indices
    pub index_count: u32,
    /// Byte offset of the index data in the vertex region
    pub index_buffer_offset: u32,
    /// Byte offset of the vertex data in the vertex region
    pub vertex_buffer_offset: u32,
    /// Uniform region offset of the material factors
    pub uniform_offset: u32,
    /// Diffuse map descriptor
    pub diffuse_map_descriptor_index: u32,
    /// Metallic map descriptor
    pub metallic_map_descriptor_index: u32,
    /// Roughness map descriptor
    pub roughness_map_descriptor_index: u32,
    /// Normal map descriptor
    pub normal_map_descriptor_index: u32,
}

/// One mesh instance reached by the scene traversal.
#[derive(Debug, Clone)]
pub struct MeshRenderData {
    /// Joint matrix block for skinned meshes, otherwise the global node
    /// transform uniform
    pub uniform_offset: u32,
    /// Whether `uniform_offset` addresses the shared joint matrix block
    pub skinned: bool,
    /// Draw batches
    pub primitives: Vec<PrimitiveRenderData>,
}

/// One entity model component.
#[derive(Debug, Clone)]
pub struct ModelRenderData {
    /// Uniform region offset of the model instance transform
    pub uniform_offset: u32,
    /// Mesh instances in traversal order
    pub meshes: Vec<MeshRenderData>,
}

/// One entity terrain component.
#[derive(Debug, Clone)]
pub struct TerrainRenderData {
    /// Uniform region offset of the patch placement transform
    pub uniform_offset: u32,
    /// Height map descriptor
    pub height_map_descriptor_index: u32,
    /// Diffuse map descriptor
    pub diffuse_map_descriptor_index: u32,
}

/// Everything the command builder needs for one frame.
#[derive(Debug, Clone, Default)]
pub struct LevelRenderData {
    /// Model components with a resolved, visible model
    pub models: Vec<ModelRenderData>,
    /// Terrain components with a resolved terrain
    pub terrains: Vec<TerrainRenderData>,
    /// Active skybox cubemap descriptor, if a skybox is loaded
    pub skybox_descriptor_index: Option<u32>,
}

/// One light of each kind, resolved from the entity state.
#[derive(Debug, Clone)]
pub struct ResolvedLights {
    /// Ambient light color
    pub ambient_color: Vec3,
    /// Directional light color
    pub directional_color: Vec3,
    /// Direction the directional light travels
    pub directional_direction: Vec3,
    /// Point light color
    pub point_color: Vec3,
    /// Point light position
    pub point_position: Vec3,
    /// Point light attenuation factor
    pub point_attenuation: f32,
}

impl Default for ResolvedLights {
    fn default() -> Self {
        Self {
            ambient_color: Vec3::zeros(),
            directional_color: Vec3::zeros(),
            directional_direction: Vec3::new(0.0, 1.0, 0.0),
            point_color: Vec3::zeros(),
            point_position: Vec3::zeros(),
            point_attenuation: 0.0,
        }
    }
}

/// Fold every light component into one light per kind; when several entities
/// carry the same kind the highest-indexed entity wins.
pub fn resolve_lights(level: &Level) -> ResolvedLights {
    let mut lights = ResolvedLights::default();
    for entity in 0..level.store.entity_count() {
        if !level.store.flags(entity).contains(ComponentFlags::LIGHT) {
            continue;
        }
        match level.store.light_component(entity) {
            LightComponent::Ambient { color } => lights.ambient_color = *color,
            LightComponent::Directional { color, direction } => {
                lights.directional_color = *color;
                lights.directional_direction = *direction;
            }
            LightComponent::Point {
                color,
                position,
                attenuation,
            } => {
                lights.point_color = *color;
                lights.point_position = *position;
                lights.point_attenuation = *attenuation;
            }
        }
    }
    lights
}

fn vec4_from(v: &Vec3, w: f32) -> [f32; 4] {
    [v.x, v.y, v.z, w]
}

fn interpolation_window(
    key_times: &[f32],
    time: f32,
) -> Option<(usize, f32)> {
    let last = *key_times.last()?;
    let t = if last > 0.0 { time % last } else { 0.0 };
    let index = key_times.iter().position(|&key_time| t <= key_time)?;
    let (prev_time, key_time) = if index == 0 {
        (0.0, key_times[0])
    } else {
        (key_times[index - 1], key_times[index])
    };
    let span = key_time - prev_time;
    let factor = if span > 0.0 { (t - prev_time) / span } else { 1.0 };
    Some((index, factor))
}

/// Node states of `model` with `animation_index` sampled at `time` seconds.
///
/// Playback wraps at the last key time of each channel. Before the first key
/// a channel interpolates from the identity value of its path. An index past
/// the model's animations leaves the nodes unanimated; incomplete edits can
/// point a component at an animation the model no longer has.
pub fn sample_animation(model: &Model, animation_index: usize, time: f32) -> Vec<ModelNode> {
    let mut nodes = model.nodes.clone();
    let Some(animation) = model.animations.get(animation_index) else {
        return nodes;
    };

    for channel in &animation.channels {
        let sampler = &animation.samplers[channel.sampler_index];
        let key_times: Vec<f32> = sampler.key_frames.iter().map(|k| k.time).collect();
        let Some((index, factor)) = interpolation_window(&key_times, time) else {
            continue;
        };
        let key = sampler.key_frames[index].data;
        let transform = &mut nodes[channel.node_index].local_transform;
        match channel.path {
            ChannelPath::Translate => {
                let prev = if index == 0 {
                    Vec3::zeros()
                } else {
                    sampler.key_frames[index - 1].data.xyz()
                };
                transform.translate = prev.lerp(&key.xyz(), factor);
            }
            ChannelPath::Scale => {
                let prev = if index == 0 {
                    Vec3::new(1.0, 1.0, 1.0)
                } else {
                    sampler.key_frames[index - 1].data.xyz()
                };
                transform.scale = prev.lerp(&key.xyz(), factor);
            }
            ChannelPath::Rotate => {
                let prev = if index == 0 {
                    Quat::identity()
                } else {
                    let data = sampler.key_frames[index - 1].data;
                    Quat::new_normalize(nalgebra::Quaternion::new(
                        data.w, data.x, data.y, data.z,
                    ))
                };
                let target =
                    Quat::new_normalize(nalgebra::Quaternion::new(key.w, key.x, key.y, key.z));
                transform.rotate = quat_slerp(&prev, &target, factor);
            }
        }
    }

    for node in &mut nodes {
        node.local_matrix = node.local_transform.to_matrix();
    }
    nodes
}

fn skin_joint_block(model: &Model, nodes: &[ModelNode]) -> Option<Vec<[[f32; 4]; 4]>> {
    let skin = model.skins.first()?;
    let globals = global_node_transforms(&model.scenes, nodes);
    let block = skin
        .joints
        .iter()
        .map(|joint| {
            let global = globals[joint.node_index].unwrap_or_else(|| {
                panic!(
                    "skin '{}' joint node {} is unreachable from every scene root",
                    skin.name, joint.node_index
                )
            });
            (global * joint.inverse_bind).into()
        })
        .collect();
    Some(block)
}

fn primitive_render_data(
    model: &Model,
    mesh_index: usize,
    gpu: &mut dyn GpuRegions,
    defaults: &crate::assets::DefaultMaps,
) -> Vec<PrimitiveRenderData> {
    model.meshes[mesh_index]
        .primitives
        .iter()
        .map(|primitive| {
            let material = primitive.material_index.map(|i| &model.materials[i]);
            let uniform = match material {
                Some(material) => PrimitiveUniform {
                    diffuse_factor: material.diffuse_factor.into(),
                    metallic_factor: material.metallic_factor,
                    roughness_factor: material.roughness_factor,
                    _pad: [0.0; 2],
                },
                None => PrimitiveUniform {
                    diffuse_factor: [1.0; 4],
                    metallic_factor: 1.0,
                    roughness_factor: 1.0,
                    _pad: [0.0; 2],
                },
            };
            PrimitiveRenderData {
                index_count: primitive.index_count,
                index_buffer_offset: primitive.index_buffer_offset,
                vertex_buffer_offset: primitive.vertex_buffer_offset,
                uniform_offset: append_uniform(gpu, &uniform),
                diffuse_map_descriptor_index: material
                    .map_or(defaults.diffuse_map_descriptor_index, |m| {
                        m.diffuse_map_descriptor_index
                    }),
                metallic_map_descriptor_index: material
                    .map_or(defaults.metallic_map_descriptor_index, |m| {
                        m.metallic_map_descriptor_index
                    }),
                roughness_map_descriptor_index: material
                    .map_or(defaults.roughness_map_descriptor_index, |m| {
                        m.roughness_map_descriptor_index
                    }),
                normal_map_descriptor_index: material
                    .map_or(defaults.normal_map_descriptor_index, |m| {
                        m.normal_map_descriptor_index
                    }),
            }
        })
        .collect()
}

/// Reset the frame regions and regenerate every uniform block and draw
/// reference for the current entity state.
///
/// The level uniform always lands at offset 0 of the uniform region; shaders
/// bind it without an offset. `extra` runs after level data so embedding
/// tools can append their own frame uniforms behind it.
pub fn generate_render_data(
    level: &Level,
    camera: &Camera,
    gpu: &mut dyn GpuRegions,
    extra: Option<&mut dyn FnMut(&mut dyn GpuRegions)>,
) -> LevelRenderData {
    gpu.reset_frame_regions();

    let lights = resolve_lights(level);
    let level_uniform = LevelUniform {
        view_proj: camera.view_projection().into(),
        camera_position: vec4_from(&camera.position, 1.0),
        shadow_map_proj: shadow_map_projection(&lights.directional_direction).into(),
        ambient_light_color: vec4_from(&lights.ambient_color, 0.0),
        directional_light_color: vec4_from(&lights.directional_color, 0.0),
        directional_light_dir: vec4_from(&lights.directional_direction, 0.0),
        point_light_color: vec4_from(&lights.point_color, 0.0),
        point_light_position: vec4_from(&lights.point_position, lights.point_attenuation),
    };
    let offset = append_uniform(gpu, &level_uniform);
    assert_eq!(offset, 0, "level uniform must open the frame region");

    let mut data = LevelRenderData {
        skybox_descriptor_index: level
            .assets
            .skybox_index()
            .map(|i| level.assets.skyboxes()[i].cubemap_descriptor_index),
        ..LevelRenderData::default()
    };

    for entity in 0..level.store.entity_count() {
        let flags = level.store.flags(entity);
        let visible_model = flags
            .contains(ComponentFlags::MODEL)
            .then(|| level.store.model_component(entity))
            .filter(|component| !component.hidden)
            .and_then(|component| Some((component, component.model_index?)));
        if let Some((component, model_index)) = visible_model {
            let model = &level.assets.models()[model_index];

            let instance = level.store.transform(entity).to_matrix()
                * component.transform.to_matrix();
            let uniform_offset = append_uniform(
                gpu,
                &ModelUniform {
                    model: instance.into(),
                },
            );

            let sampled;
            let nodes: &[ModelNode] = match component.animation_index {
                Some(animation_index) => {
                    sampled = sample_animation(model, animation_index, component.animation_time);
                    &sampled
                }
                None => &model.nodes,
            };

            let joint_block_offset = skin_joint_block(model, nodes)
                .map(|block| gpu.append_uniform_region(bytemuck::cast_slice(&block)));

            let mut meshes = Vec::new();
            visit_scene_nodes_with_transform(&model.scenes, nodes, |_, node, global| {
                let Some(mesh_index) = node.mesh_index else {
                    return;
                };
                let skinned = joint_block_offset.is_some()
                    && model.meshes[mesh_index].primitives.iter().any(|p| p.has_joints);
                let uniform_offset = if skinned {
                    joint_block_offset.unwrap_or_default()
                } else {
                    append_uniform(
                        gpu,
                        &MeshUniform {
                            transform: (*global).into(),
                        },
                    )
                };
                meshes.push(MeshRenderData {
                    uniform_offset,
                    skinned,
                    primitives: primitive_render_data(
                        model,
                        mesh_index,
                        gpu,
                        level.assets.defaults(),
                    ),
                });
            });

            data.models.push(ModelRenderData {
                uniform_offset,
                meshes,
            });
        }

        if flags.contains(ComponentFlags::TERRAIN) {
            let component = level.store.terrain_component(entity);
            let Some(terrain_index) = component.terrain_index else {
                continue;
            };
            let terrain = &level.assets.terrains()[terrain_index];
            let placement = level.store.transform(entity).to_matrix()
                * component.transform.to_matrix();
            data.terrains.push(TerrainRenderData {
                uniform_offset: append_uniform(
                    gpu,
                    &ModelUniform {
                        model: placement.into(),
                    },
                ),
                height_map_descriptor_index: terrain.height_map_descriptor_index,
                diffuse_map_descriptor_index: terrain.diffuse_map_descriptor_index,
            });
        }
    }

    if let Some(hook) = extra {
        hook(gpu);
    }

    data
}
