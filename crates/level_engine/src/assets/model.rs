//! Model assets
//!
//! A model is an immutable DAG of named nodes loaded once from a gpk pack and
//! shared by every entity referencing it by index. Geometry is copied into the
//! GPU vertex region at load; the CPU-side node/skin/animation tables stay
//! resident for render-data generation.

use crate::foundation::math::{quat_from_xyzw, Mat4, Transform, Vec3, Vec4};
use crate::render::gpu::{GpuRegions, ImageDesc, ImageFormat, SamplerKind};

use super::pack::{
    self, AnimationRecord, ChannelRecord, ImageRecord, JointRecord, KeyFrameRecord, MaterialRecord,
    MeshRecord, ModelHeader, NodeRecord, PackReader, PrimitiveRecord, SamplerRecord, SceneRecord,
    SkinRecord, TransformRecord,
};
use super::{AssetError, DefaultMaps};

/// One root scene of a model's node DAG.
#[derive(Debug, Clone)]
pub struct ModelScene {
    /// Scene name
    pub name: String,
    /// Root node indices
    pub node_indices: Vec<usize>,
}

/// One node of the hierarchy.
#[derive(Debug, Clone)]
pub struct ModelNode {
    /// Mesh drawn at this node, if any
    pub mesh_index: Option<usize>,
    /// Local transform relative to the parent
    pub local_transform: Transform,
    /// Cached matrix form of `local_transform`
    pub local_matrix: Mat4,
    /// Child node indices
    pub children: Vec<usize>,
}

/// One draw batch of a mesh.
#[derive(Debug, Clone)]
pub struct ModelPrimitive {
    /// Material index, if the primitive has one
    pub material_index: Option<usize>,
    /// Number of u16 indices
    pub index_count: u32,
    /// Byte offset of the index data in the GPU vertex region
    pub index_buffer_offset: u32,
    /// Number of vertices
    pub vertex_count: u32,
    /// Byte offset of the vertex data in the GPU vertex region
    pub vertex_buffer_offset: u32,
    /// Whether vertices carry joint indices/weights
    pub has_joints: bool,
    /// CPU-side index copy, retained only when `store_vertices` was set
    pub indices: Option<Vec<u8>>,
    /// CPU-side vertex copy, retained only when `store_vertices` was set
    pub vertices: Option<Vec<u8>>,
}

/// One mesh: a named list of primitives.
#[derive(Debug, Clone)]
pub struct ModelMesh {
    /// Mesh name
    pub name: String,
    /// Draw batches
    pub primitives: Vec<ModelPrimitive>,
}

/// One joint of a skin.
#[derive(Debug, Clone)]
pub struct ModelJoint {
    /// Node driven by this joint
    pub node_index: usize,
    /// Inverse bind matrix
    pub inverse_bind: Mat4,
}

/// Skeletal binding data.
#[derive(Debug, Clone)]
pub struct ModelSkin {
    /// Skin name
    pub name: String,
    /// Joints, in the order their matrices are uploaded
    pub joints: Vec<ModelJoint>,
}

/// Which transform component an animation channel drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPath {
    /// Translation keys (lerp)
    Translate,
    /// Rotation keys (slerp)
    Rotate,
    /// Scale keys (lerp)
    Scale,
}

/// One key frame of a sampler track.
#[derive(Debug, Clone, Copy)]
pub struct AnimationKeyFrame {
    /// Key time in seconds
    pub time: f32,
    /// Payload: xyz for translate/scale, xyzw for rotate
    pub data: Vec4,
}

/// Keyed value track shared by one or more channels.
#[derive(Debug, Clone)]
pub struct AnimationSampler {
    /// Key frames ordered by ascending time
    pub key_frames: Vec<AnimationKeyFrame>,
}

/// One channel binding a sampler to a node transform component.
#[derive(Debug, Clone, Copy)]
pub struct AnimationChannel {
    /// Node driven by this channel
    pub node_index: usize,
    /// Transform component written by this channel
    pub path: ChannelPath,
    /// Sampler providing the keyed values
    pub sampler_index: usize,
}

/// One named animation.
#[derive(Debug, Clone)]
pub struct ModelAnimation {
    /// Animation name
    pub name: String,
    /// Channels
    pub channels: Vec<AnimationChannel>,
    /// Samplers referenced by the channels
    pub samplers: Vec<AnimationSampler>,
}

/// Resolved material with combined-sampler descriptor indices.
#[derive(Debug, Clone)]
pub struct ModelMaterial {
    /// Material name
    pub name: String,
    /// Diffuse map descriptor (default map when the pack had none)
    pub diffuse_map_descriptor_index: u32,
    /// Metallic map descriptor
    pub metallic_map_descriptor_index: u32,
    /// Roughness map descriptor
    pub roughness_map_descriptor_index: u32,
    /// Normal map descriptor
    pub normal_map_descriptor_index: u32,
    /// Diffuse color multiplier
    pub diffuse_factor: Vec4,
    /// Metalness multiplier
    pub metallic_factor: f32,
    /// Roughness multiplier
    pub roughness_factor: f32,
}

#[derive(Debug, Clone, Copy)]
struct LoadedImage {
    gpu_index: u32,
    mip_count: u32,
}

/// An immutable, loaded model asset.
#[derive(Debug, Clone)]
pub struct Model {
    /// Pack file path this model was loaded from (unique per store)
    pub gpk_file: String,
    /// Root scenes
    pub scenes: Vec<ModelScene>,
    /// Node hierarchy
    pub nodes: Vec<ModelNode>,
    /// Meshes
    pub meshes: Vec<ModelMesh>,
    /// Skins
    pub skins: Vec<ModelSkin>,
    /// Animations
    pub animations: Vec<ModelAnimation>,
    /// Materials
    pub materials: Vec<ModelMaterial>,
}

fn optional_index(raw: u32, count: usize) -> Option<usize> {
    let index = raw as usize;
    (index < count).then_some(index)
}

fn transform_from_record(record: &TransformRecord) -> Transform {
    Transform {
        scale: Vec3::from(record.scale),
        rotate: quat_from_xyzw(record.rotate),
        translate: Vec3::from(record.translate),
    }
}

fn channel_path(raw: u32) -> Result<ChannelPath, AssetError> {
    match raw {
        pack::CHANNEL_TRANSLATE => Ok(ChannelPath::Translate),
        pack::CHANNEL_ROTATE => Ok(ChannelPath::Rotate),
        pack::CHANNEL_SCALE => Ok(ChannelPath::Scale),
        other => Err(AssetError::Malformed {
            what: format!("unknown animation channel type {other}"),
        }),
    }
}

fn register_image(
    reader: &PackReader<'_>,
    record: &ImageRecord,
    gpu: &mut dyn GpuRegions,
) -> Result<LoadedImage, AssetError> {
    let format = ImageFormat::from_pack_id(record.format).ok_or_else(|| AssetError::Malformed {
        what: format!("unknown image format id {}", record.format),
    })?;
    let desc = ImageDesc {
        format,
        width: record.width,
        height: record.height,
        mip_count: record.mip_count,
        layer_count: record.layer_count,
        cube_compatible: false,
    };
    let data = reader.bytes(record.data_offset, record.size)?;
    let gpu_index = gpu.append_image_region(&desc, data, record.block_dim, record.block_size);
    Ok(LoadedImage {
        gpu_index,
        mip_count: record.mip_count,
    })
}

fn material_map_descriptor(
    raw_image_index: u32,
    images: &[LoadedImage],
    gpu: &mut dyn GpuRegions,
    default_descriptor: u32,
) -> u32 {
    match optional_index(raw_image_index, images.len()) {
        Some(index) => {
            let image = images[index];
            gpu.append_combined_2d_sampler(image.gpu_index, SamplerKind::Mipmap(image.mip_count))
        }
        None => default_descriptor,
    }
}

/// Deserialize a model pack and register its GPU resources.
pub(super) fn load_model(
    gpk_file: &str,
    bytes: &[u8],
    gpu: &mut dyn GpuRegions,
    defaults: &DefaultMaps,
    store_vertices: bool,
) -> Result<Model, AssetError> {
    let reader = PackReader::new(bytes);
    let header: ModelHeader = reader.read(0)?;
    pack::check_signature(header.signature, pack::MODEL_SIGNATURE, gpk_file)?;

    let node_count = header.node_count as usize;
    let mesh_count = header.mesh_count as usize;
    let material_count = header.material_count as usize;

    let scenes = reader
        .read_array::<SceneRecord>(header.scene_offset, header.scene_count)?
        .iter()
        .map(|record| ModelScene {
            name: pack::name_str(&record.name),
            node_indices: record.node_indices[..record.node_index_count as usize]
                .iter()
                .map(|&i| i as usize)
                .collect(),
        })
        .collect();

    let nodes = reader
        .read_array::<NodeRecord>(header.node_offset, header.node_count)?
        .iter()
        .map(|record| {
            let local_transform = transform_from_record(&record.local_transform);
            ModelNode {
                mesh_index: optional_index(record.mesh_index, mesh_count),
                local_matrix: local_transform.to_matrix(),
                local_transform,
                children: record.children[..record.child_count as usize]
                    .iter()
                    .map(|&i| i as usize)
                    .collect(),
            }
        })
        .collect::<Vec<_>>();

    for (index, node) in nodes.iter().enumerate() {
        if let Some(&child) = node.children.iter().find(|&&c| c >= node_count) {
            return Err(AssetError::Malformed {
                what: format!("node {index} references out-of-range child {child}"),
            });
        }
    }

    let mut meshes = Vec::with_capacity(mesh_count);
    for record in reader.read_array::<MeshRecord>(header.mesh_offset, header.mesh_count)? {
        let mut primitives = Vec::with_capacity(record.primitive_count as usize);
        for primitive in
            reader.read_array::<PrimitiveRecord>(record.primitive_offset, record.primitive_count)?
        {
            let index_stride = std::mem::size_of::<u16>() as u32;
            let vertex_stride = std::mem::size_of::<pack::ModelVertex>() as u32;
            let index_size = primitive
                .index_count
                .checked_mul(index_stride)
                .ok_or(AssetError::Truncated {
                    offset: primitive.indices_offset,
                })?;
            let vertex_size = primitive
                .vertex_count
                .checked_mul(vertex_stride)
                .ok_or(AssetError::Truncated {
                    offset: primitive.vertices_offset,
                })?;
            let indices = reader.bytes(primitive.indices_offset, index_size)?;
            let vertices = reader.bytes(primitive.vertices_offset, vertex_size)?;
            primitives.push(ModelPrimitive {
                material_index: optional_index(primitive.material_index, material_count),
                index_count: primitive.index_count,
                index_buffer_offset: gpu.append_vertex_region(indices, index_stride),
                vertex_count: primitive.vertex_count,
                vertex_buffer_offset: gpu.append_vertex_region(vertices, vertex_stride),
                has_joints: primitive.has_joints != 0,
                indices: store_vertices.then(|| indices.to_vec()),
                vertices: store_vertices.then(|| vertices.to_vec()),
            });
        }
        meshes.push(ModelMesh {
            name: pack::name_str(&record.name),
            primitives,
        });
    }

    let mut skins = Vec::with_capacity(header.skin_count as usize);
    for record in reader.read_array::<SkinRecord>(header.skin_offset, header.skin_count)? {
        if record.joint_count == 0 {
            return Err(AssetError::Malformed {
                what: format!("skin '{}' has no joints", pack::name_str(&record.name)),
            });
        }
        let joints = reader
            .read_array::<JointRecord>(record.joints_offset, record.joint_count)?
            .iter()
            .map(|joint| {
                if joint.node_index as usize >= node_count {
                    return Err(AssetError::Malformed {
                        what: format!("joint references out-of-range node {}", joint.node_index),
                    });
                }
                Ok(ModelJoint {
                    node_index: joint.node_index as usize,
                    inverse_bind: Mat4::from(joint.inverse_bind),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        skins.push(ModelSkin {
            name: pack::name_str(&record.name),
            joints,
        });
    }

    let mut animations = Vec::with_capacity(header.animation_count as usize);
    for record in
        reader.read_array::<AnimationRecord>(header.animation_offset, header.animation_count)?
    {
        let channels = reader
            .read_array::<ChannelRecord>(record.channel_offset, record.channel_count)?
            .iter()
            .map(|channel| {
                Ok(AnimationChannel {
                    node_index: channel.node_index as usize,
                    path: channel_path(channel.channel_type)?,
                    sampler_index: channel.sampler_index as usize,
                })
            })
            .collect::<Result<Vec<_>, AssetError>>()?;
        let mut samplers = Vec::with_capacity(record.sampler_count as usize);
        for sampler in
            reader.read_array::<SamplerRecord>(record.sampler_offset, record.sampler_count)?
        {
            if sampler.interpolation != pack::INTERPOLATION_LINEAR {
                return Err(AssetError::Malformed {
                    what: format!("unsupported interpolation id {}", sampler.interpolation),
                });
            }
            let key_frames = reader
                .read_array::<KeyFrameRecord>(sampler.key_frame_offset, sampler.key_frame_count)?
                .iter()
                .map(|key| AnimationKeyFrame {
                    time: key.time,
                    data: Vec4::from(key.data),
                })
                .collect();
            samplers.push(AnimationSampler { key_frames });
        }
        animations.push(ModelAnimation {
            name: pack::name_str(&record.name),
            channels,
            samplers,
        });
    }

    let mut images = Vec::with_capacity(header.image_count as usize);
    for record in reader.read_array::<ImageRecord>(header.image_offset, header.image_count)? {
        images.push(register_image(&reader, &record, gpu)?);
    }

    let materials = reader
        .read_array::<MaterialRecord>(header.material_offset, header.material_count)?
        .iter()
        .map(|record| ModelMaterial {
            name: pack::name_str(&record.name),
            diffuse_map_descriptor_index: material_map_descriptor(
                record.diffuse_image_index,
                &images,
                gpu,
                defaults.diffuse_map_descriptor_index,
            ),
            metallic_map_descriptor_index: material_map_descriptor(
                record.metallic_image_index,
                &images,
                gpu,
                defaults.metallic_map_descriptor_index,
            ),
            roughness_map_descriptor_index: material_map_descriptor(
                record.roughness_image_index,
                &images,
                gpu,
                defaults.roughness_map_descriptor_index,
            ),
            normal_map_descriptor_index: material_map_descriptor(
                record.normal_image_index,
                &images,
                gpu,
                defaults.normal_map_descriptor_index,
            ),
            diffuse_factor: Vec4::from(record.diffuse_factor),
            metallic_factor: record.metallic_factor,
            roughness_factor: record.roughness_factor,
        })
        .collect();

    Ok(Model {
        gpk_file: gpk_file.to_owned(),
        scenes,
        nodes,
        meshes,
        skins,
        animations,
        materials,
    })
}

/// Visit every node reachable from the scene roots, pre-order.
///
/// Implemented with an explicit worklist; children are visited in declaration
/// order, parents strictly before children.
pub fn visit_scene_nodes<F>(scenes: &[ModelScene], nodes: &[ModelNode], mut f: F)
where
    F: FnMut(usize, &ModelNode),
{
    let mut stack = Vec::new();
    for scene in scenes {
        for &root in &scene.node_indices {
            stack.push(root);
            while let Some(index) = stack.pop() {
                let node = &nodes[index];
                f(index, node);
                for &child in node.children.iter().rev() {
                    stack.push(child);
                }
            }
        }
    }
}

/// Visit every node reachable from the scene roots, pre-order, accumulating
/// the global transform as parent-then-local (root-to-node composition).
pub fn visit_scene_nodes_with_transform<F>(scenes: &[ModelScene], nodes: &[ModelNode], mut f: F)
where
    F: FnMut(usize, &ModelNode, &Mat4),
{
    let mut stack: Vec<(usize, Mat4)> = Vec::new();
    for scene in scenes {
        for &root in &scene.node_indices {
            stack.push((root, Mat4::identity()));
            while let Some((index, parent_transform)) = stack.pop() {
                let node = &nodes[index];
                let global = parent_transform * node.local_matrix;
                f(index, node, &global);
                for &child in node.children.iter().rev() {
                    stack.push((child, global));
                }
            }
        }
    }
}

/// Global transform per node, `None` for nodes unreachable from any scene root.
pub fn global_node_transforms(scenes: &[ModelScene], nodes: &[ModelNode]) -> Vec<Option<Mat4>> {
    let mut globals = vec![None; nodes.len()];
    visit_scene_nodes_with_transform(scenes, nodes, |index, _, global| {
        globals[index] = Some(*global);
    });
    globals
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::foundation::math::Quat;

    fn chain_nodes() -> (Vec<ModelScene>, Vec<ModelNode>) {
        // root(translate x+1) -> child(translate y+2), plus an orphan node 2
        let make = |translate: Vec3, children: Vec<usize>| {
            let local_transform = Transform {
                translate,
                rotate: Quat::identity(),
                scale: Vec3::new(1.0, 1.0, 1.0),
            };
            ModelNode {
                mesh_index: None,
                local_matrix: local_transform.to_matrix(),
                local_transform,
                children,
            }
        };
        let nodes = vec![
            make(Vec3::new(1.0, 0.0, 0.0), vec![1]),
            make(Vec3::new(0.0, 2.0, 0.0), vec![]),
            make(Vec3::new(9.0, 9.0, 9.0), vec![]),
        ];
        let scenes = vec![ModelScene {
            name: "scene".to_owned(),
            node_indices: vec![0],
        }];
        (scenes, nodes)
    }

    #[test]
    fn traversal_is_pre_order_parent_first() {
        let (scenes, nodes) = chain_nodes();
        let mut order = Vec::new();
        visit_scene_nodes(&scenes, &nodes, |index, _| order.push(index));
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn global_transforms_compose_parent_then_local() {
        let (scenes, nodes) = chain_nodes();
        let globals = global_node_transforms(&scenes, &nodes);
        let child = globals[1].expect("child reachable");
        let p = child.transform_point(&nalgebra::Point3::origin());
        assert_relative_eq!(p.x, 1.0, epsilon = 1.0e-6);
        assert_relative_eq!(p.y, 2.0, epsilon = 1.0e-6);
        assert!(globals[2].is_none(), "orphan node must stay unvisited");
    }
}
