//! Binary "gpk" pack format
//!
//! Every asset kind (model, skybox, terrain) is a single pre-baked file: a
//! fixed signature, then counts and byte offsets (relative to file start)
//! locating flat arrays of fixed-size records, with vertex/index/texel data
//! embedded inline. All records are `#[repr(C)]` plain-old-data read with
//! bytemuck; multi-byte fields use the host's native layout.

use bytemuck::{Pod, Zeroable};

use super::AssetError;

/// Signature at the start of every model pack
pub const MODEL_SIGNATURE: [u8; 8] = *b"GPKMODL\0";

/// Signature at the start of every skybox pack
pub const SKYBOX_SIGNATURE: [u8; 8] = *b"GPKSKYB\0";

/// Signature at the start of every terrain pack
pub const TERRAIN_SIGNATURE: [u8; 8] = *b"GPKTERR\0";

/// Length of the fixed name field carried by named records
pub const NAME_LEN: usize = 32;

/// Maximum root nodes per scene record
pub const SCENE_MAX_NODES: usize = 8;

/// Maximum children per node record
pub const NODE_MAX_CHILDREN: usize = 8;

/// Sentinel for "no index" in u32 record fields
pub const INVALID_INDEX: u32 = u32::MAX;

/// Model pack header.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ModelHeader {
    /// Must equal [`MODEL_SIGNATURE`]
    pub signature: [u8; 8],
    /// Scene record count
    pub scene_count: u32,
    /// Byte offset of the scene records
    pub scene_offset: u32,
    /// Node record count
    pub node_count: u32,
    /// Byte offset of the node records
    pub node_offset: u32,
    /// Mesh record count
    pub mesh_count: u32,
    /// Byte offset of the mesh records
    pub mesh_offset: u32,
    /// Skin record count
    pub skin_count: u32,
    /// Byte offset of the skin records
    pub skin_offset: u32,
    /// Animation record count
    pub animation_count: u32,
    /// Byte offset of the animation records
    pub animation_offset: u32,
    /// Material record count
    pub material_count: u32,
    /// Byte offset of the material records
    pub material_offset: u32,
    /// Image record count
    pub image_count: u32,
    /// Byte offset of the image records
    pub image_offset: u32,
}

/// Scale/rotate/translate triple as stored on disk.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TransformRecord {
    /// Per-axis scale
    pub scale: [f32; 3],
    /// Rotation quaternion, x/y/z/w
    pub rotate: [f32; 4],
    /// Translation
    pub translate: [f32; 3],
}

impl TransformRecord {
    /// Identity transform record
    pub fn identity() -> Self {
        Self {
            scale: [1.0, 1.0, 1.0],
            rotate: [0.0, 0.0, 0.0, 1.0],
            translate: [0.0, 0.0, 0.0],
        }
    }
}

/// One root scene of the node DAG.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SceneRecord {
    /// NUL-padded scene name
    pub name: [u8; NAME_LEN],
    /// Root node indices; only the first `node_index_count` are valid
    pub node_indices: [u32; SCENE_MAX_NODES],
    /// Number of valid root node indices
    pub node_index_count: u32,
}

/// One node of the hierarchy.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct NodeRecord {
    /// Mesh index or [`INVALID_INDEX`]
    pub mesh_index: u32,
    /// Local transform relative to the parent
    pub local_transform: TransformRecord,
    /// Child node indices; only the first `child_count` are valid
    pub children: [u32; NODE_MAX_CHILDREN],
    /// Number of valid children
    pub child_count: u32,
}

/// One mesh: a name plus a primitive array.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MeshRecord {
    /// NUL-padded mesh name
    pub name: [u8; NAME_LEN],
    /// Primitive record count
    pub primitive_count: u32,
    /// Byte offset of the primitive records
    pub primitive_offset: u32,
}

/// One draw batch of a mesh.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PrimitiveRecord {
    /// Material index or [`INVALID_INDEX`]
    pub material_index: u32,
    /// Number of u16 indices
    pub index_count: u32,
    /// Byte offset of the index data
    pub indices_offset: u32,
    /// Number of vertices
    pub vertex_count: u32,
    /// Byte offset of the vertex data
    pub vertices_offset: u32,
    /// Non-zero when vertices carry joint indices/weights
    pub has_joints: u32,
}

/// One skin: a name plus a joint array.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SkinRecord {
    /// NUL-padded skin name
    pub name: [u8; NAME_LEN],
    /// Joint record count
    pub joint_count: u32,
    /// Byte offset of the joint records
    pub joints_offset: u32,
}

/// One joint binding a node to an inverse bind matrix.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct JointRecord {
    /// Node driven by this joint
    pub node_index: u32,
    /// Inverse bind matrix, column major
    pub inverse_bind: [[f32; 4]; 4],
}

/// One animation: channels driving nodes via samplers.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct AnimationRecord {
    /// NUL-padded animation name
    pub name: [u8; NAME_LEN],
    /// Channel record count
    pub channel_count: u32,
    /// Byte offset of the channel records
    pub channel_offset: u32,
    /// Sampler record count
    pub sampler_count: u32,
    /// Byte offset of the sampler records
    pub sampler_offset: u32,
}

/// Channel path id: translation keys
pub const CHANNEL_TRANSLATE: u32 = 0;
/// Channel path id: rotation keys
pub const CHANNEL_ROTATE: u32 = 1;
/// Channel path id: scale keys
pub const CHANNEL_SCALE: u32 = 2;

/// Sampler interpolation id: linear (slerp for rotations)
pub const INTERPOLATION_LINEAR: u32 = 0;

/// One animation channel.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ChannelRecord {
    /// Node driven by this channel
    pub node_index: u32,
    /// One of the `CHANNEL_*` path ids
    pub channel_type: u32,
    /// Sampler record providing the keyed values
    pub sampler_index: u32,
}

/// One animation sampler.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SamplerRecord {
    /// One of the `INTERPOLATION_*` ids
    pub interpolation: u32,
    /// Key frame record count
    pub key_frame_count: u32,
    /// Byte offset of the key frame records
    pub key_frame_offset: u32,
}

/// One key frame of a sampler track.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct KeyFrameRecord {
    /// Key time in seconds
    pub time: f32,
    /// Payload: xyz for translate/scale, xyzw for rotate
    pub data: [f32; 4],
}

/// One material.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaterialRecord {
    /// NUL-padded material name
    pub name: [u8; NAME_LEN],
    /// Diffuse image index or [`INVALID_INDEX`]
    pub diffuse_image_index: u32,
    /// Metallic image index or [`INVALID_INDEX`]
    pub metallic_image_index: u32,
    /// Roughness image index or [`INVALID_INDEX`]
    pub roughness_image_index: u32,
    /// Normal image index or [`INVALID_INDEX`]
    pub normal_image_index: u32,
    /// Diffuse color multiplier
    pub diffuse_factor: [f32; 4],
    /// Metalness multiplier
    pub metallic_factor: f32,
    /// Roughness multiplier
    pub roughness_factor: f32,
}

/// One embedded image.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ImageRecord {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Mipmap chain length
    pub mip_count: u32,
    /// Array layer count
    pub layer_count: u32,
    /// Format id decoded by `ImageFormat::from_pack_id`
    pub format: u32,
    /// Compression block dimension (1 for uncompressed)
    pub block_dim: u32,
    /// Bytes per block/texel
    pub block_size: u32,
    /// Total texel data size in bytes
    pub size: u32,
    /// Byte offset of the texel data
    pub data_offset: u32,
}

/// Skybox pack header.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SkyboxHeader {
    /// Must equal [`SKYBOX_SIGNATURE`]
    pub signature: [u8; 8],
    /// Cubemap format id
    pub cubemap_format: u32,
    /// Face width in texels
    pub cubemap_width: u32,
    /// Face height in texels
    pub cubemap_height: u32,
    /// Mipmap chain length
    pub cubemap_mip_count: u32,
    /// Layer count (6 faces)
    pub cubemap_layer_count: u32,
    /// Compression block dimension
    pub cubemap_block_dim: u32,
    /// Bytes per block/texel
    pub cubemap_block_size: u32,
    /// Total texel data size in bytes
    pub cubemap_size: u32,
    /// Byte offset of the texel data
    pub cubemap_offset: u32,
}

/// Terrain pack header.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TerrainHeader {
    /// Must equal [`TERRAIN_SIGNATURE`]
    pub signature: [u8; 8],
    /// Height map width in samples (must be square, power of two)
    pub height_map_width: u32,
    /// Height map height in samples
    pub height_map_height: u32,
    /// Height map data size in bytes (2 bytes per sample)
    pub height_map_size: u32,
    /// Byte offset of the height samples
    pub height_map_offset: u32,
    /// Diffuse map width in texels (must be square, power of two)
    pub diffuse_map_width: u32,
    /// Diffuse map height in texels
    pub diffuse_map_height: u32,
    /// Diffuse map data size in bytes
    pub diffuse_map_size: u32,
    /// Byte offset of the diffuse texels
    pub diffuse_map_offset: u32,
}

/// Vertex layout of model primitive data.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ModelVertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Object-space normal
    pub normal: [f32; 3],
    /// Texture coordinates
    pub uv: [f32; 2],
    /// Joint indices into the skin joint array
    pub joint_indices: [u8; 4],
    /// Normalized joint weights
    pub joint_weights: [u8; 4],
}

/// Vertex layout of the static terrain grid.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TerrainVertex {
    /// World-space position at zero height
    pub position: [f32; 3],
    /// Height/diffuse map coordinates
    pub uv: [f32; 2],
}

/// Bounds-checked reader over a mapped pack file.
pub struct PackReader<'a> {
    bytes: &'a [u8],
}

impl<'a> PackReader<'a> {
    /// Wrap raw file bytes
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Read one record at the given byte offset.
    pub fn read<T: Pod>(&self, offset: u32) -> Result<T, AssetError> {
        let start = offset as usize;
        let end = start
            .checked_add(std::mem::size_of::<T>())
            .filter(|end| *end <= self.bytes.len())
            .ok_or(AssetError::Truncated { offset })?;
        Ok(bytemuck::pod_read_unaligned(&self.bytes[start..end]))
    }

    /// Read `count` consecutive records starting at the given byte offset.
    pub fn read_array<T: Pod>(&self, offset: u32, count: u32) -> Result<Vec<T>, AssetError> {
        let stride = std::mem::size_of::<T>() as u32;
        (0..count)
            .map(|i| {
                let record_offset = i
                    .checked_mul(stride)
                    .and_then(|relative| offset.checked_add(relative))
                    .ok_or(AssetError::Truncated { offset })?;
                self.read::<T>(record_offset)
            })
            .collect()
    }

    /// Borrow a raw byte range (vertex/index/texel payloads).
    pub fn bytes(&self, offset: u32, size: u32) -> Result<&'a [u8], AssetError> {
        let start = offset as usize;
        let end = start
            .checked_add(size as usize)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(AssetError::Truncated { offset })?;
        Ok(&self.bytes[start..end])
    }
}

/// Decode a NUL-padded fixed-size name field.
pub fn name_str(name: &[u8]) -> String {
    let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
    String::from_utf8_lossy(&name[..end]).into_owned()
}

/// Check a pack signature, reporting the asset path on mismatch.
pub fn check_signature(
    actual: [u8; 8],
    expected: [u8; 8],
    path: &str,
) -> Result<(), AssetError> {
    if actual == expected {
        Ok(())
    } else {
        Err(AssetError::BadSignature {
            path: path.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layouts_have_expected_strides() {
        assert_eq!(std::mem::size_of::<TerrainVertex>(), 20);
        assert_eq!(std::mem::size_of::<ModelVertex>(), 40);
    }

    #[test]
    fn reader_rejects_out_of_range_records() {
        let bytes = vec![0u8; 16];
        let reader = PackReader::new(&bytes);
        assert!(reader.read::<ModelHeader>(0).is_err());
        assert!(reader.bytes(8, 16).is_err());
    }

    #[test]
    fn name_field_stops_at_nul() {
        let mut name = [0u8; NAME_LEN];
        name[..5].copy_from_slice(b"torso");
        assert_eq!(name_str(&name), "torso");
    }
}
