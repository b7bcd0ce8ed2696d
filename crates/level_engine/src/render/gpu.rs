//! Graphics memory-region collaborator interface
//!
//! The renderer proper lives behind [`GpuRegions`]: an append-only vertex
//! region and image/descriptor tables that persist for the level lifetime,
//! plus a uniform region that is reset at every frame boundary. The level
//! never allocates GPU memory itself; it only appends.

use bytemuck::{Pod, Zeroable};

/// Texel formats the asset pipeline can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// 8-bit single channel, unsigned normalized
    R8Unorm,
    /// 8-bit RGBA, unsigned normalized
    Rgba8Unorm,
    /// 8-bit RGBA, sRGB
    Rgba8Srgb,
    /// 16-bit single channel, signed normalized (terrain height maps)
    R16Snorm,
    /// BC7 block compressed RGBA
    Bc7Unorm,
}

impl ImageFormat {
    /// Decode the on-disk format id used by the pack headers.
    pub fn from_pack_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Self::R8Unorm),
            1 => Some(Self::Rgba8Unorm),
            2 => Some(Self::Rgba8Srgb),
            3 => Some(Self::R16Snorm),
            4 => Some(Self::Bc7Unorm),
            _ => None,
        }
    }
}

/// Description of an image to register in the image region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDesc {
    /// Texel format
    pub format: ImageFormat,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Mipmap chain length
    pub mip_count: u32,
    /// Array layer count (6 for cubemaps)
    pub layer_count: u32,
    /// Whether a cube view can be created over the layers
    pub cube_compatible: bool,
}

/// Sampler selection for combined image samplers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerKind {
    /// Trilinear sampler clamped to the given mip chain length
    Mipmap(u32),
    /// Repeat-addressed sampler used for terrain height/diffuse maps
    Terrain,
    /// Clamp-to-edge sampler used for skybox cubemaps
    SkyboxCube,
}

/// Append/allocate primitives exposed by the graphics memory allocator.
pub trait GpuRegions {
    /// Copy vertex or index data into the static vertex region.
    ///
    /// Returns the byte offset of the copy, aligned to `stride`.
    fn append_vertex_region(&mut self, data: &[u8], stride: u32) -> u32;

    /// Register an image and upload its texel data. Returns the image index.
    fn append_image_region(
        &mut self,
        desc: &ImageDesc,
        data: &[u8],
        block_dim: u32,
        block_size: u32,
    ) -> u32;

    /// Create a combined 2D image sampler descriptor. Returns its index.
    fn append_combined_2d_sampler(&mut self, image_index: u32, sampler: SamplerKind) -> u32;

    /// Create a combined cube image sampler descriptor. Returns its index.
    fn append_combined_cube_sampler(&mut self, image_index: u32, sampler: SamplerKind) -> u32;

    /// Copy data into the per-frame uniform region. Returns the byte offset.
    fn append_uniform_region(&mut self, data: &[u8]) -> u32;

    /// Reset the per-frame regions at a frame boundary.
    fn reset_frame_regions(&mut self);
}

/// Append a single plain-old-data uniform block.
pub fn append_uniform<T: Pod>(gpu: &mut dyn GpuRegions, value: &T) -> u32 {
    gpu.append_uniform_region(bytemuck::bytes_of(value))
}

/// Minimum alignment for uniform region offsets.
pub const UNIFORM_OFFSET_ALIGNMENT: u32 = 256;

/// Per-level uniform block, appended first every frame (offset 0).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LevelUniform {
    /// Camera view-projection matrix, clip-space corrected
    pub view_proj: [[f32; 4]; 4],
    /// Camera world position (w unused)
    pub camera_position: [f32; 4],
    /// Shadow map view-projection matrix
    pub shadow_map_proj: [[f32; 4]; 4],
    /// Ambient light color (w unused)
    pub ambient_light_color: [f32; 4],
    /// Directional light color (w unused)
    pub directional_light_color: [f32; 4],
    /// Directional light direction (w unused)
    pub directional_light_dir: [f32; 4],
    /// Point light color (w unused)
    pub point_light_color: [f32; 4],
    /// Point light position; w carries the attenuation factor
    pub point_light_position: [f32; 4],
}

/// Per-model-instance uniform block.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ModelUniform {
    /// Entity transform composed with the model adjustment transform
    pub model: [[f32; 4]; 4],
}

/// Per-mesh uniform block for non-skinned meshes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MeshUniform {
    /// Global node transform from the scene traversal
    pub transform: [[f32; 4]; 4],
}

/// Per-primitive material factors.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PrimitiveUniform {
    /// Diffuse color multiplier
    pub diffuse_factor: [f32; 4],
    /// Metalness multiplier
    pub metallic_factor: f32,
    /// Roughness multiplier
    pub roughness_factor: f32,
    /// Pad to 16-byte std140 stride
    pub _pad: [f32; 2],
}

/// In-memory [`GpuRegions`] implementation.
///
/// Backs the editor's headless paths and the test suite; a Vulkan-backed
/// allocator implements the same trait in the renderer crate.
#[derive(Default)]
pub struct InMemoryRegions {
    vertex_data: Vec<u8>,
    uniform_data: Vec<u8>,
    images: Vec<(ImageDesc, usize)>,
    combined_2d_samplers: Vec<(u32, SamplerKind)>,
    combined_cube_samplers: Vec<(u32, SamplerKind)>,
}

impl InMemoryRegions {
    /// Create empty regions
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes currently in the static vertex region
    pub fn vertex_region_len(&self) -> usize {
        self.vertex_data.len()
    }

    /// Bytes currently in the per-frame uniform region
    pub fn uniform_region_len(&self) -> usize {
        self.uniform_data.len()
    }

    /// Read back a slice of the uniform region
    pub fn uniform_bytes(&self, offset: u32, len: usize) -> &[u8] {
        &self.uniform_data[offset as usize..offset as usize + len]
    }

    /// Read back a slice of the vertex region
    pub fn vertex_bytes(&self, offset: u32, len: usize) -> &[u8] {
        &self.vertex_data[offset as usize..offset as usize + len]
    }

    /// Number of registered images
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Description of a registered image
    pub fn image_desc(&self, index: u32) -> Option<&ImageDesc> {
        self.images.get(index as usize).map(|(desc, _)| desc)
    }

    /// Number of combined 2D samplers
    pub fn combined_2d_sampler_count(&self) -> usize {
        self.combined_2d_samplers.len()
    }

    /// Number of combined cube samplers
    pub fn combined_cube_sampler_count(&self) -> usize {
        self.combined_cube_samplers.len()
    }

    fn align_vertex_region(&mut self, stride: u32) {
        let stride = stride.max(1) as usize;
        let rem = self.vertex_data.len() % stride;
        if rem != 0 {
            self.vertex_data.resize(self.vertex_data.len() + stride - rem, 0);
        }
    }
}

impl GpuRegions for InMemoryRegions {
    fn append_vertex_region(&mut self, data: &[u8], stride: u32) -> u32 {
        self.align_vertex_region(stride);
        let offset = self.vertex_data.len() as u32;
        self.vertex_data.extend_from_slice(data);
        offset
    }

    fn append_image_region(
        &mut self,
        desc: &ImageDesc,
        data: &[u8],
        _block_dim: u32,
        _block_size: u32,
    ) -> u32 {
        let index = self.images.len() as u32;
        self.images.push((*desc, data.len()));
        index
    }

    fn append_combined_2d_sampler(&mut self, image_index: u32, sampler: SamplerKind) -> u32 {
        let index = self.combined_2d_samplers.len() as u32;
        self.combined_2d_samplers.push((image_index, sampler));
        index
    }

    fn append_combined_cube_sampler(&mut self, image_index: u32, sampler: SamplerKind) -> u32 {
        let index = self.combined_cube_samplers.len() as u32;
        self.combined_cube_samplers.push((image_index, sampler));
        index
    }

    fn append_uniform_region(&mut self, data: &[u8]) -> u32 {
        let align = UNIFORM_OFFSET_ALIGNMENT as usize;
        let rem = self.uniform_data.len() % align;
        if rem != 0 {
            self.uniform_data.resize(self.uniform_data.len() + align - rem, 0);
        }
        let offset = self.uniform_data.len() as u32;
        self.uniform_data.extend_from_slice(data);
        offset
    }

    fn reset_frame_regions(&mut self) {
        self.uniform_data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_appends_respect_stride_alignment() {
        let mut gpu = InMemoryRegions::new();
        let first = gpu.append_vertex_region(&[0u8; 10], 1);
        let second = gpu.append_vertex_region(&[0u8; 20], 20);
        assert_eq!(first, 0);
        assert_eq!(second, 20);
    }

    #[test]
    fn uniform_region_resets_each_frame() {
        let mut gpu = InMemoryRegions::new();
        let offset = append_uniform(&mut gpu, &ModelUniform::zeroed());
        assert_eq!(offset, 0);
        let next = append_uniform(&mut gpu, &ModelUniform::zeroed());
        assert_eq!(next, UNIFORM_OFFSET_ALIGNMENT);
        gpu.reset_frame_regions();
        assert_eq!(gpu.uniform_region_len(), 0);
    }
}
