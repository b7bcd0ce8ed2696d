//! Asset loading and management
//!
//! Assets (models, skyboxes, terrains) are immutable once loaded: entities
//! reference them by index into the [`AssetStore`] tables and the tables only
//! grow, so indices stay stable for the level lifetime. Each asset is keyed by
//! its pack file path; loading the same path twice is an authoring error.

pub mod debug_geometry;
pub mod model;
pub mod pack;
pub mod skybox;
pub mod terrain;

use crate::config::LevelConfig;
use crate::physics::PhysicsWorld;
use crate::render::gpu::{GpuRegions, ImageDesc, ImageFormat, SamplerKind};

pub use model::{Model, ModelNode, ModelScene};
pub use skybox::Skybox;
pub use terrain::Terrain;

/// Asset loading errors
#[derive(thiserror::Error, Debug)]
pub enum AssetError {
    /// File could not be read
    #[error("Failed to read asset file: {0}")]
    Io(#[from] std::io::Error),

    /// Pack data ended before a record or payload
    #[error("Pack data truncated at offset {offset}")]
    Truncated {
        /// Byte offset of the out-of-range read
        offset: u32,
    },

    /// Pack signature did not match the expected asset kind
    #[error("Bad pack signature in {path}")]
    BadSignature {
        /// Offending pack file path
        path: String,
    },

    /// Pack contents violate a format rule
    #[error("Malformed pack: {what}")]
    Malformed {
        /// What rule was violated
        what: String,
    },

    /// Terrain map dimensions are not square powers of two
    #[error("Invalid dimensions in {path}: {what}")]
    InvalidDimensions {
        /// Offending pack file path
        path: String,
        /// Offending map and its dimensions
        what: String,
    },

    /// The same pack file was loaded twice
    #[error("Asset already loaded: {path}")]
    DuplicateAsset {
        /// Pack file path of the existing asset
        path: String,
    },

    /// An asset table is full
    #[error("{what} capacity exceeded ({capacity})")]
    CapacityExceeded {
        /// Which table overflowed
        what: &'static str,
        /// Configured capacity
        capacity: usize,
    },
}

/// Fallback material map descriptors, registered once at store creation.
///
/// Materials without one of the maps sample these instead, so every primitive
/// binds the full map set regardless of what its pack carried.
#[derive(Debug, Clone, Copy)]
pub struct DefaultMaps {
    /// 2x2 opaque white sRGB
    pub diffuse_map_descriptor_index: u32,
    /// 2x2 full metalness
    pub metallic_map_descriptor_index: u32,
    /// 2x2 full roughness
    pub roughness_map_descriptor_index: u32,
    /// 2x2 straight-up tangent-space normal
    pub normal_map_descriptor_index: u32,
    /// 2x2 zero height
    pub height_map_descriptor_index: u32,
}

impl DefaultMaps {
    fn register(gpu: &mut dyn GpuRegions) -> Self {
        let map_2x2 = |gpu: &mut dyn GpuRegions, format, data: &[u8], block_size| {
            let desc = ImageDesc {
                format,
                width: 2,
                height: 2,
                mip_count: 1,
                layer_count: 1,
                cube_compatible: false,
            };
            let image = gpu.append_image_region(&desc, data, 1, block_size);
            gpu.append_combined_2d_sampler(image, SamplerKind::Mipmap(1))
        };
        Self {
            diffuse_map_descriptor_index: map_2x2(gpu, ImageFormat::Rgba8Srgb, &[255u8; 16], 4),
            metallic_map_descriptor_index: map_2x2(gpu, ImageFormat::R8Unorm, &[255u8; 4], 1),
            roughness_map_descriptor_index: map_2x2(gpu, ImageFormat::R8Unorm, &[255u8; 4], 1),
            normal_map_descriptor_index: map_2x2(
                gpu,
                ImageFormat::Rgba8Unorm,
                &[128, 128, 255, 0, 128, 128, 255, 0, 128, 128, 255, 0, 128, 128, 255, 0],
                4,
            ),
            height_map_descriptor_index: map_2x2(gpu, ImageFormat::R16Snorm, &[0u8; 8], 2),
        }
    }
}

/// Location of a line-list wireframe in the vertex region.
#[derive(Debug, Clone, Copy)]
pub struct DebugGeometrySpan {
    /// Byte offset of the first vertex
    pub vertex_offset: u32,
    /// Vertex count (an even number; line list)
    pub vertex_count: u32,
}

/// Static geometry appended to the vertex region at store creation.
#[derive(Debug, Clone, Copy)]
pub struct PersistentGeometry {
    /// Wireframe cube for entity bounds
    pub bound_box: DebugGeometrySpan,
    /// Wireframe sphere
    pub sphere: DebugGeometrySpan,
    /// Wireframe cylinder
    pub cylinder: DebugGeometrySpan,
    /// Flat ring
    pub hollow_circle: DebugGeometrySpan,
    /// Wireframe torus
    pub torus: DebugGeometrySpan,
    /// Byte offset of the shared terrain grid
    pub terrain_vertex_offset: u32,
    /// Terrain grid vertex count
    pub terrain_vertex_count: u32,
}

impl PersistentGeometry {
    fn register(gpu: &mut dyn GpuRegions) -> Self {
        let debug_span = |gpu: &mut dyn GpuRegions, vertices: Vec<[f32; 3]>| {
            let stride = std::mem::size_of::<[f32; 3]>() as u32;
            DebugGeometrySpan {
                vertex_offset: gpu.append_vertex_region(bytemuck::cast_slice(&vertices), stride),
                vertex_count: vertices.len() as u32,
            }
        };
        let bound_box = debug_span(gpu, debug_geometry::bound_box_vertices());
        let sphere = debug_span(gpu, debug_geometry::sphere_vertices());
        let cylinder = debug_span(gpu, debug_geometry::cylinder_vertices());
        let hollow_circle = debug_span(gpu, debug_geometry::hollow_circle_vertices());
        let torus = debug_span(gpu, debug_geometry::torus_vertices());

        let grid =
            terrain::terrain_grid_vertices(terrain::TERRAIN_RESOLUTION, terrain::TERRAIN_SIZE);
        let terrain_stride = std::mem::size_of::<pack::TerrainVertex>() as u32;
        let terrain_vertex_offset =
            gpu.append_vertex_region(bytemuck::cast_slice(&grid), terrain_stride);

        Self {
            bound_box,
            sphere,
            cylinder,
            hollow_circle,
            torus,
            terrain_vertex_offset,
            terrain_vertex_count: grid.len() as u32,
        }
    }
}

/// Loaded asset tables plus the persistent GPU resources they depend on.
pub struct AssetStore {
    models: Vec<Model>,
    skyboxes: Vec<Skybox>,
    terrains: Vec<Terrain>,
    skybox_index: Option<usize>,
    defaults: DefaultMaps,
    geometry: PersistentGeometry,
    model_capacity: usize,
    skybox_capacity: usize,
    terrain_capacity: usize,
    store_vertices: bool,
}

impl AssetStore {
    /// Create an empty store, registering default maps and static geometry.
    pub fn new(config: &LevelConfig, gpu: &mut dyn GpuRegions) -> Self {
        Self {
            models: Vec::new(),
            skyboxes: Vec::new(),
            terrains: Vec::new(),
            skybox_index: None,
            defaults: DefaultMaps::register(gpu),
            geometry: PersistentGeometry::register(gpu),
            model_capacity: config.model_capacity,
            skybox_capacity: config.skybox_capacity,
            terrain_capacity: config.terrain_capacity,
            store_vertices: config.store_vertices,
        }
    }

    fn check_unique(&self, gpk_file: &str) -> Result<(), AssetError> {
        let taken = self.models.iter().any(|m| m.gpk_file == gpk_file)
            || self.skyboxes.iter().any(|s| s.gpk_file == gpk_file)
            || self.terrains.iter().any(|t| t.gpk_file == gpk_file);
        if taken {
            Err(AssetError::DuplicateAsset {
                path: gpk_file.to_owned(),
            })
        } else {
            Ok(())
        }
    }

    /// Load a model pack from disk. Returns the new model index.
    pub fn add_model(&mut self, gpk_file: &str, gpu: &mut dyn GpuRegions) -> Result<usize, AssetError> {
        let bytes = std::fs::read(gpk_file)?;
        self.add_model_bytes(gpk_file, &bytes, gpu)
    }

    /// Load a model pack from memory. Returns the new model index.
    pub fn add_model_bytes(
        &mut self,
        gpk_file: &str,
        bytes: &[u8],
        gpu: &mut dyn GpuRegions,
    ) -> Result<usize, AssetError> {
        self.check_unique(gpk_file)?;
        if self.models.len() >= self.model_capacity {
            return Err(AssetError::CapacityExceeded {
                what: "model",
                capacity: self.model_capacity,
            });
        }
        let model = model::load_model(gpk_file, bytes, gpu, &self.defaults, self.store_vertices)?;
        log::info!("loaded model '{gpk_file}' ({} nodes)", model.nodes.len());
        self.models.push(model);
        Ok(self.models.len() - 1)
    }

    /// Load a skybox pack from disk and make it the active skybox.
    pub fn add_skybox(&mut self, gpk_file: &str, gpu: &mut dyn GpuRegions) -> Result<usize, AssetError> {
        let bytes = std::fs::read(gpk_file)?;
        self.add_skybox_bytes(gpk_file, &bytes, gpu)
    }

    /// Load a skybox pack from memory and make it the active skybox.
    pub fn add_skybox_bytes(
        &mut self,
        gpk_file: &str,
        bytes: &[u8],
        gpu: &mut dyn GpuRegions,
    ) -> Result<usize, AssetError> {
        self.check_unique(gpk_file)?;
        if self.skyboxes.len() >= self.skybox_capacity {
            return Err(AssetError::CapacityExceeded {
                what: "skybox",
                capacity: self.skybox_capacity,
            });
        }
        let skybox = skybox::load_skybox(gpk_file, bytes, gpu)?;
        log::info!("loaded skybox '{gpk_file}'");
        self.skyboxes.push(skybox);
        let index = self.skyboxes.len() - 1;
        self.skybox_index = Some(index);
        Ok(index)
    }

    /// Load a terrain pack from disk. Returns the new terrain index.
    pub fn add_terrain(
        &mut self,
        gpk_file: &str,
        gpu: &mut dyn GpuRegions,
        physics: &mut dyn PhysicsWorld,
    ) -> Result<usize, AssetError> {
        let bytes = std::fs::read(gpk_file)?;
        self.add_terrain_bytes(gpk_file, &bytes, gpu, physics)
    }

    /// Load a terrain pack from memory. Returns the new terrain index.
    pub fn add_terrain_bytes(
        &mut self,
        gpk_file: &str,
        bytes: &[u8],
        gpu: &mut dyn GpuRegions,
        physics: &mut dyn PhysicsWorld,
    ) -> Result<usize, AssetError> {
        self.check_unique(gpk_file)?;
        if self.terrains.len() >= self.terrain_capacity {
            return Err(AssetError::CapacityExceeded {
                what: "terrain",
                capacity: self.terrain_capacity,
            });
        }
        let terrain = terrain::load_terrain(gpk_file, bytes, gpu, physics)?;
        log::info!("loaded terrain '{gpk_file}'");
        self.terrains.push(terrain);
        Ok(self.terrains.len() - 1)
    }

    /// Loaded models, in load order
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Loaded skyboxes, in load order
    pub fn skyboxes(&self) -> &[Skybox] {
        &self.skyboxes
    }

    /// Loaded terrains, in load order
    pub fn terrains(&self) -> &[Terrain] {
        &self.terrains
    }

    /// Index of the model loaded from `gpk_file`, if any
    pub fn model_index(&self, gpk_file: &str) -> Option<usize> {
        self.models.iter().position(|m| m.gpk_file == gpk_file)
    }

    /// Index of the terrain loaded from `gpk_file`, if any
    pub fn terrain_index(&self, gpk_file: &str) -> Option<usize> {
        self.terrains.iter().position(|t| t.gpk_file == gpk_file)
    }

    /// Active skybox index, if a skybox is loaded
    pub fn skybox_index(&self) -> Option<usize> {
        self.skybox_index
    }

    /// Select the active skybox
    pub fn set_skybox_index(&mut self, index: Option<usize>) {
        if let Some(index) = index {
            assert!(index < self.skyboxes.len(), "skybox index out of range");
        }
        self.skybox_index = index;
    }

    /// Default material map descriptors
    pub fn defaults(&self) -> &DefaultMaps {
        &self.defaults
    }

    /// Static geometry locations
    pub fn geometry(&self) -> &PersistentGeometry {
        &self.geometry
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::BasicPhysicsWorld;
    use crate::render::gpu::InMemoryRegions;

    fn store(gpu: &mut InMemoryRegions) -> AssetStore {
        AssetStore::new(&LevelConfig::default(), gpu)
    }

    #[test]
    fn store_registers_defaults_and_static_geometry() {
        let mut gpu = InMemoryRegions::new();
        let store = store(&mut gpu);
        // 5 default maps
        assert_eq!(gpu.image_count(), 5);
        let geometry = store.geometry();
        assert_eq!(
            geometry.terrain_vertex_count,
            terrain::TERRAIN_RESOLUTION * terrain::TERRAIN_RESOLUTION * 6
        );
        assert_eq!(geometry.terrain_vertex_offset % 20, 0);
    }

    #[test]
    fn model_load_resolves_materials_to_default_maps() {
        let mut gpu = InMemoryRegions::new();
        let mut store = store(&mut gpu);
        let index = store
            .add_model_bytes("tri.gpk", &testkit::triangle_model_pack(), &mut gpu)
            .expect("valid pack");
        assert_eq!(index, 0);
        let model = &store.models()[0];
        assert_eq!(model.scenes.len(), 1);
        assert_eq!(model.nodes.len(), 2);
        let mat = &model.materials[0];
        assert_eq!(
            mat.diffuse_map_descriptor_index,
            store.defaults().diffuse_map_descriptor_index
        );
        assert_eq!(store.model_index("tri.gpk"), Some(0));
        assert_eq!(store.model_index("other.gpk"), None);
    }

    #[test]
    fn textured_model_gets_its_own_sampler() {
        let mut gpu = InMemoryRegions::new();
        let mut store = store(&mut gpu);
        store
            .add_model_bytes("tex.gpk", &testkit::textured_model_pack(), &mut gpu)
            .expect("valid pack");
        let mat = &store.models()[0].materials[0];
        assert_ne!(
            mat.diffuse_map_descriptor_index,
            store.defaults().diffuse_map_descriptor_index
        );
        assert_eq!(gpu.image_count(), 6);
    }

    #[test]
    fn runaway_primitive_counts_are_rejected_as_truncation() {
        let mut gpu = InMemoryRegions::new();
        let mut store = store(&mut gpu);
        let err = store
            .add_model_bytes("bad.gpk", &testkit::oversized_index_count_model_pack(), &mut gpu)
            .unwrap_err();
        assert!(matches!(err, AssetError::Truncated { .. }));
    }

    #[test]
    fn duplicate_path_is_rejected() {
        let mut gpu = InMemoryRegions::new();
        let mut store = store(&mut gpu);
        let pack = testkit::triangle_model_pack();
        store.add_model_bytes("a.gpk", &pack, &mut gpu).expect("first load");
        let err = store.add_model_bytes("a.gpk", &pack, &mut gpu).unwrap_err();
        assert!(matches!(err, AssetError::DuplicateAsset { .. }));
    }

    #[test]
    fn wrong_signature_is_rejected() {
        let mut gpu = InMemoryRegions::new();
        let mut store = store(&mut gpu);
        let err = store
            .add_model_bytes("sky.gpk", &testkit::skybox_pack(), &mut gpu)
            .unwrap_err();
        assert!(matches!(err, AssetError::BadSignature { .. }));
    }

    #[test]
    fn skybox_load_selects_active_skybox() {
        let mut gpu = InMemoryRegions::new();
        let mut store = store(&mut gpu);
        assert_eq!(store.skybox_index(), None);
        store
            .add_skybox_bytes("sky.gpk", &testkit::skybox_pack(), &mut gpu)
            .expect("valid pack");
        assert_eq!(store.skybox_index(), Some(0));
    }

    #[test]
    fn terrain_load_builds_heightfield_shape() {
        let mut gpu = InMemoryRegions::new();
        let mut physics = BasicPhysicsWorld::new();
        let mut store = store(&mut gpu);
        let index = store
            .add_terrain_bytes("terr.gpk", &testkit::terrain_pack(4, 4), &mut gpu, &mut physics)
            .expect("valid pack");
        let terrain = &store.terrains()[index];
        assert_eq!(terrain.height_samples.len(), 16);
        assert!(physics.shape(terrain.shape).is_some());
    }

    #[test]
    fn terrain_rejects_non_square_or_non_pow2_maps() {
        let mut gpu = InMemoryRegions::new();
        let mut physics = BasicPhysicsWorld::new();
        let mut store = store(&mut gpu);
        for pack in [testkit::terrain_pack(3, 4), testkit::terrain_pack(4, 6)] {
            let err = store
                .add_terrain_bytes("bad.gpk", &pack, &mut gpu, &mut physics)
                .unwrap_err();
            assert!(matches!(err, AssetError::InvalidDimensions { .. }));
        }
    }

    #[test]
    fn asset_capacity_is_enforced() {
        let mut gpu = InMemoryRegions::new();
        let config = LevelConfig {
            terrain_capacity: 1,
            ..LevelConfig::default()
        };
        let mut physics = BasicPhysicsWorld::new();
        let mut store = AssetStore::new(&config, &mut gpu);
        store
            .add_terrain_bytes("t0.gpk", &testkit::terrain_pack(4, 4), &mut gpu, &mut physics)
            .expect("first terrain");
        let err = store
            .add_terrain_bytes("t1.gpk", &testkit::terrain_pack(4, 4), &mut gpu, &mut physics)
            .unwrap_err();
        assert!(matches!(err, AssetError::CapacityExceeded { .. }));
    }
}
