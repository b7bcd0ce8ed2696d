//! Terrain assets
//!
//! A terrain pack carries a signed 16-bit height map and a diffuse map, both
//! square with power-of-two sides. All terrains share one static vertex grid
//! of [`TERRAIN_RESOLUTION`]² cells; the vertex shader displaces it by
//! sampling the height map, and the physics heightfield is built from the
//! same raw samples so the two stay in lockstep.

use std::sync::Arc;

use crate::foundation::math::Vec3;
use crate::physics::{PhysicsWorld, ShapeDesc, ShapeHandle};
use crate::render::gpu::{GpuRegions, ImageDesc, ImageFormat, SamplerKind};

use super::pack::{self, PackReader, TerrainHeader, TerrainVertex};
use super::AssetError;

/// Cells per side of the shared terrain render grid
pub const TERRAIN_RESOLUTION: u32 = 128;

/// World-space side length of a terrain patch
pub const TERRAIN_SIZE: f32 = 64.0;

/// World-space height corresponding to the maximum height sample
pub const TERRAIN_HEIGHT_SCALE: f32 = 8.0;

/// A loaded terrain asset.
#[derive(Debug, Clone)]
pub struct Terrain {
    /// Pack file path this terrain was loaded from (unique per store)
    pub gpk_file: String,
    /// Combined sampler descriptor for the height map
    pub height_map_descriptor_index: u32,
    /// Combined sampler descriptor for the diffuse map
    pub diffuse_map_descriptor_index: u32,
    /// Raw height samples, row major, shared with the physics heightfield
    pub height_samples: Arc<[i16]>,
    /// Heightfield collision shape, shared by every entity on this terrain
    pub shape: ShapeHandle,
}

fn square_pow2(width: u32, height: u32, gpk_file: &str, what: &str) -> Result<(), AssetError> {
    if width == height && width.is_power_of_two() {
        Ok(())
    } else {
        Err(AssetError::InvalidDimensions {
            path: gpk_file.to_owned(),
            what: format!("{what} is {width}x{height}, expected square power-of-two"),
        })
    }
}

/// Deserialize a terrain pack, register its maps and build its heightfield.
pub(super) fn load_terrain(
    gpk_file: &str,
    bytes: &[u8],
    gpu: &mut dyn GpuRegions,
    physics: &mut dyn PhysicsWorld,
) -> Result<Terrain, AssetError> {
    let reader = PackReader::new(bytes);
    let header: TerrainHeader = reader.read(0)?;
    pack::check_signature(header.signature, pack::TERRAIN_SIGNATURE, gpk_file)?;

    square_pow2(
        header.height_map_width,
        header.height_map_height,
        gpk_file,
        "height map",
    )?;
    square_pow2(
        header.diffuse_map_width,
        header.diffuse_map_height,
        gpk_file,
        "diffuse map",
    )?;

    let sample_count = header.height_map_width * header.height_map_height;
    if header.height_map_size != sample_count * 2 {
        return Err(AssetError::Malformed {
            what: format!(
                "height map size {} does not match {} samples",
                header.height_map_size, sample_count
            ),
        });
    }

    let height_bytes = reader.bytes(header.height_map_offset, header.height_map_size)?;
    let height_samples: Arc<[i16]> = height_bytes
        .chunks_exact(2)
        .map(|pair| i16::from_ne_bytes([pair[0], pair[1]]))
        .collect();

    let height_desc = ImageDesc {
        format: ImageFormat::R16Snorm,
        width: header.height_map_width,
        height: header.height_map_height,
        mip_count: 1,
        layer_count: 1,
        cube_compatible: false,
    };
    let height_image = gpu.append_image_region(&height_desc, height_bytes, 1, 2);
    let height_map_descriptor_index =
        gpu.append_combined_2d_sampler(height_image, SamplerKind::Terrain);

    let diffuse_desc = ImageDesc {
        format: ImageFormat::Rgba8Srgb,
        width: header.diffuse_map_width,
        height: header.diffuse_map_height,
        mip_count: 1,
        layer_count: 1,
        cube_compatible: false,
    };
    let diffuse_bytes = reader.bytes(header.diffuse_map_offset, header.diffuse_map_size)?;
    let diffuse_image = gpu.append_image_region(&diffuse_desc, diffuse_bytes, 1, 4);
    let diffuse_map_descriptor_index =
        gpu.append_combined_2d_sampler(diffuse_image, SamplerKind::Terrain);

    let shape = physics.create_shape(ShapeDesc::Heightfield {
        resolution: header.height_map_width,
        row_scale: TERRAIN_SIZE / header.height_map_width as f32,
        height_scale: TERRAIN_HEIGHT_SCALE,
        samples: Arc::clone(&height_samples),
    });

    Ok(Terrain {
        gpk_file: gpk_file.to_owned(),
        height_map_descriptor_index,
        diffuse_map_descriptor_index,
        height_samples,
        shape,
    })
}

/// Build the shared terrain render grid: two triangles per cell, centered on
/// the origin at zero height, with uv spanning [0, 1] across the patch.
pub fn terrain_grid_vertices(resolution: u32, size: f32) -> Vec<TerrainVertex> {
    let dp = size / resolution as f32;
    let half = size / 2.0;
    let at = |x: u32, z: u32| {
        let position = Vec3::new(x as f32 * dp - half, 0.0, z as f32 * dp - half);
        TerrainVertex {
            position: position.into(),
            uv: [x as f32 / resolution as f32, z as f32 / resolution as f32],
        }
    };
    let mut vertices = Vec::with_capacity((resolution * resolution * 6) as usize);
    for z in 0..resolution {
        for x in 0..resolution {
            vertices.push(at(x, z));
            vertices.push(at(x, z + 1));
            vertices.push(at(x + 1, z));
            vertices.push(at(x + 1, z));
            vertices.push(at(x, z + 1));
            vertices.push(at(x + 1, z + 1));
        }
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn grid_has_six_vertices_per_cell() {
        let vertices = terrain_grid_vertices(4, 8.0);
        assert_eq!(vertices.len(), 4 * 4 * 6);
    }

    #[test]
    fn grid_is_centered_with_unit_uv_span() {
        let vertices = terrain_grid_vertices(2, 10.0);
        let first = vertices.first().expect("non-empty grid");
        assert_relative_eq!(first.position[0], -5.0);
        assert_relative_eq!(first.position[2], -5.0);
        assert_relative_eq!(first.uv[0], 0.0);
        let last = vertices.last().expect("non-empty grid");
        assert_relative_eq!(last.position[0], 5.0);
        assert_relative_eq!(last.position[2], 5.0);
        assert_relative_eq!(last.uv[0], 1.0);
        assert_relative_eq!(last.uv[1], 1.0);
    }
}
