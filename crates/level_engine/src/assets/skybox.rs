//! Skybox assets

use crate::render::gpu::{GpuRegions, ImageDesc, ImageFormat, SamplerKind};

use super::pack::{self, PackReader, SkyboxHeader};
use super::AssetError;

/// A loaded skybox cubemap.
#[derive(Debug, Clone)]
pub struct Skybox {
    /// Pack file path this skybox was loaded from (unique per store)
    pub gpk_file: String,
    /// Combined cube sampler descriptor for the cubemap
    pub cubemap_descriptor_index: u32,
}

/// Deserialize a skybox pack and register its cubemap.
pub(super) fn load_skybox(
    gpk_file: &str,
    bytes: &[u8],
    gpu: &mut dyn GpuRegions,
) -> Result<Skybox, AssetError> {
    let reader = PackReader::new(bytes);
    let header: SkyboxHeader = reader.read(0)?;
    pack::check_signature(header.signature, pack::SKYBOX_SIGNATURE, gpk_file)?;

    let format =
        ImageFormat::from_pack_id(header.cubemap_format).ok_or_else(|| AssetError::Malformed {
            what: format!("unknown image format id {}", header.cubemap_format),
        })?;
    if header.cubemap_layer_count != 6 {
        return Err(AssetError::Malformed {
            what: format!(
                "skybox cubemap has {} layers, expected 6",
                header.cubemap_layer_count
            ),
        });
    }

    let desc = ImageDesc {
        format,
        width: header.cubemap_width,
        height: header.cubemap_height,
        mip_count: header.cubemap_mip_count,
        layer_count: header.cubemap_layer_count,
        cube_compatible: true,
    };
    let data = reader.bytes(header.cubemap_offset, header.cubemap_size)?;
    let image_index = gpu.append_image_region(
        &desc,
        data,
        header.cubemap_block_dim,
        header.cubemap_block_size,
    );
    let cubemap_descriptor_index =
        gpu.append_combined_cube_sampler(image_index, SamplerKind::SkyboxCube);

    Ok(Skybox {
        gpk_file: gpk_file.to_owned(),
        cubemap_descriptor_index,
    })
}
