//! Render command recording
//!
//! Flattens one frame of [`LevelRenderData`] into an API-agnostic command
//! list. Backends replay the list against their own pass/pipeline objects;
//! nothing here references GPU handles beyond region offsets and descriptor
//! indices. Pass order is fixed: shadow map, the two blur passes that soften
//! it, the color pass, then the composite onto the swap chain image.

use crate::assets::PersistentGeometry;
use crate::assets::pack::TerrainVertex;

use super::render_data::LevelRenderData;

/// Render pass identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Depth-only pass into the shadow map
    ShadowMap,
    /// Horizontal gaussian blur of the shadow map
    BlurHorizontal,
    /// Vertical gaussian blur of the shadow map
    BlurVertical,
    /// Lit color pass into the offscreen target
    Color,
    /// Fullscreen composite onto the swap chain image
    Composite,
}

/// Pipeline selection within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    /// Depth-only static model
    ShadowModel,
    /// Depth-only skinned model
    ShadowSkinnedModel,
    /// Separable gaussian blur
    Blur,
    /// Lit static model
    Model,
    /// Lit skinned model
    SkinnedModel,
    /// Height-map displaced terrain
    Terrain,
    /// Cubemap skybox
    Skybox,
    /// Tonemapping composite
    Composite,
}

/// One model primitive draw.
#[derive(Debug, Clone, Copy)]
pub struct ModelDraw {
    /// Number of u16 indices
    pub index_count: u32,
    /// Byte offset of the index data in the vertex region
    pub index_buffer_offset: u32,
    /// Byte offset of the vertex data in the vertex region
    pub vertex_buffer_offset: u32,
    /// Model instance uniform offset
    pub model_uniform_offset: u32,
    /// Mesh transform uniform or joint matrix block offset
    pub mesh_uniform_offset: u32,
    /// Material factor uniform offset
    pub primitive_uniform_offset: u32,
    /// Diffuse map descriptor
    pub diffuse_map_descriptor_index: u32,
    /// Metallic map descriptor
    pub metallic_map_descriptor_index: u32,
    /// Roughness map descriptor
    pub roughness_map_descriptor_index: u32,
    /// Normal map descriptor
    pub normal_map_descriptor_index: u32,
}

/// One recorded command.
#[derive(Debug, Clone)]
pub enum RenderCommand {
    /// Begin a render pass
    BeginPass(Pass),
    /// End the current render pass
    EndPass,
    /// Select a pipeline
    BindPipeline(Pipeline),
    /// Indexed model primitive draw
    DrawModelPrimitive(ModelDraw),
    /// Terrain patch draw from the shared grid
    DrawTerrain {
        /// Grid vertex count
        vertex_count: u32,
        /// First vertex within the vertex region, in grid strides
        first_vertex: u32,
        /// Patch placement uniform offset
        uniform_offset: u32,
        /// Height map descriptor
        height_map_descriptor_index: u32,
        /// Diffuse map descriptor
        diffuse_map_descriptor_index: u32,
    },
    /// Skybox cube, 36 vertices generated in the vertex shader
    DrawSkybox {
        /// Cubemap descriptor
        cubemap_descriptor_index: u32,
    },
    /// Bufferless fullscreen draw (blur and composite triangles)
    Draw {
        /// Vertex count
        vertex_count: u32,
    },
}

fn model_draws(
    commands: &mut Vec<RenderCommand>,
    data: &LevelRenderData,
    static_pipeline: Pipeline,
    skinned_pipeline: Pipeline,
) {
    for model in &data.models {
        for mesh in &model.meshes {
            commands.push(RenderCommand::BindPipeline(if mesh.skinned {
                skinned_pipeline
            } else {
                static_pipeline
            }));
            for primitive in &mesh.primitives {
                commands.push(RenderCommand::DrawModelPrimitive(ModelDraw {
                    index_count: primitive.index_count,
                    index_buffer_offset: primitive.index_buffer_offset,
                    vertex_buffer_offset: primitive.vertex_buffer_offset,
                    model_uniform_offset: model.uniform_offset,
                    mesh_uniform_offset: mesh.uniform_offset,
                    primitive_uniform_offset: primitive.uniform_offset,
                    diffuse_map_descriptor_index: primitive.diffuse_map_descriptor_index,
                    metallic_map_descriptor_index: primitive.metallic_map_descriptor_index,
                    roughness_map_descriptor_index: primitive.roughness_map_descriptor_index,
                    normal_map_descriptor_index: primitive.normal_map_descriptor_index,
                }));
            }
        }
    }
}

/// Record one frame of commands.
///
/// `extra_color` and `extra_composite` append inside the matching pass,
/// after the level's own draws; the editor uses them for overlay geometry
/// and UI.
pub fn build_render_commands(
    data: &LevelRenderData,
    geometry: &PersistentGeometry,
    extra_color: Option<&mut dyn FnMut(&mut Vec<RenderCommand>)>,
    extra_composite: Option<&mut dyn FnMut(&mut Vec<RenderCommand>)>,
) -> Vec<RenderCommand> {
    let mut commands = Vec::new();

    commands.push(RenderCommand::BeginPass(Pass::ShadowMap));
    model_draws(
        &mut commands,
        data,
        Pipeline::ShadowModel,
        Pipeline::ShadowSkinnedModel,
    );
    commands.push(RenderCommand::EndPass);

    for pass in [Pass::BlurHorizontal, Pass::BlurVertical] {
        commands.push(RenderCommand::BeginPass(pass));
        commands.push(RenderCommand::BindPipeline(Pipeline::Blur));
        commands.push(RenderCommand::Draw { vertex_count: 3 });
        commands.push(RenderCommand::EndPass);
    }

    commands.push(RenderCommand::BeginPass(Pass::Color));
    model_draws(&mut commands, data, Pipeline::Model, Pipeline::SkinnedModel);

    if !data.terrains.is_empty() {
        commands.push(RenderCommand::BindPipeline(Pipeline::Terrain));
        let grid_stride = std::mem::size_of::<TerrainVertex>() as u32;
        for terrain in &data.terrains {
            commands.push(RenderCommand::DrawTerrain {
                vertex_count: geometry.terrain_vertex_count,
                first_vertex: geometry.terrain_vertex_offset / grid_stride,
                uniform_offset: terrain.uniform_offset,
                height_map_descriptor_index: terrain.height_map_descriptor_index,
                diffuse_map_descriptor_index: terrain.diffuse_map_descriptor_index,
            });
        }
    }

    if let Some(cubemap_descriptor_index) = data.skybox_descriptor_index {
        commands.push(RenderCommand::BindPipeline(Pipeline::Skybox));
        commands.push(RenderCommand::DrawSkybox {
            cubemap_descriptor_index,
        });
    }
    if let Some(hook) = extra_color {
        hook(&mut commands);
    }
    commands.push(RenderCommand::EndPass);

    commands.push(RenderCommand::BeginPass(Pass::Composite));
    commands.push(RenderCommand::BindPipeline(Pipeline::Composite));
    commands.push(RenderCommand::Draw { vertex_count: 3 });
    if let Some(hook) = extra_composite {
        hook(&mut commands);
    }
    commands.push(RenderCommand::EndPass);

    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_data::TerrainRenderData;

    fn geometry() -> PersistentGeometry {
        let span = crate::assets::DebugGeometrySpan {
            vertex_offset: 0,
            vertex_count: 0,
        };
        PersistentGeometry {
            bound_box: span,
            sphere: span,
            cylinder: span,
            hollow_circle: span,
            torus: span,
            terrain_vertex_offset: 400,
            terrain_vertex_count: 128 * 128 * 6,
        }
    }

    #[test]
    fn passes_record_in_fixed_order() {
        let data = LevelRenderData::default();
        let commands = build_render_commands(&data, &geometry(), None, None);
        let passes: Vec<Pass> = commands
            .iter()
            .filter_map(|command| match command {
                RenderCommand::BeginPass(pass) => Some(*pass),
                _ => None,
            })
            .collect();
        assert_eq!(
            passes,
            vec![
                Pass::ShadowMap,
                Pass::BlurHorizontal,
                Pass::BlurVertical,
                Pass::Color,
                Pass::Composite
            ]
        );
        let ends = commands
            .iter()
            .filter(|command| matches!(command, RenderCommand::EndPass))
            .count();
        assert_eq!(ends, passes.len());
    }

    #[test]
    fn terrain_draws_use_the_shared_grid() {
        let data = LevelRenderData {
            terrains: vec![TerrainRenderData {
                uniform_offset: 512,
                height_map_descriptor_index: 7,
                diffuse_map_descriptor_index: 8,
            }],
            ..LevelRenderData::default()
        };
        let commands = build_render_commands(&data, &geometry(), None, None);
        let draw = commands
            .iter()
            .find_map(|command| match command {
                RenderCommand::DrawTerrain {
                    vertex_count,
                    first_vertex,
                    ..
                } => Some((*vertex_count, *first_vertex)),
                _ => None,
            })
            .expect("terrain draw recorded");
        assert_eq!(draw.0, 128 * 128 * 6);
        assert_eq!(draw.1, 400 / 20);
    }

    #[test]
    fn skybox_draw_follows_terrain_in_the_color_pass() {
        let data = LevelRenderData {
            skybox_descriptor_index: Some(3),
            ..LevelRenderData::default()
        };
        let commands = build_render_commands(&data, &geometry(), None, None);
        let skybox_at = commands
            .iter()
            .position(|c| matches!(c, RenderCommand::DrawSkybox { .. }))
            .expect("skybox recorded");
        let color_at = commands
            .iter()
            .position(|c| matches!(c, RenderCommand::BeginPass(Pass::Color)))
            .unwrap();
        let composite_at = commands
            .iter()
            .position(|c| matches!(c, RenderCommand::BeginPass(Pass::Composite)))
            .unwrap();
        assert!(color_at < skybox_at && skybox_at < composite_at);
    }

    #[test]
    fn color_hook_appends_before_the_pass_ends() {
        let data = LevelRenderData::default();
        let mut hook = |commands: &mut Vec<RenderCommand>| {
            commands.push(RenderCommand::Draw { vertex_count: 6 });
        };
        let commands = build_render_commands(&data, &geometry(), Some(&mut hook), None);
        let overlay_at = commands
            .iter()
            .position(|c| matches!(c, RenderCommand::Draw { vertex_count: 6 }))
            .expect("overlay recorded");
        let composite_at = commands
            .iter()
            .position(|c| matches!(c, RenderCommand::BeginPass(Pass::Composite)))
            .unwrap();
        assert!(overlay_at < composite_at);
        assert!(matches!(commands[overlay_at + 1], RenderCommand::EndPass));
    }
}
