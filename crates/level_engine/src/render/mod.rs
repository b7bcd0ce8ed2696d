//! Render-data generation and command recording
//!
//! The level side of the renderer: camera math, the [`GpuRegions`](gpu)
//! allocator interface, per-frame uniform generation and the API-agnostic
//! command list. Everything GPU-API specific lives behind the traits in
//! [`gpu`].

pub mod camera;
pub mod commands;
pub mod gpu;
pub mod render_data;

pub use camera::Camera;
pub use commands::{build_render_commands, Pass, Pipeline, RenderCommand};
pub use gpu::{GpuRegions, InMemoryRegions};
pub use render_data::{generate_render_data, LevelRenderData};
