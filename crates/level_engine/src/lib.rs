//! # Level Engine
//!
//! The runtime level model of a real-time 3D editor: entities with packed
//! component storage, transactional per-frame edits, binary asset packs and
//! the per-frame render-data pipeline that feeds an API-agnostic command
//! list.
//!
//! ## Features
//!
//! - **Packed entity storage**: Dense per-component arrays over a double
//!   buffer, flipped atomically at each commit
//! - **Transactional edits**: Per-entity modification records plus an
//!   addition queue, applied in one step
//! - **Binary asset packs**: Pre-baked model, skybox and terrain files read
//!   as plain-old-data records
//! - **Render-data generation**: Animation sampling, skinning and lighting
//!   resolved into per-frame uniform blocks and a replayable command list
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use level_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LevelConfig::default();
//!     let mut gpu = InMemoryRegions::new();
//!     let mut physics = BasicPhysicsWorld::new();
//!
//!     let mut level = Level::new(config, &mut gpu);
//!     level.read_json("assets/level.json", &mut gpu, &mut physics, None)?;
//!
//!     let camera = level.player_camera(10.0, 0.4, 0.0, 16.0 / 9.0);
//!     let data = generate_render_data(&level, &camera, &mut gpu, None);
//!     let commands = build_render_commands(&data, level.assets.geometry(), None, None);
//!     for command in &commands {
//!         // replay against a renderer backend
//!         let _ = command;
//!     }
//!     Ok(())
//! }
//! ```

pub mod assets;
pub mod config;
pub mod foundation;
pub mod level;
pub mod physics;
pub mod render;

pub use config::{Config, ConfigError, LevelConfig};
pub use level::{Level, LevelError};

/// Common imports for level consumers
pub mod prelude {
    pub use crate::{
        assets::AssetStore,
        config::{Config, LevelConfig},
        foundation::math::{Mat4, Transform, Vec3},
        level::{
            ComponentFlags, EntityAddition, EntityModification, Level, LevelError, LightComponent,
            ModelComponent,
        },
        physics::{BasicPhysicsWorld, PhysicsWorld},
        render::{
            build_render_commands, generate_render_data, Camera, GpuRegions, InMemoryRegions,
            RenderCommand,
        },
    };
}
