//! cyber-run
//!
//! An endless-runner demo built on wgpu and winit. The player hops between
//! three lanes on an infinitely recycled platform track, collecting spheres
//! while the scene is rendered offscreen, wrapped in a skybox and pushed
//! through a screen-space blur before the HUD is laid on top.
//!
//! High-level modules
//! - `app`: winit application handler and the frame loop
//! - `camera`: camera, projection and view/projection uniforms
//! - `context`: window + GPU context (surface, device, render targets)
//! - `data_structures`: scene data models (meshes, materials, entities)
//! - `game`: the gameplay state machine (lanes, track, collectibles, score)
//! - `input`: polled keyboard state fed from window events
//! - `pipelines`: the four render pipelines (scene, skybox, blur, overlay)
//! - `renderer`: per-frame pass sequencing over the pipelines
//! - `resources`: asset loading (OBJ models, textures, cubemaps)
//!
//! Controls: `A` and `D` step one lane left/right on key release, `Escape`
//! quits. Runs from a bare checkout; missing textures under `assets/` are
//! replaced by procedural fallbacks. `RUST_LOG` selects the log level.
//!

pub mod app;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod game;
pub mod input;
pub mod pipelines;
pub mod renderer;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::keyboard::KeyCode;
