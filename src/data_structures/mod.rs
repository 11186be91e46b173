//! Engine data structures: models, textures, entities and the scene registry.
//!
//! This module contains the core data types for scene representation:
//!
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `entity` holds per-object transform state and instance data
//! - `registry` owns meshes and materials and hands out index handles

pub mod entity;
pub mod model;
pub mod registry;
pub mod texture;
