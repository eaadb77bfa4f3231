//! Herbfall Core - Foundational types for the Herbfall engine
//!
//! This crate provides the core types that all other Herbfall crates depend on:
//! - `ParticleId` - Arena index of a particle record
//! - `Vec2`, `Viewport` - Screen-space types
//! - Error types and Result alias

mod error;
mod id;
mod types;

pub use error::{HerbfallError, Result};
pub use id::ParticleId;
pub use types::{Vec2, Viewport};
