//! Shared types and utilities for the wingspan scenes.
//!
//! # Invariants
//! - Exactly one `EntityTransform` per controlled entity.
//! - Orientation is overwritten, never accumulated, by input.
//! - The position feed is the only channel from an entity to the overlay.

pub mod config;
pub mod feed;
pub mod types;

pub use config::{AppConfig, AssetConfig, ConfigError, OverlayConfig, WindowConfig};
pub use feed::PositionFeed;
pub use types::{EntityTransform, ModelId, Orientation};
