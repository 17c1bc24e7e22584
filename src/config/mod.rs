//! Tool configuration loading and layering.
//!
//! Handles `.siteconf.toml` loading, environment variable resolution,
//! and CLI flag merging with proper priority ordering. This is the
//! resolver's own configuration, not the site settings it resolves.

pub mod loader;

pub use loader::{Config, ConfigError, LayersConfig, RendererConfig, ResolverConfig};
