//! Output renderers for the effective configuration: terminal, JSON, TOML.

pub mod json;
pub mod terminal;
pub mod toml;

use crate::resolver::EffectiveConfig;

/// Trait for rendering an effective configuration to an output format.
pub trait OutputRenderer {
    /// Render the configuration to a string.
    fn render(&self, config: &EffectiveConfig) -> String;
}
