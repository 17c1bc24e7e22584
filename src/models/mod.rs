//! Shared types used across all modules.
//!
//! Settings, layers, and their values. Other modules import from here
//! rather than reaching into each other's internals.

pub mod layer;
pub mod value;

use serde::Serialize;

pub use layer::{Layer, LayerOrigin, LayerSummary};
pub use value::{SettingMap, SettingValue, ValueKind};

/// A resolved setting: its value and the layer that last set it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Setting {
    pub key: String,
    pub value: SettingValue,
    /// Name of the layer that last set (or, for deep-merged keys, last
    /// contributed to) this value.
    pub source: String,
}
