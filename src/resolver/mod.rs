//! Configuration resolution: fold ordered layers into one effective config.
//!
//! Layers are applied lowest priority first. A key declared as deep-merge
//! holds the recursive union of every layer's map; any other key holds the
//! value from the last layer that defined it.

mod effective;
mod interpolate;
mod merge;

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::config::ResolverConfig;
use crate::models::{Layer, LayerOrigin, Setting, SettingValue, ValueKind};
use crate::schema::Schema;

pub use effective::EffectiveConfig;
pub use merge::deep_union;

/// A setting's value or type cannot be reconciled across layers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("cannot deep-merge `{key}` from layer `{layer}`: expected a map, found {found}")]
    NotAMapping {
        key: String,
        layer: String,
        found: ValueKind,
    },

    #[error("`{key}` in layer `{layer}` is a {found}, expected one of: {expected}")]
    TypeMismatch {
        key: String,
        layer: String,
        found: ValueKind,
        expected: String,
    },

    #[error("`{key}` references `{{{reference}}}`, which is not a defined scalar setting")]
    UnresolvedReference { key: String, reference: String },

    #[error("circular reference while expanding `{key}`: {chain}")]
    CircularReference { key: String, chain: String },
}

/// A layer declares a setting the schema does not know (strict mode only).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown setting `{key}` in layer `{layer}`")]
pub struct UnknownKeyError {
    pub key: String,
    pub layer: String,
}

/// Errors during resolution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    UnknownKey(#[from] UnknownKeyError),
}

/// Resolve `layers` (lowest priority first) with the given deep-merge keys.
///
/// No schema validation and no placeholder expansion; see [`Resolver`]
/// for those.
pub fn resolve(
    layers: &[Layer],
    deep_merge_keys: &BTreeSet<String>,
) -> Result<EffectiveConfig, ResolveError> {
    Resolver::new(deep_merge_keys.iter().cloned()).resolve(layers)
}

/// How one layer affected a key, as reported by [`Resolver::explain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// First layer to define the key.
    Set,
    /// Replaced the previous value outright.
    Replaced,
    /// Deep-merged into the previous map.
    Merged,
}

/// One layer's contribution to a key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub layer: String,
    pub origin: LayerOrigin,
    pub value: SettingValue,
    pub effect: Effect,
}

/// Resolution with optional strict validation and placeholder expansion.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    deep_merge_keys: BTreeSet<String>,
    schema: Option<Schema>,
    interpolate: bool,
}

impl Resolver {
    pub fn new<I, S>(deep_merge_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            deep_merge_keys: deep_merge_keys.into_iter().map(Into::into).collect(),
            schema: None,
            interpolate: false,
        }
    }

    /// Validate every layer against `schema` before applying it.
    pub fn strict(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Expand `{KEY}` placeholders after the fold.
    pub fn interpolate(mut self, enabled: bool) -> Self {
        self.interpolate = enabled;
        self
    }

    /// A resolver set up from the `[resolver]` section of the tool config.
    pub fn from_config(config: &ResolverConfig) -> Self {
        let resolver = Self::new(config.deep_merge_keys.iter().cloned()).interpolate(config.interpolate);
        if config.strict {
            resolver.strict(Schema::builtin().with_untyped_keys(config.extra_keys.iter().cloned()))
        } else {
            resolver
        }
    }

    pub fn is_deep_merge(&self, key: &str) -> bool {
        self.deep_merge_keys.contains(key)
    }

    pub fn deep_merge_keys(&self) -> &BTreeSet<String> {
        &self.deep_merge_keys
    }

    /// Fold `layers` into an [`EffectiveConfig`].
    pub fn resolve(&self, layers: &[Layer]) -> Result<EffectiveConfig, ResolveError> {
        let mut acc: IndexMap<String, Setting> = IndexMap::new();

        for layer in layers {
            if let Some(schema) = &self.schema {
                validate_layer(schema, layer)?;
            }
            debug!(
                layer = layer.name(),
                origin = %layer.origin(),
                settings = layer.len(),
                "applying layer"
            );
            for (key, value) in layer.iter() {
                self.apply(&mut acc, layer, key, value)?;
            }
        }

        let settings = if self.interpolate {
            interpolate::expand(acc)?
        } else {
            acc
        };

        Ok(EffectiveConfig::new(
            settings,
            layers.iter().map(Layer::summary).collect(),
        ))
    }

    fn apply(
        &self,
        acc: &mut IndexMap<String, Setting>,
        layer: &Layer,
        key: &str,
        value: &SettingValue,
    ) -> Result<(), ConfigurationError> {
        if !self.is_deep_merge(key) {
            acc.insert(
                key.to_string(),
                Setting {
                    key: key.to_string(),
                    value: value.clone(),
                    source: layer.name().to_string(),
                },
            );
            return Ok(());
        }

        let SettingValue::Map(incoming) = value else {
            return Err(ConfigurationError::NotAMapping {
                key: key.to_string(),
                layer: layer.name().to_string(),
                found: value.kind(),
            });
        };

        match acc.get_mut(key) {
            Some(Setting {
                value: SettingValue::Map(current),
                source,
                ..
            }) => {
                debug!(key, layer = layer.name(), entries = incoming.len(), "deep-merging");
                let merged = deep_union(std::mem::take(current), incoming.clone());
                *current = merged;
                *source = layer.name().to_string();
            }
            _ => {
                acc.insert(
                    key.to_string(),
                    Setting {
                        key: key.to_string(),
                        value: value.clone(),
                        source: layer.name().to_string(),
                    },
                );
            }
        }
        Ok(())
    }

    /// Every layer's contribution to `path` (a key or dotted path), in order.
    pub fn explain(&self, layers: &[Layer], path: &str) -> Vec<Contribution> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let merges = self.is_deep_merge(head);

        let mut contributions: Vec<Contribution> = Vec::new();
        for layer in layers {
            let value = match (layer.get(head), rest) {
                (Some(v), Some(rest)) => v.get_path(rest),
                (v, None) => v,
                (None, Some(_)) => None,
            };
            let Some(value) = value else { continue };

            let effect = match (contributions.is_empty(), merges) {
                (true, _) => Effect::Set,
                (false, true) if value.is_map() => Effect::Merged,
                (false, _) => Effect::Replaced,
            };
            contributions.push(Contribution {
                layer: layer.name().to_string(),
                origin: layer.origin(),
                value: value.clone(),
                effect,
            });
        }
        contributions
    }
}

fn validate_layer(schema: &Schema, layer: &Layer) -> Result<(), ResolveError> {
    for (key, value) in layer.iter() {
        let Some(kinds) = schema.kinds(key) else {
            return Err(UnknownKeyError {
                key: key.clone(),
                layer: layer.name().to_string(),
            }
            .into());
        };
        if !kinds.contains(&value.kind()) {
            let expected = kinds
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ConfigurationError::TypeMismatch {
                key: key.clone(),
                layer: layer.name().to_string(),
                found: value.kind(),
                expected,
            }
            .into());
        }
    }
    Ok(())
}
