//! Configuration layers: one prioritized source of settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::value::{SettingMap, SettingValue};

/// Where a layer came from. Variants are listed lowest priority first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LayerOrigin {
    /// Compiled-in generator defaults.
    Builtin,
    /// Defaults shipped alongside the selected theme.
    Theme,
    /// The site's own settings file.
    Site,
    /// An environment profile such as `development` or `production`.
    Profile,
    /// Per-user overrides that are not committed.
    Local,
    /// `SITECONF_SET__*` process environment variables.
    Environment,
    /// `--set KEY=VALUE` flags.
    Cli,
}

/// An ordered mapping of setting keys to values, plus provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    name: String,
    origin: LayerOrigin,
    path: Option<PathBuf>,
    digest: Option<String>,
    settings: SettingMap,
}

impl Layer {
    pub fn new(name: impl Into<String>, origin: LayerOrigin) -> Self {
        Self {
            name: name.into(),
            origin,
            path: None,
            digest: None,
            settings: SettingMap::new(),
        }
    }

    /// Replace the layer's settings wholesale.
    pub fn with_settings(mut self, settings: SettingMap) -> Self {
        self.settings = settings;
        self
    }

    /// Record the file this layer was read from and the digest of its bytes.
    pub fn with_source(mut self, path: impl Into<PathBuf>, digest: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self.digest = Some(digest.into());
        self
    }

    /// Add or replace one setting, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Add or replace one setting.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
        self.settings.insert(key.into(), value.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> LayerOrigin {
        self.origin
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    pub fn settings(&self) -> &SettingMap {
        &self.settings
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.settings.get(key)
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SettingValue)> {
        self.settings.iter()
    }

    /// Provenance record carried into the effective configuration.
    pub fn summary(&self) -> LayerSummary {
        LayerSummary {
            name: self.name.clone(),
            origin: self.origin,
            path: self.path.as_ref().map(|p| p.display().to_string()),
            digest: self.digest.clone(),
            settings: self.settings.len(),
        }
    }
}

/// A contributing layer as recorded in the effective configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerSummary {
    pub name: String,
    pub origin: LayerOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// SHA-256 of the raw file bytes (None for builtin/env/cli).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Number of top-level settings the layer declared.
    pub settings: usize,
}
