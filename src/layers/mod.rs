//! Layer sources and their priority order.
//!
//! Lowest priority first:
//! 1. Built-in generator defaults
//! 2. Theme defaults (`[layers] theme`)
//! 3. Site settings (`settings.toml`)
//! 4. Environment profile (`profiles/<profile>.toml`)
//! 5. Local overrides (`settings.local.toml`)
//! 6. `SITECONF_SET__*` environment variables
//! 7. `--set KEY=VALUE` flags

pub mod defaults;
pub mod loader;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::env::Env;
use crate::models::{Layer, LayerOrigin};

pub use defaults::builtin_layer;
pub use loader::{environment_layer, load_layer_file, override_layer, parse_override};

/// Profile files are looked up with these extensions, in order.
const PROFILE_EXTENSIONS: &[&str] = &["toml", "yaml", "yml"];

/// Errors while building layers.
#[derive(Error, Debug)]
pub enum LayerError {
    #[error("failed to read layer file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("layer file {path} is not valid UTF-8: {source}")]
    Encoding {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },

    #[error("failed to parse TOML layer {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to parse YAML layer {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        source: serde_yaml_ng::Error,
    },

    #[error("layer file {path} sets `{key}` to a NaN or infinite float")]
    NonFiniteFloat { path: PathBuf, key: String },

    #[error("layer file {path} must contain a table of settings at the top level")]
    NotATable { path: PathBuf },

    #[error("theme defaults file {path} does not exist")]
    MissingTheme { path: PathBuf },

    #[error("profile `{profile}` not found in {dir}")]
    MissingProfile { profile: String, dir: PathBuf },

    #[error("invalid override `{input}`: {reason}")]
    InvalidOverride { input: String, reason: String },
}

/// Build every layer for one resolution, in priority order.
///
/// Missing site and local files are skipped; a configured theme file or
/// profile that does not exist is an error.
pub fn collect(
    project_root: &Path,
    config: &Config,
    env: &Env,
    overrides: &[String],
) -> Result<Vec<Layer>, LayerError> {
    let mut layers = Vec::new();
    let sources = &config.layers;

    if sources.builtin_defaults {
        layers.push(builtin_layer());
    }

    if let Some(theme) = &sources.theme {
        let path = project_root.join(theme);
        if !path.exists() {
            return Err(LayerError::MissingTheme { path });
        }
        layers.push(load_layer_file(&path, "theme", LayerOrigin::Theme)?);
    }

    if let Some(layer) = load_optional(&project_root.join(&sources.settings), "site", LayerOrigin::Site)? {
        layers.push(layer);
    }

    if let Some(profile) = &sources.profile {
        let dir = project_root.join(&sources.profile_dir);
        let path = find_profile(&dir, profile).ok_or_else(|| LayerError::MissingProfile {
            profile: profile.clone(),
            dir: dir.clone(),
        })?;
        layers.push(load_layer_file(
            &path,
            &format!("profile:{profile}"),
            LayerOrigin::Profile,
        )?);
    }

    if let Some(layer) = load_optional(&project_root.join(&sources.local), "local", LayerOrigin::Local)? {
        layers.push(layer);
    }

    if let Some(layer) = environment_layer(env)? {
        layers.push(layer);
    }

    if let Some(layer) = override_layer(overrides)? {
        layers.push(layer);
    }

    Ok(layers)
}

fn load_optional(path: &Path, name: &str, origin: LayerOrigin) -> Result<Option<Layer>, LayerError> {
    if !path.exists() {
        debug!(path = %path.display(), layer = name, "layer file not found, skipping");
        return Ok(None);
    }
    load_layer_file(path, name, origin).map(Some)
}

fn find_profile(dir: &Path, profile: &str) -> Option<PathBuf> {
    PROFILE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{profile}.{ext}")))
        .find(|p| p.exists())
}
