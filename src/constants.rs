//! App-wide constants.
//!
//! Centralises the tool name, file locations, and environment variable
//! names so a rename only requires changing this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "siteconf";

/// Crate version, as reported by `siteconf version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tool config filename in the project root.
pub const CONFIG_FILENAME: &str = ".siteconf.toml";

/// Directory name under `~/.config/` for the global tool config.
pub const CONFIG_DIR: &str = "siteconf";

/// Default site settings file, relative to the project root.
pub const SETTINGS_FILENAME: &str = "settings.toml";

/// Default local (per-user, uncommitted) overrides file.
pub const LOCAL_SETTINGS_FILENAME: &str = "settings.local.toml";

/// Default directory holding environment profiles (`<dir>/<profile>.toml`).
pub const PROFILE_DIR: &str = "profiles";

/// Where the effective configuration is written before the renderer runs.
pub const EFFECTIVE_CONFIG_FILE: &str = ".siteconf/effective.json";

/// The same configuration as a Python settings module for the generator.
pub const EFFECTIVE_SETTINGS_MODULE: &str = ".siteconf/effective.py";

/// Settings that are deep-merged unless the tool config says otherwise.
pub const DEFAULT_DEEP_MERGE_KEYS: &[&str] = &["MARKDOWN", "JINJA_ENVIRONMENT"];

// ── Environment variable names ──────────────────────────────────────

pub const ENV_PROFILE: &str = "SITECONF_PROFILE";
pub const ENV_STRICT: &str = "SITECONF_STRICT";
pub const ENV_INTERPOLATE: &str = "SITECONF_INTERPOLATE";
pub const ENV_LOG: &str = "SITECONF_LOG";

/// Prefix for per-setting overrides, e.g. `SITECONF_SET__SITEURL`.
pub const ENV_SET_PREFIX: &str = "SITECONF_SET__";

/// Separator for nested keys inside an env override name.
pub const ENV_NEST_SEPARATOR: &str = "__";

/// Exported to the renderer process; points at the effective config file.
pub const ENV_CONFIG_PATH: &str = "SITECONF_CONFIG";
