//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables
//! 3. `.siteconf.toml` in the project root
//! 4. `~/.config/siteconf/config.toml` (global defaults)
//! 5. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::{
    CONFIG_DIR, CONFIG_FILENAME, DEFAULT_DEEP_MERGE_KEYS, EFFECTIVE_CONFIG_FILE,
    EFFECTIVE_SETTINGS_MODULE, ENV_INTERPOLATE, ENV_PROFILE, ENV_STRICT, LOCAL_SETTINGS_FILENAME,
    PROFILE_DIR, SETTINGS_FILENAME,
};
use crate::env::Env;

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resolver: ResolverConfig,
    pub layers: LayersConfig,
    pub renderer: RendererConfig,
}

/// How layers are folded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Settings whose maps are unioned across layers instead of replaced.
    pub deep_merge_keys: Vec<String>,
    /// Reject unknown settings and disallowed value kinds.
    pub strict: bool,
    /// Expand `{KEY}` placeholders after the fold.
    pub interpolate: bool,
    /// Extra settings accepted in strict mode (theme or plugin specific).
    pub extra_keys: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            deep_merge_keys: DEFAULT_DEEP_MERGE_KEYS.iter().map(|k| k.to_string()).collect(),
            strict: false,
            interpolate: true,
            extra_keys: Vec::new(),
        }
    }
}

/// Where layer files live, relative to the project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayersConfig {
    /// Start from the compiled-in generator defaults.
    pub builtin_defaults: bool,
    /// Theme defaults file. Must exist when set.
    pub theme: Option<PathBuf>,
    /// Site settings file. Skipped when missing.
    pub settings: PathBuf,
    /// Directory of environment profiles (`<dir>/<profile>.toml|yaml`).
    pub profile_dir: PathBuf,
    /// Active environment profile. Its file must exist when set.
    pub profile: Option<String>,
    /// Per-user overrides file. Skipped when missing.
    pub local: PathBuf,
}

impl Default for LayersConfig {
    fn default() -> Self {
        Self {
            builtin_defaults: true,
            theme: None,
            settings: PathBuf::from(SETTINGS_FILENAME),
            profile_dir: PathBuf::from(PROFILE_DIR),
            profile: None,
            local: PathBuf::from(LOCAL_SETTINGS_FILENAME),
        }
    }
}

/// External site generator invocation.
///
/// `{config}` is replaced with the Python settings module path, `{json}`
/// with the JSON file path and `{output}` with the resolved `OUTPUT_PATH`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub build: Vec<String>,
    pub serve: Vec<String>,
    /// Where the effective config is written as JSON, relative to the
    /// project root. `SITECONF_CONFIG` points here.
    pub output_file: PathBuf,
    /// Where the effective config is written as a Python settings module.
    pub settings_module: PathBuf,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            build: ["pelican", "content", "-s", "{config}", "-o", "{output}"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            serve: ["pelican", "--listen", "-s", "{config}", "-o", "{output}"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            output_file: PathBuf::from(EFFECTIVE_CONFIG_FILE),
            settings_module: PathBuf::from(EFFECTIVE_SETTINGS_MODULE),
        }
    }
}

/// One config file as written. Only keys present in the file are `Some`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    resolver: ResolverFile,
    layers: LayersFile,
    renderer: RendererFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResolverFile {
    deep_merge_keys: Option<Vec<String>>,
    strict: Option<bool>,
    interpolate: Option<bool>,
    extra_keys: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LayersFile {
    builtin_defaults: Option<bool>,
    theme: Option<PathBuf>,
    settings: Option<PathBuf>,
    profile_dir: Option<PathBuf>,
    profile: Option<String>,
    local: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RendererFile {
    build: Option<Vec<String>>,
    serve: Option<Vec<String>>,
    output_file: Option<PathBuf>,
    settings_module: Option<PathBuf>,
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads from global config, project-local config, then applies
    /// environment variable overrides.
    pub fn load(project_root: &Path, env: &Env) -> Result<Self, ConfigError> {
        Self::load_with_global(Self::global_config_path().as_deref(), project_root, env)
    }

    /// Like [`Config::load`], with an explicit global config path.
    pub fn load_with_global(
        global_path: Option<&Path>,
        project_root: &Path,
        env: &Env,
    ) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // Layer 4: global config
        if let Some(global_path) = global_path {
            if global_path.exists() {
                debug!(path = %global_path.display(), "loading global config");
                let global = Self::load_file(global_path)?;
                config.merge(global);
            }
        }

        // Layer 3: project config
        let local_path = project_root.join(CONFIG_FILENAME);
        if local_path.exists() {
            debug!(path = %local_path.display(), "loading project config");
            let local = Self::load_file(&local_path)?;
            config.merge(local);
        }

        // Layer 2: environment variables
        config.apply_env_vars(env);

        Ok(config)
    }

    /// Load a config from a specific file.
    fn load_file(path: &Path) -> Result<ConfigFile, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the global config file path.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR).join("config.toml"))
    }

    /// Merge one config file into this one. Keys present in the file win;
    /// `extra_keys` accumulate across files.
    fn merge(&mut self, file: ConfigFile) {
        let ConfigFile {
            resolver,
            layers,
            renderer,
        } = file;

        if let Some(keys) = resolver.deep_merge_keys {
            self.resolver.deep_merge_keys = keys;
        }
        if let Some(strict) = resolver.strict {
            self.resolver.strict = strict;
        }
        if let Some(interpolate) = resolver.interpolate {
            self.resolver.interpolate = interpolate;
        }
        for key in resolver.extra_keys.unwrap_or_default() {
            if !self.resolver.extra_keys.contains(&key) {
                self.resolver.extra_keys.push(key);
            }
        }

        if let Some(builtin) = layers.builtin_defaults {
            self.layers.builtin_defaults = builtin;
        }
        if layers.theme.is_some() {
            self.layers.theme = layers.theme;
        }
        if let Some(settings) = layers.settings {
            self.layers.settings = settings;
        }
        if let Some(dir) = layers.profile_dir {
            self.layers.profile_dir = dir;
        }
        if layers.profile.is_some() {
            self.layers.profile = layers.profile;
        }
        if let Some(local) = layers.local {
            self.layers.local = local;
        }

        if let Some(build) = renderer.build {
            self.renderer.build = build;
        }
        if let Some(serve) = renderer.serve {
            self.renderer.serve = serve;
        }
        if let Some(path) = renderer.output_file {
            self.renderer.output_file = path;
        }
        if let Some(path) = renderer.settings_module {
            self.renderer.settings_module = path;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Ok(val) = env.var(ENV_PROFILE) {
            if val.trim().is_empty() {
                warn!("ignoring empty {ENV_PROFILE}");
            } else {
                self.layers.profile = Some(val);
            }
        }
        if let Ok(val) = env.var(ENV_STRICT) {
            match parse_flag(&val) {
                Some(flag) => self.resolver.strict = flag,
                None => warn!("ignoring invalid {ENV_STRICT} value: {val}"),
            }
        }
        if let Ok(val) = env.var(ENV_INTERPOLATE) {
            match parse_flag(&val) {
                Some(flag) => self.resolver.interpolate = flag,
                None => warn!("ignoring invalid {ENV_INTERPOLATE} value: {val}"),
            }
        }
    }
}

fn parse_flag(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "false" | "0" | "no" | "off" => Some(false),
        "true" | "1" | "yes" | "on" => Some(true),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> Env {
        Env::mock(Vec::<(&str, &str)>::new())
    }

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.resolver.deep_merge_keys, vec!["MARKDOWN", "JINJA_ENVIRONMENT"]);
        assert!(!config.resolver.strict);
        assert!(config.resolver.interpolate);
        assert!(config.layers.builtin_defaults);
        assert_eq!(config.layers.settings, PathBuf::from("settings.toml"));
        assert_eq!(config.renderer.output_file, PathBuf::from(".siteconf/effective.json"));
        assert_eq!(config.renderer.settings_module, PathBuf::from(".siteconf/effective.py"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[resolver]
deep_merge_keys = ["MARKDOWN", "SITEMAP"]
strict = true

[layers]
theme = "../pelican-themes/Flex/siteconf.toml"
profile = "production"

[renderer]
build = ["make", "html"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.resolver.deep_merge_keys, vec!["MARKDOWN", "SITEMAP"]);
        assert!(config.resolver.strict);
        assert!(config.resolver.interpolate);
        assert_eq!(
            config.layers.theme,
            Some(PathBuf::from("../pelican-themes/Flex/siteconf.toml"))
        );
        assert_eq!(config.layers.profile.as_deref(), Some("production"));
        assert_eq!(config.renderer.build, vec!["make", "html"]);
        assert_eq!(config.renderer.serve, RendererConfig::default().serve);
    }

    fn config_file(toml_str: &str) -> ConfigFile {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn merge_overrides_present_keys() {
        let mut base = Config::default();
        base.merge(config_file(
            r#"
[resolver]
deep_merge_keys = ["SITEMAP"]
strict = true
interpolate = false
extra_keys = ["DISQUS_SITENAME"]

[layers]
builtin_defaults = false
profile = "production"
local = "mine.toml"

[renderer]
build = ["make"]
"#,
        ));

        assert_eq!(base.resolver.deep_merge_keys, vec!["SITEMAP"]);
        assert!(base.resolver.strict);
        assert!(!base.resolver.interpolate);
        assert_eq!(base.resolver.extra_keys, vec!["DISQUS_SITENAME"]);
        assert!(!base.layers.builtin_defaults);
        assert_eq!(base.layers.profile.as_deref(), Some("production"));
        assert_eq!(base.layers.local, PathBuf::from("mine.toml"));
        assert_eq!(base.renderer.build, vec!["make"]);
        assert_eq!(base.renderer.serve, RendererConfig::default().serve);
    }

    #[test]
    fn merge_keeps_base_when_file_is_empty() {
        let mut base = Config::default();
        base.layers.profile = Some("development".into());
        base.resolver.strict = true;

        base.merge(ConfigFile::default());

        assert_eq!(base.layers.profile.as_deref(), Some("development"));
        assert!(base.resolver.strict);
    }

    #[test]
    fn merge_can_switch_options_back_to_defaults() {
        let mut base = Config::default();
        base.merge(config_file(
            "[resolver]\nstrict = true\ninterpolate = false\ndeep_merge_keys = [\"SITEMAP\"]\n\
             [layers]\nbuiltin_defaults = false\n",
        ));
        base.merge(config_file(
            "[resolver]\nstrict = false\ninterpolate = true\n\
             deep_merge_keys = [\"MARKDOWN\", \"JINJA_ENVIRONMENT\"]\n\
             [layers]\nbuiltin_defaults = true\n",
        ));
        assert_eq!(base, Config::default());
    }

    #[test]
    fn load_file_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "not valid {{ toml").unwrap();

        let result = Config::load_file(&path);
        assert!(result.unwrap_err().to_string().contains("parse"));
    }

    #[test]
    fn load_file_not_found() {
        let result = Config::load_file(Path::new("/tmp/siteconf_not_exist_config.toml"));
        assert!(result.unwrap_err().to_string().contains("read"));
    }

    #[test]
    fn project_config_overrides_global() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        std::fs::write(&global, "[layers]\nprofile = \"development\"\n[resolver]\nstrict = true\n").unwrap();
        std::fs::write(
            dir.path().join(".siteconf.toml"),
            "[layers]\nprofile = \"production\"\n",
        )
        .unwrap();

        let config = Config::load_with_global(Some(&global), dir.path(), &no_env()).unwrap();
        assert_eq!(config.layers.profile.as_deref(), Some("production"));
        assert!(config.resolver.strict);
    }

    #[test]
    fn project_config_can_relax_global_strictness() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        std::fs::write(
            &global,
            "[resolver]\nstrict = true\ninterpolate = false\ndeep_merge_keys = [\"SITEMAP\"]\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(".siteconf.toml"),
            "[resolver]\nstrict = false\ninterpolate = true\n\
             deep_merge_keys = [\"MARKDOWN\", \"JINJA_ENVIRONMENT\"]\n",
        )
        .unwrap();

        let config = Config::load_with_global(Some(&global), dir.path(), &no_env()).unwrap();
        assert!(!config.resolver.strict);
        assert!(config.resolver.interpolate);
        assert_eq!(config.resolver.deep_merge_keys, vec!["MARKDOWN", "JINJA_ENVIRONMENT"]);
    }

    #[test]
    fn load_without_any_config_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_with_global(None, dir.path(), &no_env()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn env_vars_override_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".siteconf.toml"), "[layers]\nprofile = \"development\"\n").unwrap();
        let env = Env::mock([
            ("SITECONF_PROFILE", "production"),
            ("SITECONF_STRICT", "yes"),
            ("SITECONF_INTERPOLATE", "off"),
        ]);

        let config = Config::load_with_global(None, dir.path(), &env).unwrap();
        assert_eq!(config.layers.profile.as_deref(), Some("production"));
        assert!(config.resolver.strict);
        assert!(!config.resolver.interpolate);
    }

    #[test]
    fn invalid_env_flags_are_ignored() {
        let env = Env::mock([("SITECONF_STRICT", "maybe"), ("SITECONF_PROFILE", "  ")]);
        let mut config = Config::default();
        config.apply_env_vars(&env);
        assert!(!config.resolver.strict);
        assert_eq!(config.layers.profile, None);
    }

    #[test]
    fn global_config_path_returns_some() {
        if let Some(p) = Config::global_config_path() {
            assert!(p.to_str().unwrap().contains("siteconf"));
        }
    }
}
