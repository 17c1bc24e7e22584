//! Hand-off to the external site generator.
//!
//! The effective configuration is written twice: as JSON, and as a Python
//! settings module that `pelican -s` can import. The configured generator
//! command is run with `{config}`, `{json}` and `{output}` substituted. The
//! child also sees the JSON path in `SITECONF_CONFIG`.

use std::path::{Path, PathBuf};
use std::process::Command;

use strum::{Display, EnumString};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::RendererConfig;
use crate::constants::ENV_CONFIG_PATH;
use crate::resolver::EffectiveConfig;

/// Fallback when the configuration has no `OUTPUT_PATH`.
const DEFAULT_OUTPUT_PATH: &str = "output";

/// Which generator command to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum RenderMode {
    Build,
    Serve,
}

/// Errors from the renderer hand-off.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("no {mode} command configured under [renderer]")]
    NoCommand { mode: RenderMode },

    #[error("failed to write effective config to {path}: {source}")]
    WriteConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}")]
    Failed { program: String, status: String },
}

/// Files written for one hand-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandOffFiles {
    /// Pretty JSON, exported as `SITECONF_CONFIG`.
    pub json: PathBuf,
    /// Python settings module, substituted for `{config}`.
    pub settings_module: PathBuf,
}

/// Something that turns an effective configuration into a site.
pub trait SiteRenderer {
    /// Render the site; returns the path of the JSON configuration handed over.
    fn render(&self, config: &EffectiveConfig, mode: RenderMode) -> Result<PathBuf, RenderError>;
}

/// Runs an external generator command.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    project_root: PathBuf,
    settings: RendererConfig,
}

impl CommandRenderer {
    pub fn new(project_root: impl Into<PathBuf>, settings: RendererConfig) -> Self {
        Self {
            project_root: project_root.into(),
            settings,
        }
    }

    /// Absolute path the JSON configuration is written to.
    pub fn config_path(&self) -> PathBuf {
        self.project_root.join(&self.settings.output_file)
    }

    /// Absolute path the Python settings module is written to.
    pub fn settings_module_path(&self) -> PathBuf {
        self.project_root.join(&self.settings.settings_module)
    }

    /// Write `config` as pretty JSON and as a Python settings module,
    /// creating parent directories.
    pub fn write_config(&self, config: &EffectiveConfig) -> Result<HandOffFiles, RenderError> {
        let json = serde_json::to_string_pretty(config).map_err(|e| RenderError::WriteConfig {
            path: self.config_path(),
            source: std::io::Error::other(e),
        })?;

        let files = HandOffFiles {
            json: self.config_path(),
            settings_module: self.settings_module_path(),
        };
        write_file(&files.json, &format!("{json}\n"))?;
        write_file(&files.settings_module, &python_module(&json))?;

        debug!(
            json = %files.json.display(),
            module = %files.settings_module.display(),
            settings = config.len(),
            "wrote effective config"
        );
        Ok(files)
    }

    /// The argv for `mode` with placeholders substituted.
    pub fn command_line(
        &self,
        mode: RenderMode,
        files: &HandOffFiles,
        output_path: &str,
    ) -> Result<Vec<String>, RenderError> {
        let template = match mode {
            RenderMode::Build => &self.settings.build,
            RenderMode::Serve => &self.settings.serve,
        };
        if template.is_empty() {
            return Err(RenderError::NoCommand { mode });
        }

        let module = files.settings_module.display().to_string();
        let json = files.json.display().to_string();
        Ok(template
            .iter()
            .map(|arg| {
                arg.replace("{config}", &module)
                    .replace("{json}", &json)
                    .replace("{output}", output_path)
            })
            .collect())
    }
}

impl SiteRenderer for CommandRenderer {
    fn render(&self, config: &EffectiveConfig, mode: RenderMode) -> Result<PathBuf, RenderError> {
        let files = self.write_config(config)?;
        let output_path = config.get_str("OUTPUT_PATH").unwrap_or(DEFAULT_OUTPUT_PATH);
        let argv = self.command_line(mode, &files, output_path)?;

        let (program, args) = argv.split_first().ok_or(RenderError::NoCommand { mode })?;
        info!(%mode, program = %program, "running site generator");

        let status = Command::new(program)
            .args(args)
            .current_dir(&self.project_root)
            .env(ENV_CONFIG_PATH, &files.json)
            .status()
            .map_err(|e| RenderError::Spawn {
                program: program.clone(),
                source: e,
            })?;

        if !status.success() {
            return Err(RenderError::Failed {
                program: program.clone(),
                status: status.to_string(),
            });
        }
        Ok(files.json)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), RenderError> {
    let write_err = |source| RenderError::WriteConfig {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, contents).map_err(write_err)
}

/// Wrap serialized JSON in a Python module that defines every setting as a
/// module global.
///
/// The JSON sits in a raw triple-quoted string, so it must not contain a
/// single quote. One can only occur inside a JSON string, where `\u0027`
/// decodes to the same character.
fn python_module(json: &str) -> String {
    let payload = json.replace('\'', "\\u0027");
    format!(
        "# Generated by siteconf. Edit the settings layers instead.\n\
         import json as _json\n\
         \n\
         globals().update(_json.loads(r'''\n{payload}\n'''))\n\
         del _json\n"
    )
}
