//! Clap argument types and how they override the loaded tool config.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use siteconf::config::Config;
use siteconf::output::OutputRenderer;
use siteconf::resolver::EffectiveConfig;

/// Layered configuration resolver for static sites.
#[derive(Parser, Debug)]
#[command(
    name = "siteconf",
    version = siteconf::constants::VERSION,
    about = "Resolve layered static-site settings and hand them to the generator.",
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every subcommand.
#[derive(clap::Args, Debug, Default)]
pub struct GlobalArgs {
    /// Project root containing settings files and `.siteconf.toml`.
    #[arg(long, global = true, default_value = ".")]
    pub path: PathBuf,

    /// Environment profile to apply (e.g. development, production).
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Override a setting. Repeatable; `KEY.sub=VALUE` nests, and a quoted
    /// segment keeps its dots (`MARKDOWN.extension_configs."markdown.extensions.toc".permalink=true`).
    #[arg(long = "set", global = true, value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Additional comma-separated deep-merge keys.
    #[arg(long, global = true, value_delimiter = ',')]
    pub deep_merge: Vec<String>,

    /// Reject unknown settings and disallowed value types.
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Leave `{KEY}` placeholders unexpanded.
    #[arg(long, global = true, default_value_t = false)]
    pub no_interpolate: bool,

    /// Skip the compiled-in generator defaults.
    #[arg(long, global = true, default_value_t = false)]
    pub no_builtin: bool,

    /// Log debug diagnostics to stderr.
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,
}

impl GlobalArgs {
    /// Apply flags on top of a loaded config (CLI has the highest priority).
    pub fn apply(&self, config: &mut Config) {
        if let Some(profile) = &self.profile {
            config.layers.profile = Some(profile.clone());
        }
        for key in &self.deep_merge {
            if !config.resolver.deep_merge_keys.contains(key) {
                config.resolver.deep_merge_keys.push(key.clone());
            }
        }
        if self.strict {
            config.resolver.strict = true;
        }
        if self.no_interpolate {
            config.resolver.interpolate = false;
        }
        if self.no_builtin {
            config.layers.builtin_defaults = false;
        }
    }
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Print the effective configuration.
    Resolve(ResolveArgs),

    /// Print one setting (dotted paths reach into maps).
    Get {
        /// Setting key, e.g. `SITEURL` or `MARKDOWN.output_format`.
        key: String,
    },

    /// Show how each layer contributed to a setting.
    Explain {
        /// Setting key, e.g. `MARKDOWN`.
        key: String,
    },

    /// List the layers in priority order.
    Layers(LayersArgs),

    /// Resolve in strict mode and report problems.
    Check,

    /// Write the effective config and run the generator's build command.
    Build,

    /// Write the effective config and run the generator's serve command.
    Serve,

    /// Print version information.
    Version,
}

/// Arguments for the `resolve` subcommand.
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Output format.
    #[arg(long, default_value = "terminal")]
    pub format: OutputFormat,

    /// With `--format json`, print only the settings map.
    #[arg(long, default_value_t = false)]
    pub settings_only: bool,
}

/// Arguments for the `layers` subcommand.
#[derive(Parser, Debug)]
pub struct LayersArgs {
    /// Print the layer summaries as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Terminal,
    Json,
    Toml,
}

impl OutputFormat {
    /// Render a configuration using the renderer for this format.
    pub fn render(&self, config: &EffectiveConfig, settings_only: bool) -> String {
        match self {
            OutputFormat::Terminal => siteconf::output::terminal::TerminalRenderer.render(config),
            OutputFormat::Json => {
                siteconf::output::json::JsonRenderer { settings_only }.render(config)
            }
            OutputFormat::Toml => siteconf::output::toml::TomlRenderer.render(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("siteconf").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn resolve_defaults_to_terminal() {
        let cli = parse(&["resolve"]);
        match cli.command {
            Command::Resolve(args) => {
                assert_eq!(args.format, OutputFormat::Terminal);
                assert!(!args.settings_only);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.global.path, PathBuf::from("."));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&[
            "get",
            "SITEURL",
            "--profile",
            "production",
            "--set",
            "A=1",
            "--set",
            "B.c=x",
            "--deep-merge",
            "JINJA_FILTERS,THEME_OPTIONS",
            "-v",
        ]);
        assert!(matches!(cli.command, Command::Get { ref key } if key == "SITEURL"));
        assert_eq!(cli.global.profile.as_deref(), Some("production"));
        assert_eq!(cli.global.overrides, vec!["A=1", "B.c=x"]);
        assert_eq!(cli.global.deep_merge, vec!["JINJA_FILTERS", "THEME_OPTIONS"]);
        assert!(cli.global.verbose);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let result = Cli::try_parse_from(["siteconf", "resolve", "--format", "yaml"]);
        assert!(result.is_err());
    }

    #[test]
    fn apply_overrides_config() {
        let mut config = Config::default();
        let global = GlobalArgs {
            profile: Some("production".into()),
            deep_merge: vec!["MARKDOWN".into(), "THEME_OPTIONS".into()],
            strict: true,
            no_interpolate: true,
            no_builtin: true,
            ..GlobalArgs::default()
        };
        global.apply(&mut config);

        assert_eq!(config.layers.profile.as_deref(), Some("production"));
        assert_eq!(
            config.resolver.deep_merge_keys,
            vec!["MARKDOWN", "JINJA_ENVIRONMENT", "THEME_OPTIONS"]
        );
        assert!(config.resolver.strict);
        assert!(!config.resolver.interpolate);
        assert!(!config.layers.builtin_defaults);
    }

    #[test]
    fn apply_without_flags_keeps_config() {
        let mut config = Config::default();
        GlobalArgs::default().apply(&mut config);
        assert_eq!(config, Config::default());
    }
}
