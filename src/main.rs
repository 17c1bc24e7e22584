//! siteconf: layered configuration resolver for static sites.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use siteconf::config;
use siteconf::constants;
use siteconf::env;
use siteconf::layers;
use siteconf::logging;
use siteconf::models;
use siteconf::output;
use siteconf::renderer;
use siteconf::resolver;

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;

use cli::args::{Cli, Command, GlobalArgs, LayersArgs, ResolveArgs};
use config::Config;
use env::Env;
use models::{Layer, SettingValue};
use renderer::{CommandRenderer, RenderMode, SiteRenderer};
use resolver::{EffectiveConfig, Resolver};

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let env = Env::real();
    logging::init(&env, cli.global.verbose);

    match cli.command {
        Command::Resolve(args) => run_resolve(&cli.global, &env, args),
        Command::Get { key } => run_get(&cli.global, &env, &key),
        Command::Explain { key } => run_explain(&cli.global, &env, &key),
        Command::Layers(args) => run_layers(&cli.global, &env, args),
        Command::Check => run_check(&cli.global, &env),
        Command::Build => run_render(&cli.global, &env, RenderMode::Build),
        Command::Serve => run_render(&cli.global, &env, RenderMode::Serve),
        Command::Version => run_version(),
    }
}

/// Everything a command needs: the project root, the tool config, and the
/// loaded layer stack.
struct Project {
    root: PathBuf,
    config: Config,
    layers: Vec<Layer>,
}

impl Project {
    fn load(global: &GlobalArgs, env: &Env) -> Result<Self> {
        let root = global.path.clone();
        if !root.is_dir() {
            bail!("project path {} is not a directory", root.display());
        }

        let mut config = Config::load(&root, env).context("failed to load tool configuration")?;
        global.apply(&mut config);

        let layers = layers::collect(&root, &config, env, &global.overrides)
            .context("failed to load settings layers")?;

        Ok(Self {
            root,
            config,
            layers,
        })
    }

    fn resolver(&self) -> Resolver {
        Resolver::from_config(&self.config.resolver)
    }

    fn resolve(&self) -> Result<EffectiveConfig> {
        self.resolver()
            .resolve(&self.layers)
            .context("failed to resolve configuration")
    }
}

fn run_resolve(global: &GlobalArgs, env: &Env, args: ResolveArgs) -> Result<()> {
    let effective = Project::load(global, env)?.resolve()?;
    print!("{}", args.format.render(&effective, args.settings_only));
    if args.format == cli::args::OutputFormat::Json {
        println!();
    }
    Ok(())
}

fn run_get(global: &GlobalArgs, env: &Env, key: &str) -> Result<()> {
    let effective = Project::load(global, env)?.resolve()?;
    match effective.get_path(key) {
        Some(SettingValue::String(s)) => println!("{s}"),
        Some(value) => println!("{value}"),
        None => bail!("setting `{key}` is not set"),
    }
    Ok(())
}

fn run_explain(global: &GlobalArgs, env: &Env, key: &str) -> Result<()> {
    let project = Project::load(global, env)?;
    let contributions = project.resolver().explain(&project.layers, key);
    // Still explain the layers when the fold itself fails.
    let effective = project.resolve();
    let resolved = effective.as_ref().ok().and_then(|cfg| cfg.get_path(key));

    print!("{}", output::terminal::render_explain(key, &contributions, resolved));
    effective.map(|_| ())
}

fn run_layers(global: &GlobalArgs, env: &Env, args: LayersArgs) -> Result<()> {
    let project = Project::load(global, env)?;
    let summaries: Vec<_> = project.layers.iter().map(Layer::summary).collect();

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summaries).context("failed to serialize layers")?
        );
    } else {
        print!("{}", output::terminal::render_layers(&summaries));
    }
    Ok(())
}

fn run_check(global: &GlobalArgs, env: &Env) -> Result<()> {
    let mut project = Project::load(global, env)?;
    project.config.resolver.strict = true;
    let effective = project.resolve()?;

    println!(
        "  {} {} settings from {} layers resolve cleanly",
        "✔".green().bold(),
        effective.len(),
        effective.layers().len(),
    );
    Ok(())
}

fn run_render(global: &GlobalArgs, env: &Env, mode: RenderMode) -> Result<()> {
    let project = Project::load(global, env)?;
    let effective = project.resolve()?;

    let renderer = CommandRenderer::new(&project.root, project.config.renderer.clone());
    let path = renderer
        .render(&effective, mode)
        .with_context(|| format!("{mode} failed"))?;

    eprintln!(
        "  {} {} finished ({})",
        "✔".green().bold(),
        mode,
        path.display().to_string().dimmed(),
    );
    Ok(())
}

fn run_version() -> Result<()> {
    println!(
        "{} {}",
        constants::APP_NAME.bold(),
        constants::VERSION.green().bold()
    );
    Ok(())
}
