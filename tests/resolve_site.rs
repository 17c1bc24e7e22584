//! End-to-end tests: load the `blog` fixture project, build its layer stack,
//! resolve it, and hand it to the generator command.
//!
//! Each test works on a temporary copy so nothing is written into the
//! fixture directory.

use std::path::Path;

use pretty_assertions::assert_eq;
use siteconf::config::Config;
use siteconf::env::Env;
use siteconf::layers::{self, LayerError};
use siteconf::models::SettingValue;
use siteconf::renderer::{CommandRenderer, RenderMode, SiteRenderer};
use siteconf::resolver::{EffectiveConfig, ResolveError, Resolver};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/blog");

fn copy_dir(from: &Path, to: &Path) {
    std::fs::create_dir_all(to).unwrap();
    for entry in std::fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            std::fs::copy(entry.path(), target).unwrap();
        }
    }
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    copy_dir(Path::new(FIXTURE), dir.path());
    dir
}

fn no_env() -> Env {
    Env::mock(Vec::<(&str, &str)>::new())
}

fn load(root: &Path, env: &Env, overrides: &[&str]) -> (Config, EffectiveConfig) {
    let config = Config::load_with_global(None, root, env).unwrap();
    let overrides: Vec<String> = overrides.iter().map(|s| s.to_string()).collect();
    let stack = layers::collect(root, &config, env, &overrides).unwrap();
    let effective = Resolver::from_config(&config.resolver).resolve(&stack).unwrap();
    (config, effective)
}

// ---------------------------------------------------------------------------
// development profile (the project default)
// ---------------------------------------------------------------------------

#[test]
fn development_stack_layers_in_order() {
    let dir = project();
    let (_, effective) = load(dir.path(), &no_env(), &[]);
    let names: Vec<_> = effective.layers().iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["builtin", "theme", "site", "profile:development"]);
}

#[test]
fn development_resolves_site_settings() {
    let dir = project();
    let (_, effective) = load(dir.path(), &no_env(), &[]);

    assert_eq!(effective.get_str("AUTHOR"), Some("Oli Pratt"));
    assert_eq!(effective.get_str("TIMEZONE"), Some("Europe/London"));
    assert_eq!(effective.get_str("PYGMENTS_STYLE"), Some("monokai"));
    assert_eq!(effective.source_of("PYGMENTS_STYLE"), Some("site"));
    assert_eq!(effective.get_bool("MAIN_MENU"), Some(true));
    assert_eq!(effective.get_bool("RELATIVE_URLS"), Some(true));
    assert_eq!(effective.get("FEED_ALL_ATOM"), Some(&SettingValue::Null));
    assert_eq!(effective.source_of("FEED_ALL_ATOM"), Some("profile:development"));
    assert_eq!(effective.get_str("BROWSER_COLOR"), Some("#333333"));
    assert_eq!(
        effective.get("MENUITEMS").map(SettingValue::kind),
        Some(siteconf::models::ValueKind::Pairs)
    );
}

#[test]
fn derived_settings_are_interpolated() {
    let dir = project();
    let (_, effective) = load(dir.path(), &no_env(), &[]);

    assert_eq!(
        effective.get_str("SITEDESCRIPTION"),
        Some("Oli Pratt's Thoughts and Writings")
    );
    assert_eq!(effective.get_str("FAVICON"), Some("static/images/favicon.ico"));
    // Generator URL patterns are left alone.
    assert_eq!(effective.get_str("ARTICLE_URL"), Some("{slug}.html"));
}

#[test]
fn markdown_extensions_are_unioned_across_layers() {
    let dir = project();
    let (_, effective) = load(dir.path(), &no_env(), &[]);

    let extensions = effective
        .get_path("MARKDOWN.extension_configs")
        .and_then(SettingValue::as_map)
        .unwrap();
    let names: Vec<_> = extensions.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec![
            "markdown.extensions.codehilite",
            "markdown.extensions.extra",
            "markdown.extensions.meta",
            "markdown.extensions.toc",
        ]
    );
    assert_eq!(
        effective.get_bool("MARKDOWN.extension_configs.markdown.extensions.toc.permalink"),
        None,
        "dotted lookup cannot cross keys that contain dots"
    );
    let toc = extensions.get("markdown.extensions.toc").unwrap();
    assert_eq!(toc.get_path("permalink"), Some(&SettingValue::Bool(true)));
    assert_eq!(effective.get_str("MARKDOWN.output_format"), Some("html5"));
    assert_eq!(effective.source_of("MARKDOWN"), Some("site"));
    assert_eq!(effective.get_bool("JINJA_ENVIRONMENT.trim_blocks"), Some(true));
}

// ---------------------------------------------------------------------------
// production profile, environment and CLI overrides
// ---------------------------------------------------------------------------

#[test]
fn production_profile_from_environment() {
    let dir = project();
    let env = Env::mock([("SITECONF_PROFILE", "production")]);
    let (config, effective) = load(dir.path(), &env, &[]);

    assert_eq!(config.layers.profile.as_deref(), Some("production"));
    assert_eq!(effective.get_str("SITEURL"), Some("https://olipratt.co.uk/"));
    assert_eq!(
        effective.get_str("FAVICON"),
        Some("https://olipratt.co.uk/static/images/favicon.ico")
    );
    assert_eq!(effective.get_i64("DEFAULT_PAGINATION"), Some(10));
    assert_eq!(effective.get_bool("RELATIVE_URLS"), Some(false));
    assert_eq!(effective.get_str("FEED_ALL_ATOM"), Some("feeds/all.atom.xml"));
}

#[test]
fn cli_override_beats_profile() {
    let dir = project();
    let env = Env::mock([("SITECONF_PROFILE", "production")]);
    let (_, effective) = load(dir.path(), &env, &["DEFAULT_PAGINATION=false"]);

    assert_eq!(effective.get_bool("DEFAULT_PAGINATION"), Some(false));
    assert_eq!(effective.source_of("DEFAULT_PAGINATION"), Some("cli"));
}

#[test]
fn environment_override_merges_into_markdown() {
    let dir = project();
    let env = Env::mock([("SITECONF_SET__MARKDOWN__output_format", "xhtml")]);
    let (_, effective) = load(dir.path(), &env, &[]);

    assert_eq!(effective.get_str("MARKDOWN.output_format"), Some("xhtml"));
    assert!(
        effective
            .get_path("MARKDOWN.extension_configs")
            .and_then(SettingValue::as_map)
            .is_some_and(|m| m.len() == 4)
    );
    assert_eq!(effective.source_of("MARKDOWN"), Some("environment"));
}

#[test]
fn local_overrides_apply_between_profile_and_environment() {
    let dir = project();
    std::fs::write(
        dir.path().join("settings.local.toml"),
        "AUTHOR = \"Someone Else\"\nRELATIVE_URLS = false\n",
    )
    .unwrap();
    let env = Env::mock([("SITECONF_SET__RELATIVE_URLS", "true")]);
    let (_, effective) = load(dir.path(), &env, &[]);

    assert_eq!(effective.get_str("AUTHOR"), Some("Someone Else"));
    assert_eq!(
        effective.get_str("SITEDESCRIPTION"),
        Some("Someone Else's Thoughts and Writings")
    );
    assert_eq!(effective.get_bool("RELATIVE_URLS"), Some(true));
    assert_eq!(effective.source_of("RELATIVE_URLS"), Some("environment"));
}

// ---------------------------------------------------------------------------
// failures
// ---------------------------------------------------------------------------

#[test]
fn unknown_profile_fails_to_load() {
    let dir = project();
    let env = Env::mock([("SITECONF_PROFILE", "staging")]);
    let config = Config::load_with_global(None, dir.path(), &env).unwrap();
    let err = layers::collect(dir.path(), &config, &env, &[]).unwrap_err();
    assert!(matches!(err, LayerError::MissingProfile { .. }));
}

#[test]
fn strict_mode_accepts_declared_theme_keys_only() {
    let dir = project();
    let env = Env::mock([("SITECONF_STRICT", "true")]);
    let mut config = Config::load_with_global(None, dir.path(), &env).unwrap();
    let stack = layers::collect(dir.path(), &config, &env, &[]).unwrap();

    assert!(Resolver::from_config(&config.resolver).resolve(&stack).is_ok());

    config.resolver.extra_keys.clear();
    let err = Resolver::from_config(&config.resolver)
        .resolve(&stack)
        .unwrap_err();
    match err {
        ResolveError::UnknownKey(e) => {
            assert_eq!(e.key, "BROWSER_COLOR");
            assert_eq!(e.layer, "theme");
        }
        other => panic!("expected unknown key, got {other}"),
    }
}

#[test]
fn deep_merge_key_with_scalar_override_is_rejected() {
    let dir = project();
    let (config, _) = load(dir.path(), &no_env(), &[]);
    let overrides = vec!["MARKDOWN=plain".to_string()];
    let stack = layers::collect(dir.path(), &config, &no_env(), &overrides).unwrap();
    let err = Resolver::from_config(&config.resolver)
        .resolve(&stack)
        .unwrap_err();
    assert!(err.to_string().contains("MARKDOWN"));
}

// ---------------------------------------------------------------------------
// renderer hand-off
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn build_hands_config_to_generator() {
    let dir = project();
    let (config, effective) = load(dir.path(), &no_env(), &[]);

    let renderer = CommandRenderer::new(dir.path(), config.renderer.clone());
    let written = renderer.render(&effective, RenderMode::Build).unwrap();
    assert_eq!(written, dir.path().join(".siteconf/effective.json"));

    let copied = std::fs::read_to_string(dir.path().join("output/site.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&copied).unwrap();
    assert_eq!(parsed["SITENAME"], "Oli Pratt");
    assert_eq!(parsed["FEED_ALL_ATOM"], serde_json::Value::Null);
    assert_eq!(parsed["LINKS"][0][0], "Metaswitch");
}

#[test]
fn serve_without_command_fails() {
    let dir = project();
    let (config, effective) = load(dir.path(), &no_env(), &[]);
    let renderer = CommandRenderer::new(dir.path(), config.renderer.clone());
    assert!(renderer.render(&effective, RenderMode::Serve).is_err());
}
