//! Terminal renderer: one `KEY = value` line per setting, with its source.

use colored::Colorize;

use crate::models::{LayerSummary, SettingValue};
use crate::output::OutputRenderer;
use crate::resolver::{Contribution, Effect, EffectiveConfig};

/// Terminal output renderer with colored, aligned text.
pub struct TerminalRenderer;

impl OutputRenderer for TerminalRenderer {
    fn render(&self, config: &EffectiveConfig) -> String {
        if config.is_empty() {
            return format!("{}", "  No settings resolved.\n".yellow());
        }

        let width = config.keys().map(str::len).max().unwrap_or(0);
        let mut output = String::new();

        for setting in config.iter() {
            output.push_str(&format!(
                " {} = {}  {}\n",
                format!("{:<width$}", setting.key).bold(),
                styled_value(&setting.value),
                format!("({})", setting.source).dimmed(),
            ));
        }

        let layer_count = config.layers().len();
        output.push_str(&format!("{}\n", "───────────────────────────────────".dimmed()));
        output.push_str(&format!(
            " {} settings from {} {}\n",
            config.len().to_string().bold(),
            layer_count.to_string().bold(),
            if layer_count == 1 { "layer" } else { "layers" },
        ));
        output.push_str(&format!(" fingerprint {}\n", config.fingerprint().dimmed()));

        output
    }
}

fn styled_value(value: &SettingValue) -> String {
    match value {
        SettingValue::Null => "null".dimmed().to_string(),
        SettingValue::Bool(_) | SettingValue::Integer(_) | SettingValue::Float(_) => {
            value.to_string().cyan().to_string()
        }
        SettingValue::String(s) => format!("{s:?}").green().to_string(),
        _ => value.to_string(),
    }
}

/// Render the layer stack, lowest priority first.
pub fn render_layers(layers: &[LayerSummary]) -> String {
    if layers.is_empty() {
        return format!("{}", "  No layers found.\n".yellow());
    }

    let mut output = String::new();
    for (i, layer) in layers.iter().enumerate() {
        output.push_str(&format!(
            " {} {} {}  {} {}\n",
            format!("{}.", i + 1).dimmed(),
            layer.name.bold(),
            format!("[{}]", layer.origin).cyan(),
            layer.settings,
            if layer.settings == 1 { "setting" } else { "settings" },
        ));
        if let Some(path) = &layer.path {
            output.push_str(&format!("    {}\n", path.dimmed()));
        }
        if let Some(digest) = &layer.digest {
            output.push_str(&format!("    sha256 {}\n", digest.dimmed()));
        }
    }
    output
}

/// Render how each layer contributed to `key`, ending with the final value.
pub fn render_explain(
    key: &str,
    contributions: &[Contribution],
    resolved: Option<&SettingValue>,
) -> String {
    if contributions.is_empty() {
        return format!(" {} is not set by any layer\n", key.bold());
    }

    let mut output = format!(" {}\n", key.bold());
    for c in contributions {
        let effect = match c.effect {
            Effect::Set => format!("{:<8}", "set").green(),
            Effect::Replaced => format!("{:<8}", "replaced").yellow(),
            Effect::Merged => format!("{:<8}", "merged").cyan(),
        };
        output.push_str(&format!(
            "   {} {} by {} {}\n",
            "→".dimmed(),
            effect,
            c.layer.bold(),
            styled_value(&c.value),
        ));
    }
    if let Some(value) = resolved {
        output.push_str(&format!("   {} {}\n", "=".bold(), styled_value(value)));
    }
    output
}
