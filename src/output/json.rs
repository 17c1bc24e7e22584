//! JSON output renderer.
//!
//! Outputs `{"settings": {...}, "sources": {...}, "layers": [...], "fingerprint": "..."}`.

use indexmap::IndexMap;
use serde::Serialize;

use crate::models::LayerSummary;
use crate::output::OutputRenderer;
use crate::resolver::EffectiveConfig;

/// JSON output renderer.
pub struct JsonRenderer {
    /// Emit only the flat settings map, which is what the site generator reads.
    pub settings_only: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    settings: &'a EffectiveConfig,
    sources: IndexMap<&'a str, &'a str>,
    layers: &'a [LayerSummary],
    fingerprint: &'a str,
}

impl OutputRenderer for JsonRenderer {
    fn render(&self, config: &EffectiveConfig) -> String {
        let output = if self.settings_only {
            serde_json::to_string_pretty(config)
        } else {
            serde_json::to_string_pretty(&Report {
                settings: config,
                sources: config
                    .iter()
                    .map(|s| (s.key.as_str(), s.source.as_str()))
                    .collect(),
                layers: config.layers(),
                fingerprint: config.fingerprint(),
            })
        };

        output.unwrap_or_else(|_| "{}".to_string())
    }
}
