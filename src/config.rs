//! Configuration for the explorer window and its backend session.

use std::collections::BTreeMap;
use std::path::Path;

use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::color_scheme::{
    parse_hex_color, to_hex_color, ColorParseError, ColorScheme, LabelPalette, FALLBACK_COLOR,
    UNSELECTED_COLOR,
};
use crate::data::lasso::DEFAULT_MIN_VERTEX_DISTANCE;
use crate::data::network::DEFAULT_SAMPLE_LINKS;
use crate::events::EventController;

/// Environment variable that overrides [`ExplorerSettings::url`].
pub const URL_ENV: &str = "LINKPLOT_URL";

pub const DEFAULT_URL: &str = "ws://localhost:9000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid settings file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Color(#[from] ColorParseError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Session settings (YAML)
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime settings, loadable from YAML. Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerSettings {
    /// WebSocket endpoint of the computation backend.
    pub url: String,
    /// Dataset selector sent with `passData`. `None` lets the backend choose.
    pub dataset: Option<String>,
    /// Show the feature-means bar chart.
    pub aggregates: bool,
    /// Request a network layout and show the node-link view.
    pub network: bool,
    /// Random links sent with the layout request.
    pub sample_link_count: usize,
    /// Minimum pixel spacing between lasso vertices.
    pub lasso_min_distance: f32,
    pub unselected_color: String,
    /// Color for labels missing from `palette`.
    pub fallback_color: String,
    /// Class label to `#rrggbb`.
    pub palette: BTreeMap<u32, String>,
    /// Recolor / resize animation length.
    pub transition_ms: u64,
    pub color_scheme: ColorScheme,
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        let palette = LabelPalette::default();
        Self {
            url: DEFAULT_URL.to_string(),
            dataset: None,
            aggregates: true,
            network: false,
            sample_link_count: DEFAULT_SAMPLE_LINKS,
            lasso_min_distance: DEFAULT_MIN_VERTEX_DISTANCE,
            unselected_color: to_hex_color(UNSELECTED_COLOR),
            fallback_color: to_hex_color(FALLBACK_COLOR),
            palette: (0..3)
                .map(|l| (l, to_hex_color(palette.color_for(l))))
                .collect(),
            transition_ms: 300,
            color_scheme: ColorScheme::default(),
        }
    }
}

impl ExplorerSettings {
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_yaml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&s)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Replace the URL when an override (usually [`URL_ENV`]) is set and non-empty.
    pub fn apply_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|u| !u.trim().is_empty()) {
            log::info!("backend url overridden: {url}");
            self.url = url;
        }
    }

    /// Check that every color entry parses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.palette()?;
        self.unselected()?;
        Ok(())
    }

    pub fn palette(&self) -> Result<LabelPalette, ColorParseError> {
        LabelPalette::from_hex(&self.palette, &self.fallback_color)
    }

    pub fn unselected(&self) -> Result<Color32, ColorParseError> {
        parse_hex_color(&self.unselected_color)
    }

    pub fn transition_secs(&self) -> f64 {
        self.transition_ms as f64 / 1000.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Feature flags
// ─────────────────────────────────────────────────────────────────────────────

/// Toggle window chrome. All features default to `true`.
#[derive(Clone, Debug)]
pub struct FeatureFlags {
    /// Show the top menu bar (theme picker).
    pub top_bar: bool,
    /// Show the connection / status line at the bottom.
    pub status_line: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            top_bar: true,
            status_line: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ExplorerConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration for the explorer window.
#[derive(Clone)]
pub struct ExplorerConfig {
    /// Native window title.
    pub title: String,
    /// Optional headline rendered above the views.
    pub headline: Option<String>,
    /// Optional eframe native-window options.
    pub native_options: Option<eframe::NativeOptions>,
    pub settings: ExplorerSettings,
    pub features: FeatureFlags,
    /// Receives selection, data and connection events when set.
    pub events: Option<EventController>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            title: "linkplot".to_string(),
            headline: None,
            native_options: None,
            settings: ExplorerSettings::default(),
            features: FeatureFlags::default(),
            events: None,
        }
    }
}

impl ExplorerConfig {
    pub fn with_settings(settings: ExplorerSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }
}
