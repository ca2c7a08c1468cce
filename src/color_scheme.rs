//! Color definitions for linkplot.
//!
//! [`ColorScheme`] selects the egui visuals of the window. [`LabelPalette`] maps
//! class labels to point colors and is shared by every view that renders by
//! label, so scatter and network always agree on what a class looks like.

use std::collections::BTreeMap;

use eframe::egui::{Color32, Context, Visuals};
use serde::{Deserialize, Serialize};

/// Color used for points outside a non-empty selection (`#aaaaaa`).
pub const UNSELECTED_COLOR: Color32 = Color32::from_rgb(0xaa, 0xaa, 0xaa);

/// Color used for labels without a palette entry (`#4d7aa7`).
pub const FALLBACK_COLOR: Color32 = Color32::from_rgb(0x4d, 0x7a, 0xa7);

/// Fill color of the aggregate bars (`#4a90d9`).
pub const BAR_COLOR: Color32 = Color32::from_rgb(0x4a, 0x90, 0xd9);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color `{0}` (expected #rrggbb or #rgb)")]
pub struct ColorParseError(pub String);

/// Parse `#rrggbb` or `#rgb` (the leading `#` is optional).
pub fn parse_hex_color(s: &str) -> Result<Color32, ColorParseError> {
    let err = || ColorParseError(s.to_string());
    let hex = s.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return Err(err());
    }
    let channel = |i: usize, len: usize| u8::from_str_radix(&hex[i..i + len], 16).map_err(|_| err());
    match hex.len() {
        6 => Ok(Color32::from_rgb(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?)),
        3 => {
            let (r, g, b) = (channel(0, 1)?, channel(1, 1)?, channel(2, 1)?);
            Ok(Color32::from_rgb(r * 17, g * 17, b * 17))
        }
        _ => Err(err()),
    }
}

/// Format as lowercase `#rrggbb`, ignoring alpha.
pub fn to_hex_color(c: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", c.r(), c.g(), c.b())
}

/// Fixed mapping from class label to color.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPalette {
    colors: BTreeMap<u32, Color32>,
    fallback: Color32,
}

impl Default for LabelPalette {
    /// First three category10 colors, as used by the wine dashboards.
    fn default() -> Self {
        Self {
            colors: BTreeMap::from([
                (0, Color32::from_rgb(0x1f, 0x77, 0xb4)),
                (1, Color32::from_rgb(0xff, 0x7f, 0x0e)),
                (2, Color32::from_rgb(0x2c, 0xa0, 0x2c)),
            ]),
            fallback: FALLBACK_COLOR,
        }
    }
}

impl LabelPalette {
    pub fn new(colors: BTreeMap<u32, Color32>, fallback: Color32) -> Self {
        Self { colors, fallback }
    }

    /// Build from hex strings, e.g. the `palette` section of a settings file.
    pub fn from_hex(entries: &BTreeMap<u32, String>, fallback: &str) -> Result<Self, ColorParseError> {
        let colors = entries
            .iter()
            .map(|(label, hex)| Ok((*label, parse_hex_color(hex)?)))
            .collect::<Result<BTreeMap<_, _>, ColorParseError>>()?;
        Ok(Self {
            colors,
            fallback: parse_hex_color(fallback)?,
        })
    }

    /// Color for `label`; labels without an entry get the fallback color.
    pub fn color_for(&self, label: u32) -> Color32 {
        self.colors.get(&label).copied().unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> Color32 {
        self.fallback
    }

    /// Per-point base colors for a label vector.
    pub fn base_colors(&self, labels: &[u32]) -> Vec<Color32> {
        labels.iter().map(|&l| self.color_for(l)).collect()
    }
}

/// Visual theme for the window.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    /// eframe default dark visuals.
    #[default]
    Dark,
    /// eframe default light visuals.
    Light,
    /// ggplot2-inspired: light grey background with white plot areas.
    GgPlot,
    /// Nord: blue-grey dark theme.
    Nord,
}

impl ColorScheme {
    /// All built-in schemes (useful for combo-box UIs).
    pub fn all() -> &'static [ColorScheme] {
        &[
            ColorScheme::Dark,
            ColorScheme::Light,
            ColorScheme::GgPlot,
            ColorScheme::Nord,
        ]
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ColorScheme::Dark => "Dark",
            ColorScheme::Light => "Light",
            ColorScheme::GgPlot => "ggplot2",
            ColorScheme::Nord => "Nord",
        }
    }

    /// Stroke drawn around point markers, chosen to stay visible on the scheme background.
    pub fn marker_stroke(&self) -> Color32 {
        match self {
            ColorScheme::Dark | ColorScheme::Nord => Color32::from_gray(60),
            ColorScheme::Light | ColorScheme::GgPlot => Color32::from_gray(0xcc),
        }
    }

    /// Apply this scheme's visuals to an egui context.
    pub fn apply(&self, ctx: &Context) {
        match self {
            ColorScheme::Dark => ctx.set_visuals(Visuals::dark()),
            ColorScheme::Light => ctx.set_visuals(Visuals::light()),
            ColorScheme::GgPlot => {
                let mut v = Visuals::light();
                let bg = Color32::from_rgb(229, 229, 229);
                let fg = Color32::from_rgb(51, 51, 51);
                v.panel_fill = bg;
                v.window_fill = Color32::WHITE;
                v.extreme_bg_color = Color32::WHITE;
                v.faint_bg_color = Color32::from_rgb(240, 240, 240);
                v.override_text_color = Some(fg);
                v.widgets.noninteractive.bg_fill = Color32::from_rgb(240, 240, 240);
                v.widgets.noninteractive.fg_stroke.color = fg;
                ctx.set_visuals(v);
            }
            ColorScheme::Nord => {
                let mut v = Visuals::dark();
                let polar0 = Color32::from_rgb(46, 52, 64);
                let polar1 = Color32::from_rgb(59, 66, 82);
                let snow0 = Color32::from_rgb(216, 222, 233);
                v.panel_fill = polar0;
                v.window_fill = polar1;
                v.extreme_bg_color = polar0;
                v.faint_bg_color = polar1;
                v.override_text_color = Some(snow0);
                v.widgets.noninteractive.bg_fill = polar1;
                v.widgets.noninteractive.fg_stroke.color = snow0;
                v.widgets.hovered.bg_fill = Color32::from_rgb(76, 86, 106);
                ctx.set_visuals(v);
            }
        }
    }
}
