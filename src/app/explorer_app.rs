//! Standalone application wrapper implementing [`eframe::App`].

use eframe::egui;

use crate::color_scheme::ColorScheme;
use crate::config::{ExplorerConfig, FeatureFlags};

use super::orchestrator::Orchestrator;

/// The explorer window: chrome around the orchestrator's views.
pub struct ExplorerApp {
    pub orchestrator: Orchestrator,
    /// Optional heading text shown at the top of the window.
    pub headline: Option<String>,
    pub features: FeatureFlags,
    pub color_scheme: ColorScheme,
    color_scheme_applied: bool,
}

impl ExplorerApp {
    pub fn new(orchestrator: Orchestrator, cfg: &ExplorerConfig) -> Self {
        Self {
            color_scheme: orchestrator.settings().color_scheme.clone(),
            orchestrator,
            headline: cfg.headline.clone(),
            features: cfg.features.clone(),
            color_scheme_applied: false,
        }
    }

    pub(super) fn set_color_scheme(&mut self, ctx: &egui::Context, scheme: ColorScheme) {
        scheme.apply(ctx);
        self.orchestrator.set_marker_stroke(scheme.marker_stroke());
        self.color_scheme = scheme;
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.color_scheme_applied {
            self.set_color_scheme(ctx, self.color_scheme.clone());
            self.color_scheme_applied = true;
        }

        let now = ctx.input(|i| i.time);
        self.orchestrator.poll(now);

        if self.features.top_bar {
            egui::TopBottomPanel::top("linkplot_menu").show(ctx, |ui| self.render_menu(ui));
        }
        if let Some(h) = &self.headline {
            egui::TopBottomPanel::top("linkplot_headline").show(ctx, |ui| {
                ui.heading(h);
            });
        }
        if self.features.status_line {
            egui::TopBottomPanel::bottom("linkplot_status").show(ctx, |ui| self.render_status(ui));
        }
        egui::CentralPanel::default().show(ctx, |ui| self.render_views(ui, now));
    }
}
