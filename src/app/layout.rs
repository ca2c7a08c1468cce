//! Menu bar, status line and view arrangement for [`ExplorerApp`].
//!
//! Point views share the upper part of the window side by side; aggregate
//! views stack below them. Lasso results are collected while drawing and
//! handed to the orchestrator once every view has been shown.

use eframe::egui;
use egui_phosphor::regular::{HOURGLASS, PALETTE, PLUGS, PLUGS_CONNECTED, WARNING};

use crate::client::ConnectionState;
use crate::color_scheme::ColorScheme;
use crate::data::lasso::SelectionEnded;
use crate::views::{View, ViewKind};

use super::ExplorerApp;

/// Share of the height given to point views when an aggregate view is present.
const POINT_VIEW_SHARE: f32 = 0.6;

impl ExplorerApp {
    pub(super) fn render_menu(&mut self, ui: &mut egui::Ui) {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button(format!("{PALETTE} Theme"), |ui| {
                for scheme in ColorScheme::all() {
                    let selected = *scheme == self.color_scheme;
                    if ui.selectable_label(selected, scheme.label()).clicked() {
                        self.set_color_scheme(ui.ctx(), scheme.clone());
                        ui.close();
                    }
                }
            });
            ui.separator();
            ui.label(&self.orchestrator.settings().url);
        });
    }

    pub(super) fn render_status(&mut self, ui: &mut egui::Ui) {
        let state = self.orchestrator.state();
        ui.horizontal(|ui| {
            match &state.connection {
                ConnectionState::Connecting => {
                    ui.label(HOURGLASS);
                }
                ConnectionState::Open => {
                    ui.label(PLUGS_CONNECTED);
                }
                ConnectionState::Disconnected { .. } => {
                    ui.colored_label(ui.visuals().error_fg_color, format!("{PLUGS} {WARNING}"));
                }
            }
            ui.label(&state.status);
            if let Some(sel) = &state.selection {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak(format!("{} / {} selected", sel.count(), sel.len()));
                });
            }
        });
    }

    pub(super) fn render_views(&mut self, ui: &mut egui::Ui, now: f64) {
        if self.orchestrator.views().is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(&self.orchestrator.state().status);
            });
            return;
        }

        let mut ended: Vec<(String, SelectionEnded)> = Vec::new();
        let avail = ui.available_size();
        let views = self.orchestrator.views_mut();
        let has_aggregates = views.iter_mut().any(|v| v.kind() == ViewKind::Aggregate);
        let point_height = if has_aggregates {
            avail.y * POINT_VIEW_SHARE
        } else {
            avail.y
        };

        let mut point_views: Vec<&mut Box<dyn View>> = Vec::new();
        let mut aggregate_views: Vec<&mut Box<dyn View>> = Vec::new();
        for view in views.iter_mut() {
            match view.kind() {
                ViewKind::PointSet => point_views.push(view),
                ViewKind::Aggregate => aggregate_views.push(view),
            }
        }

        if !point_views.is_empty() {
            let columns = point_views.len();
            ui.allocate_ui(egui::vec2(avail.x, point_height), |ui| {
                ui.columns(columns, |cols| {
                    for (col, view) in cols.iter_mut().zip(point_views) {
                        col.strong(view.title());
                        if let Some(e) = view.show(col) {
                            ended.push((view.title().to_string(), e));
                        }
                    }
                });
            });
        }

        for view in aggregate_views {
            ui.separator();
            ui.strong(view.title());
            view.show(ui);
        }

        for (title, e) in ended {
            self.orchestrator.on_selection_ended(&title, e, now);
        }
    }
}
