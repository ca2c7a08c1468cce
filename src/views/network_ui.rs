use std::sync::Arc;

use egui::{Color32, Pos2, Stroke, Ui};
use egui_plot::Plot;

use super::canvas::{padded_bounds, PointCanvas, PointStyle};
use super::scatter_ui::point_tooltip;
use super::transition::Transition;
use super::view_trait::{View, ViewKind, ViewUpdate};
use crate::data::dataset::Dataset;
use crate::data::lasso::{LassoState, SelectionEnded};
use crate::data::network::Link;

/// Force-directed node-link drawing. Node `i` is data point `i`.
pub struct NetworkView {
    title: String,
    dataset: Arc<Dataset>,
    positions: Vec<[f64; 2]>,
    links: Vec<Link>,
    bounds: ([f64; 2], [f64; 2]),
    colors: Transition<Color32>,
    canvas: PointCanvas,
    marker_stroke: Color32,
}

impl NetworkView {
    /// `positions` are the layout positions aligned by node index.
    pub fn new(
        title: impl Into<String>,
        dataset: Arc<Dataset>,
        positions: Vec<[f64; 2]>,
        links: Vec<Link>,
        colors: Vec<Color32>,
        style: PointStyle,
    ) -> Self {
        Self {
            title: title.into(),
            dataset,
            bounds: padded_bounds(&positions),
            positions,
            links,
            colors: Transition::new(colors, style.transition_secs),
            canvas: PointCanvas::new(style.min_vertex_distance),
            marker_stroke: style.marker_stroke,
        }
    }

    pub fn colors(&self) -> &[Color32] {
        self.colors.target()
    }

    pub fn positions(&self) -> &[[f64; 2]] {
        &self.positions
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn marker_stroke(&self) -> Color32 {
        self.marker_stroke
    }

    pub fn set_marker_stroke(&mut self, stroke: Color32) {
        self.marker_stroke = stroke;
    }
}

impl View for NetworkView {
    fn title(&self) -> &str {
        &self.title
    }

    fn kind(&self) -> ViewKind {
        ViewKind::PointSet
    }

    fn update(&mut self, update: ViewUpdate<'_>, now: f64) {
        if let ViewUpdate::Colors(colors) = update {
            self.colors.set_target(colors.to_vec(), now);
        }
    }

    fn show(&mut self, ui: &mut Ui) -> Option<SelectionEnded> {
        let now = ui.input(|i| i.time);
        let colors = self.colors.current(now);
        if self.colors.is_animating(now) {
            ui.ctx().request_repaint();
        }

        let (min, max) = self.bounds;
        let plot_resp = Plot::new(("network_view", self.title.as_str()))
            .show_axes(false)
            .show_grid(false)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .allow_double_click_reset(false)
            .show_x(false)
            .show_y(false)
            .show(ui, |plot_ui| {
                plot_ui.set_plot_bounds_x(min[0]..=max[0]);
                plot_ui.set_plot_bounds_y(min[1]..=max[1]);
            });

        self.canvas.project(&plot_resp.transform, &self.positions);
        let painter = ui.painter_at(*plot_resp.transform.frame());
        let screen = self.canvas.screen_positions();
        let link_stroke = Stroke::new(1.0, ui.visuals().weak_text_color());
        for [a, b] in &self.links {
            if let (Some(pa), Some(pb)) = (screen.get(*a), screen.get(*b)) {
                painter.line_segment([Pos2::from(*pa), Pos2::from(*pb)], link_stroke);
            }
        }

        let hovered = plot_resp
            .response
            .hover_pos()
            .and_then(|p| self.canvas.point_at(p));
        self.canvas
            .paint_points(&painter, &colors, self.marker_stroke, hovered);
        let ended = self.canvas.handle_pointer(ui, &plot_resp.response);
        self.canvas
            .paint_lasso(&painter, ui.visuals().strong_text_color());

        if let Some(index) = hovered {
            if self.canvas.lasso_state() == LassoState::Idle {
                let dataset = &self.dataset;
                plot_resp
                    .response
                    .clone()
                    .on_hover_ui_at_pointer(|ui| point_tooltip(ui, dataset, index));
            }
        }
        ended
    }
}
