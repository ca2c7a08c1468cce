use std::sync::Arc;

use egui::{Color32, RichText, Sense, Ui};
use egui_plot::Plot;

use super::canvas::{padded_bounds, PointCanvas, PointStyle};
use super::transition::Transition;
use super::view_trait::{View, ViewKind, ViewUpdate};
use crate::color_scheme::LabelPalette;
use crate::data::dataset::Dataset;
use crate::data::lasso::{LassoState, SelectionEnded};

/// 2-D projection of the dataset, one circle per point.
pub struct ScatterView {
    title: String,
    dataset: Arc<Dataset>,
    coords: Vec<[f64; 2]>,
    bounds: ([f64; 2], [f64; 2]),
    colors: Transition<Color32>,
    legend: Vec<(String, Color32)>,
    canvas: PointCanvas,
    marker_stroke: Color32,
}

impl ScatterView {
    pub fn new(
        title: impl Into<String>,
        dataset: Arc<Dataset>,
        colors: Vec<Color32>,
        palette: &LabelPalette,
        style: PointStyle,
    ) -> Self {
        let coords = dataset.positions();
        let mut labels = dataset.labels();
        labels.sort_unstable();
        labels.dedup();
        let legend = labels
            .into_iter()
            .map(|l| (dataset.class_name(l), palette.color_for(l)))
            .collect();
        Self {
            title: title.into(),
            bounds: padded_bounds(&coords),
            coords,
            dataset,
            colors: Transition::new(colors, style.transition_secs),
            legend,
            canvas: PointCanvas::new(style.min_vertex_distance),
            marker_stroke: style.marker_stroke,
        }
    }

    /// Colors the view is showing or easing toward.
    pub fn colors(&self) -> &[Color32] {
        self.colors.target()
    }

    pub fn legend(&self) -> &[(String, Color32)] {
        &self.legend
    }

    pub fn marker_stroke(&self) -> Color32 {
        self.marker_stroke
    }

    pub fn set_marker_stroke(&mut self, stroke: Color32) {
        self.marker_stroke = stroke;
    }
}

impl View for ScatterView {
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

        ui.horizontal_wrapped(|ui| {
            for (name, color) in &self.legend {
                let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), Sense::hover());
                ui.painter().circle_filled(rect.center(), 5.0, *color);
                ui.label(name);
                ui.add_space(8.0);
            }
        });

        let (min, max) = self.bounds;
        let plot_resp = Plot::new(("scatter_view", self.title.as_str()))
            .x_axis_label("t-SNE 1")
            .y_axis_label("t-SNE 2")
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

        self.canvas.project(&plot_resp.transform, &self.coords);
        let painter = ui.painter_at(*plot_resp.transform.frame());
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

/// Class name and every feature value of point `index`.
pub(crate) fn point_tooltip(ui: &mut Ui, dataset: &Dataset, index: usize) {
    let Some(point) = dataset.points.get(index) else {
        return;
    };
    ui.label(RichText::new(dataset.class_name(point.label)).strong());
    egui::Grid::new("point_tooltip").num_columns(2).show(ui, |ui| {
        for (name, value) in dataset.feature_names.iter().zip(&point.features) {
            ui.label(name);
            ui.label(format!("{value:.2}"));
            ui.end_row();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset() -> Arc<Dataset> {
        let records = vec![
            json!({"tsne_1": 0.0, "tsne_2": 0.0, "label": 1, "ash": 1.0}),
            json!({"tsne_1": 1.0, "tsne_2": 1.0, "label": 0, "ash": 2.0}),
            json!({"tsne_1": 2.0, "tsne_2": 0.0, "label": 1, "ash": 3.0}),
        ];
        Arc::new(Dataset::from_records(&records, Vec::new(), vec!["a".into(), "b".into()]).unwrap())
    }

    #[test]
    fn legend_lists_each_class_once() {
        let palette = LabelPalette::default();
        let ds = dataset();
        let colors = palette.base_colors(&ds.labels());
        let view = ScatterView::new("Scatter", ds, colors, &palette, PointStyle::default());
        let names: Vec<_> = view.legend().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn accepts_colors_and_ignores_heights() {
        let palette = LabelPalette::default();
        let ds = dataset();
        let mut view = ScatterView::new(
            "Scatter",
            ds,
            vec![Color32::RED; 3],
            &palette,
            PointStyle::default(),
        );
        view.update(ViewUpdate::Heights(&[0.5]), 0.0);
        assert_eq!(view.colors(), &[Color32::RED; 3]);
        view.update(ViewUpdate::Colors(&[Color32::BLUE; 3]), 0.0);
        assert_eq!(view.colors(), &[Color32::BLUE; 3]);
        assert_eq!(view.kind(), ViewKind::PointSet);
    }
}
