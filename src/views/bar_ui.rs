use egui::Ui;
use egui_plot::{Bar, BarChart, Plot};

use super::transition::Transition;
use super::view_trait::{View, ViewKind, ViewUpdate};
use crate::color_scheme::BAR_COLOR;
use crate::data::lasso::SelectionEnded;

/// One bar per feature showing its normalized mean.
pub struct BarView {
    title: String,
    feature_names: Vec<String>,
    heights: Transition<f64>,
}

impl BarView {
    /// Bars start at zero height until the first means arrive.
    pub fn new(title: impl Into<String>, feature_names: Vec<String>, transition_secs: f64) -> Self {
        let zeros = vec![0.0; feature_names.len()];
        Self {
            title: title.into(),
            feature_names,
            heights: Transition::new(zeros, transition_secs),
        }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Heights the view is showing or easing toward.
    pub fn heights(&self) -> &[f64] {
        self.heights.target()
    }
}

impl View for BarView {
    fn title(&self) -> &str {
        &self.title
    }

    fn kind(&self) -> ViewKind {
        ViewKind::Aggregate
    }

    fn update(&mut self, update: ViewUpdate<'_>, now: f64) {
        if let ViewUpdate::Heights(heights) = update {
            self.heights.set_target(heights.to_vec(), now);
        }
    }

    fn show(&mut self, ui: &mut Ui) -> Option<SelectionEnded> {
        let now = ui.input(|i| i.time);
        let heights = self.heights.current(now);
        if self.heights.is_animating(now) {
            ui.ctx().request_repaint();
        }

        let bars: Vec<Bar> = heights
            .iter()
            .zip(&self.feature_names)
            .enumerate()
            .map(|(i, (h, name))| Bar::new(i as f64, *h).width(0.7).fill(BAR_COLOR).name(name))
            .collect();
        let chart = BarChart::new("Normalized Mean", bars).color(BAR_COLOR);

        let names = &self.feature_names;
        let n = names.len() as f64;
        Plot::new(("bar_view", self.title.as_str()))
            .y_axis_label("Normalized Mean")
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .allow_double_click_reset(false)
            .x_axis_formatter(move |mark, _range| {
                let i = mark.value.round();
                if (mark.value - i).abs() > 1e-6 || i < 0.0 {
                    return String::new();
                }
                names.get(i as usize).cloned().unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                plot_ui.set_plot_bounds_x(-0.5..=(n - 0.5).max(0.5));
                plot_ui.set_plot_bounds_y(0.0..=1.0);
                plot_ui.bar_chart(chart);
            });
        None
    }
}
