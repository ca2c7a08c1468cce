//! Painting and pointer handling shared by the point views.
//!
//! Points are drawn with the painter on top of an `egui_plot` frame, so the
//! plot provides axes and the coordinate transform while this module keeps the
//! screen position of every point for lasso hit testing.

use egui::{Color32, Painter, PointerButton, Pos2, Response, Shape, Stroke, Ui};
use egui_plot::{PlotPoint, PlotTransform};

use crate::data::geometry::ScreenPos;
use crate::data::lasso::{LassoCapture, LassoState, SelectionEnded};

/// Marker radius in pixels.
pub const POINT_RADIUS: f32 = 5.0;

/// Look and feel shared by the point views.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointStyle {
    pub min_vertex_distance: f32,
    pub transition_secs: f64,
    pub marker_stroke: Color32,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            min_vertex_distance: crate::data::lasso::DEFAULT_MIN_VERTEX_DISTANCE,
            transition_secs: super::transition::DEFAULT_TRANSITION_SECS,
            marker_stroke: Color32::from_gray(60),
        }
    }
}

/// Data extents padded by 5% on every side (unit padding for flat extents).
pub fn padded_bounds(coords: &[[f64; 2]]) -> ([f64; 2], [f64; 2]) {
    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    for p in coords.iter().filter(|p| p[0].is_finite() && p[1].is_finite()) {
        for axis in 0..2 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    for axis in 0..2 {
        if !min[axis].is_finite() {
            min[axis] = 0.0;
            max[axis] = 1.0;
        }
        let span = max[axis] - min[axis];
        let pad = if span > 0.0 { span * 0.05 } else { 1.0 };
        min[axis] -= pad;
        max[axis] += pad;
    }
    (min, max)
}

pub struct PointCanvas {
    lasso: LassoCapture,
    screen: Vec<ScreenPos>,
    radius: f32,
}

impl PointCanvas {
    pub fn new(min_vertex_distance: f32) -> Self {
        Self {
            lasso: LassoCapture::new(min_vertex_distance),
            screen: Vec::new(),
            radius: POINT_RADIUS,
        }
    }

    /// Screen position of every point as of the last [`project`](Self::project).
    pub fn screen_positions(&self) -> &[ScreenPos] {
        &self.screen
    }

    pub fn lasso_state(&self) -> LassoState {
        self.lasso.state()
    }

    /// Map plot coordinates to screen positions.
    pub fn project(&mut self, transform: &PlotTransform, coords: &[[f64; 2]]) {
        self.screen = coords
            .iter()
            .map(|p| transform.position_from_point(&PlotPoint::new(p[0], p[1])).into())
            .collect();
    }

    /// Index of the point under `pos`, nearest first.
    pub fn point_at(&self, pos: Pos2) -> Option<usize> {
        let target = ScreenPos::from(pos);
        self.screen
            .iter()
            .enumerate()
            .map(|(i, p)| (i, p.distance(target)))
            .filter(|(_, d)| *d <= self.radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Feed this frame's pointer activity on `response` into the lasso.
    pub fn handle_pointer(&mut self, ui: &Ui, response: &Response) -> Option<SelectionEnded> {
        if response.drag_started_by(PointerButton::Primary) {
            let origin = ui
                .input(|i| i.pointer.press_origin())
                .or_else(|| response.interact_pointer_pos());
            if let Some(origin) = origin {
                let on_point = self.point_at(origin).is_some();
                self.lasso.pointer_down(origin.into(), on_point);
            }
        }
        if response.dragged_by(PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                self.lasso.pointer_move(pos.into());
            }
        }
        if response.drag_stopped() {
            return self.lasso.pointer_up(&self.screen);
        }
        // A plain click on the background is a gesture with a single vertex.
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                if self.lasso.pointer_down(pos.into(), self.point_at(pos).is_some()) {
                    return self.lasso.pointer_up(&self.screen);
                }
            }
        }
        None
    }

    pub fn paint_points(&self, painter: &Painter, colors: &[Color32], stroke: Color32, hovered: Option<usize>) {
        for (i, pos) in self.screen.iter().enumerate() {
            let fill = colors.get(i).copied().unwrap_or(Color32::GRAY);
            let radius = if hovered == Some(i) {
                self.radius + 2.0
            } else {
                self.radius
            };
            painter.circle(Pos2::from(*pos), radius, fill, Stroke::new(1.0, stroke));
        }
    }

    pub fn paint_lasso(&self, painter: &Painter, color: Color32) {
        let pts: Vec<Pos2> = self.lasso.polygon().iter().map(|p| Pos2::from(*p)).collect();
        let stroke = Stroke::new(1.5, color);
        match pts.len() {
            0 | 1 => {}
            2 => {
                painter.add(Shape::line(pts, stroke));
            }
            _ => {
                painter.add(Shape::closed_line(pts, stroke));
            }
        }
    }
}
