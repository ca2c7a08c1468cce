//! Lasso capture: turns a pointer drag into a closed polygon and a selection.
//!
//! The machine only has two resting states. Closing the polygon is a
//! transient step of the `Drawing -> Idle` transition that yields exactly one
//! [`SelectionEnded`]. It never renders and never talks to the backend.

use crate::data::geometry::{select_points, ScreenPos};
use crate::data::selection::Selection;

/// Default minimum spacing (pixels) between consecutive lasso vertices.
pub const DEFAULT_MIN_VERTEX_DISTANCE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LassoState {
    #[default]
    Idle,
    Drawing,
}

/// Result of a completed gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionEnded {
    pub selection: Selection,
    /// Number of vertices the closed polygon had.
    pub vertex_count: usize,
}

#[derive(Debug, Clone)]
pub struct LassoCapture {
    state: LassoState,
    polygon: Vec<ScreenPos>,
    min_vertex_distance: f32,
}

impl Default for LassoCapture {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_VERTEX_DISTANCE)
    }
}

impl LassoCapture {
    pub fn new(min_vertex_distance: f32) -> Self {
        Self {
            state: LassoState::Idle,
            polygon: Vec::new(),
            min_vertex_distance: min_vertex_distance.max(0.0),
        }
    }

    pub fn state(&self) -> LassoState {
        self.state
    }

    /// Vertices drawn so far (empty while idle).
    pub fn polygon(&self) -> &[ScreenPos] {
        &self.polygon
    }

    /// Pointer pressed. Presses on a rendered point are left to other interactions.
    ///
    /// Returns `true` when a new gesture started.
    pub fn pointer_down(&mut self, pos: ScreenPos, on_point: bool) -> bool {
        if on_point {
            return false;
        }
        self.polygon.clear();
        self.polygon.push(pos);
        self.state = LassoState::Drawing;
        true
    }

    /// Pointer moved with the button held.
    pub fn pointer_move(&mut self, pos: ScreenPos) {
        if self.state != LassoState::Drawing {
            return;
        }
        let far_enough = self
            .polygon
            .last()
            .map_or(true, |last| last.distance(pos) > self.min_vertex_distance);
        if far_enough {
            self.polygon.push(pos);
        }
    }

    /// Pointer released anywhere. Closes the polygon and hit-tests `positions`
    /// (the current screen position of every point, by index).
    ///
    /// Returns `None` when no gesture was in progress.
    pub fn pointer_up(&mut self, positions: &[ScreenPos]) -> Option<SelectionEnded> {
        if self.state != LassoState::Drawing {
            return None;
        }
        self.state = LassoState::Idle;
        let polygon = std::mem::take(&mut self.polygon);
        let selection = if polygon.len() >= 3 {
            select_points(positions, &polygon)
        } else {
            Selection::none(positions.len())
        };
        log::debug!(
            "lasso closed: {} vertices, {} of {} points selected",
            polygon.len(),
            selection.count(),
            positions.len()
        );
        Some(SelectionEnded {
            selection,
            vertex_count: polygon.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts() -> Vec<ScreenPos> {
        vec![
            ScreenPos::new(10.0, 10.0),
            ScreenPos::new(100.0, 100.0),
            ScreenPos::new(200.0, 10.0),
        ]
    }

    #[test]
    fn full_gesture_selects_enclosed_points() {
        let mut lasso = LassoCapture::default();
        assert!(lasso.pointer_down(ScreenPos::new(0.0, 0.0), false));
        assert_eq!(lasso.state(), LassoState::Drawing);
        lasso.pointer_move(ScreenPos::new(30.0, 0.0));
        lasso.pointer_move(ScreenPos::new(30.0, 30.0));
        lasso.pointer_move(ScreenPos::new(0.0, 30.0));
        let ended = lasso.pointer_up(&pts()).unwrap();
        assert_eq!(ended.selection.members(), &[true, false, false]);
        assert_eq!(ended.vertex_count, 4);
        assert_eq!(lasso.state(), LassoState::Idle);
        assert!(lasso.polygon().is_empty());
    }

    #[test]
    fn near_duplicate_moves_are_dropped() {
        let mut lasso = LassoCapture::new(5.0);
        lasso.pointer_down(ScreenPos::new(0.0, 0.0), false);
        lasso.pointer_move(ScreenPos::new(1.0, 1.0));
        lasso.pointer_move(ScreenPos::new(3.0, 0.0));
        assert_eq!(lasso.polygon().len(), 1);
        lasso.pointer_move(ScreenPos::new(10.0, 0.0));
        assert_eq!(lasso.polygon().len(), 2);
    }

    #[test]
    fn two_vertex_path_selects_nothing() {
        let mut lasso = LassoCapture::default();
        lasso.pointer_down(ScreenPos::new(0.0, 0.0), false);
        lasso.pointer_move(ScreenPos::new(300.0, 300.0));
        let ended = lasso.pointer_up(&pts()).unwrap();
        assert_eq!(ended.selection, Selection::none(3));
    }

    #[test]
    fn press_on_point_does_not_start() {
        let mut lasso = LassoCapture::default();
        assert!(!lasso.pointer_down(ScreenPos::new(10.0, 10.0), true));
        lasso.pointer_move(ScreenPos::new(50.0, 50.0));
        assert!(lasso.pointer_up(&pts()).is_none());
    }

    #[test]
    fn new_press_restarts_polygon() {
        let mut lasso = LassoCapture::default();
        lasso.pointer_down(ScreenPos::new(0.0, 0.0), false);
        lasso.pointer_move(ScreenPos::new(50.0, 0.0));
        lasso.pointer_down(ScreenPos::new(500.0, 500.0), false);
        assert_eq!(lasso.polygon(), &[ScreenPos::new(500.0, 500.0)]);
    }

    #[test]
    fn each_cycle_yields_exactly_one_event() {
        let mut lasso = LassoCapture::default();
        lasso.pointer_down(ScreenPos::new(0.0, 0.0), false);
        assert!(lasso.pointer_up(&pts()).is_some());
        assert!(lasso.pointer_up(&pts()).is_none());
    }
}
