use downcast_rs::{impl_downcast, Downcast};
use egui::{Color32, Ui};

use crate::data::lasso::SelectionEnded;

/// Which updates a view accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// One mark per data point, recolored on selection.
    PointSet,
    /// One mark per feature, resized on new aggregates.
    Aggregate,
}

/// The single mutation a view supports.
#[derive(Debug, Clone, Copy)]
pub enum ViewUpdate<'a> {
    Colors(&'a [Color32]),
    Heights(&'a [f64]),
}

pub trait View: Downcast {
    fn title(&self) -> &str;
    fn kind(&self) -> ViewKind;

    /// Apply `update` starting an eased transition at time `now` (seconds).
    /// Updates that do not match [`kind`](Self::kind) are ignored.
    fn update(&mut self, update: ViewUpdate<'_>, now: f64);

    /// Draw the view. Point views return the outcome of a finished lasso gesture.
    fn show(&mut self, ui: &mut Ui) -> Option<SelectionEnded>;
}
impl_downcast!(View);
