//! Append-only collection of the active views.
//!
//! The registry is the only place updates fan out: colors go to every
//! [`ViewKind::PointSet`] view and heights to every [`ViewKind::Aggregate`]
//! view. Concrete views are found again by type.

use egui::Color32;

use super::view_trait::{View, ViewKind, ViewUpdate};

#[derive(Default)]
pub struct ViewRegistry {
    views: Vec<Box<dyn View>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view for the rest of the session.
    pub fn push(&mut self, view: Box<dyn View>) {
        log::debug!("registering view `{}`", view.title());
        self.views.push(view);
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Send `colors` to every point view. Returns how many views were updated.
    pub fn recolor(&mut self, colors: &[Color32], now: f64) -> usize {
        self.broadcast(ViewKind::PointSet, ViewUpdate::Colors(colors), now)
    }

    /// Send `heights` to every aggregate view. Returns how many views were updated.
    pub fn update_aggregates(&mut self, heights: &[f64], now: f64) -> usize {
        self.broadcast(ViewKind::Aggregate, ViewUpdate::Heights(heights), now)
    }

    fn broadcast(&mut self, kind: ViewKind, update: ViewUpdate<'_>, now: f64) -> usize {
        let mut n = 0;
        for view in self.views.iter_mut().filter(|v| v.kind() == kind) {
            view.update(update, now);
            n += 1;
        }
        n
    }

    pub fn get<T: View>(&self) -> Option<&T> {
        self.views.iter().find_map(|v| v.downcast_ref::<T>())
    }

    pub fn get_mut<T: View>(&mut self) -> Option<&mut T> {
        self.views.iter_mut().find_map(|v| v.downcast_mut::<T>())
    }

    pub fn contains<T: View>(&self) -> bool {
        self.get::<T>().is_some()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn View>> {
        self.views.iter_mut()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.views.iter().map(|v| v.title()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::bar_ui::BarView;

    #[test]
    fn heights_reach_only_aggregate_views() {
        let mut reg = ViewRegistry::new();
        reg.push(Box::new(BarView::new("Means", vec!["a".into()], 0.0)));
        assert_eq!(reg.recolor(&[Color32::RED], 0.0), 0);
        assert_eq!(reg.update_aggregates(&[0.75], 0.0), 1);
        assert_eq!(reg.get::<BarView>().unwrap().heights(), &[0.75]);
        assert_eq!(reg.titles(), vec!["Means"]);
    }

    #[test]
    fn typed_lookup_misses_absent_views() {
        let reg = ViewRegistry::new();
        assert!(reg.is_empty());
        assert!(!reg.contains::<BarView>());
    }
}
