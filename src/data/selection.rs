//! Selection membership and the color rule that renders it.

use egui::Color32;

/// Boolean membership vector aligned by point index.
///
/// An all-false selection means "nothing selected". Whether a selection has
/// been computed at all is tracked by the owner (`Option<Selection>`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    members: Vec<bool>,
}

impl Selection {
    /// All-false selection over `len` points.
    pub fn none(len: usize) -> Self {
        Self {
            members: vec![false; len],
        }
    }

    /// All-true selection over `len` points.
    pub fn all(len: usize) -> Self {
        Self {
            members: vec![true; len],
        }
    }

    pub fn from_members(members: Vec<bool>) -> Self {
        Self { members }
    }

    /// Selection of `len` points with exactly `indices` set. Out-of-range indices are ignored.
    pub fn from_indices(len: usize, indices: &[usize]) -> Self {
        let mut members = vec![false; len];
        for &i in indices {
            if let Some(m) = members.get_mut(i) {
                *m = true;
            }
        }
        Self { members }
    }

    pub fn members(&self) -> &[bool] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// `true` when no point is selected (including the zero-length selection).
    pub fn is_empty(&self) -> bool {
        !self.members.iter().any(|&m| m)
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.members.get(index).copied().unwrap_or(false)
    }

    /// Number of selected points.
    pub fn count(&self) -> usize {
        self.members.iter().filter(|&&m| m).count()
    }

    /// Indices of the selected points in ascending order.
    pub fn indices(&self) -> Vec<usize> {
        self.members
            .iter()
            .enumerate()
            .filter_map(|(i, &m)| m.then_some(i))
            .collect()
    }
}

/// Render colors for `selection`.
///
/// An empty or all-false selection restores `base` unchanged. Otherwise a
/// selected point keeps its base color and every other point gets `unselected`.
/// A full selection therefore renders exactly like `base`.
pub fn derive_colors(base: &[Color32], selection: &Selection, unselected: Color32) -> Vec<Color32> {
    if selection.is_empty() {
        return base.to_vec();
    }
    base.iter()
        .enumerate()
        .map(|(i, &c)| if selection.is_selected(i) { c } else { unselected })
        .collect()
}
