//! Screen-space geometry used by lasso hit testing.

use crate::data::selection::Selection;

/// Screen (pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPos {
    pub x: f32,
    pub y: f32,
}

impl ScreenPos {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other` in pixels.
    pub fn distance(self, other: ScreenPos) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<egui::Pos2> for ScreenPos {
    fn from(p: egui::Pos2) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<ScreenPos> for egui::Pos2 {
    fn from(p: ScreenPos) -> Self {
        egui::pos2(p.x, p.y)
    }
}

/// Polygons whose absolute area is below this are treated as having no area.
const MIN_POLYGON_AREA: f64 = 1e-9;

/// Absolute area of the implicitly closed polygon (shoelace formula).
pub fn polygon_area(polygon: &[ScreenPos]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0f64;
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        twice_area += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
    }
    (twice_area * 0.5).abs()
}

/// Odd-crossing test: is `point` inside the implicitly closed `polygon`?
///
/// A horizontal ray is cast from `point` toward +x. An edge is counted only
/// when exactly one of its endpoints has `y >= point.y`, so a vertex lying on
/// the ray is never counted twice and horizontal edges are never counted.
/// Polygons with fewer than three vertices or without area contain nothing.
pub fn point_in_polygon(point: ScreenPos, polygon: &[ScreenPos]) -> bool {
    if polygon.len() < 3 || polygon_area(polygon) < MIN_POLYGON_AREA {
        return false;
    }
    let (px, py) = (point.x as f64, point.y as f64);
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (ax, ay) = (polygon[i].x as f64, polygon[i].y as f64);
        let (bx, by) = (polygon[j].x as f64, polygon[j].y as f64);
        if (ay >= py) != (by >= py) {
            let x_cross = ax + (py - ay) * (bx - ax) / (by - ay);
            if px < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Hit-test every position against `polygon`, producing a selection aligned by index.
pub fn select_points(positions: &[ScreenPos], polygon: &[ScreenPos]) -> Selection {
    if polygon.len() < 3 {
        return Selection::none(positions.len());
    }
    Selection::from_members(
        positions
            .iter()
            .map(|p| point_in_polygon(*p, polygon))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn square() -> Vec<ScreenPos> {
        vec![
            ScreenPos::new(0.0, 0.0),
            ScreenPos::new(10.0, 0.0),
            ScreenPos::new(10.0, 10.0),
            ScreenPos::new(0.0, 10.0),
        ]
    }

    /// Signed side of `p` relative to the directed edge a→b (>0 is left).
    fn side(a: ScreenPos, b: ScreenPos, p: ScreenPos) -> f64 {
        (b.x as f64 - a.x as f64) * (p.y as f64 - a.y as f64)
            - (b.y as f64 - a.y as f64) * (p.x as f64 - a.x as f64)
    }

    #[test]
    fn inside_and_outside_square() {
        let sq = square();
        assert!(point_in_polygon(ScreenPos::new(5.0, 5.0), &sq));
        assert!(!point_in_polygon(ScreenPos::new(15.0, 5.0), &sq));
        assert!(!point_in_polygon(ScreenPos::new(-1.0, 5.0), &sq));
        assert!(!point_in_polygon(ScreenPos::new(5.0, 11.0), &sq));
    }

    #[test]
    fn winding_order_does_not_matter() {
        let mut sq = square();
        sq.reverse();
        assert!(point_in_polygon(ScreenPos::new(2.0, 8.0), &sq));
        assert!(!point_in_polygon(ScreenPos::new(12.0, 8.0), &sq));
    }

    #[test]
    fn ray_through_vertex_is_counted_once() {
        // Diamond whose left and right vertices sit exactly on y = 5.
        let diamond = vec![
            ScreenPos::new(5.0, 0.0),
            ScreenPos::new(10.0, 5.0),
            ScreenPos::new(5.0, 10.0),
            ScreenPos::new(0.0, 5.0),
        ];
        assert!(point_in_polygon(ScreenPos::new(5.0, 5.0), &diamond));
        assert!(!point_in_polygon(ScreenPos::new(-3.0, 5.0), &diamond));
        assert!(!point_in_polygon(ScreenPos::new(12.0, 5.0), &diamond));
    }

    #[test]
    fn concave_polygon_notch_is_outside() {
        // U shape opening upward.
        let u = vec![
            ScreenPos::new(0.0, 0.0),
            ScreenPos::new(9.0, 0.0),
            ScreenPos::new(9.0, 9.0),
            ScreenPos::new(6.0, 9.0),
            ScreenPos::new(6.0, 3.0),
            ScreenPos::new(3.0, 3.0),
            ScreenPos::new(3.0, 9.0),
            ScreenPos::new(0.0, 9.0),
        ];
        assert!(point_in_polygon(ScreenPos::new(1.5, 6.0), &u));
        assert!(point_in_polygon(ScreenPos::new(7.5, 6.0), &u));
        assert!(!point_in_polygon(ScreenPos::new(4.5, 6.0), &u));
        assert!(point_in_polygon(ScreenPos::new(4.5, 1.5), &u));
    }

    #[test]
    fn degenerate_polygons_contain_nothing() {
        let p = ScreenPos::new(1.0, 1.0);
        assert!(!point_in_polygon(p, &[]));
        assert!(!point_in_polygon(p, &[ScreenPos::new(1.0, 1.0)]));
        assert!(!point_in_polygon(
            p,
            &[ScreenPos::new(0.0, 0.0), ScreenPos::new(2.0, 2.0)]
        ));
        // Collinear vertices enclose no area.
        let line = [
            ScreenPos::new(0.0, 0.0),
            ScreenPos::new(1.0, 1.0),
            ScreenPos::new(2.0, 2.0),
        ];
        assert_eq!(polygon_area(&line), 0.0);
        assert!(!point_in_polygon(p, &line));
    }

    #[test]
    fn convex_polygons_agree_with_half_plane_test() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            // Random convex polygon: sorted angles on an ellipse.
            let n = rng.random_range(3..12);
            let cx = rng.random_range(-50.0f32..50.0);
            let cy = rng.random_range(-50.0f32..50.0);
            let rx = rng.random_range(5.0f32..40.0);
            let ry = rng.random_range(5.0f32..40.0);
            let mut angles: Vec<f32> = (0..n)
                .map(|_| rng.random_range(0.0f32..std::f32::consts::TAU))
                .collect();
            angles.sort_by(|a, b| a.total_cmp(b));
            angles.dedup_by(|a, b| (*a - *b).abs() < 1e-3);
            let poly: Vec<ScreenPos> = angles
                .iter()
                .map(|t| ScreenPos::new(cx + rx * t.cos(), cy + ry * t.sin()))
                .collect();
            if polygon_area(&poly) < 1.0 {
                continue;
            }

            for _ in 0..100 {
                let p = ScreenPos::new(
                    rng.random_range(cx - 50.0..cx + 50.0),
                    rng.random_range(cy - 50.0..cy + 50.0),
                );
                let sides: Vec<f64> = (0..poly.len())
                    .map(|i| side(poly[i], poly[(i + 1) % poly.len()], p))
                    .collect();
                // Skip points too close to an edge for a float-exact verdict.
                if sides.iter().any(|s| s.abs() < 1e-2) {
                    continue;
                }
                let reference = sides.iter().all(|s| *s > 0.0) || sides.iter().all(|s| *s < 0.0);
                assert_eq!(point_in_polygon(p, &poly), reference, "point {p:?} polygon {poly:?}");
            }
        }
    }

    #[test]
    fn select_points_aligns_by_index() {
        let positions = [
            ScreenPos::new(5.0, 5.0),
            ScreenPos::new(50.0, 5.0),
            ScreenPos::new(1.0, 9.0),
        ];
        let sel = select_points(&positions, &square());
        assert_eq!(sel.members(), &[true, false, true]);
    }
}
