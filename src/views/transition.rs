//! Timed interpolation between two value vectors.
//!
//! Views keep their visual state in a [`Transition`] so a recolor or a new set
//! of bar heights eases in over a short duration instead of jumping.

use egui::Color32;

/// Default transition duration in seconds.
pub const DEFAULT_TRANSITION_SECS: f64 = 0.3;

/// Values that can be blended.
pub trait Lerp: Clone {
    fn lerp(&self, to: &Self, t: f32) -> Self;
}

impl Lerp for f64 {
    fn lerp(&self, to: &Self, t: f32) -> Self {
        self + (to - self) * t as f64
    }
}

/// Blends the premultiplied channels directly.
impl Lerp for Color32 {
    fn lerp(&self, to: &Self, t: f32) -> Self {
        self.lerp_to_gamma(*to, t)
    }
}

/// Cubic ease-in-out on `t` in `[0, 1]`.
fn ease(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

#[derive(Debug, Clone)]
pub struct Transition<T: Lerp> {
    from: Vec<T>,
    to: Vec<T>,
    start: f64,
    duration: f64,
}

impl<T: Lerp> Transition<T> {
    /// Start at rest on `values`.
    pub fn new(values: Vec<T>, duration: f64) -> Self {
        Self {
            from: values.clone(),
            to: values,
            start: f64::NEG_INFINITY,
            duration: duration.max(0.0),
        }
    }

    /// Begin easing from wherever the values are at `now` toward `target`.
    ///
    /// A target of a different length snaps immediately.
    pub fn set_target(&mut self, target: Vec<T>, now: f64) {
        self.from = if target.len() == self.to.len() {
            self.current(now)
        } else {
            target.clone()
        };
        self.to = target;
        self.start = now;
    }

    /// Final values of the running (or finished) transition.
    pub fn target(&self) -> &[T] {
        &self.to
    }

    pub fn is_animating(&self, now: f64) -> bool {
        self.duration > 0.0 && now - self.start < self.duration
    }

    /// Interpolated values at time `now` (seconds, same clock as `set_target`).
    pub fn current(&self, now: f64) -> Vec<T> {
        if !self.is_animating(now) {
            return self.to.clone();
        }
        let t = ease((((now - self.start) / self.duration) as f32).clamp(0.0, 1.0));
        self.from
            .iter()
            .zip(&self.to)
            .map(|(a, b)| a.lerp(b, t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eases_between_endpoints() {
        let mut tr = Transition::new(vec![0.0_f64, 1.0], 0.3);
        tr.set_target(vec![1.0, 0.0], 10.0);
        assert!(tr.is_animating(10.1));
        assert_eq!(tr.current(10.0), vec![0.0, 1.0]);
        let mid = tr.current(10.15);
        assert!((mid[0] - 0.5).abs() < 1e-6);
        assert_eq!(tr.current(10.3), vec![1.0, 0.0]);
        assert!(!tr.is_animating(10.3));
    }

    #[test]
    fn retarget_starts_from_current_value() {
        let mut tr = Transition::new(vec![0.0_f64], 1.0);
        tr.set_target(vec![1.0], 0.0);
        tr.set_target(vec![0.0], 0.5);
        let v = tr.current(0.5)[0];
        assert!((v - 0.5).abs() < 1e-6);
    }

    #[test]
    fn length_change_snaps() {
        let mut tr = Transition::new(Vec::<f64>::new(), 0.3);
        tr.set_target(vec![0.4, 0.6], 0.0);
        assert_eq!(tr.current(0.01), vec![0.4, 0.6]);
    }

    #[test]
    fn translucent_colors_blend_without_darkening() {
        let red = Color32::from_rgba_premultiplied(100, 0, 0, 128);
        let mid = red.lerp(&Color32::TRANSPARENT, 0.5);
        assert!(mid.r().abs_diff(50) <= 1);
        assert!(mid.a().abs_diff(64) <= 1);
        assert_eq!(red.lerp(&red, 0.3), red);
    }

    #[test]
    fn zero_duration_is_immediate() {
        let mut tr = Transition::new(vec![Color32::BLACK], 0.0);
        tr.set_target(vec![Color32::WHITE], 5.0);
        assert!(!tr.is_animating(5.0));
        assert_eq!(tr.target(), &[Color32::WHITE]);
        assert_eq!(tr.current(5.0), vec![Color32::WHITE]);
    }
}
