//! Scalar easing curves for tile and panel transitions.

use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    OutCubic,
    /// Overshoots the target slightly, then settles.
    OutBack,
    OutElastic,
}

impl Easing {
    /// Maps normalized time `t` in `[0, 1]` to progress. Values outside the
    /// range are clamped; the result may exceed `1.0` mid-way for the
    /// overshooting curves.
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 1.0 };
        match self {
            Easing::Linear => t,
            Easing::OutCubic => ease_out_cubic(t),
            Easing::OutBack => ease_out_back(t),
            Easing::OutElastic => ease_out_elastic(t),
        }
    }
}

pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

pub fn ease_out_back(t: f32) -> f32 {
    if t >= 1.0 {
        return 1.0;
    }
    let c1 = 1.70158;
    let c3 = c1 + 1.0;
    1.0 + c3 * (t - 1.0).powi(3) + c1 * (t - 1.0).powi(2)
}

pub fn ease_out_elastic(t: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let c4 = (2.0 * PI) / 3.0;
    (2.0_f32).powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curves_hit_both_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::OutCubic,
            Easing::OutBack,
            Easing::OutElastic,
        ] {
            assert!(easing.apply(0.0).abs() < 1e-5, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-5, "{easing:?} at 1");
        }
    }

    #[test]
    fn back_overshoots_before_settling() {
        let peak = (1..100)
            .map(|i| Easing::OutBack.apply(i as f32 / 100.0))
            .fold(f32::MIN, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn out_of_range_time_is_clamped() {
        assert_eq!(Easing::OutCubic.apply(-3.0), 0.0);
        assert_eq!(Easing::OutCubic.apply(7.0), 1.0);
        assert_eq!(Easing::Linear.apply(f32::NAN), 1.0);
    }
}
