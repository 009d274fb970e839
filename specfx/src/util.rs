//! Various utility functions shared by the spectral processors

use crate::Float;

/// Wrap a phase (in radians) into the interval `(-pi, pi]`
pub fn wrap_phase<T: Float>(x: T) -> T {
    let wrapped = x - T::TAU * ((x + T::PI) / T::TAU).floor();
    if wrapped <= -T::PI {
        wrapped + T::TAU
    } else {
        wrapped
    }
}

/// The signed shortest angular distance from `from` to `to`, in `(-pi, pi]`
pub fn phase_delta<T: Float>(from: T, to: T) -> T {
    wrap_phase(to - from)
}

/// Linear interpolation between `a` (at `frac == 0`) and `b` (at `frac == 1`)
pub fn lerp<T: Float>(a: T, b: T, frac: T) -> T {
    a + (b - a) * frac
}

/// Rational soft clipper `x / (1 + |x|)`.  Output is always in `(-1, 1)`.
pub fn soft_clip<T: Float>(x: T) -> T {
    x / (T::ONE + x.abs())
}

/// Clamp `x` to `[-1, 1]`
pub fn hard_clip<T: Float>(x: T) -> T {
    x.clamped(-T::ONE, T::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;

    #[test]
    fn wrap_phase_interval() {
        assert!((wrap_phase(3.0 * PI) - PI).abs() < 1e-5);
        assert!((wrap_phase(-PI) - PI).abs() < 1e-6);
        assert!((wrap_phase(0.5f32) - 0.5).abs() < 1e-7);
        assert!((wrap_phase(-0.5f32 - 4.0 * PI) + 0.5).abs() < 1e-5);
    }

    #[test]
    fn phase_delta_takes_short_way() {
        let delta = phase_delta(PI - 0.1, -PI + 0.1);
        assert!((delta - 0.2).abs() < 1e-5);
    }

    #[test]
    fn clippers() {
        assert_eq!(soft_clip(0.0f32), 0.0);
        assert!((soft_clip(1.0f32) - 0.5).abs() < 1e-7);
        assert!(soft_clip(1.0e6f32) < 1.0);
        assert_eq!(hard_clip(-3.0f32), -1.0);
        assert_eq!(hard_clip(0.25f32), 0.25);
    }
}
