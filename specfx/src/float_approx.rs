//! Floating point fast approximations used for per-bin polar math when the
//! `fast-trig` feature is enabled.
//!
//! Benchmark me!

#[cfg(any(test, doc, feature = "fast-trig"))]
mod detail {
    use crate::Float;

    /// Reduce x to the interval [-pi/2, pi/2], returning the reduced angle and
    /// the sign that must be applied to the cosine of the reduced angle.
    fn reduce_quadrant<T: Float>(x: T) -> (T, T) {
        let x = crate::util::wrap_phase(x);
        if x > T::FRAC_PI_2 {
            (T::PI - x, -T::ONE)
        } else if x < -T::FRAC_PI_2 {
            (-T::PI - x, -T::ONE)
        } else {
            (x, T::ONE)
        }
    }

    /// Approximate sin(x) on [-pi/2, pi/2] using a 9th order taylor series
    fn sin_taylor<T: Float>(x: T) -> T {
        let x2 = x * x;
        // sin(x) = x - x^3/3! + x^5/5! - x^7/7! + x^9/9!
        //        = x { 1 - x^2/6 [ 1 - x^2/20 ( 1 - x^2/42 ( 1 - x^2/72 ) ) ] }
        let d_nested = T::ONE - x2 / T::from_u16(72);
        let c_nested = T::ONE - (x2 / T::from_u16(42)) * d_nested;
        let b_nested = T::ONE - (x2 / T::from_u16(20)) * c_nested;
        let a_nested = T::ONE - (x2 / T::SIX) * b_nested;
        x * a_nested
    }

    /// Approximate cos(x) on [-pi/2, pi/2] using a 10th order taylor series
    fn cos_taylor<T: Float>(x: T) -> T {
        let x2 = x * x;
        let d_nested = T::ONE - x2 / T::from_u16(90);
        let c_nested = T::ONE - (x2 / T::from_u16(56)) * d_nested;
        let b_nested = T::ONE - (x2 / T::from_u16(30)) * c_nested;
        let a_nested = T::ONE - (x2 / T::from_u16(12)) * b_nested;
        T::ONE - (x2 / T::TWO) * a_nested
    }

    /// Approximate sin(x) for any finite x
    pub fn sin_approx<T: Float>(x: T) -> T {
        //small angle approximation.  Faster and removes 0 as an edge case
        if x.abs() < (T::ONE / T::from_u16(0x100)) {
            return x;
        }
        let (reduced, _) = reduce_quadrant(x);
        sin_taylor(reduced)
    }

    /// Approximate cos(x) for any finite x
    pub fn cos_approx<T: Float>(x: T) -> T {
        let (reduced, sign) = reduce_quadrant(x);
        sign * cos_taylor(reduced)
    }

    /// Approximate atan(z) for z in [0, 1] with a minimax polynomial
    /// (max error around 1e-5 rad)
    fn atan_unit<T: Float>(z: T) -> T {
        const COEFFS: [f32; 6] = [
            -0.011_721_2,
            0.052_653_32,
            -0.116_432_87,
            0.193_543_46,
            -0.332_623_47,
            0.999_977_26,
        ];
        let z2 = z * z;
        let poly = COEFFS
            .iter()
            .fold(T::ZERO, |acc, c| acc * z2 + T::from_f32(*c));
        z * poly
    }

    /// Approximate the four-quadrant arctangent of y/x.  Returns 0 when both
    /// arguments are 0.
    pub fn atan2_approx<T: Float>(y: T, x: T) -> T {
        let ax = x.abs();
        let ay = y.abs();
        if ax == T::ZERO && ay == T::ZERO {
            return T::ZERO;
        }
        let mut angle = if ay <= ax {
            atan_unit(ay / ax)
        } else {
            T::FRAC_PI_2 - atan_unit(ax / ay)
        };
        if x < T::ZERO {
            angle = T::PI - angle;
        }
        if y < T::ZERO {
            -angle
        } else {
            angle
        }
    }
}

#[cfg(any(test, doc, feature = "fast-trig"))]
pub use detail::*;

#[cfg(test)]
mod tests {
    use super::*;

    fn rms_error(approx: impl Fn(f32) -> f32, exact: impl Fn(f32) -> f32, span: f32) -> f32 {
        let numsteps = 2000;
        let mut error = 0.0;
        for i in 0..=numsteps {
            let x = (2.0 * span * i as f32) / (numsteps as f32) - span;
            let this_error = exact(x) - approx(x);
            error += this_error * this_error;
        }
        (error / numsteps as f32).sqrt()
    }

    #[test]
    fn sin_approx_rms_error() {
        let error = rms_error(sin_approx, f32::sin, 4.0 * core::f32::consts::PI);
        assert!(error < 1e-4); //RMS error on interval (-4pi, 4pi)
    }
    #[test]
    fn cos_approx_rms_error() {
        let error = rms_error(cos_approx, f32::cos, 4.0 * core::f32::consts::PI);
        assert!(error < 1e-4);
    }
    #[test]
    fn atan2_approx_error() {
        let numsteps = 720;
        let mut worst = 0.0f32;
        for i in 0..numsteps {
            let theta = (core::f32::consts::TAU * i as f32) / (numsteps as f32);
            let (y, x) = (3.0 * theta.sin(), 3.0 * theta.cos());
            let diff = crate::util::wrap_phase(atan2_approx(y, x) - y.atan2(x));
            worst = worst.max(diff.abs());
        }
        assert!(worst < 1e-4);
        assert_eq!(atan2_approx(0.0f32, 0.0f32), 0.0);
    }
}
