use num_traits::Float as NumTraitsFloat;
use serde::{Deserialize, Serialize};

/// Types must implement this trait to instantiate any of the generic spectral
/// processors in this crate.  Implementations are provided for `f32` and `f64`.
pub trait Float:
    NumTraitsFloat
    + From<u16>
    + From<f32>
    + Default
    + Copy
    + core::fmt::Debug
    + Serialize
    + for<'a> Deserialize<'a>
{
    /// 0
    const ZERO: Self;
    /// 1
    const ONE: Self;
    /// 2
    const TWO: Self;
    /// 6
    const SIX: Self;
    /// 1/2
    const ONE_HALF: Self;
    /// 0.2
    const POINT_TWO: Self;
    /// pi / 2
    const FRAC_PI_2: Self;
    /// pi
    const PI: Self;
    /// 2*pi
    const TAU: Self;
    /// Added to (or compared against) the denominator of every per-bin ratio
    const DIV_GUARD: Self;
    /// Bin magnitudes below this value are treated as silence
    const MIN_MAG: Self;
    /// Creates a value of this type from a u16.  Functionality provided by
    /// the trait (uses the `From<u16>` implementation)
    fn from_u16(x: u16) -> Self {
        <Self as From<u16>>::from(x)
    }
    /// Creates a value of this type from a f32
    fn from_f32(x: f32) -> Self {
        <Self as From<f32>>::from(x)
    }
    /// Creates a value of this type from a bin or sample index
    fn from_usize(x: usize) -> Self {
        Self::from_f32(x as f32)
    }
    /// Truncates towards zero and converts to an index.  Negative and
    /// non-finite values map to 0.
    fn to_index(self) -> usize {
        self.to_usize().unwrap_or(0)
    }
    /// Clamp self to the closed interval `[lo, hi]`
    fn clamped(self, lo: Self, hi: Self) -> Self {
        self.max(lo).min(hi)
    }
    /// Returns the sine of self
    fn fsin(self) -> Self {
        #[cfg(feature = "fast-trig")]
        let ret = crate::float_approx::sin_approx(self);
        #[cfg(not(feature = "fast-trig"))]
        let ret = <Self as NumTraitsFloat>::sin(self);
        ret
    }
    /// Returns the cosine of self
    fn fcos(self) -> Self {
        #[cfg(feature = "fast-trig")]
        let ret = crate::float_approx::cos_approx(self);
        #[cfg(not(feature = "fast-trig"))]
        let ret = <Self as NumTraitsFloat>::cos(self);
        ret
    }
    /// Four quadrant arctangent of self (y) and x, in radians
    fn fatan2(self, x: Self) -> Self {
        #[cfg(feature = "fast-trig")]
        let ret = crate::float_approx::atan2_approx(self, x);
        #[cfg(not(feature = "fast-trig"))]
        let ret = <Self as NumTraitsFloat>::atan2(self, x);
        ret
    }
    /// Convert to a f32
    fn as_f32(self) -> f32;
}

impl Float for f32 {
    const ZERO: f32 = 0.0f32;
    const ONE: f32 = 1.0f32;
    const TWO: f32 = 2.0f32;
    const SIX: f32 = 6.0f32;
    const ONE_HALF: f32 = 0.5f32;
    const POINT_TWO: f32 = 0.2f32;
    const FRAC_PI_2: f32 = core::f32::consts::FRAC_PI_2;
    const PI: f32 = core::f32::consts::PI;
    const TAU: f32 = core::f32::consts::TAU;
    const DIV_GUARD: f32 = 1.0e-9f32;
    const MIN_MAG: f32 = 1.0e-6f32;
    fn as_f32(self) -> f32 {
        self
    }
}

impl Float for f64 {
    const ZERO: f64 = 0.0f64;
    const ONE: f64 = 1.0f64;
    const TWO: f64 = 2.0f64;
    const SIX: f64 = 6.0f64;
    const ONE_HALF: f64 = 0.5f64;
    const POINT_TWO: f64 = 0.2f64;
    const FRAC_PI_2: f64 = core::f64::consts::FRAC_PI_2;
    const PI: f64 = core::f64::consts::PI;
    const TAU: f64 = core::f64::consts::TAU;
    const DIV_GUARD: f64 = 1.0e-9f64;
    const MIN_MAG: f64 = 1.0e-6f64;
    fn as_f32(self) -> f32 {
        self as f32
    }
}
