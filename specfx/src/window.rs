//! Analysis/synthesis window tables of length [FFT_SIZE].
//!
//! All shapes except Kaiser are periodic (defined over `i / N`), which gives
//! exact overlap-add behavior at power-of-two hops.

use crate::{Float, FFT_SIZE};
use serde::{Deserialize, Serialize};

/// The largest Kaiser beta accepted; larger values are clamped
pub const KAISER_BETA_MAX: f32 = 12.0;

/// A window table, as consumed by the spectral channels
pub type WindowTable<T> = [T; FFT_SIZE];

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
/// The shape of a window table
pub enum WindowShape {
    /// Square root of the periodic Hann window.  Applied at both analysis and
    /// synthesis, the product is a Hann window.
    #[default]
    SqrtHann,
    /// Periodic Hann window
    Hann,
    /// Four term Blackman-Harris window
    BlackmanHarris,
    /// Half-period sine
    Sine,
    /// Rectangular (all ones)
    Rect,
    /// Symmetric Kaiser window with adjustable beta
    Kaiser,
}

impl Serialize for WindowShape {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(*self as u8)
    }
}

struct WindowShapeVisitor;
impl<'de> serde::de::Visitor<'de> for WindowShapeVisitor {
    type Value = u8;
    fn visit_u8<E>(self, value: u8) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(value)
    }
    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        u8::try_from(value).map_err(|_| E::custom("WindowShape out of range"))
    }
    fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
        formatter.write_str("An integer corresponding to a valid WindowShape")
    }
}

impl<'de> Deserialize<'de> for WindowShape {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let as_int = deserializer.deserialize_u8(WindowShapeVisitor {})?;
        Ok(WindowShape::new_from_u8(as_int).unwrap_or_default())
    }
}

impl WindowShape {
    const ELEM: [WindowShape; 6] = [
        Self::SqrtHann,
        Self::Hann,
        Self::BlackmanHarris,
        Self::Sine,
        Self::Rect,
        Self::Kaiser,
    ];
    /// Returns a slice to all of the possible WindowShapes
    pub const fn shapes() -> &'static [WindowShape] {
        &Self::ELEM
    }
    /// Provides the name of the window (long-format)
    pub const fn to_str(&self) -> &'static str {
        [
            "Sqrt Hann",
            "Hann",
            "Blackman-Harris",
            "Sine",
            "Rectangular",
            "Kaiser",
        ][*self as usize]
    }
    /// Provides the three letter label used on the hardware display
    pub const fn to_str_short(&self) -> &'static str {
        ["SQH", "HAN", "BHS", "SIN", "REC", "KAI"][*self as usize]
    }
    /// Try to create a WindowShape from a u8
    pub const fn new_from_u8(value: u8) -> Option<Self> {
        if (value as usize) < Self::ELEM.len() {
            Some(Self::ELEM[value as usize])
        } else {
            None
        }
    }
    /// Step through the shapes by `inc` positions, wrapping in both directions
    pub fn cycle(self, inc: i32) -> Self {
        let count = Self::ELEM.len() as i32;
        Self::ELEM[(self as i32 + inc).rem_euclid(count) as usize]
    }
    /// Fill `out` with this window.  `kaiser_beta` is only used by
    /// [WindowShape::Kaiser] and is clamped to `[0, KAISER_BETA_MAX]`.
    pub fn fill<T: Float>(self, kaiser_beta: T, out: &mut WindowTable<T>) {
        if self == Self::Kaiser {
            fill_kaiser(kaiser_beta, out);
            return;
        }
        let size = T::from_usize(FFT_SIZE);
        let a = [0.35875f32, 0.48829f32, 0.14128f32, 0.01168f32].map(T::from_f32);
        for (i, w) in out.iter_mut().enumerate() {
            let phase = T::from_usize(i) / size;
            let hann = T::ONE_HALF - T::ONE_HALF * (T::TAU * phase).cos();
            *w = match self {
                Self::SqrtHann => hann.max(T::ZERO).sqrt(),
                Self::Hann => hann,
                Self::BlackmanHarris => {
                    a[0] - a[1] * (T::TAU * phase).cos()
                        + a[2] * (T::TWO * T::TAU * phase).cos()
                        - a[3] * (T::from_u16(3) * T::TAU * phase).cos()
                }
                Self::Sine => (T::PI * phase).sin(),
                Self::Rect | Self::Kaiser => T::ONE,
            };
        }
    }
    /// Build a new window table
    pub fn build<T: Float>(self, kaiser_beta: T) -> WindowTable<T> {
        let mut ret = [T::ZERO; FFT_SIZE];
        self.fill(kaiser_beta, &mut ret);
        ret
    }
}

impl From<WindowShape> for &'static str {
    fn from(value: WindowShape) -> Self {
        value.to_str()
    }
}

impl TryFrom<u8> for WindowShape {
    type Error = &'static str;
    fn try_from(value: u8) -> Result<Self, &'static str> {
        Self::new_from_u8(value).ok_or("Conversion of u8 to WindowShape Overflowed")
    }
}

/// Polynomial approximation of the zeroth order modified Bessel function of
/// the first kind (Abramowitz and Stegun 9.8.1 and 9.8.2)
pub fn bessel_i0<T: Float>(x: T) -> T {
    const SMALL: [f32; 6] = [
        0.004_581_3,
        0.036_076_8,
        0.265_973_2,
        1.206_749_2,
        3.089_942_4,
        3.515_622_9,
    ];
    const LARGE: [f32; 9] = [
        0.003_923_77,
        -0.016_476_33,
        0.026_355_37,
        -0.020_577_06,
        0.009_162_81,
        -0.001_575_65,
        0.002_253_19,
        0.013_285_92,
        0.398_942_28,
    ];
    let breakpoint = T::from_f32(3.75);
    let ax = x.abs();
    if ax < breakpoint {
        let y = x / breakpoint;
        let y2 = y * y;
        let poly = SMALL
            .iter()
            .fold(T::ZERO, |acc, c| (acc + T::from_f32(*c)) * y2);
        T::ONE + poly
    } else {
        let y = breakpoint / ax;
        let poly = LARGE
            .iter()
            .fold(T::ZERO, |acc, c| acc * y + T::from_f32(*c));
        (ax.exp() / ax.sqrt()) * poly
    }
}

fn fill_kaiser<T: Float>(beta: T, out: &mut WindowTable<T>) {
    let beta = beta.clamped(T::ZERO, T::from_f32(KAISER_BETA_MAX));
    let denom = bessel_i0(beta);
    let span = T::from_usize(FFT_SIZE - 1);
    for (i, w) in out.iter_mut().enumerate() {
        let x = (T::TWO * T::from_usize(i)) / span - T::ONE;
        let t = (T::ONE - x * x).max(T::ZERO).sqrt();
        *w = bessel_i0(beta * t) / denom;
    }
}
