//! Spectral effect processors.
//!
//! Every effect is a plain function `fn(&mut SpectralFrame<T>, &EffectParams<T>)`
//! that mutates the frame in place and may keep state in the frame's
//! persistent buffers.  [Effect] selects one of them through a table indexed
//! by the enum discriminant.

use crate::frame::SpectralFrame;
use crate::util::{lerp, phase_delta};
use crate::{Float, NUM_BINS};
use serde::{Deserialize, Serialize};

mod comb;
mod fold;
mod freeze;
mod gate;
mod phase;
mod shift;
mod smear;
mod tilt;

/// The largest boost an effect may apply to a bin relative to its input
pub const MAX_SCALE: f32 = 3.0;

/// Signature shared by all effect processors
pub type Processor<T> = fn(&mut SpectralFrame<T>, &EffectParams<T>);

/// The two user controls seen by every effect
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = ""))]
pub struct EffectParams<T: Float> {
    /// Control A: a time constant in seconds, converted per frame to a
    /// smoothing coefficient
    pub time: T,
    /// Control B: effect specific amount, `0..=1`
    pub vibe: T,
}

impl<T: Float> Default for EffectParams<T> {
    fn default() -> Self {
        Self {
            time: T::ONE,
            vibe: T::ZERO,
        }
    }
}

impl<T: Float> EffectParams<T> {
    /// Vibe clamped to `[0, 1]`
    pub fn vibe(&self) -> T {
        self.vibe.clamped(T::ZERO, T::ONE)
    }
}

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
/// The spectral effect applied by a channel
pub enum Effect {
    /// Pass the spectrum through untouched
    #[default]
    Thru,
    /// Temporal and spectral blur of bin magnitudes
    Smear,
    /// Resample the spectrum along the frequency axis
    Shift,
    /// Periodic pass/attenuate pattern across bins
    Comb,
    /// Hold per-bin peak magnitudes with a slow decay
    Freeze,
    /// Per-bin spectral gate relative to the frame peak
    Gate,
    /// Linear spectral tilt around the middle bin
    Tilt,
    /// Mirror the spectrum around a movable center bin
    Fold,
    /// Frequency dependent phase rotation
    Phase,
}

impl Serialize for Effect {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(*self as u8)
    }
}

struct EffectVisitor;
impl<'de> serde::de::Visitor<'de> for EffectVisitor {
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
        u8::try_from(value).map_err(|_| E::custom("Effect out of range"))
    }
    fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
        formatter.write_str("An integer corresponding to a valid Effect")
    }
}

impl<'de> Deserialize<'de> for Effect {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let as_int = deserializer.deserialize_u8(EffectVisitor {})?;
        Ok(Effect::new_from_u8(as_int).unwrap_or_default())
    }
}

impl Effect {
    const ELEM: [Effect; 9] = [
        Self::Thru,
        Self::Smear,
        Self::Shift,
        Self::Comb,
        Self::Freeze,
        Self::Gate,
        Self::Tilt,
        Self::Fold,
        Self::Phase,
    ];
    /// Returns a slice to all of the possible Effects
    pub const fn effects() -> &'static [Effect] {
        &Self::ELEM
    }
    /// Provides the display name of the effect
    pub const fn to_str(&self) -> &'static str {
        [
            "Thru", "Smear", "Shift", "Comb", "Freeze", "Gate", "Tilt", "Fold", "Phase",
        ][*self as usize]
    }
    /// Try to create an Effect from a u8
    pub const fn new_from_u8(value: u8) -> Option<Self> {
        if (value as usize) < Self::ELEM.len() {
            Some(Self::ELEM[value as usize])
        } else {
            None
        }
    }
    /// Step through the effects by `inc` positions, wrapping in both directions
    pub fn cycle(self, inc: i32) -> Self {
        let count = Self::ELEM.len() as i32;
        Self::ELEM[(self as i32 + inc).rem_euclid(count) as usize]
    }
    /// The processing function for this effect
    pub fn processor<T: Float>(self) -> Processor<T> {
        let table: [Processor<T>; 9] = [
            thru,
            smear::process,
            shift::process,
            comb::process,
            freeze::process,
            gate::process,
            tilt::process,
            fold::process,
            phase::process,
        ];
        table[self as usize]
    }
    /// Apply this effect to `frame`
    pub fn process<T: Float>(self, frame: &mut SpectralFrame<T>, params: &EffectParams<T>) {
        (self.processor())(frame, params)
    }
}

impl From<Effect> for &'static str {
    fn from(value: Effect) -> Self {
        value.to_str()
    }
}

impl TryFrom<u8> for Effect {
    type Error = &'static str;
    fn try_from(value: u8) -> Result<Self, &'static str> {
        Self::new_from_u8(value).ok_or("Conversion of u8 to Effect Overflowed")
    }
}

fn thru<T: Float>(_frame: &mut SpectralFrame<T>, _params: &EffectParams<T>) {}

/// Magnitude and phase at fractional bin `src`, interpolating `smooth_mag`
/// linearly and `phase` along the shortest arc.  `src` is clamped to the
/// valid bin range.
fn sample_smoothed<T: Float>(frame: &SpectralFrame<T>, src: T) -> (T, T) {
    let last = NUM_BINS - 1;
    let src = src.clamped(T::ZERO, T::from_usize(last));
    let i0 = src.to_index().min(last);
    let i1 = (i0 + 1).min(last);
    let frac = src - T::from_usize(i0);
    let mag = lerp(frame.smooth_mag[i0], frame.smooth_mag[i1], frac);
    let phase = frame.phase[i0] + phase_delta(frame.phase[i0], frame.phase[i1]) * frac;
    (mag, phase)
}

/// Normalized position of bin `k` along the spectrum, `0..=1`
fn bin_position<T: Float>(k: usize) -> T {
    T::from_usize(k) / T::from_usize(NUM_BINS - 1)
}
