//! A free-running low frequency oscillator for modulating the notch comb.

use crate::context::Context;
use crate::device::Device;
use crate::Float;
use serde::{Deserialize, Serialize};

/// Slowest rate reachable from the rate control, in Hz
pub const MIN_RATE_HZ: f32 = 0.05;
/// Span of the rate control above [MIN_RATE_HZ], in Hz
pub const RATE_SPAN_HZ: f32 = 5.0;

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
/// The LFO waveform in use
pub enum LfoWave {
    /// Sine wave is default
    #[default]
    Sine,
    /// Triangle wave
    Triangle,
    /// Square wave
    Square,
    /// Rising sawtooth
    Saw,
}

impl Serialize for LfoWave {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(*self as u8)
    }
}

struct LfoWaveVisitor;
impl<'de> serde::de::Visitor<'de> for LfoWaveVisitor {
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
        u8::try_from(value).map_err(|_| E::custom("LfoWave out of range"))
    }
    fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
        formatter.write_str("An integer corresponding to a valid LfoWave")
    }
}

impl<'de> Deserialize<'de> for LfoWave {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let as_int = deserializer.deserialize_u8(LfoWaveVisitor {})?;
        Ok(LfoWave::new_from_u8(as_int).unwrap_or_default())
    }
}

impl LfoWave {
    const ELEM: [LfoWave; 4] = [Self::Sine, Self::Triangle, Self::Square, Self::Saw];
    /// Returns a slice to all of the possible LfoWaves
    pub const fn waves() -> &'static [LfoWave] {
        &Self::ELEM
    }
    /// Provides the name of the waveform
    pub const fn to_str(&self) -> &'static str {
        ["Sine", "Triangle", "Square", "Saw"][*self as usize]
    }
    /// Try to create a LfoWave from a u8
    pub const fn new_from_u8(value: u8) -> Option<Self> {
        if (value as usize) < Self::ELEM.len() {
            Some(Self::ELEM[value as usize])
        } else {
            None
        }
    }
    /// Step through the waveforms by `inc` positions, wrapping in both
    /// directions
    pub fn cycle(self, inc: i32) -> Self {
        Self::ELEM[(self as i32 + inc).rem_euclid(Self::ELEM.len() as i32) as usize]
    }
    /// The bipolar value of this waveform at `phase` (in cycles, `0..1`)
    pub fn value<T: Float>(self, phase: T) -> T {
        match self {
            Self::Sine => (T::TAU * phase).fsin(),
            Self::Triangle => {
                let x = T::from_u16(4) * phase;
                if phase < T::ONE_HALF / T::TWO {
                    x
                } else if phase < T::from_f32(0.75) {
                    T::TWO - x
                } else {
                    x - T::from_u16(4)
                }
            }
            Self::Square => {
                if phase < T::ONE_HALF {
                    T::ONE
                } else {
                    -T::ONE
                }
            }
            Self::Saw => T::TWO * phase - T::ONE,
        }
    }
}

impl From<LfoWave> for &'static str {
    fn from(value: LfoWave) -> Self {
        value.to_str()
    }
}

impl TryFrom<u8> for LfoWave {
    type Error = &'static str;
    fn try_from(value: u8) -> Result<Self, &'static str> {
        Self::new_from_u8(value).ok_or("Conversion of u8 to LfoWave Overflowed")
    }
}

/// Map the `0..=1` rate control to a frequency in Hz
pub fn rate_to_hz<T: Float>(rate: T) -> T {
    T::from_f32(MIN_RATE_HZ) + T::from_f32(RATE_SPAN_HZ) * rate.clamped(T::ZERO, T::ONE)
}

/// Parameters for an [Lfo]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LfoParams<T: Float> {
    /// The frequency of the LFO, in Hz
    pub freq: T,
    /// The waveform
    pub wave: LfoWave,
}

/// An LFO
#[derive(Clone, Debug)]
pub struct Lfo<T: Float> {
    context: Context<T>,
    phase: T,
}

impl<T: Float> Lfo<T> {
    /// Constructor.  The phase starts at zero.
    pub const fn new(context: Context<T>) -> Self {
        Self {
            context,
            phase: T::ZERO,
        }
    }
    /// Restart from zero phase
    pub fn reset(&mut self) {
        self.phase = T::ZERO;
    }
    /// The current phase, in cycles
    pub fn phase(&self) -> T {
        self.phase
    }
    /// Advance by one sample and return the new value, in `-1..=1`
    pub fn next_value(&mut self, params: &LfoParams<T>) -> T {
        let inc = params.freq.max(T::ZERO) / self.context.sample_rate.max(T::ONE);
        self.phase = self.phase + inc;
        if self.phase >= T::ONE {
            self.phase = (self.phase - T::ONE).min(T::ONE - T::DIV_GUARD);
        }
        params.wave.value(self.phase)
    }
}

impl<T: Float> Default for Lfo<T> {
    fn default() -> Self {
        Self::new(Context::default())
    }
}

impl<T: Float> Device<T> for Lfo<T> {
    type Input = ();
    type Params = LfoParams<T>;
    type Output = T;
    fn next(&mut self, _input: (), params: LfoParams<T>) -> T {
        self.next_value(&params)
    }
}
