//! This module provides objects to reason about the processing context.
//! Currently, the only information wrapped is the current audio sample rate.

use crate::{Float, FFT_SIZE};

#[derive(Clone, Copy, Debug, PartialEq)]
/// A floating point (using the type `Smp`) processing context
pub struct Context<Smp: Float> {
    /// The sample rate, in Hz, with the same type as a processing type
    pub sample_rate: Smp,
}

impl<Smp: Float> Context<Smp> {
    /// Create a new `Context`
    pub const fn new(sample_rate: Smp) -> Self {
        Self { sample_rate }
    }
    /// Returns the sample rate, in Hz.
    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate.to_u32().unwrap_or_default()
    }
    /// The time between two consecutive frames, in seconds, for the given hop
    pub fn frame_period(&self, hop: usize) -> Smp {
        Smp::from_usize(hop) / self.sample_rate.max(Smp::ONE)
    }
    /// The width of one FFT bin, in Hz
    pub fn bin_width(&self) -> Smp {
        self.sample_rate / Smp::from_usize(FFT_SIZE)
    }
    /// The (fractional) bin index corresponding to `freq` Hz
    pub fn bin_for_frequency(&self, freq: Smp) -> Smp {
        freq / self.bin_width().max(Smp::DIV_GUARD)
    }
}

impl<Smp: Float> Default for Context<Smp> {
    fn default() -> Self {
        Self::new(<Smp as From<u16>>::from(48000u16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_period_at_48k() {
        let ctx = Context::<f32>::default();
        assert_eq!(ctx.sample_rate_hz(), 48000);
        assert!((ctx.frame_period(256) - 0.005_333_333).abs() < 1e-7);
        assert!((ctx.bin_for_frequency(46.875) - 1.0).abs() < 1e-6);
    }
}
