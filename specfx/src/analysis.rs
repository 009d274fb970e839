//! Level and distortion measurement helpers used by the test fixture and
//! the engine's meters.

use crate::Float;
use arrayvec::ArrayVec;
use num_traits::Float as NumTraitsFloat;

/// The largest number of harmonics [measure_thd] reports
pub const MAX_HARMONICS: usize = 8;

/// Single-bin DFT evaluated with the Goertzel recurrence.  State is kept in
/// `f64` so that long captures do not lose precision.
#[derive(Clone, Copy, Debug, Default)]
pub struct Goertzel {
    coeff: f64,
    q1: f64,
    q2: f64,
}

impl Goertzel {
    /// Prepare to measure the DFT bin nearest `target_hz` over a block of
    /// `len` samples
    pub fn new(target_hz: f32, len: usize, sample_rate: f32) -> Self {
        let len = len.max(1) as f64;
        let k = NumTraitsFloat::round(len * target_hz as f64 / sample_rate as f64);
        let w = core::f64::consts::TAU * k / len;
        Self {
            coeff: 2.0 * NumTraitsFloat::cos(w),
            q1: 0.0,
            q2: 0.0,
        }
    }
    /// Feed one sample
    pub fn push(&mut self, sample: f32) {
        let q0 = self.coeff * self.q1 - self.q2 + sample as f64;
        self.q2 = self.q1;
        self.q1 = q0;
    }
    /// Squared magnitude of the bin for the samples fed so far
    pub fn magnitude_squared(&self) -> f64 {
        self.q1 * self.q1 + self.q2 * self.q2 - self.coeff * self.q1 * self.q2
    }
}

/// The result of [measure_thd]
#[derive(Clone, Debug, Default)]
pub struct ThdResult {
    /// RMS of the whole signal
    pub rms: f32,
    /// RMS of the fundamental alone
    pub fund_rms: f32,
    /// Everything except the fundamental, relative to the fundamental
    pub thdn: f32,
    /// RMS of the fundamental and each harmonic, starting with the
    /// fundamental at index 0
    pub harmonics: ArrayVec<f32, MAX_HARMONICS>,
}

/// Root mean square of `samples`
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq = samples
        .iter()
        .fold(0f64, |acc, x| acc + (*x as f64) * (*x as f64));
    NumTraitsFloat::sqrt(sum_sq / samples.len() as f64) as f32
}

/// Measure level, fundamental and harmonic content of a tone at `freq` Hz.
/// `harmonics` counts the fundamental and is clamped to [MAX_HARMONICS].
pub fn measure_thd(samples: &[f32], sample_rate: f32, freq: f32, harmonics: usize) -> ThdResult {
    let len = samples.len();
    let mut bins: ArrayVec<Goertzel, MAX_HARMONICS> = (1..=harmonics.clamp(1, MAX_HARMONICS))
        .map(|h| Goertzel::new(freq * h as f32, len, sample_rate))
        .collect();
    for smp in samples {
        for bin in bins.iter_mut() {
            bin.push(*smp);
        }
    }
    let to_rms = |bin: &Goertzel| {
        let mag = NumTraitsFloat::sqrt(bin.magnitude_squared());
        (core::f64::consts::SQRT_2 * mag / len.max(1) as f64) as f32
    };
    let harmonics: ArrayVec<f32, MAX_HARMONICS> = bins.iter().map(to_rms).collect();
    let rms = rms(samples);
    let fund_rms = harmonics[0];
    let noise_sq = (rms * rms - fund_rms * fund_rms).max(0.0);
    let thdn = if fund_rms > 0.0 {
        NumTraitsFloat::sqrt(noise_sq) / fund_rms
    } else {
        0.0
    };
    ThdResult {
        rms,
        fund_rms,
        thdn,
        harmonics,
    }
}

/// A peak meter with a per-block decay
#[derive(Clone, Copy, Debug, Default)]
pub struct PeakMeter<T: Float> {
    held: T,
    block: T,
}

impl<T: Float> PeakMeter<T> {
    /// The decay applied to the held value at the end of each block
    pub const DECAY: f32 = 0.95;
    /// A meter reading zero
    pub const fn new() -> Self {
        Self {
            held: T::ZERO,
            block: T::ZERO,
        }
    }
    /// Observe one sample
    pub fn observe(&mut self, x: T) {
        self.block = self.block.max(x.abs());
    }
    /// Close the current block: the held value becomes the larger of this
    /// block's peak and the decayed previous value
    pub fn end_block(&mut self) {
        self.held = self.block.max(self.held * T::from_f32(Self::DECAY));
        self.block = T::ZERO;
    }
    /// The current meter reading
    pub fn value(&self) -> T {
        self.held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(len: usize, parts: &[(f64, f64)]) -> Vec<f32> {
        (0..len)
            .map(|i| {
                parts
                    .iter()
                    .map(|(f, a)| a * (core::f64::consts::TAU * f * i as f64 / 48000.0).sin())
                    .sum::<f64>() as f32
            })
            .collect()
    }

    #[test]
    fn pure_tone() {
        let result = measure_thd(&tone(48000, &[(1000.0, 0.5)]), 48000.0, 1000.0, 5);
        let expected = 0.5 / core::f32::consts::SQRT_2;
        assert!((result.rms - expected).abs() < 1e-4);
        assert!((result.fund_rms - expected).abs() < 1e-4);
        assert!(result.thdn < 1e-3);
        assert_eq!(result.harmonics.len(), 5);
        assert!(result.harmonics[1..].iter().all(|h| *h < 1e-4));
    }

    #[test]
    fn second_harmonic_is_found() {
        let result = measure_thd(
            &tone(48000, &[(1000.0, 0.5), (2000.0, 0.05)]),
            48000.0,
            1000.0,
            3,
        );
        assert!((result.harmonics[1] - 0.05 / core::f32::consts::SQRT_2).abs() < 1e-4);
        assert!((result.thdn - 0.1).abs() < 1e-3);
    }

    #[test]
    fn meter_decays_per_block() {
        let mut meter = PeakMeter::<f32>::new();
        meter.observe(-0.8);
        meter.observe(0.5);
        meter.end_block();
        assert_eq!(meter.value(), 0.8);
        meter.end_block();
        assert!((meter.value() - 0.76).abs() < 1e-6);
        meter.observe(0.9);
        meter.end_block();
        assert_eq!(meter.value(), 0.9);
    }
}
