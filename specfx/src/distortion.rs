//! Pre-spectral wave shaping: a multi-stage wavefolder into an overdrive,
//! followed by a slowly adapting makeup gain that holds the peak level.

use crate::Float;

/// Makeup gain limits
const MIN_MAKEUP: f32 = 0.25;
const MAX_MAKEUP: f32 = 4.0;
/// Peaks below this are treated as silence when adapting the makeup gain
const SILENCE: f32 = 0.0005;
/// Per-block approach rates of the makeup gain
const TRACK_RATE: f32 = 0.05;
const RELAX_RATE: f32 = 0.02;

/// Fold `x` back into `[-1, 1]` up to `folds` times after a drive of
/// `1 + 2*depth*folds`.  A zero depth or fold count is an identity.
pub fn wavefold<T: Float>(x: T, depth: T, folds: u8) -> T {
    if depth <= T::ZERO || folds == 0 {
        return x;
    }
    let drive = T::ONE + depth * T::from_u16(folds as u16) * T::TWO;
    let mut out = x * drive;
    for _ in 0..folds {
        if out > T::ONE {
            out = T::TWO - out;
        } else if out < -T::ONE {
            out = -T::TWO - out;
        }
    }
    out
}

/// Overdrive with `amount` in `0..=1`: below one half it crossfades into a
/// `tanh` saturator (drive up to 8x), above one half from there into a hard
/// clip
pub fn overdrive<T: Float>(x: T, amount: T) -> T {
    if amount <= T::ZERO {
        return x;
    }
    let drive = T::ONE + amount * amount * T::from_u16(28);
    let soft = (x * drive).tanh();
    if amount < T::ONE_HALF {
        return x + (soft - x) * (amount * T::TWO);
    }
    let hard = x.clamped(-T::ONE, T::ONE);
    soft + (hard - soft) * ((amount - T::ONE_HALF) * T::TWO)
}

/// Shaper settings derived from the panel controls
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DistortionSettings<T: Float> {
    /// Wavefolder depth, `0..=2`
    pub depth: T,
    /// Number of fold stages
    pub folds: u8,
    /// Overdrive amount, `0..=1`
    pub overdrive: T,
}

impl<T: Float> DistortionSettings<T> {
    /// Map the wave control (`0..=1`) and the overdrive control
    pub fn from_controls(wave: T, overdrive: T) -> Self {
        let wave = wave.clamped(T::ZERO, T::ONE);
        Self {
            depth: (wave * T::from_f32(1.5)).clamped(T::ZERO, T::TWO),
            folds: 1 + (wave * T::from_u16(4)).to_index() as u8,
            overdrive: overdrive.clamped(T::ZERO, T::ONE),
        }
    }
}

/// One channel of the shaper with its makeup gain state
#[derive(Clone, Copy, Debug)]
pub struct DistortionChannel<T: Float> {
    makeup: T,
    in_peak: T,
    out_peak: T,
}

impl<T: Float> DistortionChannel<T> {
    /// Unity makeup gain
    pub const fn new() -> Self {
        Self {
            makeup: T::ONE,
            in_peak: T::ZERO,
            out_peak: T::ZERO,
        }
    }
    /// Back to unity makeup gain
    pub fn reset(&mut self) {
        *self = Self::new();
    }
    /// The current makeup gain
    pub fn makeup(&self) -> T {
        self.makeup
    }
    /// Shape one sample.  The makeup gain in effect is the one computed at
    /// the end of the previous block.
    pub fn process(&mut self, x: T, settings: &DistortionSettings<T>) -> T {
        self.in_peak = self.in_peak.max(x.abs());
        let shaped = overdrive(wavefold(x, settings.depth, settings.folds), settings.overdrive);
        self.out_peak = self.out_peak.max(shaped.abs());
        shaped * self.makeup
    }
    /// Move the makeup gain toward `in_peak / out_peak` of the block just
    /// processed (or back toward unity on silence), then clear the peaks
    pub fn end_block(&mut self) {
        let silence = T::from_f32(SILENCE);
        if self.in_peak < silence || self.out_peak < silence {
            self.makeup = self.makeup + (T::ONE - self.makeup) * T::from_f32(RELAX_RATE);
        } else {
            let target = (self.in_peak / self.out_peak)
                .clamped(T::from_f32(MIN_MAKEUP), T::from_f32(MAX_MAKEUP));
            self.makeup = self.makeup + (target - self.makeup) * T::from_f32(TRACK_RATE);
        }
        self.in_peak = T::ZERO;
        self.out_peak = T::ZERO;
    }
}

impl<T: Float> Default for DistortionChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_settings_are_identity() {
        let settings = DistortionSettings::from_controls(0.0f32, 0.0);
        assert_eq!(settings.folds, 1);
        let mut chan = DistortionChannel::new();
        for x in [-1.5f32, -0.3, 0.0, 0.7, 2.0] {
            assert_eq!(chan.process(x, &settings), x);
        }
        chan.end_block();
        assert_eq!(chan.makeup(), 1.0);
    }

    #[test]
    fn fold_values() {
        assert_eq!(wavefold(0.9f32, 0.0, 3), 0.9);
        assert_eq!(wavefold(0.9f32, 1.0, 0), 0.9);
        // drive 4: 0.4 -> 1.6 -> 0.4
        assert!((wavefold(0.4f32, 0.75, 2) - 0.4).abs() < 1e-6);
        // drive 2: inside the rails nothing folds
        assert!((wavefold(-0.3f32, 0.5, 1) + 0.6).abs() < 1e-6);
        // drive 3: -0.5 -> -1.5 -> -0.5
        assert!((wavefold(-0.5f32, 1.0, 1) + 0.5).abs() < 1e-6);
    }

    #[test]
    fn overdrive_regions() {
        assert_eq!(overdrive(0.3f32, 0.0), 0.3);
        let soft = (0.3f32 * 8.0).tanh();
        assert!((overdrive(0.3f32, 0.5) - soft).abs() < 1e-6);
        assert!((overdrive(1.7f32, 1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn makeup_tracks_lost_level() {
        let settings = DistortionSettings::from_controls(0.5f32, 0.0);
        assert_eq!(settings.folds, 3);
        let mut chan = DistortionChannel::new();
        let mut last = 1.0;
        for _ in 0..200 {
            // drive 5.5 folds 0.25 to 0.625
            chan.process(0.25f32, &settings);
            chan.process(-0.25f32, &settings);
            chan.end_block();
            assert!(chan.makeup() >= 0.25 && chan.makeup() <= 4.0);
            last = chan.makeup();
        }
        let shaped = wavefold(0.25f32, settings.depth, settings.folds).abs();
        let target = (0.25 / shaped).clamp(0.25, 4.0);
        assert!((last - target).abs() < 0.01 * target);
    }

    #[test]
    fn makeup_relaxes_on_silence() {
        let mut chan = DistortionChannel::<f32>::new();
        chan.makeup = 3.0;
        for _ in 0..500 {
            chan.process(0.0, &DistortionSettings::default());
            chan.end_block();
        }
        assert!((chan.makeup() - 1.0).abs() < 1e-3);
    }
}
