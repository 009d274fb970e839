//! The per-channel spectral working set handed to the effect processors.

use crate::{Float, NUM_BINS};

/// One channel's half spectrum plus the per-bin state that persists between
/// frames.
///
/// `re`/`im` hold the bins being processed.  `mag`/`phase` are scratch polar
/// views, only valid after [SpectralFrame::update_magnitudes] or
/// [SpectralFrame::update_phases].  `scratch_re`/`scratch_im` are a second
/// rectangular buffer for effects that remap bins.  `smooth_mag` and
/// `freeze_mag` survive across frames and are only cleared by
/// [SpectralFrame::clear].
#[derive(Clone)]
pub struct SpectralFrame<T: Float> {
    /// Real part of each bin
    pub re: [T; NUM_BINS],
    /// Imaginary part of each bin
    pub im: [T; NUM_BINS],
    /// Magnitude of each bin
    pub mag: [T; NUM_BINS],
    /// Phase of each bin, in radians
    pub phase: [T; NUM_BINS],
    /// Remapping buffer (real)
    pub scratch_re: [T; NUM_BINS],
    /// Remapping buffer (imaginary)
    pub scratch_im: [T; NUM_BINS],
    /// Exponentially smoothed magnitude
    pub smooth_mag: [T; NUM_BINS],
    /// Held magnitude for the freeze effect
    pub freeze_mag: [T; NUM_BINS],
    /// Seconds between consecutive frames
    pub frame_period: T,
}

impl<T: Float> SpectralFrame<T> {
    /// A silent frame with no history
    pub const fn new() -> Self {
        Self {
            re: [T::ZERO; NUM_BINS],
            im: [T::ZERO; NUM_BINS],
            mag: [T::ZERO; NUM_BINS],
            phase: [T::ZERO; NUM_BINS],
            scratch_re: [T::ZERO; NUM_BINS],
            scratch_im: [T::ZERO; NUM_BINS],
            smooth_mag: [T::ZERO; NUM_BINS],
            freeze_mag: [T::ZERO; NUM_BINS],
            frame_period: T::ZERO,
        }
    }
    /// Zero every buffer, including the persistent state.  The frame period
    /// is kept.
    pub fn clear(&mut self) {
        *self = Self {
            frame_period: self.frame_period,
            ..Self::new()
        };
    }
    /// Recompute `mag` from `re`/`im`, returning the largest magnitude
    pub fn update_magnitudes(&mut self) -> T {
        let mut peak = T::ZERO;
        for k in 0..NUM_BINS {
            let mag = self.re[k].hypot(self.im[k]);
            self.mag[k] = mag;
            peak = peak.max(mag);
        }
        peak
    }
    /// Recompute `phase` from `re`/`im`
    pub fn update_phases(&mut self) {
        for k in 0..NUM_BINS {
            self.phase[k] = self.im[k].fatan2(self.re[k]);
        }
    }
    /// One pole smoothing of `smooth_mag` towards `mag` with coefficient
    /// `alpha`.  `mag` must be current.
    pub fn smooth_magnitudes(&mut self, alpha: T) {
        for (smooth, mag) in self.smooth_mag.iter_mut().zip(self.mag.iter()) {
            *smooth = *smooth + alpha * (*mag - *smooth);
        }
    }
    /// The per-frame smoothing coefficient for a time constant of `time`
    /// seconds: `frame_period / time`, clamped to `[0.0005, 0.95]`
    pub fn smoothing_alpha(&self, time: T) -> T {
        (self.frame_period / time.max(T::DIV_GUARD))
            .clamped(T::from_f32(0.0005), T::from_f32(0.95))
    }
    /// Multiply bin `k` by `scale`
    pub fn scale_bin(&mut self, k: usize, scale: T) {
        self.re[k] = self.re[k] * scale;
        self.im[k] = self.im[k] * scale;
    }
    /// Silence bin `k`
    pub fn zero_bin(&mut self, k: usize) {
        self.re[k] = T::ZERO;
        self.im[k] = T::ZERO;
    }
    /// Write a polar value into the scratch buffer at bin `k`
    pub fn set_scratch_polar(&mut self, k: usize, mag: T, phase: T) {
        self.scratch_re[k] = mag * phase.fcos();
        self.scratch_im[k] = mag * phase.fsin();
    }
    /// Replace the bins with the scratch buffer
    pub fn commit_scratch(&mut self) {
        self.re = self.scratch_re;
        self.im = self.scratch_im;
    }
    /// Force the imaginary parts of DC and Nyquist to zero
    pub fn enforce_real_edges(&mut self) {
        self.im[0] = T::ZERO;
        self.im[NUM_BINS - 1] = T::ZERO;
    }
    /// Sum of squared bin magnitudes
    pub fn energy(&self) -> T {
        self.re
            .iter()
            .zip(self.im.iter())
            .fold(T::ZERO, |acc, (re, im)| acc + *re * *re + *im * *im)
    }
}

impl<T: Float> Default for SpectralFrame<T> {
    fn default() -> Self {
        Self::new()
    }
}
