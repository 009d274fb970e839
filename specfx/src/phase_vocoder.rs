//! Phase continuity correction: resynthesize each bin's phase by
//! accumulating its measured instantaneous frequency, so that effects which
//! rescale or remap bins do not produce phase jumps between frames.

use crate::frame::SpectralFrame;
use crate::util::wrap_phase;
use crate::{Float, FFT_SIZE, NUM_BINS};

/// Per-bin phase history for one channel
#[derive(Clone)]
pub struct PhaseContinuity<T: Float> {
    prev_phase: [T; NUM_BINS],
    sum_phase: [T; NUM_BINS],
}

impl<T: Float> PhaseContinuity<T> {
    /// Fresh state with zero phase history
    pub const fn new() -> Self {
        Self {
            prev_phase: [T::ZERO; NUM_BINS],
            sum_phase: [T::ZERO; NUM_BINS],
        }
    }
    /// Forget the phase history
    pub fn reset(&mut self) {
        *self = Self::new();
    }
    /// Rewrite the phases of bins `1..N/2` in `frame`.  `hop` is the number
    /// of samples since the previous frame.  DC and Nyquist are left as is.
    pub fn apply(&mut self, frame: &mut SpectralFrame<T>, hop: usize) {
        let advance_per_bin = T::TAU * T::from_usize(hop) / T::from_usize(FFT_SIZE);
        for k in 1..NUM_BINS - 1 {
            let (re, im) = (frame.re[k], frame.im[k]);
            let mag = re.hypot(im);
            // silent bins keep their phase history untouched
            if mag < T::MIN_MAG {
                frame.zero_bin(k);
                continue;
            }
            let phase = im.fatan2(re);
            let expected = advance_per_bin * T::from_usize(k);
            let delta = wrap_phase(phase - self.prev_phase[k] - expected);
            // keep the accumulator bounded; only its value mod 2pi matters
            self.sum_phase[k] = wrap_phase(self.sum_phase[k] + expected + delta);
            self.prev_phase[k] = phase;
            frame.re[k] = mag * self.sum_phase[k].fcos();
            frame.im[k] = mag * self.sum_phase[k].fsin();
        }
    }
}

impl<T: Float> Default for PhaseContinuity<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::phase_delta;

    #[test]
    fn stationary_partial_keeps_magnitude_and_advance() {
        let hop = 256;
        let bin = 21;
        let mut pv = PhaseContinuity::<f32>::new();
        let mut frame = SpectralFrame::<f32>::new();
        let advance = core::f32::consts::TAU * (hop * bin) as f32 / FFT_SIZE as f32;
        let mut outputs = Vec::new();
        for n in 0..4 {
            let phase = 0.3 + advance * n as f32;
            frame.re[bin] = 0.5 * phase.cos();
            frame.im[bin] = 0.5 * phase.sin();
            frame.re[bin + 1] = 1.0e-8;
            pv.apply(&mut frame, hop);
            outputs.push(frame.im[bin].atan2(frame.re[bin]));
            assert!((frame.re[bin].hypot(frame.im[bin]) - 0.5).abs() < 1e-5);
            assert_eq!(frame.re[bin + 1], 0.0);
        }
        for pair in outputs.windows(2) {
            assert!((phase_delta(pair[0], pair[1]) - wrap_phase(advance)).abs() < 1e-3);
        }
    }

    #[test]
    fn edges_untouched() {
        let mut pv = PhaseContinuity::<f32>::new();
        let mut frame = SpectralFrame::<f32>::new();
        frame.re[0] = -0.25;
        frame.re[NUM_BINS - 1] = 0.125;
        pv.apply(&mut frame, 128);
        assert_eq!(frame.re[0], -0.25);
        assert_eq!(frame.re[NUM_BINS - 1], 0.125);
    }

    #[test]
    fn silent_bin_keeps_phase_history() {
        let mut pv = PhaseContinuity::<f32>::new();
        let mut frame = SpectralFrame::<f32>::new();
        frame.re[7] = 1.0e-8;
        frame.im[7] = 1.0e-8;
        pv.apply(&mut frame, 256);
        assert_eq!((frame.re[7], frame.im[7]), (0.0, 0.0));
        assert_eq!(pv.sum_phase[7], 0.0);
        assert_eq!(pv.prev_phase[7], 0.0);
    }
}
