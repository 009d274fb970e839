//! Fold: mirror the spectrum above a center bin back down below it.  Reads
//! polar values, writes through the scratch buffer.

use super::{sample_smoothed, EffectParams};
use crate::frame::SpectralFrame;
use crate::{Float, NUM_BINS};

pub(super) fn process<T: Float>(frame: &mut SpectralFrame<T>, params: &EffectParams<T>) {
    let center = params.vibe() * T::from_usize(NUM_BINS - 1);
    let alpha = frame.smoothing_alpha(params.time);
    frame.update_magnitudes();
    frame.update_phases();
    frame.smooth_magnitudes(alpha);

    for k in 0..NUM_BINS {
        let mapped = center - (T::from_usize(k) - center).abs();
        let (mag, phase) = sample_smoothed(frame, mapped);
        frame.set_scratch_polar(k, mag, phase);
    }
    frame.commit_scratch();
    frame.enforce_real_edges();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_frame() -> SpectralFrame<f32> {
        let mut frame = SpectralFrame::new();
        frame.frame_period = 256.0 / 48000.0;
        for k in 0..NUM_BINS {
            frame.re[k] = k as f32 / 1000.0;
            frame.smooth_mag[k] = k as f32 / 1000.0;
        }
        frame
    }

    #[test]
    fn full_center_is_identity() {
        let mut frame = ramp_frame();
        process(&mut frame, &EffectParams { time: 1.0, vibe: 1.0 });
        for k in 0..NUM_BINS {
            assert!((frame.re[k] - k as f32 / 1000.0).abs() < 1e-5);
        }
    }

    #[test]
    fn mirrors_around_center() {
        let mut frame = ramp_frame();
        process(&mut frame, &EffectParams { time: 1.0, vibe: 0.5 });
        // center 256: bin 300 reads bin 212
        assert!((frame.re[300] - 0.212).abs() < 1e-5);
        assert!((frame.re[200] - 0.2).abs() < 1e-5);
        // everything past 512 folds below zero and clamps to DC
        assert!(frame.re[NUM_BINS - 1].abs() < 1e-6);
    }

    #[test]
    fn zero_center_collapses_to_dc() {
        let mut frame = ramp_frame();
        frame.re[0] = 0.5;
        frame.smooth_mag[0] = 0.5;
        process(&mut frame, &EffectParams { time: 1.0, vibe: 0.0 });
        assert!(frame.re.iter().all(|x| (*x - 0.5).abs() < 1e-5));
        assert!(frame.im.iter().all(|x| x.abs() < 1e-6));
    }
}
