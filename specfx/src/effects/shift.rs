//! Shift: bin `k` is resynthesized from the smoothed spectrum at `k * scale`.
//! Reads polar values, writes through the scratch buffer.

use super::{sample_smoothed, EffectParams};
use crate::frame::SpectralFrame;
use crate::{Float, NUM_BINS};

pub(super) fn process<T: Float>(frame: &mut SpectralFrame<T>, params: &EffectParams<T>) {
    let scale = T::from_f32(0.1) + params.vibe() * T::from_u16(3);
    let alpha = frame.smoothing_alpha(params.time);
    frame.update_magnitudes();
    frame.update_phases();
    frame.smooth_magnitudes(alpha);

    let last = T::from_usize(NUM_BINS - 1);
    for k in 0..NUM_BINS {
        let src = T::from_usize(k) * scale;
        if src >= last {
            frame.scratch_re[k] = T::ZERO;
            frame.scratch_im[k] = T::ZERO;
            continue;
        }
        let (mag, phase) = sample_smoothed(frame, src);
        frame.set_scratch_polar(k, mag, phase);
    }
    frame.commit_scratch();
    frame.enforce_real_edges();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubling_moves_energy_up() {
        let mut frame = SpectralFrame::<f32>::new();
        frame.frame_period = 256.0 / 48000.0;
        frame.re[40] = 1.0;
        frame.smooth_mag[40] = 1.0;
        // scale = 0.1 + 3 * 0.3 = 1.0: identity mapping
        process(&mut frame, &EffectParams { time: 1.0, vibe: 0.3 });
        assert!((frame.re[40] - 1.0).abs() < 1e-4);

        let mut frame = SpectralFrame::<f32>::new();
        frame.frame_period = 256.0 / 48000.0;
        frame.re[40] = 1.0;
        frame.smooth_mag[40] = 1.0;
        // scale 0.5: bin 80 reads from bin 40
        process(&mut frame, &EffectParams { time: 1.0, vibe: 0.4 / 3.0 });
        assert!((frame.re[80] - 1.0).abs() < 1e-3);
        assert!(frame.re[40].abs() < 1e-3);
    }

    #[test]
    fn sources_past_the_end_are_silent() {
        let mut frame = crate::effects::test_util::flat_frame();
        process(&mut frame, &EffectParams { time: 1.0, vibe: 1.0 });
        // scale 3.1: anything above bin 165 reads past the end
        assert!(frame.re[200..].iter().all(|x| *x == 0.0));
        assert!(frame.re[10] > 0.9);
    }
}
