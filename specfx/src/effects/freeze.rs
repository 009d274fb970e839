//! Freeze: hold per-bin peak magnitudes and let them decay slowly.  Scales
//! bins towards the held magnitude, phases untouched.

use super::{EffectParams, MAX_SCALE};
use crate::frame::SpectralFrame;
use crate::{Float, NUM_BINS};

pub(super) fn process<T: Float>(frame: &mut SpectralFrame<T>, params: &EffectParams<T>) {
    let decay = T::ONE - frame.smoothing_alpha(params.time);
    let peak = frame.update_magnitudes();
    // threshold is relative to the loudest bin of this frame
    let threshold = params.vibe() * T::ONE_HALF * peak;
    let max_scale = T::from_f32(MAX_SCALE);

    for k in 0..NUM_BINS {
        let mag = frame.mag[k];
        let held = frame.freeze_mag[k] * decay;
        frame.freeze_mag[k] = if mag > threshold { mag.max(held) } else { held };

        if mag < T::MIN_MAG {
            if frame.freeze_mag[k] < T::MIN_MAG {
                frame.zero_bin(k);
            }
            continue;
        }
        let scale = (frame.freeze_mag[k] / (mag + T::DIV_GUARD)).min(max_scale);
        frame.scale_bin(k, scale);
    }
}
