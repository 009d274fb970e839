//! Gate: attenuate bins whose envelope falls below a fraction of the frame
//! peak.  Scales bins, phases untouched.

use super::EffectParams;
use crate::frame::SpectralFrame;
use crate::{Float, NUM_BINS};

pub(super) fn process<T: Float>(frame: &mut SpectralFrame<T>, params: &EffectParams<T>) {
    let alpha = frame.smoothing_alpha(params.time);
    let peak = frame.update_magnitudes();
    // instant attack, smoothed release
    for (env, mag) in frame.smooth_mag.iter_mut().zip(frame.mag.iter()) {
        if *mag > *env {
            *env = *mag;
        } else {
            *env = *env + alpha * (*mag - *env);
        }
    }

    let amount = T::from_f32(0.15) + params.vibe() * T::from_f32(0.85);
    let threshold = peak * amount;
    let knee = (threshold * T::from_f32(0.1)).max(T::MIN_MAG);
    for k in 0..NUM_BINS {
        let env = frame.smooth_mag[k];
        if env < T::MIN_MAG {
            frame.zero_bin(k);
            continue;
        }
        let mut gain = T::ONE;
        if env < threshold {
            gain = env / (threshold + T::DIV_GUARD);
        }
        if env < knee {
            gain = gain * env / (knee + T::DIV_GUARD);
        }
        frame.scale_bin(k, gain.clamped(T::ZERO, T::ONE));
    }
}
