//! Tilt: a linear gain slope across the spectrum applied to the smoothed
//! magnitude.  Phases untouched.

use super::{bin_position, EffectParams};
use crate::frame::SpectralFrame;
use crate::{Float, NUM_BINS};

pub(super) fn process<T: Float>(frame: &mut SpectralFrame<T>, params: &EffectParams<T>) {
    let tilt = (params.vibe() * T::TWO - T::ONE) * T::from_u16(3);
    let alpha = frame.smoothing_alpha(params.time);
    frame.update_magnitudes();
    frame.smooth_magnitudes(alpha);

    let slope = T::from_f32(2.4);
    let (min_gain, max_gain) = (T::from_f32(0.05), T::TWO);
    for k in 0..NUM_BINS {
        let pos: T = bin_position(k);
        let gain = (T::ONE + tilt * (pos - T::ONE_HALF) * slope).clamped(min_gain, max_gain);
        let mag = frame.mag[k];
        let scale = if mag > T::DIV_GUARD {
            frame.smooth_mag[k] * gain / mag
        } else {
            T::ZERO
        };
        frame.scale_bin(k, scale);
    }
}
