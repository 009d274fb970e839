//! Comb: a periodic pass/attenuate pattern across bins applied to the
//! smoothed magnitude.  Phases untouched.

use super::EffectParams;
use crate::frame::SpectralFrame;
use crate::{Float, NUM_BINS};

const MIN_PERIOD: usize = 3;
const PERIOD_RANGE: u16 = 80;
const STOP_GAIN: f32 = 0.05;

/// The comb period (in bins) and the number of passing bins per period
fn geometry<T: Float>(vibe: T) -> (usize, usize) {
    let period = MIN_PERIOD + (vibe * T::from_u16(PERIOD_RANGE)).floor().to_index();
    (period, (period / 4).max(1))
}

pub(super) fn process<T: Float>(frame: &mut SpectralFrame<T>, params: &EffectParams<T>) {
    let (period, width) = geometry(params.vibe());
    let alpha = frame.smoothing_alpha(params.time);
    frame.update_magnitudes();
    frame.smooth_magnitudes(alpha);

    let stop = T::from_f32(STOP_GAIN);
    for k in 0..NUM_BINS {
        let gain = if k % period < width { T::ONE } else { stop };
        let mag = frame.mag[k];
        let scale = if mag > T::DIV_GUARD {
            frame.smooth_mag[k] * gain / mag
        } else {
            T::ZERO
        };
        frame.scale_bin(k, scale);
    }
}
