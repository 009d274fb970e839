//! Phase: rotate each bin by an angle proportional to its frequency.  Works
//! on the rectangular bins; magnitudes are preserved exactly.

use super::{bin_position, EffectParams};
use crate::frame::SpectralFrame;
use crate::{Float, NUM_BINS};

pub(super) fn process<T: Float>(frame: &mut SpectralFrame<T>, params: &EffectParams<T>) {
    let warp = (params.vibe() * T::TWO - T::ONE) * T::TAU;
    let alpha = frame.smoothing_alpha(params.time);
    frame.update_magnitudes();
    // not used for the rotation, but keeps the smoothing state continuous
    // across effect changes
    frame.smooth_magnitudes(alpha);

    for k in 0..NUM_BINS {
        let angle = warp * bin_position::<T>(k);
        let (s, c) = (angle.fsin(), angle.fcos());
        let (re, im) = (frame.re[k], frame.im[k]);
        let rot_re = re * c - im * s;
        let rot_im = re * s + im * c;
        let rot_mag = rot_re.hypot(rot_im);
        let scale = if rot_mag > T::DIV_GUARD {
            frame.mag[k] / rot_mag
        } else {
            T::ZERO
        };
        frame.re[k] = rot_re * scale;
        frame.im[k] = rot_im * scale;
    }
    frame.enforce_real_edges();
}
