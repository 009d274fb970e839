//! Smear: smooth each bin's magnitude over time, then pull it towards the
//! average of its neighbors.  Works on magnitudes, phases untouched.

use super::EffectParams;
use crate::frame::SpectralFrame;
use crate::{Float, NUM_BINS};

/// Neighborhood radius, in bins, at `vibe == 1`
const MAX_RADIUS: u16 = 120;
/// Share of the neighborhood average in the target magnitude
const BLEND: f32 = 0.7;

pub(super) fn process<T: Float>(frame: &mut SpectralFrame<T>, params: &EffectParams<T>) {
    let alpha = frame.smoothing_alpha(params.time);
    frame.update_magnitudes();
    frame.smooth_magnitudes(alpha);

    let radius = (params.vibe() * T::from_u16(MAX_RADIUS)).round().to_index();
    if radius == 0 {
        return;
    }
    let blend = T::from_f32(BLEND);
    let last = NUM_BINS - 1;
    // running sum of smooth_mag over [k - radius, k + radius]
    let mut sum = frame.smooth_mag[..=radius.min(last)]
        .iter()
        .fold(T::ZERO, |acc, x| acc + *x);
    for k in 0..NUM_BINS {
        if k > 0 {
            if k + radius <= last {
                sum = sum + frame.smooth_mag[k + radius];
            }
            if k > radius {
                sum = sum - frame.smooth_mag[k - radius - 1];
            }
        }
        let smooth = frame.smooth_mag[k];
        if smooth < T::MIN_MAG {
            frame.zero_bin(k);
            continue;
        }
        let count = (k + radius).min(last) - k.saturating_sub(radius) + 1;
        let avg = (sum / T::from_usize(count)).max(T::ZERO);
        let target = smooth * (T::ONE - blend) + avg * blend;
        frame.scale_bin(k, target / smooth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::test_util::*;

    #[test]
    fn radius_zero_is_identity() {
        let mut frame = noise_frame(11);
        let before = frame.clone();
        process(&mut frame, &EffectParams { time: 0.5, vibe: 0.0 });
        assert_eq!(frame.re, before.re);
        assert_eq!(frame.im, before.im);
        // smoothing state still advances
        assert!(frame.smooth_mag.iter().any(|x| *x > 0.0));
    }

    #[test]
    fn flat_spectrum_is_unchanged() {
        let mut frame = flat_frame();
        process(&mut frame, &EffectParams { time: 0.5, vibe: 0.5 });
        for k in 0..NUM_BINS {
            assert!((frame.re[k] - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn isolated_peak_spreads_down() {
        let mut frame = SpectralFrame::<f32>::new();
        frame.frame_period = 256.0 / 48000.0;
        frame.re[100] = 1.0;
        frame.smooth_mag[100] = 1.0;
        frame.re[101] = 0.001;
        frame.smooth_mag[101] = 0.001;
        process(&mut frame, &EffectParams { time: 1.0, vibe: 0.1 });
        // radius 12: 25 bins averaged, 0.3 + 0.7/25 of the peak survives
        assert!((frame.re[100] - (0.3 + 0.7 / 25.0)).abs() < 1e-3);
        // the neighbor is raised towards the average
        assert!(frame.re[101] > 0.001);
        // silent bins stay silent
        assert_eq!(frame.re[300], 0.0);
    }
}
