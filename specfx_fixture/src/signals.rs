//! Test signal generators.

use std::f64::consts::TAU;

/// A sine tone starting at zero phase
pub fn sine(sample_rate: u32, freq: f32, amp: f32, len: usize) -> Vec<f32> {
    let step = TAU * freq as f64 / sample_rate as f64;
    (0..len)
        .map(|i| (amp as f64 * (step * i as f64).sin()) as f32)
        .collect()
}

/// Uniform white noise in `[-amp, amp)`
pub fn noise(seed: u64, amp: f32, len: usize) -> Vec<f32> {
    let mut rng = oorandom::Rand32::new(seed);
    (0..len)
        .map(|_| amp * (2.0 * rng.rand_float() - 1.0))
        .collect()
}

/// Single-sample clicks at `rate` per second, the first at sample 0
pub fn clicks(sample_rate: u32, rate: f32, amp: f32, len: usize) -> Vec<f32> {
    let period = ((sample_rate as f32 / rate.max(0.01)) as usize).max(1);
    (0..len)
        .map(|i| if i % period == 0 { amp } else { 0.0 })
        .collect()
}

/// An exponential sine sweep from `f0` to `f1` Hz over `len` samples
pub fn sweep(sample_rate: u32, f0: f32, f1: f32, amp: f32, len: usize) -> Vec<f32> {
    let duration = len.max(1) as f64 / sample_rate as f64;
    let (f0, f1) = (f0 as f64, f1 as f64);
    let k = (f1 / f0).ln();
    (0..len)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            let phase = TAU * f0 * duration / k * ((t * k / duration).exp() - 1.0);
            (amp as f64 * phase.sin()) as f32
        })
        .collect()
}

/// Peak absolute value
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0, |acc, x| acc.max(x.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_level() {
        let tone = sine(48000, 1000.0, 0.5, 48000);
        assert_eq!(tone[0], 0.0);
        assert!((peak(&tone) - 0.5).abs() < 1e-3);
        assert!((specfx::analysis::rms(&tone) - 0.5 / 2f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn noise_is_bounded_and_seeded() {
        let a = noise(7, 0.3, 1000);
        assert!(peak(&a) <= 0.3);
        assert_eq!(a, noise(7, 0.3, 1000));
        assert_ne!(a, noise(8, 0.3, 1000));
    }

    #[test]
    fn click_spacing() {
        let c = clicks(48000, 100.0, 1.0, 1000);
        let positions: Vec<usize> = c
            .iter()
            .enumerate()
            .filter(|(_, x)| **x != 0.0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(positions, [0, 480, 960]);
    }

    #[test]
    fn sweep_stays_in_range() {
        let s = sweep(48000, 20.0, 20000.0, 0.8, 48000);
        assert!(peak(&s) <= 0.8 + 1e-6);
        assert!(s.iter().all(|x| x.is_finite()));
    }
}
