//! Mapping from normalized knob and CV readings to engine parameters.
//!
//! Every hardware control arrives as a scalar in `0..=1` (or as a raw 16-bit
//! ADC code, see [scalar_from_raw]).  Each parameter is driven by a pot and a
//! CV input, combined with [combine_pot_cv].

use crate::effects::EffectParams;
use crate::stereo::NotchParams;
use crate::Float;
use fixed::types::U0F16;

/// Shortest time constant reachable from the time control, in seconds
pub const MIN_TIME: f32 = 0.01;
/// Longest time constant reachable from the time control, in seconds
pub const MAX_TIME: f32 = 5.0;
/// Notch distance range before the final doubling
const NOTCH_MIN: f32 = 0.01;
const NOTCH_MAX: f32 = 3.0;
/// Full scale of the phase offset control, in notch spacings
const PHASE_RANGE: f32 = 4.0;

/// Exponential map of `value` (clamped to `0..=1`) onto `[lo, hi]`
pub fn map_expo<T: Float>(value: T, lo: T, hi: T) -> T {
    lo * (hi / lo).powf(value.clamped(T::ZERO, T::ONE))
}

/// Map a unipolar `0..=1` control to `-1..=1`
pub fn bipolar<T: Float>(value: T) -> T {
    (value - T::ONE_HALF) * T::TWO
}

/// Combine a pot and a CV reading.  With the CV at its midpoint the result
/// follows the pot; the CV offsets it by up to a full scale either way.
pub fn combine_pot_cv<T: Float>(pot: T, cv: T) -> T {
    (T::ONE_HALF + T::ONE_HALF * (bipolar(pot) + bipolar(cv))).clamped(T::ZERO, T::ONE)
}

/// Convert a raw left-justified 16-bit ADC code to a scalar in `[0, 1)`
pub fn scalar_from_raw<T: Float>(raw: u16) -> T {
    T::from_f32(U0F16::from_bits(raw).to_num::<f32>())
}

/// The four analog inputs of the module, each normalized to `0..=1`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Knobs<T: Float> {
    /// First pot (time, or notch distance)
    pub pot1: T,
    /// Second pot (vibe, or phase offset)
    pub pot2: T,
    /// CV paired with `pot1`
    pub cv1: T,
    /// CV paired with `pot2`
    pub cv2: T,
}

impl<T: Float> Knobs<T> {
    /// Convert four raw ADC codes, ordered pot1, pot2, cv1, cv2
    pub fn from_raw(raw: [u16; 4]) -> Self {
        Self {
            pot1: scalar_from_raw(raw[0]),
            pot2: scalar_from_raw(raw[1]),
            cv1: scalar_from_raw(raw[2]),
            cv2: scalar_from_raw(raw[3]),
        }
    }
    /// The combined first control
    pub fn first(&self) -> T {
        combine_pot_cv(self.pot1, self.cv1)
    }
    /// The combined second control
    pub fn second(&self) -> T {
        combine_pot_cv(self.pot2, self.cv2)
    }
}

/// Time and vibe as set from the front panel
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpectralControls<T: Float> {
    /// Time constant, in seconds
    pub time: T,
    /// Effect character, `0..=1`
    pub vibe: T,
}

impl<T: Float> SpectralControls<T> {
    /// Map the knobs.  The time control is squared before the exponential
    /// map, so the middle of its travel sits around 50 ms.
    pub fn from_knobs(knobs: &Knobs<T>) -> Self {
        let time = knobs.first();
        Self {
            time: map_expo(time * time, T::from_f32(MIN_TIME), T::from_f32(MAX_TIME)),
            vibe: knobs.second(),
        }
    }
    /// The controls as effect parameters
    pub fn params(&self) -> EffectParams<T> {
        EffectParams {
            time: self.time,
            vibe: self.vibe,
        }
    }
}

/// Notch distance and phase as set from the front panel
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NotchControls<T: Float> {
    /// Notch distance, as consumed by [NotchParams::notch_distance]
    pub notch_distance: T,
    /// Comb offset, as consumed by [NotchParams::phase_offset]
    pub phase_offset: T,
}

impl<T: Float> NotchControls<T> {
    /// Map the knobs
    pub fn from_knobs(knobs: &Knobs<T>) -> Self {
        let distance = map_expo(knobs.first(), T::from_f32(NOTCH_MIN), T::from_f32(NOTCH_MAX));
        Self {
            notch_distance: distance * T::TWO,
            phase_offset: (knobs.second() * T::TWO - T::ONE) * T::from_f32(PHASE_RANGE),
        }
    }
    /// Overwrite the panel-controlled fields of `params`
    pub fn apply(&self, params: &mut NotchParams<T>) {
        params.notch_distance = self.notch_distance;
        params.phase_offset = self.phase_offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expo_endpoints_and_clamp() {
        assert!((map_expo(0.0f32, 0.01, 5.0) - 0.01).abs() < 1e-7);
        assert!((map_expo(1.0f32, 0.01, 5.0) - 5.0).abs() < 1e-5);
        assert!((map_expo(2.0f32, 0.01, 5.0) - 5.0).abs() < 1e-5);
        // geometric midpoint
        assert!((map_expo(0.5f32, 1.0, 100.0) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn pot_and_cv_combine() {
        assert_eq!(combine_pot_cv(0.3f32, 0.5), 0.3);
        assert_eq!(combine_pot_cv(0.8f32, 0.9), 1.0);
        assert_eq!(combine_pot_cv(0.1f32, 0.2), 0.0);
        assert_eq!(bipolar(0.0f32), -1.0);
    }

    #[test]
    fn raw_codes() {
        assert_eq!(scalar_from_raw::<f32>(0), 0.0);
        assert_eq!(scalar_from_raw::<f32>(0x8000), 0.5);
        assert!(scalar_from_raw::<f32>(u16::MAX) < 1.0);
        let knobs = Knobs::<f32>::from_raw([0x4000, 0xC000, 0x8000, 0x8000]);
        assert_eq!(knobs.first(), 0.25);
        assert_eq!(knobs.second(), 0.75);
    }

    #[test]
    fn time_curve_favors_short_times() {
        let knobs = Knobs {
            pot1: 0.5f32,
            pot2: 0.25,
            cv1: 0.5,
            cv2: 0.5,
        };
        let controls = SpectralControls::from_knobs(&knobs);
        // 0.01 * 500^0.25
        assert!((controls.time - 0.0473).abs() < 1e-3);
        assert_eq!(controls.params().vibe, 0.25);
    }

    #[test]
    fn notch_mapping() {
        let mut knobs = Knobs {
            pot1: 0.0f32,
            pot2: 0.0,
            cv1: 0.5,
            cv2: 0.5,
        };
        let low = NotchControls::from_knobs(&knobs);
        assert!((low.notch_distance - 0.02).abs() < 1e-6);
        assert_eq!(low.phase_offset, -4.0);
        knobs.pot1 = 1.0;
        knobs.pot2 = 1.0;
        let high = NotchControls::from_knobs(&knobs);
        assert!((high.notch_distance - 6.0).abs() < 1e-4);
        assert_eq!(high.phase_offset, 4.0);
        let mut params = NotchParams::default();
        high.apply(&mut params);
        assert_eq!(params.phase_offset, 4.0);
    }
}
