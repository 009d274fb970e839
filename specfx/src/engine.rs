//! The dual-mono engine: input conditioning, two spectral channels, a
//! latency-aligned dry path, dry/wet mix and metering.  This is what an audio
//! callback drives, one block at a time.

use crate::analysis::PeakMeter;
use crate::channel::{ChannelSettings, HopSize, SpectralChannel};
use crate::context::Context;
use crate::controls::{MAX_TIME, MIN_TIME};
use crate::effects::{Effect, EffectParams};
use crate::ring::RingBuffer;
use crate::util::{hard_clip, soft_clip};
use crate::window::{WindowShape, WindowTable};
use crate::{Float, FFT_SIZE};
use serde::{Deserialize, Serialize};

const INPUT_GAIN: f32 = 1.2;
const OUTPUT_GAIN: f32 = 0.9;
const WET_TRIM: f32 = 0.8;
/// Mix values at or below this are treated as fully dry
const DRY_ONLY_MIX: f32 = 0.001;
const MIN_TIME_RATIO: f32 = 0.1;
const MAX_TIME_RATIO: f32 = 10.0;

/// How the wet signal is limited before mixing
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum WetClamp {
    /// No limiting
    Off,
    /// Rational soft clip
    #[default]
    Soft,
    /// Clamp to `[-1, 1]`
    Hard,
}

impl WetClamp {
    const ELEM: [WetClamp; 3] = [Self::Off, Self::Soft, Self::Hard];
    /// Returns a slice to all of the possible WetClamps
    pub const fn clamps() -> &'static [WetClamp] {
        &Self::ELEM
    }
    /// Provides the display name of the mode
    pub const fn to_str(&self) -> &'static str {
        ["Off", "Soft", "Hard"][*self as usize]
    }
    /// Step through the modes by `inc` positions, wrapping in both directions
    pub fn cycle(self, inc: i32) -> Self {
        Self::ELEM[(self as i32 + inc).rem_euclid(Self::ELEM.len() as i32) as usize]
    }
    /// Limit one sample
    pub fn apply<T: Float>(self, x: T) -> T {
        match self {
            Self::Off => x,
            Self::Soft => soft_clip(x),
            Self::Hard => hard_clip(x),
        }
    }
}

/// Everything the front panel can change on a [DualMonoEngine]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = ""))]
pub struct EngineSettings<T: Float> {
    /// The effect run by both channels
    pub effect: Effect,
    /// Effect time control, in seconds (clamped to `0.01..=5`)
    pub time: T,
    /// Multiplier on `time` for the second channel
    pub time_ratio: T,
    /// Effect vibe control, `0..=1`
    pub vibe: T,
    /// Dry/wet mix, `0..=1`
    pub mix: T,
    /// Pass the conditioned input straight to the output
    pub bypass: bool,
    /// Analysis/synthesis window of both channels
    pub window: WindowShape,
    /// Kaiser window shape parameter, `0..=12`
    pub kaiser_beta: T,
    /// Wet signal limiting
    pub wet_clamp: WetClamp,
    /// Hop of both channels
    pub hop: HopSize,
    /// Post-processing settings of both channels
    pub channel: ChannelSettings<T>,
}

impl<T: Float> EngineSettings<T> {
    /// The power-on settings
    pub const fn new() -> Self {
        Self {
            effect: Effect::Smear,
            time: T::ONE,
            time_ratio: T::ONE,
            vibe: T::ZERO,
            mix: T::ONE,
            bypass: false,
            window: WindowShape::SqrtHann,
            kaiser_beta: T::SIX,
            wet_clamp: WetClamp::Soft,
            hop: HopSize::Samples256,
            channel: ChannelSettings {
                preserve: T::POINT_TWO,
                spectral_gain: T::ONE,
                ifft_gain: T::ONE,
                ola_gain: T::ONE,
                phase_continuity: true,
                normalize: false,
                limit: false,
            },
        }
    }
    /// The effect parameters seen by each channel
    pub fn channel_params(&self) -> [EffectParams<T>; 2] {
        let (lo, hi) = (T::from_f32(MIN_TIME), T::from_f32(MAX_TIME));
        let ratio = self
            .time_ratio
            .clamped(T::from_f32(MIN_TIME_RATIO), T::from_f32(MAX_TIME_RATIO));
        [self.time, self.time * ratio].map(|time| EffectParams {
            time: time.clamped(lo, hi),
            vibe: self.vibe,
        })
    }
}

impl<T: Float> Default for EngineSettings<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Peak levels observed by a [DualMonoEngine], updated once per block
#[derive(Clone, Copy, Debug, Default)]
pub struct EngineMeters<T: Float> {
    /// Input after the input gain
    pub input: PeakMeter<T>,
    /// Input after the soft clipper
    pub input_clipped: PeakMeter<T>,
    /// Wet signal after clamping and trim
    pub wet: PeakMeter<T>,
    /// Output before the final hard clip
    pub output: PeakMeter<T>,
    /// Per-channel output before the final hard clip
    pub channel: [PeakMeter<T>; 2],
}

impl<T: Float> EngineMeters<T> {
    /// All meters reading zero
    pub const fn new() -> Self {
        Self {
            input: PeakMeter::new(),
            input_clipped: PeakMeter::new(),
            wet: PeakMeter::new(),
            output: PeakMeter::new(),
            channel: [PeakMeter::new(), PeakMeter::new()],
        }
    }
    fn end_block(&mut self) {
        self.input.end_block();
        self.input_clipped.end_block();
        self.wet.end_block();
        self.output.end_block();
        for meter in self.channel.iter_mut() {
            meter.end_block();
        }
    }
}

/// Two independent spectral channels with shared settings.
///
/// Like [SpectralChannel], this is large: construct it with
/// [DualMonoEngine::new] into static storage and call [DualMonoEngine::init]
/// in place.
#[derive(Clone)]
pub struct DualMonoEngine<T: Float> {
    settings: EngineSettings<T>,
    window: WindowTable<T>,
    channels: [SpectralChannel<T>; 2],
    dry: [RingBuffer<T, FFT_SIZE>; 2],
    meters: EngineMeters<T>,
}

impl<T: Float> DualMonoEngine<T> {
    /// An uninitialized engine with the power-on settings
    pub const fn new() -> Self {
        Self {
            settings: EngineSettings::new(),
            window: [T::ZERO; FFT_SIZE],
            channels: [SpectralChannel::new(), SpectralChannel::new()],
            dry: [RingBuffer::new(), RingBuffer::new()],
            meters: EngineMeters::new(),
        }
    }
    /// Build the window and initialize both channels
    pub fn init(&mut self, context: Context<T>) {
        let settings = self.settings;
        settings
            .window
            .fill(settings.kaiser_beta, &mut self.window);
        log::info!(
            "engine init: {} Hz, window {}",
            context.sample_rate_hz(),
            settings.window.to_str()
        );
        for chan in self.channels.iter_mut() {
            chan.set_hop_size(settings.hop);
            chan.set_settings(settings.channel);
            chan.init(context, &self.window);
        }
        for ring in self.dry.iter_mut() {
            ring.clear();
        }
    }
    /// The current settings
    pub fn settings(&self) -> &EngineSettings<T> {
        &self.settings
    }
    /// Apply new settings.  A different window, Kaiser beta (with the Kaiser
    /// window selected) or hop resets both channels.
    pub fn set_settings(&mut self, settings: EngineSettings<T>) {
        let old = self.settings;
        self.settings = settings;
        let window_changed = settings.window != old.window
            || (settings.window == WindowShape::Kaiser && settings.kaiser_beta != old.kaiser_beta);
        if window_changed {
            self.set_window(settings.window, settings.kaiser_beta);
        }
        if settings.hop != old.hop {
            for chan in self.channels.iter_mut() {
                chan.set_hop_size(settings.hop);
            }
        }
        if settings.channel != old.channel {
            for chan in self.channels.iter_mut() {
                chan.set_settings(settings.channel);
            }
        }
    }
    /// Rebuild the window table and hand it to both channels
    pub fn set_window(&mut self, shape: WindowShape, kaiser_beta: T) {
        self.settings.window = shape;
        self.settings.kaiser_beta = kaiser_beta;
        shape.fill(kaiser_beta, &mut self.window);
        log::debug!("window -> {}", shape.to_str());
        for chan in self.channels.iter_mut() {
            chan.set_window(&self.window);
        }
    }
    /// The current window table
    pub fn window(&self) -> &WindowTable<T> {
        &self.window
    }
    /// Peak meters, as of the end of the last block
    pub fn meters(&self) -> &EngineMeters<T> {
        &self.meters
    }
    /// The two channels
    pub fn channels(&self) -> &[SpectralChannel<T>; 2] {
        &self.channels
    }
    /// Process one block per channel.  Processes as many samples as the
    /// shortest of the four slices holds.
    pub fn process_block(&mut self, input: [&[T]; 2], output: [&mut [T]; 2]) {
        let len = input
            .iter()
            .map(|x| x.len())
            .chain(output.iter().map(|x| x.len()))
            .min()
            .unwrap_or(0);
        let settings = self.settings;
        let params = settings.channel_params();
        let mix = settings.mix.clamped(T::ZERO, T::ONE);
        let dry_only = settings.bypass || mix <= T::from_f32(DRY_ONLY_MIX);
        let (input_gain, output_gain) = (T::from_f32(INPUT_GAIN), T::from_f32(OUTPUT_GAIN));
        let wet_trim = T::from_f32(WET_TRIM);
        for i in 0..len {
            for ch in 0..2 {
                let raw = input[ch][i] * input_gain;
                self.meters.input.observe(raw);
                let clipped = soft_clip(raw);
                self.meters.input_clipped.observe(clipped);
                let out = if dry_only {
                    clipped * output_gain
                } else {
                    let dry = self.dry[ch].delay(clipped);
                    let wet = if settings.effect == Effect::Thru {
                        clipped
                    } else {
                        self.channels[ch].process_sample(clipped, settings.effect, &params[ch])
                    };
                    let wet = settings.wet_clamp.apply(wet) * wet_trim;
                    self.meters.wet.observe(wet);
                    ((T::ONE - mix) * dry + mix * wet) * output_gain
                };
                self.meters.channel[ch].observe(out);
                self.meters.output.observe(out);
                output[ch][i] = hard_clip(out);
            }
        }
        self.meters.end_block();
    }
}

impl<T: Float> Default for DualMonoEngine<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(settings: EngineSettings<f32>) -> Box<DualMonoEngine<f32>> {
        let mut ret = Box::new(DualMonoEngine::new());
        ret.set_settings(settings);
        ret.init(Context::default());
        ret
    }

    fn run(engine: &mut DualMonoEngine<f32>, input: &[f32]) -> [Vec<f32>; 2] {
        let mut left = vec![0f32; input.len()];
        let mut right = vec![0f32; input.len()];
        for ((chunk, l), r) in input
            .chunks(48)
            .zip(left.chunks_mut(48))
            .zip(right.chunks_mut(48))
        {
            engine.process_block([chunk, chunk], [l, r]);
        }
        [left, right]
    }

    #[test]
    fn bypass_path_gain() {
        let mut eng = engine(EngineSettings {
            bypass: true,
            ..Default::default()
        });
        let [left, right] = run(&mut eng, &[0.5; 96]);
        // 0.5 * 1.2 = 0.6, soft clipped to 0.375, times 0.9
        assert!(left.iter().all(|x| (x - 0.3375).abs() < 1e-6));
        assert_eq!(left, right);
        assert!((eng.meters().input.value() - 0.6).abs() < 1e-6);
        assert!((eng.meters().input_clipped.value() - 0.375).abs() < 1e-6);
        assert_eq!(eng.meters().wet.value(), 0.0);
    }

    #[test]
    fn zero_mix_is_dry_only() {
        let mut eng = engine(EngineSettings {
            mix: 0.0,
            ..Default::default()
        });
        let [left, _] = run(&mut eng, &[-4.0; 48]);
        assert!(left.iter().all(|x| (x + 0.9 * 4.8 / 5.8).abs() < 1e-6));
    }

    #[test]
    fn dry_delay_aligns_with_wet() {
        let mut eng = engine(EngineSettings {
            mix: 0.5,
            wet_clamp: WetClamp::Off,
            channel: ChannelSettings {
                preserve: 1.0,
                ..EngineSettings::new().channel
            },
            ..Default::default()
        });
        let mut input = vec![0f32; 3 * FFT_SIZE];
        input[100] = 0.5;
        let [left, right] = run(&mut eng, &input);
        for (n, y) in left.iter().enumerate() {
            let expected = if n == 100 + FFT_SIZE {
                (0.5 * 0.375 + 0.5 * 0.375 * 0.8) * 0.9
            } else {
                0.0
            };
            assert!((y - expected).abs() < 1e-4, "sample {}", n);
        }
        assert_eq!(left, right);
    }

    #[test]
    fn thru_skips_the_channels() {
        let mut eng = engine(EngineSettings {
            effect: Effect::Thru,
            mix: 0.5,
            ..Default::default()
        });
        let mut input = vec![0f32; 2 * FFT_SIZE];
        input[10] = 0.5;
        let [left, _] = run(&mut eng, &input);
        // the wet path is the undelayed input, the dry path is delayed
        assert!((left[10] - 0.5 * soft_clip(0.375f32) * 0.8 * 0.9).abs() < 1e-6);
        assert!((left[10 + FFT_SIZE] - 0.5 * 0.375 * 0.9).abs() < 1e-6);
        assert!(!eng.channels()[0].is_primed());
    }

    #[test]
    fn second_channel_time_ratio() {
        let settings = EngineSettings {
            time: 2.0f32,
            time_ratio: 4.0,
            ..Default::default()
        };
        let [a, b] = settings.channel_params();
        assert_eq!(a.time, 2.0);
        assert_eq!(b.time, 5.0);
        let settings = EngineSettings {
            time: 0.001f32,
            time_ratio: 0.0,
            ..Default::default()
        };
        let [a, b] = settings.channel_params();
        assert_eq!(a.time, 0.01);
        assert_eq!(b.time, 0.01);
    }

    #[test]
    fn window_change_reaches_channels() {
        let mut eng = engine(EngineSettings::default());
        let settings = EngineSettings {
            window: WindowShape::Hann,
            ..*eng.settings()
        };
        eng.set_settings(settings);
        assert_eq!(*eng.window(), WindowShape::Hann.build(0.0f32));
        // hann at 4x overlap sums to 1.5 everywhere
        assert!((eng.channels()[1].overlap_norm(7) - 1.0 / 1.5).abs() < 1e-4);
    }

    #[test]
    fn power_on_defaults() {
        let settings = EngineSettings::<f32>::default();
        assert_eq!(settings.effect, Effect::Smear);
        assert_eq!(settings.wet_clamp, WetClamp::Soft);
        assert_eq!(WetClamp::Hard.cycle(1), WetClamp::Off);
        assert_eq!(WetClamp::Off.cycle(-1).to_str(), "Hard");
    }

    #[test]
    fn settings_load_from_partial_json() {
        let settings: EngineSettings<f32> =
            serde_json::from_str(r#"{"effect": 2, "hop": 512, "channel": {"limit": true}}"#)
                .unwrap();
        assert_eq!(Ok(settings.effect), Effect::try_from(2));
        assert_eq!(settings.hop, HopSize::Samples512);
        assert!(settings.channel.limit);
        assert_eq!(settings.channel.spectral_gain, 1.0);
        assert_eq!(settings.time, EngineSettings::<f32>::new().time);
        let text = serde_json::to_string(&settings).unwrap();
        assert_eq!(serde_json::from_str::<EngineSettings<f32>>(&text).unwrap(), settings);
    }

    #[test]
    fn amplitude_sweep_stays_in_range() {
        for effect in Effect::effects() {
            for vibe in [0.0, 0.5, 1.0] {
                for amp in [0.1f32, 0.5, 1.0, 2.0] {
                    let mut eng = engine(EngineSettings {
                        effect: *effect,
                        vibe,
                        time: 0.05,
                        ..Default::default()
                    });
                    let input: Vec<f32> = (0..4 * FFT_SIZE)
                        .map(|i| {
                            amp * (core::f32::consts::TAU * 1000.0 * i as f32 / 48000.0).sin()
                        })
                        .collect();
                    let [left, right] = run(&mut eng, &input);
                    let tail = left[2 * FFT_SIZE..].iter().chain(right[2 * FFT_SIZE..].iter());
                    let peak = tail.clone().fold(0f32, |acc, x| acc.max(x.abs()));
                    assert!(tail.clone().all(|x| x.is_finite()), "{:?}", effect);
                    assert!(peak <= 0.95, "{:?} vibe {} amp {}: {}", effect, vibe, amp, peak);
                    let silent_fold = *effect == Effect::Fold && vibe < 0.1;
                    if amp >= 0.5 && !silent_fold {
                        assert!(peak > 0.005, "{:?} vibe {} amp {}: {}", effect, vibe, amp, peak);
                    }
                }
            }
        }
    }
}
