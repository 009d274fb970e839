//! The mono STFT channel: windowed analysis, one spectral effect per frame,
//! and weighted overlap-add resynthesis.

use crate::context::Context;
use crate::device::Device;
use crate::effects::{Effect, EffectParams, MAX_SCALE};
use crate::fft::{pack_spectrum, unpack_spectrum, Direction, FftPlan};
use crate::frame::SpectralFrame;
use crate::phase_vocoder::PhaseContinuity;
use crate::ring::RingBuffer;
use crate::window::WindowTable;
use crate::{Float, FFT_SIZE, NUM_BINS, OUTPUT_RING_SIZE};
use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u16)]
/// The number of samples between consecutive analysis frames
pub enum HopSize {
    /// 128 samples (8x overlap)
    Samples128 = 128,
    /// 256 samples (4x overlap)
    #[default]
    Samples256 = 256,
    /// 512 samples (2x overlap)
    Samples512 = 512,
    /// 1024 samples (no overlap)
    Samples1024 = 1024,
}

impl HopSize {
    const ELEM: [HopSize; 4] = [
        Self::Samples128,
        Self::Samples256,
        Self::Samples512,
        Self::Samples1024,
    ];
    /// Returns a slice to all of the possible HopSizes
    pub const fn sizes() -> &'static [HopSize] {
        &Self::ELEM
    }
    /// The hop, in samples
    pub const fn samples(self) -> usize {
        self as usize
    }
    /// The number of frames overlapping any one sample
    pub const fn overlap(self) -> usize {
        FFT_SIZE / self.samples()
    }
    /// The supported hop closest to `samples`.  Ties round down.
    pub const fn nearest(samples: usize) -> Self {
        if samples <= 192 {
            Self::Samples128
        } else if samples <= 384 {
            Self::Samples256
        } else if samples <= 768 {
            Self::Samples512
        } else {
            Self::Samples1024
        }
    }
    /// The next smaller hop.  The smallest hop maps to itself.
    pub const fn halved(self) -> Self {
        match self {
            Self::Samples1024 => Self::Samples512,
            Self::Samples512 => Self::Samples256,
            _ => Self::Samples128,
        }
    }
    /// Map the hardware block size selector (0, 1, 2, ...) to a hop.  Out of
    /// range selectors choose the largest block-selectable hop (512).
    pub const fn from_block_size_index(index: usize) -> Self {
        match index {
            0 => Self::Samples128,
            1 => Self::Samples256,
            _ => Self::Samples512,
        }
    }
}

impl TryFrom<usize> for HopSize {
    type Error = &'static str;
    fn try_from(value: usize) -> Result<Self, &'static str> {
        match value {
            128 => Ok(Self::Samples128),
            256 => Ok(Self::Samples256),
            512 => Ok(Self::Samples512),
            1024 => Ok(Self::Samples1024),
            _ => Err("Unsupported Hop Size"),
        }
    }
}

impl Serialize for HopSize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u16(*self as u16)
    }
}

impl<'de> Deserialize<'de> for HopSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let as_int = u16::deserialize(deserializer)?;
        Ok(HopSize::nearest(as_int as usize))
    }
}

/// Overlap sums below this fraction of the largest sum cannot be normalized
/// without amplifying the frame edges
pub const MIN_OVERLAP_RATIO: f32 = 0.05;

/// Fill `out[..hop]` with the weighted overlap-add normalization
/// `1 / sum_m window[i + m*hop]^2` and return the hop it was built for.
///
/// If the weakest overlap sum at `requested` falls below [MIN_OVERLAP_RATIO]
/// times the strongest (e.g. a tapered window with no overlap), the hop is
/// halved until it does not.  Sums are also floored at that ratio, so no
/// entry exceeds `1 / (MIN_OVERLAP_RATIO * max_sum)`.  An all-zero window
/// gives a table of ones at the requested hop.
pub fn build_overlap_table<T: Float>(
    window: &WindowTable<T>,
    requested: HopSize,
    out: &mut [T; FFT_SIZE],
) -> HopSize {
    let ratio = T::from_f32(MIN_OVERLAP_RATIO);
    let mut hop = requested;
    loop {
        let step = hop.samples();
        let mut lo = T::infinity();
        let mut hi = T::ZERO;
        for (i, sum) in out[..step].iter_mut().enumerate() {
            *sum = (0..hop.overlap())
                .map(|m| window[i + m * step] * window[i + m * step])
                .fold(T::ZERO, |acc, x| acc + x);
            lo = lo.min(*sum);
            hi = hi.max(*sum);
        }
        if hi <= T::DIV_GUARD {
            out[..step].fill(T::ONE);
            return hop;
        }
        if lo >= hi * ratio || hop == HopSize::Samples128 {
            let floor = hi * ratio;
            for x in out[..step].iter_mut() {
                *x = T::ONE / (*x).max(floor);
            }
            return hop;
        }
        hop = hop.halved();
    }
}

/// Spectral post-processing applied after the effect on every frame.
/// The default is an identity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = ""))]
pub struct ChannelSettings<T: Float> {
    /// Blend of the unprocessed spectrum back into the output, `0..=1`
    pub preserve: T,
    /// Gain applied to every bin before resynthesis
    pub spectral_gain: T,
    /// Gain applied to the inverse transform output
    pub ifft_gain: T,
    /// Gain applied while overlap-adding
    pub ola_gain: T,
    /// Resynthesize bin phases from their measured frequency
    pub phase_continuity: bool,
    /// Never let a frame carry more energy than its unprocessed input
    pub normalize: bool,
    /// Cap each bin at [MAX_SCALE] times its unprocessed magnitude
    pub limit: bool,
}

impl<T: Float> ChannelSettings<T> {
    /// The identity settings
    pub const fn new() -> Self {
        Self {
            preserve: T::ZERO,
            spectral_gain: T::ONE,
            ifft_gain: T::ONE,
            ola_gain: T::ONE,
            phase_continuity: false,
            normalize: false,
            limit: false,
        }
    }
}

impl<T: Float> Default for ChannelSettings<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The per-sample parameters of a [SpectralChannel]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChannelParams<T: Float> {
    /// The effect applied to each frame
    pub effect: Effect,
    /// The effect controls
    pub controls: EffectParams<T>,
}

/// A mono short-time Fourier transform processor.
///
/// Latency from input to output is exactly [FFT_SIZE] samples; the first
/// `hop` outputs after (re)initialization are silence.
///
/// The struct is large (several tens of kilobytes for `f32`).  Embedded users
/// should construct it with [SpectralChannel::new] into static storage and
/// then call [SpectralChannel::init] in place.
#[derive(Clone)]
pub struct SpectralChannel<T: Float> {
    context: Context<T>,
    settings: ChannelSettings<T>,
    hop: HopSize,
    frame_hop: HopSize,
    hop_counter: usize,
    primed: bool,
    window: WindowTable<T>,
    overlap_inv: [T; FFT_SIZE],
    input: RingBuffer<T, FFT_SIZE>,
    output: RingBuffer<T, OUTPUT_RING_SIZE>,
    fft: FftPlan<T>,
    fft_re: [T; FFT_SIZE],
    fft_im: [T; FFT_SIZE],
    frame: SpectralFrame<T>,
    dry_re: [T; NUM_BINS],
    dry_im: [T; NUM_BINS],
    vocoder: PhaseContinuity<T>,
}

impl<T: Float> SpectralChannel<T> {
    /// An uninitialized channel: all-zero window and no FFT tables.  Produces
    /// silence until [SpectralChannel::init] is called.
    pub const fn new() -> Self {
        Self {
            context: Context::new(T::ZERO),
            settings: ChannelSettings::new(),
            hop: HopSize::Samples256,
            frame_hop: HopSize::Samples256,
            hop_counter: 0,
            primed: false,
            window: [T::ZERO; FFT_SIZE],
            overlap_inv: [T::ONE; FFT_SIZE],
            input: RingBuffer::new(),
            output: RingBuffer::new(),
            fft: FftPlan::new(),
            fft_re: [T::ZERO; FFT_SIZE],
            fft_im: [T::ZERO; FFT_SIZE],
            frame: SpectralFrame::new(),
            dry_re: [T::ZERO; NUM_BINS],
            dry_im: [T::ZERO; NUM_BINS],
            vocoder: PhaseContinuity::new(),
        }
    }
    /// Build the FFT tables, copy `window` and reset all state
    pub fn init(&mut self, context: Context<T>, window: &WindowTable<T>) {
        self.context = context;
        self.fft.init();
        log::debug!(
            "spectral channel init: {} Hz, hop {}",
            context.sample_rate_hz(),
            self.hop.samples()
        );
        self.set_window(window);
    }
    /// Replace the analysis/synthesis window.  Resets all state.
    pub fn set_window(&mut self, window: &WindowTable<T>) {
        self.window = *window;
        self.rebuild_overlap();
        self.reset();
    }
    /// Change the hop.  Resets all state, even if the hop is unchanged.
    pub fn set_hop_size(&mut self, hop: HopSize) {
        log::debug!("hop size {} -> {}", self.hop.samples(), hop.samples());
        self.hop = hop;
        self.rebuild_overlap();
        self.reset();
    }
    /// Clear the sample history, the overlap-add accumulator and all per-bin
    /// state.  The next `hop` outputs will be silence.
    pub fn reset(&mut self) {
        self.input.clear();
        self.output.clear();
        self.hop_counter = 0;
        self.primed = false;
        self.frame.clear();
        self.vocoder.reset();
    }
    /// The requested hop
    pub fn hop_size(&self) -> HopSize {
        self.hop
    }
    /// The hop frames are actually taken at.  Smaller than [Self::hop_size]
    /// when the window cannot be normalized at the requested hop (see
    /// [build_overlap_table]).
    pub fn frame_hop(&self) -> HopSize {
        self.frame_hop
    }
    /// The processing context given to [SpectralChannel::init]
    pub fn context(&self) -> &Context<T> {
        &self.context
    }
    /// The current post-processing settings
    pub fn settings(&self) -> &ChannelSettings<T> {
        &self.settings
    }
    /// Replace the post-processing settings.  Takes effect on the next frame.
    pub fn set_settings(&mut self, settings: ChannelSettings<T>) {
        if settings.phase_continuity && !self.settings.phase_continuity {
            self.vocoder.reset();
        }
        self.settings = settings;
    }
    /// True once the first frame has been synthesized
    pub fn is_primed(&self) -> bool {
        self.primed
    }
    /// Input to output delay, in samples
    pub const fn latency(&self) -> usize {
        FFT_SIZE
    }
    /// The overlap-add normalization applied to output samples at hop phase
    /// `i`
    pub fn overlap_norm(&self, i: usize) -> T {
        self.overlap_inv[i % self.frame_hop.samples()]
    }
    /// Process one sample.  `effect` and `params` are read once per hop, when
    /// a frame is due.
    pub fn process_sample(&mut self, input: T, effect: Effect, params: &EffectParams<T>) -> T {
        self.input.push(input);
        let output = if self.primed {
            self.output.pop_and_clear()
        } else {
            T::ZERO
        };
        self.hop_counter += 1;
        if self.hop_counter >= self.frame_hop.samples() {
            self.hop_counter = 0;
            self.process_frame(effect, params);
        }
        output
    }
    /// Process a block of samples with constant controls.  Processes
    /// `min(input.len(), output.len())` samples.
    pub fn process_block(
        &mut self,
        input: &[T],
        output: &mut [T],
        effect: Effect,
        params: &EffectParams<T>,
    ) {
        for (smp_in, smp_out) in input.iter().zip(output.iter_mut()) {
            *smp_out = self.process_sample(*smp_in, effect, params);
        }
    }
    fn rebuild_overlap(&mut self) {
        self.frame_hop = build_overlap_table(&self.window, self.hop, &mut self.overlap_inv);
        if self.frame_hop != self.hop {
            log::debug!(
                "hop {} does not overlap this window, framing at {}",
                self.hop.samples(),
                self.frame_hop.samples()
            );
        }
    }
    fn process_frame(&mut self, effect: Effect, params: &EffectParams<T>) {
        let hop = self.frame_hop.samples();
        for (i, smp) in self.input.oldest_first().enumerate() {
            self.fft_re[i] = self.window[i] * smp;
            self.fft_im[i] = T::ZERO;
        }
        self.fft
            .execute(&mut self.fft_re, &mut self.fft_im, Direction::Forward);
        unpack_spectrum(
            &self.fft_re,
            &self.fft_im,
            &mut self.frame.re,
            &mut self.frame.im,
        );
        self.dry_re = self.frame.re;
        self.dry_im = self.frame.im;

        self.frame.frame_period = self.context.frame_period(hop);
        effect.process(&mut self.frame, params);
        if self.settings.phase_continuity {
            self.vocoder.apply(&mut self.frame, hop);
        }
        self.apply_post_stages();
        self.frame.enforce_real_edges();

        pack_spectrum(
            &self.frame.re,
            &self.frame.im,
            &mut self.fft_re,
            &mut self.fft_im,
        );
        self.fft
            .execute(&mut self.fft_re, &mut self.fft_im, Direction::Inverse);

        let gain = self.settings.ifft_gain * self.settings.ola_gain;
        let frame_start = self.output.write_index();
        for i in 0..FFT_SIZE {
            let norm = self.overlap_inv[(frame_start + i) % hop];
            self.output
                .accumulate(i, self.fft_re[i] * self.window[i] * norm * gain);
        }
        self.output.advance_write(hop);
        if !self.primed {
            self.output.set_read_index(frame_start);
            self.primed = true;
        }
    }
    fn apply_post_stages(&mut self) {
        let settings = self.settings;
        let frame = &mut self.frame;
        if settings.limit {
            let max_scale = T::from_f32(MAX_SCALE);
            for k in 0..NUM_BINS {
                let dry = self.dry_re[k].hypot(self.dry_im[k]);
                let cap = if dry < T::MIN_MAG {
                    T::ZERO
                } else {
                    dry * max_scale
                };
                let wet = frame.re[k].hypot(frame.im[k]);
                if wet > cap {
                    let scale = if wet > T::DIV_GUARD { cap / wet } else { T::ZERO };
                    frame.scale_bin(k, scale);
                }
            }
        }
        if settings.normalize {
            let dry_energy = self
                .dry_re
                .iter()
                .zip(self.dry_im.iter())
                .fold(T::ZERO, |acc, (re, im)| acc + *re * *re + *im * *im);
            let wet_energy = frame.energy();
            if wet_energy > dry_energy && wet_energy > T::DIV_GUARD {
                let scale = (dry_energy / wet_energy).sqrt();
                for k in 0..NUM_BINS {
                    frame.scale_bin(k, scale);
                }
            }
        }
        let preserve = settings.preserve.clamped(T::ZERO, T::ONE);
        if preserve > T::ZERO {
            let keep = T::ONE - preserve;
            for k in 0..NUM_BINS {
                frame.re[k] = frame.re[k] * keep + self.dry_re[k] * preserve;
                frame.im[k] = frame.im[k] * keep + self.dry_im[k] * preserve;
            }
        }
        if settings.spectral_gain != T::ONE {
            for k in 0..NUM_BINS {
                frame.scale_bin(k, settings.spectral_gain);
            }
        }
    }
}

impl<T: Float> Default for SpectralChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> Device<T> for SpectralChannel<T> {
    type Input = T;
    type Params = ChannelParams<T>;
    type Output = T;
    fn next(&mut self, input: T, params: ChannelParams<T>) -> T {
        self.process_sample(input, params.effect, &params.controls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::measure_thd;
    use crate::window::WindowShape;

    fn channel(hop: HopSize) -> Box<SpectralChannel<f32>> {
        let mut ret = Box::new(SpectralChannel::new());
        ret.set_hop_size(hop);
        ret.init(Context::default(), &WindowShape::SqrtHann.build(0.0));
        ret
    }

    fn noise(len: usize, seed: u64) -> Vec<f32> {
        let mut rng = oorandom::Rand32::new(seed);
        (0..len).map(|_| rng.rand_float() - 0.5).collect()
    }

    fn sine(len: usize, freq: f64, amp: f64) -> Vec<f32> {
        (0..len)
            .map(|i| (amp * (core::f64::consts::TAU * freq * i as f64 / 48000.0).sin()) as f32)
            .collect()
    }

    #[test]
    fn overlap_table_for_sqrt_hann() {
        for hop in HopSize::sizes() {
            let chan = channel(*hop);
            let frame_hop = chan.frame_hop();
            // sum of hann over N/hop frames is N/(2 hop)
            let expected = 2.0 * frame_hop.samples() as f32 / FFT_SIZE as f32;
            for i in 0..frame_hop.samples() {
                assert!((chan.overlap_norm(i) - expected).abs() < 1e-4, "{:?}", hop);
            }
        }
        // a single hann frame has no usable overlap
        assert_eq!(channel(HopSize::Samples1024).frame_hop(), HopSize::Samples512);
    }

    #[test]
    fn frame_hop_follows_window_overlap() {
        let mut out = [0f32; FFT_SIZE];
        let rect = WindowShape::Rect.build(0.0f32);
        assert_eq!(
            build_overlap_table(&rect, HopSize::Samples1024, &mut out),
            HopSize::Samples1024
        );
        assert!(out[..FFT_SIZE].iter().all(|x| *x == 1.0));
        for shape in WindowShape::shapes().iter().filter(|s| **s != WindowShape::Rect) {
            let window = shape.build(6.0f32);
            for hop in HopSize::sizes() {
                let frame_hop = build_overlap_table(&window, *hop, &mut out);
                assert!(frame_hop.samples() <= 512, "{:?}", shape);
                assert!(frame_hop.samples() <= hop.samples());
                let hi = (0..frame_hop.samples())
                    .map(|i| 1.0 / out[i])
                    .fold(0f32, f32::max);
                for x in &out[..frame_hop.samples()] {
                    assert!(x.is_finite() && *x * hi <= 1.0 / MIN_OVERLAP_RATIO + 1e-3);
                }
            }
        }
        let silent = [0f32; FFT_SIZE];
        assert_eq!(
            build_overlap_table(&silent, HopSize::Samples1024, &mut out),
            HopSize::Samples1024
        );
        assert!(out.iter().all(|x| *x == 1.0));
    }

    #[test]
    fn priming_and_latency() {
        for hop in HopSize::sizes() {
            let mut chan = channel(*hop);
            let frame_hop = chan.frame_hop().samples();
            let params = EffectParams::default();
            let mut out = Vec::new();
            for n in 0..3 * FFT_SIZE {
                let input = if n == 300 { 1.0 } else { 0.0 };
                out.push(chan.process_sample(input, Effect::Thru, &params));
                assert_eq!(chan.is_primed(), n + 1 >= frame_hop);
            }
            assert!(out[..frame_hop].iter().all(|x| *x == 0.0));
            for (n, y) in out.iter().enumerate() {
                let expected = if n == 300 + FFT_SIZE { 1.0 } else { 0.0 };
                assert!((y - expected).abs() < 1e-4, "{:?} sample {}", hop, n);
            }
        }
    }

    #[test]
    fn thru_is_unity_gain() {
        let mut chan = channel(HopSize::Samples256);
        let input = noise(8 * FFT_SIZE, 99);
        let mut output = vec![0f32; input.len()];
        chan.process_block(&input, &mut output, Effect::Thru, &EffectParams::default());
        for n in FFT_SIZE..input.len() {
            assert!((output[n] - input[n - FFT_SIZE]).abs() < 1e-4);
        }
    }

    #[test]
    fn thru_is_unity_gain_for_every_window_and_hop() {
        let input = noise(6 * FFT_SIZE, 41);
        for shape in WindowShape::shapes() {
            for hop in HopSize::sizes() {
                let mut chan = Box::new(SpectralChannel::<f32>::new());
                chan.set_hop_size(*hop);
                chan.init(Context::default(), &shape.build(6.0));
                let mut output = vec![0f32; input.len()];
                chan.process_block(&input, &mut output, Effect::Thru, &EffectParams::default());
                for n in 2 * FFT_SIZE..input.len() {
                    assert!(
                        (output[n] - input[n - FFT_SIZE]).abs() < 1e-3,
                        "{:?} {:?} sample {}",
                        shape,
                        hop,
                        n
                    );
                }
            }
        }
    }

    #[test]
    fn no_overlap_hop_does_not_amplify() {
        let input: Vec<f32> = noise(48000, 17).iter().map(|x| 0.5 * x).collect();
        let params = EffectParams { time: 0.2, vibe: 0.5 };
        for shape in [WindowShape::SqrtHann, WindowShape::Hann, WindowShape::BlackmanHarris] {
            let mut chan = Box::new(SpectralChannel::<f32>::new());
            chan.set_hop_size(HopSize::Samples1024);
            chan.init(Context::default(), &shape.build(0.0));
            let mut output = vec![0f32; input.len()];
            chan.process_block(&input, &mut output, Effect::Smear, &params);
            let peak = output.iter().fold(0f32, |acc, x| acc.max(x.abs()));
            assert!(peak < 1.5, "{:?} peak {}", shape, peak);
        }
    }

    #[test]
    fn hop_change_matches_fresh_channel() {
        let params = EffectParams { time: 0.2, vibe: 0.3 };
        let mut reused = channel(HopSize::Samples256);
        let warm = noise(5000, 1);
        let mut scratch = vec![0f32; warm.len()];
        reused.process_block(&warm, &mut scratch, Effect::Smear, &params);
        reused.set_hop_size(HopSize::Samples512);

        let mut fresh = channel(HopSize::Samples512);
        let input = noise(6000, 2);
        let mut out_reused = vec![0f32; input.len()];
        let mut out_fresh = vec![0f32; input.len()];
        reused.process_block(&input, &mut out_reused, Effect::Smear, &params);
        fresh.process_block(&input, &mut out_fresh, Effect::Smear, &params);
        assert_eq!(out_reused, out_fresh);
    }

    #[test]
    fn preserve_restores_dry_signal() {
        let mut chan = channel(HopSize::Samples256);
        chan.set_settings(ChannelSettings {
            preserve: 1.0,
            ..Default::default()
        });
        let input = noise(6 * FFT_SIZE, 5);
        let mut output = vec![0f32; input.len()];
        let params = EffectParams { time: 0.1, vibe: 1.0 };
        chan.process_block(&input, &mut output, Effect::Shift, &params);
        for n in FFT_SIZE..input.len() {
            assert!((output[n] - input[n - FFT_SIZE]).abs() < 1e-4);
        }
    }

    #[test]
    fn gains_scale_output() {
        let mut chan = channel(HopSize::Samples256);
        chan.set_settings(ChannelSettings {
            spectral_gain: 0.5,
            ola_gain: 0.5,
            ..Default::default()
        });
        let input = noise(4 * FFT_SIZE, 6);
        let mut output = vec![0f32; input.len()];
        chan.process_block(&input, &mut output, Effect::Thru, &EffectParams::default());
        for n in FFT_SIZE..input.len() {
            assert!((output[n] - 0.25 * input[n - FFT_SIZE]).abs() < 1e-4);
        }
    }

    #[test]
    fn limit_caps_boosted_bins() {
        let mut chan = channel(HopSize::Samples256);
        chan.set_settings(ChannelSettings {
            limit: true,
            normalize: true,
            ..Default::default()
        });
        let input = noise(6 * FFT_SIZE, 8);
        let mut output = vec![0f32; input.len()];
        let params = EffectParams { time: 0.01, vibe: 0.5 };
        chan.process_block(&input, &mut output, Effect::Smear, &params);
        let rms_in = (input.iter().map(|x| x * x).sum::<f32>() / input.len() as f32).sqrt();
        let tail = &output[2 * FFT_SIZE..];
        let rms_out = (tail.iter().map(|x| x * x).sum::<f32>() / tail.len() as f32).sqrt();
        assert!(rms_out <= rms_in * 1.1);
        assert!(output.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn all_zero_input_is_silent() {
        for effect in Effect::effects() {
            let mut chan = channel(HopSize::Samples256);
            chan.set_settings(ChannelSettings {
                phase_continuity: true,
                ..Default::default()
            });
            let params = EffectParams { time: 0.5, vibe: 0.5 };
            for _ in 0..3 * 256 {
                let y = chan.process_sample(0.0, *effect, &params);
                assert_eq!(y, 0.0, "{:?}", effect);
            }
        }
    }

    #[test]
    fn device_interface_matches_process_sample() {
        let input = noise(2 * FFT_SIZE, 12);
        let params = ChannelParams {
            effect: Effect::Tilt,
            controls: EffectParams { time: 0.3, vibe: 0.9 },
        };
        let mut a = channel(HopSize::Samples128);
        let via_device: Vec<f32> = a.process_with(input.iter().copied(), params).collect();
        let mut b = channel(HopSize::Samples128);
        let mut direct = vec![0f32; input.len()];
        b.process_block(&input, &mut direct, params.effect, &params.controls);
        assert_eq!(via_device, direct);
    }

    const SECONDS: usize = 2;
    const WARMUP: usize = FFT_SIZE * 4;
    const CAPTURE: usize = 48000;

    fn render_tone(effect: Effect) -> Vec<f32> {
        let mut chan = channel(HopSize::Samples256);
        let input = sine(48000 * SECONDS, 1000.0, 0.2);
        let mut output = vec![0f32; input.len()];
        let params = EffectParams { time: 1.0, vibe: 0.5 };
        chan.process_block(&input, &mut output, effect, &params);
        output[WARMUP..WARMUP + CAPTURE].to_vec()
    }

    #[test]
    fn thru_tone_is_clean() {
        let result = measure_thd(&render_tone(Effect::Thru), 48000.0, 1000.0, 5);
        let expected = 0.2 / core::f32::consts::SQRT_2;
        assert!((result.rms - expected).abs() < 0.01 * expected);
        assert!(result.thdn < 0.01);
    }

    #[test]
    fn smear_tone_stays_musical() {
        let result = measure_thd(&render_tone(Effect::Smear), 48000.0, 1000.0, 5);
        assert!(result.rms >= 0.01 && result.rms <= 0.2, "{:?}", result);
        assert!(result.fund_rms >= 0.02, "{:?}", result);
        let harmonics: f32 = result.harmonics[1..].iter().sum();
        assert!(harmonics <= 0.5 * result.fund_rms, "{:?}", result);
    }
}
