//! The stereo notch/correlator: two STFT channels driven by one hop counter,
//! with a comb of spectral notches and cross-channel blending.

use crate::channel::{build_overlap_table, HopSize};
use crate::context::Context;
use crate::device::Device;
use crate::fft::{pack_spectrum, unpack_spectrum, Direction, FftPlan};
use crate::ring::RingBuffer;
use crate::util::phase_delta;
use crate::window::WindowTable;
use crate::{Float, FFT_SIZE, NUM_BINS, OUTPUT_RING_SIZE};
use serde::{Deserialize, Serialize};

/// Bins closer than this to a notch center are attenuated by up to this
/// fraction
const NOTCH_DEPTH: f32 = 0.98;
/// Notch spacing, in bins, at a notch distance of 1
const MAX_SPACING: f32 = 240.0;
/// The highest pass-through cutoff, in Hz
const MAX_CUTOFF_HZ: f32 = 300.0;

/// Control values for [StereoSpectral]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = ""))]
pub struct NotchParams<T: Float> {
    /// Spacing between notches, `0..=1` (times 240 bins)
    pub notch_distance: T,
    /// Offset of the notch comb, in units of the spacing
    pub phase_offset: T,
    /// How far the LFO moves the comb
    pub lfo_depth: T,
    /// Quantize bin positions before the notch lookup, `0..=1`
    pub bin_rounding: T,
    /// Notch width, `0..=1`
    pub blur: T,
    /// Bins at or below this frequency (Hz, `0..=300`) are left untouched
    pub cutoff_hz: T,
    /// Magnitude and phase blend between the two channels, `0..=1`
    pub xmix: T,
    /// Complex blend between the two channels, `0..=1`
    pub crossover: T,
}

impl<T: Float> NotchParams<T> {
    /// Default control values: a wide comb above 100 Hz with no blending
    pub fn new() -> Self {
        Self {
            notch_distance: T::ONE_HALF,
            phase_offset: T::ZERO,
            lfo_depth: T::ZERO,
            bin_rounding: T::ZERO,
            blur: T::ONE_HALF,
            cutoff_hz: T::from_u16(100),
            xmix: T::ZERO,
            crossover: T::ZERO,
        }
    }
}

impl<T: Float> Default for NotchParams<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The per-sample parameters of [StereoSpectral] when used as a [Device]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StereoParams<T: Float> {
    /// Notch and blend controls
    pub notch: NotchParams<T>,
    /// The current LFO value, nominally `-1..=1`
    pub lfo: T,
    /// The requested hop
    pub hop: HopSize,
}

/// A stereo STFT processor applying a notch comb and cross-channel blends.
///
/// Both channels share one hop counter, so their frames always line up.
/// Latency is [FFT_SIZE] samples, as for [crate::channel::SpectralChannel].
#[derive(Clone)]
pub struct StereoSpectral<T: Float> {
    context: Context<T>,
    hop: HopSize,
    frame_hop: HopSize,
    hop_counter: usize,
    primed: bool,
    window: WindowTable<T>,
    overlap_inv: [T; FFT_SIZE],
    input: [RingBuffer<T, FFT_SIZE>; 2],
    output: [RingBuffer<T, OUTPUT_RING_SIZE>; 2],
    fft: FftPlan<T>,
    fft_re: [T; FFT_SIZE],
    fft_im: [T; FFT_SIZE],
    re: [[T; NUM_BINS]; 2],
    im: [[T; NUM_BINS]; 2],
}

impl<T: Float> StereoSpectral<T> {
    /// An uninitialized processor.  Produces silence until
    /// [StereoSpectral::init] is called.
    pub const fn new() -> Self {
        Self {
            context: Context::new(T::ZERO),
            hop: HopSize::Samples256,
            frame_hop: HopSize::Samples256,
            hop_counter: 0,
            primed: false,
            window: [T::ZERO; FFT_SIZE],
            overlap_inv: [T::ONE; FFT_SIZE],
            input: [RingBuffer::new(), RingBuffer::new()],
            output: [RingBuffer::new(), RingBuffer::new()],
            fft: FftPlan::new(),
            fft_re: [T::ZERO; FFT_SIZE],
            fft_im: [T::ZERO; FFT_SIZE],
            re: [[T::ZERO; NUM_BINS]; 2],
            im: [[T::ZERO; NUM_BINS]; 2],
        }
    }
    /// Build the FFT tables, copy `window` (the module itself runs a Hann
    /// window) and reset all state
    pub fn init(&mut self, context: Context<T>, window: &WindowTable<T>) {
        self.context = context;
        self.fft.init();
        log::debug!(
            "stereo spectral init: {} Hz, hop {}",
            context.sample_rate_hz(),
            self.hop.samples()
        );
        self.set_window(window);
    }
    /// Replace the window of both channels.  Resets all state.
    pub fn set_window(&mut self, window: &WindowTable<T>) {
        self.window = *window;
        self.rebuild_overlap();
        self.reset();
    }
    /// Change the hop of both channels.  Resets all state.
    pub fn set_hop_size(&mut self, hop: HopSize) {
        log::debug!("stereo hop size {} -> {}", self.hop.samples(), hop.samples());
        self.hop = hop;
        self.rebuild_overlap();
        self.reset();
    }
    fn rebuild_overlap(&mut self) {
        self.frame_hop = build_overlap_table(&self.window, self.hop, &mut self.overlap_inv);
    }
    /// Clear the history and the overlap-add accumulators of both channels
    pub fn reset(&mut self) {
        for ring in self.input.iter_mut() {
            ring.clear();
        }
        for ring in self.output.iter_mut() {
            ring.clear();
        }
        self.hop_counter = 0;
        self.primed = false;
    }
    /// The requested hop
    pub fn hop_size(&self) -> HopSize {
        self.hop
    }
    /// The hop frames are actually taken at (see [build_overlap_table])
    pub fn frame_hop(&self) -> HopSize {
        self.frame_hop
    }
    /// True once the first frame has been synthesized
    pub fn is_primed(&self) -> bool {
        self.primed
    }
    /// The highest bin passed through unprocessed for a cutoff of
    /// `cutoff_hz`
    pub fn cutoff_bin(&self, cutoff_hz: T) -> usize {
        let hz = cutoff_hz.clamped(T::ZERO, T::from_f32(MAX_CUTOFF_HZ));
        let bin = (self.context.bin_for_frequency(hz) + T::ONE_HALF).to_index();
        bin.min(NUM_BINS - 1)
    }
    /// Process one stereo sample.  A `hop` different from the current one
    /// resets both channels before the sample is taken.
    pub fn process_sample(
        &mut self,
        left: T,
        right: T,
        params: &NotchParams<T>,
        lfo: T,
        hop: HopSize,
    ) -> (T, T) {
        if hop != self.hop {
            self.set_hop_size(hop);
        }
        self.input[0].push(left);
        self.input[1].push(right);
        let output = if self.primed {
            (self.output[0].pop_and_clear(), self.output[1].pop_and_clear())
        } else {
            (T::ZERO, T::ZERO)
        };
        self.hop_counter += 1;
        if self.hop_counter >= self.frame_hop.samples() {
            self.hop_counter = 0;
            self.process_frame(params, lfo);
        }
        output
    }
    fn process_frame(&mut self, params: &NotchParams<T>, lfo: T) {
        for ch in 0..2 {
            for (i, smp) in self.input[ch].oldest_first().enumerate() {
                self.fft_re[i] = self.window[i] * smp;
                self.fft_im[i] = T::ZERO;
            }
            self.fft
                .execute(&mut self.fft_re, &mut self.fft_im, Direction::Forward);
            unpack_spectrum(
                &self.fft_re,
                &self.fft_im,
                &mut self.re[ch],
                &mut self.im[ch],
            );
        }

        let cutoff = self.cutoff_bin(params.cutoff_hz);
        self.apply_notches(params, lfo, cutoff);
        self.apply_xmix(params.xmix, cutoff);
        self.apply_crossover(params.crossover, cutoff);

        let hop = self.frame_hop.samples();
        for ch in 0..2 {
            pack_spectrum(
                &self.re[ch],
                &self.im[ch],
                &mut self.fft_re,
                &mut self.fft_im,
            );
            self.fft
                .execute(&mut self.fft_re, &mut self.fft_im, Direction::Inverse);
            let frame_start = self.output[ch].write_index();
            for i in 0..FFT_SIZE {
                let norm = self.overlap_inv[(frame_start + i) % hop];
                self.output[ch].accumulate(i, self.fft_re[i] * self.window[i] * norm);
            }
            self.output[ch].advance_write(hop);
            if !self.primed {
                self.output[ch].set_read_index(frame_start);
            }
        }
        self.primed = true;
    }
    fn apply_notches(&mut self, params: &NotchParams<T>, lfo: T, cutoff: usize) {
        let spacing = (T::from_f32(MAX_SPACING) * params.notch_distance).max(T::ONE);
        let shift = (params.phase_offset + lfo * params.lfo_depth * T::from_u16(4)) * spacing;
        let rounding = T::ONE + (T::from_u16(24) * params.bin_rounding.max(T::ZERO)).floor();
        let sigma = (T::from_f32(0.3) + params.blur * T::from_f32(0.7) * spacing)
            .clamped(T::from_f32(0.3), spacing);
        let two_sigma_sq = T::TWO * sigma * sigma;
        let depth = T::from_f32(NOTCH_DEPTH);
        for k in (cutoff + 1)..NUM_BINS {
            let position = (T::from_usize(k) / rounding).round() * rounding + shift;
            let center = (position / spacing).round() * spacing;
            let dist = position - center;
            let gain = T::ONE - depth * (-(dist * dist) / two_sigma_sq).exp();
            for ch in 0..2 {
                self.re[ch][k] = self.re[ch][k] * gain;
                self.im[ch][k] = self.im[ch][k] * gain;
            }
        }
    }
    fn apply_xmix(&mut self, xmix: T, cutoff: usize) {
        let xmix = xmix.clamped(T::ZERO, T::ONE);
        if xmix <= T::ZERO {
            return;
        }
        let keep = T::ONE - xmix;
        for k in (cutoff + 1)..NUM_BINS {
            let mag_l = self.re[0][k].hypot(self.im[0][k]);
            let mag_r = self.re[1][k].hypot(self.im[1][k]);
            let phase_l = self.im[0][k].fatan2(self.re[0][k]);
            let phase_r = self.im[1][k].fatan2(self.re[1][k]);
            let new_mag_l = mag_l * keep + mag_r * xmix;
            let new_mag_r = mag_r * keep + mag_l * xmix;
            let new_phase_l = phase_l + phase_delta(phase_l, phase_r) * xmix;
            let new_phase_r = phase_r + phase_delta(phase_r, phase_l) * xmix;
            self.re[0][k] = new_mag_l * new_phase_l.fcos();
            self.im[0][k] = new_mag_l * new_phase_l.fsin();
            self.re[1][k] = new_mag_r * new_phase_r.fcos();
            self.im[1][k] = new_mag_r * new_phase_r.fsin();
        }
        self.clear_edge_imaginary();
    }
    fn apply_crossover(&mut self, crossover: T, cutoff: usize) {
        let crossover = crossover.clamped(T::ZERO, T::ONE);
        if crossover <= T::ZERO {
            return;
        }
        let keep = T::ONE - crossover;
        for k in (cutoff + 1)..NUM_BINS {
            let (re_l, im_l) = (self.re[0][k], self.im[0][k]);
            let (re_r, im_r) = (self.re[1][k], self.im[1][k]);
            self.re[0][k] = re_l * keep + re_r * crossover;
            self.im[0][k] = im_l * keep + im_r * crossover;
            self.re[1][k] = re_r * keep + re_l * crossover;
            self.im[1][k] = im_r * keep + im_l * crossover;
        }
    }
    fn clear_edge_imaginary(&mut self) {
        for ch in 0..2 {
            self.im[ch][0] = T::ZERO;
            self.im[ch][NUM_BINS - 1] = T::ZERO;
        }
    }
}

impl<T: Float> Default for StereoSpectral<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> Device<T> for StereoSpectral<T> {
    type Input = (T, T);
    type Params = StereoParams<T>;
    type Output = (T, T);
    fn next(&mut self, input: (T, T), params: StereoParams<T>) -> (T, T) {
        self.process_sample(input.0, input.1, &params.notch, params.lfo, params.hop)
    }
}
