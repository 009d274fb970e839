//! The stereo engine: per-channel wave shaping into the notch/correlator,
//! an internal LFO sweeping the notch comb, and a latency-aligned dry/wet
//! mix.

use crate::channel::HopSize;
use crate::context::Context;
use crate::distortion::{DistortionChannel, DistortionSettings};
use crate::lfo::{rate_to_hz, Lfo, LfoParams, LfoWave};
use crate::ring::RingBuffer;
use crate::stereo::{NotchParams, StereoSpectral};
use crate::window::{WindowShape, WindowTable};
use crate::{Float, FFT_SIZE};
use serde::{Deserialize, Serialize};

/// Everything the front panel can change on a [StereoEngine]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = ""))]
pub struct StereoEngineSettings<T: Float> {
    /// Notch comb and cross-channel controls
    pub notch: NotchParams<T>,
    /// Dry/wet mix, `0..=1`
    pub mix: T,
    /// LFO rate control, `0..=1` (0.05 Hz to 5.05 Hz)
    pub lfo_rate: T,
    /// LFO waveform
    pub lfo_wave: LfoWave,
    /// Wavefolder control, `0..=1`
    pub wave: T,
    /// Overdrive control, `0..=1`
    pub overdrive: T,
    /// Block size selector: 0 (hop 128), 1 (hop 256), anything else (hop 512)
    pub block_size: u8,
}

impl<T: Float> StereoEngineSettings<T> {
    /// The power-on settings
    pub fn new() -> Self {
        Self {
            notch: NotchParams::new(),
            mix: T::ONE,
            lfo_rate: T::POINT_TWO,
            lfo_wave: LfoWave::Sine,
            wave: T::ZERO,
            overdrive: T::ZERO,
            block_size: 0,
        }
    }
    /// The hop selected by [Self::block_size]
    pub fn hop(&self) -> HopSize {
        HopSize::from_block_size_index(self.block_size as usize)
    }
}

impl<T: Float> Default for StereoEngineSettings<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Wave shaping, the stereo notch/correlator and its LFO.
///
/// Large, like [StereoSpectral]: construct it with [StereoEngine::new] into
/// static storage and call [StereoEngine::init] in place.
#[derive(Clone)]
pub struct StereoEngine<T: Float> {
    lfo: Lfo<T>,
    lfo_value: T,
    distortion: [DistortionChannel<T>; 2],
    spectral: StereoSpectral<T>,
    dry: [RingBuffer<T, FFT_SIZE>; 2],
}

impl<T: Float> StereoEngine<T> {
    /// An uninitialized engine.  Produces silence until
    /// [StereoEngine::init] is called.
    pub const fn new() -> Self {
        Self {
            lfo: Lfo::new(Context::new(T::ZERO)),
            lfo_value: T::ZERO,
            distortion: [DistortionChannel::new(), DistortionChannel::new()],
            spectral: StereoSpectral::new(),
            dry: [RingBuffer::new(), RingBuffer::new()],
        }
    }
    /// Initialize with the Hann window and reset all state
    pub fn init(&mut self, context: Context<T>) {
        let window: WindowTable<T> = WindowShape::Hann.build(T::ZERO);
        log::info!("stereo engine init: {} Hz", context.sample_rate_hz());
        self.lfo = Lfo::new(context);
        self.lfo_value = T::ZERO;
        for chan in self.distortion.iter_mut() {
            chan.reset();
        }
        for ring in self.dry.iter_mut() {
            ring.clear();
        }
        self.spectral.init(context, &window);
    }
    /// The spectral stage
    pub fn spectral(&self) -> &StereoSpectral<T> {
        &self.spectral
    }
    /// The last LFO value handed to the spectral stage
    pub fn lfo_value(&self) -> T {
        self.lfo_value
    }
    /// The makeup gains of the two shapers
    pub fn makeup_gains(&self) -> [T; 2] {
        [self.distortion[0].makeup(), self.distortion[1].makeup()]
    }
    /// Process one block.  Processes as many samples as the shortest of the
    /// four slices holds.  The shapers' makeup gains adapt once per block.
    pub fn process_block(
        &mut self,
        settings: &StereoEngineSettings<T>,
        input: [&[T]; 2],
        output: [&mut [T]; 2],
    ) {
        let len = input
            .iter()
            .map(|x| x.len())
            .chain(output.iter().map(|x| x.len()))
            .min()
            .unwrap_or(0);
        let shaping = DistortionSettings::from_controls(settings.wave, settings.overdrive);
        let lfo = LfoParams {
            freq: rate_to_hz(settings.lfo_rate),
            wave: settings.lfo_wave,
        };
        let mix = settings.mix.clamped(T::ZERO, T::ONE);
        let hop = settings.hop();
        for i in 0..len {
            let shaped = [0, 1].map(|ch| self.distortion[ch].process(input[ch][i], &shaping));
            self.lfo_value = self.lfo.next_value(&lfo);
            let wet = self.spectral.process_sample(
                shaped[0],
                shaped[1],
                &settings.notch,
                self.lfo_value,
                hop,
            );
            let wet = [wet.0, wet.1];
            for ch in 0..2 {
                let dry = self.dry[ch].delay(input[ch][i]);
                output[ch][i] = dry * (T::ONE - mix) + wet[ch] * mix;
            }
        }
        for chan in self.distortion.iter_mut() {
            chan.end_block();
        }
    }
}

impl<T: Float> Default for StereoEngine<T> {
    fn default() -> Self {
        Self::new()
    }
}
