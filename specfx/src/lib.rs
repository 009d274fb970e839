//! This crate contains the DSP logic of a real-time spectral effects module:
//! a short-time Fourier transform framework (windowed analysis, a family of
//! per-frame spectral effects, and weighted overlap-add resynthesis) sized
//! and structured for embedded targets.  It is `no_std`, never allocates,
//! and every processor can be built in a `static` with a `const fn new()`
//! and initialized in place.
//!
//! Most users want [channel::SpectralChannel] (one mono channel),
//! [stereo::StereoSpectral] (the stereo notch/correlator),
//! [engine::DualMonoEngine] (two channels plus the input/output
//! conditioning of the hardware module) or
//! [stereo_engine::StereoEngine] (wave shaping and an LFO around the
//! notch/correlator).
//!
//! All processors are generic over [Float], implemented for `f32` and `f64`.
//! With the `fast-trig` feature the per-bin trigonometry uses polynomial
//! approximations instead of `libm`; the FFT tables always use exact values.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

mod float_approx;
mod float_traits;
pub use float_traits::Float;

pub mod util;

pub mod analysis;
pub mod channel;
pub mod context;
pub mod controls;
pub mod device;
pub mod distortion;
pub mod effects;
pub mod engine;
pub mod fft;
pub mod frame;
pub mod lfo;
pub mod phase_vocoder;
pub mod ring;
pub mod stereo;
pub mod stereo_engine;
pub mod window;

pub use channel::{ChannelSettings, HopSize, SpectralChannel};
pub use context::Context;
pub use device::Device;
pub use effects::{Effect, EffectParams};
pub use engine::{DualMonoEngine, EngineSettings, WetClamp};
pub use lfo::LfoWave;
pub use stereo::{NotchParams, StereoSpectral};
pub use stereo_engine::{StereoEngine, StereoEngineSettings};
pub use window::WindowShape;

/// True if using the internal polynomial approximations for per-bin
/// trigonometry, false if using libm
pub const USE_FAST_TRIG: bool = cfg!(feature = "fast-trig");

/// Samples per analysis frame
pub const FFT_SIZE: usize = 1024;
/// Bins in the one-sided spectrum of a frame, DC and Nyquist included
pub const NUM_BINS: usize = FFT_SIZE / 2 + 1;
/// Capacity of the overlap-add output ring
pub const OUTPUT_RING_SIZE: usize = 4096;

const _: () = assert!(FFT_SIZE.is_power_of_two());
const _: () = assert!(FFT_SIZE <= u16::MAX as usize);
const _: () = assert!(OUTPUT_RING_SIZE >= 4 * FFT_SIZE);
const _: () = assert!(OUTPUT_RING_SIZE % FFT_SIZE == 0);
const _: () = assert!(HopSize::Samples1024.samples() <= FFT_SIZE);
