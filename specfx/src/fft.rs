//! In-place radix-2 FFT for the fixed frame size [FFT_SIZE], plus helpers to
//! move between the full complex array and the `N/2 + 1` bin half spectrum.
//!
//! Scaling convention: [Direction::Forward] multiplies the result by `1/N`,
//! [Direction::Inverse] applies no scaling.  `inverse(forward(x)) == x`, and a
//! cosine of amplitude `a` that lands exactly on bin `k` reads as `a/2` in
//! that bin.

use crate::{Float, FFT_SIZE, NUM_BINS};

const HALF_SIZE: usize = FFT_SIZE / 2;
const LOG2_SIZE: u32 = FFT_SIZE.trailing_zeros();

/// The direction of a transform
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    /// Time domain to frequency domain, scaled by `1/N`
    Forward,
    /// Frequency domain to time domain, unscaled
    Inverse,
}

/// Precomputed twiddle factors and bit-reversal permutation for a transform
/// of [FFT_SIZE] points.
#[derive(Clone)]
pub struct FftPlan<T: Float> {
    cos: [T; HALF_SIZE],
    sin: [T; HALF_SIZE],
    bit_rev: [u16; FFT_SIZE],
}

impl<T: Float> FftPlan<T> {
    /// An unbuilt plan.  [FftPlan::init] must be called before use.
    pub const fn new() -> Self {
        Self {
            cos: [T::ZERO; HALF_SIZE],
            sin: [T::ZERO; HALF_SIZE],
            bit_rev: [0; FFT_SIZE],
        }
    }
    /// Build the tables.  Uses exact trig regardless of the `fast-trig`
    /// feature.
    pub fn init(&mut self) {
        let size = T::from_usize(FFT_SIZE);
        for (i, (c, s)) in self.cos.iter_mut().zip(self.sin.iter_mut()).enumerate() {
            let phase = T::TAU * T::from_usize(i) / size;
            *c = phase.cos();
            *s = phase.sin();
        }
        for (i, rev) in self.bit_rev.iter_mut().enumerate() {
            *rev = reverse_bits(i);
        }
    }
    /// Transform `re`/`im` in place
    pub fn execute(&self, re: &mut [T; FFT_SIZE], im: &mut [T; FFT_SIZE], direction: Direction) {
        for i in 0..FFT_SIZE {
            let j = self.bit_rev[i] as usize;
            if j > i {
                re.swap(i, j);
                im.swap(i, j);
            }
        }
        let mut size = 2;
        while size <= FFT_SIZE {
            let half = size / 2;
            let stride = FFT_SIZE / size;
            for start in (0..FFT_SIZE).step_by(size) {
                for k in 0..half {
                    let c = self.cos[k * stride];
                    let s = match direction {
                        Direction::Forward => -self.sin[k * stride],
                        Direction::Inverse => self.sin[k * stride],
                    };
                    let even = start + k;
                    let odd = even + half;
                    let t_re = c * re[odd] - s * im[odd];
                    let t_im = s * re[odd] + c * im[odd];
                    let (u_re, u_im) = (re[even], im[even]);
                    re[even] = u_re + t_re;
                    im[even] = u_im + t_im;
                    re[odd] = u_re - t_re;
                    im[odd] = u_im - t_im;
                }
            }
            size *= 2;
        }
        if direction == Direction::Forward {
            let scale = T::ONE / T::from_usize(FFT_SIZE);
            for (r, i) in re.iter_mut().zip(im.iter_mut()) {
                *r = *r * scale;
                *i = *i * scale;
            }
        }
    }
}

impl<T: Float> Default for FftPlan<T> {
    fn default() -> Self {
        let mut ret = Self::new();
        ret.init();
        ret
    }
}

fn reverse_bits(i: usize) -> u16 {
    ((i as u32).reverse_bits() >> (u32::BITS - LOG2_SIZE)) as u16
}

/// Copy the non-redundant half of a full spectrum into `NUM_BINS` bins.  The
/// imaginary parts of DC and Nyquist are forced to zero.
pub fn unpack_spectrum<T: Float>(
    fft_re: &[T; FFT_SIZE],
    fft_im: &[T; FFT_SIZE],
    re: &mut [T; NUM_BINS],
    im: &mut [T; NUM_BINS],
) {
    re.copy_from_slice(&fft_re[..NUM_BINS]);
    im.copy_from_slice(&fft_im[..NUM_BINS]);
    im[0] = T::ZERO;
    im[NUM_BINS - 1] = T::ZERO;
}

/// Rebuild a Hermitian-symmetric full spectrum from `NUM_BINS` bins, so that
/// its inverse transform is purely real.
pub fn pack_spectrum<T: Float>(
    re: &[T; NUM_BINS],
    im: &[T; NUM_BINS],
    fft_re: &mut [T; FFT_SIZE],
    fft_im: &mut [T; FFT_SIZE],
) {
    fft_re[..NUM_BINS].copy_from_slice(re);
    fft_im[..NUM_BINS].copy_from_slice(im);
    fft_im[0] = T::ZERO;
    fft_im[HALF_SIZE] = T::ZERO;
    for k in 1..HALF_SIZE {
        fft_re[FFT_SIZE - k] = re[k];
        fft_im[FFT_SIZE - k] = -im[k];
    }
}
