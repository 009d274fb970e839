//! The per-sample processing abstraction shared by the spectral channels.

use crate::Float;
use core::iter::{repeat, Repeat};

/// A sample-rate DSP device
///
/// A device takes one sample (or one frame of samples, for multichannel
/// devices) of input and produces one of output, according to a set of
/// parameters.  The spectral devices in this crate only look at their
/// parameters once per hop, but the interface is the same: callers hand over
/// the current parameter values with every sample and never have to know
/// where the frame boundaries fall.
pub trait Device<T: Float> {
    /// The input type for this device, e.g. a mono or stereo sample
    type Input;
    /// The parameter type for this device.  Anything a knob on the hardware
    /// would change falls into this category.
    type Params;
    /// The output type for this device
    type Output;
    /// Take one sample of `input`, run the device's DSP logic using `params`
    /// and return a sample of output.
    fn next(&mut self, input: Self::Input, params: Self::Params) -> Self::Output;
    /// This is similar to [Device::next], but works on iterators and returns
    /// an iterator to the results
    fn process<InputIt: Iterator<Item = Self::Input>, ParamIt: Iterator<Item = Self::Params>>(
        &mut self,
        input: InputIt,
        params: ParamIt,
    ) -> DeviceIter<'_, T, Self, InputIt, ParamIt>
    where
        Self: Sized,
    {
        DeviceIter {
            dev: self,
            input,
            params,
            _sample: core::marker::PhantomData,
        }
    }
    /// Like [Device::process], holding `params` constant for the whole input
    fn process_with<InputIt: Iterator<Item = Self::Input>>(
        &mut self,
        input: InputIt,
        params: Self::Params,
    ) -> DeviceIter<'_, T, Self, InputIt, Repeat<Self::Params>>
    where
        Self: Sized,
        Self::Params: Clone,
    {
        self.process(input, repeat(params))
    }
}

/// An iterator over a [Device] returned by [Device::process]
pub struct DeviceIter<
    'a,
    T: Float,
    D: Device<T>,
    InputIt: Iterator<Item = D::Input>,
    ParamIt: Iterator<Item = D::Params>,
> {
    dev: &'a mut D,
    input: InputIt,
    params: ParamIt,
    _sample: core::marker::PhantomData<T>,
}

impl<
        'a,
        T: Float,
        D: Device<T>,
        InputIt: Iterator<Item = D::Input>,
        ParamIt: Iterator<Item = D::Params>,
    > Iterator for DeviceIter<'a, T, D, InputIt, ParamIt>
{
    type Item = D::Output;
    fn next(&mut self) -> Option<D::Output> {
        Some(self.dev.next(self.input.next()?, self.params.next()?))
    }
}
