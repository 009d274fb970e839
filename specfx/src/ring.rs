//! Fixed-capacity circular sample buffer shared by the input history, the
//! dry delay line and the overlap-add accumulator.

use crate::Float;

/// Circular buffer of `N` samples with independent read and write cursors.
///
/// Used three ways: as a history of the most recent `N` inputs
/// ([RingBuffer::push] + [RingBuffer::oldest_first]), as a fixed delay
/// ([RingBuffer::delay]), and as an overlap-add accumulator
/// ([RingBuffer::accumulate] + [RingBuffer::pop_and_clear]).
#[derive(Clone)]
pub struct RingBuffer<T: Float, const N: usize> {
    data: [T; N],
    read: usize,
    write: usize,
}

impl<T: Float, const N: usize> RingBuffer<T, N> {
    /// A zero-filled buffer with both cursors at index 0
    pub const fn new() -> Self {
        Self {
            data: [T::ZERO; N],
            read: 0,
            write: 0,
        }
    }
    /// Zero every slot and rewind both cursors
    pub fn clear(&mut self) {
        self.data = [T::ZERO; N];
        self.read = 0;
        self.write = 0;
    }
    /// The current write cursor
    pub fn write_index(&self) -> usize {
        self.write
    }
    /// Overwrite the slot at the write cursor and advance it
    pub fn push(&mut self, value: T) {
        self.data[self.write] = value;
        self.write = (self.write + 1) % N;
    }
    /// Push `value` and return the sample it replaced, which was pushed `N`
    /// calls earlier
    pub fn delay(&mut self, value: T) -> T {
        let old = self.data[self.write];
        self.push(value);
        old
    }
    /// All `N` samples, oldest first (starting at the write cursor)
    pub fn oldest_first(&self) -> impl Iterator<Item = T> + '_ {
        (0..N).map(move |i| self.data[(self.write + i) % N])
    }
    /// Return the sample at the read cursor, zero that slot and advance the
    /// read cursor
    pub fn pop_and_clear(&mut self) -> T {
        let value = self.data[self.read];
        self.data[self.read] = T::ZERO;
        self.read = (self.read + 1) % N;
        value
    }
    /// Add `value` to the slot `offset` samples past the write cursor
    pub fn accumulate(&mut self, offset: usize, value: T) {
        let idx = (self.write + offset) % N;
        self.data[idx] = self.data[idx] + value;
    }
    /// Advance the write cursor by `count` without touching the data
    pub fn advance_write(&mut self, count: usize) {
        self.write = (self.write + count) % N;
    }
    /// Move the read cursor to `index`
    pub fn set_read_index(&mut self, index: usize) {
        self.read = index % N;
    }
}

impl<T: Float, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_oldest_first() {
        let mut ring = RingBuffer::<f32, 4>::new();
        for i in 1..=6 {
            ring.push(i as f32);
        }
        let hist: Vec<f32> = ring.oldest_first().collect();
        assert_eq!(hist, [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn delay_line_latency() {
        let mut ring = RingBuffer::<f32, 3>::new();
        let out: Vec<f32> = (1..=5).map(|i| ring.delay(i as f32)).collect();
        assert_eq!(out, [0.0, 0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn accumulate_then_drain() {
        let mut ring = RingBuffer::<f32, 8>::new();
        ring.advance_write(6);
        ring.accumulate(0, 1.0);
        ring.accumulate(3, 2.0); // wraps to slot 1
        ring.accumulate(3, 0.5);
        ring.set_read_index(6);
        let out: Vec<f32> = (0..4).map(|_| ring.pop_and_clear()).collect();
        assert_eq!(out, [1.0, 0.0, 0.0, 2.5]);
        ring.set_read_index(6);
        assert_eq!(ring.pop_and_clear(), 0.0);
    }
}
