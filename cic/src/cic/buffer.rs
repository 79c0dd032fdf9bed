use heapless::Vec;

use crate::engine::CicEngine;

/// Fixed-capacity capture of decimated samples
///
/// Samples are taken the way a consumer watching the pins would: the output register is read on
/// each rising edge of the sample-ready strobe, half a period after it was latched.
pub struct SampleBuffer<const N: usize> {
    samples: Vec<u32, N>,
    last_strobe: bool,
    skip: usize,
    skip_edges: usize,
}

impl<const N: usize> SampleBuffer<N> {
    pub const fn new() -> Self {
        Self {
            samples: Vec::new(),
            last_strobe: false,
            skip: 0,
            skip_edges: 0,
        }
    }

    /// Ignore the first `skip` strobe edges, e.g. to let the filter pipeline fill
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self.skip_edges = skip;
        self
    }

    /// Observe the strobe and output register after a tick
    ///
    /// Returns `Err(sample)` when an edge was seen but the buffer is already full.
    pub fn observe(&mut self, strobe: bool, output: u32) -> Result<(), u32> {
        let rising = strobe && !self.last_strobe;
        self.last_strobe = strobe;
        if !rising {
            return Ok(());
        }
        if self.skip > 0 {
            self.skip -= 1;
            return Ok(());
        }
        self.samples.push(output)
    }

    /// Step `engine` with `bit` and observe its pins
    pub fn tick<E: CicEngine>(&mut self, engine: &mut E, bit: bool) -> Result<(), u32> {
        engine.tick(bit, false);
        self.observe(engine.strobe(), engine.output())
    }

    /// Run `engine` over `bits` until the buffer fills or the bits run out
    ///
    /// Returns the number of bits consumed.
    pub fn fill<E, I>(&mut self, engine: &mut E, bits: I) -> usize
    where
        E: CicEngine,
        I: IntoIterator<Item = bool>,
    {
        let mut consumed = 0;
        for bit in bits {
            if self.is_full() {
                break;
            }
            consumed += 1;
            // cannot overflow, fullness was checked before the tick
            let _ = self.tick(engine, bit);
        }
        consumed
    }

    pub fn is_full(&self) -> bool {
        self.samples.is_full()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        self.samples.as_slice()
    }

    /// Empty the buffer for a new capture, skipping the same number of edges again
    pub fn clear(&mut self) {
        self.samples.clear();
        self.last_strobe = false;
        self.skip = self.skip_edges;
    }
}

impl<const N: usize> Default for SampleBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FirstOrderCic, DECIMATION};

    #[test]
    fn captures_on_rising_edge() {
        let mut buf = SampleBuffer::<4>::new();
        let strobes = [false, true, true, false, false, true, false, true];
        for (i, s) in strobes.iter().enumerate() {
            buf.observe(*s, i as u32).unwrap();
        }
        assert_eq!(buf.as_slice(), &[1, 5, 7]);
    }

    #[test]
    fn full_buffer_rejects() {
        let mut buf = SampleBuffer::<1>::new();
        assert_eq!(buf.observe(true, 10), Ok(()));
        assert_eq!(buf.observe(false, 11), Ok(()));
        assert_eq!(buf.observe(true, 12), Err(12));
        assert_eq!(buf.as_slice(), &[10]);
    }

    #[test]
    fn one_sample_per_period() {
        let mut cic: FirstOrderCic = FirstOrderCic::new();
        let mut buf = SampleBuffer::<8>::new().with_skip(1);
        // ones in the first half of every window
        let bits = (0..20 * DECIMATION).map(|t| t % DECIMATION < 256);
        let consumed = buf.fill(&mut cic, bits);
        assert!(buf.is_full());
        // first edge is at tick 511, each later one a full period after
        assert_eq!(consumed, 511 + 8 * DECIMATION + 1);
        assert_eq!(buf.as_slice(), &[256; 8]);
    }

    #[test]
    fn clear_restarts_capture() {
        let mut cic: FirstOrderCic = FirstOrderCic::new();
        let mut buf = SampleBuffer::<2>::new().with_skip(1);
        let bits = (0..4 * DECIMATION).map(|t| t % DECIMATION < 100);
        buf.fill(&mut cic, bits);
        assert_eq!(buf.as_slice(), &[100, 100]);

        // after a reset the engine refills, and the cleared buffer skips that edge again
        cic.reset();
        buf.clear();
        assert!(buf.is_empty());
        let bits = (0..4 * DECIMATION).map(|t| t % DECIMATION < 300);
        buf.fill(&mut cic, bits);
        assert_eq!(buf.as_slice(), &[300, 300]);
    }
}
