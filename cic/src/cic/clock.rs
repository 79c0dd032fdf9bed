use crate::DECIMATION;

/// Free-running decimation counter
///
/// Counts base-rate ticks modulo `RATIO`. The tick on which the counter reads zero (before it
/// is incremented) is the decimation boundary, where the comb stages and the output register
/// update. The top counter bit doubles as a sample-ready strobe: it is low for the first half of
/// each period and high for the second half, so it rises once per output sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecimationClock<const RATIO: usize = DECIMATION> {
    count: usize,
}

impl<const RATIO: usize> DecimationClock<RATIO> {
    const RATIO_IS_POWER_OF_TWO: () = assert!(
        RATIO > 1 && RATIO.is_power_of_two(),
        "decimation ratio must be a power of two greater than one"
    );

    /// Width of the counter in bits
    pub const BITS: u32 = RATIO.trailing_zeros();

    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::RATIO_IS_POWER_OF_TWO;
        Self { count: 0 }
    }

    /// True when the current tick is a decimation boundary
    pub const fn is_boundary(&self) -> bool {
        self.count == 0
    }

    pub const fn count(&self) -> usize {
        self.count
    }

    /// Top bit of the counter
    pub const fn strobe(&self) -> bool {
        self.count & (RATIO >> 1) != 0
    }

    /// Counter state after one more tick
    pub const fn next(&self) -> Self {
        Self { count: (self.count + 1) & (RATIO - 1) }
    }

    /// Advance one tick, returning whether the tick was a boundary
    ///
    /// The boundary decision is taken on the counter value before the increment.
    pub fn tick(&mut self) -> bool {
        let boundary = self.is_boundary();
        *self = self.next();
        boundary
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_period() {
        let mut clock = DecimationClock::<DECIMATION>::new();
        let boundaries: Vec<usize> = (0..4 * DECIMATION)
            .filter(|_| clock.tick())
            .collect();
        assert_eq!(boundaries, vec![0, 1024, 2048, 3072]);
    }

    #[test]
    fn strobe_is_top_bit() {
        let mut clock = DecimationClock::<8>::new();
        assert_eq!(DecimationClock::<8>::BITS, 3);
        let mut strobes = [false; 8];
        for s in strobes.iter_mut() {
            *s = clock.strobe();
            clock.tick();
        }
        assert_eq!(strobes, [false, false, false, false, true, true, true, true]);
        // wrapped back to the start of the period
        assert!(clock.is_boundary());
    }

    #[test]
    fn reset_returns_to_boundary() {
        let mut clock = DecimationClock::<DECIMATION>::new();
        for _ in 0..700 {
            clock.tick();
        }
        assert_eq!(clock.count(), 700);
        assert!(clock.strobe());
        clock.reset();
        assert_eq!(clock, DecimationClock::new());
        assert!(clock.tick());
    }
}
