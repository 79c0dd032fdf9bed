use log::{debug, trace};

use crate::clock::DecimationClock;
use crate::engine::{CicEngine, Diagnostics};
use crate::register::{saturate, wrapping_add, wrapping_sub};
use crate::{Order, DECIMATION, SECOND_ORDER_BITS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct State<const RATIO: usize> {
    integrator1: u32,
    integrator2: u32,
    comb1: u32,
    comb2: u32,
    raw: u32,
    output: u32,
    saturated: bool,
    clock: DecimationClock<RATIO>,
}

impl<const RATIO: usize> State<RATIO> {
    const ZERO: Self = Self {
        integrator1: 0,
        integrator2: 0,
        comb1: 0,
        comb2: 0,
        raw: 0,
        output: 0,
        saturated: false,
        clock: DecimationClock::new(),
    };
}

/// Two integrator, two comb CIC decimator
///
/// The second integrator accumulates the first one, and at each decimation boundary two
/// cascaded first differences are taken of the second integrator. Both differences subtract the
/// comb values latched at the previous boundary; the comb registers are only overwritten after
/// the output has been computed:
///
/// ```text
/// comb2' = integrator2 - comb1
/// raw    = integrator2 - comb1 - comb2
/// comb1' = integrator2
/// ```
///
/// The gain is `RATIO^2`, so with the default 20-bit output and a ratio of 1024 a full-scale
/// (all ones) stream produces exactly `2^20` and saturates to `2^20 - 1`. The pipeline needs two
/// decimation periods to fill.
#[derive(Clone, Debug)]
pub struct SecondOrderCic<const WIDTH: u32 = SECOND_ORDER_BITS, const RATIO: usize = DECIMATION> {
    state: State<RATIO>,
    boundary: bool,
    in_reset: bool,
}

impl<const WIDTH: u32, const RATIO: usize> SecondOrderCic<WIDTH, RATIO> {
    // RATIO^2 must fit in the WIDTH + 1 bit registers
    const HEADROOM: () = assert!(
        WIDTH < u32::BITS && 2 * RATIO.trailing_zeros() <= WIDTH,
        "second-order CIC needs WIDTH >= 2 * log2(RATIO)"
    );

    pub const REGISTER_BITS: u32 = WIDTH + 1;

    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::HEADROOM;
        Self {
            state: State::ZERO,
            boundary: false,
            in_reset: false,
        }
    }
}

impl<const WIDTH: u32, const RATIO: usize> Default for SecondOrderCic<WIDTH, RATIO> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const WIDTH: u32, const RATIO: usize> CicEngine for SecondOrderCic<WIDTH, RATIO> {
    const ORDER: Order = Order::Second;
    const OUTPUT_BITS: u32 = WIDTH;

    fn tick(&mut self, bit: bool, reset: bool) -> Option<u32> {
        if reset {
            if !self.in_reset {
                debug!("cic2: reset asserted");
            }
            self.in_reset = true;
            self.state = State::ZERO;
            self.boundary = false;
            return None;
        }
        if self.in_reset {
            debug!("cic2: reset released");
            self.in_reset = false;
        }

        let old = self.state;
        let mut next = old;
        let width = Self::REGISTER_BITS;

        next.integrator1 = wrapping_add(old.integrator1, bit as u32, width);
        next.integrator2 = wrapping_add(old.integrator2, old.integrator1, width);

        let boundary = old.clock.is_boundary();
        if boundary {
            let diff = wrapping_sub(old.integrator2, old.comb1, width);
            next.raw = wrapping_sub(diff, old.comb2, width);
            next.comb1 = old.integrator2;
            next.comb2 = diff;
            (next.output, next.saturated) = saturate(next.raw, WIDTH);
            trace!("cic2: raw={} out={} sat={}", next.raw, next.output, next.saturated);
        }
        next.clock = old.clock.next();

        self.state = next;
        self.boundary = boundary;
        boundary.then_some(next.output)
    }

    fn output(&self) -> u32 {
        self.state.output
    }

    fn strobe(&self) -> bool {
        self.state.clock.strobe()
    }

    fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            order: Order::Second,
            output_bits: WIDTH,
            register_bits: Self::REGISTER_BITS,
            counter_bits: DecimationClock::<RATIO>::BITS,
            output: self.state.output,
            raw: self.state.raw,
            saturated: self.state.saturated,
            integrator1: self.state.integrator1,
            integrator2: Some(self.state.integrator2),
            comb1: self.state.comb1,
            comb2: Some(self.state.comb2),
            counter: self.state.clock.count() as u32,
            strobe: self.state.clock.strobe(),
            boundary: self.boundary,
        }
    }
}
