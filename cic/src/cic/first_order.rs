use log::{debug, trace};

use crate::clock::DecimationClock;
use crate::engine::{CicEngine, Diagnostics};
use crate::register::{saturate, wrapping_add, wrapping_sub};
use crate::{Order, DECIMATION, FIRST_ORDER_BITS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct State<const RATIO: usize> {
    integrator: u32,
    comb: u32,
    raw: u32,
    output: u32,
    saturated: bool,
    clock: DecimationClock<RATIO>,
}

impl<const RATIO: usize> State<RATIO> {
    const ZERO: Self = Self {
        integrator: 0,
        comb: 0,
        raw: 0,
        output: 0,
        saturated: false,
        clock: DecimationClock::new(),
    };
}

/// Single integrator, single comb CIC decimator
///
/// Behaves as a boxcar sum over each decimation window: every `RATIO` bits it emits the number
/// of ones seen during the window, saturated to `WIDTH` bits. With the default 10-bit output and
/// a ratio of 1024 only an all-ones window saturates (1024 clamps to 1023).
///
/// The integrator and comb are `WIDTH + 1` bits wide.
#[derive(Clone, Debug)]
pub struct FirstOrderCic<const WIDTH: u32 = FIRST_ORDER_BITS, const RATIO: usize = DECIMATION> {
    state: State<RATIO>,
    boundary: bool,
    in_reset: bool,
}

impl<const WIDTH: u32, const RATIO: usize> FirstOrderCic<WIDTH, RATIO> {
    // A full window of ones must fit in the WIDTH + 1 bit register
    const HEADROOM: () = assert!(
        WIDTH < u32::BITS && RATIO.trailing_zeros() <= WIDTH,
        "first-order CIC needs WIDTH >= log2(RATIO)"
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

impl<const WIDTH: u32, const RATIO: usize> Default for FirstOrderCic<WIDTH, RATIO> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const WIDTH: u32, const RATIO: usize> CicEngine for FirstOrderCic<WIDTH, RATIO> {
    const ORDER: Order = Order::First;
    const OUTPUT_BITS: u32 = WIDTH;

    fn tick(&mut self, bit: bool, reset: bool) -> Option<u32> {
        if reset {
            if !self.in_reset {
                debug!("cic1: reset asserted");
            }
            self.in_reset = true;
            self.state = State::ZERO;
            self.boundary = false;
            return None;
        }
        if self.in_reset {
            debug!("cic1: reset released");
            self.in_reset = false;
        }

        // Everything below reads `old` and writes `next`
        let old = self.state;
        let mut next = old;

        next.integrator = wrapping_add(old.integrator, bit as u32, Self::REGISTER_BITS);

        let boundary = old.clock.is_boundary();
        if boundary {
            next.raw = wrapping_sub(old.integrator, old.comb, Self::REGISTER_BITS);
            next.comb = old.integrator;
            (next.output, next.saturated) = saturate(next.raw, WIDTH);
            trace!("cic1: raw={} out={} sat={}", next.raw, next.output, next.saturated);
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
            order: Order::First,
            output_bits: WIDTH,
            register_bits: Self::REGISTER_BITS,
            counter_bits: DecimationClock::<RATIO>::BITS,
            output: self.state.output,
            raw: self.state.raw,
            saturated: self.state.saturated,
            integrator1: self.state.integrator,
            integrator2: None,
            comb1: self.state.comb,
            comb2: None,
            counter: self.state.clock.count() as u32,
            strobe: self.state.clock.strobe(),
            boundary: self.boundary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::random_bits;

    type Cic1 = FirstOrderCic;

    fn run(cic: &mut Cic1, bits: &[bool]) -> Vec<u32> {
        let mut samples = Vec::new();
        cic.process_bits(bits.iter().copied(), |s| samples.push(s));
        samples
    }

    /// Window sums straight from the bit sequence, saturated like the output register
    fn boxcar_reference(bits: &[bool]) -> Vec<u32> {
        let mut expected = vec![0];
        for window in bits.chunks_exact(DECIMATION) {
            let ones = window.iter().filter(|b| **b).count() as u32;
            expected.push(ones.min(Cic1::full_scale()));
        }
        expected
    }

    #[test]
    fn half_scale_window() {
        let mut cic = Cic1::new();
        cic.reset();
        let mut bits = vec![true; 512];
        bits.extend([false; 512]);
        let samples = run(&mut cic, &bits);
        // the first boundary fires on the very first tick, with empty registers
        assert_eq!(samples, vec![0]);

        assert_eq!(cic.tick(false, false), Some(512));
        let diag = cic.diagnostics();
        assert_eq!(diag.raw, 512);
        assert_eq!(diag.output, 512);
        assert!(!diag.saturated);
    }

    #[test]
    fn boxcar_sum() {
        let mut cic = Cic1::new();
        let bits = random_bits(7, 20 * DECIMATION, 0.3);
        let mut samples = run(&mut cic, &bits);
        // flush the last window out of the integrator
        samples.extend(cic.tick(false, false));
        assert_eq!(samples, boxcar_reference(&bits));
    }

    #[test]
    fn dense_streams_do_not_wrap() {
        for (seed, density) in [(1, 0.99), (2, 0.999), (3, 0.5), (4, 0.01)] {
            let mut cic = Cic1::new();
            let bits = random_bits(seed, 40 * DECIMATION, density);
            let mut samples = run(&mut cic, &bits);
            samples.extend(cic.tick(false, false));
            assert_eq!(samples, boxcar_reference(&bits), "density {}", density);
        }
    }

    #[test]
    fn zero_input() {
        let mut cic = Cic1::new();
        let samples = run(&mut cic, &vec![false; 10 * DECIMATION]);
        assert_eq!(samples.len(), 10);
        assert!(samples.iter().all(|s| *s == 0));
    }

    #[test]
    fn full_scale() {
        let mut cic = Cic1::new();
        let samples = run(&mut cic, &vec![true; 8 * DECIMATION + 1]);
        assert_eq!(samples[0], 0);
        assert!(samples[1..].iter().all(|s| *s == 1023));
        let diag = cic.diagnostics();
        assert_eq!(diag.raw, 1024);
        assert!(diag.saturated);
    }

    #[test]
    fn reset_clears_everything() {
        let mut cic = Cic1::new();
        run(&mut cic, &random_bits(11, 3 * DECIMATION + 333, 0.7));
        assert_ne!(cic.diagnostics().integrator1, 0);

        assert_eq!(cic.tick(true, true), None);
        let diag = cic.diagnostics();
        assert_eq!(diag.integrator1, 0);
        assert_eq!(diag.comb1, 0);
        assert_eq!(diag.counter, 0);
        assert_eq!(diag.output, 0);
        assert_eq!(diag.raw, 0);
        assert!(!diag.strobe);

        // held in reset, input is ignored
        for _ in 0..100 {
            assert_eq!(cic.tick(true, true), None);
        }
        assert_eq!(cic.diagnostics().integrator1, 0);

        // released: accumulation restarts from zero
        let samples = run(&mut cic, &vec![false; 4 * DECIMATION]);
        assert_eq!(samples, vec![0; 4]);
    }

    #[test]
    fn updates_only_at_counter_zero() {
        let mut cic = Cic1::new();
        let bits = random_bits(5, 5 * DECIMATION, 0.5);
        let mut last_comb = cic.diagnostics().comb1;
        for (t, bit) in bits.into_iter().enumerate() {
            let counter = cic.diagnostics().counter;
            let sample = cic.tick(bit, false);
            let diag = cic.diagnostics();
            assert_eq!(sample.is_some(), counter == 0, "tick {}", t);
            assert_eq!(diag.boundary, t % DECIMATION == 0);
            if !diag.boundary {
                assert_eq!(diag.comb1, last_comb);
            }
            last_comb = diag.comb1;
        }
    }

    #[test]
    fn packed_bytes_lsb_first() {
        let mut packed = Cic1::new();
        let mut serial = Cic1::new();
        let bytes: Vec<u8> = (0..4 * DECIMATION / 8).map(|i| (i * 37 % 251) as u8).collect();
        let bits: Vec<bool> = bytes
            .iter()
            .flat_map(|b| (0..8).map(move |i| b & (1 << i) != 0))
            .collect();

        let mut from_bytes = Vec::new();
        packed.process_pdm_buffer(&bytes, |s| from_bytes.push(s));
        assert_eq!(from_bytes, run(&mut serial, &bits));
        assert_eq!(packed.diagnostics(), serial.diagnostics());
    }

    #[test]
    fn narrow_configuration() {
        // 8-bit output over a ratio of 64: a full window is 64, a saturated one would be 256
        let mut cic = FirstOrderCic::<8, 64>::new();
        assert_eq!(FirstOrderCic::<8, 64>::REGISTER_BITS, 9);
        let mut samples = Vec::new();
        cic.process_bits(core::iter::repeat(true).take(64 * 3 + 1), |s| samples.push(s));
        assert_eq!(samples, vec![0, 64, 64, 64]);
    }
}
