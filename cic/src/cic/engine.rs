use crate::register;
use crate::Order;

/// Snapshot of an engine's internal registers
///
/// Register values are the raw `register_bits`-wide contents, before saturation. Second-stage
/// fields are `None` for the first-order engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Diagnostics {
    pub order: Order,
    pub output_bits: u32,
    pub register_bits: u32,
    pub counter_bits: u32,
    /// Saturated output register
    pub output: u32,
    /// Comb result latched with the output, before saturation
    pub raw: u32,
    pub saturated: bool,
    pub integrator1: u32,
    pub integrator2: Option<u32>,
    pub comb1: u32,
    pub comb2: Option<u32>,
    pub counter: u32,
    pub strobe: bool,
    /// The most recent tick was a decimation boundary
    pub boundary: bool,
}

/// A CIC decimator stepped once per modulator bit
pub trait CicEngine {
    const ORDER: Order;
    const OUTPUT_BITS: u32;

    /// Advance one base-rate tick
    ///
    /// Returns the new output sample when this tick was a decimation boundary. While `reset` is
    /// asserted all state is cleared, the bit is ignored and nothing is returned.
    fn tick(&mut self, bit: bool, reset: bool) -> Option<u32>;

    /// Latest saturated output sample
    fn output(&self) -> u32;

    /// Sample-ready strobe (top bit of the decimation counter)
    fn strobe(&self) -> bool;

    fn diagnostics(&self) -> Diagnostics;

    /// Clear all registers immediately
    fn reset(&mut self) {
        self.tick(false, true);
    }

    /// Largest representable output value
    fn full_scale() -> u32 {
        register::mask(Self::OUTPUT_BITS)
    }

    /// Feed one byte of packed PDM data, least significant bit first
    fn push_byte(&mut self, pdm: u8, mut rx: impl FnMut(u32)) {
        for i in 0..8 {
            if let Some(sample) = self.tick(pdm & (1 << i) != 0, false) {
                rx(sample);
            }
        }
    }

    fn process_pdm_buffer(&mut self, pdm: &[u8], mut rx: impl FnMut(u32)) {
        for byte in pdm {
            self.push_byte(*byte, &mut rx);
        }
    }

    fn process_bits<I>(&mut self, bits: I, mut rx: impl FnMut(u32))
    where
        I: IntoIterator<Item = bool>,
    {
        for bit in bits {
            if let Some(sample) = self.tick(bit, false) {
                rx(sample);
            }
        }
    }
}
