//! Debug multiplexer
//!
//! Routes one internal signal of the selected engine onto two output bytes. Each data mode picks
//! a 16-bit word `W`: the high byte goes out on `uo_out`, and `uio_out` carries `W[7:1]` with the
//! sample-ready strobe in bit 0 as a framing bit. A consumer that latches on the rising strobe
//! edge recovers `W >> 1` as `uo_out * 128 + uio_out / 2`.
//!
//! Everything here is a pure function of the diagnostics snapshot.

use crate::engine::Diagnostics;
use crate::register::{high_word, low_word};
use crate::Order;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinBytes {
    pub uo_out: u8,
    pub uio_out: u8,
}

/// Returned for reserved modes and for signals the selected engine does not have
pub const RESERVED: PinBytes = PinBytes { uo_out: 0xDE, uio_out: 0xAD };

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugMode {
    OutputHigh = 0x0,
    OutputLow = 0x1,
    Integrator1High = 0x2,
    Integrator1Low = 0x3,
    Loopback = 0x4,
    Comb1High = 0x5,
    Comb1Low = 0x6,
    Integrator2High = 0x7,
    Integrator2Low = 0x8,
    Comb2High = 0x9,
    Comb2Low = 0xA,
    Counter = 0xB,
    Status = 0xC,
}

impl DebugMode {
    /// Decode the 4-bit mode select; bits above the low nibble are ignored
    pub const fn from_bits(bits: u8) -> Option<Self> {
        use DebugMode::*;
        Some(match bits & 0x0F {
            0x0 => OutputHigh,
            0x1 => OutputLow,
            0x2 => Integrator1High,
            0x3 => Integrator1Low,
            0x4 => Loopback,
            0x5 => Comb1High,
            0x6 => Comb1Low,
            0x7 => Integrator2High,
            0x8 => Integrator2Low,
            0x9 => Comb2High,
            0xA => Comb2Low,
            0xB => Counter,
            0xC => Status,
            _ => return None,
        })
    }
}

/// Status word: engine order, saturation, boundary flag and the decimation counter
pub fn status_word(diag: &Diagnostics) -> u16 {
    ((diag.order == Order::Second) as u16) << 15
        | (diag.saturated as u16) << 14
        | (diag.boundary as u16) << 13
        | (diag.counter & 0x3FF) as u16
}

fn word(diag: &Diagnostics, mode: DebugMode) -> Option<u16> {
    use DebugMode::*;
    let reg = diag.register_bits;
    Some(match mode {
        OutputHigh => high_word(diag.output, diag.output_bits),
        OutputLow => low_word(diag.output),
        Integrator1High => high_word(diag.integrator1, reg),
        Integrator1Low => low_word(diag.integrator1),
        Comb1High => high_word(diag.comb1, reg),
        Comb1Low => low_word(diag.comb1),
        Integrator2High => high_word(diag.integrator2?, reg),
        Integrator2Low => low_word(diag.integrator2?),
        Comb2High => high_word(diag.comb2?, reg),
        Comb2Low => low_word(diag.comb2?),
        Counter => high_word(diag.counter, diag.counter_bits),
        Status => status_word(diag),
        Loopback => return None,
    })
}

fn frame(word: u16, strobe: bool) -> PinBytes {
    PinBytes {
        uo_out: (word >> 8) as u8,
        uio_out: (word as u8 & 0xFE) | strobe as u8,
    }
}

/// Drive the output pins for `mode`
///
/// `loopback` is the byte presented on the bidirectional inputs; loopback mode echoes it on
/// `uo_out`.
pub fn expose(diag: &Diagnostics, mode: u8, loopback: u8) -> PinBytes {
    match DebugMode::from_bits(mode) {
        Some(DebugMode::Loopback) => PinBytes {
            uo_out: loopback,
            uio_out: diag.strobe as u8,
        },
        Some(mode) => match word(diag, mode) {
            Some(w) => frame(w, diag.strobe),
            None => RESERVED,
        },
        None => RESERVED,
    }
}

/// Recover `W >> 1` from the pins, as the capture side does
pub fn reassemble(pins: PinBytes) -> u16 {
    (pins.uo_out as u16) << 7 | (pins.uio_out as u16) >> 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CicEngine;
    use crate::{FirstOrderCic, SecondOrderCic, DECIMATION};

    fn first_order_after_half_scale() -> FirstOrderCic {
        let mut cic = FirstOrderCic::new();
        let bits = (0..DECIMATION + 600).map(|t| t < 512);
        cic.process_bits(bits, |_| {});
        cic
    }

    #[test]
    fn loopback_echoes_input() {
        let diag = first_order_after_half_scale().diagnostics();
        let pins = expose(&diag, 0x4, 0xB4);
        assert_eq!(pins.uo_out, 0xB4);
        assert_eq!(pins.uio_out, diag.strobe as u8);
        // upper nibble of the select is ignored
        assert_eq!(expose(&diag, 0x44, 0xB4).uo_out, 0xB4);
    }

    #[test]
    fn reserved_modes() {
        let cic1 = first_order_after_half_scale().diagnostics();
        let cic2 = SecondOrderCic::<20>::new().diagnostics();
        for mode in 0xD..=0xF {
            assert_eq!(expose(&cic1, mode, 0), RESERVED);
            assert_eq!(expose(&cic2, mode, 0), RESERVED);
        }
        for mode in 0x7..=0xA {
            assert_eq!(expose(&cic1, mode, 0), RESERVED);
            assert_ne!(expose(&cic2, mode, 0), RESERVED);
        }
    }

    #[test]
    fn output_is_left_aligned() {
        let diag = first_order_after_half_scale().diagnostics();
        assert_eq!(diag.output, 512);
        // counter is past the half period, so the strobe is high
        assert!(diag.strobe);
        let pins = expose(&diag, 0x0, 0);
        assert_eq!(pins, PinBytes { uo_out: 0x80, uio_out: 0x01 });
        assert_eq!(reassemble(pins), 0x8000 >> 1);

        let pins = expose(&diag, 0x1, 0);
        assert_eq!(pins, PinBytes { uo_out: 0x02, uio_out: 0x01 });
    }

    #[test]
    fn registers_and_counter() {
        let diag = first_order_after_half_scale().diagnostics();
        // 512 ones in the first window; the 11-bit registers are aligned to bit 15
        assert_eq!(diag.integrator1, 512);
        assert_eq!(diag.comb1, 512);
        assert_eq!(expose(&diag, 0x2, 0).uo_out, (512u32 << 5 >> 8) as u8);
        assert_eq!(expose(&diag, 0x6, 0).uo_out, 0x02);

        assert_eq!(diag.counter, 600);
        let pins = expose(&diag, 0xB, 0);
        assert_eq!(reassemble(pins), (600u16 << 6) >> 1);
    }

    #[test]
    fn status_bits() {
        let mut cic = SecondOrderCic::<20>::new();
        cic.process_bits(core::iter::repeat(true).take(3 * DECIMATION + 1), |_| {});
        let diag = cic.diagnostics();
        assert!(diag.boundary);
        assert!(diag.saturated);
        assert_eq!(diag.counter, 1);
        assert_eq!(status_word(&diag), 0x8000 | 0x4000 | 0x2000 | 1);
        assert_eq!(expose(&diag, 0xC, 0).uo_out, 0xE0);
    }
}
