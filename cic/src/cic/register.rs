//! Fixed-width two's complement register arithmetic
//!
//! Integrator and comb registers are held in a `u32` and masked to their declared width after
//! every operation, so they wrap exactly like an N-bit hardware register would. A CIC filter
//! relies on that wrap: as long as the true comb result fits in the register, the modular
//! difference of two wrapped integrator values is still exact.

/// All-ones mask for a register of `width` bits
pub const fn mask(width: u32) -> u32 {
    if width >= u32::BITS {
        u32::MAX
    } else {
        (1 << width) - 1
    }
}

pub const fn wrapping_add(a: u32, b: u32, width: u32) -> u32 {
    a.wrapping_add(b) & mask(width)
}

pub const fn wrapping_sub(a: u32, b: u32, width: u32) -> u32 {
    a.wrapping_sub(b) & mask(width)
}

/// Clamp a raw comb result of `out_width + 1` bits to `out_width` bits
///
/// When the bit just above the output range is set, the result does not fit and the output is
/// pinned to the all-ones maximum. Returns the output value and whether it was clamped.
pub const fn saturate(raw: u32, out_width: u32) -> (u32, bool) {
    if raw & (1 << out_width) != 0 {
        (mask(out_width), true)
    } else {
        (raw & mask(out_width), false)
    }
}

/// Select 16 bits of a `width`-bit register, aligned to its most significant bit
///
/// Registers narrower than 16 bits are shifted up so their MSB lands on bit 15.
pub const fn high_word(value: u32, width: u32) -> u16 {
    if width >= 16 {
        ((value & mask(width)) >> (width - 16)) as u16
    } else {
        ((value & mask(width)) << (16 - width)) as u16
    }
}

pub const fn low_word(value: u32) -> u16 {
    (value & 0xFFFF) as u16
}
