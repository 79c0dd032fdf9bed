#![cfg_attr(not(feature="std"), no_std)]

pub mod analysis;
pub mod bank;
#[cfg(feature="std")]
pub mod bitstream;
pub mod buffer;
pub mod clock;
pub mod debug;
pub mod engine;
pub mod first_order;
#[cfg(feature="std")]
pub mod generation;
pub mod register;
pub mod second_order;

pub use bank::FilterBank;
pub use clock::DecimationClock;
pub use engine::{CicEngine, Diagnostics};
pub use first_order::FirstOrderCic;
pub use second_order::SecondOrderCic;

/// Decimation ratio of both engines: one output sample per 1024 modulator bits
pub const DECIMATION: usize = 1024;

/// Output width of the first-order engine
pub const FIRST_ORDER_BITS: u32 = 10;

/// Output width of the second-order engine
pub const SECOND_ORDER_BITS: u32 = 20;

/// Filter order, i.e. the number of integrator/comb stage pairs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Order {
    #[default]
    First,
    Second,
}

impl Order {
    /// Decode the engine select input: low picks the first-order engine
    pub const fn from_select(select: bool) -> Self {
        if select { Order::Second } else { Order::First }
    }
}
