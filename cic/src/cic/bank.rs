use log::debug;

use crate::debug::{expose, PinBytes};
use crate::engine::{CicEngine, Diagnostics};
use crate::first_order::FirstOrderCic;
use crate::second_order::SecondOrderCic;
use crate::Order;

/// Both decimators fed from the same bit and reset, with one of them selected for output
///
/// The engines share nothing but their input; each owns its own decimation clock. Switching the
/// selection does not disturb either engine.
#[derive(Clone, Debug, Default)]
pub struct FilterBank {
    cic1: FirstOrderCic,
    cic2: SecondOrderCic,
    select: Order,
}

impl FilterBank {
    pub const fn new(select: Order) -> Self {
        Self {
            cic1: FirstOrderCic::new(),
            cic2: SecondOrderCic::new(),
            select,
        }
    }

    pub fn selected(&self) -> Order {
        self.select
    }

    pub fn select(&mut self, order: Order) {
        if self.select != order {
            debug!("bank: selecting {:?} order engine", order);
        }
        self.select = order;
    }

    /// Step both engines, returning a new sample from the selected one
    pub fn tick(&mut self, bit: bool, reset: bool) -> Option<u32> {
        let s1 = self.cic1.tick(bit, reset);
        let s2 = self.cic2.tick(bit, reset);
        match self.selected() {
            Order::First => s1,
            Order::Second => s2,
        }
    }

    pub fn output(&self) -> u32 {
        match self.selected() {
            Order::First => self.cic1.output(),
            Order::Second => self.cic2.output(),
        }
    }

    pub fn strobe(&self) -> bool {
        match self.selected() {
            Order::First => self.cic1.strobe(),
            Order::Second => self.cic2.strobe(),
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        match self.selected() {
            Order::First => self.cic1.diagnostics(),
            Order::Second => self.cic2.diagnostics(),
        }
    }

    /// Output pins for debug `mode`, with `loopback` on the bidirectional inputs
    pub fn pins(&self, mode: u8, loopback: u8) -> PinBytes {
        expose(&self.diagnostics(), mode, loopback)
    }

    pub fn first_order(&self) -> &FirstOrderCic {
        &self.cic1
    }

    pub fn second_order(&self) -> &SecondOrderCic {
        &self.cic2
    }
}
