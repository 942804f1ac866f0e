//! Half-cycle clock divider.

use crate::pins::Pins;

/// Half-cycles in one machine cycle.
pub const HALF_CYCLES: u8 = 8;

/// Divide-by-8 counter that sequences every bus cycle.
///
/// The counter runs from 0 to 7 and wraps. PHI is derived from it: high for
/// half-cycles 0-3, low for 4-7.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockDivider {
    half_cycle: u8,
    elapsed: u64,
}

impl ClockDivider {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            half_cycle: 0,
            elapsed: 0,
        }
    }

    /// Current position within the machine cycle (0-7).
    #[must_use]
    pub const fn half_cycle(&self) -> u8 {
        self.half_cycle
    }

    /// Half-cycles advanced since creation.
    #[must_use]
    pub const fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// PHI level for a given half-cycle.
    #[must_use]
    pub const fn phase(half_cycle: u8) -> bool {
        half_cycle & 0b100 == 0
    }

    /// Step to the next half-cycle and update PHI.
    ///
    /// Runs after all other logic for the step, whatever the CPU is doing.
    pub fn advance(&mut self, pins: &mut Pins) {
        self.half_cycle = (self.half_cycle + 1) % HALF_CYCLES;
        self.elapsed += 1;
        pins.phi = Self::phase(self.half_cycle);
    }
}
