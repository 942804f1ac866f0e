//! External pin state and address-region decoding.
//!
//! The pin set is the only thing other chips see of the CPU. It is owned by
//! the machine and lent to each chip for its half-cycle step, so there is no
//! locking: within any one half-cycle exactly one chip drives each line.
//!
//! Control lines are active-low, so `true` means the line is at rest.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Top address line. The LR35902 drives it separately from A0-A14.
pub const A15: u16 = 0x8000;

/// Shared external pins of the CPU package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pins {
    /// Address lines A0-A15.
    pub a: u16,
    /// Bidirectional data lines D0-D7.
    pub d: u8,
    /// Read strobe (active-low).
    pub rd: bool,
    /// Write strobe (active-low).
    pub wr: bool,
    /// External RAM chip select (active-low).
    pub cs: bool,
    /// Divided clock output, high for half-cycles 0-3.
    pub phi: bool,
}

impl Pins {
    /// Pins with the bus at rest: strobes and select high, A15 high.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            a: A15,
            d: 0,
            rd: true,
            wr: true,
            cs: true,
            phi: true,
        }
    }

    /// Current level of A15.
    #[must_use]
    pub const fn a15(&self) -> bool {
        self.a & A15 != 0
    }
}

impl Default for Pins {
    fn default() -> Self {
        Self::idle()
    }
}

/// How an address is wired to the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Region {
    /// $0000-$7FFF: cartridge ROM, selected by A15 going low.
    Rom,
    /// $A000-$FDFF: external and work RAM, selected by CS going low.
    Ram,
    /// Everything else: neither A15 nor CS moves, and RD stays low. Writes
    /// still pulse WR and drive D on the package pins.
    ///
    /// This covers $FE00-$FFFF and, by falling through both range checks,
    /// $8000-$9FFF as well. Whether video memory belongs here or is meant to
    /// be arbitrated entirely through the VRAM bus set is still open; it
    /// stays on this path until that is settled, not on `Ram`.
    Internal,
}

impl Region {
    /// Decode the region for an address.
    #[must_use]
    pub const fn of(address: u16) -> Self {
        match address {
            0x0000..=0x7FFF => Self::Rom,
            0xA000..=0xFDFF => Self::Ram,
            _ => Self::Internal,
        }
    }

    /// True for regions that reach chips outside the CPU package.
    #[must_use]
    pub const fn is_external(self) -> bool {
        matches!(self, Self::Rom | Self::Ram)
    }
}
