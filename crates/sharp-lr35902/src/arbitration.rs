//! Bus-arbitration sets shared with the other chips in the package.
//!
//! The CPU only carries these around so other chips (DMA, video) can find
//! them; it never reads or changes them itself.

use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to a bus set.
pub type SharedBusSet = Rc<RefCell<BusSet>>;

/// Ownership record for one physical bus.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BusSet {
    owner: Option<&'static str>,
}

impl BusSet {
    #[must_use]
    pub fn shared() -> SharedBusSet {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Chip currently holding the bus.
    #[must_use]
    pub fn owner(&self) -> Option<&'static str> {
        self.owner
    }

    /// Take the bus. Returns false if another chip already holds it.
    pub fn claim(&mut self, chip: &'static str) -> bool {
        match self.owner {
            Some(current) if current != chip => false,
            _ => {
                self.owner = Some(chip);
                true
            }
        }
    }

    /// Give the bus back. Only the holder can release it.
    pub fn release(&mut self, chip: &'static str) {
        if self.owner == Some(chip) {
            self.owner = None;
        }
    }
}
