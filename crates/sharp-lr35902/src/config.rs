//! CPU start-up configuration.

use crate::cpu::State;

/// How the CPU comes out of initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuConfig {
    /// PC after initialization. $0000 runs the boot ROM; $0100 skips it.
    pub entry_point: u16,
    /// Scheduler state after initialization.
    pub initial_state: State,
}

impl CpuConfig {
    #[must_use]
    pub const fn with_entry_point(entry_point: u16) -> Self {
        Self {
            entry_point,
            initial_state: State::Fetching,
        }
    }
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self::with_entry_point(0x0000)
    }
}
