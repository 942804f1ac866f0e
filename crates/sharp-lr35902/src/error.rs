//! Bus contract violations.
//!
//! None of these can be caused by emulated software. Each one means the
//! emulator itself sequenced the bus wrongly.

use std::fmt;

/// Direction of a bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Read,
    Write,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// A transaction was started while another was still running.
    #[error(
        "{requested} of {address:#06X} requested while a {active} of {latched:#06X} is in flight"
    )]
    Overlap {
        requested: TransactionKind,
        address: u16,
        active: TransactionKind,
        latched: u16,
    },

    /// A transaction was advanced without having been started.
    #[error("no {0} in progress")]
    Idle(TransactionKind),

    /// A new transaction was first advanced somewhere other than h0.
    #[error("{kind} first driven at h{half_cycle}, transactions start at h0")]
    Misaligned { kind: TransactionKind, half_cycle: u8 },
}
