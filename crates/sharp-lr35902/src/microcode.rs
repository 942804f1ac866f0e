//! Micro-operation definitions for the instruction handlers.
//!
//! Every instruction after its opcode fetch is a short list of machine
//! cycles. Each micro-op below fills exactly one machine cycle (eight
//! half-cycles); the instruction then retires on the cycle after its last
//! micro-op, which is the cycle the next opcode fetch overlaps.

use crate::registers::{Reg8, Reg16};

/// Which half of the internal WZ latch a read lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temp {
    Z,
    W,
}

/// Where a micro-op's address comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addr {
    /// PC, incremented once the transaction starts.
    Pc,
    /// A register pair.
    Pair(Reg16),
    /// The WZ latch.
    Wz,
    /// WZ + 1.
    WzNext,
    /// $FF00 + Z.
    HighZ,
    /// $FF00 + C.
    HighC,
    /// SP, incremented once the transaction starts (pop).
    SpPostInc,
    /// SP - 1, stored back to SP once the transaction starts (push).
    SpPreDec,
}

/// What a write puts on the data bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Reg(Reg8),
    Z,
    High(Reg16),
    Low(Reg16),
}

/// One machine cycle of instruction work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicroOp {
    /// Read a byte into Z or W.
    Read(Addr, Temp),
    /// Write a byte.
    Write(Addr, Source),
    /// No bus activity; the cycle ends on half-cycle 7.
    Internal,
}

/// Scratch state for the instruction being executed.
///
/// Cleared whenever a new opcode is latched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecContext {
    /// Index of the next micro-op.
    pub step: u8,
    pub z: u8,
    pub w: u8,
    /// Set once the instruction has written back its results.
    pub retired: bool,
}

impl ExecContext {
    #[must_use]
    pub const fn wz(&self) -> u16 {
        (self.w as u16) << 8 | self.z as u16
    }

    pub fn store(&mut self, temp: Temp, value: u8) {
        match temp {
            Temp::Z => self.z = value,
            Temp::W => self.w = value,
        }
    }
}
