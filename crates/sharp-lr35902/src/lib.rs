//! Half-cycle accurate Sharp LR35902 bus timing and fetch/execute core.
//!
//! Each call to `clock()` advances exactly one half-cycle. A machine cycle is
//! eight half-cycles, and every memory access drives the external pins the
//! way the real part does for the region being addressed.

mod arbitration;
mod bus;
mod clock;
mod config;
mod cpu;
mod error;
mod instructions;
mod machine;
mod microcode;
mod observable;
mod pins;
mod registers;
mod table;

pub use arbitration::{BusSet, SharedBusSet};
pub use bus::{BusEngine, BusStatus};
pub use clock::{ClockDivider, HALF_CYCLES};
pub use config::CpuConfig;
pub use cpu::{Cpu, State};
pub use error::{BusError, TransactionKind};
pub use instructions::{InstrStatus, Instruction, Op};
pub use machine::Lr35902;
pub use observable::{Observable, Value};
pub use pins::{A15, Pins, Region};
pub use registers::{Reg8, Reg16, Registers};
pub use table::{INSTRUCTION_TABLE, dispatch};
