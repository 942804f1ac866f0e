//! LR35902 core with per-half-cycle execution.
//!
//! Each call to `clock()` advances exactly one half-cycle. The opcode fetch
//! for the next instruction starts on the last cycle of the current one, so
//! after the first instruction there is never a cycle spent only fetching.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arbitration::SharedBusSet;
use crate::bus::{BusEngine, BusStatus};
use crate::clock::{ClockDivider, HALF_CYCLES};
use crate::config::CpuConfig;
use crate::error::BusError;
use crate::instructions::{InstrStatus, Instruction};
use crate::microcode::{Addr, ExecContext, MicroOp, Source};
use crate::observable::{Observable, Value};
use crate::pins::Pins;
use crate::registers::{Reg16, Registers};
use crate::table;

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum State {
    /// Fetching the first opcode.
    Fetching,
    /// Running the latched opcode, prefetching the next on its last cycle.
    Executing,
    /// Nothing runs; a harness drives the pins directly.
    ExternallyDriven,
}

impl State {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::Executing => "executing",
            Self::ExternallyDriven => "external",
        }
    }
}

/// LR35902 CPU.
///
/// The CPU does not own its pins. The machine owns them and lends them to
/// `clock()` each half-cycle, so the memory and video chips wired to the same
/// pins can observe and drive them between CPU steps.
#[derive(Debug)]
pub struct Cpu {
    pub regs: Registers,
    /// Last fetched opcode.
    instruction: u8,
    state: State,
    clock: ClockDivider,
    bus: BusEngine,
    pub(crate) exec: ExecContext,
    main_bus: SharedBusSet,
    vram_bus: SharedBusSet,
}

impl Cpu {
    /// Create a CPU bound to `pins`, which are driven to the idle level.
    ///
    /// The bus sets are held for the other chips and never interpreted here.
    #[must_use]
    pub fn new(
        config: &CpuConfig,
        pins: &mut Pins,
        main_bus: SharedBusSet,
        vram_bus: SharedBusSet,
    ) -> Self {
        *pins = Pins::idle();
        log::debug!(
            "LR35902 init: PC={:#06X}, {}",
            config.entry_point,
            config.initial_state.name()
        );
        Self {
            regs: Registers {
                pc: config.entry_point,
                ..Registers::default()
            },
            instruction: 0,
            state: config.initial_state,
            clock: ClockDivider::new(),
            bus: BusEngine::new(),
            exec: ExecContext::default(),
            main_bus,
            vram_bus,
        }
    }

    /// Zero all state, idle the pins and start over. The bus sets are kept.
    pub fn reset(&mut self, config: &CpuConfig, pins: &mut Pins) {
        let main_bus = std::mem::take(&mut self.main_bus);
        let vram_bus = std::mem::take(&mut self.vram_bus);
        *self = Self::new(config, pins, main_bus, vram_bus);
    }

    /// Advance one half-cycle.
    ///
    /// On error the clock does not advance, leaving the CPU at the half-cycle
    /// that broke the bus contract.
    pub fn clock(&mut self, pins: &mut Pins) -> Result<(), BusError> {
        match self.state {
            State::Fetching => self.fetch_step(pins)?,
            State::Executing => self.execute_step(pins)?,
            State::ExternallyDriven => self.external_step(),
        }
        self.clock.advance(pins);
        Ok(())
    }

    fn fetch_step(&mut self, pins: &mut Pins) -> Result<(), BusError> {
        if self.fetch_opcode(pins)? == BusStatus::Done {
            self.state = State::Executing;
        }
        Ok(())
    }

    fn execute_step(&mut self, pins: &mut Pins) -> Result<(), BusError> {
        let handler = table::dispatch(self.instruction);
        if handler.cycle(self, pins)? == InstrStatus::LastCycle {
            // Prefetch: the next opcode read overlaps the final cycle.
            self.fetch_opcode(pins)?;
        }
        Ok(())
    }

    /// The harness owns the pins in this state.
    #[allow(clippy::unused_self)]
    fn external_step(&self) {}

    /// Start the opcode read if the bus is free, then advance it.
    fn fetch_opcode(&mut self, pins: &mut Pins) -> Result<BusStatus, BusError> {
        if !self.bus.read_in_progress() {
            let pc = self.regs.pc;
            self.bus.begin_read(pc)?;
            self.regs.pc = pc.wrapping_add(1);
        }

        let status = self.handle_read(pins)?;
        if status == BusStatus::Done {
            self.instruction = self.bus.sampled();
            self.exec = ExecContext::default();
            log::trace!(
                "fetched {:#04X} from {:#06X}",
                self.instruction,
                self.bus.address()
            );
        }
        Ok(status)
    }

    /// Run one half-cycle of an instruction micro-op.
    pub(crate) fn run_micro_op(
        &mut self,
        op: MicroOp,
        pins: &mut Pins,
    ) -> Result<BusStatus, BusError> {
        match op {
            MicroOp::Read(addr, temp) => {
                if !self.bus.read_in_progress() {
                    let address = self.address_of(addr);
                    self.bus.begin_read(address)?;
                    self.commit_address(addr);
                }
                let status = self.handle_read(pins)?;
                if status == BusStatus::Done {
                    self.exec.store(temp, self.bus.sampled());
                }
                Ok(status)
            }
            MicroOp::Write(addr, source) => {
                if !self.bus.write_in_progress() {
                    let address = self.address_of(addr);
                    let data = self.source_of(source);
                    self.bus.begin_write(address, data)?;
                    self.commit_address(addr);
                }
                self.handle_write(pins)
            }
            MicroOp::Internal => Ok(if self.clock.half_cycle() == HALF_CYCLES - 1 {
                BusStatus::Done
            } else {
                BusStatus::Busy
            }),
        }
    }

    fn address_of(&self, addr: Addr) -> u16 {
        match addr {
            Addr::Pc => self.regs.pc,
            Addr::Pair(pair) => self.regs.get16(pair),
            Addr::Wz => self.exec.wz(),
            Addr::WzNext => self.exec.wz().wrapping_add(1),
            Addr::HighZ => 0xFF00 | self.exec.z as u16,
            Addr::HighC => 0xFF00 | self.regs.c as u16,
            Addr::SpPostInc => self.regs.sp,
            Addr::SpPreDec => self.regs.sp.wrapping_sub(1),
        }
    }

    /// Register side effects of an address, applied once the bus accepted it.
    fn commit_address(&mut self, addr: Addr) {
        match addr {
            Addr::Pc => self.regs.pc = self.regs.pc.wrapping_add(1),
            Addr::SpPostInc => self.regs.sp = self.regs.sp.wrapping_add(1),
            Addr::SpPreDec => self.regs.sp = self.regs.sp.wrapping_sub(1),
            _ => {}
        }
    }

    fn source_of(&self, source: Source) -> u8 {
        match source {
            Source::Reg(reg) => self.regs.get8(reg),
            Source::Z => self.exec.z,
            Source::High(pair) => (self.regs.get16(pair) >> 8) as u8,
            Source::Low(pair) => self.regs.get16(pair) as u8,
        }
    }

    /// Latch a read. See [`BusEngine::begin_read`].
    pub fn begin_read(&mut self, address: u16) -> Result<(), BusError> {
        self.bus.begin_read(address)
    }

    /// Latch a write. See [`BusEngine::begin_write`].
    pub fn begin_write(&mut self, address: u16, data: u8) -> Result<(), BusError> {
        self.bus.begin_write(address, data)
    }

    /// Drive the current half-cycle of the read in progress.
    pub fn handle_read(&mut self, pins: &mut Pins) -> Result<BusStatus, BusError> {
        self.bus.handle_read(self.clock.half_cycle(), pins)
    }

    /// Drive the current half-cycle of the write in progress.
    pub fn handle_write(&mut self, pins: &mut Pins) -> Result<BusStatus, BusError> {
        self.bus.handle_write(self.clock.half_cycle(), pins)
    }

    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    /// Opcode in the instruction latch.
    #[must_use]
    pub const fn instruction(&self) -> u8 {
        self.instruction
    }

    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.regs.pc
    }

    /// Position within the current machine cycle (0-7).
    #[must_use]
    pub const fn half_cycle(&self) -> u8 {
        self.clock.half_cycle()
    }

    /// Half-cycles elapsed since initialization.
    #[must_use]
    pub const fn elapsed(&self) -> u64 {
        self.clock.elapsed()
    }

    /// Transaction latches and flags.
    #[must_use]
    pub const fn bus(&self) -> &BusEngine {
        &self.bus
    }

    #[must_use]
    pub fn main_bus(&self) -> &SharedBusSet {
        &self.main_bus
    }

    #[must_use]
    pub fn vram_bus(&self) -> &SharedBusSet {
        &self.vram_bus
    }

    /// Force the scheduler state.
    ///
    /// Only available in test builds.
    #[cfg(feature = "test-utils")]
    pub fn set_state(&mut self, state: State) {
        self.state = state;
    }

    /// Index of the next micro-op of the running instruction.
    ///
    /// Only available in test builds.
    #[cfg(feature = "test-utils")]
    #[must_use]
    pub fn exec_step(&self) -> u8 {
        self.exec.step
    }
}

impl Observable for Cpu {
    fn query(&self, path: &str) -> Option<Value> {
        let value: Value = match path {
            "pc" => self.regs.pc.into(),
            "sp" => self.regs.sp.into(),
            "a" => self.regs.a.into(),
            "f" => self.regs.f.into(),
            "b" => self.regs.b.into(),
            "c" => self.regs.c.into(),
            "d" => self.regs.d.into(),
            "e" => self.regs.e.into(),
            "h" => self.regs.h.into(),
            "l" => self.regs.l.into(),
            "hl" => self.regs.get16(Reg16::Hl).into(),
            "state" => Value::Str(self.state.name()),
            "instruction" => self.instruction.into(),
            "half_cycle" => self.clock.half_cycle().into(),
            "elapsed" => self.clock.elapsed().into(),
            "bus.read" => self.bus.read_in_progress().into(),
            "bus.write" => self.bus.write_in_progress().into(),
            "bus.address" => self.bus.address().into(),
            "bus.data" => self.bus.data().into(),
            _ => return None,
        };
        Some(value)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc",
            "sp",
            "a",
            "f",
            "b",
            "c",
            "d",
            "e",
            "h",
            "l",
            "hl",
            "state",
            "instruction",
            "half_cycle",
            "elapsed",
            "bus.read",
            "bus.write",
            "bus.address",
            "bus.data",
        ]
    }
}
