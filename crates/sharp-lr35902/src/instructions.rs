//! Instruction handlers.
//!
//! A handler is anything that can advance an instruction by one step of the
//! CPU clock and say whether it has finished. The built-in handlers are the
//! `Op` variants, each expanded into a fixed list of micro-ops.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bus::BusStatus;
use crate::cpu::Cpu;
use crate::error::BusError;
use crate::microcode::{Addr, ExecContext, MicroOp, Source, Temp};
use crate::pins::Pins;
use crate::registers::{Reg8, Reg16, Registers};

/// Result of advancing an instruction by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InstrStatus {
    /// The instruction needs more steps.
    Running,
    /// This is the instruction's final cycle; the next fetch may start.
    LastCycle,
}

/// An instruction handler.
///
/// Called once per CPU step while its opcode sits in the instruction latch.
/// A handler may start bus transactions through the CPU, but only when the
/// bus is idle.
pub trait Instruction {
    fn cycle(&self, cpu: &mut Cpu, pins: &mut Pins) -> Result<InstrStatus, BusError>;
}

/// Decoded opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// NOP, and every opcode without its own handler.
    Nop,
    /// LD r,r'
    LdRR { dst: Reg8, src: Reg8 },
    /// LD r,n
    LdRN(Reg8),
    /// LD r,(HL)
    LdRHl(Reg8),
    /// LD (HL),r
    LdHlR(Reg8),
    /// LD (HL),n
    LdHlN,
    /// LD rr,nn
    LdRrNn(Reg16),
    /// LD (nn),SP
    LdNnSp,
    /// LD A,(BC) / LD A,(DE)
    LdAInd(Reg16),
    /// LD (HL+),A
    LdHliA,
    /// LD (HL-),A
    LdHldA,
    /// LD A,(HL+)
    LdAHli,
    /// LD A,(HL-)
    LdAHld,
    /// POP rr
    Pop(Reg16),
    /// PUSH rr
    Push(Reg16),
    /// JP nn
    JpNn,
    /// LDH (n),A
    LdhNA,
    /// LDH (C),A
    LdhCA,
    /// LDH A,(n)
    LdhAN,
    /// LDH A,(C)
    LdhAC,
    /// LD (nn),A
    LdNnA,
    /// LD A,(nn)
    LdANn,
    /// LD SP,HL
    LdSpHl,
}

/// Register selected by a 3-bit operand field. Field value 6 is (HL).
const fn reg8(bits: u8) -> Reg8 {
    match bits & 0b111 {
        0 => Reg8::B,
        1 => Reg8::C,
        2 => Reg8::D,
        3 => Reg8::E,
        4 => Reg8::H,
        5 => Reg8::L,
        7 => Reg8::A,
        _ => panic!("(HL) is not a register operand"),
    }
}

/// Pair selected by bits 4-5, with SP in slot 3.
const fn pair_sp(opcode: u8) -> Reg16 {
    match (opcode >> 4) & 0b11 {
        0 => Reg16::Bc,
        1 => Reg16::De,
        2 => Reg16::Hl,
        _ => Reg16::Sp,
    }
}

/// Pair selected by bits 4-5, with AF in slot 3.
const fn pair_af(opcode: u8) -> Reg16 {
    match (opcode >> 4) & 0b11 {
        0 => Reg16::Bc,
        1 => Reg16::De,
        2 => Reg16::Hl,
        _ => Reg16::Af,
    }
}

impl Op {
    /// Decode an opcode byte. Opcodes without a handler decode to `Nop`.
    #[must_use]
    pub const fn decode(opcode: u8) -> Self {
        match opcode {
            0x01 | 0x11 | 0x21 | 0x31 => Self::LdRrNn(pair_sp(opcode)),
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x3E => Self::LdRN(reg8(opcode >> 3)),
            0x08 => Self::LdNnSp,
            0x0A => Self::LdAInd(Reg16::Bc),
            0x1A => Self::LdAInd(Reg16::De),
            0x22 => Self::LdHliA,
            0x2A => Self::LdAHli,
            0x32 => Self::LdHldA,
            0x3A => Self::LdAHld,
            0x36 => Self::LdHlN,
            // HALT has no handler yet.
            0x76 => Self::Nop,
            0x70..=0x77 => Self::LdHlR(reg8(opcode)),
            0x40..=0x7F if opcode & 0b111 == 6 => Self::LdRHl(reg8(opcode >> 3)),
            0x40..=0x7F => Self::LdRR {
                dst: reg8(opcode >> 3),
                src: reg8(opcode),
            },
            0xC1 | 0xD1 | 0xE1 | 0xF1 => Self::Pop(pair_af(opcode)),
            0xC5 | 0xD5 | 0xE5 | 0xF5 => Self::Push(pair_af(opcode)),
            0xC3 => Self::JpNn,
            0xE0 => Self::LdhNA,
            0xE2 => Self::LdhCA,
            0xEA => Self::LdNnA,
            0xF0 => Self::LdhAN,
            0xF2 => Self::LdhAC,
            0xF9 => Self::LdSpHl,
            0xFA => Self::LdANn,
            _ => Self::Nop,
        }
    }

    /// Micro-op for machine cycle `step`, or `None` once only the retire
    /// cycle is left.
    pub(crate) fn micro_op(self, step: u8) -> Option<MicroOp> {
        use MicroOp::{Internal, Read, Write};

        let imm_lo = Read(Addr::Pc, Temp::Z);
        let imm_hi = Read(Addr::Pc, Temp::W);
        let hl = Addr::Pair(Reg16::Hl);

        let op = match (self, step) {
            (Self::LdRN(_) | Self::LdHlN | Self::LdhNA | Self::LdhAN, 0) => imm_lo,
            (Self::LdHlN, 1) => Write(hl, Source::Z),
            (Self::LdhNA, 1) => Write(Addr::HighZ, Source::Reg(Reg8::A)),
            (Self::LdhAN, 1) => Read(Addr::HighZ, Temp::Z),

            (
                Self::LdRrNn(_) | Self::LdNnSp | Self::JpNn | Self::LdNnA | Self::LdANn,
                0,
            ) => imm_lo,
            (
                Self::LdRrNn(_) | Self::LdNnSp | Self::JpNn | Self::LdNnA | Self::LdANn,
                1,
            ) => imm_hi,
            (Self::LdNnSp, 2) => Write(Addr::Wz, Source::Low(Reg16::Sp)),
            (Self::LdNnSp, 3) => Write(Addr::WzNext, Source::High(Reg16::Sp)),
            (Self::JpNn, 2) => Internal,
            (Self::LdNnA, 2) => Write(Addr::Wz, Source::Reg(Reg8::A)),
            (Self::LdANn, 2) => Read(Addr::Wz, Temp::Z),

            (Self::LdRHl(_) | Self::LdAHli | Self::LdAHld, 0) => Read(hl, Temp::Z),
            (Self::LdHlR(r), 0) => Write(hl, Source::Reg(r)),
            (Self::LdHliA | Self::LdHldA, 0) => Write(hl, Source::Reg(Reg8::A)),
            (Self::LdAInd(pair), 0) => Read(Addr::Pair(pair), Temp::Z),

            (Self::Pop(_), 0) => Read(Addr::SpPostInc, Temp::Z),
            (Self::Pop(_), 1) => Read(Addr::SpPostInc, Temp::W),
            (Self::Push(_), 0) => Internal,
            (Self::Push(pair), 1) => Write(Addr::SpPreDec, Source::High(pair)),
            (Self::Push(pair), 2) => Write(Addr::SpPreDec, Source::Low(pair)),

            (Self::LdhCA, 0) => Write(Addr::HighC, Source::Reg(Reg8::A)),
            (Self::LdhAC, 0) => Read(Addr::HighC, Temp::Z),
            (Self::LdSpHl, 0) => Internal,

            _ => return None,
        };
        Some(op)
    }

    /// Machine cycles after the opcode fetch, including the retire cycle.
    #[must_use]
    pub fn machine_cycles(self) -> u8 {
        let mut step = 0;
        while self.micro_op(step).is_some() {
            step += 1;
        }
        step + 1
    }

    /// Write back the instruction's results. Runs exactly once.
    fn retire(self, regs: &mut Registers, ctx: &ExecContext) {
        match self {
            Self::LdRR { dst, src } => regs.set8(dst, regs.get8(src)),
            Self::LdRN(r) | Self::LdRHl(r) => regs.set8(r, ctx.z),
            Self::LdAInd(_) | Self::LdhAN | Self::LdhAC | Self::LdANn => regs.a = ctx.z,
            Self::LdAHli => {
                regs.a = ctx.z;
                regs.set_hl(regs.hl().wrapping_add(1));
            }
            Self::LdAHld => {
                regs.a = ctx.z;
                regs.set_hl(regs.hl().wrapping_sub(1));
            }
            Self::LdHliA => regs.set_hl(regs.hl().wrapping_add(1)),
            Self::LdHldA => regs.set_hl(regs.hl().wrapping_sub(1)),
            Self::LdRrNn(pair) | Self::Pop(pair) => regs.set16(pair, ctx.wz()),
            Self::JpNn => regs.pc = ctx.wz(),
            Self::LdSpHl => regs.sp = regs.hl(),
            Self::Nop
            | Self::LdHlR(_)
            | Self::LdHlN
            | Self::LdNnSp
            | Self::Push(_)
            | Self::LdhNA
            | Self::LdhCA
            | Self::LdNnA => {}
        }
    }
}

impl Instruction for Op {
    fn cycle(&self, cpu: &mut Cpu, pins: &mut Pins) -> Result<InstrStatus, BusError> {
        // Already retired: hold "last cycle" while the prefetch runs.
        if cpu.exec.retired {
            return Ok(InstrStatus::LastCycle);
        }

        if let Some(op) = self.micro_op(cpu.exec.step) {
            if cpu.run_micro_op(op, pins)? == BusStatus::Done {
                cpu.exec.step += 1;
            }
            return Ok(InstrStatus::Running);
        }

        self.retire(&mut cpu.regs, &cpu.exec);
        cpu.exec.retired = true;
        log::trace!("{self:?} retired, PC={:#06X}", cpu.regs.pc);
        Ok(InstrStatus::LastCycle)
    }
}
