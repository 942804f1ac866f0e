//! Bus transaction engine.
//!
//! Every memory access takes one machine cycle of eight half-cycles. The
//! engine is called once per half-cycle and drives the pins for that
//! half-cycle only:
//!
//! | h   | Read                          | Write                              |
//! |-----|-------------------------------|------------------------------------|
//! | 0   | WR high, RD low, A15+CS high  | same                               |
//! | 1   | A0-A14 from latch, A15 kept   | same, RD high for ROM/RAM          |
//! | 2   | ROM: A15 low, RAM: CS low     | same                               |
//! | 3   | -                             | WR low, D from latch               |
//! | 4-5 | -                             | -                                  |
//! | 6   | D sampled                     | WR high                            |
//! | 7   | done                          | done                               |
//!
//! Internal addresses leave both A15 and CS high for the whole cycle.
//!
//! A transaction must be driven from h0. Starting it on any other half-cycle
//! is an error rather than a shortened cycle.

use crate::error::{BusError, TransactionKind};
use crate::pins::{A15, Pins, Region};

/// Progress of the transaction after one half-cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusStatus {
    /// More half-cycles to go.
    Busy,
    /// The transaction finished on this half-cycle.
    Done,
}

/// Latches and in-progress flags for the single bus transaction in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusEngine {
    /// Address latched at transaction start.
    address: u16,
    /// Data latched at write start.
    data: u8,
    /// Byte sampled from D at h6 of the last read.
    sampled: u8,
    reading: bool,
    writing: bool,
    /// Set once h0 of the current transaction has been driven.
    started: bool,
}

impl BusEngine {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            address: 0,
            data: 0,
            sampled: 0,
            reading: false,
            writing: false,
            started: false,
        }
    }

    /// Latch the address for a read. Pins are untouched until h0.
    pub fn begin_read(&mut self, address: u16) -> Result<(), BusError> {
        self.ensure_idle(TransactionKind::Read, address)?;
        self.reading = true;
        self.started = false;
        self.address = address;
        Ok(())
    }

    /// Latch the address and data for a write. Pins are untouched until h0.
    pub fn begin_write(&mut self, address: u16, data: u8) -> Result<(), BusError> {
        self.ensure_idle(TransactionKind::Write, address)?;
        self.writing = true;
        self.started = false;
        self.address = address;
        self.data = data;
        Ok(())
    }

    fn ensure_idle(&self, requested: TransactionKind, address: u16) -> Result<(), BusError> {
        match self.active() {
            None => Ok(()),
            Some(active) => {
                log::error!(
                    "{requested} of {address:#06X} overlaps {active} of {:#06X}",
                    self.address
                );
                Err(BusError::Overlap {
                    requested,
                    address,
                    active,
                    latched: self.address,
                })
            }
        }
    }

    /// The transaction in flight, if any.
    #[must_use]
    pub const fn active(&self) -> Option<TransactionKind> {
        if self.reading {
            Some(TransactionKind::Read)
        } else if self.writing {
            Some(TransactionKind::Write)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn read_in_progress(&self) -> bool {
        self.reading
    }

    #[must_use]
    pub const fn write_in_progress(&self) -> bool {
        self.writing
    }

    /// Latched address of the current (or last) transaction.
    #[must_use]
    pub const fn address(&self) -> u16 {
        self.address
    }

    /// Latched write data of the current (or last) write.
    #[must_use]
    pub const fn data(&self) -> u8 {
        self.data
    }

    /// Byte captured at h6 of the last read.
    #[must_use]
    pub const fn sampled(&self) -> u8 {
        self.sampled
    }

    /// Refuse to pick up a fresh transaction anywhere but h0.
    fn check_start(&mut self, kind: TransactionKind, half_cycle: u8) -> Result<(), BusError> {
        if half_cycle == 0 {
            self.started = true;
        }
        if self.started {
            return Ok(());
        }
        log::error!(
            "{kind} of {:#06X} first driven at h{half_cycle}",
            self.address
        );
        Err(BusError::Misaligned { kind, half_cycle })
    }

    /// Address phase shared by reads and writes (h0-h2).
    fn drive_address(&self, half_cycle: u8, pins: &mut Pins) {
        match half_cycle {
            0 => {
                pins.wr = true;
                pins.rd = false;
                // Return A15 and CS to idle before the new address goes out.
                pins.a |= A15;
                pins.cs = true;
            }
            // A15 stays high until h2 decides the region.
            1 => pins.a = (pins.a & A15) | (self.address & !A15),
            2 => match Region::of(self.address) {
                // Cartridge ROM decodes on A15, not on CS.
                Region::Rom => pins.a &= !A15,
                Region::Ram => pins.cs = false,
                Region::Internal => {}
            },
            _ => {}
        }
    }

    /// Drive one half-cycle of the read in progress.
    pub fn handle_read(&mut self, half_cycle: u8, pins: &mut Pins) -> Result<BusStatus, BusError> {
        if !self.reading {
            log::error!("read advanced at h{half_cycle} with no read in progress");
            return Err(BusError::Idle(TransactionKind::Read));
        }
        self.check_start(TransactionKind::Read, half_cycle)?;

        self.drive_address(half_cycle, pins);
        match half_cycle {
            6 => self.sampled = pins.d,
            7 => {
                self.reading = false;
                return Ok(BusStatus::Done);
            }
            // h3-h5: the addressed device is responding
            _ => {}
        }
        Ok(BusStatus::Busy)
    }

    /// Drive one half-cycle of the write in progress.
    pub fn handle_write(&mut self, half_cycle: u8, pins: &mut Pins) -> Result<BusStatus, BusError> {
        if !self.writing {
            log::error!("write advanced at h{half_cycle} with no write in progress");
            return Err(BusError::Idle(TransactionKind::Write));
        }
        self.check_start(TransactionKind::Write, half_cycle)?;

        self.drive_address(half_cycle, pins);
        match half_cycle {
            1 if Region::of(self.address).is_external() => pins.rd = true,
            3 => {
                pins.wr = false;
                pins.d = self.data;
            }
            6 => pins.wr = true,
            7 => {
                self.writing = false;
                return Ok(BusStatus::Done);
            }
            _ => {}
        }
        Ok(BusStatus::Busy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockDivider;

    /// Run one whole transaction, recording the pins after each half-cycle.
    fn run(engine: &mut BusEngine, pins: &mut Pins) -> Vec<Pins> {
        let mut clock = ClockDivider::new();
        let writing = engine.write_in_progress();
        let mut trace = Vec::new();
        for _ in 0..8 {
            let status = if writing {
                engine.handle_write(clock.half_cycle(), pins)
            } else {
                engine.handle_read(clock.half_cycle(), pins)
            };
            let done = status == Ok(BusStatus::Done);
            assert_eq!(done, clock.half_cycle() == 7);
            trace.push(*pins);
            clock.advance(pins);
        }
        trace
    }

    fn a15(trace: &[Pins]) -> Vec<bool> {
        trace.iter().map(Pins::a15).collect()
    }

    fn cs(trace: &[Pins]) -> Vec<bool> {
        trace.iter().map(|p| p.cs).collect()
    }

    #[test]
    fn rom_read_drops_a15() {
        let mut engine = BusEngine::new();
        let mut pins = Pins::idle();
        engine.begin_read(0x0150).expect("bus idle");
        let trace = run(&mut engine, &mut pins);

        assert_eq!(a15(&trace), [true, true, false, false, false, false, false, false]);
        assert!(cs(&trace).iter().all(|&cs| cs));
        assert!(trace.iter().all(|p| !p.rd && p.wr));
        assert_eq!(trace[1].a, 0x8150);
        assert_eq!(trace[2].a, 0x0150);
    }

    #[test]
    fn ram_read_asserts_cs() {
        let mut engine = BusEngine::new();
        let mut pins = Pins::idle();
        engine.begin_read(0xC123).expect("bus idle");
        let trace = run(&mut engine, &mut pins);

        assert!(a15(&trace).iter().all(|&a15| a15));
        assert_eq!(cs(&trace)[..6], [true, true, false, false, false, false]);
        assert_eq!(trace[2].a, 0xC123);
    }

    #[test]
    fn internal_reads_leave_a15_and_cs_high() {
        for address in [0xFE00, 0xFF80, 0xFFFF, 0x8000, 0x9ABC] {
            let mut engine = BusEngine::new();
            let mut pins = Pins::idle();
            engine.begin_read(address).expect("bus idle");
            let trace = run(&mut engine, &mut pins);
            assert!(a15(&trace).iter().all(|&a15| a15), "A15 at {address:#06X}");
            assert!(cs(&trace).iter().all(|&cs| cs), "CS at {address:#06X}");
        }
    }

    #[test]
    fn read_samples_at_h6() {
        let mut engine = BusEngine::new();
        let mut clock = ClockDivider::new();
        let mut pins = Pins::idle();
        engine.begin_read(0x4000).expect("bus idle");

        for _ in 0..6 {
            pins.d = 0x11;
            assert_eq!(engine.handle_read(clock.half_cycle(), &mut pins), Ok(BusStatus::Busy));
            clock.advance(&mut pins);
        }
        pins.d = 0x42;
        assert_eq!(engine.handle_read(clock.half_cycle(), &mut pins), Ok(BusStatus::Busy));
        clock.advance(&mut pins);
        pins.d = 0x99;
        assert_eq!(engine.handle_read(clock.half_cycle(), &mut pins), Ok(BusStatus::Done));

        assert_eq!(engine.sampled(), 0x42);
        assert!(!engine.read_in_progress());
    }

    #[test]
    fn write_strobes_data_from_h3_to_h5() {
        let mut engine = BusEngine::new();
        let mut pins = Pins::idle();
        engine.begin_write(0xC000, 0x5A).expect("bus idle");
        let trace = run(&mut engine, &mut pins);

        let wr: Vec<bool> = trace.iter().map(|p| p.wr).collect();
        assert_eq!(wr, [true, true, true, false, false, false, true, true]);
        assert!(!trace[0].rd, "RD pulled low at h0");
        assert!(trace[1..].iter().all(|p| p.rd), "RD released at h1 for RAM");
        assert!(trace[3..].iter().all(|p| p.d == 0x5A));
        assert!(!engine.write_in_progress());
    }

    #[test]
    fn internal_write_keeps_rd_low() {
        let mut engine = BusEngine::new();
        let mut pins = Pins::idle();
        engine.begin_write(0xFF80, 0x01).expect("bus idle");
        let trace = run(&mut engine, &mut pins);
        assert!(trace.iter().all(|p| !p.rd));
        assert!(!trace[3].wr);
    }

    #[test]
    fn read_and_write_share_select_timing() {
        for address in [0x0000, 0x3FFF, 0x7FFF, 0x8000, 0xA000, 0xD000, 0xFDFF, 0xFE00, 0xFFFF] {
            let mut pins = Pins::idle();
            let mut reader = BusEngine::new();
            reader.begin_read(address).expect("bus idle");
            let read = run(&mut reader, &mut pins);

            let mut pins = Pins::idle();
            let mut writer = BusEngine::new();
            writer.begin_write(address, 0xFF).expect("bus idle");
            let write = run(&mut writer, &mut pins);

            assert_eq!(a15(&read), a15(&write), "A15 at {address:#06X}");
            assert_eq!(cs(&read), cs(&write), "CS at {address:#06X}");
        }
    }

    #[test]
    fn overlapping_begin_keeps_latches() {
        let mut engine = BusEngine::new();
        engine.begin_read(0x1234).expect("bus idle");

        assert_eq!(
            engine.begin_read(0x5678),
            Err(BusError::Overlap {
                requested: TransactionKind::Read,
                address: 0x5678,
                active: TransactionKind::Read,
                latched: 0x1234,
            })
        );
        assert!(engine.begin_write(0xC000, 0xAA).is_err());
        assert_eq!(engine.address(), 0x1234);
        assert_eq!(engine.data(), 0);
        assert!(engine.read_in_progress());
        assert!(!engine.write_in_progress());
    }

    #[test]
    fn advancing_idle_bus_fails() {
        let mut engine = BusEngine::new();
        let mut pins = Pins::idle();
        assert_eq!(
            engine.handle_read(0, &mut pins),
            Err(BusError::Idle(TransactionKind::Read))
        );
        assert_eq!(
            engine.handle_write(0, &mut pins),
            Err(BusError::Idle(TransactionKind::Write))
        );
        assert_eq!(pins, Pins::idle());
    }

    #[test]
    fn rom_write_keeps_a15_high_through_h1() {
        let mut engine = BusEngine::new();
        let mut pins = Pins::idle();
        engine.begin_write(0x2000, 0x01).expect("bus idle");
        let trace = run(&mut engine, &mut pins);
        assert_eq!(a15(&trace)[..3], [true, true, false]);
    }

    #[test]
    fn transaction_must_start_at_h0() {
        let mut engine = BusEngine::new();
        let mut pins = Pins::idle();
        engine.begin_read(0xC000).expect("bus idle");

        assert_eq!(
            engine.handle_read(3, &mut pins),
            Err(BusError::Misaligned {
                kind: TransactionKind::Read,
                half_cycle: 3,
            })
        );
        assert_eq!(pins, Pins::idle());
        assert_eq!(engine.address(), 0xC000);
        assert!(engine.read_in_progress());

        // Still usable from the next h0.
        let trace = run(&mut engine, &mut pins);
        assert_eq!(trace[2].a, 0xC000);
        assert!(!trace[2].cs);
    }

    #[test]
    fn misaligned_write_is_rejected() {
        let mut engine = BusEngine::new();
        let mut pins = Pins::idle();
        engine.begin_write(0xFF80, 0x12).expect("bus idle");
        assert_eq!(
            engine.handle_write(5, &mut pins),
            Err(BusError::Misaligned {
                kind: TransactionKind::Write,
                half_cycle: 5,
            })
        );
        assert_eq!(engine.data(), 0x12);
        assert_eq!(pins, Pins::idle());
    }

    #[test]
    fn engine_is_reusable_after_done() {
        let mut engine = BusEngine::new();
        let mut pins = Pins::idle();
        engine.begin_write(0xA000, 0x10).expect("bus idle");
        run(&mut engine, &mut pins);
        engine.begin_read(0x0000).expect("bus idle after write");
        assert_eq!(engine.active(), Some(TransactionKind::Read));
    }
}
