//! Pin-level memory harness shared by the integration tests.
//!
//! The memory sits on the same pins as the CPU and reacts after every CPU
//! half-cycle: it drives D while RD is low and WR is high, and commits a
//! write on the rising edge of WR.

#![allow(dead_code)]

use sharp_lr35902::{BusSet, Cpu, CpuConfig, Pins, State};

/// Flat 64K memory that answers on the pins.
pub struct PinMemory {
    data: Vec<u8>,
    last_wr: bool,
    /// Every committed write, in order.
    pub writes: Vec<(u16, u8)>,
}

impl PinMemory {
    pub fn new() -> Self {
        Self {
            data: vec![0; 0x1_0000],
            last_wr: true,
            writes: Vec::new(),
        }
    }

    pub fn load(&mut self, address: u16, bytes: &[u8]) {
        let start = address as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
    }

    pub fn peek(&self, address: u16) -> u8 {
        self.data[address as usize]
    }

    /// React to the pins the CPU just drove.
    pub fn respond(&mut self, pins: &mut Pins) {
        if !self.last_wr && pins.wr {
            self.data[pins.a as usize] = pins.d;
            self.writes.push((pins.a, pins.d));
        }
        self.last_wr = pins.wr;

        if !pins.rd && pins.wr {
            pins.d = self.data[pins.a as usize];
        }
    }
}

/// A CPU, its pins and a memory wired to them.
pub struct Rig {
    pub cpu: Cpu,
    pub pins: Pins,
    pub mem: PinMemory,
}

impl Rig {
    pub fn new(entry_point: u16) -> Self {
        Self::with_config(&CpuConfig::with_entry_point(entry_point))
    }

    pub fn with_config(config: &CpuConfig) -> Self {
        init_logger();
        let mut pins = Pins::idle();
        let cpu = Cpu::new(config, &mut pins, BusSet::shared(), BusSet::shared());
        Self {
            cpu,
            pins,
            mem: PinMemory::new(),
        }
    }

    /// Start in the externally driven state.
    pub fn external() -> Self {
        Self::with_config(&CpuConfig {
            entry_point: 0x0000,
            initial_state: State::ExternallyDriven,
        })
    }

    /// One half-cycle: CPU first, then memory.
    pub fn step(&mut self) {
        self.cpu.clock(&mut self.pins).expect("bus contract held");
        self.mem.respond(&mut self.pins);
    }

    pub fn steps(&mut self, count: usize) {
        for _ in 0..count {
            self.step();
        }
    }

    /// Run whole machine cycles.
    pub fn machine_cycles(&mut self, count: usize) {
        self.steps(count * 8);
    }

    /// Step, recording the pins after each half-cycle.
    pub fn trace(&mut self, count: usize) -> Vec<Pins> {
        (0..count)
            .map(|_| {
                self.step();
                self.pins
            })
            .collect()
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
