//! The LR35902 package: CPU core, its pins and the bus sets it shares.

use std::rc::Rc;

use crate::arbitration::{BusSet, SharedBusSet};
use crate::config::CpuConfig;
use crate::cpu::Cpu;
use crate::error::BusError;
use crate::pins::Pins;

/// Owner of the CPU and everything wired to it.
///
/// Other chips get at the pins through `pins` / `pins_mut` between calls to
/// `clock()`, and at the arbitration state through the bus-set handles.
#[derive(Debug)]
pub struct Lr35902 {
    pins: Pins,
    cpu: Cpu,
    main_bus: SharedBusSet,
    vram_bus: SharedBusSet,
}

impl Lr35902 {
    #[must_use]
    pub fn new(config: &CpuConfig) -> Self {
        let mut pins = Pins::idle();
        let main_bus = BusSet::shared();
        let vram_bus = BusSet::shared();
        let cpu = Cpu::new(config, &mut pins, Rc::clone(&main_bus), Rc::clone(&vram_bus));
        Self {
            pins,
            cpu,
            main_bus,
            vram_bus,
        }
    }

    /// Advance the CPU one half-cycle against the package pins.
    pub fn clock(&mut self) -> Result<(), BusError> {
        self.cpu.clock(&mut self.pins)
    }

    #[must_use]
    pub const fn pins(&self) -> &Pins {
        &self.pins
    }

    pub fn pins_mut(&mut self) -> &mut Pins {
        &mut self.pins
    }

    #[must_use]
    pub const fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    /// Arbitration for the main (cartridge/WRAM) bus.
    #[must_use]
    pub fn main_bus(&self) -> &SharedBusSet {
        &self.main_bus
    }

    /// Arbitration for the video memory bus.
    #[must_use]
    pub fn vram_bus(&self) -> &SharedBusSet {
        &self.vram_bus
    }

    /// Reset the CPU. The pins return to idle and the bus sets are untouched.
    pub fn reset(&mut self, config: &CpuConfig) {
        self.cpu.reset(config, &mut self.pins);
    }
}

impl Default for Lr35902 {
    fn default() -> Self {
        Self::new(&CpuConfig::default())
    }
}
