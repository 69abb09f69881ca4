//! NES CPU wrapper around the reusable 6502 core

use crate::bus::{BusError, CpuBus};
use emu_core::cpu_6502::{Cpu6502, CpuError};
use emu_core::logging::{log, LogCategory, LogLevel};

pub type NesCpuError = CpuError<BusError>;

/// The 2A03's CPU half, wired to the console bus.
#[derive(Debug)]
pub struct NesCpu {
    cpu: Cpu6502<CpuBus>,
}

impl NesCpu {
    pub fn new() -> Self {
        Self {
            cpu: Cpu6502::new(CpuBus::new()),
        }
    }

    pub fn bus(&self) -> &CpuBus {
        &self.cpu.memory
    }

    pub fn bus_mut(&mut self) -> &mut CpuBus {
        &mut self.cpu.memory
    }

    /// Registers and cycle counter, read only.
    pub fn core(&self) -> &Cpu6502<CpuBus> {
        &self.cpu
    }

    pub fn reset(&mut self) -> Result<(), NesCpuError> {
        self.cpu.reset()
    }

    /// One CPU clock. A $4014 write in it puts the DMA stall on the CPU.
    pub fn clock(&mut self) -> Result<(), NesCpuError> {
        if let Err(e) = self.cpu.step_one_cycle() {
            log(LogCategory::CPU, LogLevel::Error, || {
                format!("halted at PC={:04X}: {}", self.cpu.pc, e)
            });
            return Err(e);
        }
        if self.cpu.memory.take_dma_request() {
            self.cpu.dma_cycle();
        }
        Ok(())
    }

    pub fn nmi(&mut self) -> Result<(), NesCpuError> {
        self.cpu.nmi()
    }
}

impl Default for NesCpu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::tests::ines_image;
    use crate::cartridge::Cartridge;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn cpu_running(program: &[u8]) -> NesCpu {
        let mut rom = ines_image(1, 1, 0);
        rom[16..16 + program.len()].copy_from_slice(program);
        rom[16 + 0x3FFD] = 0x80;
        let mut cpu = NesCpu::new();
        cpu.bus_mut()
            .connect_cartridge(Rc::new(RefCell::new(Cartridge::from_ines(&rom).unwrap())));
        cpu.reset().unwrap();
        cpu
    }

    #[test]
    fn dma_written_on_odd_cycle_stalls_514() {
        // STA $4014 runs on cycle 1
        let mut cpu = cpu_running(&[0x8D, 0x14, 0x40]);
        cpu.clock().unwrap();
        assert_eq!(cpu.core().cycles, 1);
        assert_eq!(cpu.core().dma_stall(), 514);
    }

    #[test]
    fn dma_written_on_even_cycle_stalls_513() {
        // LDA $10 holds cycles 1-3, STA $4014 runs on cycle 4
        let mut cpu = cpu_running(&[0xA5, 0x10, 0x8D, 0x14, 0x40]);
        for _ in 0..4 {
            cpu.clock().unwrap();
        }
        assert_eq!(cpu.core().cycles, 4);
        assert_eq!(cpu.core().dma_stall(), 513);
    }
}
