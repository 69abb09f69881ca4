//! The PPU's own 14-bit address space.
//!
//! $0000-$1FFF pattern tables (cartridge CHR), $2000-$2FFF nametables with
//! $3000-$3EFF mirroring them, $3F00-$3FFF palette RAM.

use crate::bus::{BusError, ReadWrite};
use crate::cartridge::Mirroring;
use crate::memory::{PaletteRam, RandomAccessBlock, VRam};
use crate::SharedCartridge;

#[derive(Debug)]
pub struct PpuBus {
    vram: VRam,
    palette: PaletteRam,
    mirroring: Mirroring,
    cartridge: Option<SharedCartridge>,
}

impl PpuBus {
    pub fn new() -> Self {
        Self {
            vram: VRam::new(),
            palette: PaletteRam::new(),
            mirroring: Mirroring::Horizontal,
            cartridge: None,
        }
    }

    pub fn connect_cartridge(&mut self, cartridge: SharedCartridge) {
        self.mirroring = cartridge.borrow().mirroring();
        self.cartridge = Some(cartridge);
    }

    pub fn disconnect_cartridge(&mut self) {
        self.cartridge = None;
    }

    fn cartridge(&self) -> Result<&SharedCartridge, BusError> {
        self.cartridge.as_ref().ok_or(BusError::NoCartridge)
    }
}

impl Default for PpuBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold a nametable address onto the 2KB of console VRAM.
pub fn nametable_offset(addr: u16, mirroring: Mirroring) -> u16 {
    let addr = (addr - 0x2000) & 0x0FFF;
    let table = addr >> 10;
    let physical = match mirroring {
        Mirroring::Horizontal => table >> 1,
        Mirroring::Vertical => table & 0x01,
    };
    (physical << 10) | (addr & 0x03FF)
}

impl ReadWrite for PpuBus {
    fn read_byte(&mut self, addr: u16) -> Result<u8, BusError> {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => Ok(self.cartridge()?.borrow().ppu_read(addr)?),
            0x2000..=0x3EFF => Ok(self.vram.read(nametable_offset(addr, self.mirroring))),
            _ => Ok(self.palette.read(addr)),
        }
    }

    fn write_byte(&mut self, addr: u16, data: u8) -> Result<(), BusError> {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => Ok(self.cartridge()?.borrow_mut().ppu_write(addr, data)?),
            0x2000..=0x3EFF => {
                self.vram.write(nametable_offset(addr, self.mirroring), data);
                Ok(())
            }
            _ => {
                self.palette.write(addr, data);
                Ok(())
            }
        }
    }
}
