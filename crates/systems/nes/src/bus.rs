//! CPU address decode.
//!
//! ```text
//! $0000-$1FFF  2KB work RAM, mirrored
//! $2000-$3FFF  PPU registers, mirrored every 8 bytes
//! $4000-$401F  APU and I/O: OAM DMA at $4014, controllers at $4016/$4017
//! $4020-$5FFF  expansion area, not wired
//! $6000-$FFFF  cartridge
//! ```

use crate::cartridge::CartridgeError;
use crate::joystick::{Joystick, Player};
use crate::memory::{RandomAccessBlock, Ram};
use crate::ppu::Ppu;
use crate::SharedCartridge;
use emu_core::cpu_6502::Memory6502;
use emu_core::logging::{log, LogCategory, LogLevel};
use thiserror::Error;

pub const OAM_DMA: u16 = 0x4014;
pub const JOYPAD1: u16 = 0x4016;
pub const JOYPAD2: u16 = 0x4017;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("read from write-only register {0:04X}")]
    WriteOnlyRegister(u16),
    #[error("write to read-only register {0:04X}")]
    ReadOnlyRegister(u16),
    #[error("no device mapped at {0:04X}")]
    InvalidAddress(u16),
    #[error("no cartridge inserted")]
    NoCartridge,
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),
}

/// Byte access on one of the console's buses.
pub trait ReadWrite {
    fn read_byte(&mut self, addr: u16) -> Result<u8, BusError>;
    fn write_byte(&mut self, addr: u16, data: u8) -> Result<(), BusError>;
}

#[derive(Debug)]
pub struct CpuBus {
    ram: Ram,
    ppu: Ppu,
    joysticks: [Joystick; 2],
    cartridge: Option<SharedCartridge>,
    dma_pending: bool,
}

impl CpuBus {
    pub fn new() -> Self {
        Self {
            ram: Ram::new(),
            ppu: Ppu::new(),
            joysticks: [Joystick::new(), Joystick::new()],
            cartridge: None,
            dma_pending: false,
        }
    }

    /// Wire a cartridge into both the CPU and PPU side.
    pub fn connect_cartridge(&mut self, cartridge: SharedCartridge) {
        self.ppu.connect_cartridge(cartridge.clone());
        self.cartridge = Some(cartridge);
    }

    pub fn disconnect_cartridge(&mut self) {
        self.ppu.disconnect_cartridge();
        self.cartridge = None;
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn ppu_mut(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    pub fn joystick_mut(&mut self, player: Player) -> &mut Joystick {
        &mut self.joysticks[player.index()]
    }

    /// Work RAM without side effects.
    pub fn peek_ram(&self, addr: u16) -> u8 {
        self.ram.read(addr)
    }

    /// True once after a $4014 write; the CPU owes the DMA stall.
    pub fn take_dma_request(&mut self) -> bool {
        std::mem::take(&mut self.dma_pending)
    }

    fn cartridge(&self) -> Result<&SharedCartridge, BusError> {
        self.cartridge.as_ref().ok_or(BusError::NoCartridge)
    }

    /// Copy one 256-byte CPU page into OAM.
    fn oam_dma(&mut self, page: u8) -> Result<(), BusError> {
        let base = (page as u16) << 8;
        let mut data = [0u8; 256];
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = self.read_byte(base | i as u16)?;
        }
        self.ppu.write_oam_dma(&data);
        self.dma_pending = true;
        log(LogCategory::Bus, LogLevel::Debug, || {
            format!("OAM DMA from page {:02X}", page)
        });
        Ok(())
    }
}

impl Default for CpuBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadWrite for CpuBus {
    fn read_byte(&mut self, addr: u16) -> Result<u8, BusError> {
        match addr {
            0x0000..=0x1FFF => Ok(self.ram.read(addr)),
            0x2000..=0x3FFF => self.ppu.read_register(addr),
            OAM_DMA => Err(BusError::WriteOnlyRegister(addr)),
            JOYPAD1 => Ok(self.joysticks[0].read()),
            JOYPAD2 => Ok(self.joysticks[1].read()),
            // APU and test registers; sound is not emulated
            0x4000..=0x401F => Ok(0),
            0x4020..=0x5FFF => Err(BusError::InvalidAddress(addr)),
            0x6000..=0xFFFF => Ok(self.cartridge()?.borrow().cpu_read(addr)?),
        }
    }

    fn write_byte(&mut self, addr: u16, data: u8) -> Result<(), BusError> {
        match addr {
            0x0000..=0x1FFF => {
                self.ram.write(addr, data);
                Ok(())
            }
            0x2000..=0x3FFF => self.ppu.write_register(addr, data),
            OAM_DMA => self.oam_dma(data),
            JOYPAD1 => {
                for pad in &mut self.joysticks {
                    pad.write(data);
                }
                Ok(())
            }
            // APU, frame counter ($4017) and test registers
            0x4000..=0x401F => Ok(()),
            0x4020..=0x5FFF => Err(BusError::InvalidAddress(addr)),
            0x6000..=0xFFFF => Ok(self.cartridge()?.borrow_mut().cpu_write(addr, data)?),
        }
    }
}

impl Memory6502 for CpuBus {
    type Error = BusError;

    fn read(&mut self, addr: u16) -> Result<u8, BusError> {
        self.read_byte(addr)
    }

    fn write(&mut self, addr: u16, val: u8) -> Result<(), BusError> {
        self.write_byte(addr, val)
    }
}
