//! NES console: 6502 CPU, 2C02 PPU, NROM cartridges and two controllers.
//!
//! [`NesSystem`] owns the CPU, which owns the CPU bus, which owns the PPU and
//! its bus. The cartridge is shared by the two buses. Everything runs on the
//! caller's thread; one CPU cycle is followed by three PPU dots.

pub mod bus;
pub mod cartridge;
mod cpu;
pub mod joystick;
mod mappers;
mod memory;
pub mod ppu;
mod ppu_bus;
pub mod registers;

use crate::bus::BusError;
use crate::cartridge::{Cartridge, CartridgeError, InesHeader};
use crate::cpu::{NesCpu, NesCpuError};
use crate::joystick::{Button, Player};
use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::{types::Frame, MountPointInfo, System};
use std::cell::RefCell;
use std::ops::ControlFlow;
use std::path::Path;
use std::rc::Rc;
use thiserror::Error;

/// Cartridge shared by the CPU and PPU buses.
pub type SharedCartridge = Rc<RefCell<Cartridge>>;

const CARTRIDGE_MOUNT: &str = "Cartridge";

#[derive(Debug, Error)]
pub enum NesError {
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),
    #[error(transparent)]
    Cpu(#[from] NesCpuError),
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error("no cartridge inserted")]
    NoCartridge,
    #[error("console has not been powered up")]
    NotPoweredUp,
    #[error("unknown mount point {0:?}")]
    InvalidMountPoint(String),
    #[error("failed to read ROM: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct NesSystem {
    cpu: NesCpu,
    cartridge: Option<SharedCartridge>,
    powered: bool,
}

impl NesSystem {
    /// A console with no cartridge in the slot.
    pub fn new() -> Self {
        Self {
            cpu: NesCpu::new(),
            cartridge: None,
            powered: false,
        }
    }

    /// Parse an iNES image and plug it in. Nothing changes if parsing fails.
    pub fn insert_cartridge(&mut self, rom: &[u8]) -> Result<(), NesError> {
        let cartridge = Rc::new(RefCell::new(Cartridge::from_ines(rom)?));
        self.cpu.bus_mut().connect_cartridge(cartridge.clone());
        self.cartridge = Some(cartridge);
        self.powered = false;
        Ok(())
    }

    pub fn load_rom_from_path<P: AsRef<Path>>(&mut self, path: P) -> Result<(), NesError> {
        let rom = std::fs::read(path)?;
        self.insert_cartridge(&rom)
    }

    pub fn eject_cartridge(&mut self) {
        self.cpu.bus_mut().disconnect_cartridge();
        self.cartridge = None;
        self.powered = false;
    }

    pub fn cartridge_header(&self) -> Option<InesHeader> {
        self.cartridge.as_ref().map(|c| c.borrow().header().clone())
    }

    /// Reset the CPU from the cartridge's reset vector.
    pub fn power_up(&mut self) -> Result<(), NesError> {
        if self.cartridge.is_none() {
            return Err(NesError::NoCartridge);
        }
        self.cpu.reset()?;
        self.powered = true;
        Ok(())
    }

    /// Run until the PPU finishes a frame.
    pub fn run_frame(&mut self) -> Result<Frame, NesError> {
        if !self.powered {
            return Err(NesError::NotPoweredUp);
        }
        loop {
            self.clock()?;
            if let Some(frame) = self.cpu.bus_mut().ppu_mut().take_frame() {
                return Ok(frame);
            }
        }
    }

    /// Power up and run frames until `on_frame` breaks.
    pub fn run<F>(&mut self, mut on_frame: F) -> Result<(), NesError>
    where
        F: FnMut(&Frame) -> ControlFlow<()>,
    {
        self.power_up()?;
        loop {
            let frame = self.run_frame()?;
            if on_frame(&frame).is_break() {
                return Ok(());
            }
        }
    }

    /// One CPU cycle and the three PPU dots that go with it.
    fn clock(&mut self) -> Result<(), NesError> {
        self.cpu.clock()?;
        for _ in 0..3 {
            let ppu = self.cpu.bus_mut().ppu_mut();
            ppu.tick()?;
            if ppu.take_nmi() {
                self.cpu.nmi()?;
            }
        }
        Ok(())
    }

    pub fn key_down(&mut self, player: Player, button: Button) {
        self.cpu.bus_mut().joystick_mut(player).press(button);
    }

    pub fn key_up(&mut self, player: Player, button: Button) {
        self.cpu.bus_mut().joystick_mut(player).release(button);
    }

    pub fn frame_count(&self) -> u64 {
        self.cpu.bus().ppu().frame_count()
    }

    pub fn pc(&self) -> u16 {
        self.cpu.core().pc
    }

    pub fn cycles(&self) -> u64 {
        self.cpu.core().cycles
    }

    /// Work RAM contents without going through the bus.
    pub fn peek_ram(&self, addr: u16) -> u8 {
        self.cpu.bus().peek_ram(addr)
    }
}

impl Default for NesSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for NesSystem {
    type Error = NesError;

    fn reset(&mut self) -> Result<(), Self::Error> {
        self.power_up()
    }

    fn step_frame(&mut self) -> Result<Frame, Self::Error> {
        if !self.powered {
            self.power_up()?;
        }
        self.run_frame()
    }

    fn mount_points(&self) -> Vec<MountPointInfo> {
        vec![MountPointInfo {
            id: CARTRIDGE_MOUNT.to_string(),
            name: "Cartridge Slot".to_string(),
            extensions: vec!["nes".to_string()],
            required: true,
        }]
    }

    fn mount(&mut self, mount_point_id: &str, data: &[u8]) -> Result<(), Self::Error> {
        if mount_point_id != CARTRIDGE_MOUNT {
            return Err(NesError::InvalidMountPoint(mount_point_id.to_string()));
        }
        self.insert_cartridge(data)?;
        log(LogCategory::Cartridge, LogLevel::Info, || {
            format!("mounted {} bytes", data.len())
        });
        Ok(())
    }

    fn unmount(&mut self, mount_point_id: &str) -> Result<(), Self::Error> {
        if mount_point_id != CARTRIDGE_MOUNT {
            return Err(NesError::InvalidMountPoint(mount_point_id.to_string()));
        }
        self.eject_cartridge();
        Ok(())
    }

    fn is_mounted(&self, mount_point_id: &str) -> bool {
        mount_point_id == CARTRIDGE_MOUNT && self.cartridge.is_some()
    }
}
