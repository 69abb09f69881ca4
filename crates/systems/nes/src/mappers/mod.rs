//! Cartridge mappers
//!
//! A mapper turns CPU and PPU bus addresses into offsets inside the
//! cartridge's ROM images and owns whatever RAM or registers the board adds.

mod nrom;

pub use nrom::Nrom;

use crate::cartridge::{CartridgeError, InesHeader};
use std::fmt;

pub trait Mapper: fmt::Debug {
    fn id(&self) -> u8;

    fn name(&self) -> &'static str;

    /// Read from PRG RAM/ROM space ($6000-$FFFF)
    fn cpu_read(&self, prg_rom: &[u8], addr: u16) -> Result<u8, CartridgeError>;

    fn cpu_write(&mut self, prg_len: usize, addr: u16, data: u8) -> Result<(), CartridgeError>;

    /// Offset of a pattern-table address inside the CHR image.
    fn chr_offset(&self, chr_len: usize, addr: u16) -> Result<usize, CartridgeError>;
}

/// Build the board named by the header's mapper id.
pub fn from_header(
    header: &InesHeader,
    prg_len: usize,
    chr_len: usize,
) -> Result<Box<dyn Mapper>, CartridgeError> {
    match header.mapper_id {
        0 => Ok(Box::new(Nrom::new(prg_len, chr_len)?)),
        id => Err(CartridgeError::UnsupportedMapper(id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Mirroring;

    fn header(mapper_id: u8) -> InesHeader {
        InesHeader {
            prg_banks: 1,
            chr_banks: 1,
            mapper_id,
            mirroring: Mirroring::Horizontal,
            has_trainer: false,
            four_screen: false,
        }
    }

    #[test]
    fn mapper_zero_is_nrom() {
        let mapper = from_header(&header(0), 0x4000, 0x2000).unwrap();
        assert_eq!(mapper.id(), 0);
        assert_eq!(mapper.name(), "NROM");
    }

    #[test]
    fn other_ids_are_rejected() {
        assert_eq!(
            from_header(&header(4), 0x4000, 0x2000).unwrap_err(),
            CartridgeError::UnsupportedMapper(4)
        );
    }
}
