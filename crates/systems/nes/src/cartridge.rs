use crate::mappers::{self, Mapper};
use emu_core::logging::{log, LogCategory, LogLevel};
use serde::Serialize;
use thiserror::Error;

const MAGIC: &[u8; 4] = b"NES\x1A";
const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
pub const PRG_BANK_SIZE: usize = 0x4000;
pub const CHR_BANK_SIZE: usize = 0x2000;
/// Header, one PRG bank and one CHR bank.
const MIN_IMAGE_LEN: usize = HEADER_LEN + PRG_BANK_SIZE + CHR_BANK_SIZE;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartridgeError {
    #[error("ROM image is {len} bytes, need at least {min}")]
    TooSmall { len: usize, min: usize },
    #[error("missing iNES magic bytes")]
    BadMagic,
    #[error("ROM image is {actual} bytes but its header declares {expected}")]
    Truncated { expected: usize, actual: usize },
    #[error("mapper {0} is not supported")]
    UnsupportedMapper(u8),
    #[error("unsupported PRG ROM size {0:#X}")]
    UnsupportedPrgSize(usize),
    #[error("unsupported CHR size {0:#X}")]
    UnsupportedChrSize(usize),
    #[error("cartridge address {0:04X} is out of range")]
    AddressOutOfRange(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mirroring {
    /// $2000 = $2400, $2800 = $2C00 (vertical scrolling games)
    Horizontal,
    /// $2000 = $2800, $2400 = $2C00 (horizontal scrolling games)
    Vertical,
}

/// The parts of an iNES header this console understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InesHeader {
    pub prg_banks: u8,
    pub chr_banks: u8,
    pub mapper_id: u8,
    pub mirroring: Mirroring,
    pub has_trainer: bool,
    pub four_screen: bool,
}

impl InesHeader {
    pub fn parse(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < MIN_IMAGE_LEN {
            return Err(CartridgeError::TooSmall {
                len: data.len(),
                min: MIN_IMAGE_LEN,
            });
        }
        if &data[0..4] != MAGIC {
            return Err(CartridgeError::BadMagic);
        }

        let flags6 = data[6];
        let flags7 = data[7];
        let mirroring = if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        Ok(Self {
            prg_banks: data[4],
            chr_banks: data[5],
            mapper_id: (flags6 >> 4) | (flags7 & 0xF0),
            mirroring,
            has_trainer: flags6 & 0x04 != 0,
            four_screen: flags6 & 0x08 != 0,
        })
    }

    pub fn prg_rom_len(&self) -> usize {
        self.prg_banks as usize * PRG_BANK_SIZE
    }

    pub fn chr_rom_len(&self) -> usize {
        self.chr_banks as usize * CHR_BANK_SIZE
    }

    /// Bytes the whole image should hold according to the header.
    pub fn image_len(&self) -> usize {
        let trainer = if self.has_trainer { TRAINER_LEN } else { 0 };
        HEADER_LEN + trainer + self.prg_rom_len() + self.chr_rom_len()
    }
}

/// Immutable ROM images plus the mapper that translates addresses into them.
#[derive(Debug)]
pub struct Cartridge {
    header: InesHeader,
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    mapper: Box<dyn Mapper>,
}

impl Cartridge {
    /// Parse an iNES image.
    pub fn from_ines(data: &[u8]) -> Result<Self, CartridgeError> {
        let header = InesHeader::parse(data)?;
        if data.len() < header.image_len() {
            return Err(CartridgeError::Truncated {
                expected: header.image_len(),
                actual: data.len(),
            });
        }
        if header.four_screen {
            log(LogCategory::Cartridge, LogLevel::Warn, || {
                format!(
                    "four-screen VRAM not supported, using {:?} mirroring",
                    header.mirroring
                )
            });
        }

        let prg_start = HEADER_LEN + if header.has_trainer { TRAINER_LEN } else { 0 };
        let chr_start = prg_start + header.prg_rom_len();
        let prg_rom = data[prg_start..chr_start].to_vec();

        let chr_is_ram = header.chr_banks == 0;
        let chr = if chr_is_ram {
            vec![0; CHR_BANK_SIZE]
        } else {
            data[chr_start..chr_start + header.chr_rom_len()].to_vec()
        };

        let mapper = mappers::from_header(&header, prg_rom.len(), chr.len())?;

        log(LogCategory::Cartridge, LogLevel::Info, || {
            format!(
                "loaded mapper {} ({}): {}KB PRG, {}KB CHR {}, {:?} mirroring",
                mapper.id(),
                mapper.name(),
                prg_rom.len() / 1024,
                chr.len() / 1024,
                if chr_is_ram { "RAM" } else { "ROM" },
                header.mirroring
            )
        });

        Ok(Self {
            header,
            prg_rom,
            chr,
            chr_is_ram,
            mapper,
        })
    }

    pub fn header(&self) -> &InesHeader {
        &self.header
    }

    pub fn mirroring(&self) -> Mirroring {
        self.header.mirroring
    }

    pub fn prg_rom(&self) -> &[u8] {
        &self.prg_rom
    }

    pub fn chr(&self) -> &[u8] {
        &self.chr
    }

    pub fn has_chr_ram(&self) -> bool {
        self.chr_is_ram
    }

    /// CPU access to $6000-$FFFF.
    pub fn cpu_read(&self, addr: u16) -> Result<u8, CartridgeError> {
        self.mapper.cpu_read(&self.prg_rom, addr)
    }

    pub fn cpu_write(&mut self, addr: u16, data: u8) -> Result<(), CartridgeError> {
        self.mapper.cpu_write(self.prg_rom.len(), addr, data)
    }

    /// PPU access to the pattern tables at $0000-$1FFF.
    pub fn ppu_read(&self, addr: u16) -> Result<u8, CartridgeError> {
        let offset = self.mapper.chr_offset(self.chr.len(), addr)?;
        Ok(self.chr[offset])
    }

    /// Stores only when the board carries CHR RAM.
    pub fn ppu_write(&mut self, addr: u16, data: u8) -> Result<(), CartridgeError> {
        let offset = self.mapper.chr_offset(self.chr.len(), addr)?;
        if self.chr_is_ram {
            self.chr[offset] = data;
        } else {
            log(LogCategory::Cartridge, LogLevel::Debug, || {
                format!("ignored CHR ROM write {:02X} -> {:04X}", data, addr)
            });
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal iNES image: `prg_banks` x 16KB PRG, `chr_banks` x 8KB CHR.
    pub(crate) fn ines_image(prg_banks: u8, chr_banks: u8, flags6: u8) -> Vec<u8> {
        let mut rom = vec![0x4E, 0x45, 0x53, 0x1A, prg_banks, chr_banks, flags6, 0];
        rom.resize(HEADER_LEN, 0);
        rom.resize(
            HEADER_LEN + prg_banks as usize * PRG_BANK_SIZE + chr_banks as usize * CHR_BANK_SIZE,
            0,
        );
        rom
    }

    #[test]
    fn parses_nrom_header() {
        let cart = Cartridge::from_ines(&ines_image(2, 1, 0x01)).unwrap();
        assert_eq!(cart.prg_rom().len(), 0x8000);
        assert_eq!(cart.chr().len(), 0x2000);
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
        assert_eq!(cart.header().mapper_id, 0);
        assert!(!cart.has_chr_ram());
    }

    #[test]
    fn rejects_short_image() {
        let err = Cartridge::from_ines(&[0x4E, 0x45, 0x53, 0x1A]).unwrap_err();
        assert!(matches!(err, CartridgeError::TooSmall { len: 4, .. }));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut rom = ines_image(1, 1, 0);
        rom[3] = 0x00;
        assert_eq!(Cartridge::from_ines(&rom).unwrap_err(), CartridgeError::BadMagic);
    }

    #[test]
    fn rejects_image_shorter_than_header_declares() {
        let mut rom = ines_image(1, 1, 0);
        rom[4] = 2;
        assert!(matches!(
            Cartridge::from_ines(&rom).unwrap_err(),
            CartridgeError::Truncated { .. }
        ));
    }

    #[test]
    fn rejects_other_mappers() {
        let mut rom = ines_image(1, 1, 0x10);
        rom[7] = 0x00;
        assert_eq!(
            Cartridge::from_ines(&rom).unwrap_err(),
            CartridgeError::UnsupportedMapper(1)
        );

        let mut rom = ines_image(1, 1, 0x40);
        rom[7] = 0x10;
        assert_eq!(
            Cartridge::from_ines(&rom).unwrap_err(),
            CartridgeError::UnsupportedMapper(0x14)
        );
    }

    #[test]
    fn skips_trainer() {
        let mut rom = vec![0x4E, 0x45, 0x53, 0x1A, 1, 1, 0x04, 0];
        rom.resize(HEADER_LEN, 0);
        rom.extend(std::iter::repeat(0xEE).take(TRAINER_LEN));
        rom.push(0xA9);
        rom.resize(HEADER_LEN + TRAINER_LEN + PRG_BANK_SIZE + CHR_BANK_SIZE, 0);

        let cart = Cartridge::from_ines(&rom).unwrap();
        assert_eq!(cart.prg_rom()[0], 0xA9);
        assert_eq!(cart.cpu_read(0x8000).unwrap(), 0xA9);
    }

    #[test]
    fn four_screen_falls_back_to_header_mirroring() {
        let cart = Cartridge::from_ines(&ines_image(1, 1, 0x08)).unwrap();
        assert!(cart.header().four_screen);
        assert_eq!(cart.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn chr_ram_is_writable_chr_rom_is_not() {
        let mut ram_cart = Cartridge::from_ines(&{
            let mut rom = ines_image(1, 0, 0);
            rom.resize(HEADER_LEN + PRG_BANK_SIZE + CHR_BANK_SIZE, 0);
            rom
        })
        .unwrap();
        assert!(ram_cart.has_chr_ram());
        ram_cart.ppu_write(0x0010, 0x99).unwrap();
        assert_eq!(ram_cart.ppu_read(0x0010).unwrap(), 0x99);

        let mut rom_cart = Cartridge::from_ines(&ines_image(1, 1, 0)).unwrap();
        rom_cart.ppu_write(0x0010, 0x99).unwrap();
        assert_eq!(rom_cart.ppu_read(0x0010).unwrap(), 0x00);
    }
}
