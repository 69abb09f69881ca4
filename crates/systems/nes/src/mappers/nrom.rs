use super::Mapper;
use crate::cartridge::{CartridgeError, CHR_BANK_SIZE};
use emu_core::logging::{log, LogCategory, LogLevel};

const PRG_RAM_SIZE: usize = 0x2000;

/// NROM (Mapper 0) - 16KB or 32KB PRG, 8KB CHR, no banking
#[derive(Debug)]
pub struct Nrom {
    prg_ram: Box<[u8; PRG_RAM_SIZE]>,
}

impl Nrom {
    pub fn new(prg_len: usize, chr_len: usize) -> Result<Self, CartridgeError> {
        prg_mask(prg_len)?;
        if chr_len != CHR_BANK_SIZE {
            return Err(CartridgeError::UnsupportedChrSize(chr_len));
        }
        Ok(Self {
            prg_ram: Box::new([0; PRG_RAM_SIZE]),
        })
    }
}

impl Mapper for Nrom {
    fn id(&self) -> u8 {
        0
    }

    fn name(&self) -> &'static str {
        "NROM"
    }

    fn cpu_read(&self, prg_rom: &[u8], addr: u16) -> Result<u8, CartridgeError> {
        match addr {
            0x6000..=0x7FFF => Ok(self.prg_ram[(addr - 0x6000) as usize]),
            0x8000..=0xFFFF => {
                let mask = prg_mask(prg_rom.len())?;
                Ok(prg_rom[(addr & mask) as usize])
            }
            _ => Err(CartridgeError::AddressOutOfRange(addr)),
        }
    }

    fn cpu_write(&mut self, prg_len: usize, addr: u16, data: u8) -> Result<(), CartridgeError> {
        match addr {
            0x6000..=0x7FFF => {
                self.prg_ram[(addr - 0x6000) as usize] = data;
                Ok(())
            }
            0x8000..=0xFFFF => {
                prg_mask(prg_len)?;
                log(LogCategory::Cartridge, LogLevel::Debug, || {
                    format!("ignored PRG ROM write {:02X} -> {:04X}", data, addr)
                });
                Ok(())
            }
            _ => Err(CartridgeError::AddressOutOfRange(addr)),
        }
    }

    fn chr_offset(&self, chr_len: usize, addr: u16) -> Result<usize, CartridgeError> {
        if chr_len != CHR_BANK_SIZE {
            return Err(CartridgeError::UnsupportedChrSize(chr_len));
        }
        if addr >= 0x2000 {
            return Err(CartridgeError::AddressOutOfRange(addr));
        }
        Ok(addr as usize)
    }
}

/// Mask turning $8000-$FFFF into a PRG offset; 16KB images repeat at $C000.
fn prg_mask(prg_len: usize) -> Result<u16, CartridgeError> {
    match prg_len {
        0x4000 => Ok(0x3FFF),
        0x8000 => Ok(0x7FFF),
        len => Err(CartridgeError::UnsupportedPrgSize(len)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nrom_16kb_mirroring() {
        let mut prg = vec![0x42; 0x4000];
        prg[0x3FFC] = 0x00;
        prg[0x3FFD] = 0x80;
        let nrom = Nrom::new(prg.len(), 0x2000).unwrap();

        // 16KB ROM should mirror at 0x8000 and 0xC000
        assert_eq!(nrom.cpu_read(&prg, 0x8000).unwrap(), 0x42);
        assert_eq!(nrom.cpu_read(&prg, 0xC000).unwrap(), 0x42);
        assert_eq!(nrom.cpu_read(&prg, 0xBFFC).unwrap(), 0x00);
        assert_eq!(nrom.cpu_read(&prg, 0xFFFD).unwrap(), 0x80);
    }

    #[test]
    fn nrom_32kb_no_mirroring() {
        let mut prg = vec![0; 0x8000];
        prg[0] = 0x11;
        prg[0x4000] = 0x22;
        let nrom = Nrom::new(prg.len(), 0x2000).unwrap();

        // 32KB ROM should not mirror
        assert_eq!(nrom.cpu_read(&prg, 0x8000).unwrap(), 0x11);
        assert_eq!(nrom.cpu_read(&prg, 0xC000).unwrap(), 0x22);
    }

    #[test]
    fn prg_ram_is_read_write() {
        let prg = vec![0; 0x4000];
        let mut nrom = Nrom::new(prg.len(), 0x2000).unwrap();
        nrom.cpu_write(prg.len(), 0x6000, 0xAB).unwrap();
        nrom.cpu_write(prg.len(), 0x7FFF, 0xCD).unwrap();
        assert_eq!(nrom.cpu_read(&prg, 0x6000).unwrap(), 0xAB);
        assert_eq!(nrom.cpu_read(&prg, 0x7FFF).unwrap(), 0xCD);
    }

    #[test]
    fn prg_rom_writes_are_dropped() {
        let prg = vec![0x33; 0x4000];
        let mut nrom = Nrom::new(prg.len(), 0x2000).unwrap();
        nrom.cpu_write(prg.len(), 0x8000, 0x00).unwrap();
        assert_eq!(nrom.cpu_read(&prg, 0x8000).unwrap(), 0x33);
    }

    #[test]
    fn odd_sizes_are_rejected() {
        assert_eq!(
            Nrom::new(0xC000, 0x2000).unwrap_err(),
            CartridgeError::UnsupportedPrgSize(0xC000)
        );
        assert_eq!(
            Nrom::new(0x4000, 0x4000).unwrap_err(),
            CartridgeError::UnsupportedChrSize(0x4000)
        );

        let nrom = Nrom::new(0x4000, 0x2000).unwrap();
        let odd = vec![0; 0x1000];
        assert_eq!(
            nrom.cpu_read(&odd, 0x8000).unwrap_err(),
            CartridgeError::UnsupportedPrgSize(0x1000)
        );
    }

    #[test]
    fn out_of_range_addresses() {
        let prg = vec![0; 0x4000];
        let nrom = Nrom::new(prg.len(), 0x2000).unwrap();
        assert_eq!(
            nrom.cpu_read(&prg, 0x5000).unwrap_err(),
            CartridgeError::AddressOutOfRange(0x5000)
        );
        assert_eq!(
            nrom.chr_offset(0x2000, 0x2000).unwrap_err(),
            CartridgeError::AddressOutOfRange(0x2000)
        );
    }
}
