//! Fixed-size memories on the console board.

/// Byte-addressable block that folds any address into its own size.
pub trait RandomAccessBlock {
    fn read(&self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);
}

/// 2KB work RAM, mirrored every 0x800 up to $1FFF.
#[derive(Debug, Clone)]
pub struct Ram {
    data: Box<[u8; 0x800]>,
}

impl Ram {
    pub fn new() -> Self {
        Self {
            data: Box::new([0; 0x800]),
        }
    }
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomAccessBlock for Ram {
    fn read(&self, addr: u16) -> u8 {
        self.data[(addr & 0x07FF) as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.data[(addr & 0x07FF) as usize] = data;
    }
}

/// 2KB nametable RAM. Callers pass the physical offset after mirroring.
#[derive(Debug, Clone)]
pub struct VRam {
    data: Box<[u8; 0x800]>,
}

impl VRam {
    pub fn new() -> Self {
        Self {
            data: Box::new([0; 0x800]),
        }
    }
}

impl Default for VRam {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomAccessBlock for VRam {
    fn read(&self, addr: u16) -> u8 {
        self.data[(addr & 0x07FF) as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.data[(addr & 0x07FF) as usize] = data;
    }
}

/// 32 six-bit palette entries.
///
/// Entries $10/$14/$18/$1C are the same cells as $00/$04/$08/$0C.
#[derive(Debug, Clone, Default)]
pub struct PaletteRam {
    data: [u8; 32],
}

impl PaletteRam {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(addr: u16) -> usize {
        let index = (addr & 0x1F) as usize;
        if index & 0x13 == 0x10 {
            index & 0x0F
        } else {
            index
        }
    }
}

impl RandomAccessBlock for PaletteRam {
    fn read(&self, addr: u16) -> u8 {
        self.data[Self::index(addr)]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.data[Self::index(addr)] = data & 0x3F;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ram_mirrors_every_2kb() {
        let mut ram = Ram::new();
        ram.write(0x0001, 0x5A);
        assert_eq!(ram.read(0x0801), 0x5A);
        assert_eq!(ram.read(0x1001), 0x5A);
        assert_eq!(ram.read(0x1801), 0x5A);
    }

    #[test]
    fn vram_wraps_at_2kb() {
        let mut vram = VRam::new();
        vram.write(0x0900, 7);
        assert_eq!(vram.read(0x0100), 7);
    }

    #[test]
    fn sprite_backdrop_entries_alias_background() {
        let mut palette = PaletteRam::new();
        palette.write(0x3F10, 0x21);
        assert_eq!(palette.read(0x3F00), 0x21);
        palette.write(0x3F0C, 0x05);
        assert_eq!(palette.read(0x3F1C), 0x05);

        // non-zero entries of sprite palettes are their own cells
        palette.write(0x3F11, 0x30);
        assert_eq!(palette.read(0x3F01), 0x00);
    }

    #[test]
    fn palette_keeps_six_bits_and_mirrors_every_32() {
        let mut palette = PaletteRam::new();
        palette.write(0x3F03, 0xFF);
        assert_eq!(palette.read(0x3F03), 0x3F);
        assert_eq!(palette.read(0x3F23), 0x3F);
    }
}
