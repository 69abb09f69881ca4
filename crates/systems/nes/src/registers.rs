//! Bit layouts of the PPU registers.
//!
//! Registers are plain integers; each module below names the bits of one
//! register and provides the small helpers that read or rewrite them.

/// PPUCTRL ($2000)
pub mod ctrl {
    pub const NAMETABLE_SELECT: u8 = 0x03;
    pub const VRAM_INCREMENT_32: u8 = 0x04;
    pub const SPRITE_PATTERN_HIGH: u8 = 0x08;
    pub const BACKGROUND_PATTERN_HIGH: u8 = 0x10;
    pub const SPRITE_SIZE_16: u8 = 0x20;
    pub const NMI_ENABLE: u8 = 0x80;

    /// PPUDATA address step: 1 across, 32 down.
    pub fn vram_increment(ctrl: u8) -> u16 {
        if ctrl & VRAM_INCREMENT_32 != 0 {
            32
        } else {
            1
        }
    }

    /// Pattern table used by 8x8 sprites.
    pub fn sprite_pattern_base(ctrl: u8) -> u16 {
        if ctrl & SPRITE_PATTERN_HIGH != 0 {
            0x1000
        } else {
            0x0000
        }
    }

    pub fn background_pattern_base(ctrl: u8) -> u16 {
        if ctrl & BACKGROUND_PATTERN_HIGH != 0 {
            0x1000
        } else {
            0x0000
        }
    }

    pub fn sprite_height(ctrl: u8) -> i16 {
        if ctrl & SPRITE_SIZE_16 != 0 {
            16
        } else {
            8
        }
    }

    pub fn nmi_enabled(ctrl: u8) -> bool {
        ctrl & NMI_ENABLE != 0
    }
}

/// PPUMASK ($2001)
pub mod mask {
    pub const GREYSCALE: u8 = 0x01;
    pub const SHOW_BACKGROUND_LEFT: u8 = 0x02;
    pub const SHOW_SPRITES_LEFT: u8 = 0x04;
    pub const SHOW_BACKGROUND: u8 = 0x08;
    pub const SHOW_SPRITES: u8 = 0x10;

    pub fn background_enabled(mask: u8) -> bool {
        mask & SHOW_BACKGROUND != 0
    }

    pub fn sprites_enabled(mask: u8) -> bool {
        mask & SHOW_SPRITES != 0
    }

    /// Either layer on means the fetch pipeline runs.
    pub fn rendering_enabled(mask: u8) -> bool {
        mask & (SHOW_BACKGROUND | SHOW_SPRITES) != 0
    }
}

/// PPUSTATUS ($2002)
pub mod status {
    pub const SPRITE_OVERFLOW: u8 = 0x20;
    pub const SPRITE_ZERO_HIT: u8 = 0x40;
    pub const VBLANK: u8 = 0x80;
}

/// The 15-bit scroll/address registers `v` and `t`.
///
/// ```text
/// yyy NN YYYYY XXXXX
/// ||| || ||||| +++++-- coarse X
/// ||| || +++++-------- coarse Y
/// ||| ++-------------- nametable select
/// +++----------------- fine Y
/// ```
pub mod vram_addr {
    pub const COARSE_X: u16 = 0x001F;
    pub const COARSE_Y: u16 = 0x03E0;
    pub const NAMETABLE_X: u16 = 0x0400;
    pub const NAMETABLE_Y: u16 = 0x0800;
    pub const NAMETABLE: u16 = 0x0C00;
    pub const FINE_Y: u16 = 0x7000;

    const HORIZONTAL: u16 = NAMETABLE_X | COARSE_X;
    const VERTICAL: u16 = FINE_Y | NAMETABLE_Y | COARSE_Y;

    pub fn coarse_x(v: u16) -> u16 {
        v & COARSE_X
    }

    pub fn coarse_y(v: u16) -> u16 {
        (v & COARSE_Y) >> 5
    }

    pub fn fine_y(v: u16) -> u16 {
        (v & FINE_Y) >> 12
    }

    /// Step one tile right, flipping to the neighbouring nametable after column 31.
    pub fn increment_coarse_x(v: u16) -> u16 {
        if coarse_x(v) == 31 {
            (v & !COARSE_X) ^ NAMETABLE_X
        } else {
            v + 1
        }
    }

    /// Step one pixel row down. Row 29 wraps into the vertical neighbour;
    /// rows 30 and 31 (attribute memory) wrap without switching.
    pub fn increment_y(v: u16) -> u16 {
        if fine_y(v) < 7 {
            return v + 0x1000;
        }
        let v = v & !FINE_Y;
        let y = coarse_y(v);
        let (y, v) = match y {
            29 => (0, v ^ NAMETABLE_Y),
            31 => (0, v),
            _ => (y + 1, v),
        };
        (v & !COARSE_Y) | (y << 5)
    }

    pub fn copy_horizontal(v: u16, t: u16) -> u16 {
        (v & !HORIZONTAL) | (t & HORIZONTAL)
    }

    pub fn copy_vertical(v: u16, t: u16) -> u16 {
        (v & !VERTICAL) | (t & VERTICAL)
    }

    /// PPUCTRL write: the low two bits land in t's nametable select.
    pub fn set_nametable_select(t: u16, ctrl: u8) -> u16 {
        (t & !NAMETABLE) | (((ctrl & 0x03) as u16) << 10)
    }

    /// First PPUSCROLL write. Returns the new t and the fine X scroll.
    pub fn scroll_first_write(t: u16, data: u8) -> (u16, u8) {
        ((t & !COARSE_X) | (data >> 3) as u16, data & 0x07)
    }

    pub fn scroll_second_write(t: u16, data: u8) -> u16 {
        let fine = ((data & 0x07) as u16) << 12;
        let coarse = ((data & 0xF8) as u16) << 2;
        (t & !(FINE_Y | COARSE_Y)) | fine | coarse
    }

    /// First PPUADDR write: high six bits, bit 14 cleared.
    pub fn addr_first_write(t: u16, data: u8) -> u16 {
        (t & 0x00FF) | (((data & 0x3F) as u16) << 8)
    }

    pub fn addr_second_write(t: u16, data: u8) -> u16 {
        (t & 0x7F00) | data as u16
    }

    /// Nametable byte for the tile under v.
    pub fn tile_address(v: u16) -> u16 {
        0x2000 | (v & 0x0FFF)
    }

    /// Attribute byte covering the tile under v.
    pub fn attribute_address(v: u16) -> u16 {
        0x23C0 | (v & NAMETABLE) | ((v >> 4) & 0x38) | ((v >> 2) & 0x07)
    }

    /// Shift selecting the tile's 2-bit quadrant inside its attribute byte.
    pub fn attribute_shift(v: u16) -> u8 {
        (((coarse_y(v) & 0x02) << 1) | (coarse_x(v) & 0x02)) as u8
    }
}
