//! NES PPU (Picture Processing Unit) implementation.
//!
//! This module implements the NTSC 2C02 as a dot-driven state machine:
//! `tick()` advances one PPU clock, three of which happen per CPU cycle.
//!
//! ## Frame Layout
//!
//! - **Scanlines 0-239**: visible, one pixel per dot on dots 1-256
//! - **Scanline 240**: post-render, idle
//! - **Scanlines 241-260**: vertical blank; the flag sets at 241:1 and the
//!   NMI is raised at 241:16
//! - **Scanline 261**: pre-render; clears the status flags and reloads the
//!   vertical scroll
//!
//! Each scanline is 341 dots. Odd frames start on dot 1 of scanline 0.
//!
//! ## Background Pipeline
//!
//! Every eight dots the fetch unit reads a nametable byte, an attribute byte
//! and the two pattern planes of the next tile, then commits them to the
//! 16-bit shift registers. Pixels are taken from bit `15 - fine_x`.
//!
//! ## Sprites
//!
//! OAM is scanned once per line at dot 65; up to eight sprites are kept.
//! Their pixels for the next line are fetched in one burst at dot 257.
//!
//! ## Register Interface
//!
//! - **$2000 (PPUCTRL)**: write only
//! - **$2001 (PPUMASK)**: write only
//! - **$2002 (PPUSTATUS)**: read only; reading clears VBlank and the write toggle
//! - **$2003 (OAMADDR)**: write only
//! - **$2004 (OAMDATA)**: read/write, writes increment OAMADDR
//! - **$2005 (PPUSCROLL)**: write twice, X then Y
//! - **$2006 (PPUADDR)**: write twice, high then low
//! - **$2007 (PPUDATA)**: read/write, reads are buffered below the palette

use crate::bus::{BusError, ReadWrite};
use crate::ppu_bus::PpuBus;
use crate::registers::{ctrl, mask, status, vram_addr};
use crate::SharedCartridge;
use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::types::Frame;
use std::fmt;

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 240;

const DOTS_PER_SCANLINE: u16 = 341;
const SCANLINES_PER_FRAME: u16 = 262;
const LAST_VISIBLE_SCANLINE: u16 = 239;
const VBLANK_SCANLINE: u16 = 241;
const PRE_RENDER_SCANLINE: u16 = 261;
const NMI_DOT: u16 = 16;
const SPRITE_EVALUATION_DOT: u16 = 65;
const MAX_SPRITES_PER_LINE: usize = 8;
/// Sprites with a Y byte at or beyond this are hidden.
const SPRITE_Y_LIMIT: u8 = 0xEF;
const PALETTE_BASE: u16 = 0x3F00;
const SPRITE_PALETTE_BASE: u16 = 0x3F10;

/// Bytes of the next background tile, filled over eight dots.
#[derive(Debug, Clone, Copy, Default)]
struct TileLatch {
    tile: u8,
    palette: u8,
    pattern_low: u8,
    pattern_high: u8,
}

#[derive(Debug, Clone, Copy, Default)]
struct BackgroundShifter {
    pattern_low: u16,
    pattern_high: u16,
    attribute_low: u16,
    attribute_high: u16,
}

impl BackgroundShifter {
    fn shift(&mut self) {
        self.pattern_low <<= 1;
        self.pattern_high <<= 1;
        self.attribute_low <<= 1;
        self.attribute_high <<= 1;
    }

    /// Load the latched tile into the low byte of each register.
    fn reload(&mut self, latch: &TileLatch) {
        let spread = |bit: u8| if bit != 0 { 0x00FF } else { 0x0000 };
        self.pattern_low = (self.pattern_low & 0xFF00) | latch.pattern_low as u16;
        self.pattern_high = (self.pattern_high & 0xFF00) | latch.pattern_high as u16;
        self.attribute_low = (self.attribute_low & 0xFF00) | spread(latch.palette & 0x01);
        self.attribute_high = (self.attribute_high & 0xFF00) | spread(latch.palette & 0x02);
    }

    /// 4-bit background palette index under the current dot.
    fn pixel(&self, fine_x: u8) -> u8 {
        let bit = 15 - fine_x as u16;
        let take = |reg: u16| ((reg >> bit) & 0x01) as u8;
        (take(self.attribute_high) << 3)
            | (take(self.attribute_low) << 2)
            | (take(self.pattern_high) << 1)
            | take(self.pattern_low)
    }
}

/// One secondary-OAM entry. `row` and `tall` are fixed at evaluation so a
/// PPUCTRL write before the fetch cannot move the sprite off its line.
#[derive(Debug, Clone, Copy)]
struct SpriteSlot {
    index: u8,
    tile: u8,
    attributes: u8,
    x: u8,
    row: u8,
    tall: bool,
}

impl SpriteSlot {
    const PALETTE: u8 = 0x03;
    const BEHIND_BACKGROUND: u8 = 0x20;
    const FLIP_HORIZONTAL: u8 = 0x40;
    const FLIP_VERTICAL: u8 = 0x80;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SpritePixel {
    /// palette << 2 | pattern bits; never transparent once stored
    color: u8,
    behind_background: bool,
    sprite_zero: bool,
}

pub struct Ppu {
    ctrl: u8,
    mask: u8,
    status: u8,
    oam_addr: u8,
    oam: [u8; 256],

    /// Current VRAM address
    v: u16,
    /// Temporary VRAM address; the scroll origin of the next frame
    t: u16,
    fine_x: u8,
    write_toggle: bool,
    read_buffer: u8,

    latch: TileLatch,
    background: BackgroundShifter,
    line_sprites: Vec<SpriteSlot>,
    sprite_pixels: [Option<SpritePixel>; SCREEN_WIDTH],
    sprite_zero_hit_latched: bool,

    scanline: u16,
    dot: u16,
    odd_frame: bool,
    frame_count: u64,
    pixels: Vec<u8>,

    nmi_pending: bool,
    frame_ready: bool,

    bus: PpuBus,
}

impl fmt::Debug for Ppu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ppu")
            .field("ctrl", &format_args!("{:02X}", self.ctrl))
            .field("mask", &format_args!("{:02X}", self.mask))
            .field("status", &format_args!("{:02X}", self.status))
            .field("v", &format_args!("{:04X}", self.v))
            .field("t", &format_args!("{:04X}", self.t))
            .field("scanline", &self.scanline)
            .field("dot", &self.dot)
            .field("frame_count", &self.frame_count)
            .finish_non_exhaustive()
    }
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            ctrl: 0,
            mask: 0,
            status: 0,
            oam_addr: 0,
            oam: [0; 256],
            v: 0,
            t: 0,
            fine_x: 0,
            write_toggle: false,
            read_buffer: 0,
            latch: TileLatch::default(),
            background: BackgroundShifter::default(),
            line_sprites: Vec::with_capacity(MAX_SPRITES_PER_LINE),
            sprite_pixels: [None; SCREEN_WIDTH],
            sprite_zero_hit_latched: false,
            scanline: 0,
            dot: 0,
            odd_frame: false,
            frame_count: 0,
            pixels: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
            nmi_pending: false,
            frame_ready: false,
            bus: PpuBus::new(),
        }
    }

    pub fn connect_cartridge(&mut self, cartridge: SharedCartridge) {
        self.bus.connect_cartridge(cartridge);
    }

    pub fn disconnect_cartridge(&mut self) {
        self.bus.disconnect_cartridge();
    }

    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    pub fn dot(&self) -> u16 {
        self.dot
    }

    /// Frames completed since power-on.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn oam(&self) -> &[u8; 256] {
        &self.oam
    }

    /// True once per NMI the PPU raised.
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    /// The finished picture, once per completed frame.
    pub fn take_frame(&mut self) -> Option<Frame> {
        if !std::mem::take(&mut self.frame_ready) {
            return None;
        }
        Some(Frame {
            width: SCREEN_WIDTH as u32,
            height: SCREEN_HEIGHT as u32,
            pixels: self.pixels.clone(),
        })
    }

    /// Advance one dot.
    pub fn tick(&mut self) -> Result<(), BusError> {
        match self.scanline {
            0..=LAST_VISIBLE_SCANLINE => self.visible_dot()?,
            VBLANK_SCANLINE => self.vblank_dot(),
            PRE_RENDER_SCANLINE => self.pre_render_dot()?,
            _ => {}
        }
        self.advance();
        Ok(())
    }

    fn advance(&mut self) {
        self.dot += 1;
        if self.dot < DOTS_PER_SCANLINE {
            return;
        }
        self.dot = 0;
        self.scanline += 1;
        if self.scanline < SCANLINES_PER_FRAME {
            return;
        }

        self.scanline = 0;
        self.odd_frame = !self.odd_frame;
        if self.odd_frame {
            self.dot = 1;
        }
        self.sprite_zero_hit_latched = false;
        self.frame_count += 1;
        self.frame_ready = true;
        log(LogCategory::PPU, LogLevel::Trace, || {
            format!("frame {} complete", self.frame_count)
        });
    }

    fn visible_dot(&mut self) -> Result<(), BusError> {
        let dot = self.dot;
        if dot == SPRITE_EVALUATION_DOT {
            self.evaluate_sprites();
        }
        if !mask::rendering_enabled(self.mask) {
            if (1..=256).contains(&dot) {
                let color = self.palette_color(PALETTE_BASE)?;
                self.put_pixel((dot - 1) as usize, color);
            }
            return Ok(());
        }

        match dot {
            1..=256 => {
                self.shift_background();
                self.compose_pixel((dot - 1) as usize)?;
                self.fetch_background()?;
                if dot == 256 {
                    self.v = vram_addr::increment_y(self.v);
                }
            }
            257 => {
                self.v = vram_addr::copy_horizontal(self.v, self.t);
                self.fetch_sprites()?;
            }
            321..=336 => {
                self.shift_background();
                self.fetch_background()?;
            }
            _ => {}
        }
        Ok(())
    }

    fn vblank_dot(&mut self) {
        match self.dot {
            1 => self.status |= status::VBLANK,
            NMI_DOT => {
                if ctrl::nmi_enabled(self.ctrl) && self.status & status::VBLANK != 0 {
                    self.nmi_pending = true;
                }
            }
            _ => {}
        }
    }

    fn pre_render_dot(&mut self) -> Result<(), BusError> {
        let dot = self.dot;
        if dot == 1 {
            self.status &= !(status::VBLANK | status::SPRITE_ZERO_HIT | status::SPRITE_OVERFLOW);
        }
        if dot == SPRITE_EVALUATION_DOT {
            self.evaluate_sprites();
        }
        if !mask::rendering_enabled(self.mask) {
            return Ok(());
        }

        match dot {
            1..=256 => {
                self.shift_background();
                self.fetch_background()?;
                if dot == 256 {
                    self.v = vram_addr::increment_y(self.v);
                }
            }
            257 => {
                self.v = vram_addr::copy_horizontal(self.v, self.t);
                self.fetch_sprites()?;
            }
            280..=305 => self.v = vram_addr::copy_vertical(self.v, self.t),
            321..=336 => {
                self.shift_background();
                self.fetch_background()?;
            }
            _ => {}
        }
        Ok(())
    }

    fn shift_background(&mut self) {
        if mask::background_enabled(self.mask) {
            self.background.shift();
        }
    }

    /// One step of the eight-dot tile fetch.
    fn fetch_background(&mut self) -> Result<(), BusError> {
        if !mask::background_enabled(self.mask) {
            return Ok(());
        }
        match self.dot % 8 {
            0 => self.v = vram_addr::increment_coarse_x(self.v),
            1 => {
                self.background.reload(&self.latch);
                self.latch.tile = self.bus.read_byte(vram_addr::tile_address(self.v))?;
            }
            3 => {
                let attribute = self.bus.read_byte(vram_addr::attribute_address(self.v))?;
                self.latch.palette = (attribute >> vram_addr::attribute_shift(self.v)) & 0x03;
            }
            5 => {
                let addr = self.background_pattern_address();
                self.latch.pattern_low = self.bus.read_byte(addr)?;
            }
            7 => {
                let addr = self.background_pattern_address() + 8;
                self.latch.pattern_high = self.bus.read_byte(addr)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn background_pattern_address(&self) -> u16 {
        ctrl::background_pattern_base(self.ctrl)
            + self.latch.tile as u16 * 16
            + vram_addr::fine_y(self.v)
    }

    /// Collect the sprites covering the current scanline. With sprites off
    /// the list is just emptied.
    fn evaluate_sprites(&mut self) {
        self.line_sprites.clear();
        if !mask::sprites_enabled(self.mask) {
            return;
        }

        let height = ctrl::sprite_height(self.ctrl);
        let line = self.scanline as i16;
        for (index, entry) in self.oam.chunks_exact(4).enumerate() {
            let y = entry[0];
            if y >= SPRITE_Y_LIMIT {
                continue;
            }
            let row = line - y as i16;
            if !(0..height).contains(&row) {
                continue;
            }
            if self.line_sprites.len() == MAX_SPRITES_PER_LINE {
                self.status |= status::SPRITE_OVERFLOW;
                log(LogCategory::PPU, LogLevel::Debug, || {
                    format!("sprite overflow on scanline {}", line)
                });
                break;
            }
            self.line_sprites.push(SpriteSlot {
                index: index as u8,
                tile: entry[1],
                attributes: entry[2],
                x: entry[3],
                row: row as u8,
                tall: height == 16,
            });
        }
    }

    /// Fetch the patterns of the evaluated sprites for the next line.
    fn fetch_sprites(&mut self) -> Result<(), BusError> {
        self.sprite_pixels = [None; SCREEN_WIDTH];
        if !mask::sprites_enabled(self.mask) {
            return Ok(());
        }

        // highest index first so lower indexes end up on top
        for i in (0..self.line_sprites.len()).rev() {
            let sprite = self.line_sprites[i];
            let addr = self.sprite_pattern_address(&sprite);
            let low = self.bus.read_byte(addr)?;
            let high = self.bus.read_byte(addr + 8)?;

            let flip_h = sprite.attributes & SpriteSlot::FLIP_HORIZONTAL != 0;
            let palette = (sprite.attributes & SpriteSlot::PALETTE) << 2;
            for col in 0..8u8 {
                let x = sprite.x as usize + col as usize;
                if x >= SCREEN_WIDTH {
                    break;
                }
                let bit = if flip_h { col } else { 7 - col };
                let pattern = ((low >> bit) & 0x01) | (((high >> bit) & 0x01) << 1);
                if pattern == 0 {
                    continue;
                }
                self.sprite_pixels[x] = Some(SpritePixel {
                    color: palette | pattern,
                    behind_background: sprite.attributes & SpriteSlot::BEHIND_BACKGROUND != 0,
                    sprite_zero: sprite.index == 0,
                });
            }
        }
        Ok(())
    }

    fn sprite_pattern_address(&self, sprite: &SpriteSlot) -> u16 {
        let flip_v = sprite.attributes & SpriteSlot::FLIP_VERTICAL != 0;
        let row = sprite.row;
        if sprite.tall {
            let table = (sprite.tile as u16 & 0x01) * 0x1000;
            let row = if flip_v { 15 - row } else { row };
            let tile = (sprite.tile & 0xFE) as u16 + (row >= 8) as u16;
            table + tile * 16 + (row & 0x07) as u16
        } else {
            let row = if flip_v { 7 - row } else { row };
            ctrl::sprite_pattern_base(self.ctrl) + sprite.tile as u16 * 16 + row as u16
        }
    }

    fn compose_pixel(&mut self, x: usize) -> Result<(), BusError> {
        let left_column = x < 8;
        let background = if mask::background_enabled(self.mask)
            && !(left_column && self.mask & mask::SHOW_BACKGROUND_LEFT == 0)
        {
            self.background.pixel(self.fine_x)
        } else {
            0
        };
        let sprite = if mask::sprites_enabled(self.mask)
            && !(left_column && self.mask & mask::SHOW_SPRITES_LEFT == 0)
        {
            self.sprite_pixels[x]
        } else {
            None
        };

        let background_opaque = background & 0x03 != 0;
        let background_addr = if background_opaque {
            PALETTE_BASE + background as u16
        } else {
            PALETTE_BASE
        };

        let addr = match sprite {
            Some(sprite) => {
                if sprite.sprite_zero && background_opaque && !self.sprite_zero_hit_latched {
                    self.sprite_zero_hit_latched = true;
                    self.status |= status::SPRITE_ZERO_HIT;
                }
                if sprite.behind_background && background_opaque {
                    background_addr
                } else {
                    SPRITE_PALETTE_BASE + sprite.color as u16
                }
            }
            None => background_addr,
        };

        let color = self.palette_color(addr)?;
        self.put_pixel(x, color);
        Ok(())
    }

    fn palette_color(&mut self, addr: u16) -> Result<u8, BusError> {
        let color = self.bus.read_byte(addr)?;
        Ok(if self.mask & mask::GREYSCALE != 0 {
            color & 0x30
        } else {
            color
        })
    }

    fn put_pixel(&mut self, x: usize, color: u8) {
        let y = self.scanline as usize;
        self.pixels[y * SCREEN_WIDTH + x] = color;
    }

    /// CPU read of $2000-$3FFF (mirrored every 8 bytes).
    pub fn read_register(&mut self, addr: u16) -> Result<u8, BusError> {
        match addr & 0x2007 {
            0x2002 => {
                let value = self.status;
                self.status &= !status::VBLANK;
                self.write_toggle = false;
                Ok(value)
            }
            0x2004 => Ok(self.oam[self.oam_addr as usize]),
            0x2007 => {
                let target = self.v & 0x3FFF;
                let data = self.bus.read_byte(target)?;
                let value = if target >= PALETTE_BASE {
                    // palette reads bypass the buffer; it gets the nametable byte underneath
                    self.read_buffer = self.bus.read_byte(target - 0x1000)?;
                    data
                } else {
                    std::mem::replace(&mut self.read_buffer, data)
                };
                self.increment_vram_addr();
                Ok(value)
            }
            _ => Err(BusError::WriteOnlyRegister(addr)),
        }
    }

    /// CPU write of $2000-$3FFF (mirrored every 8 bytes).
    pub fn write_register(&mut self, addr: u16, data: u8) -> Result<(), BusError> {
        let reg = addr & 0x2007;
        log(LogCategory::PPU, LogLevel::Trace, || {
            format!("write {:02X} -> {:04X}", data, reg)
        });
        match reg {
            0x2000 => {
                let was_enabled = ctrl::nmi_enabled(self.ctrl);
                self.ctrl = data;
                self.t = vram_addr::set_nametable_select(self.t, data);
                if !was_enabled && ctrl::nmi_enabled(data) && self.status & status::VBLANK != 0 {
                    self.nmi_pending = true;
                }
            }
            0x2001 => self.mask = data,
            0x2002 => return Err(BusError::ReadOnlyRegister(addr)),
            0x2003 => self.oam_addr = data,
            0x2004 => {
                self.oam[self.oam_addr as usize] = data;
                self.oam_addr = self.oam_addr.wrapping_add(1);
            }
            0x2005 => {
                if self.write_toggle {
                    self.t = vram_addr::scroll_second_write(self.t, data);
                } else {
                    let (t, fine_x) = vram_addr::scroll_first_write(self.t, data);
                    self.t = t;
                    self.fine_x = fine_x;
                }
                self.write_toggle = !self.write_toggle;
            }
            0x2006 => {
                if self.write_toggle {
                    self.t = vram_addr::addr_second_write(self.t, data);
                    self.v = self.t;
                } else {
                    self.t = vram_addr::addr_first_write(self.t, data);
                }
                self.write_toggle = !self.write_toggle;
            }
            _ => {
                self.bus.write_byte(self.v & 0x3FFF, data)?;
                self.increment_vram_addr();
            }
        }
        Ok(())
    }

    fn increment_vram_addr(&mut self) {
        self.v = (self.v + ctrl::vram_increment(self.ctrl)) & 0x7FFF;
    }

    /// OAM DMA: 256 bytes stored through OAMADDR, which ends where it began.
    pub fn write_oam_dma(&mut self, data: &[u8; 256]) {
        for &byte in data {
            self.oam[self.oam_addr as usize] = byte;
            self.oam_addr = self.oam_addr.wrapping_add(1);
        }
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}
