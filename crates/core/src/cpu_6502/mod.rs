//! MOS 6502 CPU core implementation
//!
//! A generic 6502 that any system can drive by implementing [`Memory6502`].
//! Decimal mode is tracked in the status register but arithmetic is always
//! binary, which is how the Ricoh 2A03 behaves.
//!
//! Two ways to run it:
//! - [`Cpu6502::step`] executes one whole instruction and returns its cost.
//! - [`Cpu6502::step_one_cycle`] advances a single clock. The instruction's
//!   effect lands on its first cycle and the rest are spent waiting, which is
//!   enough to interleave another chip at a fixed clock ratio.
//!
//! Interrupts and OAM-style DMA stalls are requested from outside through
//! [`Cpu6502::nmi`], [`Cpu6502::irq`] and [`Cpu6502::dma_cycle`].

mod opcodes;

pub use opcodes::{AddressingMode, Mnemonic, Opcode, OPCODES};

use crate::logging::{log, LogCategory, LogLevel};
use thiserror::Error;

/// Memory interface trait for the 6502 CPU
///
/// Reads take `&mut self` because memory-mapped registers often change
/// state when read.
pub trait Memory6502 {
    type Error: std::error::Error + 'static;

    fn read(&mut self, addr: u16) -> Result<u8, Self::Error>;

    fn write(&mut self, addr: u16, val: u8) -> Result<(), Self::Error>;
}

/// Status register bits (NV-BDIZC)
pub mod flags {
    pub const CARRY: u8 = 0x01;
    pub const ZERO: u8 = 0x02;
    pub const INTERRUPT_DISABLE: u8 = 0x04;
    pub const DECIMAL: u8 = 0x08;
    pub const BREAK: u8 = 0x10;
    pub const UNUSED: u8 = 0x20;
    pub const OVERFLOW: u8 = 0x40;
    pub const NEGATIVE: u8 = 0x80;
}

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

const STACK_BASE: u16 = 0x0100;
const INTERRUPT_CYCLES: u32 = 7;
const DMA_STALL_CYCLES: u32 = 513;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CpuError<E: std::error::Error + 'static> {
    /// One of the KIL/JAM opcodes; the real chip stops fetching.
    #[error("CPU jammed by opcode {opcode:02X} at {pc:04X}")]
    Jammed { opcode: u8, pc: u16 },
    #[error(transparent)]
    Bus(E),
}

/// Effective address of an operand, and whether indexing crossed a page.
#[derive(Debug, Clone, Copy)]
struct Operand {
    addr: u16,
    page_crossed: bool,
}

impl Operand {
    fn at(addr: u16) -> Self {
        Self {
            addr,
            page_crossed: false,
        }
    }

    fn indexed(base: u16, index: u8) -> Self {
        let addr = base.wrapping_add(index as u16);
        Self {
            addr,
            page_crossed: pages_differ(base, addr),
        }
    }
}

#[inline]
fn pages_differ(a: u16, b: u16) -> bool {
    (a & 0xFF00) != (b & 0xFF00)
}

/// MOS 6502 CPU state and execution engine
#[derive(Debug)]
pub struct Cpu6502<M: Memory6502> {
    /// Accumulator register
    pub a: u8,
    /// X index register
    pub x: u8,
    /// Y index register
    pub y: u8,
    /// Stack pointer (points to 0x0100 + sp)
    pub sp: u8,
    /// Status register (NV-BDIZC)
    pub status: u8,
    /// Program counter
    pub pc: u16,
    /// Total cycles elapsed
    pub cycles: u64,
    /// Memory interface
    pub memory: M,
    /// Cycles still owed by the last instruction or interrupt entry
    remaining: u32,
    /// Cycles the CPU is held off the bus by DMA
    dma_stall: u32,
}

type CpuResult<T, M> = Result<T, CpuError<<M as Memory6502>::Error>>;

impl<M: Memory6502> Cpu6502<M> {
    pub fn new(memory: M) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            status: 0x24,
            pc: 0,
            cycles: 0,
            memory,
            remaining: 0,
            dma_stall: 0,
        }
    }

    /// Power-on/reset state. PC is loaded from the reset vector.
    pub fn reset(&mut self) -> CpuResult<(), M> {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.status = flags::UNUSED | flags::INTERRUPT_DISABLE;
        self.cycles = 0;
        self.remaining = 0;
        self.dma_stall = 0;
        self.pc = self.read_u16(RESET_VECTOR)?;
        log(LogCategory::CPU, LogLevel::Info, || {
            format!("reset, PC={:04X}", self.pc)
        });
        Ok(())
    }

    /// Cycles left before the next instruction starts.
    pub fn pending_cycles(&self) -> u32 {
        self.remaining
    }

    pub fn dma_stall(&self) -> u32 {
        self.dma_stall
    }

    #[inline]
    pub fn flag(&self, flag: u8) -> bool {
        self.status & flag != 0
    }

    #[inline]
    fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.status |= flag;
        } else {
            self.status &= !flag;
        }
    }

    fn set_zero_and_negative(&mut self, v: u8) {
        self.set_flag(flags::ZERO, v == 0);
        self.set_flag(flags::NEGATIVE, v & 0x80 != 0);
    }

    #[inline]
    fn read(&mut self, addr: u16) -> CpuResult<u8, M> {
        self.memory.read(addr).map_err(CpuError::Bus)
    }

    #[inline]
    fn write(&mut self, addr: u16, val: u8) -> CpuResult<(), M> {
        self.memory.write(addr, val).map_err(CpuError::Bus)
    }

    fn read_u16(&mut self, addr: u16) -> CpuResult<u16, M> {
        let lo = self.read(addr)? as u16;
        let hi = self.read(addr.wrapping_add(1))? as u16;
        Ok((hi << 8) | lo)
    }

    /// Pointer read that stays inside the pointer's page, as JMP ($xxFF) does.
    fn read_u16_page_wrapped(&mut self, addr: u16) -> CpuResult<u16, M> {
        let lo = self.read(addr)? as u16;
        let hi = self.read((addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF))? as u16;
        Ok((hi << 8) | lo)
    }

    fn read_zero_page_u16(&mut self, zp: u8) -> CpuResult<u16, M> {
        let lo = self.read(zp as u16)? as u16;
        let hi = self.read(zp.wrapping_add(1) as u16)? as u16;
        Ok((hi << 8) | lo)
    }

    #[inline]
    fn fetch_u8(&mut self) -> CpuResult<u8, M> {
        let v = self.read(self.pc)?;
        self.pc = self.pc.wrapping_add(1);
        Ok(v)
    }

    #[inline]
    fn fetch_u16(&mut self) -> CpuResult<u16, M> {
        let lo = self.fetch_u8()? as u16;
        let hi = self.fetch_u8()? as u16;
        Ok((hi << 8) | lo)
    }

    fn push_u8(&mut self, v: u8) -> CpuResult<(), M> {
        self.write(STACK_BASE | self.sp as u16, v)?;
        self.sp = self.sp.wrapping_sub(1);
        Ok(())
    }

    fn pop_u8(&mut self) -> CpuResult<u8, M> {
        self.sp = self.sp.wrapping_add(1);
        self.read(STACK_BASE | self.sp as u16)
    }

    fn push_u16(&mut self, v: u16) -> CpuResult<(), M> {
        self.push_u8((v >> 8) as u8)?;
        self.push_u8(v as u8)
    }

    fn pop_u16(&mut self) -> CpuResult<u16, M> {
        let lo = self.pop_u8()? as u16;
        let hi = self.pop_u8()? as u16;
        Ok((hi << 8) | lo)
    }

    fn enter_interrupt(&mut self, vector: u16) -> CpuResult<(), M> {
        self.push_u16(self.pc)?;
        self.push_u8((self.status & !flags::BREAK) | flags::UNUSED)?;
        self.set_flag(flags::INTERRUPT_DISABLE, true);
        self.pc = self.read_u16(vector)?;
        self.remaining += INTERRUPT_CYCLES;
        Ok(())
    }

    /// Non-maskable interrupt entry.
    pub fn nmi(&mut self) -> CpuResult<(), M> {
        let from = self.pc;
        self.enter_interrupt(NMI_VECTOR)?;
        log(LogCategory::Interrupts, LogLevel::Debug, || {
            format!("NMI from {:04X} -> {:04X}", from, self.pc)
        });
        Ok(())
    }

    /// Maskable interrupt entry; ignored while I is set.
    pub fn irq(&mut self) -> CpuResult<(), M> {
        if self.flag(flags::INTERRUPT_DISABLE) {
            return Ok(());
        }
        let from = self.pc;
        self.enter_interrupt(IRQ_VECTOR)?;
        log(LogCategory::Interrupts, LogLevel::Debug, || {
            format!("IRQ from {:04X} -> {:04X}", from, self.pc)
        });
        Ok(())
    }

    /// Stall for a 256-byte DMA: 513 cycles, 514 when it starts on an odd cycle.
    ///
    /// Call it after the cycle that wrote the trigger register; `cycles`
    /// already counts that cycle, so an odd total adds the alignment cycle.
    pub fn dma_cycle(&mut self) {
        let alignment = (self.cycles % 2) as u32;
        self.dma_stall += DMA_STALL_CYCLES + alignment;
    }

    /// Execute one instruction, first settling any owed interrupt or DMA
    /// cycles. Returns every cycle consumed.
    pub fn step(&mut self) -> CpuResult<u32, M> {
        let owed = std::mem::take(&mut self.remaining) + std::mem::take(&mut self.dma_stall);
        let used = owed + self.execute_next()?;
        self.cycles += used as u64;
        Ok(used)
    }

    /// Advance a single clock cycle.
    pub fn step_one_cycle(&mut self) -> CpuResult<(), M> {
        self.cycles += 1;
        if self.dma_stall > 0 {
            self.dma_stall -= 1;
            return Ok(());
        }
        if self.remaining == 0 {
            self.remaining = self.execute_next()?;
        }
        self.remaining -= 1;
        Ok(())
    }

    fn resolve(&mut self, mode: AddressingMode) -> CpuResult<Operand, M> {
        let operand = match mode {
            AddressingMode::Implied | AddressingMode::Accumulator => Operand::at(0),
            AddressingMode::Immediate => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                Operand::at(addr)
            }
            AddressingMode::ZeroPage => Operand::at(self.fetch_u8()? as u16),
            AddressingMode::ZeroPageX => Operand::at(self.fetch_u8()?.wrapping_add(self.x) as u16),
            AddressingMode::ZeroPageY => Operand::at(self.fetch_u8()?.wrapping_add(self.y) as u16),
            AddressingMode::Absolute => Operand::at(self.fetch_u16()?),
            AddressingMode::AbsoluteX => {
                let base = self.fetch_u16()?;
                Operand::indexed(base, self.x)
            }
            AddressingMode::AbsoluteY => {
                let base = self.fetch_u16()?;
                Operand::indexed(base, self.y)
            }
            AddressingMode::Indirect => {
                let ptr = self.fetch_u16()?;
                Operand::at(self.read_u16_page_wrapped(ptr)?)
            }
            AddressingMode::IndirectX => {
                let zp = self.fetch_u8()?.wrapping_add(self.x);
                Operand::at(self.read_zero_page_u16(zp)?)
            }
            AddressingMode::IndirectY => {
                let zp = self.fetch_u8()?;
                let base = self.read_zero_page_u16(zp)?;
                Operand::indexed(base, self.y)
            }
            AddressingMode::Relative => {
                let offset = self.fetch_u8()? as i8;
                let target = self.pc.wrapping_add(offset as u16);
                Operand {
                    addr: target,
                    page_crossed: pages_differ(self.pc, target),
                }
            }
        };
        Ok(operand)
    }

    fn load(&mut self, mode: AddressingMode, addr: u16) -> CpuResult<u8, M> {
        match mode {
            AddressingMode::Accumulator => Ok(self.a),
            _ => self.read(addr),
        }
    }

    fn store(&mut self, mode: AddressingMode, addr: u16, v: u8) -> CpuResult<(), M> {
        match mode {
            AddressingMode::Accumulator => {
                self.a = v;
                Ok(())
            }
            _ => self.write(addr, v),
        }
    }

    fn add_with_carry(&mut self, m: u8) {
        let carry = (self.status & flags::CARRY) as i16;
        let sum = self.a as i16 + m as i16 + carry;
        let signed = (self.a as i8) as i16 + (m as i8) as i16 + carry;
        self.set_flag(flags::CARRY, sum > 0xFF);
        self.set_flag(flags::OVERFLOW, !(-128..=127).contains(&signed));
        self.a = sum as u8;
        self.set_zero_and_negative(self.a);
    }

    fn subtract_with_borrow(&mut self, m: u8) {
        let borrow = 1 - (self.status & flags::CARRY) as i16;
        let diff = self.a as i16 - m as i16 - borrow;
        let signed = (self.a as i8) as i16 - (m as i8) as i16 - borrow;
        self.set_flag(flags::CARRY, diff >= 0);
        self.set_flag(flags::OVERFLOW, !(-128..=127).contains(&signed));
        self.a = diff as u8;
        self.set_zero_and_negative(self.a);
    }

    fn compare(&mut self, reg: u8, m: u8) {
        self.set_flag(flags::CARRY, reg >= m);
        self.set_zero_and_negative(reg.wrapping_sub(m));
    }

    fn shift_left(&mut self, v: u8, carry_in: bool) -> u8 {
        self.set_flag(flags::CARRY, v & 0x80 != 0);
        let r = (v << 1) | carry_in as u8;
        self.set_zero_and_negative(r);
        r
    }

    fn shift_right(&mut self, v: u8, carry_in: bool) -> u8 {
        self.set_flag(flags::CARRY, v & 0x01 != 0);
        let r = (v >> 1) | ((carry_in as u8) << 7);
        self.set_zero_and_negative(r);
        r
    }

    /// Extra cycles for a branch: one if taken, one more across a page.
    fn branch(&mut self, taken: bool, target: Operand) -> u32 {
        if !taken {
            return 0;
        }
        self.pc = target.addr;
        if target.page_crossed {
            2
        } else {
            1
        }
    }

    /// Value written by SHX/SHY/AHX/TAS: the register ANDed with the
    /// target's high byte plus one.
    fn unstable_store(&mut self, v: u8, addr: u16) -> CpuResult<(), M> {
        let hi = ((addr >> 8) as u8).wrapping_add(1);
        self.write(addr, v & hi)
    }

    /// Fetch, decode and execute one instruction, returning its cycle cost.
    fn execute_next(&mut self) -> CpuResult<u32, M> {
        let pc = self.pc;
        let code = self.fetch_u8()?;
        let opcode = OPCODES[code as usize];
        let mode = opcode.mode;
        let operand = self.resolve(mode)?;
        let addr = operand.addr;

        let mut cycles = opcode.cycles as u32;
        if opcode.page_penalty && operand.page_crossed {
            cycles += 1;
        }

        match opcode.mnemonic {
            Mnemonic::Lda => {
                self.a = self.read(addr)?;
                self.set_zero_and_negative(self.a);
            }
            Mnemonic::Ldx => {
                self.x = self.read(addr)?;
                self.set_zero_and_negative(self.x);
            }
            Mnemonic::Ldy => {
                self.y = self.read(addr)?;
                self.set_zero_and_negative(self.y);
            }
            Mnemonic::Sta => self.write(addr, self.a)?,
            Mnemonic::Stx => self.write(addr, self.x)?,
            Mnemonic::Sty => self.write(addr, self.y)?,

            Mnemonic::Tax => {
                self.x = self.a;
                self.set_zero_and_negative(self.x);
            }
            Mnemonic::Tay => {
                self.y = self.a;
                self.set_zero_and_negative(self.y);
            }
            Mnemonic::Txa => {
                self.a = self.x;
                self.set_zero_and_negative(self.a);
            }
            Mnemonic::Tya => {
                self.a = self.y;
                self.set_zero_and_negative(self.a);
            }
            Mnemonic::Tsx => {
                self.x = self.sp;
                self.set_zero_and_negative(self.x);
            }
            Mnemonic::Txs => self.sp = self.x,

            Mnemonic::Pha => self.push_u8(self.a)?,
            Mnemonic::Php => self.push_u8(self.status | flags::BREAK | flags::UNUSED)?,
            Mnemonic::Pla => {
                self.a = self.pop_u8()?;
                self.set_zero_and_negative(self.a);
            }
            Mnemonic::Plp => {
                let s = self.pop_u8()?;
                self.status = (s & !flags::BREAK) | flags::UNUSED;
            }

            Mnemonic::Adc => {
                let m = self.read(addr)?;
                self.add_with_carry(m);
            }
            Mnemonic::Sbc => {
                let m = self.read(addr)?;
                self.subtract_with_borrow(m);
            }
            Mnemonic::And => {
                self.a &= self.read(addr)?;
                self.set_zero_and_negative(self.a);
            }
            Mnemonic::Ora => {
                self.a |= self.read(addr)?;
                self.set_zero_and_negative(self.a);
            }
            Mnemonic::Eor => {
                self.a ^= self.read(addr)?;
                self.set_zero_and_negative(self.a);
            }
            Mnemonic::Bit => {
                let m = self.read(addr)?;
                self.set_flag(flags::ZERO, self.a & m == 0);
                self.set_flag(flags::OVERFLOW, m & 0x40 != 0);
                self.set_flag(flags::NEGATIVE, m & 0x80 != 0);
            }
            Mnemonic::Cmp => {
                let m = self.read(addr)?;
                self.compare(self.a, m);
            }
            Mnemonic::Cpx => {
                let m = self.read(addr)?;
                self.compare(self.x, m);
            }
            Mnemonic::Cpy => {
                let m = self.read(addr)?;
                self.compare(self.y, m);
            }

            Mnemonic::Inc => {
                let v = self.read(addr)?.wrapping_add(1);
                self.write(addr, v)?;
                self.set_zero_and_negative(v);
            }
            Mnemonic::Dec => {
                let v = self.read(addr)?.wrapping_sub(1);
                self.write(addr, v)?;
                self.set_zero_and_negative(v);
            }
            Mnemonic::Inx => {
                self.x = self.x.wrapping_add(1);
                self.set_zero_and_negative(self.x);
            }
            Mnemonic::Iny => {
                self.y = self.y.wrapping_add(1);
                self.set_zero_and_negative(self.y);
            }
            Mnemonic::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.set_zero_and_negative(self.x);
            }
            Mnemonic::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.set_zero_and_negative(self.y);
            }

            Mnemonic::Asl => {
                let v = self.load(mode, addr)?;
                let r = self.shift_left(v, false);
                self.store(mode, addr, r)?;
            }
            Mnemonic::Lsr => {
                let v = self.load(mode, addr)?;
                let r = self.shift_right(v, false);
                self.store(mode, addr, r)?;
            }
            Mnemonic::Rol => {
                let v = self.load(mode, addr)?;
                let r = self.shift_left(v, self.flag(flags::CARRY));
                self.store(mode, addr, r)?;
            }
            Mnemonic::Ror => {
                let v = self.load(mode, addr)?;
                let r = self.shift_right(v, self.flag(flags::CARRY));
                self.store(mode, addr, r)?;
            }

            Mnemonic::Jmp => self.pc = addr,
            Mnemonic::Jsr => {
                self.push_u16(self.pc.wrapping_sub(1))?;
                self.pc = addr;
            }
            Mnemonic::Rts => self.pc = self.pop_u16()?.wrapping_add(1),
            Mnemonic::Rti => {
                let s = self.pop_u8()?;
                self.status = (s & !flags::BREAK) | flags::UNUSED;
                self.pc = self.pop_u16()?;
            }
            Mnemonic::Brk => {
                // the byte after BRK is padding and is skipped on return
                self.push_u16(self.pc.wrapping_add(1))?;
                self.push_u8(self.status | flags::BREAK | flags::UNUSED)?;
                self.set_flag(flags::INTERRUPT_DISABLE, true);
                self.pc = self.read_u16(IRQ_VECTOR)?;
                log(LogCategory::CPU, LogLevel::Debug, || {
                    format!("BRK at {:04X} -> {:04X}", pc, self.pc)
                });
            }

            Mnemonic::Bcc => cycles += self.branch(!self.flag(flags::CARRY), operand),
            Mnemonic::Bcs => cycles += self.branch(self.flag(flags::CARRY), operand),
            Mnemonic::Bne => cycles += self.branch(!self.flag(flags::ZERO), operand),
            Mnemonic::Beq => cycles += self.branch(self.flag(flags::ZERO), operand),
            Mnemonic::Bpl => cycles += self.branch(!self.flag(flags::NEGATIVE), operand),
            Mnemonic::Bmi => cycles += self.branch(self.flag(flags::NEGATIVE), operand),
            Mnemonic::Bvc => cycles += self.branch(!self.flag(flags::OVERFLOW), operand),
            Mnemonic::Bvs => cycles += self.branch(self.flag(flags::OVERFLOW), operand),

            Mnemonic::Clc => self.set_flag(flags::CARRY, false),
            Mnemonic::Sec => self.set_flag(flags::CARRY, true),
            Mnemonic::Cli => self.set_flag(flags::INTERRUPT_DISABLE, false),
            Mnemonic::Sei => self.set_flag(flags::INTERRUPT_DISABLE, true),
            Mnemonic::Cld => self.set_flag(flags::DECIMAL, false),
            Mnemonic::Sed => self.set_flag(flags::DECIMAL, true),
            Mnemonic::Clv => self.set_flag(flags::OVERFLOW, false),

            // Operand bytes are skipped without a dummy read so that NOPs
            // never touch read-sensitive registers.
            Mnemonic::Nop => {}

            Mnemonic::Lax => {
                let v = self.read(addr)?;
                self.a = v;
                self.x = v;
                self.set_zero_and_negative(v);
            }
            Mnemonic::Sax => self.write(addr, self.a & self.x)?,
            Mnemonic::Dcp => {
                let v = self.read(addr)?.wrapping_sub(1);
                self.write(addr, v)?;
                self.compare(self.a, v);
            }
            Mnemonic::Isc => {
                let v = self.read(addr)?.wrapping_add(1);
                self.write(addr, v)?;
                self.subtract_with_borrow(v);
            }
            Mnemonic::Slo => {
                let v = self.read(addr)?;
                let r = self.shift_left(v, false);
                self.write(addr, r)?;
                self.a |= r;
                self.set_zero_and_negative(self.a);
            }
            Mnemonic::Rla => {
                let v = self.read(addr)?;
                let r = self.shift_left(v, self.flag(flags::CARRY));
                self.write(addr, r)?;
                self.a &= r;
                self.set_zero_and_negative(self.a);
            }
            Mnemonic::Sre => {
                let v = self.read(addr)?;
                let r = self.shift_right(v, false);
                self.write(addr, r)?;
                self.a ^= r;
                self.set_zero_and_negative(self.a);
            }
            Mnemonic::Rra => {
                let v = self.read(addr)?;
                let r = self.shift_right(v, self.flag(flags::CARRY));
                self.write(addr, r)?;
                self.add_with_carry(r);
            }
            Mnemonic::Anc => {
                self.a &= self.read(addr)?;
                self.set_zero_and_negative(self.a);
                self.set_flag(flags::CARRY, self.a & 0x80 != 0);
            }
            Mnemonic::Alr => {
                let v = self.a & self.read(addr)?;
                self.a = self.shift_right(v, false);
            }
            Mnemonic::Arr => {
                let v = self.a & self.read(addr)?;
                self.a = (v >> 1) | ((self.flag(flags::CARRY) as u8) << 7);
                self.set_zero_and_negative(self.a);
                let bit6 = self.a & 0x40 != 0;
                let bit5 = self.a & 0x20 != 0;
                self.set_flag(flags::CARRY, bit6);
                self.set_flag(flags::OVERFLOW, bit6 != bit5);
            }
            Mnemonic::Axs => {
                let m = self.read(addr)?;
                let ax = self.a & self.x;
                self.set_flag(flags::CARRY, ax >= m);
                self.x = ax.wrapping_sub(m);
                self.set_zero_and_negative(self.x);
            }
            Mnemonic::Las => {
                let v = self.read(addr)? & self.sp;
                self.a = v;
                self.x = v;
                self.sp = v;
                self.set_zero_and_negative(v);
            }
            Mnemonic::Xaa => {
                let m = self.read(addr)?;
                self.a = (self.a | 0xEE) & self.x & m;
                self.set_zero_and_negative(self.a);
            }
            Mnemonic::Ahx => self.unstable_store(self.a & self.x, addr)?,
            Mnemonic::Shx => self.unstable_store(self.x, addr)?,
            Mnemonic::Shy => self.unstable_store(self.y, addr)?,
            Mnemonic::Tas => {
                self.sp = self.a & self.x;
                self.unstable_store(self.sp, addr)?;
            }
            Mnemonic::Jam => {
                self.pc = pc;
                log(LogCategory::CPU, LogLevel::Error, || {
                    format!("JAM opcode {:02X} at {:04X}", code, pc)
                });
                return Err(CpuError::Jammed { opcode: code, pc });
            }
        }

        Ok(cycles)
    }
}

/// Flat 64KB RAM, handy for tests and benchmarks.
#[derive(Debug)]
pub struct ArrayMemory {
    pub data: Box<[u8; 0x10000]>,
}

impl ArrayMemory {
    pub fn new() -> Self {
        Self {
            data: Box::new([0; 0x10000]),
        }
    }

    /// Copy `program` to `offset` and point the reset vector at it.
    pub fn load_program(&mut self, offset: u16, program: &[u8]) {
        let off = offset as usize;
        self.data[off..off + program.len()].copy_from_slice(program);
        self.data[RESET_VECTOR as usize] = offset as u8;
        self.data[RESET_VECTOR as usize + 1] = (offset >> 8) as u8;
    }
}

impl Default for ArrayMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory6502 for ArrayMemory {
    type Error = std::convert::Infallible;

    fn read(&mut self, addr: u16) -> Result<u8, Self::Error> {
        Ok(self.data[addr as usize])
    }

    fn write(&mut self, addr: u16, val: u8) -> Result<(), Self::Error> {
        self.data[addr as usize] = val;
        Ok(())
    }
}
