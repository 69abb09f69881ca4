//! 6502 decode table.
//!
//! Every one of the 256 opcode bytes has an entry, including the NMOS
//! unofficial instructions and the JAM opcodes that lock up the chip.

/// How an instruction finds its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    // unofficial
    Ahx,
    Alr,
    Anc,
    Arr,
    Axs,
    Dcp,
    Isc,
    Jam,
    Las,
    Lax,
    Rla,
    Rra,
    Sax,
    Shx,
    Shy,
    Slo,
    Sre,
    Tas,
    Xaa,
}

/// One decode table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    /// Base cycle cost, before page-cross and branch adjustments.
    pub cycles: u8,
    /// Read-class indexed access pays one more cycle when it crosses a page.
    pub page_penalty: bool,
    pub official: bool,
}

const fn op(mnemonic: Mnemonic, mode: AddressingMode, cycles: u8) -> Opcode {
    Opcode {
        mnemonic,
        mode,
        cycles,
        page_penalty: false,
        official: true,
    }
}

impl Opcode {
    const fn px(mut self) -> Self {
        self.page_penalty = true;
        self
    }

    const fn undoc(mut self) -> Self {
        self.official = false;
        self
    }
}

use AddressingMode::{
    Absolute as Abs, AbsoluteX as AbsX, AbsoluteY as AbsY, Accumulator as Acc, Immediate as Imm,
    Implied as Imp, Indirect as Ind, IndirectX as IndX, IndirectY as IndY, Relative as Rel,
    ZeroPage as Zp, ZeroPageX as ZpX, ZeroPageY as ZpY,
};
use Mnemonic::*;

const JAM: Opcode = op(Jam, Imp, 2).undoc();

pub static OPCODES: [Opcode; 256] = [
    // 0x00
    op(Brk, Imp, 7),
    op(Ora, IndX, 6),
    JAM,
    op(Slo, IndX, 8).undoc(),
    op(Nop, Zp, 3).undoc(),
    op(Ora, Zp, 3),
    op(Asl, Zp, 5),
    op(Slo, Zp, 5).undoc(),
    op(Php, Imp, 3),
    op(Ora, Imm, 2),
    op(Asl, Acc, 2),
    op(Anc, Imm, 2).undoc(),
    op(Nop, Abs, 4).undoc(),
    op(Ora, Abs, 4),
    op(Asl, Abs, 6),
    op(Slo, Abs, 6).undoc(),
    // 0x10
    op(Bpl, Rel, 2),
    op(Ora, IndY, 5).px(),
    JAM,
    op(Slo, IndY, 8).undoc(),
    op(Nop, ZpX, 4).undoc(),
    op(Ora, ZpX, 4),
    op(Asl, ZpX, 6),
    op(Slo, ZpX, 6).undoc(),
    op(Clc, Imp, 2),
    op(Ora, AbsY, 4).px(),
    op(Nop, Imp, 2).undoc(),
    op(Slo, AbsY, 7).undoc(),
    op(Nop, AbsX, 4).px().undoc(),
    op(Ora, AbsX, 4).px(),
    op(Asl, AbsX, 7),
    op(Slo, AbsX, 7).undoc(),
    // 0x20
    op(Jsr, Abs, 6),
    op(And, IndX, 6),
    JAM,
    op(Rla, IndX, 8).undoc(),
    op(Bit, Zp, 3),
    op(And, Zp, 3),
    op(Rol, Zp, 5),
    op(Rla, Zp, 5).undoc(),
    op(Plp, Imp, 4),
    op(And, Imm, 2),
    op(Rol, Acc, 2),
    op(Anc, Imm, 2).undoc(),
    op(Bit, Abs, 4),
    op(And, Abs, 4),
    op(Rol, Abs, 6),
    op(Rla, Abs, 6).undoc(),
    // 0x30
    op(Bmi, Rel, 2),
    op(And, IndY, 5).px(),
    JAM,
    op(Rla, IndY, 8).undoc(),
    op(Nop, ZpX, 4).undoc(),
    op(And, ZpX, 4),
    op(Rol, ZpX, 6),
    op(Rla, ZpX, 6).undoc(),
    op(Sec, Imp, 2),
    op(And, AbsY, 4).px(),
    op(Nop, Imp, 2).undoc(),
    op(Rla, AbsY, 7).undoc(),
    op(Nop, AbsX, 4).px().undoc(),
    op(And, AbsX, 4).px(),
    op(Rol, AbsX, 7),
    op(Rla, AbsX, 7).undoc(),
    // 0x40
    op(Rti, Imp, 6),
    op(Eor, IndX, 6),
    JAM,
    op(Sre, IndX, 8).undoc(),
    op(Nop, Zp, 3).undoc(),
    op(Eor, Zp, 3),
    op(Lsr, Zp, 5),
    op(Sre, Zp, 5).undoc(),
    op(Pha, Imp, 3),
    op(Eor, Imm, 2),
    op(Lsr, Acc, 2),
    op(Alr, Imm, 2).undoc(),
    op(Jmp, Abs, 3),
    op(Eor, Abs, 4),
    op(Lsr, Abs, 6),
    op(Sre, Abs, 6).undoc(),
    // 0x50
    op(Bvc, Rel, 2),
    op(Eor, IndY, 5).px(),
    JAM,
    op(Sre, IndY, 8).undoc(),
    op(Nop, ZpX, 4).undoc(),
    op(Eor, ZpX, 4),
    op(Lsr, ZpX, 6),
    op(Sre, ZpX, 6).undoc(),
    op(Cli, Imp, 2),
    op(Eor, AbsY, 4).px(),
    op(Nop, Imp, 2).undoc(),
    op(Sre, AbsY, 7).undoc(),
    op(Nop, AbsX, 4).px().undoc(),
    op(Eor, AbsX, 4).px(),
    op(Lsr, AbsX, 7),
    op(Sre, AbsX, 7).undoc(),
    // 0x60
    op(Rts, Imp, 6),
    op(Adc, IndX, 6),
    JAM,
    op(Rra, IndX, 8).undoc(),
    op(Nop, Zp, 3).undoc(),
    op(Adc, Zp, 3),
    op(Ror, Zp, 5),
    op(Rra, Zp, 5).undoc(),
    op(Pla, Imp, 4),
    op(Adc, Imm, 2),
    op(Ror, Acc, 2),
    op(Arr, Imm, 2).undoc(),
    op(Jmp, Ind, 5),
    op(Adc, Abs, 4),
    op(Ror, Abs, 6),
    op(Rra, Abs, 6).undoc(),
    // 0x70
    op(Bvs, Rel, 2),
    op(Adc, IndY, 5).px(),
    JAM,
    op(Rra, IndY, 8).undoc(),
    op(Nop, ZpX, 4).undoc(),
    op(Adc, ZpX, 4),
    op(Ror, ZpX, 6),
    op(Rra, ZpX, 6).undoc(),
    op(Sei, Imp, 2),
    op(Adc, AbsY, 4).px(),
    op(Nop, Imp, 2).undoc(),
    op(Rra, AbsY, 7).undoc(),
    op(Nop, AbsX, 4).px().undoc(),
    op(Adc, AbsX, 4).px(),
    op(Ror, AbsX, 7),
    op(Rra, AbsX, 7).undoc(),
    // 0x80
    op(Nop, Imm, 2).undoc(),
    op(Sta, IndX, 6),
    op(Nop, Imm, 2).undoc(),
    op(Sax, IndX, 6).undoc(),
    op(Sty, Zp, 3),
    op(Sta, Zp, 3),
    op(Stx, Zp, 3),
    op(Sax, Zp, 3).undoc(),
    op(Dey, Imp, 2),
    op(Nop, Imm, 2).undoc(),
    op(Txa, Imp, 2),
    op(Xaa, Imm, 2).undoc(),
    op(Sty, Abs, 4),
    op(Sta, Abs, 4),
    op(Stx, Abs, 4),
    op(Sax, Abs, 4).undoc(),
    // 0x90
    op(Bcc, Rel, 2),
    op(Sta, IndY, 6),
    JAM,
    op(Ahx, IndY, 6).undoc(),
    op(Sty, ZpX, 4),
    op(Sta, ZpX, 4),
    op(Stx, ZpY, 4),
    op(Sax, ZpY, 4).undoc(),
    op(Tya, Imp, 2),
    op(Sta, AbsY, 5),
    op(Txs, Imp, 2),
    op(Tas, AbsY, 5).undoc(),
    op(Shy, AbsX, 5).undoc(),
    op(Sta, AbsX, 5),
    op(Shx, AbsY, 5).undoc(),
    op(Ahx, AbsY, 5).undoc(),
    // 0xA0
    op(Ldy, Imm, 2),
    op(Lda, IndX, 6),
    op(Ldx, Imm, 2),
    op(Lax, IndX, 6).undoc(),
    op(Ldy, Zp, 3),
    op(Lda, Zp, 3),
    op(Ldx, Zp, 3),
    op(Lax, Zp, 3).undoc(),
    op(Tay, Imp, 2),
    op(Lda, Imm, 2),
    op(Tax, Imp, 2),
    op(Lax, Imm, 2).undoc(),
    op(Ldy, Abs, 4),
    op(Lda, Abs, 4),
    op(Ldx, Abs, 4),
    op(Lax, Abs, 4).undoc(),
    // 0xB0
    op(Bcs, Rel, 2),
    op(Lda, IndY, 5).px(),
    JAM,
    op(Lax, IndY, 5).px().undoc(),
    op(Ldy, ZpX, 4),
    op(Lda, ZpX, 4),
    op(Ldx, ZpY, 4),
    op(Lax, ZpY, 4).undoc(),
    op(Clv, Imp, 2),
    op(Lda, AbsY, 4).px(),
    op(Tsx, Imp, 2),
    op(Las, AbsY, 4).px().undoc(),
    op(Ldy, AbsX, 4).px(),
    op(Lda, AbsX, 4).px(),
    op(Ldx, AbsY, 4).px(),
    op(Lax, AbsY, 4).px().undoc(),
    // 0xC0
    op(Cpy, Imm, 2),
    op(Cmp, IndX, 6),
    op(Nop, Imm, 2).undoc(),
    op(Dcp, IndX, 8).undoc(),
    op(Cpy, Zp, 3),
    op(Cmp, Zp, 3),
    op(Dec, Zp, 5),
    op(Dcp, Zp, 5).undoc(),
    op(Iny, Imp, 2),
    op(Cmp, Imm, 2),
    op(Dex, Imp, 2),
    op(Axs, Imm, 2).undoc(),
    op(Cpy, Abs, 4),
    op(Cmp, Abs, 4),
    op(Dec, Abs, 6),
    op(Dcp, Abs, 6).undoc(),
    // 0xD0
    op(Bne, Rel, 2),
    op(Cmp, IndY, 5).px(),
    JAM,
    op(Dcp, IndY, 8).undoc(),
    op(Nop, ZpX, 4).undoc(),
    op(Cmp, ZpX, 4),
    op(Dec, ZpX, 6),
    op(Dcp, ZpX, 6).undoc(),
    op(Cld, Imp, 2),
    op(Cmp, AbsY, 4).px(),
    op(Nop, Imp, 2).undoc(),
    op(Dcp, AbsY, 7).undoc(),
    op(Nop, AbsX, 4).px().undoc(),
    op(Cmp, AbsX, 4).px(),
    op(Dec, AbsX, 7),
    op(Dcp, AbsX, 7).undoc(),
    // 0xE0
    op(Cpx, Imm, 2),
    op(Sbc, IndX, 6),
    op(Nop, Imm, 2).undoc(),
    op(Isc, IndX, 8).undoc(),
    op(Cpx, Zp, 3),
    op(Sbc, Zp, 3),
    op(Inc, Zp, 5),
    op(Isc, Zp, 5).undoc(),
    op(Inx, Imp, 2),
    op(Sbc, Imm, 2),
    op(Nop, Imp, 2),
    op(Sbc, Imm, 2).undoc(),
    op(Cpx, Abs, 4),
    op(Sbc, Abs, 4),
    op(Inc, Abs, 6),
    op(Isc, Abs, 6).undoc(),
    // 0xF0
    op(Beq, Rel, 2),
    op(Sbc, IndY, 5).px(),
    JAM,
    op(Isc, IndY, 8).undoc(),
    op(Nop, ZpX, 4).undoc(),
    op(Sbc, ZpX, 4),
    op(Inc, ZpX, 6),
    op(Isc, ZpX, 6).undoc(),
    op(Sed, Imp, 2),
    op(Sbc, AbsY, 4).px(),
    op(Nop, Imp, 2).undoc(),
    op(Isc, AbsY, 7).undoc(),
    op(Nop, AbsX, 4).px().undoc(),
    op(Sbc, AbsX, 4).px(),
    op(Inc, AbsX, 7),
    op(Isc, AbsX, 7).undoc(),
];
