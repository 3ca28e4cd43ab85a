// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Static instruction tables for the MOS 6502 family.
//!
//! One array per CPU variant; profile selection concatenates and filters
//! them. Entries are ordered by opcode value. The operand byte count and
//! branch class are derived from the addressing mode when the profile is
//! built, so the rows stay minimal.

use super::operand::{AddressMode, Width};

/// One (mnemonic, mode) → opcode row.
pub(crate) struct Entry {
    pub mnemonic: &'static str,
    pub mode: AddressMode,
    pub opcode: u8,
}

const fn e(mnemonic: &'static str, mode: AddressMode, opcode: u8) -> Entry {
    Entry {
        mnemonic,
        mode,
        opcode,
    }
}

use AddressMode::*;
use Width::{Byte as B, Long as L, Word as W};

/// Documented base 6502 instructions.
pub(crate) static OPCODES_6502: &[Entry] = &[
    e("brk", Implied, 0x00),
    e("ora", IndirectX(B), 0x01),
    e("ora", Direct(B), 0x05),
    e("asl", Direct(B), 0x06),
    e("php", Implied, 0x08),
    e("ora", Immediate(B), 0x09),
    e("asl", Implied, 0x0a),
    e("ora", Direct(W), 0x0d),
    e("asl", Direct(W), 0x0e),
    e("bpl", Relative(B), 0x10),
    e("ora", IndirectY, 0x11),
    e("ora", DirectX(B), 0x15),
    e("asl", DirectX(B), 0x16),
    e("clc", Implied, 0x18),
    e("ora", DirectY(W), 0x19),
    e("ora", DirectX(W), 0x1d),
    e("asl", DirectX(W), 0x1e),
    e("jsr", Direct(W), 0x20),
    e("and", IndirectX(B), 0x21),
    e("bit", Direct(B), 0x24),
    e("and", Direct(B), 0x25),
    e("rol", Direct(B), 0x26),
    e("plp", Implied, 0x28),
    e("and", Immediate(B), 0x29),
    e("rol", Implied, 0x2a),
    e("bit", Direct(W), 0x2c),
    e("and", Direct(W), 0x2d),
    e("rol", Direct(W), 0x2e),
    e("bmi", Relative(B), 0x30),
    e("and", IndirectY, 0x31),
    e("and", DirectX(B), 0x35),
    e("rol", DirectX(B), 0x36),
    e("sec", Implied, 0x38),
    e("and", DirectY(W), 0x39),
    e("and", DirectX(W), 0x3d),
    e("rol", DirectX(W), 0x3e),
    e("rti", Implied, 0x40),
    e("eor", IndirectX(B), 0x41),
    e("eor", Direct(B), 0x45),
    e("lsr", Direct(B), 0x46),
    e("pha", Implied, 0x48),
    e("eor", Immediate(B), 0x49),
    e("lsr", Implied, 0x4a),
    e("jmp", Direct(W), 0x4c),
    e("eor", Direct(W), 0x4d),
    e("lsr", Direct(W), 0x4e),
    e("bvc", Relative(B), 0x50),
    e("eor", IndirectY, 0x51),
    e("eor", DirectX(B), 0x55),
    e("lsr", DirectX(B), 0x56),
    e("cli", Implied, 0x58),
    e("eor", DirectY(W), 0x59),
    e("eor", DirectX(W), 0x5d),
    e("lsr", DirectX(W), 0x5e),
    e("rts", Implied, 0x60),
    e("adc", IndirectX(B), 0x61),
    e("adc", Direct(B), 0x65),
    e("ror", Direct(B), 0x66),
    e("pla", Implied, 0x68),
    e("adc", Immediate(B), 0x69),
    e("ror", Implied, 0x6a),
    e("jmp", Indirect(W), 0x6c),
    e("adc", Direct(W), 0x6d),
    e("ror", Direct(W), 0x6e),
    e("bvs", Relative(B), 0x70),
    e("adc", IndirectY, 0x71),
    e("adc", DirectX(B), 0x75),
    e("ror", DirectX(B), 0x76),
    e("sei", Implied, 0x78),
    e("adc", DirectY(W), 0x79),
    e("adc", DirectX(W), 0x7d),
    e("ror", DirectX(W), 0x7e),
    e("sta", IndirectX(B), 0x81),
    e("sty", Direct(B), 0x84),
    e("sta", Direct(B), 0x85),
    e("stx", Direct(B), 0x86),
    e("dey", Implied, 0x88),
    e("txa", Implied, 0x8a),
    e("sty", Direct(W), 0x8c),
    e("sta", Direct(W), 0x8d),
    e("stx", Direct(W), 0x8e),
    e("bcc", Relative(B), 0x90),
    e("sta", IndirectY, 0x91),
    e("sty", DirectX(B), 0x94),
    e("sta", DirectX(B), 0x95),
    e("stx", DirectY(B), 0x96),
    e("tya", Implied, 0x98),
    e("sta", DirectY(W), 0x99),
    e("txs", Implied, 0x9a),
    e("sta", DirectX(W), 0x9d),
    e("ldy", Immediate(B), 0xa0),
    e("lda", IndirectX(B), 0xa1),
    e("ldx", Immediate(B), 0xa2),
    e("ldy", Direct(B), 0xa4),
    e("lda", Direct(B), 0xa5),
    e("ldx", Direct(B), 0xa6),
    e("tay", Implied, 0xa8),
    e("lda", Immediate(B), 0xa9),
    e("tax", Implied, 0xaa),
    e("ldy", Direct(W), 0xac),
    e("lda", Direct(W), 0xad),
    e("ldx", Direct(W), 0xae),
    e("bcs", Relative(B), 0xb0),
    e("lda", IndirectY, 0xb1),
    e("ldy", DirectX(B), 0xb4),
    e("lda", DirectX(B), 0xb5),
    e("ldx", DirectY(B), 0xb6),
    e("clv", Implied, 0xb8),
    e("lda", DirectY(W), 0xb9),
    e("tsx", Implied, 0xba),
    e("ldy", DirectX(W), 0xbc),
    e("lda", DirectX(W), 0xbd),
    e("ldx", DirectY(W), 0xbe),
    e("cpy", Immediate(B), 0xc0),
    e("cmp", IndirectX(B), 0xc1),
    e("cpy", Direct(B), 0xc4),
    e("cmp", Direct(B), 0xc5),
    e("dec", Direct(B), 0xc6),
    e("iny", Implied, 0xc8),
    e("cmp", Immediate(B), 0xc9),
    e("dex", Implied, 0xca),
    e("cpy", Direct(W), 0xcc),
    e("cmp", Direct(W), 0xcd),
    e("dec", Direct(W), 0xce),
    e("bne", Relative(B), 0xd0),
    e("cmp", IndirectY, 0xd1),
    e("cmp", DirectX(B), 0xd5),
    e("dec", DirectX(B), 0xd6),
    e("cld", Implied, 0xd8),
    e("cmp", DirectY(W), 0xd9),
    e("cmp", DirectX(W), 0xdd),
    e("dec", DirectX(W), 0xde),
    e("cpx", Immediate(B), 0xe0),
    e("sbc", IndirectX(B), 0xe1),
    e("cpx", Direct(B), 0xe4),
    e("sbc", Direct(B), 0xe5),
    e("inc", Direct(B), 0xe6),
    e("inx", Implied, 0xe8),
    e("sbc", Immediate(B), 0xe9),
    e("nop", Implied, 0xea),
    e("cpx", Direct(W), 0xec),
    e("sbc", Direct(W), 0xed),
    e("inc", Direct(W), 0xee),
    e("beq", Relative(B), 0xf0),
    e("sbc", IndirectY, 0xf1),
    e("sbc", DirectX(B), 0xf5),
    e("inc", DirectX(B), 0xf6),
    e("sed", Implied, 0xf8),
    e("sbc", DirectY(W), 0xf9),
    e("sbc", DirectX(W), 0xfd),
    e("inc", DirectX(W), 0xfe),
];

/// Undocumented NMOS opcodes (6502i target).
pub(crate) static OPCODES_6502I: &[Entry] = &[
    e("jam", Implied, 0x02),
    e("slo", IndirectX(B), 0x03),
    e("dop", Direct(B), 0x04),
    e("slo", Direct(B), 0x07),
    e("top", Implied, 0x0c),
    e("top", Direct(W), 0x0c),
    e("slo", Direct(W), 0x0f),
    e("stp", Implied, 0x12),
    e("slo", IndirectY, 0x13),
    e("dop", DirectX(B), 0x14),
    e("slo", DirectX(B), 0x17),
    e("slo", DirectY(W), 0x1b),
    e("top", DirectX(W), 0x1c),
    e("slo", DirectX(W), 0x1f),
    e("rla", IndirectX(B), 0x23),
    e("rla", Direct(B), 0x27),
    e("anc", Immediate(B), 0x2b),
    e("rla", Direct(W), 0x2f),
    e("rla", IndirectY, 0x33),
    e("rla", DirectX(B), 0x37),
    e("rla", DirectY(W), 0x3b),
    e("rla", DirectX(W), 0x3f),
    e("sre", IndirectX(B), 0x43),
    e("sre", Direct(B), 0x47),
    e("asr", Immediate(B), 0x4b),
    e("sre", Direct(W), 0x4f),
    e("sre", IndirectY, 0x53),
    e("sre", DirectX(B), 0x57),
    e("sre", DirectY(W), 0x5b),
    e("sre", DirectX(W), 0x5f),
    e("rra", IndirectX(B), 0x63),
    e("rra", Direct(B), 0x67),
    e("arr", Immediate(B), 0x6b),
    e("rra", Direct(W), 0x6f),
    e("rra", IndirectY, 0x73),
    e("rra", DirectX(B), 0x77),
    e("rra", DirectY(W), 0x7b),
    e("rra", DirectX(W), 0x7f),
    e("dop", Implied, 0x80),
    e("dop", Immediate(B), 0x80),
    e("sax", IndirectX(B), 0x83),
    e("sax", Direct(B), 0x87),
    e("ane", Immediate(B), 0x8b),
    e("sax", Direct(W), 0x8f),
    e("sha", IndirectY, 0x93),
    e("sax", DirectY(B), 0x97),
    e("tas", DirectY(W), 0x9b),
    e("shy", DirectX(W), 0x9c),
    e("shx", DirectY(W), 0x9e),
    e("sha", DirectY(W), 0x9f),
    e("lax", IndirectX(B), 0xa3),
    e("lax", Direct(B), 0xa7),
    e("lax", Direct(W), 0xaf),
    e("lax", IndirectY, 0xb3),
    e("lax", DirectY(B), 0xb7),
    e("las", DirectY(W), 0xbb),
    e("lax", DirectY(W), 0xbf),
    e("dcp", IndirectX(B), 0xc3),
    e("dcp", Direct(B), 0xc7),
    e("sax", Immediate(B), 0xcb),
    e("dcp", Direct(W), 0xcf),
    e("dcp", IndirectY, 0xd3),
    e("dcp", DirectX(B), 0xd7),
    e("dcp", DirectY(W), 0xdb),
    e("dcp", DirectX(W), 0xdf),
    e("isb", IndirectX(B), 0xe3),
    e("isb", Direct(B), 0xe7),
    e("isb", Direct(W), 0xef),
    e("isb", IndirectY, 0xf3),
    e("isb", DirectX(B), 0xf7),
    e("isb", DirectY(W), 0xfb),
    e("isb", DirectX(W), 0xff),
];

/// 65C02 extensions over the base 6502.
pub(crate) static OPCODES_65C02: &[Entry] = &[
    e("tsb", Direct(B), 0x04),
    e("tsb", Direct(W), 0x0c),
    e("ora", Indirect(B), 0x12),
    e("trb", Direct(B), 0x14),
    e("inc", Implied, 0x1a),
    e("trb", Direct(W), 0x1c),
    e("and", Indirect(B), 0x32),
    e("bit", DirectX(B), 0x34),
    e("dec", Implied, 0x3a),
    e("bit", DirectX(W), 0x3c),
    e("eor", Indirect(B), 0x52),
    e("phy", Implied, 0x5a),
    e("stz", Direct(B), 0x64),
    e("adc", Indirect(B), 0x72),
    e("stz", DirectX(B), 0x74),
    e("ply", Implied, 0x7a),
    e("jmp", IndirectX(W), 0x7c),
    e("bra", Relative(B), 0x80),
    e("bit", Immediate(B), 0x89),
    e("sta", Indirect(B), 0x92),
    e("stz", Direct(W), 0x9c),
    e("stz", DirectX(W), 0x9e),
    e("lda", Indirect(B), 0xb2),
    e("cmp", Indirect(B), 0xd2),
    e("phx", Implied, 0xda),
    e("sbc", Indirect(B), 0xf2),
    e("plx", Implied, 0xfa),
];

/// Rockwell bit instructions (R65C02 and 65CE02).
pub(crate) static OPCODES_R65C02: &[Entry] = &[
    e("rmb", BitDirect(0), 0x07),
    e("bbr", BitRelative(0), 0x0f),
    e("rmb", BitDirect(1), 0x17),
    e("bbr", BitRelative(1), 0x1f),
    e("rmb", BitDirect(2), 0x27),
    e("bbr", BitRelative(2), 0x2f),
    e("rmb", BitDirect(3), 0x37),
    e("bbr", BitRelative(3), 0x3f),
    e("rmb", BitDirect(4), 0x47),
    e("bbr", BitRelative(4), 0x4f),
    e("rmb", BitDirect(5), 0x57),
    e("bbr", BitRelative(5), 0x5f),
    e("rmb", BitDirect(6), 0x67),
    e("bbr", BitRelative(6), 0x6f),
    e("rmb", BitDirect(7), 0x77),
    e("bbr", BitRelative(7), 0x7f),
    e("smb", BitDirect(0), 0x87),
    e("bbs", BitRelative(0), 0x8f),
    e("smb", BitDirect(1), 0x97),
    e("bbs", BitRelative(1), 0x9f),
    e("smb", BitDirect(2), 0xa7),
    e("bbs", BitRelative(2), 0xaf),
    e("smb", BitDirect(3), 0xb7),
    e("bbs", BitRelative(3), 0xbf),
    e("smb", BitDirect(4), 0xc7),
    e("bbs", BitRelative(4), 0xcf),
    e("smb", BitDirect(5), 0xd7),
    e("bbs", BitRelative(5), 0xdf),
    e("smb", BitDirect(6), 0xe7),
    e("bbs", BitRelative(6), 0xef),
    e("smb", BitDirect(7), 0xf7),
    e("bbs", BitRelative(7), 0xff),
];

/// 65CE02 extensions.
///
/// Branches are stored as the word-relative forms; the branch encoder
/// narrows to the byte form (opcode − 3, one byte shorter) when the
/// displacement fits. Bare `($nn)` assembles as `($nn),z` on this CPU, so
/// both keys map to the same opcodes.
pub(crate) static OPCODES_65CE02: &[Entry] = &[
    e("cle", Implied, 0x02),
    e("see", Implied, 0x03),
    e("tsy", Implied, 0x0b),
    e("ora", Indirect(B), 0x12),
    e("ora", IndirectZ, 0x12),
    e("bpl", Relative(W), 0x13),
    e("inz", Implied, 0x1b),
    e("jsr", Indirect(W), 0x22),
    e("jsr", IndirectX(W), 0x23),
    e("tys", Implied, 0x2b),
    e("and", Indirect(B), 0x32),
    e("and", IndirectZ, 0x32),
    e("bmi", Relative(W), 0x33),
    e("dez", Implied, 0x3b),
    e("neg", Implied, 0x42),
    e("asr", Implied, 0x43),
    e("asr", Direct(B), 0x44),
    e("taz", Implied, 0x4b),
    e("eor", Indirect(B), 0x52),
    e("eor", IndirectZ, 0x52),
    e("bvc", Relative(W), 0x53),
    e("asr", DirectX(B), 0x54),
    e("tab", Implied, 0x5b),
    e("map", Implied, 0x5c),
    e("rtn", Immediate(B), 0x62),
    e("bsr", Relative(W), 0x63),
    e("tza", Implied, 0x6b),
    e("adc", Indirect(B), 0x72),
    e("adc", IndirectZ, 0x72),
    e("bvs", Relative(W), 0x73),
    e("tba", Implied, 0x7b),
    e("bra", Relative(W), 0x83),
    e("sta", StackRelativeY, 0x82),
    e("sty", DirectX(W), 0x8b),
    e("sta", Indirect(B), 0x92),
    e("sta", IndirectZ, 0x92),
    e("bcc", Relative(W), 0x93),
    e("blt", Relative(W), 0x93),
    e("stx", DirectY(W), 0x9b),
    e("ldz", Immediate(B), 0xa3),
    e("ldz", Direct(W), 0xab),
    e("lda", Indirect(B), 0xb2),
    e("lda", IndirectZ, 0xb2),
    e("bcs", Relative(W), 0xb3),
    e("bge", Relative(W), 0xb3),
    e("ldz", DirectX(W), 0xbb),
    e("cpz", Immediate(B), 0xc2),
    e("dew", Direct(B), 0xc3),
    e("asw", Direct(W), 0xcb),
    e("cmp", Indirect(B), 0xd2),
    e("cmp", IndirectZ, 0xd2),
    e("bne", Relative(W), 0xd3),
    e("cpz", Direct(B), 0xd4),
    e("phz", Implied, 0xdb),
    e("cpz", Direct(W), 0xdc),
    e("lda", StackRelativeY, 0xe2),
    e("inw", Direct(B), 0xe3),
    e("row", Direct(W), 0xeb),
    e("sbc", Indirect(B), 0xf2),
    e("sbc", IndirectZ, 0xf2),
    e("beq", Relative(W), 0xf3),
    e("phw", Immediate(W), 0xf4),
    e("phw", Direct(W), 0xfc),
    e("plz", Implied, 0xfb),
];

/// 65816 extensions (24-bit addressing, stack-relative, block move).
pub(crate) static OPCODES_65816: &[Entry] = &[
    e("cop", Implied, 0x02),
    e("cop", Immediate(B), 0x02),
    e("ora", StackRelative, 0x03),
    e("ora", LongIndirect(B), 0x07),
    e("phd", Implied, 0x0b),
    e("ora", Direct(L), 0x0f),
    e("ora", StackRelativeY, 0x13),
    e("ora", LongIndirectY, 0x17),
    e("tcs", Implied, 0x1b),
    e("ora", DirectX(L), 0x1f),
    e("jsl", Direct(L), 0x22),
    e("jsr", Direct(L), 0x22),
    e("and", StackRelative, 0x23),
    e("and", LongIndirect(B), 0x27),
    e("pld", Implied, 0x2b),
    e("and", Direct(L), 0x2f),
    e("and", StackRelativeY, 0x33),
    e("and", LongIndirectY, 0x37),
    e("tsc", Implied, 0x3b),
    e("and", DirectX(L), 0x3f),
    e("wdm", Implied, 0x42),
    e("eor", StackRelative, 0x43),
    e("mvp", BlockMove, 0x44),
    e("eor", LongIndirect(B), 0x47),
    e("phk", Implied, 0x4b),
    e("eor", Direct(L), 0x4f),
    e("eor", StackRelativeY, 0x53),
    e("mvn", BlockMove, 0x54),
    e("eor", LongIndirectY, 0x57),
    e("tcd", Implied, 0x5b),
    e("jml", Direct(L), 0x5c),
    e("jmp", Direct(L), 0x5c),
    e("eor", DirectX(L), 0x5f),
    e("per", Relative(W), 0x62),
    e("adc", StackRelative, 0x63),
    e("adc", LongIndirect(B), 0x67),
    e("rtl", Implied, 0x6b),
    e("adc", Direct(L), 0x6f),
    e("adc", StackRelativeY, 0x73),
    e("adc", LongIndirectY, 0x77),
    e("tdc", Implied, 0x7b),
    e("adc", DirectX(L), 0x7f),
    e("brl", Relative(W), 0x82),
    e("sta", StackRelative, 0x83),
    e("sta", LongIndirect(B), 0x87),
    e("phb", Implied, 0x8b),
    e("sta", Direct(L), 0x8f),
    e("sta", StackRelativeY, 0x93),
    e("sta", LongIndirectY, 0x97),
    e("txy", Implied, 0x9b),
    e("sta", DirectX(L), 0x9f),
    e("lda", StackRelative, 0xa3),
    e("lda", LongIndirect(B), 0xa7),
    e("plb", Implied, 0xab),
    e("lda", Direct(L), 0xaf),
    e("lda", StackRelativeY, 0xb3),
    e("lda", LongIndirectY, 0xb7),
    e("tyx", Implied, 0xbb),
    e("lda", DirectX(L), 0xbf),
    e("rep", Immediate(B), 0xc2),
    e("cmp", StackRelative, 0xc3),
    e("cmp", LongIndirect(B), 0xc7),
    e("wai", Implied, 0xcb),
    e("cmp", Direct(L), 0xcf),
    e("cmp", StackRelativeY, 0xd3),
    e("pei", Indirect(B), 0xd4),
    e("cmp", LongIndirectY, 0xd7),
    e("stp", Implied, 0xdb),
    e("jmp", LongIndirect(W), 0xdc),
    e("cmp", DirectX(L), 0xdf),
    e("sep", Immediate(B), 0xe2),
    e("sbc", StackRelative, 0xe3),
    e("sbc", LongIndirect(B), 0xe7),
    e("xba", Implied, 0xeb),
    e("sbc", Direct(L), 0xef),
    e("sbc", StackRelativeY, 0xf3),
    e("pea", Direct(W), 0xf4),
    e("sbc", LongIndirectY, 0xf7),
    e("xce", Implied, 0xfb),
    e("jsr", IndirectX(W), 0xfc),
    e("sbc", DirectX(L), 0xff),
];

/// Whether any CPU variant in the family defines the mnemonic.
pub(crate) fn family_has_mnemonic(mnemonic: &str) -> bool {
    [
        OPCODES_6502,
        OPCODES_6502I,
        OPCODES_65C02,
        OPCODES_R65C02,
        OPCODES_65CE02,
        OPCODES_65816,
    ]
    .iter()
    .any(|table| table.iter().any(|entry| entry.mnemonic == mnemonic))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_table_covers_documented_set() {
        for mnemonic in ["lda", "sta", "jmp", "bne", "nop", "brk"] {
            assert!(
                OPCODES_6502.iter().any(|e| e.mnemonic == mnemonic),
                "missing {mnemonic}"
            );
        }
        assert_eq!(OPCODES_6502.len(), 151);
    }

    #[test]
    fn branch_rows_use_relative_mode() {
        for entry in OPCODES_6502 {
            if ["bcc", "bcs", "beq", "bmi", "bne", "bpl", "bvc", "bvs"]
                .contains(&entry.mnemonic)
            {
                assert!(matches!(entry.mode, Relative(Width::Byte)));
                assert_eq!(entry.opcode & 0x1f, 0x10);
            }
        }
    }

    #[test]
    fn vocabulary_lookup() {
        assert!(family_has_mnemonic("lda"));
        assert!(family_has_mnemonic("mvn"));
        assert!(family_has_mnemonic("rmb"));
        assert!(family_has_mnemonic("ldz"));
        assert!(!family_has_mnemonic("ld"));
        assert!(!family_has_mnemonic("mov"));
    }
}
