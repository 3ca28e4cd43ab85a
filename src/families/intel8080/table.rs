// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Static instruction data for the Intel 8080 / Z80 family.
//!
//! Regular register matrices (8-bit moves, arithmetic, `inc`/`dec`,
//! rotates, pair operations) are expanded into the profile map at
//! construction from the code tables below; the irregular instructions
//! are literal rows here.

use crate::core::instruction::{BranchKind, Instruction, Opcode};

use super::operand::{Cond, ImmWidth, OperandPattern, Reg};

/// One (mnemonic, pattern pair) → instruction row.
pub(crate) struct Entry {
    pub mnemonic: &'static str,
    pub p1: OperandPattern,
    pub p2: OperandPattern,
    pub instruction: Instruction,
}

const fn e(
    mnemonic: &'static str,
    p1: OperandPattern,
    p2: OperandPattern,
    opcode: Opcode,
    size: u8,
) -> Entry {
    Entry {
        mnemonic,
        p1,
        p2,
        instruction: Instruction::new(opcode, size),
    }
}

const fn br(
    mnemonic: &'static str,
    p1: OperandPattern,
    p2: OperandPattern,
    opcode: Opcode,
    size: u8,
) -> Entry {
    Entry {
        mnemonic,
        p1,
        p2,
        instruction: Instruction::branching(opcode, size, BranchKind::Byte),
    }
}

use OperandPattern::{Cond as Cc, Imm, IndImm, IndReg, Indexed, None as Np, Reg as Rp};

const B: ImmWidth = ImmWidth::Byte;
const W: ImmWidth = ImmWidth::Word;

/// 8-bit register field codes shared by both CPUs. The memory slot
/// (code 6) differs: `(hl)` on the Z80, `m` on the 8080.
pub(crate) const R8_Z80: &[(OperandPattern, u8)] = &[
    (Rp(Reg::B), 0),
    (Rp(Reg::C), 1),
    (Rp(Reg::D), 2),
    (Rp(Reg::E), 3),
    (Rp(Reg::H), 4),
    (Rp(Reg::L), 5),
    (IndReg(Reg::Hl), 6),
    (Rp(Reg::A), 7),
];

pub(crate) const R8_I8080: &[(OperandPattern, u8)] = &[
    (Rp(Reg::B), 0),
    (Rp(Reg::C), 1),
    (Rp(Reg::D), 2),
    (Rp(Reg::E), 3),
    (Rp(Reg::H), 4),
    (Rp(Reg::L), 5),
    (Rp(Reg::M), 6),
    (Rp(Reg::A), 7),
];

/// Undocumented Z80 half-index registers: register field code and the
/// index prefix byte.
pub(crate) const R8_HALVES: &[(Reg, u8, u8)] = &[
    (Reg::IxH, 4, 0xdd),
    (Reg::IxL, 5, 0xdd),
    (Reg::IyH, 4, 0xfd),
    (Reg::IyL, 5, 0xfd),
];

/// Half-index partners for 8-bit moves (`h`/`l`/`(hl)` cannot mix with
/// the halves).
pub(crate) const HALF_PARTNERS: &[(Reg, u8)] = &[
    (Reg::B, 0),
    (Reg::C, 1),
    (Reg::D, 2),
    (Reg::E, 3),
    (Reg::A, 7),
];

/// Register-pair field codes.
pub(crate) const PAIRS: &[(Reg, u8)] = &[
    (Reg::Bc, 0),
    (Reg::De, 1),
    (Reg::Hl, 2),
    (Reg::Sp, 3),
];

/// 8080 pair aliases used by `lxi`/`inx`/`dcx`/`dad` (`b` names `bc`...).
pub(crate) const PAIRS_I8080: &[(Reg, u8)] = &[
    (Reg::B, 0),
    (Reg::D, 1),
    (Reg::H, 2),
    (Reg::Sp, 3),
];

/// Condition field codes. Carry and minus key on their register patterns.
pub(crate) const CONDS: &[(OperandPattern, u8)] = &[
    (Cc(Cond::Nz), 0),
    (Cc(Cond::Z), 1),
    (Cc(Cond::Nc), 2),
    (Rp(Reg::C), 3),
    (Cc(Cond::Po), 4),
    (Cc(Cond::Pe), 5),
    (Cc(Cond::P), 6),
    (Rp(Reg::M), 7),
];

/// The four conditions `jr` accepts.
pub(crate) const JR_CONDS: &[(OperandPattern, u8)] = &[
    (Cc(Cond::Nz), 0x20),
    (Cc(Cond::Z), 0x28),
    (Cc(Cond::Nc), 0x30),
    (Rp(Reg::C), 0x38),
];

/// Z80 8-bit arithmetic: register-form base opcode and immediate-form
/// opcode.
pub(crate) const ARITH_Z80: &[(&str, u8, u8)] = &[
    ("add", 0x80, 0xc6),
    ("adc", 0x88, 0xce),
    ("sub", 0x90, 0xd6),
    ("sbc", 0x98, 0xde),
    ("and", 0xa0, 0xe6),
    ("xor", 0xa8, 0xee),
    ("or", 0xb0, 0xf6),
    ("cp", 0xb8, 0xfe),
];

/// 8080 8-bit arithmetic register forms.
pub(crate) const ARITH_I8080: &[(&str, u8)] = &[
    ("add", 0x80),
    ("adc", 0x88),
    ("sub", 0x90),
    ("sbb", 0x98),
    ("ana", 0xa0),
    ("xra", 0xa8),
    ("ora", 0xb0),
    ("cmp", 0xb8),
];

/// 8080 immediate arithmetic.
pub(crate) const ARITH_IMM_I8080: &[(&str, u8)] = &[
    ("adi", 0xc6),
    ("aci", 0xce),
    ("sui", 0xd6),
    ("sbi", 0xde),
    ("ani", 0xe6),
    ("xri", 0xee),
    ("ori", 0xf6),
    ("cpi", 0xfe),
];

/// Z80 CB-prefixed rotates and shifts, base opcodes.
pub(crate) const ROTATES: &[(&str, u8)] = &[
    ("rlc", 0x00),
    ("rrc", 0x08),
    ("rl", 0x10),
    ("rr", 0x18),
    ("sla", 0x20),
    ("sra", 0x28),
    ("sll", 0x30),
    ("srl", 0x38),
];

/// Irregular Z80 instructions.
pub(crate) static Z80_LITERALS: &[Entry] = &[
    // No-operand group.
    e("nop", Np, Np, Opcode::one(0x00), 1),
    e("rlca", Np, Np, Opcode::one(0x07), 1),
    e("ex", Rp(Reg::Af), Rp(Reg::AfShadow), Opcode::one(0x08), 1),
    e("rrca", Np, Np, Opcode::one(0x0f), 1),
    e("rla", Np, Np, Opcode::one(0x17), 1),
    e("rra", Np, Np, Opcode::one(0x1f), 1),
    e("daa", Np, Np, Opcode::one(0x27), 1),
    e("cpl", Np, Np, Opcode::one(0x2f), 1),
    e("scf", Np, Np, Opcode::one(0x37), 1),
    e("ccf", Np, Np, Opcode::one(0x3f), 1),
    e("halt", Np, Np, Opcode::one(0x76), 1),
    e("exx", Np, Np, Opcode::one(0xd9), 1),
    e("di", Np, Np, Opcode::one(0xf3), 1),
    e("ei", Np, Np, Opcode::one(0xfb), 1),
    e("neg", Np, Np, Opcode::two(0xed, 0x44), 2),
    e("retn", Np, Np, Opcode::two(0xed, 0x45), 2),
    e("reti", Np, Np, Opcode::two(0xed, 0x4d), 2),
    e("rrd", Np, Np, Opcode::two(0xed, 0x67), 2),
    e("rld", Np, Np, Opcode::two(0xed, 0x6f), 2),
    e("ldi", Np, Np, Opcode::two(0xed, 0xa0), 2),
    e("cpi", Np, Np, Opcode::two(0xed, 0xa1), 2),
    e("ini", Np, Np, Opcode::two(0xed, 0xa2), 2),
    e("outi", Np, Np, Opcode::two(0xed, 0xa3), 2),
    e("ldd", Np, Np, Opcode::two(0xed, 0xa8), 2),
    e("cpd", Np, Np, Opcode::two(0xed, 0xa9), 2),
    e("ind", Np, Np, Opcode::two(0xed, 0xaa), 2),
    e("outd", Np, Np, Opcode::two(0xed, 0xab), 2),
    e("ldir", Np, Np, Opcode::two(0xed, 0xb0), 2),
    e("cpir", Np, Np, Opcode::two(0xed, 0xb1), 2),
    e("inir", Np, Np, Opcode::two(0xed, 0xb2), 2),
    e("otir", Np, Np, Opcode::two(0xed, 0xb3), 2),
    e("lddr", Np, Np, Opcode::two(0xed, 0xb8), 2),
    e("cpdr", Np, Np, Opcode::two(0xed, 0xb9), 2),
    e("indr", Np, Np, Opcode::two(0xed, 0xba), 2),
    e("otdr", Np, Np, Opcode::two(0xed, 0xbb), 2),
    // Accumulator loads through pairs and absolute addresses.
    e("ld", IndReg(Reg::Bc), Rp(Reg::A), Opcode::one(0x02), 1),
    e("ld", Rp(Reg::A), IndReg(Reg::Bc), Opcode::one(0x0a), 1),
    e("ld", IndReg(Reg::De), Rp(Reg::A), Opcode::one(0x12), 1),
    e("ld", Rp(Reg::A), IndReg(Reg::De), Opcode::one(0x1a), 1),
    e("ld", IndImm(W), Rp(Reg::Hl), Opcode::one(0x22), 3),
    e("ld", Rp(Reg::Hl), IndImm(W), Opcode::one(0x2a), 3),
    e("ld", IndImm(W), Rp(Reg::A), Opcode::one(0x32), 3),
    e("ld", Rp(Reg::A), IndImm(W), Opcode::one(0x3a), 3),
    // Interrupt and refresh registers.
    e("ld", Rp(Reg::I), Rp(Reg::A), Opcode::two(0xed, 0x47), 2),
    e("ld", Rp(Reg::R), Rp(Reg::A), Opcode::two(0xed, 0x4f), 2),
    e("ld", Rp(Reg::A), Rp(Reg::I), Opcode::two(0xed, 0x57), 2),
    e("ld", Rp(Reg::A), Rp(Reg::R), Opcode::two(0xed, 0x5f), 2),
    // Pair loads through absolute addresses.
    e("ld", IndImm(W), Rp(Reg::Bc), Opcode::two(0xed, 0x43), 4),
    e("ld", Rp(Reg::Bc), IndImm(W), Opcode::two(0xed, 0x4b), 4),
    e("ld", IndImm(W), Rp(Reg::De), Opcode::two(0xed, 0x53), 4),
    e("ld", Rp(Reg::De), IndImm(W), Opcode::two(0xed, 0x5b), 4),
    e("ld", IndImm(W), Rp(Reg::Sp), Opcode::two(0xed, 0x73), 4),
    e("ld", Rp(Reg::Sp), IndImm(W), Opcode::two(0xed, 0x7b), 4),
    // Index-register loads.
    e("ld", Rp(Reg::Ix), Imm(W), Opcode::two(0xdd, 0x21), 4),
    e("ld", Rp(Reg::Iy), Imm(W), Opcode::two(0xfd, 0x21), 4),
    e("ld", IndImm(W), Rp(Reg::Ix), Opcode::two(0xdd, 0x22), 4),
    e("ld", IndImm(W), Rp(Reg::Iy), Opcode::two(0xfd, 0x22), 4),
    e("ld", Rp(Reg::Ix), IndImm(W), Opcode::two(0xdd, 0x2a), 4),
    e("ld", Rp(Reg::Iy), IndImm(W), Opcode::two(0xfd, 0x2a), 4),
    // Stack pointer transfers.
    e("ld", Rp(Reg::Sp), Rp(Reg::Hl), Opcode::one(0xf9), 1),
    e("ld", Rp(Reg::Sp), Rp(Reg::Ix), Opcode::two(0xdd, 0xf9), 2),
    e("ld", Rp(Reg::Sp), Rp(Reg::Iy), Opcode::two(0xfd, 0xf9), 2),
    // Exchanges.
    e("ex", IndReg(Reg::Sp), Rp(Reg::Hl), Opcode::one(0xe3), 1),
    e("ex", IndReg(Reg::Sp), Rp(Reg::Ix), Opcode::two(0xdd, 0xe3), 2),
    e("ex", IndReg(Reg::Sp), Rp(Reg::Iy), Opcode::two(0xfd, 0xe3), 2),
    e("ex", Rp(Reg::De), Rp(Reg::Hl), Opcode::one(0xeb), 1),
    // Jumps.
    e("jp", Imm(W), Np, Opcode::one(0xc3), 3),
    e("jp", IndReg(Reg::Hl), Np, Opcode::one(0xe9), 1),
    e("jp", Indexed(Reg::Ix), Np, Opcode::two(0xdd, 0xe9), 2),
    e("jp", Indexed(Reg::Iy), Np, Opcode::two(0xfd, 0xe9), 2),
    // Relative branches.
    br("djnz", Imm(W), Np, Opcode::one(0x10), 2),
    br("jr", Imm(W), Np, Opcode::one(0x18), 2),
    // Calls and returns.
    e("call", Imm(W), Np, Opcode::one(0xcd), 3),
    e("ret", Np, Np, Opcode::one(0xc9), 1),
    // I/O through the immediate port.
    e("in", Rp(Reg::A), IndImm(B), Opcode::one(0xdb), 2),
    e("out", IndImm(B), Rp(Reg::A), Opcode::one(0xd3), 2),
];

/// Irregular 8080 instructions.
pub(crate) static I8080_LITERALS: &[Entry] = &[
    e("nop", Np, Np, Opcode::one(0x00), 1),
    e("rlc", Np, Np, Opcode::one(0x07), 1),
    e("rrc", Np, Np, Opcode::one(0x0f), 1),
    e("ral", Np, Np, Opcode::one(0x17), 1),
    e("rar", Np, Np, Opcode::one(0x1f), 1),
    e("daa", Np, Np, Opcode::one(0x27), 1),
    e("cma", Np, Np, Opcode::one(0x2f), 1),
    e("stc", Np, Np, Opcode::one(0x37), 1),
    e("cmc", Np, Np, Opcode::one(0x3f), 1),
    e("hlt", Np, Np, Opcode::one(0x76), 1),
    e("xthl", Np, Np, Opcode::one(0xe3), 1),
    e("pchl", Np, Np, Opcode::one(0xe9), 1),
    e("xchg", Np, Np, Opcode::one(0xeb), 1),
    e("di", Np, Np, Opcode::one(0xf3), 1),
    e("sphl", Np, Np, Opcode::one(0xf9), 1),
    e("ei", Np, Np, Opcode::one(0xfb), 1),
    // Accumulator loads and stores.
    e("stax", Rp(Reg::B), Np, Opcode::one(0x02), 1),
    e("ldax", Rp(Reg::B), Np, Opcode::one(0x0a), 1),
    e("stax", Rp(Reg::D), Np, Opcode::one(0x12), 1),
    e("ldax", Rp(Reg::D), Np, Opcode::one(0x1a), 1),
    e("shld", Imm(W), Np, Opcode::one(0x22), 3),
    e("lhld", Imm(W), Np, Opcode::one(0x2a), 3),
    e("sta", Imm(W), Np, Opcode::one(0x32), 3),
    e("lda", Imm(W), Np, Opcode::one(0x3a), 3),
    // Jumps.
    e("jnz", Imm(W), Np, Opcode::one(0xc2), 3),
    e("jmp", Imm(W), Np, Opcode::one(0xc3), 3),
    e("jz", Imm(W), Np, Opcode::one(0xca), 3),
    e("jnc", Imm(W), Np, Opcode::one(0xd2), 3),
    e("jc", Imm(W), Np, Opcode::one(0xda), 3),
    e("jpo", Imm(W), Np, Opcode::one(0xe2), 3),
    e("jpe", Imm(W), Np, Opcode::one(0xea), 3),
    e("jp", Imm(W), Np, Opcode::one(0xf2), 3),
    e("jm", Imm(W), Np, Opcode::one(0xfa), 3),
    // Calls.
    e("cnz", Imm(W), Np, Opcode::one(0xc4), 3),
    e("cz", Imm(W), Np, Opcode::one(0xcc), 3),
    e("call", Imm(W), Np, Opcode::one(0xcd), 3),
    e("cnc", Imm(W), Np, Opcode::one(0xd4), 3),
    e("cc", Imm(W), Np, Opcode::one(0xdc), 3),
    e("cpo", Imm(W), Np, Opcode::one(0xe4), 3),
    e("cpe", Imm(W), Np, Opcode::one(0xec), 3),
    e("cp", Imm(W), Np, Opcode::one(0xf4), 3),
    e("cm", Imm(W), Np, Opcode::one(0xfc), 3),
    // Returns.
    e("rnz", Np, Np, Opcode::one(0xc0), 1),
    e("rz", Np, Np, Opcode::one(0xc8), 1),
    e("ret", Np, Np, Opcode::one(0xc9), 1),
    e("rnc", Np, Np, Opcode::one(0xd0), 1),
    e("rc", Np, Np, Opcode::one(0xd8), 1),
    e("rpo", Np, Np, Opcode::one(0xe0), 1),
    e("rpe", Np, Np, Opcode::one(0xe8), 1),
    e("rp", Np, Np, Opcode::one(0xf0), 1),
    e("rm", Np, Np, Opcode::one(0xf8), 1),
    // I/O with a bare port number.
    e("out", Imm(B), Np, Opcode::one(0xd3), 2),
    e("in", Imm(B), Np, Opcode::one(0xdb), 2),
];
