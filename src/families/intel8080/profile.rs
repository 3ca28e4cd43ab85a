// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! CPU profile derivation for the Intel 8080 / Z80 family.
//!
//! The two CPUs select disjoint tables built at profile construction:
//! regular register matrices are expanded from the code tables, then the
//! literal rows are merged on top (last insert wins on overlap). A flat
//! opcode-bytes index is kept alongside for disassembly-by-opcode; the
//! encoder never consults it.

use std::collections::{HashMap, HashSet};

use crate::core::cpu::CpuType;
use crate::core::instruction::{BranchKind, Instruction, Opcode};

use super::operand::{ImmWidth, OperandPattern, Reg};
use super::table::{
    ARITH_I8080, ARITH_IMM_I8080, ARITH_Z80, CONDS, HALF_PARTNERS, I8080_LITERALS, JR_CONDS,
    PAIRS, PAIRS_I8080, R8_HALVES, R8_I8080, R8_Z80, ROTATES, Z80_LITERALS,
};
use super::CPU_8080;

use OperandPattern::{Imm, IndReg, Indexed, None as Np, Reg as Rp};

const B: ImmWidth = ImmWidth::Byte;
const W: ImmWidth = ImmWidth::Word;

type PatternPair = (OperandPattern, OperandPattern);
type Table = HashMap<String, HashMap<PatternPair, Instruction>>;

/// The derived encoding table for one CPU of the family.
pub struct CpuProfile {
    cpu: CpuType,
    table: Table,
    vocabulary: HashSet<String>,
    by_opcode: HashMap<Vec<u8>, (String, Instruction)>,
}

impl CpuProfile {
    /// Build the profile for a CPU. The whole value is replaced on a CPU
    /// switch; nothing is mutated in place afterwards. Unknown identifiers
    /// are rejected by the registry before this runs; anything that is not
    /// the 8080 derives the Z80 table.
    pub fn select(cpu: CpuType) -> Self {
        let z80 = z80_table();
        let i8080 = i8080_table();

        let mut vocabulary: HashSet<String> =
            z80.keys().chain(i8080.keys()).cloned().collect();
        // Computed-opcode mnemonics never appear in the tables.
        for extra in ["rst", "im", "bit", "res", "set"] {
            vocabulary.insert(extra.to_string());
        }

        let table = if cpu == CPU_8080 { i8080 } else { z80 };

        let mut by_opcode = HashMap::new();
        for (mnemonic, modes) in &table {
            for instruction in modes.values() {
                by_opcode
                    .entry(instruction.opcode.bytes().to_vec())
                    .or_insert_with(|| (mnemonic.clone(), *instruction));
            }
        }

        Self {
            cpu,
            table,
            vocabulary,
            by_opcode,
        }
    }

    pub fn cpu(&self) -> CpuType {
        self.cpu
    }

    /// Look up the instruction for a (mnemonic, pattern pair) key.
    pub fn lookup(&self, mnemonic: &str, pair: PatternPair) -> Option<Instruction> {
        self.table.get(mnemonic)?.get(&pair).copied()
    }

    /// Whether the active CPU's table has any entry for the mnemonic.
    pub fn has_mnemonic(&self, mnemonic: &str) -> bool {
        self.table.contains_key(mnemonic)
    }

    /// Whether any CPU in the family knows the mnemonic.
    pub fn family_has_mnemonic(&self, mnemonic: &str) -> bool {
        self.vocabulary.contains(mnemonic)
    }

    /// Disassembly index: the instruction starting with these opcode
    /// bytes, if any.
    pub fn instruction_at(&self, opcode: &[u8]) -> Option<(&str, Instruction)> {
        self.by_opcode
            .get(opcode)
            .map(|(mnemonic, ins)| (mnemonic.as_str(), *ins))
    }
}

fn ins(table: &mut Table, mnemonic: &str, p1: OperandPattern, p2: OperandPattern, i: Instruction) {
    table
        .entry(mnemonic.to_string())
        .or_default()
        .insert((p1, p2), i);
}

fn plain(opcode: Opcode, size: u8) -> Instruction {
    Instruction::new(opcode, size)
}

/// Zilog Z80 table: matrices plus the literal rows.
fn z80_table() -> Table {
    let mut t = Table::new();

    // 8-bit load matrix. The (hl),(hl) slot is halt, not a load.
    for &(dst, d) in R8_Z80 {
        for &(src, s) in R8_Z80 {
            if d == 6 && s == 6 {
                continue;
            }
            ins(&mut t, "ld", dst, src, plain(Opcode::one(0x40 | d << 3 | s), 1));
        }
        ins(&mut t, "ld", dst, Imm(B), plain(Opcode::one(0x06 | d << 3), 2));
        if d != 6 {
            ins(&mut t, "ld", dst, Indexed(Reg::Ix), plain(Opcode::two(0xdd, 0x46 | d << 3), 3));
            ins(&mut t, "ld", dst, Indexed(Reg::Iy), plain(Opcode::two(0xfd, 0x46 | d << 3), 3));
            ins(&mut t, "ld", Indexed(Reg::Ix), dst, plain(Opcode::two(0xdd, 0x70 | d), 3));
            ins(&mut t, "ld", Indexed(Reg::Iy), dst, plain(Opcode::two(0xfd, 0x70 | d), 3));
        }
    }
    ins(&mut t, "ld", Indexed(Reg::Ix), Imm(B), plain(Opcode::two(0xdd, 0x36), 4));
    ins(&mut t, "ld", Indexed(Reg::Iy), Imm(B), plain(Opcode::two(0xfd, 0x36), 4));

    // Undocumented half-index loads: halves pair with a/b/c/d/e and with
    // the other half of the same index register.
    for &(half, code, prefix) in R8_HALVES {
        ins(
            &mut t,
            "ld",
            Rp(half),
            Imm(B),
            plain(Opcode::two(prefix, 0x06 | code << 3), 3),
        );
        for &(partner, pcode) in HALF_PARTNERS {
            ins(
                &mut t,
                "ld",
                Rp(half),
                Rp(partner),
                plain(Opcode::two(prefix, 0x40 | code << 3 | pcode), 2),
            );
            ins(
                &mut t,
                "ld",
                Rp(partner),
                Rp(half),
                plain(Opcode::two(prefix, 0x40 | pcode << 3 | code), 2),
            );
        }
        for &(other, ocode, oprefix) in R8_HALVES {
            if oprefix == prefix {
                ins(
                    &mut t,
                    "ld",
                    Rp(half),
                    Rp(other),
                    plain(Opcode::two(prefix, 0x40 | code << 3 | ocode), 2),
                );
            }
        }
    }

    // 16-bit immediate loads.
    for &(pair, p) in PAIRS {
        ins(&mut t, "ld", Rp(pair), Imm(W), plain(Opcode::one(0x01 | p << 4), 3));
    }

    // 8-bit arithmetic: explicit-accumulator, shorthand and immediate
    // forms all share the base opcodes.
    for &(mnemonic, base, imm_op) in ARITH_Z80 {
        for &(operand, code) in R8_Z80 {
            ins(&mut t, mnemonic, Rp(Reg::A), operand, plain(Opcode::one(base | code), 1));
            ins(&mut t, mnemonic, operand, Np, plain(Opcode::one(base | code), 1));
        }
        ins(&mut t, mnemonic, Rp(Reg::A), Imm(B), plain(Opcode::one(imm_op), 2));
        ins(&mut t, mnemonic, Imm(B), Np, plain(Opcode::one(imm_op), 2));
        for &(ix, prefix) in &[(Reg::Ix, 0xdd), (Reg::Iy, 0xfd)] {
            ins(
                &mut t,
                mnemonic,
                Rp(Reg::A),
                Indexed(ix),
                plain(Opcode::two(prefix, base | 6), 3),
            );
            ins(&mut t, mnemonic, Indexed(ix), Np, plain(Opcode::two(prefix, base | 6), 3));
        }
        for &(half, code, prefix) in R8_HALVES {
            ins(
                &mut t,
                mnemonic,
                Rp(Reg::A),
                Rp(half),
                plain(Opcode::two(prefix, base | code), 2),
            );
            ins(&mut t, mnemonic, Rp(half), Np, plain(Opcode::two(prefix, base | code), 2));
        }
    }

    // 16-bit arithmetic.
    for &(pair, p) in PAIRS {
        ins(&mut t, "add", Rp(Reg::Hl), Rp(pair), plain(Opcode::one(0x09 | p << 4), 1));
        ins(&mut t, "adc", Rp(Reg::Hl), Rp(pair), plain(Opcode::two(0xed, 0x4a | p << 4), 2));
        ins(&mut t, "sbc", Rp(Reg::Hl), Rp(pair), plain(Opcode::two(0xed, 0x42 | p << 4), 2));
    }
    for &(ix, prefix) in &[(Reg::Ix, 0xdd), (Reg::Iy, 0xfd)] {
        // The index register replaces hl in its own pair slot.
        for &(pair, p) in &[(Reg::Bc, 0u8), (Reg::De, 1), (ix, 2), (Reg::Sp, 3)] {
            ins(&mut t, "add", Rp(ix), Rp(pair), plain(Opcode::two(prefix, 0x09 | p << 4), 2));
        }
    }

    // Increment / decrement.
    for &(operand, code) in R8_Z80 {
        ins(&mut t, "inc", operand, Np, plain(Opcode::one(0x04 | code << 3), 1));
        ins(&mut t, "dec", operand, Np, plain(Opcode::one(0x05 | code << 3), 1));
    }
    for &(half, code, prefix) in R8_HALVES {
        ins(&mut t, "inc", Rp(half), Np, plain(Opcode::two(prefix, 0x04 | code << 3), 2));
        ins(&mut t, "dec", Rp(half), Np, plain(Opcode::two(prefix, 0x05 | code << 3), 2));
    }
    for &(ix, prefix) in &[(Reg::Ix, 0xdd), (Reg::Iy, 0xfd)] {
        ins(&mut t, "inc", Indexed(ix), Np, plain(Opcode::two(prefix, 0x34), 3));
        ins(&mut t, "dec", Indexed(ix), Np, plain(Opcode::two(prefix, 0x35), 3));
        ins(&mut t, "inc", Rp(ix), Np, plain(Opcode::two(prefix, 0x23), 2));
        ins(&mut t, "dec", Rp(ix), Np, plain(Opcode::two(prefix, 0x2b), 2));
    }
    for &(pair, p) in PAIRS {
        ins(&mut t, "inc", Rp(pair), Np, plain(Opcode::one(0x03 | p << 4), 1));
        ins(&mut t, "dec", Rp(pair), Np, plain(Opcode::one(0x0b | p << 4), 1));
    }

    // CB-prefixed rotates and shifts.
    for &(mnemonic, base) in ROTATES {
        for &(operand, code) in R8_Z80 {
            ins(&mut t, mnemonic, operand, Np, plain(Opcode::two(0xcb, base | code), 2));
        }
        for &(ix, prefix) in &[(Reg::Ix, 0xdd), (Reg::Iy, 0xfd)] {
            ins(
                &mut t,
                mnemonic,
                Indexed(ix),
                Np,
                plain(Opcode::three(prefix, 0xcb, base | 6), 4),
            );
        }
    }

    // Stack operations.
    for &(pair, q) in &[(Reg::Bc, 0u8), (Reg::De, 1), (Reg::Hl, 2), (Reg::Af, 3)] {
        ins(&mut t, "push", Rp(pair), Np, plain(Opcode::one(0xc5 | q << 4), 1));
        ins(&mut t, "pop", Rp(pair), Np, plain(Opcode::one(0xc1 | q << 4), 1));
    }
    for &(ix, prefix) in &[(Reg::Ix, 0xdd), (Reg::Iy, 0xfd)] {
        ins(&mut t, "push", Rp(ix), Np, plain(Opcode::two(prefix, 0xe5), 2));
        ins(&mut t, "pop", Rp(ix), Np, plain(Opcode::two(prefix, 0xe1), 2));
    }

    // Conditional control transfers.
    for &(cond, code) in CONDS {
        ins(&mut t, "jp", cond, Imm(W), plain(Opcode::one(0xc2 | code << 3), 3));
        ins(&mut t, "call", cond, Imm(W), plain(Opcode::one(0xc4 | code << 3), 3));
        ins(&mut t, "ret", cond, Np, plain(Opcode::one(0xc0 | code << 3), 1));
    }
    for &(cond, opcode) in JR_CONDS {
        ins(
            &mut t,
            "jr",
            cond,
            Imm(W),
            Instruction::branching(Opcode::one(opcode), 2, BranchKind::Byte),
        );
    }

    // Register I/O through (c).
    for &(operand, code) in R8_Z80 {
        if code != 6 {
            ins(&mut t, "in", operand, IndReg(Reg::C), plain(Opcode::two(0xed, 0x40 | code << 3), 2));
            ins(&mut t, "out", IndReg(Reg::C), operand, plain(Opcode::two(0xed, 0x41 | code << 3), 2));
        }
    }

    for entry in Z80_LITERALS {
        ins(&mut t, entry.mnemonic, entry.p1, entry.p2, entry.instruction);
    }
    t
}

/// Intel 8080 table.
fn i8080_table() -> Table {
    let mut t = Table::new();

    for &(dst, d) in R8_I8080 {
        for &(src, s) in R8_I8080 {
            if d == 6 && s == 6 {
                continue;
            }
            ins(&mut t, "mov", dst, src, plain(Opcode::one(0x40 | d << 3 | s), 1));
        }
        ins(&mut t, "mvi", dst, Imm(B), plain(Opcode::one(0x06 | d << 3), 2));
        ins(&mut t, "inr", dst, Np, plain(Opcode::one(0x04 | d << 3), 1));
        ins(&mut t, "dcr", dst, Np, plain(Opcode::one(0x05 | d << 3), 1));
    }

    for &(mnemonic, base) in ARITH_I8080 {
        for &(operand, code) in R8_I8080 {
            ins(&mut t, mnemonic, operand, Np, plain(Opcode::one(base | code), 1));
        }
    }
    for &(mnemonic, opcode) in ARITH_IMM_I8080 {
        ins(&mut t, mnemonic, Imm(B), Np, plain(Opcode::one(opcode), 2));
    }

    for &(pair, p) in PAIRS_I8080 {
        ins(&mut t, "lxi", Rp(pair), Imm(W), plain(Opcode::one(0x01 | p << 4), 3));
        ins(&mut t, "inx", Rp(pair), Np, plain(Opcode::one(0x03 | p << 4), 1));
        ins(&mut t, "dad", Rp(pair), Np, plain(Opcode::one(0x09 | p << 4), 1));
        ins(&mut t, "dcx", Rp(pair), Np, plain(Opcode::one(0x0b | p << 4), 1));
    }

    for &(pair, q) in &[(Reg::B, 0u8), (Reg::D, 1), (Reg::H, 2), (Reg::Psw, 3)] {
        ins(&mut t, "push", Rp(pair), Np, plain(Opcode::one(0xc5 | q << 4), 1));
        ins(&mut t, "pop", Rp(pair), Np, plain(Opcode::one(0xc1 | q << 4), 1));
    }

    for entry in I8080_LITERALS {
        ins(&mut t, entry.mnemonic, entry.p1, entry.p2, entry.instruction);
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::intel8080::operand::Cond;
    use crate::families::intel8080::CPU_Z80;
    use OperandPattern::Cond as Cc;

    fn z80() -> CpuProfile {
        CpuProfile::select(CPU_Z80)
    }

    fn i8080() -> CpuProfile {
        CpuProfile::select(CPU_8080)
    }

    #[test]
    fn register_move_matrix() {
        let p = z80();
        let ld = p.lookup("ld", (Rp(Reg::A), Rp(Reg::B))).unwrap();
        assert_eq!(ld.opcode.bytes(), &[0x78]);
        let ld = p.lookup("ld", (Rp(Reg::B), IndReg(Reg::Hl))).unwrap();
        assert_eq!(ld.opcode.bytes(), &[0x46]);
        // (hl),(hl) is halt, not a load.
        assert!(p.lookup("ld", (IndReg(Reg::Hl), IndReg(Reg::Hl))).is_none());
    }

    #[test]
    fn indexed_forms_carry_prefixes() {
        let p = z80();
        let ld = p.lookup("ld", (Indexed(Reg::Ix), Rp(Reg::A))).unwrap();
        assert_eq!(ld.opcode.bytes(), &[0xdd, 0x77]);
        assert_eq!(ld.size, 3);
        let rlc = p.lookup("rlc", (Indexed(Reg::Iy), Np)).unwrap();
        assert_eq!(rlc.opcode.bytes(), &[0xfd, 0xcb, 0x06]);
        assert_eq!(rlc.size, 4);
    }

    #[test]
    fn half_index_registers() {
        let p = z80();
        let ld = p.lookup("ld", (Rp(Reg::IxH), Rp(Reg::E))).unwrap();
        assert_eq!(ld.opcode.bytes(), &[0xdd, 0x63]);
        let add = p.lookup("add", (Rp(Reg::A), Rp(Reg::IyL))).unwrap();
        assert_eq!(add.opcode.bytes(), &[0xfd, 0x85]);
        // Halves never mix with h/l or across index registers.
        assert!(p.lookup("ld", (Rp(Reg::IxH), Rp(Reg::H))).is_none());
        assert!(p.lookup("ld", (Rp(Reg::IxH), Rp(Reg::IyL))).is_none());
    }

    #[test]
    fn conditional_transfers() {
        let p = z80();
        let jp = p.lookup("jp", (Cc(Cond::Nz), Imm(W))).unwrap();
        assert_eq!(jp.opcode.bytes(), &[0xc2]);
        // Carry keys on the register pattern.
        let jp = p.lookup("jp", (Rp(Reg::C), Imm(W))).unwrap();
        assert_eq!(jp.opcode.bytes(), &[0xda]);
        let ret = p.lookup("ret", (Rp(Reg::M), Np)).unwrap();
        assert_eq!(ret.opcode.bytes(), &[0xf8]);
        let jr = p.lookup("jr", (Rp(Reg::C), Imm(W))).unwrap();
        assert!(jr.is_relative_branch());
        assert_eq!(jr.opcode.bytes(), &[0x38]);
    }

    #[test]
    fn i8080_uses_intel_mnemonics() {
        let p = i8080();
        let mov = p.lookup("mov", (Rp(Reg::A), Rp(Reg::B))).unwrap();
        assert_eq!(mov.opcode.bytes(), &[0x78]);
        let lxi = p.lookup("lxi", (Rp(Reg::B), Imm(W))).unwrap();
        assert_eq!(lxi.opcode.bytes(), &[0x01]);
        assert_eq!(lxi.size, 3);
        // jp means jump-on-positive here.
        let jp = p.lookup("jp", (Imm(W), Np)).unwrap();
        assert_eq!(jp.opcode.bytes(), &[0xf2]);
        assert!(!p.has_mnemonic("ld"));
        assert!(p.family_has_mnemonic("ld"));
    }

    #[test]
    fn opcode_index_round_trips() {
        let p = z80();
        let (mnemonic, ins) = p.instruction_at(&[0x78]).unwrap();
        assert_eq!(mnemonic, "ld");
        assert_eq!(ins.size, 1);
        assert!(p.instruction_at(&[0xdd, 0x77]).is_some());
    }
}
