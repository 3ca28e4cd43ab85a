// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! CPU profile derivation for the MOS 6502 family.
//!
//! A profile is the merged (mnemonic, mode) → instruction table for one CPU
//! variant, built once at selection time and replaced wholesale on a CPU
//! switch. The 65816 immediate-width swap mutates only the handful of
//! immediate entries it names and is idempotent.

use std::collections::HashMap;

use crate::core::cpu::CpuType;
use crate::core::instruction::{BranchKind, Instruction, Opcode};

use super::operand::{AddressMode, Width};
use super::table::{
    Entry, OPCODES_6502, OPCODES_6502I, OPCODES_65816, OPCODES_65C02, OPCODES_65CE02,
    OPCODES_R65C02,
};
use super::{CPU_65816, CPU_65C02, CPU_65CE02, CPU_6502I, CPU_R65C02};

/// Immediate-mode mnemonics affected by the accumulator width flag.
const IMMEDIATE_A: &[(&str, u8)] = &[
    ("ora", 0x09),
    ("and", 0x29),
    ("eor", 0x49),
    ("adc", 0x69),
    ("bit", 0x89),
    ("lda", 0xa9),
    ("cmp", 0xc9),
    ("sbc", 0xe9),
];

/// Immediate-mode mnemonics affected by the index width flag.
const IMMEDIATE_XY: &[(&str, u8)] = &[
    ("ldy", 0xa0),
    ("ldx", 0xa2),
    ("cpy", 0xc0),
    ("cpx", 0xe0),
];

/// The derived encoding table for one CPU variant.
pub struct CpuProfile {
    cpu: CpuType,
    table: HashMap<String, HashMap<AddressMode, Instruction>>,
}

impl CpuProfile {
    /// Build the profile for a CPU by merging the variant tables.
    pub fn select(cpu: CpuType) -> Self {
        let mut profile = Self {
            cpu,
            table: HashMap::new(),
        };

        match cpu {
            c if c == CPU_65816 => {
                profile.merge(OPCODES_6502, None);
                profile.merge(OPCODES_65C02, None);
                profile.merge(OPCODES_65816, None);
            }
            c if c == CPU_65CE02 => {
                // The legacy byte-relative branches and the 65C02 entries
                // whose opcodes are reused by this CPU are filtered out of
                // the inherited tables.
                profile.merge(OPCODES_6502, Some(&|e| (e.opcode & 0x1f) != 0x10));
                profile.merge(
                    OPCODES_65C02,
                    Some(&|e| e.opcode != 0x80 && (e.opcode & 0x0f) != 0x02),
                );
                profile.merge(OPCODES_R65C02, None);
                profile.merge(OPCODES_65CE02, None);
            }
            c if c == CPU_R65C02 => {
                profile.merge(OPCODES_6502, None);
                profile.merge(OPCODES_65C02, None);
                profile.merge(OPCODES_R65C02, None);
            }
            c if c == CPU_65C02 => {
                profile.merge(OPCODES_6502, None);
                profile.merge(OPCODES_65C02, None);
            }
            c if c == CPU_6502I => {
                profile.merge(OPCODES_6502, None);
                // Undocumented opcodes never displace a documented entry.
                profile.merge_vacant(OPCODES_6502I);
            }
            _ => {
                profile.merge(OPCODES_6502, None);
            }
        }

        profile
    }

    pub fn cpu(&self) -> CpuType {
        self.cpu
    }

    fn merge(&mut self, entries: &[Entry], filter: Option<&dyn Fn(&Entry) -> bool>) {
        for entry in entries {
            if let Some(keep) = filter {
                if !keep(entry) {
                    continue;
                }
            }
            self.insert(entry.mnemonic, entry.mode, entry.opcode);
        }
    }

    fn merge_vacant(&mut self, entries: &[Entry]) {
        for entry in entries {
            let modes = self.table.entry(entry.mnemonic.to_string()).or_default();
            modes
                .entry(entry.mode)
                .or_insert_with(|| instruction_for(entry.mode, entry.opcode));
        }
    }

    fn insert(&mut self, mnemonic: &str, mode: AddressMode, opcode: u8) {
        self.table
            .entry(mnemonic.to_string())
            .or_default()
            .insert(mode, instruction_for(mode, opcode));
    }

    /// Look up the instruction for a (mnemonic, mode) key.
    pub fn lookup(&self, mnemonic: &str, mode: AddressMode) -> Option<Instruction> {
        self.table.get(mnemonic)?.get(&mode).copied()
    }

    /// Whether the active table has any entry for the mnemonic.
    pub fn has_mnemonic(&self, mnemonic: &str) -> bool {
        self.table.contains_key(mnemonic)
    }

    /// Swap the accumulator-immediate entries between 2- and 3-byte forms.
    /// Meaningful only on the 65816; idempotent.
    pub fn set_accumulator_width(&mut self, sixteen_bit: bool) {
        if self.cpu != CPU_65816 {
            return;
        }
        self.swap_immediates(IMMEDIATE_A, sixteen_bit);
    }

    /// Swap the index-register-immediate entries between 2- and 3-byte
    /// forms. Meaningful only on the 65816; idempotent.
    pub fn set_index_width(&mut self, sixteen_bit: bool) {
        if self.cpu != CPU_65816 {
            return;
        }
        self.swap_immediates(IMMEDIATE_XY, sixteen_bit);
    }

    fn swap_immediates(&mut self, set: &[(&str, u8)], sixteen_bit: bool) {
        let width = if sixteen_bit { Width::Word } else { Width::Byte };
        for (mnemonic, opcode) in set {
            let modes = self.table.entry(mnemonic.to_string()).or_default();
            modes.remove(&AddressMode::Immediate(Width::Byte));
            modes.remove(&AddressMode::Immediate(Width::Word));
            modes.insert(
                AddressMode::Immediate(width),
                instruction_for(AddressMode::Immediate(width), *opcode),
            );
        }
    }
}

fn instruction_for(mode: AddressMode, opcode: u8) -> Instruction {
    let branch = match mode {
        AddressMode::Relative(Width::Byte) | AddressMode::BitRelative(_) => BranchKind::Byte,
        AddressMode::Relative(_) => BranchKind::Word,
        _ => BranchKind::None,
    };
    Instruction::branching(Opcode::one(opcode), 1 + mode.operand_bytes(), branch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::mos6502::{CPU_6502, CPU_65816, CPU_65C02, CPU_65CE02};

    #[test]
    fn base_profile_has_no_c02_extensions() {
        let profile = CpuProfile::select(CPU_6502);
        assert!(profile
            .lookup("lda", AddressMode::Immediate(Width::Byte))
            .is_some());
        assert!(profile
            .lookup("stz", AddressMode::Direct(Width::Byte))
            .is_none());
        assert!(!profile.has_mnemonic("bra"));
        assert!(!profile.has_mnemonic("slo"));
    }

    #[test]
    fn illegal_profile_keeps_documented_entries() {
        let profile = CpuProfile::select(CPU_6502I);
        assert!(profile.has_mnemonic("slo"));
        let nop = profile.lookup("nop", AddressMode::Implied).unwrap();
        assert_eq!(nop.opcode.primary(), 0xea);
    }

    #[test]
    fn c02_profile_extends_base() {
        let profile = CpuProfile::select(CPU_65C02);
        assert!(profile.has_mnemonic("bra"));
        let stz = profile.lookup("stz", AddressMode::Direct(Width::Byte)).unwrap();
        assert_eq!(stz.opcode.primary(), 0x64);
        assert!(!profile.has_mnemonic("mvn"));
    }

    #[test]
    fn ce02_profile_drops_byte_branches() {
        let profile = CpuProfile::select(CPU_65CE02);
        assert!(profile
            .lookup("bne", AddressMode::Relative(Width::Byte))
            .is_none());
        let bne = profile
            .lookup("bne", AddressMode::Relative(Width::Word))
            .unwrap();
        assert_eq!(bne.opcode.primary(), 0xd3);
        assert_eq!(bne.size, 3);
        // Rockwell ops come along on this CPU.
        assert!(profile.has_mnemonic("rmb"));
    }

    #[test]
    fn w65816_profile_has_long_modes() {
        let profile = CpuProfile::select(CPU_65816);
        let lda = profile
            .lookup("lda", AddressMode::Direct(Width::Long))
            .unwrap();
        assert_eq!(lda.opcode.primary(), 0xaf);
        assert_eq!(lda.size, 4);
        assert!(profile.has_mnemonic("mvn"));
        assert!(profile.has_mnemonic("brl"));
    }

    #[test]
    fn immediate_width_swap_is_idempotent() {
        let mut profile = CpuProfile::select(CPU_65816);
        profile.set_accumulator_width(true);
        profile.set_accumulator_width(true);
        let lda = profile
            .lookup("lda", AddressMode::Immediate(Width::Word))
            .unwrap();
        assert_eq!(lda.size, 3);
        assert_eq!(lda.opcode.primary(), 0xa9);
        assert!(profile
            .lookup("lda", AddressMode::Immediate(Width::Byte))
            .is_none());
        // Index registers are independent of the accumulator flag.
        assert!(profile
            .lookup("ldx", AddressMode::Immediate(Width::Byte))
            .is_some());

        profile.set_accumulator_width(false);
        assert!(profile
            .lookup("lda", AddressMode::Immediate(Width::Byte))
            .is_some());
    }

    #[test]
    fn width_swap_is_inert_off_the_65816() {
        let mut profile = CpuProfile::select(CPU_6502);
        profile.set_accumulator_width(true);
        assert!(profile
            .lookup("lda", AddressMode::Immediate(Width::Byte))
            .is_some());
    }
}
