// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Line encoder for the MOS 6502 family.
//!
//! Lookup runs the bounded width ladder over the classified mode; branch
//! displacements are recomputed on every pass against the program counter
//! after the instruction; emission is opcode bytes followed by the operand
//! little-endian.

use crate::core::cpu::CpuType;
use crate::core::error::EncodeError;
use crate::core::family::{EncodeContext, Encoded, LineEncoder, SourceLine};
use crate::core::instruction::{BranchKind, Instruction};
use crate::core::operand::{le_bytes, width_mask, EvaluatedOperand};
use crate::core::text_utils::comma_separate;

use super::classifier::classify;
use super::operand::{AddressMode, Classified, Width};
use super::profile::CpuProfile;
use super::table::family_has_mnemonic;
use super::{in_set, CPU_65816, CPU_65CE02, BRANCHES, LONG_SHORT, RETURN_ADDRESS};

/// Encoder for one selected 65xx CPU.
pub struct M65xxEncoder {
    profile: CpuProfile,
    m16: bool,
    x16: bool,
}

impl M65xxEncoder {
    pub fn new(cpu: CpuType) -> Self {
        Self {
            profile: CpuProfile::select(cpu),
            m16: false,
            x16: false,
        }
    }

    fn cpu_type(&self) -> CpuType {
        self.profile.cpu()
    }

    /// Apply a `.m16`/`.m8`/`.x16`/`.x8`/`.mx16`/`.mx8` directive.
    fn set_reg_long_short(&mut self, directive: &str) {
        if directive.starts_with(".x") {
            let x16 = directive == ".x16";
            if x16 != self.x16 {
                self.x16 = x16;
                self.profile.set_index_width(x16);
            }
            return;
        }
        let m16 = directive.ends_with("16");
        if m16 != self.m16 {
            self.m16 = m16;
            self.profile.set_accumulator_width(m16);
        }
        if directive.starts_with(".mx") && m16 != self.x16 {
            self.x16 = m16;
            self.profile.set_index_width(m16);
        }
    }

    /// `.rta` pseudo-op: 16-bit return addresses, stored minus one.
    fn assemble_rta(
        &self,
        line: &SourceLine<'_>,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<Option<Encoded>, EncodeError> {
        let mut bytes = Vec::new();
        let mut shown = Vec::new();
        for entry in comma_separate(line.operand) {
            if entry == "?" {
                ctx.output.add_uninitialized(2);
                shown.push("?".to_string());
                continue;
            }
            let val = ctx
                .eval
                .eval_range(entry, 0, 0x1_0000)
                .map_err(|err| EncodeError::expression(err.message))?;
            bytes.extend(ctx.output.add(val.value.wrapping_sub(1) & 0xffff, 2));
            shown.push(format!("${:04x}", val.value & 0xffff));
        }
        Ok(Some(Encoded {
            bytes,
            disasm: format!(".rta {}", shown.join(",")),
        }))
    }

    /// Probe the profile along the mode's width ladder.
    fn lookup_with_widening(
        &self,
        mnemonic: &str,
        mode: AddressMode,
    ) -> Result<(AddressMode, Instruction), EncodeError> {
        let mut probe = mode;
        loop {
            if let Some(ins) = self.profile.lookup(mnemonic, probe) {
                return Ok((probe, ins));
            }
            match probe.widen() {
                Some(wider) => probe = wider,
                None => return Err(EncodeError::addressing_mode(mnemonic)),
            }
        }
    }

    fn encode_branch(
        &self,
        mnemonic: &str,
        mode: AddressMode,
        ins: Instruction,
        classified: &Classified,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<Encoded, EncodeError> {
        let pc = ctx.output.logical_pc();

        if let AddressMode::BitRelative(bit) = mode {
            let zp = classified.op1.expect("bit-branch zero-page operand");
            let target = classified.op2.expect("bit-branch target operand");
            if target.value > 0xffff {
                return Err(EncodeError::overflow(target.value));
            }
            if zp.width > 1 {
                return Err(EncodeError::overflow(zp.value));
            }
            let displ = self.branch_displacement(&target, pc + 3, -128, 127)?;
            let mut bytes = ins.opcode.bytes().to_vec();
            bytes.push(zp.masked(1) as u8);
            bytes.push(displ as u8);
            ctx.output.add_bytes(&bytes);
            let disasm = format!(
                "{mnemonic} {bit},${:02x},${:02x}",
                zp.masked(1),
                target.value & 0xffff
            );
            return Ok(Encoded { bytes, disasm });
        }

        let target = classified.op1.expect("branch target operand");
        if target.value > 0xffff {
            return Err(EncodeError::overflow(target.value));
        }

        let (ins, displ, displ_bytes) = if ins.branch == BranchKind::Word {
            let narrowable =
                self.cpu_type() == CPU_65CE02 && in_set(BRANCHES, mnemonic) && target.resolved;
            let byte_displ = ctx.output.relative_offset(target.value, pc + 2);
            if narrowable && (-128..=127).contains(&byte_displ) {
                // The byte-relative form sits three opcodes below the
                // word-relative one and is one byte shorter.
                let narrowed = Instruction::branching(
                    ins.opcode.with_primary(ins.opcode.primary().wrapping_sub(3)),
                    ins.size - 1,
                    BranchKind::Byte,
                );
                (narrowed, byte_displ, 1u8)
            } else {
                let displ = self.branch_displacement(&target, pc + 3, -32768, 32767)?;
                (ins, displ, 2u8)
            }
        } else {
            let displ = self.branch_displacement(&target, pc + 2, -128, 127)?;
            (ins, displ, 1u8)
        };

        let mut bytes = ins.opcode.bytes().to_vec();
        bytes.extend(le_bytes(displ & width_mask(displ_bytes), displ_bytes));
        ctx.output.add_bytes(&bytes);
        let disasm = format!("{mnemonic} ${:04x}", target.value & 0xffff);
        Ok(Encoded { bytes, disasm })
    }

    fn branch_displacement(
        &self,
        target: &EvaluatedOperand,
        pc_after: i64,
        min: i64,
        max: i64,
    ) -> Result<i64, EncodeError> {
        if !target.resolved {
            // Placeholder until a later pass resolves the symbol.
            return Ok(0);
        }
        let displ = target.value - pc_after;
        if !(min..=max).contains(&displ) {
            return Err(EncodeError::overflow(displ));
        }
        Ok(displ)
    }

    fn encode_plain(
        &self,
        mnemonic: &str,
        mode: AddressMode,
        ins: Instruction,
        classified: &Classified,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<Encoded, EncodeError> {
        let mut bytes = ins.opcode.bytes().to_vec();
        let mut display1 = 0i64;
        let mut display2 = 0i64;

        match mode {
            AddressMode::BlockMove => {
                let src = classified.op1.expect("block-move source bank");
                let dst = classified.op2.expect("block-move destination bank");
                for op in [&src, &dst] {
                    if op.resolved && op.width > 1 {
                        return Err(EncodeError::overflow(op.value));
                    }
                }
                // Operand order flips on the wire: destination bank first.
                bytes.push(dst.masked(1) as u8);
                bytes.push(src.masked(1) as u8);
                display1 = src.masked(1);
                display2 = dst.masked(1);
            }
            AddressMode::Implied => {}
            _ => {
                let op1 = classified.op1.expect("operand value");
                let slot = ins.operand_bytes();
                if op1.resolved && op1.width > slot {
                    return Err(EncodeError::overflow(op1.value));
                }
                bytes.extend(le_bytes(op1.masked(slot), slot));
                display1 = op1.masked(slot);
            }
        }

        ctx.output.add_bytes(&bytes);
        Ok(Encoded {
            bytes,
            disasm: render_disasm(mnemonic, mode, display1, display2),
        })
    }
}

/// Render disassembly text from the structured mode and display values.
fn render_disasm(mnemonic: &str, mode: AddressMode, v1: i64, v2: i64) -> String {
    let w = |width: Width| 2 * width.bytes() as usize;
    match mode {
        AddressMode::Implied => mnemonic.to_string(),
        AddressMode::Immediate(width) => {
            format!("{mnemonic} #${:0>1$x}", v1, w(width))
        }
        AddressMode::Direct(width) => format!("{mnemonic} ${:0>1$x}", v1, w(width)),
        AddressMode::DirectX(width) => format!("{mnemonic} ${:0>1$x},x", v1, w(width)),
        AddressMode::DirectY(width) => format!("{mnemonic} ${:0>1$x},y", v1, w(width)),
        AddressMode::StackRelative => format!("{mnemonic} ${v1:02x},s"),
        AddressMode::Indirect(width) => format!("{mnemonic} (${:0>1$x})", v1, w(width)),
        AddressMode::IndirectX(width) => format!("{mnemonic} (${:0>1$x},x)", v1, w(width)),
        AddressMode::IndirectY => format!("{mnemonic} (${v1:02x}),y"),
        AddressMode::IndirectZ => format!("{mnemonic} (${v1:02x}),z"),
        AddressMode::StackRelativeY => format!("{mnemonic} (${v1:02x},s),y"),
        AddressMode::LongIndirect(width) => format!("{mnemonic} [${:0>1$x}]", v1, w(width)),
        AddressMode::LongIndirectY => format!("{mnemonic} [${v1:02x}],y"),
        AddressMode::BlockMove => format!("{mnemonic} ${v1:02x},${v2:02x}"),
        AddressMode::Relative(_) => format!("{mnemonic} ${v1:04x}"),
        AddressMode::BitDirect(bit) => format!("{mnemonic} {bit},${v1:02x}"),
        AddressMode::BitRelative(bit) => format!("{mnemonic} {bit},${v1:02x},${v2:02x}"),
    }
}

impl LineEncoder for M65xxEncoder {
    fn cpu(&self) -> CpuType {
        self.profile.cpu()
    }

    fn handles(&self, mnemonic: &str) -> bool {
        let mnemonic = mnemonic.to_ascii_lowercase();
        family_has_mnemonic(&mnemonic)
            || mnemonic == RETURN_ADDRESS
            || in_set(LONG_SHORT, &mnemonic)
    }

    fn assemble_line(
        &mut self,
        line: &SourceLine<'_>,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<Option<Encoded>, EncodeError> {
        if ctx.output.pc_overflow() {
            return Err(EncodeError::pc_overflow(ctx.output.logical_pc()));
        }

        let mnemonic = line.mnemonic.to_ascii_lowercase();

        if mnemonic == RETURN_ADDRESS {
            return self.assemble_rta(line, ctx);
        }

        if in_set(LONG_SHORT, &mnemonic) {
            if !line.operand.trim().is_empty() {
                return Err(EncodeError::syntax(format!(
                    "Too many arguments for directive '{mnemonic}'"
                )));
            }
            if self.cpu_type() != CPU_65816 {
                ctx.warn(format!(
                    "The current CPU supports only 8-bit immediate mode instructions. \
                     The directive '{mnemonic}' will not affect assembly"
                ));
            } else {
                self.set_reg_long_short(&mnemonic);
            }
            return Ok(None);
        }

        let classified = classify(self.cpu_type(), &mnemonic, line.operand, ctx.eval)?;
        let (mode, ins) = self.lookup_with_widening(&mnemonic, classified.mode)?;

        let encoded = if ins.is_relative_branch() {
            self.encode_branch(&mnemonic, mode, ins, &classified, ctx)?
        } else {
            self.encode_plain(&mnemonic, mode, ins, &classified, ctx)?
        };
        Ok(Some(encoded))
    }

    fn instruction_size(&self, line: &SourceLine<'_>, ctx: &mut EncodeContext<'_>) -> i64 {
        let mnemonic = line.mnemonic.to_ascii_lowercase();
        let operand = line.operand.trim();

        if in_set(LONG_SHORT, &mnemonic) {
            return 0;
        }
        if mnemonic == RETURN_ADDRESS {
            return 2 * comma_separate(operand).len() as i64;
        }
        if operand.is_empty() {
            return 1;
        }
        if in_set(BRANCHES, &mnemonic) {
            if self.cpu_type() != CPU_65CE02 {
                return 2;
            }
            // Estimate the byte/word narrowing choice so later labels do
            // not drift between passes.
            if let Ok(classified) = classify(self.cpu_type(), &mnemonic, operand, ctx.eval) {
                if let Some(target) = classified.op1 {
                    if target.resolved {
                        let displ = target.value - (ctx.output.logical_pc() + 2);
                        return if (-128..=127).contains(&displ) { 2 } else { 3 };
                    }
                }
            }
            return 3;
        }
        match classify(self.cpu_type(), &mnemonic, operand, ctx.eval)
            .and_then(|classified| self.lookup_with_widening(&mnemonic, classified.mode))
        {
            Ok((_, ins)) => ins.size as i64,
            Err(_) => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::eval::SimpleEvaluator;
    use crate::core::output::{Output, Section};
    use crate::families::mos6502::{
        CPU_6502, CPU_6502I, CPU_65816, CPU_65C02, CPU_65CE02, CPU_R65C02,
    };

    fn encode(cpu: CpuType, pc: i64, mnemonic: &str, operand: &str) -> Result<Encoded, EncodeError> {
        let mut encoder = M65xxEncoder::new(cpu);
        encode_with(&mut encoder, pc, mnemonic, operand)
    }

    fn encode_with(
        encoder: &mut M65xxEncoder,
        pc: i64,
        mnemonic: &str,
        operand: &str,
    ) -> Result<Encoded, EncodeError> {
        let eval = SimpleEvaluator::new();
        let mut output = Section::new();
        output.set_pc(pc);
        let line = SourceLine {
            mnemonic,
            operand,
            line: 1,
        };
        let mut ctx = EncodeContext::new(&eval, &mut output, 2);
        encoder
            .assemble_line(&line, &mut ctx)
            .map(|e| e.expect("line should emit bytes"))
    }

    #[test]
    fn immediate_and_absolute() {
        let e = encode(CPU_6502, 0xC000, "lda", "#$05").unwrap();
        assert_eq!(e.bytes, vec![0xA9, 0x05]);
        assert_eq!(e.disasm, "lda #$05");

        let e = encode(CPU_6502, 0xC000, "lda", "$1234").unwrap();
        assert_eq!(e.bytes, vec![0xAD, 0x34, 0x12]);
        assert_eq!(e.disasm, "lda $1234");
    }

    #[test]
    fn zero_page_preferred() {
        let e = encode(CPU_6502, 0xC000, "lda", "$12").unwrap();
        assert_eq!(e.bytes, vec![0xA5, 0x12]);
    }

    #[test]
    fn branch_forward() {
        // Target 10 bytes past the end of the 2-byte instruction.
        let e = encode(CPU_6502, 0xC000, "bne", "$c00c").unwrap();
        assert_eq!(e.bytes, vec![0xD0, 0x0A]);
        assert_eq!(e.disasm, "bne $c00c");
    }

    #[test]
    fn branch_backward() {
        let e = encode(CPU_6502, 0xC000, "bne", "$bffe").unwrap();
        assert_eq!(e.bytes, vec![0xD0, 0xFC]);
    }

    #[test]
    fn branch_out_of_range() {
        let err = encode(CPU_6502, 0xC000, "bne", "$d000").unwrap_err();
        assert_eq!(err.kind, crate::core::error::EncodeErrorKind::Overflow);
    }

    #[test]
    fn ce02_branch_narrows_when_in_range() {
        let e = encode(CPU_65CE02, 0xC000, "bne", "$c00c").unwrap();
        assert_eq!(e.bytes, vec![0xD0, 0x0A]);
    }

    #[test]
    fn ce02_branch_widens_past_byte_range() {
        // Displacement +200 needs the word-relative form.
        let e = encode(CPU_65CE02, 0xC000, "bne", "$c0cb").unwrap();
        assert_eq!(e.bytes.len(), 3);
        assert_eq!(e.bytes[0], 0xD3);
        // Measured from the end of the 3-byte instruction.
        assert_eq!(e.bytes[1], 0xC8);
        assert_eq!(e.bytes[2], 0x00);
    }

    #[test]
    fn long_branches_always_word() {
        let e = encode(CPU_65816, 0xC000, "brl", "$c003").unwrap();
        assert_eq!(e.bytes, vec![0x82, 0x00, 0x00]);
        let e = encode(CPU_65816, 0xC000, "per", "$c103").unwrap();
        assert_eq!(e.bytes, vec![0x62, 0x00, 0x01]);
    }

    #[test]
    fn rockwell_bit_ops() {
        let e = encode(CPU_R65C02, 0xC000, "rmb", "3,$12").unwrap();
        assert_eq!(e.bytes, vec![0x37, 0x12]);
        assert_eq!(e.disasm, "rmb 3,$12");

        let e = encode(CPU_R65C02, 0xC000, "bbr", "3,$12,$c013").unwrap();
        assert_eq!(e.bytes, vec![0x3F, 0x12, 0x10]);
    }

    #[test]
    fn block_move_operand_order() {
        let e = encode(CPU_65816, 0xC000, "mvn", "$01,$02").unwrap();
        assert_eq!(e.bytes, vec![0x54, 0x02, 0x01]);
        assert_eq!(e.disasm, "mvn $01,$02");
    }

    #[test]
    fn long_addressing() {
        let e = encode(CPU_65816, 0xC000, "lda", "$123456").unwrap();
        assert_eq!(e.bytes, vec![0xAF, 0x56, 0x34, 0x12]);
        let e = encode(CPU_65816, 0xC000, "lda", "[$10]").unwrap();
        assert_eq!(e.bytes, vec![0xA7, 0x10]);
        let e = encode(CPU_65816, 0xC000, "lda", "$12,s").unwrap();
        assert_eq!(e.bytes, vec![0xA3, 0x12]);
        let e = encode(CPU_65816, 0xC000, "lda", "($12,s),y").unwrap();
        assert_eq!(e.bytes, vec![0xB3, 0x12]);
    }

    #[test]
    fn width_cast_forces_absolute() {
        let e = encode(CPU_65816, 0xC000, "lda", "[16] $10").unwrap();
        assert_eq!(e.bytes, vec![0xAD, 0x10, 0x00]);
        let e = encode(CPU_65816, 0xC000, "lda", "[24] $10").unwrap();
        assert_eq!(e.bytes, vec![0xAF, 0x10, 0x00, 0x00]);
    }

    #[test]
    fn m16_switches_immediate_width() {
        let mut encoder = M65xxEncoder::new(CPU_65816);
        let e = encode_with(&mut encoder, 0xC000, "lda", "#$12").unwrap();
        assert_eq!(e.bytes, vec![0xA9, 0x12]);

        let eval = SimpleEvaluator::new();
        let mut output = Section::new();
        let line = SourceLine {
            mnemonic: ".m16",
            operand: "",
            line: 1,
        };
        let mut ctx = EncodeContext::new(&eval, &mut output, 2);
        assert!(encoder.assemble_line(&line, &mut ctx).unwrap().is_none());
        assert!(ctx.warnings.is_empty());

        let e = encode_with(&mut encoder, 0xC000, "lda", "#$1234").unwrap();
        assert_eq!(e.bytes, vec![0xA9, 0x34, 0x12]);
        // Index immediates stay 8-bit until .x16.
        let e = encode_with(&mut encoder, 0xC000, "ldx", "#$12").unwrap();
        assert_eq!(e.bytes, vec![0xA2, 0x12]);

        let line = SourceLine {
            mnemonic: ".m8",
            operand: "",
            line: 1,
        };
        let mut output = Section::new();
        let mut ctx = EncodeContext::new(&eval, &mut output, 2);
        encoder.assemble_line(&line, &mut ctx).unwrap();
        let e = encode_with(&mut encoder, 0xC000, "lda", "#$12").unwrap();
        assert_eq!(e.bytes, vec![0xA9, 0x12]);
    }

    #[test]
    fn width_directive_warns_off_65816() {
        let mut encoder = M65xxEncoder::new(CPU_6502);
        let eval = SimpleEvaluator::new();
        let mut output = Section::new();
        let line = SourceLine {
            mnemonic: ".m16",
            operand: "",
            line: 1,
        };
        let mut ctx = EncodeContext::new(&eval, &mut output, 2);
        assert!(encoder.assemble_line(&line, &mut ctx).unwrap().is_none());
        assert_eq!(ctx.warnings.len(), 1);
    }

    #[test]
    fn illegal_opcodes_only_on_6502i() {
        let e = encode(CPU_6502I, 0xC000, "slo", "$12").unwrap();
        assert_eq!(e.bytes, vec![0x07, 0x12]);
        let err = encode(CPU_6502, 0xC000, "slo", "$12").unwrap_err();
        assert_eq!(
            err.kind,
            crate::core::error::EncodeErrorKind::AddressingMode
        );
    }

    #[test]
    fn mnemonics_absent_from_cpu_fail() {
        let err = encode(CPU_6502, 0xC000, "stz", "$12").unwrap_err();
        assert_eq!(
            err.kind,
            crate::core::error::EncodeErrorKind::AddressingMode
        );
        let e = encode(CPU_65C02, 0xC000, "stz", "$12").unwrap();
        assert_eq!(e.bytes, vec![0x64, 0x12]);
    }

    #[test]
    fn jmp_indirect_forms() {
        let e = encode(CPU_6502, 0xC000, "jmp", "($1234)").unwrap();
        assert_eq!(e.bytes, vec![0x6C, 0x34, 0x12]);
        let e = encode(CPU_65C02, 0xC000, "jmp", "($1234,x)").unwrap();
        assert_eq!(e.bytes, vec![0x7C, 0x34, 0x12]);
        let e = encode(CPU_65816, 0xC000, "jmp", "[$1234]").unwrap();
        assert_eq!(e.bytes, vec![0xDC, 0x34, 0x12]);
    }

    #[test]
    fn rta_pseudo_op() {
        let mut encoder = M65xxEncoder::new(CPU_6502);
        let eval = SimpleEvaluator::new();
        let mut output = Section::new();
        output.set_pc(0xC000);
        let line = SourceLine {
            mnemonic: ".rta",
            operand: "$c012,$c034",
            line: 1,
        };
        let mut ctx = EncodeContext::new(&eval, &mut output, 2);
        let e = encoder.assemble_line(&line, &mut ctx).unwrap().unwrap();
        assert_eq!(e.bytes, vec![0x11, 0xC0, 0x33, 0xC0]);
    }

    #[test]
    fn stack_relative_rejects_wide_values() {
        let err = encode(CPU_65816, 0xC000, "sta", "$1234,s").unwrap_err();
        assert_eq!(err.kind, crate::core::error::EncodeErrorKind::Overflow);
    }

    #[test]
    fn size_estimates() {
        let encoder = M65xxEncoder::new(CPU_6502);
        let eval = SimpleEvaluator::new();
        let mut output = Section::new();
        let mut ctx = EncodeContext::new(&eval, &mut output, 1);
        let size = |ctx: &mut EncodeContext<'_>, mnemonic, operand| {
            encoder.instruction_size(
                &SourceLine {
                    mnemonic,
                    operand,
                    line: 1,
                },
                ctx,
            )
        };
        assert_eq!(size(&mut ctx, "nop", ""), 1);
        assert_eq!(size(&mut ctx, "lda", "#$05"), 2);
        assert_eq!(size(&mut ctx, "bne", "anywhere"), 2);
        assert_eq!(size(&mut ctx, "jmp", "$1234"), 3);
        assert_eq!(size(&mut ctx, "lda", "($10),y"), 2);
        assert_eq!(size(&mut ctx, "lda", "$1234"), 3);
    }
}
