// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Line encoder for the Intel 8080 / Z80 family.
//!
//! Lookup probes the pattern pair and widens the immediate position on a
//! miss (one rung: byte to word). `rst`, `im` and the CB-class bit
//! instructions compute their opcodes instead of going through the table.
//! Emission is opcode bytes, then the indexed displacement, then the
//! immediate in little-endian order; the `DD CB d op` forms sandwich the
//! displacement between prefix and primary opcode.

use crate::core::cpu::CpuType;
use crate::core::error::EncodeError;
use crate::core::family::{EncodeContext, Encoded, LineEncoder, SourceLine};
use crate::core::instruction::Instruction;
use crate::core::operand::{le_bytes, EvaluatedOperand};

use super::classifier::classify;
use super::operand::{Classified, OperandPattern, Reg};
use super::profile::CpuProfile;
use super::{in_set, CPU_Z80, BIT_OPS, RELATIVE_BRANCHES};

type PatternPair = (OperandPattern, OperandPattern);

/// Encoder for one selected CPU of the family.
pub struct IntelEncoder {
    profile: CpuProfile,
}

impl IntelEncoder {
    pub fn new(cpu: CpuType) -> Self {
        Self {
            profile: CpuProfile::select(cpu),
        }
    }

    fn cpu_type(&self) -> CpuType {
        self.profile.cpu()
    }

    /// Probe the profile, widening the immediate operand position on a
    /// miss. Unresolved immediates take the widest matching form so a
    /// forward reference is never narrowed prematurely.
    fn lookup_with_widening(
        &self,
        mnemonic: &str,
        classified: &Classified,
    ) -> Result<(PatternPair, Instruction), EncodeError> {
        let prefer_widest = classified.imm.map(|imm| !imm.resolved).unwrap_or(false);
        let mut pair = classified.pair();
        let mut widest: Option<(PatternPair, Instruction)> = None;
        loop {
            if let Some(ins) = self.profile.lookup(mnemonic, pair) {
                if !prefer_widest {
                    return Ok((pair, ins));
                }
                widest = Some((pair, ins));
            }
            pair = match (pair.0.widen(), pair.1.widen()) {
                (Some(wider), _) => (wider, pair.1),
                (_, Some(wider)) => (pair.0, wider),
                _ => break,
            };
        }
        widest.ok_or_else(|| EncodeError::addressing_mode(mnemonic))
    }

    /// `rst`: the vector is either 0-7 or one of the literal addresses
    /// `$00`/`$08`/../`$38`.
    fn encode_rst(
        &self,
        mnemonic: &str,
        classified: &Classified,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<Encoded, EncodeError> {
        let vector = classified
            .imm
            .ok_or_else(|| EncodeError::addressing_mode(mnemonic))?;
        let code = if !vector.resolved {
            0
        } else if (0..=7).contains(&vector.value) {
            vector.value as u8
        } else if vector.value % 8 == 0 && (0..=0x38).contains(&vector.value) {
            (vector.value / 8) as u8
        } else {
            return Err(EncodeError::overflow(vector.value));
        };
        let bytes = vec![0xc7 | code << 3];
        ctx.output.add_bytes(&bytes);
        Ok(Encoded {
            bytes,
            disasm: format!("{mnemonic} ${:02x}", vector.value & 0x3f),
        })
    }

    /// `im`: interrupt modes 0-2.
    fn encode_im(
        &self,
        classified: &Classified,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<Encoded, EncodeError> {
        let mode = classified
            .imm
            .ok_or_else(|| EncodeError::addressing_mode("im"))?;
        let op = match mode.value {
            _ if !mode.resolved => 0x46,
            0 => 0x46,
            1 => 0x56,
            2 => 0x5e,
            _ => return Err(EncodeError::overflow(mode.value)),
        };
        let bytes = vec![0xed, op];
        ctx.output.add_bytes(&bytes);
        Ok(Encoded {
            bytes,
            disasm: format!("im {}", mode.value & 3),
        })
    }

    /// `bit`/`res`/`set`: CB-prefixed opcode computed from the bit number
    /// and the register field, with the four-byte indexed forms.
    fn encode_bit_op(
        &self,
        mnemonic: &str,
        classified: &Classified,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<Encoded, EncodeError> {
        let base: u8 = match mnemonic {
            "bit" => 0x40,
            "res" => 0x80,
            _ => 0xc0,
        };
        let bit = classified
            .imm
            .ok_or_else(|| EncodeError::addressing_mode(mnemonic))?;
        let bit_field = (bit.value as u8 & 7) << 3;

        let bytes = match classified.p2 {
            OperandPattern::Reg(r)
                if matches!(
                    r,
                    Reg::A | Reg::B | Reg::C | Reg::D | Reg::E | Reg::H | Reg::L
                ) =>
            {
                vec![0xcb, base | bit_field | r.code8().unwrap_or(0)]
            }
            OperandPattern::IndReg(Reg::Hl) => vec![0xcb, base | bit_field | 6],
            OperandPattern::Indexed(ix) => {
                let offset = classified.offset.expect("indexed operand offset");
                if offset.resolved && !(-128..=127).contains(&offset.value) {
                    return Err(EncodeError::overflow(offset.value));
                }
                let prefix = ix.index_prefix().unwrap_or(0xdd);
                vec![prefix, 0xcb, offset.masked(1) as u8, base | bit_field | 6]
            }
            _ => return Err(EncodeError::addressing_mode(mnemonic)),
        };
        ctx.output.add_bytes(&bytes);
        let target = operand_text(classified.p2, classified.imm, classified.offset)
            .unwrap_or_default();
        Ok(Encoded {
            bytes,
            disasm: format!("{mnemonic} {},{target}", bit.value & 7),
        })
    }

    fn encode_branch(
        &self,
        mnemonic: &str,
        pair: PatternPair,
        ins: Instruction,
        classified: &Classified,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<Encoded, EncodeError> {
        let target = classified.imm.expect("branch target operand");
        if target.value > 0xffff {
            return Err(EncodeError::overflow(target.value));
        }
        let displ = if target.resolved {
            let pc_after = ctx.output.logical_pc() + ins.size as i64;
            let displ = ctx.output.relative_offset(target.value, pc_after);
            if !(-128..=127).contains(&displ) {
                return Err(EncodeError::overflow(displ));
            }
            displ
        } else {
            // Placeholder until a later pass resolves the symbol.
            0
        };

        let mut bytes = ins.opcode.bytes().to_vec();
        bytes.push(displ as u8);
        ctx.output.add_bytes(&bytes);
        Ok(Encoded {
            bytes,
            disasm: render_disasm(mnemonic, pair, classified),
        })
    }

    fn encode_plain(
        &self,
        mnemonic: &str,
        pair: PatternPair,
        ins: Instruction,
        classified: &Classified,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<Encoded, EncodeError> {
        let opcode = ins.opcode.bytes();
        let mut budget = ins.size as usize - opcode.len();
        let mut operand_bytes: Vec<u8> = Vec::new();

        let has_indexed = matches!(pair.0, OperandPattern::Indexed(_))
            || matches!(pair.1, OperandPattern::Indexed(_));
        if has_indexed {
            let offset = classified.offset.expect("indexed operand offset");
            if budget == 0 {
                // `jp (ix)` has no displacement slot.
                if offset.resolved && offset.value != 0 {
                    return Err(EncodeError::overflow(offset.value));
                }
            } else {
                if offset.resolved && !(-128..=127).contains(&offset.value) {
                    return Err(EncodeError::overflow(offset.value));
                }
                operand_bytes.push(offset.masked(1) as u8);
                budget -= 1;
            }
        }

        if let Some(imm) = classified.imm {
            if imm.resolved && imm.width as usize > budget {
                return Err(EncodeError::overflow(imm.value));
            }
            operand_bytes.extend(le_bytes(imm.masked(budget as u8), budget as u8));
        }

        // Three opcode bytes means a DD/FD CB form: the displacement sits
        // between the prefixes and the primary opcode.
        let mut bytes = Vec::with_capacity(ins.size as usize);
        if opcode.len() == 3 {
            bytes.extend_from_slice(&opcode[..2]);
            bytes.extend_from_slice(&operand_bytes);
            bytes.push(opcode[2]);
        } else {
            bytes.extend_from_slice(opcode);
            bytes.extend_from_slice(&operand_bytes);
        }
        ctx.output.add_bytes(&bytes);
        Ok(Encoded {
            bytes,
            disasm: render_disasm(mnemonic, pair, classified),
        })
    }
}

/// Render one operand position from its pattern and display values.
fn operand_text(
    pattern: OperandPattern,
    imm: Option<EvaluatedOperand>,
    offset: Option<EvaluatedOperand>,
) -> Option<String> {
    match pattern {
        OperandPattern::None => None,
        OperandPattern::Reg(r) => Some(r.name().to_string()),
        OperandPattern::Cond(c) => Some(c.name().to_string()),
        OperandPattern::Imm(w) => {
            let value = imm.map(|v| v.masked(w.bytes())).unwrap_or(0);
            Some(format!("${:0>1$x}", value, 2 * w.bytes() as usize))
        }
        OperandPattern::IndImm(w) => {
            let value = imm.map(|v| v.masked(w.bytes())).unwrap_or(0);
            Some(format!("(${:0>1$x})", value, 2 * w.bytes() as usize))
        }
        OperandPattern::IndReg(r) => Some(format!("({})", r.name())),
        OperandPattern::Indexed(r) => {
            let value = offset.map(|v| v.value).unwrap_or(0);
            if value < 0 {
                Some(format!("({}-${:02x})", r.name(), -value))
            } else {
                Some(format!("({}+${:02x})", r.name(), value))
            }
        }
    }
}

fn render_disasm(mnemonic: &str, pair: PatternPair, classified: &Classified) -> String {
    let mut text = mnemonic.to_string();
    let operands: Vec<String> = [pair.0, pair.1]
        .into_iter()
        .filter_map(|p| operand_text(p, classified.imm, classified.offset))
        .collect();
    if !operands.is_empty() {
        text.push(' ');
        text.push_str(&operands.join(","));
    }
    text
}

impl LineEncoder for IntelEncoder {
    fn cpu(&self) -> CpuType {
        self.profile.cpu()
    }

    fn handles(&self, mnemonic: &str) -> bool {
        self.profile
            .family_has_mnemonic(&mnemonic.to_ascii_lowercase())
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
        let classified = classify(self.cpu_type(), &mnemonic, line.operand, ctx.eval)?;

        if mnemonic == "rst" {
            return self.encode_rst(&mnemonic, &classified, ctx).map(Some);
        }
        if self.cpu_type() == CPU_Z80 {
            if mnemonic == "im" {
                return self.encode_im(&classified, ctx).map(Some);
            }
            if in_set(BIT_OPS, &mnemonic) {
                return self.encode_bit_op(&mnemonic, &classified, ctx).map(Some);
            }
        }

        let (pair, ins) = self.lookup_with_widening(&mnemonic, &classified)?;
        let encoded = if ins.is_relative_branch() {
            self.encode_branch(&mnemonic, pair, ins, &classified, ctx)?
        } else {
            self.encode_plain(&mnemonic, pair, ins, &classified, ctx)?
        };
        Ok(Some(encoded))
    }

    fn instruction_size(&self, line: &SourceLine<'_>, ctx: &mut EncodeContext<'_>) -> i64 {
        let mnemonic = line.mnemonic.to_ascii_lowercase();
        let operand = line.operand.trim();

        if in_set(RELATIVE_BRANCHES, &mnemonic) {
            return 2;
        }
        if mnemonic == "rst" {
            return 1;
        }
        if self.cpu_type() == CPU_Z80 {
            if mnemonic == "im" {
                return 2;
            }
            if in_set(BIT_OPS, &mnemonic) {
                return match classify(self.cpu_type(), &mnemonic, operand, ctx.eval) {
                    Ok(c) if matches!(c.p2, OperandPattern::Indexed(_)) => 4,
                    _ => 2,
                };
            }
        }

        match classify(self.cpu_type(), &mnemonic, operand, ctx.eval)
            .and_then(|classified| self.lookup_with_widening(&mnemonic, &classified))
        {
            Ok((_, ins)) => ins.size as i64,
            Err(_) => 1,
        }
    }
}
