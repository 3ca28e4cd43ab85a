// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Operand classification for the Intel 8080 / Z80 family.
//!
//! Raw operand text becomes a pattern pair plus evaluated values.
//! Registers and conditions resolve through the fixed name tables;
//! parenthesized forms split into register-indirect, indexed-with-offset
//! and immediate-indirect; everything else is an immediate expression.
//!
//! Condition tokens that are not register names (`nz`, `z`, `po`, `pe`,
//! `p`) only classify as conditions for the conditional mnemonics, so a
//! symbol named `z` still works as an immediate elsewhere.

use crate::core::cpu::CpuType;
use crate::core::error::EncodeError;
use crate::core::eval::Evaluator;
use crate::core::operand::EvaluatedOperand;
use crate::core::text_utils::{comma_separate, first_enclosure, fully_enclosed};

use super::operand::{Classified, Cond, ImmWidth, OperandPattern, Reg};
use super::{in_set, CPU_Z80, BIT_OPS};

/// Z80 mnemonics whose first operand may be a condition code.
const CONDITIONAL: &[&str] = &["jp", "jr", "call", "ret"];

pub(crate) fn classify(
    cpu: CpuType,
    mnemonic: &str,
    operand: &str,
    eval: &dyn Evaluator,
) -> Result<Classified, EncodeError> {
    let operand = operand.trim();
    if operand.is_empty() {
        return Ok(Classified::implied());
    }

    let parts = comma_separate(operand);
    if parts.len() > 2 {
        return Err(EncodeError::syntax("Invalid operand"));
    }

    // Bit instructions carry the bit number as the immediate; the target
    // register or indexed form classifies normally.
    if cpu == CPU_Z80 && in_set(BIT_OPS, mnemonic) {
        if parts.len() != 2 {
            return Err(EncodeError::syntax("Invalid operand"));
        }
        let bit = eval_range(eval, parts[0], 0, 7)?;
        let target = classify_part(cpu, mnemonic, parts[1], false, eval)?;
        return Ok(Classified {
            p1: OperandPattern::Imm(ImmWidth::Byte),
            p2: target.pattern,
            imm: Some(bit),
            offset: target.offset,
        });
    }

    let cond_ok = cpu == CPU_Z80 && in_set(CONDITIONAL, mnemonic);
    let first = classify_part(cpu, mnemonic, parts[0], cond_ok, eval)?;
    let second = match parts.get(1) {
        Some(text) => classify_part(cpu, mnemonic, text, false, eval)?,
        None => Part::empty(),
    };

    let imm = match (first.imm, second.imm) {
        (Some(_), Some(_)) => return Err(EncodeError::syntax("Invalid operand")),
        (imm, None) => imm,
        (None, imm) => imm,
    };
    let offset = match (first.offset, second.offset) {
        (Some(_), Some(_)) => return Err(EncodeError::syntax("Invalid operand")),
        (offset, None) => offset,
        (None, offset) => offset,
    };

    Ok(Classified {
        p1: first.pattern,
        p2: second.pattern,
        imm,
        offset,
    })
}

struct Part {
    pattern: OperandPattern,
    imm: Option<EvaluatedOperand>,
    offset: Option<EvaluatedOperand>,
}

impl Part {
    fn empty() -> Self {
        Self {
            pattern: OperandPattern::None,
            imm: None,
            offset: None,
        }
    }

    fn bare(pattern: OperandPattern) -> Self {
        Self {
            pattern,
            imm: None,
            offset: None,
        }
    }
}

fn classify_part(
    cpu: CpuType,
    mnemonic: &str,
    text: &str,
    cond_ok: bool,
    eval: &dyn Evaluator,
) -> Result<Part, EncodeError> {
    let text = text.trim();

    if cond_ok {
        if let Some(cond) = Cond::parse(text) {
            return Ok(Part::bare(OperandPattern::Cond(cond)));
        }
    }
    if let Some(reg) = Reg::parse(text) {
        return Ok(Part::bare(OperandPattern::Reg(reg)));
    }

    if fully_enclosed(text, b'(', b')') {
        return classify_indirect(cpu, mnemonic, &text[1..text.len() - 1], eval);
    }
    if text.starts_with('(') && first_enclosure(text, b'(', b')').is_none() {
        return Err(EncodeError::syntax("Unbalanced parenthesis in operand"));
    }

    let imm = eval_expr(eval, text)?;
    let width = imm_width(&imm)?;
    Ok(Part {
        pattern: OperandPattern::Imm(width),
        imm: Some(imm),
        offset: None,
    })
}

/// Classify the inside of a `(...)` operand.
fn classify_indirect(
    _cpu: CpuType,
    _mnemonic: &str,
    inner: &str,
    eval: &dyn Evaluator,
) -> Result<Part, EncodeError> {
    let inner = inner.trim();

    if let Some(reg) = Reg::parse(inner) {
        return match reg {
            // `(ix)`/`(iy)` is indexing with an implicit zero offset.
            Reg::Ix | Reg::Iy => Ok(Part {
                pattern: OperandPattern::Indexed(reg),
                imm: None,
                offset: Some(EvaluatedOperand::new(crate::core::eval::Value::resolved(0))),
            }),
            Reg::C | Reg::Bc | Reg::De | Reg::Hl | Reg::Sp => {
                Ok(Part::bare(OperandPattern::IndReg(reg)))
            }
            _ => Err(EncodeError::syntax(format!(
                "Register '{}' cannot be used indirectly",
                reg.name()
            ))),
        };
    }

    // `(ix+d)` / `(iy-d)`: signed displacement off an index register.
    let lower = inner.to_ascii_lowercase();
    if lower.starts_with("ix") || lower.starts_with("iy") {
        let rest = inner[2..].trim_start();
        if let Some(sign @ (b'+' | b'-')) = rest.as_bytes().first().copied() {
            let base = if lower.starts_with("ix") { Reg::Ix } else { Reg::Iy };
            let magnitude = eval_expr(eval, &rest[1..])?;
            let offset = if sign == b'-' {
                EvaluatedOperand::new(crate::core::eval::Value {
                    value: -magnitude.value,
                    resolved: magnitude.resolved,
                })
            } else {
                magnitude
            };
            return Ok(Part {
                pattern: OperandPattern::Indexed(base),
                imm: None,
                offset: Some(offset),
            });
        }
    }

    let imm = eval_expr(eval, inner)?;
    let width = imm_width(&imm)?;
    Ok(Part {
        pattern: OperandPattern::IndImm(width),
        imm: Some(imm),
        offset: None,
    })
}

/// Immediate starting width: the value's natural width, byte for
/// unresolved forward references (the lookup ladder widens from there).
fn imm_width(imm: &EvaluatedOperand) -> Result<ImmWidth, EncodeError> {
    if !imm.resolved {
        return Ok(ImmWidth::Byte);
    }
    match imm.width {
        1 => Ok(ImmWidth::Byte),
        2 => Ok(ImmWidth::Word),
        _ => Err(EncodeError::overflow(imm.value)),
    }
}

fn eval_expr(eval: &dyn Evaluator, expr: &str) -> Result<EvaluatedOperand, EncodeError> {
    eval.eval(expr)
        .map(EvaluatedOperand::new)
        .map_err(|err| EncodeError::expression(err.message))
}

fn eval_range(
    eval: &dyn Evaluator,
    expr: &str,
    min: i64,
    max: i64,
) -> Result<EvaluatedOperand, EncodeError> {
    eval.eval_range(expr, min, max)
        .map(EvaluatedOperand::new)
        .map_err(|err| EncodeError::expression(err.message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::eval::SimpleEvaluator;
    use crate::families::intel8080::CPU_8080;

    fn classify_ok(mnemonic: &str, operand: &str) -> Classified {
        let eval = SimpleEvaluator::new();
        classify(CPU_Z80, mnemonic, operand, &eval).expect("classification should succeed")
    }

    #[test]
    fn registers_and_pairs() {
        let c = classify_ok("ld", "a,b");
        assert_eq!(c.p1, OperandPattern::Reg(Reg::A));
        assert_eq!(c.p2, OperandPattern::Reg(Reg::B));

        let c = classify_ok("push", "af");
        assert_eq!(c.p1, OperandPattern::Reg(Reg::Af));
        let c = classify_ok("ex", "af,af'");
        assert_eq!(c.p2, OperandPattern::Reg(Reg::AfShadow));
    }

    #[test]
    fn immediates_take_natural_width() {
        let c = classify_ok("ld", "a,$12");
        assert_eq!(c.p2, OperandPattern::Imm(ImmWidth::Byte));
        assert_eq!(c.imm.unwrap().value, 0x12);

        let c = classify_ok("ld", "hl,$1234");
        assert_eq!(c.p2, OperandPattern::Imm(ImmWidth::Word));
    }

    #[test]
    fn indirect_forms() {
        let c = classify_ok("ld", "a,(hl)");
        assert_eq!(c.p2, OperandPattern::IndReg(Reg::Hl));

        let c = classify_ok("ld", "a,($1234)");
        assert_eq!(c.p2, OperandPattern::IndImm(ImmWidth::Word));
        assert_eq!(c.imm.unwrap().value, 0x1234);

        let c = classify_ok("in", "a,($05)");
        assert_eq!(c.p2, OperandPattern::IndImm(ImmWidth::Byte));
    }

    #[test]
    fn indexed_with_offset() {
        let c = classify_ok("ld", "(ix+$05),a");
        assert_eq!(c.p1, OperandPattern::Indexed(Reg::Ix));
        assert_eq!(c.offset.unwrap().value, 5);
        assert_eq!(c.p2, OperandPattern::Reg(Reg::A));

        let c = classify_ok("ld", "a,(iy-3)");
        assert_eq!(c.p2, OperandPattern::Indexed(Reg::Iy));
        assert_eq!(c.offset.unwrap().value, -3);

        // Implicit zero offset.
        let c = classify_ok("ld", "a,(ix)");
        assert_eq!(c.offset.unwrap().value, 0);
    }

    #[test]
    fn conditions_only_for_conditional_mnemonics() {
        let c = classify_ok("jp", "nz,$1234");
        assert_eq!(c.p1, OperandPattern::Cond(Cond::Nz));

        // Carry keeps its register pattern.
        let c = classify_ok("jr", "c,$1234");
        assert_eq!(c.p1, OperandPattern::Reg(Reg::C));

        // Elsewhere `z` is an ordinary symbol.
        let mut eval = SimpleEvaluator::new();
        eval.define("z", 0x40);
        let c = classify(CPU_Z80, "ld", "a,z", &eval).unwrap();
        assert_eq!(c.p2, OperandPattern::Imm(ImmWidth::Byte));
        assert_eq!(c.imm.unwrap().value, 0x40);
    }

    #[test]
    fn bit_numbers_fold_into_immediate() {
        let c = classify_ok("set", "3,(ix+2)");
        assert_eq!(c.p1, OperandPattern::Imm(ImmWidth::Byte));
        assert_eq!(c.imm.unwrap().value, 3);
        assert_eq!(c.p2, OperandPattern::Indexed(Reg::Ix));
        assert_eq!(c.offset.unwrap().value, 2);

        let eval = SimpleEvaluator::new();
        assert!(classify(CPU_Z80, "bit", "9,a", &eval).is_err());
        assert!(classify(CPU_Z80, "bit", "3", &eval).is_err());
    }

    #[test]
    fn i8080_memory_register() {
        let eval = SimpleEvaluator::new();
        let c = classify(CPU_8080, "mov", "a,m", &eval).unwrap();
        assert_eq!(c.p2, OperandPattern::Reg(Reg::M));
    }

    #[test]
    fn operand_count_limit() {
        let eval = SimpleEvaluator::new();
        let err = classify(CPU_Z80, "ld", "a,b,c", &eval).unwrap_err();
        assert_eq!(err.kind, crate::core::error::EncodeErrorKind::Syntax);
    }

    #[test]
    fn unbalanced_parenthesis() {
        let eval = SimpleEvaluator::new();
        let err = classify(CPU_Z80, "ld", "a,(hl", &eval).unwrap_err();
        assert_eq!(err.kind, crate::core::error::EncodeErrorKind::Syntax);
    }
}
