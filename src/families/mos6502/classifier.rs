// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Operand classification for the MOS 6502 family.
//!
//! Turns raw operand text into a canonical [`AddressMode`] plus evaluated
//! values. Classification is pure: the only side effect is calling the
//! evaluator on sub-expressions.
//!
//! Syntax handled here:
//! - `a` accumulator-implied (legality depends on mnemonic and CPU)
//! - `[16] expr` / `[24] expr` explicit width casts, distinguished from
//!   `[expr]` long indirection by the character after the closing bracket
//! - `(expr,x)`, `(expr),y`, `(expr),z`, `(expr,s),y`, `(expr)` indirect
//!   forms; a parenthesized multi-byte value for a non-jump mnemonic is
//!   plain grouping
//! - `[expr]`, `[expr],y` long indirect forms
//! - Rockwell `bit,zp` and `bit,zp,target` operand lists
//! - `mvn`/`mvp` bank pairs, `expr,x|y|s` indexing suffixes

use crate::core::cpu::CpuType;
use crate::core::error::EncodeError;
use crate::core::eval::Evaluator;
use crate::core::operand::EvaluatedOperand;
use crate::core::text_utils::{comma_separate, first_enclosure, fully_enclosed};

use super::operand::{AddressMode, Classified, Width};
use super::{
    in_set, is_c02_class, is_legacy, CPU_65CE02, BRANCHES, BRANCHES16, IMPLIED_AC02,
    IMPLIED_ACCUMULATOR, INDIRECTS, MOVE_MEMORY, ROCKWELL, ROCKWELL_BRANCHES,
};

pub(crate) fn classify(
    cpu: CpuType,
    mnemonic: &str,
    operand: &str,
    eval: &dyn Evaluator,
) -> Result<Classified, EncodeError> {
    let operand = operand.trim();

    if operand.is_empty() {
        return Ok(Classified::bare(AddressMode::Implied));
    }

    if operand.eq_ignore_ascii_case("a") {
        let legal = in_set(IMPLIED_ACCUMULATOR, mnemonic)
            || (in_set(IMPLIED_AC02, mnemonic) && !is_legacy(cpu));
        if !legal {
            return Err(EncodeError::addressing_mode(mnemonic));
        }
        return Ok(Classified::bare(AddressMode::Implied));
    }

    // A leading bracket group is either a width cast (`[16] $10`) or long
    // indirection (`[$10]`, `[$10],y`); the character after the group
    // decides.
    let mut forced_width: Option<u8> = None;
    let mut operand = operand;
    if operand.starts_with('[') {
        let group = first_enclosure(operand, b'[', b']')
            .ok_or_else(|| EncodeError::syntax("Unbalanced bracket in operand"))?;
        if group.len() < operand.len() {
            let rest = &operand[group.len()..];
            let delim = rest.chars().find(|c| !c.is_whitespace());
            if delim != Some(',') {
                if !rest.starts_with(char::is_whitespace) {
                    return Err(EncodeError::syntax("Invalid operand"));
                }
                let bits = eval_expr(eval, &group[1..group.len() - 1])?;
                if bits.value != 16 && bits.value != 24 {
                    return Err(EncodeError::syntax("Invalid bit-width cast"));
                }
                forced_width = Some((bits.value / 8) as u8);
                operand = rest.trim_start();
            }
        }
    }

    if let Some(expr) = operand.strip_prefix('#') {
        if expr.is_empty() || expr.starts_with(char::is_whitespace) {
            return Err(EncodeError::syntax("Missing immediate expression"));
        }
        let op1 = eval_expr(eval, expr)?;
        let width = Width::from_bytes(op1.width)
            .ok_or_else(|| EncodeError::addressing_mode(mnemonic))?;
        return Ok(Classified::with_value(AddressMode::Immediate(width), op1));
    }

    if in_set(ROCKWELL_BRANCHES, mnemonic) {
        let parts = comma_separate(operand);
        if parts.len() != 3 {
            return Err(EncodeError::syntax("Invalid operand"));
        }
        let bit = eval_range(eval, parts[0], 0, 7)?;
        let zp = eval_range(eval, parts[1], -128, 255)?;
        let target = eval_expr(eval, parts[2])?;
        return Ok(Classified::with_pair(
            AddressMode::BitRelative(bit.value as u8),
            zp,
            target,
        ));
    }

    let parts = comma_separate(operand);
    if parts.len() > 2 {
        return Err(EncodeError::syntax("Invalid operand"));
    }

    if parts.len() == 2 && in_set(MOVE_MEMORY, mnemonic) {
        let src = eval_expr(eval, parts[0])?;
        let dst = eval_expr(eval, parts[1])?;
        return Ok(Classified::with_pair(AddressMode::BlockMove, src, dst));
    }

    if parts.len() == 2 && in_set(ROCKWELL, mnemonic) {
        let bit = eval_expr(eval, parts[0])?;
        if bit.resolved && !(0..=7).contains(&bit.value) {
            return Err(EncodeError::overflow(bit.value));
        }
        let zp = eval_expr(eval, parts[1])?;
        return Ok(Classified::with_value(
            AddressMode::BitDirect(bit.value as u8),
            zp,
        ));
    }

    let outer_index = if parts.len() == 2 {
        let last = parts[1];
        if last.eq_ignore_ascii_case("y") {
            Some('y')
        } else if last.eq_ignore_ascii_case("z") {
            Some('z')
        } else {
            None
        }
    } else {
        None
    };
    let yz_indexed = outer_index.is_some();

    let first = parts[0];
    if fully_enclosed(first, b'(', b')') && (parts.len() == 1 || yz_indexed) {
        if let Some(classified) =
            paren_subexpr(cpu, mnemonic, first, b'(', outer_index, eval)?
        {
            return Ok(classified);
        }
        // Plain grouping: strip the parens and fall through.
        let op1 = eval_expr(eval, &first[1..first.len() - 1])?;
        return plain_mode(cpu, mnemonic, op1, None, forced_width);
    }
    if fully_enclosed(first, b'[', b']') && (parts.len() == 1 || yz_indexed) {
        if let Some(classified) =
            paren_subexpr(cpu, mnemonic, first, b'[', outer_index, eval)?
        {
            return Ok(classified);
        }
        let op1 = eval_expr(eval, &first[1..first.len() - 1])?;
        return plain_mode(cpu, mnemonic, op1, None, forced_width);
    }

    let op1 = eval_expr(eval, first)?;
    let index = parts.get(1).copied();
    plain_mode(cpu, mnemonic, op1, index, forced_width)
}

/// Shapes without indirection: direct, indexed-direct, stack-relative and
/// relative-branch operands.
fn plain_mode(
    cpu: CpuType,
    mnemonic: &str,
    op1: EvaluatedOperand,
    index: Option<&str>,
    forced_width: Option<u8>,
) -> Result<Classified, EncodeError> {
    if in_set(BRANCHES, mnemonic) || in_set(BRANCHES16, mnemonic) {
        let wide = in_set(BRANCHES16, mnemonic)
            || (in_set(BRANCHES, mnemonic) && cpu == CPU_65CE02);
        let width = if wide { Width::Word } else { Width::Byte };
        return Ok(Classified::with_value(AddressMode::Relative(width), op1));
    }

    let width_bytes = forced_width.unwrap_or_else(|| {
        if op1.resolved {
            op1.width
        } else {
            // Forward references stay at the widest common width until a
            // later pass pins them down.
            2
        }
    });
    let width =
        Width::from_bytes(width_bytes).ok_or_else(|| EncodeError::addressing_mode(mnemonic))?;

    let mode = match index {
        None => AddressMode::Direct(width),
        Some(ix) if ix.eq_ignore_ascii_case("x") => AddressMode::DirectX(width),
        Some(ix) if ix.eq_ignore_ascii_case("y") => AddressMode::DirectY(width),
        Some(ix) if ix.eq_ignore_ascii_case("s") => AddressMode::StackRelative,
        Some(_) => return Err(EncodeError::addressing_mode(mnemonic)),
    };
    Ok(Classified::with_value(mode, op1))
}

/// Classify a `(…)` or `[…]` sub-expression. Returns `Ok(None)` when the
/// enclosure is plain expression grouping rather than indirection.
fn paren_subexpr(
    cpu: CpuType,
    mnemonic: &str,
    text: &str,
    open: u8,
    outer_index: Option<char>,
    eval: &dyn Evaluator,
) -> Result<Option<Classified>, EncodeError> {
    let long_form = open == b'[';
    let inner = &text[1..text.len() - 1];
    let inner_parts = comma_separate(inner);
    if inner_parts.len() > 2 {
        return Err(EncodeError::addressing_mode(mnemonic));
    }

    let op1 = eval_expr(eval, inner_parts[0])?;
    let value_width = if op1.resolved {
        op1.width
    } else if in_set(super::JUMPS, mnemonic) || in_set(super::JUMPS_LONG, mnemonic) {
        2
    } else {
        1
    };

    let indirect_ok = (in_set(INDIRECTS, mnemonic)
        && value_width == 1
        && (outer_index.is_some() || inner_parts.len() == 2 || is_c02_class(cpu)))
        || mnemonic == "jmp"
        || (mnemonic == "jsr" && cpu == CPU_65CE02);

    if !indirect_ok {
        if inner_parts.len() > 1 || outer_index.is_some() {
            if in_set(INDIRECTS, mnemonic) {
                return Err(EncodeError::overflow(op1.value));
            }
            return Err(EncodeError::addressing_mode(mnemonic));
        }
        return Ok(None);
    }

    if value_width > 2 {
        return Err(EncodeError::overflow(op1.value));
    }
    let width = Width::from_bytes(value_width).expect("checked above");

    let inner_index = inner_parts.get(1).copied();
    let mode = match (long_form, inner_index, outer_index) {
        (false, None, None) => AddressMode::Indirect(width),
        (false, Some(ix), None) if ix.eq_ignore_ascii_case("x") => AddressMode::IndirectX(width),
        (false, Some(ix), Some('y')) if ix.eq_ignore_ascii_case("s") => {
            AddressMode::StackRelativeY
        }
        (false, Some(ix), Some('y')) if ix.eq_ignore_ascii_case("sp") => {
            AddressMode::StackRelativeY
        }
        (false, None, Some('y')) => AddressMode::IndirectY,
        (false, None, Some('z')) => AddressMode::IndirectZ,
        (true, None, None) => AddressMode::LongIndirect(width),
        (true, None, Some('y')) => AddressMode::LongIndirectY,
        _ => return Err(EncodeError::addressing_mode(mnemonic)),
    };
    Ok(Some(Classified::with_value(mode, op1)))
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
    use crate::families::mos6502::{CPU_6502, CPU_65816, CPU_65C02};

    fn classify_ok(cpu: CpuType, mnemonic: &str, operand: &str) -> Classified {
        let eval = SimpleEvaluator::new();
        classify(cpu, mnemonic, operand, &eval).expect("classification should succeed")
    }

    #[test]
    fn implied_and_accumulator() {
        assert!(matches!(
            classify_ok(CPU_6502, "rts", "").mode,
            AddressMode::Implied
        ));
        assert!(matches!(
            classify_ok(CPU_6502, "asl", "a").mode,
            AddressMode::Implied
        ));
        // `inc a` needs a 65C02-class CPU.
        let eval = SimpleEvaluator::new();
        assert!(classify(CPU_6502, "inc", "a", &eval).is_err());
        assert!(classify(CPU_65C02, "inc", "a", &eval).is_ok());
    }

    #[test]
    fn immediate_width_follows_value() {
        let c = classify_ok(CPU_6502, "lda", "#$05");
        assert_eq!(c.mode, AddressMode::Immediate(Width::Byte));
        assert_eq!(c.op1.unwrap().value, 5);
        let c = classify_ok(CPU_65816, "lda", "#$1234");
        assert_eq!(c.mode, AddressMode::Immediate(Width::Word));
    }

    #[test]
    fn direct_and_indexed() {
        let c = classify_ok(CPU_6502, "lda", "$12");
        assert_eq!(c.mode, AddressMode::Direct(Width::Byte));
        let c = classify_ok(CPU_6502, "lda", "$1234,x");
        assert_eq!(c.mode, AddressMode::DirectX(Width::Word));
        let c = classify_ok(CPU_65816, "sta", "$12,s");
        assert_eq!(c.mode, AddressMode::StackRelative);
    }

    #[test]
    fn paren_indirection() {
        let c = classify_ok(CPU_6502, "lda", "($12,x)");
        assert_eq!(c.mode, AddressMode::IndirectX(Width::Byte));
        let c = classify_ok(CPU_6502, "lda", "($12),y");
        assert_eq!(c.mode, AddressMode::IndirectY);
        let c = classify_ok(CPU_6502, "jmp", "($1234)");
        assert_eq!(c.mode, AddressMode::Indirect(Width::Word));
        // Bare ($nn) for a load is only indirect on 65C02-class CPUs.
        let c = classify_ok(CPU_65C02, "lda", "($12)");
        assert_eq!(c.mode, AddressMode::Indirect(Width::Byte));
        let c = classify_ok(CPU_6502, "lda", "($12)");
        assert_eq!(c.mode, AddressMode::Direct(Width::Byte));
    }

    #[test]
    fn paren_grouping_for_wide_values() {
        // A 16-bit value in parens is expression grouping, not indirection.
        let c = classify_ok(CPU_65C02, "lda", "($1234)");
        assert_eq!(c.mode, AddressMode::Direct(Width::Word));
    }

    #[test]
    fn bracket_cast_versus_long_indirect() {
        let c = classify_ok(CPU_65816, "lda", "[16] $10");
        assert_eq!(c.mode, AddressMode::Direct(Width::Word));
        let c = classify_ok(CPU_65816, "lda", "[24] $10");
        assert_eq!(c.mode, AddressMode::Direct(Width::Long));
        let c = classify_ok(CPU_65816, "lda", "[$10]");
        assert_eq!(c.mode, AddressMode::LongIndirect(Width::Byte));
        let c = classify_ok(CPU_65816, "lda", "[$10],y");
        assert_eq!(c.mode, AddressMode::LongIndirectY);
        // Cast with garbage glued to the bracket is invalid.
        let eval = SimpleEvaluator::new();
        assert!(classify(CPU_65816, "lda", "[16]$10", &eval).is_err());
    }

    #[test]
    fn stack_relative_indirect_indexed() {
        let c = classify_ok(CPU_65816, "lda", "($12,s),y");
        assert_eq!(c.mode, AddressMode::StackRelativeY);
    }

    #[test]
    fn rockwell_shapes() {
        let c = classify_ok(CPU_R65C02, "rmb", "3,$12");
        assert_eq!(c.mode, AddressMode::BitDirect(3));
        let c = classify_ok(CPU_R65C02, "bbr", "3,$12,$c044");
        assert_eq!(c.mode, AddressMode::BitRelative(3));
        assert_eq!(c.op2.unwrap().value, 0xc044);
        let eval = SimpleEvaluator::new();
        assert!(classify(CPU_R65C02, "bbr", "3,$12", &eval).is_err());
        assert!(classify(CPU_R65C02, "rmb", "9,$12", &eval).is_err());
    }

    use crate::families::mos6502::CPU_R65C02;

    #[test]
    fn block_move_pairs() {
        let c = classify_ok(CPU_65816, "mvn", "$01,$02");
        assert_eq!(c.mode, AddressMode::BlockMove);
        assert_eq!(c.op1.unwrap().value, 1);
        assert_eq!(c.op2.unwrap().value, 2);
    }

    #[test]
    fn branch_operands() {
        let c = classify_ok(CPU_6502, "bne", "$c010");
        assert_eq!(c.mode, AddressMode::Relative(Width::Byte));
        let c = classify_ok(CPU_65CE02, "bne", "$c010");
        assert_eq!(c.mode, AddressMode::Relative(Width::Word));
        let c = classify_ok(CPU_65816, "brl", "$c010");
        assert_eq!(c.mode, AddressMode::Relative(Width::Word));
    }

    #[test]
    fn operand_count_limit() {
        let eval = SimpleEvaluator::new();
        let err = classify(CPU_6502, "lda", "1,2,3", &eval).unwrap_err();
        assert_eq!(err.kind, crate::core::error::EncodeErrorKind::Syntax);
    }
}
