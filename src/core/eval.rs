// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Operand expression evaluation interface.
//!
//! The encoders never parse arithmetic themselves; they hand operand
//! sub-expressions to an [`Evaluator`] supplied by the front end. The
//! bundled [`SimpleEvaluator`] covers numeric literals, symbols, the
//! current-address marker and additive/multiplicative arithmetic, which is
//! enough for the CLI driver and the test suite.

use std::collections::HashMap;

/// An evaluated operand value.
///
/// `resolved` is false when the value depends on a symbol that has not been
/// defined yet (a forward reference on the first pass). The encoders treat
/// unresolved values conservatively: widest plausible operand width, and
/// placeholder branch displacements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Value {
    pub value: i64,
    pub resolved: bool,
}

impl Value {
    pub fn resolved(value: i64) -> Self {
        Self {
            value,
            resolved: true,
        }
    }

    pub fn unresolved() -> Self {
        Self {
            value: 0,
            resolved: false,
        }
    }
}

/// Error returned from expression evaluation.
#[derive(Debug, Clone)]
pub struct EvalError {
    pub message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EvalError {}

/// Expression evaluator supplied by the assembler front end.
pub trait Evaluator {
    /// Evaluate an operand sub-expression to a value.
    fn eval(&self, expr: &str) -> Result<Value, EvalError>;

    /// Evaluate with an inclusive range check. Unresolved values pass the
    /// check; they are re-evaluated on a later pass.
    fn eval_range(&self, expr: &str, min: i64, max: i64) -> Result<Value, EvalError> {
        let val = self.eval(expr)?;
        if val.resolved && !(min..=max).contains(&val.value) {
            return Err(EvalError::new(format!(
                "Value {} out of range ({}..{})",
                val.value, min, max
            )));
        }
        Ok(val)
    }
}

/// Parse a number literal (decimal, hex, binary, octal).
///
/// Supports multiple formats:
/// - Decimal: `42`
/// - Hex: `0x2A`, `$2A`, `2Ah`
/// - Binary: `0b101010`, `%101010`, `101010b`
/// - Octal: `0o52`, `52o`, `52q`
pub fn parse_number(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let (is_neg, text) = if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else {
        (false, text)
    };

    // Strip underscores (visual separators)
    let text: String = text.chars().filter(|&c| c != '_').collect();
    let text = text.as_str();

    let val = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else if let Some(oct) = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")) {
        i64::from_str_radix(oct, 8).ok()?
    } else if let Some(bin) = text.strip_prefix('%') {
        i64::from_str_radix(bin, 2).ok()?
    } else if text.ends_with('h') || text.ends_with('H') {
        i64::from_str_radix(&text[..text.len() - 1], 16).ok()?
    } else if text.ends_with('b') || text.ends_with('B') {
        // Could be binary or a hex digit - check if all chars are 0/1
        let inner = &text[..text.len() - 1];
        if inner.chars().all(|c| c == '0' || c == '1') {
            i64::from_str_radix(inner, 2).ok()?
        } else {
            i64::from_str_radix(&text[..text.len() - 1], 16).ok()?
        }
    } else if text.ends_with('o')
        || text.ends_with('O')
        || text.ends_with('q')
        || text.ends_with('Q')
    {
        i64::from_str_radix(&text[..text.len() - 1], 8).ok()?
    } else if let Some(hex) = text.strip_prefix('$') {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        text.parse::<i64>().ok()?
    };

    Some(if is_neg { -val } else { val })
}

/// Simple evaluator over operand text: literals, symbols, `*` for the
/// current address, unary `-`/`<`/`>`, and `+ - * /` arithmetic.
pub struct SimpleEvaluator {
    symbols: HashMap<String, i64>,
    pc: Option<i64>,
    allow_unresolved: bool,
}

impl Default for SimpleEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleEvaluator {
    pub fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            pc: None,
            allow_unresolved: false,
        }
    }

    pub fn define(&mut self, name: &str, value: i64) {
        self.symbols.insert(name.to_string(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<i64> {
        self.symbols.get(name).copied()
    }

    pub fn set_pc(&mut self, pc: i64) {
        self.pc = Some(pc);
    }

    /// When set, undefined symbols evaluate to an unresolved placeholder
    /// instead of an error (first-pass forward references).
    pub fn set_allow_unresolved(&mut self, allow: bool) {
        self.allow_unresolved = allow;
    }

    fn eval_term(&self, term: &str) -> Result<Value, EvalError> {
        let term = term.trim();
        if term == "*" {
            return self
                .pc
                .map(Value::resolved)
                .ok_or_else(|| EvalError::new("Current address (*) not available"));
        }
        if let Some(val) = parse_number(term) {
            return Ok(Value::resolved(val));
        }
        if let Some(rest) = term.strip_prefix('<') {
            let inner = self.eval_term(rest)?;
            return Ok(Value {
                value: inner.value & 0xff,
                resolved: inner.resolved,
            });
        }
        if let Some(rest) = term.strip_prefix('>') {
            let inner = self.eval_term(rest)?;
            return Ok(Value {
                value: (inner.value >> 8) & 0xff,
                resolved: inner.resolved,
            });
        }
        if let Some(val) = self.symbols.get(term) {
            return Ok(Value::resolved(*val));
        }
        if self.allow_unresolved && term.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            return Ok(Value::unresolved());
        }
        Err(EvalError::new(format!("Undefined symbol: {term}")))
    }

    fn eval_product(&self, text: &str) -> Result<Value, EvalError> {
        let mut result: Option<Value> = None;
        let mut op = '*';
        for part in split_operators(text, &['*', '/']) {
            let val = match part {
                Piece::Operator(c) => {
                    op = c;
                    continue;
                }
                Piece::Text(t) => self.eval_term(t)?,
            };
            result = Some(match result {
                None => val,
                Some(acc) => {
                    let value = match op {
                        '*' => acc.value.wrapping_mul(val.value),
                        _ => {
                            if val.value == 0 {
                                return Err(EvalError::new("Division by zero"));
                            }
                            acc.value / val.value
                        }
                    };
                    Value {
                        value,
                        resolved: acc.resolved && val.resolved,
                    }
                }
            });
        }
        result.ok_or_else(|| EvalError::new(format!("Invalid expression: {text}")))
    }
}

impl Evaluator for SimpleEvaluator {
    fn eval(&self, expr: &str) -> Result<Value, EvalError> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(EvalError::new("Empty expression"));
        }
        let mut result: Option<Value> = None;
        let mut op = '+';
        for part in split_operators(expr, &['+', '-']) {
            let val = match part {
                Piece::Operator(c) => {
                    op = c;
                    continue;
                }
                Piece::Text(t) => {
                    if t.trim().is_empty() {
                        // Leading sign: fold into the next term.
                        continue;
                    }
                    self.eval_product(t)?
                }
            };
            result = Some(match result {
                None => {
                    if op == '-' {
                        Value {
                            value: -val.value,
                            resolved: val.resolved,
                        }
                    } else {
                        val
                    }
                }
                Some(acc) => {
                    let value = if op == '+' {
                        acc.value.wrapping_add(val.value)
                    } else {
                        acc.value.wrapping_sub(val.value)
                    };
                    Value {
                        value,
                        resolved: acc.resolved && val.resolved,
                    }
                }
            });
        }
        result.ok_or_else(|| EvalError::new(format!("Invalid expression: {expr}")))
    }
}

enum Piece<'a> {
    Text(&'a str),
    Operator(char),
}

/// Split on top-level operator characters, keeping the operators.
/// Number suffix letters and `$` prefixes never contain operator chars,
/// so a plain scan is sufficient.
fn split_operators<'a>(text: &'a str, ops: &[char]) -> Vec<Piece<'a>> {
    let mut pieces = Vec::new();
    let mut start = 0usize;
    for (idx, c) in text.char_indices() {
        if ops.contains(&c) && idx > 0 {
            pieces.push(Piece::Text(&text[start..idx]));
            pieces.push(Piece::Operator(c));
            start = idx + 1;
        }
    }
    pieces.push(Piece::Text(&text[start..]));
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_formats() {
        assert_eq!(parse_number("42"), Some(42));
        assert_eq!(parse_number("$2A"), Some(42));
        assert_eq!(parse_number("0x2a"), Some(42));
        assert_eq!(parse_number("2Ah"), Some(42));
        assert_eq!(parse_number("%101010"), Some(42));
        assert_eq!(parse_number("0b101010"), Some(42));
        assert_eq!(parse_number("52o"), Some(42));
        assert_eq!(parse_number("-10"), Some(-10));
        assert_eq!(parse_number("0xFF_FF"), Some(0xFFFF));
    }

    #[test]
    fn eval_arithmetic() {
        let mut ev = SimpleEvaluator::new();
        ev.define("base", 0x1000);
        assert_eq!(ev.eval("base+4").unwrap().value, 0x1004);
        assert_eq!(ev.eval("base - 1").unwrap().value, 0x0fff);
        assert_eq!(ev.eval("2*3+1").unwrap().value, 7);
        assert_eq!(ev.eval("<base").unwrap().value, 0x00);
        assert_eq!(ev.eval(">base").unwrap().value, 0x10);
    }

    #[test]
    fn eval_current_address() {
        let mut ev = SimpleEvaluator::new();
        ev.set_pc(0xC000);
        assert_eq!(ev.eval("*").unwrap().value, 0xC000);
        assert_eq!(ev.eval("*+2").unwrap().value, 0xC002);
    }

    #[test]
    fn unresolved_symbols() {
        let mut ev = SimpleEvaluator::new();
        assert!(ev.eval("later").is_err());
        ev.set_allow_unresolved(true);
        let val = ev.eval("later").unwrap();
        assert!(!val.resolved);
    }

    #[test]
    fn range_check() {
        let ev = SimpleEvaluator::new();
        assert!(ev.eval_range("5", 0, 7).is_ok());
        assert!(ev.eval_range("9", 0, 7).is_err());
    }
}
