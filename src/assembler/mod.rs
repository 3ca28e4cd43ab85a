// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Multi-CPU assembler driver - main entry point.
//!
//! This module ties the CPU-agnostic core to the family encoders with a
//! compact two-pass driver: pass 1 captures labels against size
//! estimates, pass 2 encodes every line against the resolved symbol
//! table. The encoder for the active CPU is replaced wholesale on a
//! `.cpu` directive; a bad directive keeps the previous CPU and logs a
//! diagnostic, while a bad startup CPU aborts the run.

pub mod cli;


use std::fmt;

use crate::core::cpu::CpuType;
use crate::core::error::{Diagnostic, EncodeError};
use crate::core::eval::{Evaluator, SimpleEvaluator};
use crate::core::family::{CpuOrigin, EncodeContext, LineEncoder, SourceLine};
use crate::core::output::{Output, Section};
use crate::core::registry::{cpu_by_name, encoder_for};
use crate::core::text_utils::split_comment;

pub use cli::{run, VERSION};

/// Fatal error that aborts the whole run.
#[derive(Debug)]
pub struct RunError {
    pub message: String,
}

impl RunError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RunError {}

/// One assembled line for the listing output.
#[derive(Debug, Clone)]
pub struct LineRecord {
    pub line: u32,
    pub address: i64,
    pub bytes: Vec<u8>,
    pub disasm: String,
    pub source: String,
}

/// The result of assembling one source text.
pub struct Assembly {
    pub section: Section,
    pub listing: Vec<LineRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Assembly {
    /// True when no error-severity diagnostic was recorded.
    pub fn is_clean(&self) -> bool {
        use crate::core::error::Severity;
        self.diagnostics
            .iter()
            .all(|d| d.severity != Severity::Error)
    }
}

/// A parsed statement, label already stripped.
enum Stmt<'a> {
    Empty,
    /// `name = expr` or `name .equ expr`
    Assign { name: &'a str, expr: &'a str },
    /// `.cpu`, `.org`
    Directive { name: &'a str, args: &'a str },
    Instruction { mnemonic: &'a str, operand: &'a str },
}

/// Names that never become labels or symbols.
const RESERVED: &[&str] = &[".cpu", ".org", ".equ"];

/// Split one source line into an optional label and a statement.
fn parse_line(line: &str) -> (Option<&str>, Stmt<'_>) {
    let (code, _) = split_comment(line);
    let code = code.trim_end();

    let (label, rest) = match code.split_once(':') {
        Some((head, tail)) if is_symbol(head.trim()) => (Some(head.trim()), tail),
        _ => (None, code),
    };
    let rest = rest.trim();
    if rest.is_empty() {
        return (label, Stmt::Empty);
    }

    // Assignments: `name = expr` / `name .equ expr`.
    if label.is_none() {
        if let Some((name, expr)) = rest.split_once('=') {
            let name = name.trim();
            if is_symbol(name) {
                return (None, Stmt::Assign { name, expr });
            }
        }
        let mut words = rest
            .splitn(3, char::is_whitespace)
            .filter(|w| !w.is_empty());
        if let (Some(name), Some(op)) = (words.next(), words.next()) {
            if op.eq_ignore_ascii_case(".equ") && is_symbol(name) {
                return (
                    None,
                    Stmt::Assign {
                        name,
                        expr: words.next().unwrap_or(""),
                    },
                );
            }
        }
    }

    let (head, tail) = match rest.find(char::is_whitespace) {
        Some(pos) => (&rest[..pos], rest[pos..].trim()),
        None => (rest, ""),
    };

    if head.eq_ignore_ascii_case(".cpu") || head.eq_ignore_ascii_case(".org") {
        return (
            label,
            Stmt::Directive {
                name: head,
                args: tail,
            },
        );
    }

    (
        label,
        Stmt::Instruction {
            mnemonic: head,
            operand: tail,
        },
    )
}

fn is_symbol(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        && RESERVED.iter().all(|r| !name.eq_ignore_ascii_case(r))
}

/// Two-pass assembler around the family line encoders.
pub struct Assembler {
    startup_cpu: CpuType,
    encoder: Box<dyn LineEncoder>,
    symbols: SimpleEvaluator,
    diagnostics: Vec<Diagnostic>,
}

impl Assembler {
    /// Create an assembler for the startup CPU. An unknown name here is
    /// fatal.
    pub fn new(cpu_name: &str) -> Result<Self, RunError> {
        let cpu = cpu_by_name(cpu_name)
            .ok_or_else(|| RunError::new(format!("Invalid CPU '{cpu_name}' specified")))?;
        let encoder = encoder_for(cpu).map_err(|err| RunError::new(err.message))?;
        Ok(Self {
            startup_cpu: cpu,
            encoder,
            symbols: SimpleEvaluator::new(),
            diagnostics: Vec::new(),
        })
    }

    pub fn cpu(&self) -> CpuType {
        self.encoder.cpu()
    }

    /// Switch the active CPU. A directive naming an unknown CPU keeps the
    /// previous selection and records a diagnostic.
    pub fn set_cpu(&mut self, name: &str, origin: CpuOrigin, line: u32) -> Result<(), RunError> {
        match cpu_by_name(name).map(encoder_for) {
            Some(Ok(encoder)) => {
                self.encoder = encoder;
                Ok(())
            }
            _ => match origin {
                CpuOrigin::Startup => {
                    Err(RunError::new(format!("Invalid CPU '{name}' specified")))
                }
                CpuOrigin::Directive => {
                    self.diagnostics.push(Diagnostic::error(
                        line,
                        EncodeError::invalid_cpu(name).message,
                    ));
                    Ok(())
                }
            },
        }
    }

    /// Reset the encoder to the startup CPU with fresh per-pass state
    /// (register-width flags included).
    fn reset_encoder(&mut self) {
        if let Ok(encoder) = encoder_for(self.startup_cpu) {
            self.encoder = encoder;
        }
    }

    /// Assemble a full source text: label-capture passes, then a final
    /// encoding pass. Per-line errors become diagnostics; assembly
    /// continues.
    pub fn assemble(&mut self, source: &str) -> Assembly {
        self.diagnostics.clear();
        // Two capture rounds: the second re-estimates sizes with every
        // label resolved, settling branch-narrowing decisions before the
        // final encode.
        for _ in 0..2 {
            self.reset_encoder();
            self.capture_labels(source);
        }

        self.reset_encoder();
        self.symbols.set_allow_unresolved(false);

        let mut section = Section::new();
        let mut listing = Vec::new();

        for (idx, text) in source.lines().enumerate() {
            let line_no = idx as u32 + 1;
            let address = section.logical_pc();
            self.symbols.set_pc(address);

            let (_, stmt) = parse_line(text);
            match stmt {
                Stmt::Empty => {}
                Stmt::Assign { name, expr } => match self.symbols.eval(expr) {
                    Ok(val) => self.symbols.define(name, val.value),
                    Err(err) => self
                        .diagnostics
                        .push(Diagnostic::error(line_no, err.message)),
                },
                Stmt::Directive { name, args } => {
                    self.run_directive(name, args, line_no, &mut section);
                }
                Stmt::Instruction { mnemonic, operand } => {
                    if !self.encoder.handles(mnemonic) {
                        self.diagnostics.push(Diagnostic::error(
                            line_no,
                            format!("Unknown instruction '{mnemonic}'"),
                        ));
                        continue;
                    }
                    let line = SourceLine {
                        mnemonic,
                        operand,
                        line: line_no,
                    };
                    let mut ctx = EncodeContext::new(&self.symbols, &mut section, 2);
                    match self.encoder.assemble_line(&line, &mut ctx) {
                        Ok(Some(encoded)) => listing.push(LineRecord {
                            line: line_no,
                            address,
                            bytes: encoded.bytes,
                            disasm: encoded.disasm,
                            source: text.to_string(),
                        }),
                        Ok(None) => {}
                        Err(err) => self
                            .diagnostics
                            .push(Diagnostic::error(line_no, err.message)),
                    }
                    for warning in ctx.warnings.drain(..) {
                        self.diagnostics.push(Diagnostic::warning(line_no, warning));
                    }
                }
            }
        }

        Assembly {
            section,
            listing,
            diagnostics: std::mem::take(&mut self.diagnostics),
        }
    }

    /// Pass 1: walk the source once, defining labels against estimated
    /// instruction sizes. Unknown symbols evaluate to unresolved
    /// placeholders so forward references never abort the pass.
    fn capture_labels(&mut self, source: &str) {
        self.symbols.set_allow_unresolved(true);
        let mut section = Section::new();

        for (idx, text) in source.lines().enumerate() {
            let line_no = idx as u32 + 1;
            self.symbols.set_pc(section.logical_pc());

            let (label, stmt) = parse_line(text);
            if let Some(label) = label {
                self.symbols.define(label, section.logical_pc());
            }
            match stmt {
                Stmt::Empty => {}
                Stmt::Assign { name, expr } => {
                    if let Ok(val) = self.symbols.eval(expr) {
                        if val.resolved {
                            self.symbols.define(name, val.value);
                        }
                    }
                }
                Stmt::Directive { name, args } => {
                    self.run_directive(name, args, line_no, &mut section);
                }
                Stmt::Instruction { mnemonic, operand } => {
                    if !self.encoder.handles(mnemonic) {
                        continue;
                    }
                    let line = SourceLine {
                        mnemonic,
                        operand,
                        line: line_no,
                    };
                    let mut ctx = EncodeContext::new(&self.symbols, &mut section, 1);
                    let size = self.encoder.instruction_size(&line, &mut ctx);
                    if size == 0 {
                        // Zero-size lines are stateful directives (the
                        // 65816 register-width set); their effect has to
                        // apply during capture as well.
                        let _ = self.encoder.assemble_line(&line, &mut ctx);
                        continue;
                    }
                    section.add_uninitialized(size.max(0) as usize);
                }
            }
        }

        // Pass-1 diagnostics would repeat on pass 2; only the pass-2 set
        // is reported.
        self.diagnostics.clear();
    }

    fn run_directive(&mut self, name: &str, args: &str, line_no: u32, section: &mut Section) {
        if name.eq_ignore_ascii_case(".cpu") {
            let cpu_name = args.trim().trim_matches('"');
            // Directive-origin failures are recoverable by contract.
            let _ = self.set_cpu(cpu_name, CpuOrigin::Directive, line_no);
            return;
        }
        // .org
        match self.symbols.eval(args) {
            Ok(val) if val.resolved => section.set_pc(val.value),
            Ok(_) => self.diagnostics.push(Diagnostic::error(
                line_no,
                "Origin must be a resolved value".to_string(),
            )),
            Err(err) => self
                .diagnostics
                .push(Diagnostic::error(line_no, err.message)),
        }
    }
}
