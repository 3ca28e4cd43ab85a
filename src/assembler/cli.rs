// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and output writing.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use clap::Parser;

use super::{Assembler, Assembly, LineRecord, RunError};

pub const VERSION: &str = "0.3";

const LONG_ABOUT: &str = "Multi-target cross-assembler for the 6502 and Z80/8080 CPU families.

Supported CPUs: 6502, 6502i, 65C02, R65C02, 65CE02, 65816, Z80, 8080.
The CPU can also be switched mid-source with a .cpu directive.";

#[derive(Parser, Debug)]
#[command(
    name = "retroforge",
    version = VERSION,
    about = "Multi-target cross-assembler for the 6502 and Z80/8080 CPU families",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        short = 'i',
        long = "infile",
        value_name = "FILE",
        long_help = "Input assembly source file."
    )]
    pub infile: PathBuf,
    #[arg(
        short = 'c',
        long = "cpu",
        value_name = "CPU",
        default_value = "6502",
        long_help = "Target CPU at startup. An unknown name aborts the run."
    )]
    pub cpu: String,
    #[arg(
        short = 'l',
        long = "list",
        value_name = "FILE",
        long_help = "Write an assembly listing (address, bytes, disassembly) to FILE."
    )]
    pub list_name: Option<PathBuf>,
    #[arg(
        short = 'b',
        long = "bin",
        value_name = "FILE",
        long_help = "Write the raw binary image to FILE. Skipped when any error was reported."
    )]
    pub bin_name: Option<PathBuf>,
}

/// Run the assembler with command-line arguments.
pub fn run() -> Result<Assembly, RunError> {
    let cli = Cli::parse();
    run_with(&cli)
}

fn run_with(cli: &Cli) -> Result<Assembly, RunError> {
    let source = fs::read_to_string(&cli.infile).map_err(|err| {
        RunError::new(format!("{}: {err}", cli.infile.display()))
    })?;

    let mut assembler = Assembler::new(&cli.cpu)?;
    let assembly = assembler.assemble(&source);

    if let Some(path) = &cli.list_name {
        fs::write(path, format_listing(&assembly.listing))
            .map_err(|err| RunError::new(format!("{}: {err}", path.display())))?;
    }
    if let Some(path) = &cli.bin_name {
        if assembly.is_clean() {
            fs::write(path, assembly.section.bytes())
                .map_err(|err| RunError::new(format!("{}: {err}", path.display())))?;
        }
    }
    Ok(assembly)
}

/// Render listing lines: address, up to four instruction bytes, and the
/// disassembly text.
pub fn format_listing(records: &[LineRecord]) -> String {
    let mut text = String::new();
    for record in records {
        let bytes: Vec<String> = record
            .bytes
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect();
        let _ = writeln!(
            text,
            "{:04x}  {:<12}  {}",
            record.address & 0xffff,
            bytes.join(" "),
            record.disasm
        );
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_format() {
        let records = vec![LineRecord {
            line: 1,
            address: 0xC000,
            bytes: vec![0xA9, 0x05],
            disasm: "lda #$05".to_string(),
            source: "  lda #$05".to_string(),
        }];
        assert_eq!(format_listing(&records), "c000  a9 05         lda #$05\n");
    }
}
