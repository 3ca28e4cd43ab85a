// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for retroforge.

fn main() {
    match retroforge::assembler::run() {
        Ok(assembly) => {
            for diag in &assembly.diagnostics {
                eprintln!("{diag}");
            }
            if !assembly.is_clean() {
                std::process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
