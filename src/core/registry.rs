// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Registry mapping CPU identifiers to family encoders.
//!
//! The registry is the single place that knows which family owns which CPU
//! type. Selecting a CPU constructs a fresh encoder with a freshly derived
//! profile; nothing is shared or mutated across selections.

use crate::core::cpu::{CpuFamily, CpuType};
use crate::core::error::EncodeError;
use crate::core::family::LineEncoder;
use crate::families::{intel8080, mos6502};

/// All CPU types the assembler can target.
pub fn supported_cpus() -> Vec<CpuType> {
    let mut cpus = mos6502::CPUS.to_vec();
    cpus.extend_from_slice(intel8080::CPUS);
    cpus
}

/// Resolve a user-supplied CPU name (case-insensitive).
pub fn cpu_by_name(name: &str) -> Option<CpuType> {
    supported_cpus().into_iter().find(|cpu| cpu.matches(name))
}

/// The family a CPU type belongs to.
pub fn family_of(cpu: CpuType) -> CpuFamily {
    if mos6502::CPUS.contains(&cpu) {
        mos6502::FAMILY
    } else {
        intel8080::FAMILY
    }
}

/// Construct the line encoder for a CPU.
pub fn encoder_for(cpu: CpuType) -> Result<Box<dyn LineEncoder>, EncodeError> {
    if mos6502::CPUS.contains(&cpu) {
        return Ok(Box::new(mos6502::M65xxEncoder::new(cpu)));
    }
    if intel8080::CPUS.contains(&cpu) {
        return Ok(Box::new(intel8080::IntelEncoder::new(cpu)));
    }
    Err(EncodeError::invalid_cpu(cpu.as_str()))
}
