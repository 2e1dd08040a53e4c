// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! nvidia-smi telemetry source

use super::{TelemetryProbe, TelemetrySnapshot, TelemetrySource};
use crate::{BenchError, Result};
use std::process::Command;

/// Program name looked up on `PATH` by default
pub const DEFAULT_SMI_PROGRAM: &str = "nvidia-smi";

/// Fields requested from nvidia-smi, in output order
pub const SMI_QUERY: &str = "memory.used,memory.total,utilization.gpu";

/// Telemetry probe that shells out to `nvidia-smi`
#[derive(Debug, Clone)]
pub struct SmiProbe {
    program: String,
    device_index: u32,
}

impl SmiProbe {
    /// Probe `program` for the given device index
    pub fn new(program: impl Into<String>, device_index: u32) -> Self {
        Self {
            program: program.into(),
            device_index,
        }
    }

    /// Arguments passed to the tool
    pub fn args(&self) -> Vec<String> {
        vec![
            format!("--query-gpu={}", SMI_QUERY),
            "--format=csv,noheader,nounits".to_string(),
            format!("--id={}", self.device_index),
        ]
    }

    fn read(&self) -> Result<TelemetrySnapshot> {
        let output = Command::new(&self.program).args(self.args()).output()?;

        if !output.status.success() {
            return Err(BenchError::CommandFailed(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| BenchError::Parse(format!("non UTF-8 output: {}", e)))?;
        parse_smi_output(&stdout)
    }
}

impl Default for SmiProbe {
    fn default() -> Self {
        Self::new(DEFAULT_SMI_PROGRAM, 0)
    }
}

impl TelemetryProbe for SmiProbe {
    fn source(&self) -> TelemetrySource {
        TelemetrySource::NvidiaSmi
    }

    fn probe(&self) -> Option<TelemetrySnapshot> {
        match self.read() {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                log::debug!("{} probe failed: {}", self.program, e);
                None
            }
        }
    }
}

/// Parse `memory.used, memory.total, utilization.gpu` from nvidia-smi output
///
/// Only the first line is considered. Exactly three integer fields are
/// required.
pub fn parse_smi_output(text: &str) -> Result<TelemetrySnapshot> {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| BenchError::Parse("empty nvidia-smi output".to_string()))?;

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 3 {
        return Err(BenchError::Parse(format!(
            "expected 3 fields, got {}: {:?}",
            fields.len(),
            line
        )));
    }

    let parse = |s: &str| {
        s.parse::<u64>()
            .map_err(|_| BenchError::Parse(format!("invalid integer {:?} in {:?}", s, line)))
    };

    Ok(TelemetrySnapshot {
        gpu_name: None,
        mem_used_mb: parse(fields[0])?,
        mem_total_mb: parse(fields[1])?,
        gpu_load_pct: parse(fields[2])? as f64,
    })
}
