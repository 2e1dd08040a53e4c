// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Aggregate figures for comparing benchmark runs
//!
//! Typical use is comparing several runs of the same question set against
//! differently configured servers (for example 4-, 8-, 16- and 32-bit
//! quantization): average latency next to GPU memory before and after.
//! Means only consider rows where the value is present.

use crate::results::{ResultRow, ResultTable};
use crate::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Per-source memory and load means
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySummary {
    pub mem_before_mb: Option<f64>,
    pub mem_after_mb: Option<f64>,
    pub load_before_pct: Option<f64>,
    pub load_after_pct: Option<f64>,
}

impl TelemetrySummary {
    /// Mean memory growth across the request, when both ends are known
    pub fn mem_delta_mb(&self) -> Option<f64> {
        match (self.mem_before_mb, self.mem_after_mb) {
            (Some(before), Some(after)) => Some(after - before),
            _ => None,
        }
    }
}

/// Summary of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub label: String,
    pub rows: usize,
    pub errors: usize,
    pub mean_time_sec: Option<f64>,
    pub median_time_sec: Option<f64>,
    pub min_time_sec: Option<f64>,
    pub max_time_sec: Option<f64>,
    pub nvml: TelemetrySummary,
    pub nvsmi: TelemetrySummary,
}

impl RunSummary {
    /// Summarize a result table
    ///
    /// Latency figures cover every row, error rows included, because the
    /// timer covers failed round trips as well.
    pub fn from_table(label: impl Into<String>, table: &ResultTable) -> Self {
        let rows = table.rows();
        let mut times: Vec<f64> = rows.iter().map(|r| r.inference_time_sec).collect();
        times.sort_by(|a, b| a.total_cmp(b));

        Self {
            label: label.into(),
            rows: rows.len(),
            errors: table.error_count(),
            mean_time_sec: mean(times.iter().copied()),
            median_time_sec: median(&times),
            min_time_sec: times.first().copied(),
            max_time_sec: times.last().copied(),
            nvml: TelemetrySummary {
                mem_before_mb: mean_mb(rows, |r| r.nvml_mem_start_mb),
                mem_after_mb: mean_mb(rows, |r| r.nvml_mem_end_mb),
                load_before_pct: mean_pct(rows, |r| r.nvml_load_start_pct),
                load_after_pct: mean_pct(rows, |r| r.nvml_load_end_pct),
            },
            nvsmi: TelemetrySummary {
                mem_before_mb: mean_mb(rows, |r| r.nvsmi_mem_start_mb),
                mem_after_mb: mean_mb(rows, |r| r.nvsmi_mem_end_mb),
                load_before_pct: mean_pct(rows, |r| r.nvsmi_load_start_pct),
                load_after_pct: mean_pct(rows, |r| r.nvsmi_load_end_pct),
            },
        }
    }

    /// Read a CSV written by a run and summarize it
    pub fn from_csv<P: AsRef<Path>>(label: impl Into<String>, path: P) -> Result<Self> {
        let table = ResultTable::read_csv(path)?;
        Ok(Self::from_table(label, &table))
    }
}

/// A labeled result file given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub label: String,
    pub path: PathBuf,
}

impl RunSpec {
    /// Parse `LABEL=PATH`, or a bare path labeled by its file stem
    pub fn parse(arg: &str) -> Result<Self> {
        if let Some((label, path)) = arg.split_once('=') {
            if label.is_empty() || path.is_empty() {
                return Err(BenchError::Parse(format!(
                    "Expected LABEL=PATH, got {:?}",
                    arg
                )));
            }
            return Ok(Self {
                label: label.to_string(),
                path: PathBuf::from(path),
            });
        }

        let path = PathBuf::from(arg);
        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BenchError::Parse(format!("Cannot derive a label from {:?}", arg)))?;
        Ok(Self { label, path })
    }
}

/// Render summaries as an aligned text table
pub fn format_table(summaries: &[RunSummary]) -> String {
    let width = summaries
        .iter()
        .map(|s| s.label.len())
        .max()
        .unwrap_or(0)
        .max("Run".len());

    let mut out = format!(
        "{:<width$}  {:>5}  {:>6}  {:>10}  {:>10}  {:>12}  {:>12}  {:>10}\n",
        "Run",
        "Rows",
        "Errors",
        "Avg (s)",
        "Median (s)",
        "Mem before",
        "Mem after",
        "Delta",
        width = width
    );

    for s in summaries {
        // nvidia-smi figures first, NVML when the tool was unavailable
        let telemetry = if s.nvsmi.mem_before_mb.is_some() || s.nvsmi.mem_after_mb.is_some() {
            &s.nvsmi
        } else {
            &s.nvml
        };
        out.push_str(&format!(
            "{:<width$}  {:>5}  {:>6}  {:>10}  {:>10}  {:>12}  {:>12}  {:>10}\n",
            s.label,
            s.rows,
            s.errors,
            fmt_opt(s.mean_time_sec, 2),
            fmt_opt(s.median_time_sec, 2),
            fmt_mb(telemetry.mem_before_mb),
            fmt_mb(telemetry.mem_after_mb),
            fmt_mb(telemetry.mem_delta_mb()),
            width = width
        ));
    }

    out
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.*}", precision, v))
}

fn fmt_mb(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.0} MB", v))
}

fn mean_mb(rows: &[ResultRow], field: impl Fn(&ResultRow) -> Option<u64>) -> Option<f64> {
    mean(rows.iter().filter_map(|r| field(r)).map(|v| v as f64))
}

fn mean_pct(rows: &[ResultRow], field: impl Fn(&ResultRow) -> Option<f64>) -> Option<f64> {
    mean(rows.iter().filter_map(|r| field(r)))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}
