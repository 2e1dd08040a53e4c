// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Benchmark result rows and their CSV form
//!
//! A [`ResultTable`] holds one [`ResultRow`] per question in input order. It
//! is written once, after the run, with a header derived from the first row's
//! field names. Missing telemetry is written as an empty field and read back
//! as `None`.

use crate::endpoint::is_error_answer;
use crate::telemetry::GpuReadings;
use crate::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Column names in output order
pub const COLUMNS: [&str; 11] = [
    "question",
    "answer",
    "inference_time_sec",
    "nvml_mem_start_MB",
    "nvml_mem_end_MB",
    "nvml_load_start_pct",
    "nvml_load_end_pct",
    "nvsmi_mem_start_MB",
    "nvsmi_mem_end_MB",
    "nvsmi_load_start_pct",
    "nvsmi_load_end_pct",
];

/// Outcome of one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Question text
    pub question: String,
    /// Answer text, or an `Error: ...` marker
    pub answer: String,
    /// Request round-trip time in seconds
    pub inference_time_sec: f64,

    /// NVML memory used before the request (MiB)
    #[serde(rename = "nvml_mem_start_MB")]
    pub nvml_mem_start_mb: Option<u64>,
    /// NVML memory used after the request (MiB)
    #[serde(rename = "nvml_mem_end_MB")]
    pub nvml_mem_end_mb: Option<u64>,
    /// NVML load before the request (%)
    pub nvml_load_start_pct: Option<f64>,
    /// NVML load after the request (%)
    pub nvml_load_end_pct: Option<f64>,

    /// nvidia-smi memory used before the request (MiB)
    #[serde(rename = "nvsmi_mem_start_MB")]
    pub nvsmi_mem_start_mb: Option<u64>,
    /// nvidia-smi memory used after the request (MiB)
    #[serde(rename = "nvsmi_mem_end_MB")]
    pub nvsmi_mem_end_mb: Option<u64>,
    /// nvidia-smi load before the request (%)
    pub nvsmi_load_start_pct: Option<f64>,
    /// nvidia-smi load after the request (%)
    pub nvsmi_load_end_pct: Option<f64>,
}

impl ResultRow {
    /// Compose a row from a finished request and the readings around it
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        inference_time_sec: f64,
        before: &GpuReadings,
        after: &GpuReadings,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            inference_time_sec: inference_time_sec.max(0.0),
            nvml_mem_start_mb: before.nvml_mem_used(),
            nvml_mem_end_mb: after.nvml_mem_used(),
            nvml_load_start_pct: before.nvml_load(),
            nvml_load_end_pct: after.nvml_load(),
            nvsmi_mem_start_mb: before.nvsmi_mem_used(),
            nvsmi_mem_end_mb: after.nvsmi_mem_used(),
            nvsmi_load_start_pct: before.nvsmi_load(),
            nvsmi_load_end_pct: after.nvsmi_load(),
        }
    }

    /// Whether the answer column holds an error marker
    pub fn is_error(&self) -> bool {
        is_error_answer(&self.answer)
    }
}

/// Ordered result rows of one benchmark run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<ResultRow>,
}

impl ResultTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row
    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    /// Rows in insertion order
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows whose answer is an error marker
    pub fn error_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_error()).count()
    }

    /// Write the table as CSV to `path`
    ///
    /// Fails with [`BenchError::EmptyResults`] before touching the file if
    /// there are no rows.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if self.is_empty() {
            return Err(BenchError::EmptyResults);
        }
        let file = File::create(path.as_ref())?;
        self.write_to(file)
    }

    /// Write the table as CSV to any writer
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        if self.is_empty() {
            return Err(BenchError::EmptyResults);
        }
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Read a table previously written with [`ResultTable::write_csv`]
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::read_from(file)
    }

    /// Read a table from any CSV reader
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut table = Self::new();
        for record in csv_reader.deserialize() {
            table.push(record?);
        }
        Ok(table)
    }
}

impl FromIterator<ResultRow> for ResultTable {
    fn from_iter<I: IntoIterator<Item = ResultRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a ResultRow;
    type IntoIter = std::slice::Iter<'a, ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TelemetrySnapshot;

    fn readings(nvml: Option<u64>, nvsmi: Option<u64>) -> GpuReadings {
        let snap = |used: u64| TelemetrySnapshot {
            gpu_name: Some("Test GPU".into()),
            mem_used_mb: used,
            mem_total_mb: 8192,
            gpu_load_pct: 12.5,
        };
        GpuReadings {
            nvml: nvml.map(snap),
            nvsmi: nvsmi.map(snap),
        }
    }

    fn sample_table() -> ResultTable {
        let mut table = ResultTable::new();
        table.push(ResultRow::new(
            "What is a waterfall model?",
            "A linear, sequential approach, with \"phases\".",
            11.304,
            &readings(Some(3642), Some(3640)),
            &readings(Some(3730), Some(3731)),
        ));
        table.push(ResultRow::new(
            "What are the phases in SCRUM?",
            "Error: 500",
            0.25,
            &readings(None, Some(3700)),
            &readings(None, None),
        ));
        table
    }

    #[test]
    fn test_row_from_readings() {
        let row = ResultRow::new(
            "Q1",
            "A1",
            1.5,
            &readings(Some(100), None),
            &readings(Some(200), Some(210)),
        );
        assert_eq!(row.nvml_mem_start_mb, Some(100));
        assert_eq!(row.nvml_mem_end_mb, Some(200));
        assert_eq!(row.nvml_load_start_pct, Some(12.5));
        assert_eq!(row.nvsmi_mem_start_mb, None);
        assert_eq!(row.nvsmi_load_start_pct, None);
        assert_eq!(row.nvsmi_mem_end_mb, Some(210));
        assert!(!row.is_error());
    }

    #[test]
    fn test_write_empty_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let err = ResultTable::new().write_csv(&path).unwrap_err();
        assert!(matches!(err, BenchError::EmptyResults));
        assert!(!path.exists());
    }

    #[test]
    fn test_header_and_null_fields() {
        let mut buf = Vec::new();
        sample_table().write_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next().unwrap(), COLUMNS.join(","));
        lines.next();
        let error_line = lines.next().unwrap();
        assert!(error_line.starts_with("What are the phases in SCRUM?,Error: 500,0.25,,,,,3700,,12.5,"));
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline_results.csv");
        let table = sample_table();
        table.write_csv(&path).unwrap();

        let read_back = ResultTable::read_csv(&path).unwrap();
        assert_eq!(read_back, table);
        assert_eq!(read_back.len(), 2);
        assert_eq!(read_back.error_count(), 1);
        assert_eq!(read_back.rows()[0].question, "What is a waterfall model?");
    }

    #[test]
    fn test_negative_elapsed_clamped() {
        let row = ResultRow::new("Q", "A", -0.1, &GpuReadings::default(), &GpuReadings::default());
        assert_eq!(row.inference_time_sec, 0.0);
    }
}
