// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Benchmark runner
//!
//! One linear pass over the question list. For each question:
//! 1. sample both telemetry sources ("before")
//! 2. time the request round trip, and only the round trip
//! 3. sample both telemetry sources ("after")
//! 4. derive the answer text from the reply
//! 5. append a row and report progress
//!
//! Nothing is written until every question has been asked, so an interrupted
//! run leaves no partial CSV behind. There are no retries.

use crate::endpoint::{answer_from_reply, answer_from_transport_error, AskEndpoint};
use crate::results::{ResultRow, ResultTable};
use crate::telemetry::ProbeSet;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::time::Instant;

/// Facts about a run that do not fit the per-question table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// When the first question was sent
    pub started_at: DateTime<Utc>,
    /// When the last row was recorded
    pub finished_at: DateTime<Utc>,
    /// Host the harness ran on
    pub host: Option<String>,
    /// Endpoint under test
    pub server_url: String,
    /// Number of questions asked
    pub question_count: usize,
    /// Rows whose answer is an error marker
    pub error_count: usize,
    /// First device name reported by the library probe
    pub gpu_name: Option<String>,
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub table: ResultTable,
    pub metadata: RunMetadata,
}

impl BenchmarkReport {
    /// Write the CSV table and, optionally, the JSON metadata sidecar
    pub fn write<P: AsRef<Path>>(&self, csv_path: P, metadata_path: Option<&Path>) -> Result<()> {
        self.table.write_csv(csv_path)?;
        if let Some(path) = metadata_path {
            let file = File::create(path)?;
            serde_json::to_writer_pretty(file, &self.metadata)?;
        }
        Ok(())
    }
}

/// Drives one synchronous measurement per question
pub struct BenchmarkRunner<E: AskEndpoint> {
    endpoint: E,
    probes: ProbeSet,
    fail_fast: bool,
}

impl<E: AskEndpoint> BenchmarkRunner<E> {
    /// Create a runner; transport errors are recorded as error rows
    pub fn new(endpoint: E, probes: ProbeSet) -> Self {
        Self {
            endpoint,
            probes,
            fail_fast: false,
        }
    }

    /// Abort the whole run on the first transport error
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Endpoint being measured
    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    /// Measure a single question
    pub fn measure(&self, question: &str) -> Result<ResultRow> {
        Ok(self.measure_with_readings(question)?.0)
    }

    fn measure_with_readings(&self, question: &str) -> Result<(ResultRow, Option<String>)> {
        let before = self.probes.sample();

        let start = Instant::now();
        let outcome = self.endpoint.ask(question);
        let elapsed = start.elapsed().as_secs_f64();

        let after = self.probes.sample();

        let answer = match outcome {
            Ok(reply) => {
                if reply.status != 200 {
                    log::warn!("{:?} -> HTTP {}", question, reply.status);
                }
                answer_from_reply(&reply)
            }
            Err(e) if self.fail_fast => return Err(e),
            Err(e) => {
                log::warn!("{:?} -> request failed: {}", question, e);
                answer_from_transport_error(&e)
            }
        };

        let gpu_name = before
            .gpu_name()
            .or_else(|| after.gpu_name())
            .map(str::to_string);
        let row = ResultRow::new(question, answer, elapsed, &before, &after);
        Ok((row, gpu_name))
    }

    /// Ask every question in order, logging progress at info level
    pub fn run<S: AsRef<str>>(&self, questions: &[S]) -> Result<BenchmarkReport> {
        self.run_with_progress(questions, |row| log::info!("{}", format_progress(row)))
    }

    /// Ask every question in order, calling `on_row` after each one
    pub fn run_with_progress<S, F>(&self, questions: &[S], mut on_row: F) -> Result<BenchmarkReport>
    where
        S: AsRef<str>,
        F: FnMut(&ResultRow),
    {
        log::info!(
            "Benchmarking {} question(s) against {}",
            questions.len(),
            self.endpoint.url()
        );

        let started_at = Utc::now();
        let mut table = ResultTable::new();
        let mut gpu_name = None;

        for question in questions {
            let (row, name) = self.measure_with_readings(question.as_ref())?;
            if gpu_name.is_none() {
                gpu_name = name;
            }
            on_row(&row);
            table.push(row);
        }

        let metadata = RunMetadata {
            started_at,
            finished_at: Utc::now(),
            host: hostname::get()
                .ok()
                .map(|h| h.to_string_lossy().into_owned()),
            server_url: self.endpoint.url().to_string(),
            question_count: table.len(),
            error_count: table.error_count(),
            gpu_name,
        };

        log::info!(
            "Run complete: {} row(s), {} error(s)",
            metadata.question_count,
            metadata.error_count
        );

        Ok(BenchmarkReport { table, metadata })
    }
}

/// One-line operator progress message; `-` marks a missing reading
pub fn format_progress(row: &ResultRow) -> String {
    format!(
        "Answered: {} | Time: {:.2}s | NVML Mem: {} -> {} MB | nvidia-smi Mem: {} -> {} MB",
        row.question,
        row.inference_time_sec,
        or_dash(row.nvml_mem_start_mb),
        or_dash(row.nvml_mem_end_mb),
        or_dash(row.nvsmi_mem_start_mb),
        or_dash(row.nvsmi_mem_end_mb),
    )
}

fn or_dash(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
