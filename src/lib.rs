// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! RAG Bench: latency and GPU memory benchmarking for question-answering
//! endpoints
//!
//! Sends a fixed list of questions to a retrieval-augmented generation server,
//! times every round trip, samples GPU memory and utilization before and after
//! each request from two independent sources (NVML and `nvidia-smi`), and
//! writes one CSV row per question once the run is over.
//!
//! # Examples
//!
//! ```no_run
//! use ragbench::{BenchConfig, BenchmarkRunner, HttpEndpoint, ProbeSet};
//!
//! # fn main() -> ragbench::Result<()> {
//! let config = BenchConfig::default();
//! let endpoint = HttpEndpoint::new(config.server_url.clone(), config.request_timeout())?;
//! let probes = ProbeSet::for_device(config.device_index, &config.smi_program);
//!
//! let report = BenchmarkRunner::new(endpoint, probes).run(&config.questions)?;
//! report.write(&config.output, None)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod endpoint;
pub mod error;
pub mod results;
pub mod runner;
pub mod summary;
pub mod telemetry;

pub use config::BenchConfig;
pub use endpoint::{AskEndpoint, EndpointReply, HttpEndpoint};
pub use error::{BenchError, Result};
pub use results::{ResultRow, ResultTable};
pub use runner::{format_progress, BenchmarkReport, BenchmarkRunner, RunMetadata};
pub use summary::{RunSpec, RunSummary};
pub use telemetry::{
    probe_via_external_tool, probe_via_library, GpuReadings, ProbeSet, TelemetryProbe,
    TelemetrySnapshot, TelemetrySource,
};
