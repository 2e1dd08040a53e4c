// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Benchmark configuration
//!
//! Loaded from TOML; every field has a default so a partial file works.
//! Command-line flags override file values in the binary.

use crate::telemetry::DEFAULT_SMI_PROGRAM;
use crate::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Endpoint the original RAG server listens on
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000/ask";

/// Default CSV output path
pub const DEFAULT_OUTPUT: &str = "baseline_results.csv";

/// Built-in question list
pub const DEFAULT_QUESTIONS: [&str; 5] = [
    "What is a waterfall model?",
    "What are the phases in SCRUM?",
    "What is the objective of prototyping?",
    "What are the stages in Testing?",
    "What is the importance of software engineering?",
];

/// Benchmark run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Endpoint receiving `POST {"question": ...}`
    pub server_url: String,
    /// Questions, asked in this order
    pub questions: Vec<String>,
    /// CSV output path
    pub output: PathBuf,
    /// Per-request timeout; unset waits forever
    pub request_timeout_secs: Option<u64>,
    /// Abort the run on a transport error instead of recording an error row
    pub fail_fast: bool,
    /// GPU index both probes read
    pub device_index: u32,
    /// nvidia-smi executable
    pub smi_program: String,
    /// Write `<output>.meta.json` next to the CSV
    pub write_metadata: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            questions: DEFAULT_QUESTIONS.iter().map(|q| q.to_string()).collect(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            request_timeout_secs: None,
            fail_fast: false,
            device_index: 0,
            smi_program: DEFAULT_SMI_PROGRAM.into(),
            write_metadata: true,
        }
    }
}

impl BenchConfig {
    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BenchError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| BenchError::Configuration(format!("TOML parse error: {}", e)))
    }

    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Path of the JSON metadata sidecar
    pub fn metadata_path(&self) -> PathBuf {
        let mut name = self.output.as_os_str().to_owned();
        name.push(".meta.json");
        PathBuf::from(name)
    }

    /// Generate sample config
    pub fn sample_toml() -> String {
        r#"# RAG Bench Configuration
server_url = "http://127.0.0.1:8000/ask"
output = "baseline_results.csv"
# request_timeout_secs = 600
fail_fast = false
device_index = 0
smi_program = "nvidia-smi"
write_metadata = true

questions = [
    "What is a waterfall model?",
    "What are the phases in SCRUM?",
    "What is the objective of prototyping?",
    "What are the stages in Testing?",
    "What is the importance of software engineering?",
]
"#
        .into()
    }
}

/// Read questions from a text file, one per line
///
/// Blank lines and lines starting with `#` are skipped.
pub fn load_questions<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    Ok(parse_questions(&content))
}

/// Parse a question list, one per line
pub fn parse_questions(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}
