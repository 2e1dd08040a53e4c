// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! GPU telemetry probes
//!
//! Two independent sources report GPU memory and utilization in a common
//! shape:
//! - [`NvmlProbe`]: in-process NVML binding (first device by default)
//! - [`SmiProbe`]: the `nvidia-smi` command-line utility
//!
//! A probe never fails loudly. Any error (no device, missing library or
//! tool, malformed output) is logged at debug level and reported as `None`,
//! so "unknown" stays distinguishable from "zero MB used".
//!
//! # Examples
//!
//! ```no_run
//! use ragbench::telemetry::{probe_via_external_tool, probe_via_library};
//!
//! match probe_via_library() {
//!     Some(s) => println!("NVML: {} / {} MB", s.mem_used_mb, s.mem_total_mb),
//!     None => println!("NVML: unavailable"),
//! }
//! if let Some(s) = probe_via_external_tool() {
//!     println!("nvidia-smi: {:.0}% load", s.gpu_load_pct);
//! }
//! ```

mod nvml;
mod smi;

pub use nvml::{LibraryReading, NvmlProbe};
pub use smi::{parse_smi_output, SmiProbe, DEFAULT_SMI_PROGRAM, SMI_QUERY};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bytes per MiB, the unit both sources report memory in
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Where a snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetrySource {
    /// In-process NVML binding
    Nvml,
    /// `nvidia-smi` command-line utility
    NvidiaSmi,
}

impl TelemetrySource {
    /// Column prefix used in result tables
    pub fn column_prefix(&self) -> &'static str {
        match self {
            TelemetrySource::Nvml => "nvml",
            TelemetrySource::NvidiaSmi => "nvsmi",
        }
    }
}

impl fmt::Display for TelemetrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetrySource::Nvml => write!(f, "NVML"),
            TelemetrySource::NvidiaSmi => write!(f, "nvidia-smi"),
        }
    }
}

/// A point-in-time GPU memory and utilization reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Device name (only reported by the library source)
    pub gpu_name: Option<String>,
    /// Memory in use (MiB)
    #[serde(rename = "mem_used_MB")]
    pub mem_used_mb: u64,
    /// Total memory (MiB)
    #[serde(rename = "mem_total_MB")]
    pub mem_total_mb: u64,
    /// GPU utilization percentage (0-100)
    pub gpu_load_pct: f64,
}

/// A source of GPU telemetry
///
/// Implementations must not panic and must not propagate errors: a failed
/// reading is `None`.
pub trait TelemetryProbe {
    /// Which source this probe reads from
    fn source(&self) -> TelemetrySource;

    /// Take a fresh reading
    fn probe(&self) -> Option<TelemetrySnapshot>;
}

/// Readings from both sources taken at the same point of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuReadings {
    /// Library (NVML) reading
    pub nvml: Option<TelemetrySnapshot>,
    /// External tool (nvidia-smi) reading
    pub nvsmi: Option<TelemetrySnapshot>,
}

impl GpuReadings {
    /// Memory in use from the library source, if available
    pub fn nvml_mem_used(&self) -> Option<u64> {
        self.nvml.as_ref().map(|s| s.mem_used_mb)
    }

    /// Load from the library source, if available
    pub fn nvml_load(&self) -> Option<f64> {
        self.nvml.as_ref().map(|s| s.gpu_load_pct)
    }

    /// Memory in use from the external tool, if available
    pub fn nvsmi_mem_used(&self) -> Option<u64> {
        self.nvsmi.as_ref().map(|s| s.mem_used_mb)
    }

    /// Load from the external tool, if available
    pub fn nvsmi_load(&self) -> Option<f64> {
        self.nvsmi.as_ref().map(|s| s.gpu_load_pct)
    }

    /// Device name, if the library source reported one
    pub fn gpu_name(&self) -> Option<&str> {
        self.nvml.as_ref().and_then(|s| s.gpu_name.as_deref())
    }
}

/// Both telemetry probes, always sampled together
///
/// There is no fallback between the two: a failure of one source never
/// substitutes the other's reading.
pub struct ProbeSet {
    library: Box<dyn TelemetryProbe>,
    external: Box<dyn TelemetryProbe>,
}

impl ProbeSet {
    /// Build from explicit probes
    pub fn new(library: Box<dyn TelemetryProbe>, external: Box<dyn TelemetryProbe>) -> Self {
        Self { library, external }
    }

    /// NVML and nvidia-smi probes for the given device index
    pub fn for_device(device_index: u32, smi_program: &str) -> Self {
        Self::new(
            Box::new(NvmlProbe::new(device_index)),
            Box::new(SmiProbe::new(smi_program, device_index)),
        )
    }

    /// Sample both sources
    pub fn sample(&self) -> GpuReadings {
        GpuReadings {
            nvml: self.library.probe(),
            nvsmi: self.external.probe(),
        }
    }
}

impl Default for ProbeSet {
    fn default() -> Self {
        Self::for_device(0, DEFAULT_SMI_PROGRAM)
    }
}

/// Read the first GPU through the NVML binding
pub fn probe_via_library() -> Option<TelemetrySnapshot> {
    NvmlProbe::new(0).probe()
}

/// Read the default GPU through `nvidia-smi`
pub fn probe_via_external_tool() -> Option<TelemetrySnapshot> {
    SmiProbe::default().probe()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe {
        source: TelemetrySource,
        reading: Option<TelemetrySnapshot>,
    }

    impl TelemetryProbe for FixedProbe {
        fn source(&self) -> TelemetrySource {
            self.source
        }

        fn probe(&self) -> Option<TelemetrySnapshot> {
            self.reading.clone()
        }
    }

    fn snapshot(used: u64) -> TelemetrySnapshot {
        TelemetrySnapshot {
            gpu_name: Some("Test GPU".into()),
            mem_used_mb: used,
            mem_total_mb: 8192,
            gpu_load_pct: 42.0,
        }
    }

    #[test]
    fn test_probe_set_has_no_fallback() {
        let set = ProbeSet::new(
            Box::new(FixedProbe {
                source: TelemetrySource::Nvml,
                reading: None,
            }),
            Box::new(FixedProbe {
                source: TelemetrySource::NvidiaSmi,
                reading: Some(snapshot(1000)),
            }),
        );

        let readings = set.sample();
        assert!(readings.nvml.is_none());
        assert_eq!(readings.nvsmi_mem_used(), Some(1000));
        assert_eq!(readings.nvml_mem_used(), None);
        assert_eq!(readings.nvml_load(), None);
    }

    #[test]
    fn test_gpu_readings_accessors() {
        let readings = GpuReadings {
            nvml: Some(snapshot(3642)),
            nvsmi: None,
        };
        assert_eq!(readings.nvml_mem_used(), Some(3642));
        assert_eq!(readings.nvml_load(), Some(42.0));
        assert_eq!(readings.gpu_name(), Some("Test GPU"));
        assert_eq!(readings.nvsmi_load(), None);
    }

    #[test]
    fn test_snapshot_serde_field_names() {
        let json = serde_json::to_value(snapshot(10)).unwrap();
        assert_eq!(json["mem_used_MB"], 10);
        assert_eq!(json["mem_total_MB"], 8192);
        assert_eq!(json["gpu_load_pct"], 42.0);
    }

    #[test]
    fn test_source_prefix_and_display() {
        assert_eq!(TelemetrySource::Nvml.column_prefix(), "nvml");
        assert_eq!(TelemetrySource::NvidiaSmi.column_prefix(), "nvsmi");
        assert_eq!(TelemetrySource::NvidiaSmi.to_string(), "nvidia-smi");
    }
}
