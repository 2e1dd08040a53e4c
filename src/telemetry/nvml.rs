// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! NVML telemetry source
//!
//! The NVML handle is initialized once when the probe is built and reused for
//! every reading. If initialization fails (no driver, no library, or the crate
//! was built without the `nvidia` feature) the probe stays uninitialized and
//! every reading is `None`.

use super::{TelemetryProbe, TelemetrySnapshot, TelemetrySource, BYTES_PER_MB};

#[cfg(feature = "nvidia")]
use nvml_wrapper::Nvml;

/// Raw reading as the library reports it, before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryReading {
    /// Device name
    pub name: Option<String>,
    /// Memory in use (bytes)
    pub memory_used_bytes: u64,
    /// Total memory (bytes)
    pub memory_total_bytes: u64,
    /// Utilization as a 0-1 fraction
    pub load_fraction: f64,
}

impl LibraryReading {
    /// Convert to the common snapshot shape (MiB, percent)
    pub fn normalize(self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            gpu_name: self.name,
            mem_used_mb: self.memory_used_bytes / BYTES_PER_MB,
            mem_total_mb: self.memory_total_bytes / BYTES_PER_MB,
            gpu_load_pct: (self.load_fraction * 100.0).clamp(0.0, 100.0),
        }
    }
}

/// Telemetry probe backed by the NVML library binding
pub struct NvmlProbe {
    device_index: u32,
    #[cfg(feature = "nvidia")]
    nvml: Option<Nvml>,
}

impl NvmlProbe {
    /// Initialize NVML and bind to the given device index
    #[cfg(feature = "nvidia")]
    pub fn new(device_index: u32) -> Self {
        let nvml = match Nvml::init() {
            Ok(nvml) => Some(nvml),
            Err(e) => {
                log::debug!("NVML initialization failed: {}", e);
                None
            }
        };
        Self { device_index, nvml }
    }

    /// Build an uninitialized probe (crate built without NVML support)
    #[cfg(not(feature = "nvidia"))]
    pub fn new(device_index: u32) -> Self {
        log::debug!("NVML probe disabled: built without the `nvidia` feature");
        Self { device_index }
    }

    /// Whether the library handle is available
    pub fn is_initialized(&self) -> bool {
        #[cfg(feature = "nvidia")]
        {
            self.nvml.is_some()
        }
        #[cfg(not(feature = "nvidia"))]
        {
            false
        }
    }

    /// Device index this probe reads
    pub fn device_index(&self) -> u32 {
        self.device_index
    }

    #[cfg(feature = "nvidia")]
    fn read(&self) -> crate::Result<LibraryReading> {
        let nvml = self.nvml.as_ref().ok_or_else(|| {
            crate::BenchError::FeatureNotAvailable("NVML not initialized".to_string())
        })?;
        let device = nvml.device_by_index(self.device_index)?;
        let name = device.name().ok();
        let memory = device.memory_info()?;
        let utilization = device.utilization_rates()?;

        Ok(LibraryReading {
            name,
            memory_used_bytes: memory.used,
            memory_total_bytes: memory.total,
            load_fraction: utilization.gpu as f64 / 100.0,
        })
    }

    #[cfg(not(feature = "nvidia"))]
    fn read(&self) -> crate::Result<LibraryReading> {
        Err(crate::BenchError::FeatureNotAvailable(
            "NVML support not compiled in".to_string(),
        ))
    }
}

impl TelemetryProbe for NvmlProbe {
    fn source(&self) -> TelemetrySource {
        TelemetrySource::Nvml
    }

    fn probe(&self) -> Option<TelemetrySnapshot> {
        match self.read() {
            Ok(reading) => Some(reading.normalize()),
            Err(e) => {
                log::debug!("NVML probe (device {}) failed: {}", self.device_index, e);
                None
            }
        }
    }
}
