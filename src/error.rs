//! Error types for RAG Bench

use std::io;
use thiserror::Error;

/// Result type alias for benchmark operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Main error type for RAG Bench
#[derive(Error, Debug)]
pub enum BenchError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// NVML error
    #[cfg(feature = "nvidia")]
    #[error("NVML error: {0}")]
    Nvml(#[from] nvml_wrapper::error::NvmlError),

    /// HTTP transport error (connection refused, DNS, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Device not found
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Feature not available
    #[error("Feature not available: {0}")]
    FeatureNotAvailable(String),

    /// Command failed
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No rows to write, so no header can be derived
    #[error("No results to write: the result table is empty")]
    EmptyResults,

    /// Other error
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_parse() {
        let err = BenchError::Parse("bad value".to_string());
        assert_eq!(err.to_string(), "Parse error: bad value");
    }

    #[test]
    fn test_error_display_device_not_found() {
        let err = BenchError::DeviceNotFound("GPU 0".to_string());
        assert_eq!(err.to_string(), "Device not found: GPU 0");
    }

    #[test]
    fn test_error_display_command_failed() {
        let err = BenchError::CommandFailed("nvidia-smi exited with 9".to_string());
        assert_eq!(err.to_string(), "Command failed: nvidia-smi exited with 9");
    }

    #[test]
    fn test_error_empty_results() {
        assert!(BenchError::EmptyResults.to_string().contains("empty"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file missing");
        let err: BenchError = io_err.into();
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ invalid json }}}").unwrap_err();
        let err: BenchError = json_err.into();
        assert!(err.to_string().contains("JSON error"));
    }

    #[test]
    fn test_error_other() {
        let err = BenchError::Other("misc error".to_string());
        assert_eq!(err.to_string(), "misc error");
    }
}
