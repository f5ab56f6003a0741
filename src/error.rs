//! # Error Types Module
//!
//! Centralized error handling for the BLE companion.
//!
//! ## Error Types
//! - `AdapterError`: failures reported by a scan adapter (start/stop), tagged
//!   with an `AdapterErrorKind` so availability can be classified without
//!   relying on message text alone
//! - `WorkerError`: failures of the background scan worker itself
//! - `ConfigError`: Configuration file I/O and parsing errors
//!
//! Adapter failures never propagate to the consumer as `Err`; the worker
//! catches them and hands them over as `ScanEvent::Error`.

use std::fmt;

/// Broad category of an adapter failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterErrorKind {
    /// The process is not authorized to use Bluetooth
    PermissionDenied,
    /// The adapter exists but is powered off or not ready
    PoweredOff,
    /// No Bluetooth adapter is present
    NoAdapter,
    /// The platform or adapter does not support BLE scanning
    Unsupported,
    /// Anything else; classified from the message text
    Other,
}

/// Error surfaced by a `ScanAdapter` implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub message: String,
}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Other, message)
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AdapterErrorKind::PermissionDenied => {
                write!(f, "Bluetooth permission denied: {}", self.message)
            }
            AdapterErrorKind::PoweredOff => {
                write!(f, "Bluetooth adapter not powered: {}", self.message)
            }
            AdapterErrorKind::NoAdapter => {
                write!(f, "No Bluetooth adapter found: {}", self.message)
            }
            AdapterErrorKind::Unsupported => {
                write!(f, "Bluetooth LE not supported: {}", self.message)
            }
            AdapterErrorKind::Other => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for AdapterError {}

impl From<btleplug::Error> for AdapterError {
    fn from(err: btleplug::Error) -> Self {
        let message = err.to_string();
        match err {
            btleplug::Error::PermissionDenied => {
                AdapterError::new(AdapterErrorKind::PermissionDenied, message)
            }
            btleplug::Error::NotSupported(_) => {
                AdapterError::new(AdapterErrorKind::Unsupported, message)
            }
            _ => AdapterError::other(message),
        }
    }
}

/// Errors of the background scan worker itself
#[derive(Debug)]
pub enum WorkerError {
    /// Failed to create Tokio runtime
    RuntimeCreation(String),
    /// The worker thread is gone and can no longer take commands
    Disconnected,
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerError::RuntimeCreation(msg) => {
                write!(f, "Failed to create async runtime: {}", msg)
            }
            WorkerError::Disconnected => {
                write!(f, "Scan worker is no longer running")
            }
        }
    }
}

impl std::error::Error for WorkerError {}

impl From<WorkerError> for AdapterError {
    fn from(err: WorkerError) -> Self {
        AdapterError::other(err.to_string())
    }
}

/// Errors that can occur during configuration operations
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read config file
    ReadFailed(std::io::Error),
    /// Failed to write config file
    WriteFailed(std::io::Error),
    /// Failed to parse config file
    ParseFailed(toml::de::Error),
    /// Failed to serialize config
    SerializeFailed(toml::ser::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadFailed(e) => {
                write!(f, "Failed to read config file: {}", e)
            }
            ConfigError::WriteFailed(e) => {
                write!(f, "Failed to write config file: {}", e)
            }
            ConfigError::ParseFailed(e) => {
                write!(f, "Failed to parse config file: {}", e)
            }
            ConfigError::SerializeFailed(e) => {
                write!(f, "Failed to serialize config: {}", e)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadFailed(e) => Some(e),
            ConfigError::WriteFailed(e) => Some(e),
            ConfigError::ParseFailed(e) => Some(e),
            ConfigError::SerializeFailed(e) => Some(e),
        }
    }
}
