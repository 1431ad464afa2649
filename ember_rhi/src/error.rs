//! Error types for the Ember RHI
//!
//! This module defines the error types used throughout the RHI layer,
//! including backend failures, buffer pack configuration and render graph
//! contract violations.

use std::fmt;

/// Result type for Ember RHI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ember RHI errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (Vulkan, wgpu)
    BackendError(String),

    /// Out of GPU memory, or a fixed-size region is exhausted
    OutOfMemory,

    /// Invalid resource (texture, buffer, layout, etc.)
    InvalidResource(String),

    /// Initialization failed (device, backend, subsystems)
    InitializationFailed(String),

    /// Buffer pack configuration could not be parsed or resolved
    InvalidConfig(String),

    /// Malformed render graph or descriptor (programming error)
    ContractViolation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::ContractViolation(msg) => write!(f, "Contract violation: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
