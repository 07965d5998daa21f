//! # Report Error Types Module
//!
//! This module defines custom error types used throughout the report pipeline.
//! It provides structured error handling for lookup and storage failure modes.

/// Custom error types for report generation and persistence
#[derive(Debug, Clone)]
pub enum ReportError {
    /// The injected vacancy lookup failed (network, timeout, bad payload)
    Lookup(String),
    /// The report could not be written to disk
    Storage(String),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Lookup(msg) => write!(f, "Lookup error: {msg}"),
            ReportError::Storage(msg) => write!(f, "Storage error: {msg}"),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Storage(err.to_string())
    }
}
