//! Error types for the Xover synthesis engine.
//!
//! This module provides a unified error type [`XoverError`] covering every
//! failure the engine reports: invalid physical inputs, missing parameters,
//! registry misses, unsupported filter orders, and the file/config errors of
//! the front ends.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`XoverError`].
pub type Result<T> = std::result::Result<T, XoverError>;

/// Unified error type for all Xover operations.
#[derive(Error, Debug)]
pub enum XoverError {
    // ============ Domain Errors ============
    /// A value is non-positive, non-finite, or otherwise unusable
    #[error("Invalid argument '{param}': {message}")]
    InvalidArgument { param: String, message: String },

    /// A required parameter is absent from the input set
    #[error("Missing required parameter '{param}' for {context}")]
    MissingParameter { param: String, context: String },

    /// Topology name not present in the registry
    #[error("Unknown topology '{name}'")]
    UnknownTopology { name: String },

    /// No coefficient table entry for the requested filter order
    #[error("Filter order {order} is not supported for {alignment} alignment (use 1-4)")]
    UnsupportedOrder { order: i64, alignment: String },

    // ============ I/O Errors ============
    /// Error reading a driver or configuration file
    #[error("Failed to read file '{path}': {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error decoding a driver or configuration file
    #[error("Failed to parse '{path}': {message}")]
    ConfigParse { path: PathBuf, message: String },

    // ============ WASM Errors ============
    /// WASM-specific error
    #[cfg(feature = "wasm")]
    #[error("WASM error: {message}")]
    WasmError { message: String },
}

impl XoverError {
    /// Create an invalid argument error
    pub fn invalid(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a missing parameter error
    pub fn missing(param: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingParameter {
            param: param.into(),
            context: context.into(),
        }
    }

    /// Create an unsupported order error
    pub fn unsupported_order(order: i64, alignment: impl Into<String>) -> Self {
        Self::UnsupportedOrder {
            order,
            alignment: alignment.into(),
        }
    }
}

/// Reject values that are not strictly positive and finite.
pub(crate) fn ensure_positive(param: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(XoverError::invalid(
            param,
            format!("must be positive and finite, got {value}"),
        ))
    }
}

/// Reject values that are negative or non-finite.
pub(crate) fn ensure_non_negative(param: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(XoverError::invalid(
            param,
            format!("must be non-negative and finite, got {value}"),
        ))
    }
}
