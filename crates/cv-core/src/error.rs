//! # AppError
//!
//! Centralized error handling for the Civitas crates.
//! Storage failures never surface here: the binding layer degrades them.

use thiserror::Error;

/// The primary error type for all cv-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Validation failure (e.g., unknown category name)
    #[error("validation error: {0}")]
    Validation(String),

    /// The model produced no usable output
    #[error("generation failed: {0}")]
    Generation(String),

    /// An AI backend could not be reached or rejected the request
    #[error("backend error: {0}")]
    Backend(String),
}

/// A specialized Result type for Civitas logic.
pub type Result<T> = std::result::Result<T, AppError>;
