//! Error handling for the apivet validation library.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. The first group of variants is
//! the failure taxonomy of a single submission; every one of them ends up in the
//! same `API validation failed` response, and `Error::kind` keeps them apart in
//! the logs.
//!
//! # Examples
//!
//! ```
//! use apivet_core::error::{Error, Result};
//!
//! fn might_fail() -> Result<()> {
//!     Err(Error::validation("missing field `info`"))
//! }
//!
//! assert_eq!(might_fail().unwrap_err().kind(), "validation");
//! ```

use std::time::Duration;

use thiserror::Error;

/// Result type for apivet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for apivet operations
#[derive(Debug, Error)]
pub enum Error {
    /// The request envelope was missing, malformed or lacked `content`
    #[error("Invalid request payload: {0}")]
    Payload(String),

    /// The submitted text could not be loaded as JSON or YAML
    #[error("{0}")]
    Syntax(String),

    /// The document loaded but is not a valid API definition
    #[error("{0}")]
    Validation(String),

    /// Writing, reading or removing a staged file failed
    #[error("Staging error: {0}")]
    ArtifactIo(String),

    /// The validator did not finish within the configured bound
    #[error("Validation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Template engine error
    #[error("Template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new payload error
    pub fn payload<S: Into<String>>(msg: S) -> Self {
        Self::Payload(msg.into())
    }

    /// Create a new syntax error without a source position
    pub fn syntax<S: Into<String>>(msg: S) -> Self {
        Self::Syntax(msg.into())
    }

    /// Create a new syntax error anchored at a 1-based line and column
    pub fn syntax_at<S: AsRef<str>>(line: usize, column: usize, msg: S) -> Self {
        Self::Syntax(format!("line {}, column {}: {}", line, column, msg.as_ref()))
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new staging error
    pub fn artifact_io<S: Into<String>>(msg: S) -> Self {
        Self::ArtifactIo(msg.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Stable label for the error kind, used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Payload(_) => "payload",
            Self::Syntax(_) => "syntax",
            Self::Validation(_) => "validation",
            Self::ArtifactIo(_) => "artifact_io",
            Self::Timeout(_) => "timeout",
            Self::Io(_) => "io",
            Self::Yaml(_) => "yaml",
            Self::Json(_) => "json",
            Self::Tera(_) => "template",
            Self::Config(_) => "config",
        }
    }
}
