//! Configuration management for the apivet service.
//!
//! This module defines the `Config` struct and the staging strategy used by the
//! submission handler. The configuration can be loaded from a YAML file, created
//! programmatically, or overridden from command-line arguments.
//!
//! # Examples
//!
//! ```no_run
//! use apivet_core::config::{Config, StagingStrategy};
//!
//! # #[tokio::main]
//! # async fn main() -> apivet_core::Result<()> {
//! // Create a config programmatically
//! let mut config = Config::default();
//! config.port = 8080;
//! config.staging = StagingStrategy::TempFile;
//!
//! // Or load from a config file
//! let config = Config::from_file("apivet.yaml").await?;
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};
use tokio::fs;

/// How a submitted document reaches the validator.
///
/// The strategy is fixed for the lifetime of a process. The two strategies can
/// produce differently worded diagnostics for the same input.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum StagingStrategy {
    /// Parse the text in memory and hand the structure to the validator
    #[default]
    InMemory,
    /// Write the text to a uniquely named temporary file and load it from there
    TempFile,
}

impl StagingStrategy {
    /// Returns the configuration name of the strategy
    pub fn as_str(&self) -> &'static str {
        match self {
            StagingStrategy::InMemory => "in_memory",
            StagingStrategy::TempFile => "temp_file",
        }
    }
}

impl fmt::Display for StagingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the apivet server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP listener binds to
    pub bind_address: IpAddr,

    /// Port the HTTP listener binds to
    pub port: u16,

    /// Staging strategy for submitted documents
    pub staging: StagingStrategy,

    /// Directory for staged files; the OS temp directory when unset
    pub temp_dir: Option<PathBuf>,

    /// Upper bound on a single validation, in seconds
    pub validation_timeout_secs: u64,

    /// Largest accepted request body, in bytes
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            staging: StagingStrategy::default(),
            temp_dir: None,
            validation_timeout_secs: 10,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await.map_err(|e| {
            crate::Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from an explicit path, else from the user config file if one exists,
    /// else fall back to defaults
    pub async fn load(explicit: Option<&Path>) -> crate::Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path).await;
        }
        match Self::default_path() {
            Some(path) if fs::try_exists(&path).await.unwrap_or(false) => {
                log::debug!("Loading configuration from {}", path.display());
                Self::from_file(path).await
            }
            _ => Ok(Self::default()),
        }
    }

    /// Per-user config file location (e.g. `~/.config/apivet/config.yaml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("apivet").join("config.yaml"))
    }

    /// Socket address the server listens on
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Directory where staged files are created
    pub fn resolved_temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Bound on a single validation
    pub fn validation_timeout(&self) -> Duration {
        Duration::from_secs(self.validation_timeout_secs)
    }
}
