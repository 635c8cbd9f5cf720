//! # Configuration
//!
//! Settings for the sidecar and CLI, layered as:
//!
//! 1. Built-in defaults
//! 2. `campus.toml` (or the file passed with `--config`)
//! 3. `CAMPUS_*` environment variables
//! 4. Command-line flags (applied by the CLI)
//!
//! # Environment Variable Overrides
//!
//! | Variable                      | Field                                   | Default     |
//! |-------------------------------|-----------------------------------------|-------------|
//! | `CAMPUS_HOST`                 | `host`                                  | `127.0.0.1` |
//! | `CAMPUS_PORT`                 | `port`                                  | `8080`      |
//! | `CAMPUS_SNAPSHOT`             | `snapshot`                              | unset       |
//! | `CAMPUS_RATE_LIMIT`           | `rate_limit`                            | `100`       |
//! | `CAMPUS_MAX_ACTIVE_MENTORS`   | `policy.max_active_per_section` (0 = off) | `2`       |
//! | `CAMPUS_LOCKED_PRECEDENCE`    | `policy.locked_precedence`              | `strict`    |
//!
//! In `campus.toml`, `[policy] max_active_per_section = 0` also disables the
//! section capacity check, matching `CAMPUS_MAX_ACTIVE_MENTORS=0`.
//!
//! `CAMPUS_API_KEY` and `CAMPUS_CORS_ORIGINS` are read by the router itself
//! and never stored here.

use campus_core::{CampusError, LockedPrecedence, ResolutionPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "campus.toml";

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampusConfig {
    pub host: String,
    pub port: u16,
    /// Snapshot file (JSON or canonical) loaded at startup.
    pub snapshot: Option<PathBuf>,
    /// Requests per second for the sidecar; 0 disables limiting.
    pub rate_limit: u32,
    pub policy: ResolutionPolicy,
}

impl Default for CampusConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            snapshot: None,
            rate_limit: 100,
            policy: ResolutionPolicy::default(),
        }
    }
}

impl CampusConfig {
    /// Load configuration, then apply environment overrides.
    ///
    /// An explicit `path` must exist and parse. Without one, `campus.toml`
    /// in the working directory is used if present; a broken default file
    /// is logged and ignored.
    pub fn load(path: Option<&Path>) -> Result<Self, CampusError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::from_file(default_path).unwrap_or_else(|e| {
                        tracing::warn!(
                            path = %default_path.display(),
                            error = %e,
                            "failed to load config, using defaults"
                        );
                        Self::default()
                    })
                } else {
                    Self::default()
                }
            }
        };
        Ok(config.with_env_overrides())
    }

    /// Parse a TOML config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, CampusError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CampusError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        toml::from_str(&contents).map_err(|e| {
            CampusError::SerializationError(format!(
                "Invalid config '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Apply `CAMPUS_*` overrides. Invalid values are logged and skipped.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("CAMPUS_HOST")
            && !val.trim().is_empty()
        {
            self.host = val;
        }
        if let Ok(val) = std::env::var("CAMPUS_PORT") {
            match val.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid CAMPUS_PORT"),
            }
        }
        if let Ok(val) = std::env::var("CAMPUS_SNAPSHOT")
            && !val.trim().is_empty()
        {
            self.snapshot = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("CAMPUS_RATE_LIMIT") {
            match val.parse::<u32>() {
                Ok(rps) => self.rate_limit = rps,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid CAMPUS_RATE_LIMIT"),
            }
        }
        if let Ok(val) = std::env::var("CAMPUS_MAX_ACTIVE_MENTORS") {
            match val.parse::<usize>() {
                Ok(0) => self.policy.max_active_per_section = None,
                Ok(limit) => self.policy.max_active_per_section = Some(limit),
                Err(_) => {
                    tracing::warn!(value = %val, "ignoring invalid CAMPUS_MAX_ACTIVE_MENTORS");
                }
            }
        }
        if let Ok(val) = std::env::var("CAMPUS_LOCKED_PRECEDENCE") {
            match parse_locked_precedence(&val) {
                Some(precedence) => self.policy.locked_precedence = precedence,
                None => {
                    tracing::warn!(value = %val, "ignoring invalid CAMPUS_LOCKED_PRECEDENCE");
                }
            }
        }
        self
    }

    /// `host:port` for the listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_locked_precedence(raw: &str) -> Option<LockedPrecedence> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "strict" => Some(LockedPrecedence::Strict),
        "prefer_locked" | "prefer-locked" => Some(LockedPrecedence::PreferLocked),
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================
