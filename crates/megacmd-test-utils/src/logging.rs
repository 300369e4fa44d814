// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 MEGAcmd Test Harness Contributors

//! Tracing setup for test sessions.
//!
//! Verbose sessions log every executed command and its captured output at
//! `debug`; quiet sessions only show warnings. `RUST_LOG` wins over both.

use crate::config::SessionConfig;
use std::io;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Errors that can occur during logging setup
#[derive(Error, Debug)]
pub enum LogError {
    #[error("Invalid log format: {0}. Expected one of: pretty, compact")]
    InvalidFormat(String),

    #[error("Failed to parse log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Output format for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line, human-readable output
    Pretty,

    /// Single-line output, easier to interleave with command output
    #[default]
    Compact,
}

impl LogFormat {
    /// Parse a format name (case-insensitive)
    pub fn parse(s: &str) -> Result<Self, LogError> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(LogError::InvalidFormat(s.to_string())),
        }
    }
}

/// Configuration for logging
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,

    /// Filter directive; `RUST_LOG` takes precedence when set
    pub level: String,

    pub use_color: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Compact,
            level: "warn".to_string(),
            use_color: false,
        }
    }
}

impl LogConfig {
    /// Derive the logging setup from a session configuration.
    pub fn for_session(session: &SessionConfig) -> Self {
        let level = if session.verbose { "debug" } else { "warn" };
        Self::default().with_level(level)
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    /// Get the effective filter from environment or config
    pub fn effective_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.level.clone())
    }
}

/// Install the global subscriber for a test session.
///
/// Returns [`LogError::AlreadyInitialized`] when another subscriber is already
/// installed, which is routine when several tests share one binary.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    let filter = build_env_filter(config)?;
    let registry = Registry::default().with(filter);

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_ansi(config.use_color)
                    .with_target(true)
                    .pretty(),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_ansi(config.use_color)
                    .with_target(false)
                    .without_time()
                    .compact(),
            )
            .try_init(),
    };

    result.map_err(|_| LogError::AlreadyInitialized)
}

fn build_env_filter(config: &LogConfig) -> Result<EnvFilter, LogError> {
    let filter = config.effective_level();
    EnvFilter::try_new(&filter).map_err(|e| LogError::InvalidFilter {
        filter: filter.clone(),
        reason: e.to_string(),
    })
}
