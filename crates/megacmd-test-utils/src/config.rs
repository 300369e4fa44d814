// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 MEGAcmd Test Harness Contributors

//! Session configuration read from the environment.
//!
//! The flags are read once when a test session starts and then passed by
//! reference; nothing re-reads the environment per call.

use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Presence enables verbose tracing of every executed command.
pub const VERBOSE_VAR: &str = "VERBOSE";

/// Launch command of the interactive MEGAcmd shell; presence selects shell mode.
pub const SHELL_VAR: &str = "MEGACMDSHELL";

/// Prefix of the per-command executables on Unix.
pub const DEFAULT_TOOL_PREFIX: &str = "mega";

/// File name of the scripted input fed to the interactive shell.
pub const INPUT_SCRIPT_NAME: &str = "shellin";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable parsing error: {variable_name}={value}. {reason}")]
    EnvVarParsing {
        variable_name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid configuration value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    pub fn env_var_parsing(
        variable_name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::EnvVarParsing {
            variable_name: variable_name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Presence-preserving lookup: non-Unicode values are converted lossily.
fn lookup_env(name: &str) -> Option<String> {
    env::var_os(name).map(|value| value.to_string_lossy().into_owned())
}

/// Settings shared by every helper call in one test session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Trace executed commands and their output.
    pub verbose: bool,

    /// Interactive shell launch command. `None` means one-shot execution.
    pub shell: Option<String>,

    /// Prefix stripped from commands before they are typed into the shell.
    pub tool_prefix: String,

    /// Where the interactive shell's scripted input is written.
    pub input_script: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            verbose: false,
            shell: None,
            tool_prefix: DEFAULT_TOOL_PREFIX.to_string(),
            input_script: env::temp_dir().join(INPUT_SCRIPT_NAME),
        }
    }
}

impl SessionConfig {
    /// Create a default configuration (quiet, one-shot execution).
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the configuration from the process environment.
    ///
    /// Variables count when present, even if their value is not valid Unicode.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(lookup_env)
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let shell = match lookup(SHELL_VAR) {
            Some(shell) if shell.trim().is_empty() => {
                return Err(ConfigError::invalid_value(
                    SHELL_VAR,
                    "interactive shell command must not be empty",
                ));
            }
            other => other,
        };

        Ok(SessionConfig {
            verbose: lookup(VERBOSE_VAR).is_some(),
            shell,
            ..Self::default()
        })
    }

    /// Enable or disable verbose tracing.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Run commands through an interactive shell started with `command`.
    pub fn with_shell(mut self, command: impl Into<String>) -> Self {
        self.shell = Some(command.into());
        self
    }

    /// Override the executable prefix.
    pub fn with_tool_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tool_prefix = prefix.into();
        self
    }

    /// Override the scripted input location.
    pub fn with_input_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_script = path.into();
        self
    }

    /// Whether commands go through the interactive shell.
    pub fn is_shell_mode(&self) -> bool {
        self.shell.is_some()
    }
}
