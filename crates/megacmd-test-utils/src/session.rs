// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 MEGAcmd Test Harness Contributors

//! Test session: configuration plus the execution strategy it selects.
//!
//! # Example
//! ```ignore
//! use megacmd_test_utils::{MegaCommand, Session};
//!
//! let session = Session::from_env()?;
//! let me = session.cmd_es(&MegaCommand::Whoami.invocation())?;
//! ```

use crate::config::{ConfigResult, SessionConfig};
use crate::exec::direct::DirectExecutor;
use crate::exec::shell::InteractiveShellExecutor;
use crate::exec::{CommandExecutor, CommandOutput, ExecResult};
use std::fmt;

/// A configured test session.
///
/// The executor is chosen once at construction: the interactive shell when the
/// configuration names one, one-shot processes otherwise.
pub struct Session {
    config: SessionConfig,
    executor: Box<dyn CommandExecutor>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let executor: Box<dyn CommandExecutor> =
            match InteractiveShellExecutor::from_config(&config) {
                Some(shell) => Box::new(shell),
                None => Box::new(DirectExecutor::new()),
            };
        Self { config, executor }
    }

    /// Session configured from `VERBOSE` and `MEGACMDSHELL`.
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self::new(SessionConfig::from_env()?))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The selected execution strategy.
    pub fn executor(&self) -> &dyn CommandExecutor {
        self.executor.as_ref()
    }

    /// Run and return output plus exit code.
    pub fn cmd_ec(&self, command: &str) -> ExecResult<CommandOutput> {
        self.executor.run(command)
    }

    /// Run and return raw output.
    pub fn cmd_ex(&self, command: &str) -> ExecResult<Vec<u8>> {
        self.executor.output_raw(command)
    }

    /// Run and return stripped output.
    pub fn cmd_es(&self, command: &str) -> ExecResult<Vec<u8>> {
        self.executor.output(command)
    }

    /// Run and return stripped output with the exit code.
    pub fn cmd_esc(&self, command: &str) -> ExecResult<(Vec<u8>, i32)> {
        self.executor.output_with_code(command)
    }

    /// Run; abort the test process if the command fails.
    pub fn cmd_ef(&self, command: &str) -> ExecResult<Vec<u8>> {
        self.executor.output_or_exit(command)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("shell_mode", &self.config.is_shell_mode())
            .finish()
    }
}
