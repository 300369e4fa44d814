// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 MEGAcmd Test Harness Contributors

//! One process per command.

use super::{
    exit_code, shell_command, strip_whitespace, CommandExecutor, CommandOutput, ExecError,
    ExecResult,
};
use std::process::Stdio;
use tracing::debug;

/// Runs each command line through the host shell and waits for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectExecutor;

impl DirectExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for DirectExecutor {
    fn run(&self, command: &str) -> ExecResult<CommandOutput> {
        debug!("Executing {}", command);

        let output = shell_command(command)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| ExecError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdout = normalize_line_endings(&output.stdout);
        debug!("{}", String::from_utf8_lossy(strip_whitespace(&stdout)));

        Ok(CommandOutput::new(stdout, exit_code(output.status)))
    }
}

/// Replace every `\r\n` with `\n`. Lone `\r` bytes are kept.
pub fn normalize_line_endings(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().peekable();
    while let Some(&b) = iter.next() {
        if b == b'\r' && iter.peek() == Some(&&b'\n') {
            continue;
        }
        out.push(b);
    }
    out
}
