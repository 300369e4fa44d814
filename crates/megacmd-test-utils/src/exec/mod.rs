// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 MEGAcmd Test Harness Contributors

//! Command execution strategies.
//!
//! Tests either spawn one MEGAcmd process per command ([`direct`]) or type the
//! command into an interactive MEGAcmd shell and scrape its answer
//! ([`shell`]). Both expose the same four result shapes through
//! [`CommandExecutor`]: raw bytes, stripped bytes, stripped bytes with the
//! exit code, and stripped bytes that abort the test run on failure.

pub mod direct;
pub mod shell;

use std::io::{self, Write};
use std::process::{self, Command, ExitStatus};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to prepare shell input at {path}: {source}")]
    InputScript {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to determine working directory: {0}")]
    WorkingDir(#[source] io::Error),
}

pub type ExecResult<T> = Result<T, ExecError>;

/// Captured standard output and exit code of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub code: i32,
}

impl CommandOutput {
    pub fn new(stdout: Vec<u8>, code: i32) -> Self {
        Self { stdout, code }
    }

    /// Output with leading and trailing whitespace removed.
    ///
    /// Vertical tab counts as whitespace here, unlike `<[u8]>::trim_ascii`.
    pub fn stripped(&self) -> Vec<u8> {
        strip_whitespace(&self.stdout).to_vec()
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Something that can run a MEGAcmd command line and capture its output.
pub trait CommandExecutor {
    /// Run `command` to completion. Blocks without a timeout.
    fn run(&self, command: &str) -> ExecResult<CommandOutput>;

    /// Captured output, untouched.
    fn output_raw(&self, command: &str) -> ExecResult<Vec<u8>> {
        Ok(self.run(command)?.stdout)
    }

    /// Captured output, stripped.
    fn output(&self, command: &str) -> ExecResult<Vec<u8>> {
        Ok(self.run(command)?.stripped())
    }

    /// Stripped output together with the exit code.
    fn output_with_code(&self, command: &str) -> ExecResult<(Vec<u8>, i32)> {
        let out = self.run(command)?;
        Ok((out.stripped(), out.code))
    }

    /// Stripped output; a non-zero exit terminates the whole test process
    /// with the same code after reporting the command and its output.
    fn output_or_exit(&self, command: &str) -> ExecResult<Vec<u8>> {
        let (out, code) = self.output_with_code(command)?;
        if code != 0 {
            error!(command, code, "command failed, aborting test run");
            report_failure(command, &out);
            process::exit(code);
        }
        Ok(out)
    }
}

fn is_strip_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Trim space, tab, newline, carriage return, vertical tab and form feed.
pub(crate) fn strip_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|&b| !is_strip_whitespace(b))
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|&b| !is_strip_whitespace(b))
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

fn report_failure(command: &str, output: &[u8]) {
    let stderr = io::stderr();
    let mut handle = stderr.lock();
    // Nothing left to do if stderr itself is gone.
    let _ = writeln!(handle, "FAILED trying {}", command);
    let _ = handle.write_all(output);
    let _ = writeln!(handle);
    let _ = handle.flush();
}

/// A `Command` that runs `line` through the host shell.
///
/// cmd.exe does its own parsing of the line, so it is passed verbatim rather
/// than quoted with the MSVC argv rules.
#[cfg(windows)]
pub(crate) fn shell_command(line: &str) -> Command {
    use std::os::windows::process::CommandExt;

    let mut cmd = Command::new("cmd");
    cmd.arg("/C").raw_arg(line);
    cmd
}

/// A `Command` that runs `line` through the host shell.
#[cfg(not(windows))]
pub(crate) fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(line);
    cmd
}

/// Exit code as a test script sees it; signal deaths map to `-signal`.
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stripped_trims_both_ends() {
        let out = CommandOutput::new(b" \n hello world\r\n\t".to_vec(), 0);
        assert_eq!(out.stripped(), b"hello world");
        assert!(out.success());
    }

    #[test]
    fn test_stripped_keeps_inner_whitespace() {
        let out = CommandOutput::new(b"a\n\nb\n".to_vec(), 3);
        assert_eq!(out.stripped(), b"a\n\nb");
        assert!(!out.success());
    }

    #[test]
    fn test_stripped_removes_vertical_tab_and_form_feed() {
        let out = CommandOutput::new(b"\x0b\x0chello\x0b \x0c".to_vec(), 0);
        assert_eq!(out.stripped(), b"hello");
        assert!(CommandOutput::new(b"\x0b\n".to_vec(), 0).stripped().is_empty());
    }

    #[cfg(windows)]
    #[test]
    fn test_cmd_line_keeps_inner_quotes() {
        let output = shell_command(r#"echo "my file.txt""#).output().unwrap();
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert_eq!(stdout.trim(), r#""my file.txt""#);
        assert_eq!(exit_code(output.status), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_code_from_shell() {
        let status = shell_command("exit 7").status().unwrap();
        assert_eq!(exit_code(status), 7);
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_code_from_signal() {
        let status = shell_command("kill -9 $$").status().unwrap();
        assert_eq!(exit_code(status), -9);
    }
}
