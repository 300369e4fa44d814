// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 MEGAcmd Test Harness Contributors

//! Commands typed into an interactive MEGAcmd shell.
//!
//! Each call writes a two-line script (`lcd <cwd>` then the command) to a fixed
//! file, starts the shell with that file as stdin and scrapes the command's
//! answer out of everything the shell prints: its welcome banner, the echoed
//! prompt lines, and the final `Exiting ...` notice.
//!
//! The input script lives at a single path, so sessions must not run commands
//! concurrently.

use super::{
    exit_code, shell_command, strip_whitespace, CommandExecutor, CommandOutput, ExecError,
    ExecResult,
};
use crate::config::SessionConfig;
use crate::platform;
use regex::bytes::Regex;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use tracing::debug;

/// Lines containing this many consecutive `=` delimit the welcome banner.
const BANNER_RULE: &[u8] = b"====================";

/// The shell prints this once its input is exhausted.
const EXIT_NOTICE: &[u8] = b"Exiting ...";

/// Everything up to and including the last erase-line sequence.
static ERASE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u).*\x1b\[K").unwrap_or_else(|e| unreachable!("static pattern: {e}"))
});

/// Everything up to and including the last carriage return.
static CARRIAGE_RETURN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u).*\r").unwrap_or_else(|e| unreachable!("static pattern: {e}"))
});

/// Drives an interactive shell, one process per command.
#[derive(Debug, Clone)]
pub struct InteractiveShellExecutor {
    launch: String,
    tool_prefix: String,
    input_script: PathBuf,
}

impl InteractiveShellExecutor {
    /// Shell started with `launch`, input script at the default location.
    pub fn new(launch: impl Into<String>) -> Self {
        let defaults = SessionConfig::default();
        Self {
            launch: launch.into(),
            tool_prefix: defaults.tool_prefix,
            input_script: defaults.input_script,
        }
    }

    /// Shell described by a session configuration, if it selects shell mode.
    pub fn from_config(config: &SessionConfig) -> Option<Self> {
        config.shell.as_ref().map(|launch| Self {
            launch: launch.clone(),
            tool_prefix: config.tool_prefix.clone(),
            input_script: config.input_script.clone(),
        })
    }

    pub fn with_input_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_script = path.into();
        self
    }

    pub fn input_script(&self) -> &Path {
        &self.input_script
    }

    /// The command as typed at the shell prompt: without the executable prefix.
    pub fn shell_command_text<'a>(&self, command: &'a str) -> &'a str {
        let prefix = format!("{}-", self.tool_prefix);
        command.strip_prefix(prefix.as_str()).unwrap_or(command)
    }

    fn write_input_script(&self, command: &str) -> ExecResult<()> {
        let cwd = platform::current_dir_arg().map_err(ExecError::WorkingDir)?;
        let script = format!("lcd {}\n{}\n", cwd, command);
        fs::write(&self.input_script, script).map_err(|source| ExecError::InputScript {
            path: self.input_script.display().to_string(),
            source,
        })
    }
}

impl CommandExecutor for InteractiveShellExecutor {
    fn run(&self, command: &str) -> ExecResult<CommandOutput> {
        let command = self.shell_command_text(command);
        debug!("Executing in cmdshell: {}", command);

        self.write_input_script(command)?;
        let stdin = File::open(&self.input_script).map_err(|source| ExecError::InputScript {
            path: self.input_script.display().to_string(),
            source,
        })?;

        debug!("Launching in cmdshell ... {}", self.launch);
        let output = shell_command(&self.launch)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| ExecError::Spawn {
                command: self.launch.clone(),
                source,
            })?;

        let scraped = scrape_session_output(&output.stdout, command);
        debug!("{}", String::from_utf8_lossy(strip_whitespace(&scraped)));

        Ok(CommandOutput::new(scraped, exit_code(output.status)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrapeState {
    /// Inside the welcome banner; counts rule lines seen so far.
    Banner(u8),
    /// Banner done, waiting for the prompt line echoing the command.
    AwaitingCommand,
    /// Collecting the command's answer.
    Capturing,
}

/// Extract the answer to `command` from a full interactive-shell transcript.
///
/// Returns an empty buffer when the banner or the command echo never shows up,
/// which is indistinguishable from a command with no output.
pub fn scrape_session_output(transcript: &[u8], command: &str) -> Vec<u8> {
    let needle = command.as_bytes();
    let mut state = ScrapeState::Banner(0);
    let mut captured: Vec<Vec<u8>> = Vec::new();

    for raw in transcript.split(|&b| b == b'\n') {
        let line = clean_line(raw);
        match state {
            ScrapeState::Capturing => {
                if contains(&line, EXIT_NOTICE) {
                    break;
                }
                captured.push(line);
            }
            ScrapeState::AwaitingCommand => {
                if contains(&line, needle) {
                    state = ScrapeState::Capturing;
                }
            }
            ScrapeState::Banner(rules) => {
                if contains(&line, BANNER_RULE) {
                    state = if rules + 1 == 2 {
                        ScrapeState::AwaitingCommand
                    } else {
                        ScrapeState::Banner(rules + 1)
                    };
                }
            }
        }
    }

    captured.join(&b'\n')
}

/// Drop terminal redraw noise: whatever precedes the last erase-line sequence
/// and then whatever precedes the last carriage return.
fn clean_line(line: &[u8]) -> Vec<u8> {
    let line = ERASE_LINE.replace_all(line, &b""[..]);
    CARRIAGE_RETURN.replace_all(&line, &b""[..]).into_owned()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}
