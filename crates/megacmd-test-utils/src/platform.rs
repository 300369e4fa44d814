// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 MEGAcmd Test Harness Contributors

//! Platform-specific command naming.
//!
//! MEGAcmd ships its commands differently per OS: a single `MEGAclient.exe`
//! dispatcher on Windows, a `mega-exec` dispatcher inside the macOS bundle,
//! and one `mega-<command>` script per command everywhere else.

use std::env;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Host platform family, as far as command naming is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// `MEGAclient.exe <command>`
    Windows,
    /// `mega-exec <command>`
    MacOs,
    /// `mega-<command>`
    Unix,
}

impl Platform {
    /// Platform of the running binary. Unrecognized targets use the Unix naming.
    pub fn current() -> Self {
        Self::from_os(env::consts::OS)
    }

    /// Map an OS identifier (as in `std::env::consts::OS`) to a platform.
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Platform::Windows,
            "macos" => Platform::MacOs,
            _ => Platform::Unix,
        }
    }
}

/// Build the invocation prefix for a logical MEGAcmd command.
pub fn command_name(platform: Platform, command: &str) -> String {
    match platform {
        Platform::Windows => format!("MEGAclient.exe {}", command),
        Platform::MacOs => format!("mega-exec {}", command),
        Platform::Unix => format!("mega-{}", command),
    }
}

/// Logical commands the end-to-end suite drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MegaCommand {
    Get,
    Put,
    Rm,
    Mv,
    Cd,
    Cp,
    Thumbnail,
    Lcd,
    Mkdir,
    Export,
    Share,
    Invite,
    Find,
    Whoami,
    Logout,
    Login,
    Ipc,
    Ftp,
    Import,
}

impl MegaCommand {
    /// Every command, in declaration order.
    pub const ALL: [MegaCommand; 19] = [
        MegaCommand::Get,
        MegaCommand::Put,
        MegaCommand::Rm,
        MegaCommand::Mv,
        MegaCommand::Cd,
        MegaCommand::Cp,
        MegaCommand::Thumbnail,
        MegaCommand::Lcd,
        MegaCommand::Mkdir,
        MegaCommand::Export,
        MegaCommand::Share,
        MegaCommand::Invite,
        MegaCommand::Find,
        MegaCommand::Whoami,
        MegaCommand::Logout,
        MegaCommand::Login,
        MegaCommand::Ipc,
        MegaCommand::Ftp,
        MegaCommand::Import,
    ];

    /// Command token as typed at the MEGAcmd prompt.
    pub fn as_str(&self) -> &'static str {
        match self {
            MegaCommand::Get => "get",
            MegaCommand::Put => "put",
            MegaCommand::Rm => "rm",
            MegaCommand::Mv => "mv",
            MegaCommand::Cd => "cd",
            MegaCommand::Cp => "cp",
            MegaCommand::Thumbnail => "thumbnail",
            MegaCommand::Lcd => "lcd",
            MegaCommand::Mkdir => "mkdir",
            MegaCommand::Export => "export",
            MegaCommand::Share => "share",
            MegaCommand::Invite => "invite",
            MegaCommand::Find => "find",
            MegaCommand::Whoami => "whoami",
            MegaCommand::Logout => "logout",
            MegaCommand::Login => "login",
            MegaCommand::Ipc => "ipc",
            MegaCommand::Ftp => "ftp",
            MegaCommand::Import => "import",
        }
    }

    /// Look a command up by its token.
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == token)
    }

    /// Invocation for the given platform.
    pub fn invocation_for(&self, platform: Platform) -> String {
        command_name(platform, self.as_str())
    }

    /// Invocation for the current platform.
    pub fn invocation(&self) -> String {
        self.invocation_for(Platform::current())
    }
}

impl fmt::Display for MegaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a path for passing to a command line.
///
/// Uses dunce so Windows paths come back without the `\\?\` prefix.
pub fn normalize(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// The current working directory as a command-line argument.
pub fn current_dir_arg() -> io::Result<String> {
    let cwd = env::current_dir()?;
    Ok(normalize(&cwd).to_string_lossy().into_owned())
}
