// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 MEGAcmd Test Harness Contributors

//! # MEGAcmd Test Utilities
//!
//! Shared helpers for the MEGAcmd end-to-end suite providing:
//! - Platform-specific command name resolution
//! - One-shot and interactive-shell command execution
//! - Session-wide dispatch between the two execution strategies
//! - Filesystem helpers for preparing and inspecting local trees
//! - The opt-in gate guarding destructive account operations

pub mod config;
pub mod exec;
pub mod fs;
pub mod gate;
pub mod logging;
pub mod platform;
pub mod session;

// Re-export commonly used items at crate root
pub use config::{ConfigError, ConfigResult, SessionConfig};
pub use exec::{CommandExecutor, CommandOutput, ExecError, ExecResult};
pub use exec::direct::DirectExecutor;
pub use exec::shell::{scrape_session_output, InteractiveShellExecutor};
pub use gate::clean_root_confirmed_by_user;
pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use platform::{command_name, MegaCommand, Platform};
pub use session::Session;
