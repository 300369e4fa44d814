// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 MEGAcmd Test Harness Contributors

//! Opt-in guard for tests that wipe the remote account.

use crate::config::{ConfigError, ConfigResult};
use std::env;

/// Must hold a non-zero integer before a test may clear the account root.
pub const CONFIRM_CLEAN_VAR: &str = "YES_I_KNOW_THIS_WILL_CLEAR_MY_MEGA_ACCOUNT";

/// Whether the user explicitly allowed clearing their MEGA account.
///
/// Unset or empty means no. A value that is not an integer is reported as a
/// configuration error rather than read as either answer.
pub fn clean_root_confirmed_by_user() -> ConfigResult<bool> {
    parse_confirmation(env::var(CONFIRM_CLEAN_VAR).ok().as_deref())
}

/// Interpret a raw confirmation value.
pub fn parse_confirmation(value: Option<&str>) -> ConfigResult<bool> {
    let Some(raw) = value else {
        return Ok(false);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(false);
    }

    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConfigError::env_var_parsing(
            CONFIRM_CLEAN_VAR,
            raw,
            "expected an integer",
        ));
    }

    // Any magnitude counts, so only the presence of a non-zero digit matters.
    Ok(digits.bytes().any(|b| b != b'0'))
}
