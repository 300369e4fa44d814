// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 MEGAcmd Test Harness Contributors

//! `megacmd-e2e`: the test helpers, callable from shell-driven test scripts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use megacmd_test_utils::{
    fs, gate, init_logging, LogConfig, LogError, LogFormat, MegaCommand, Platform, Session,
    SessionConfig,
};
use std::io::{self, Read, Write};
use std::process;
use tracing::debug;

#[derive(Parser)]
#[command(name = "megacmd-e2e")]
#[command(version, about = "Helpers for the MEGAcmd end-to-end test suite")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Trace executed commands (same as setting VERBOSE)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Diagnostic log layout on stderr (pretty or compact)
    #[arg(long, global = true, value_name = "FORMAT", default_value = "compact")]
    #[arg(value_parser = LogFormat::parse)]
    log_format: LogFormat,

    /// Colorize diagnostic logs
    #[arg(long, global = true)]
    color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the platform-specific invocation of a MEGAcmd command
    Name {
        /// Logical command, e.g. `get` or `whoami`
        command: String,

        /// Resolve for another platform (windows, macos, linux, ...)
        #[arg(long, value_name = "OS")]
        os: Option<String>,
    },

    /// Run a command line through the session's executor
    Exec {
        /// Command line, passed to the host shell or typed into MEGACMDSHELL
        cmdline: String,

        /// Print the captured output without stripping it
        #[arg(long, conflicts_with = "fail")]
        raw: bool,

        /// Abort with the command's exit code if it fails
        #[arg(long)]
        fail: bool,
    },

    /// Recursive listing of a local directory
    Find {
        root: String,

        #[arg(long, default_value = "")]
        prefix: String,
    },

    /// Listing of a local directory's immediate children
    Ls {
        root: String,

        #[arg(long, default_value = "")]
        prefix: String,
    },

    /// Sort the lines read from standard input
    Sort,

    /// Check whether clearing the remote account was explicitly allowed
    ConfirmClean,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = SessionConfig::from_env().context("invalid session environment")?;
    let config = if cli.verbose {
        config.with_verbose(true)
    } else {
        config
    };

    let log_config = LogConfig::for_session(&config)
        .with_format(cli.log_format)
        .with_color(cli.color);
    match init_logging(&log_config) {
        Ok(()) | Err(LogError::AlreadyInitialized) => {}
        Err(e) => return Err(e).context("failed to set up logging"),
    }

    match cli.command {
        Commands::Name { command, os } => {
            let platform = os.as_deref().map_or_else(Platform::current, Platform::from_os);
            let invocation = match MegaCommand::parse(&command) {
                Some(known) => known.invocation_for(platform),
                None => {
                    debug!("{} is not a known MEGAcmd command", command);
                    megacmd_test_utils::command_name(platform, &command)
                }
            };
            println!("{}", invocation);
        }
        Commands::Exec { cmdline, raw, fail } => {
            let session = Session::new(config);
            let code = if fail {
                let out = session.cmd_ef(&cmdline)?;
                print_bytes(&out)?;
                0
            } else if raw {
                let out = session.cmd_ec(&cmdline)?;
                write_stdout(&out.stdout)?;
                out.code
            } else {
                let (out, code) = session.cmd_esc(&cmdline)?;
                print_bytes(&out)?;
                code
            };
            process::exit(code);
        }
        Commands::Find { root, prefix } => {
            let listing = fs::find(&root, &prefix)
                .with_context(|| format!("failed to list {}", root))?;
            println!("{}", listing);
        }
        Commands::Ls { root, prefix } => {
            let listing = fs::ls(&root, &prefix)
                .with_context(|| format!("failed to list {}", root))?;
            print!("{}", listing);
        }
        Commands::Sort => {
            let mut input = Vec::new();
            io::stdin()
                .read_to_end(&mut input)
                .context("failed to read standard input")?;
            print!("{}", fs::sort_lines(input));
        }
        Commands::ConfirmClean => match gate::clean_root_confirmed_by_user() {
            Ok(confirmed) => println!("{}", confirmed),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(2);
            }
        },
    }

    Ok(())
}

fn print_bytes(bytes: &[u8]) -> Result<()> {
    write_stdout(bytes)?;
    write_stdout(b"\n")
}

fn write_stdout(bytes: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(bytes).context("failed to write output")?;
    stdout.flush().context("failed to write output")
}
