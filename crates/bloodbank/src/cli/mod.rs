//! Command-line interface for bloodbank.
//!
//! This module provides the CLI structure and command handlers for the
//! `bloodbank` binary and its interactive shell.

mod commands;
mod handlers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    CheckFields, ConfigCommand, DashboardCommand, DonorCommand, DonorFields, IntakeFields,
    ListArgs, OutputFormat, PatientCommand, PatientFields,
};
pub use handlers::{print_toasts, Session, RESET_PROMPT};

/// bloodbank - Track blood donations and patient requests
///
/// Records donors and patients, keeps a running stock per blood group, and
/// only registers a patient once the requested units are available.
#[derive(Debug, Parser)]
#[command(name = "bloodbank")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show stock per blood group and totals
    Dashboard(DashboardCommand),

    /// Register, list, or remove donors
    #[command(subcommand)]
    Donor(DonorCommand),

    /// Check availability, register, or list patients
    #[command(subcommand)]
    Patient(PatientCommand),

    /// Start an interactive session
    Shell,

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Delete every donor and patient
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// One line typed into the interactive shell.
#[derive(Debug, Parser)]
#[command(name = "bloodbank", no_binary_name = true)]
#[command(disable_version_flag = true)]
pub struct ShellLine {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
