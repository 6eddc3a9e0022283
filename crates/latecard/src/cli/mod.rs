//! Command-line interface for latecard.
//!
//! This module provides the CLI structure and command handlers for the
//! `latecard` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    CardCommand, ConfigCommand, ContactArg, LookupCommand, ReasonArg, RosterCommand, ScanCommand,
    TeacherCommand,
};

/// latecard - QR scan station for student tardiness cards
///
/// Runs a camera-backed scan session, resolves student ids against the local
/// roster, and issues printable tardiness cards or submits them to the
/// configured endpoint.
#[derive(Debug, Parser)]
#[command(name = "latecard")]
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
    /// Run a scan session and resolve decoded ids
    Scan(ScanCommand),

    /// Look up a student id in the roster
    Lookup(LookupCommand),

    /// Manage the student roster
    #[command(subcommand)]
    Roster(RosterCommand),

    /// Issue a tardiness card for a student
    Card(CardCommand),

    /// View or change the station's default teacher
    #[command(subcommand)]
    Teacher(TeacherCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
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
