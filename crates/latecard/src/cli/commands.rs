//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::record::{ContactStatus, TardyReason};

/// Scan command arguments.
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Run against the simulated camera, decoding these payloads in order
    /// (repeatable). Without this flag a real camera backend is required.
    #[arg(long = "simulate", value_name = "PAYLOAD")]
    pub simulate: Vec<String>,

    /// Stop after the first decoded payload
    #[arg(long)]
    pub once: bool,
}

/// Lookup command arguments.
#[derive(Debug, Args)]
pub struct LookupCommand {
    /// Student id to look up
    pub id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Roster management commands.
#[derive(Debug, Subcommand)]
pub enum RosterCommand {
    /// Add or update a roster entry
    Add {
        /// Student id
        id: String,
        /// Class label, e.g. 3-A
        #[arg(long)]
        class: String,
        /// Student name
        #[arg(long)]
        name: String,
    },

    /// Remove a roster entry
    Remove {
        /// Student id
        id: String,
    },

    /// List roster entries
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Seed the demo fixtures into an empty roster
    Seed,
}

/// Card command arguments.
#[derive(Debug, Args)]
pub struct CardCommand {
    /// Student id (as scanned)
    pub id: String,

    /// Class label; filled from the roster when omitted
    #[arg(long)]
    pub class: Option<String>,

    /// Student name; filled from the roster when omitted
    #[arg(long)]
    pub name: Option<String>,

    /// Prior-contact status
    #[arg(long, value_enum, default_value = "not-reached")]
    pub contact: ContactArg,

    /// Tardiness reason
    #[arg(long, value_enum)]
    pub reason: ReasonArg,

    /// Free-text reason detail (required with --reason other)
    #[arg(long)]
    pub detail: Option<String>,

    /// Free-text notes
    #[arg(long, default_value = "")]
    pub notes: String,

    /// Responsible teacher; falls back to the station default
    #[arg(long)]
    pub teacher: Option<String>,

    /// Submit the record to the configured endpoint instead of printing
    #[arg(long)]
    pub submit: bool,
}

/// Teacher preference commands.
#[derive(Debug, Subcommand)]
pub enum TeacherCommand {
    /// Show the current default teacher
    Show,

    /// Set the default teacher
    Set {
        /// Teacher name
        name: String,
    },

    /// Clear the default teacher
    Clear,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Contact status argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ContactArg {
    /// Prior contact was made
    Reached,
    /// No prior contact
    NotReached,
}

impl From<ContactArg> for ContactStatus {
    fn from(arg: ContactArg) -> Self {
        match arg {
            ContactArg::Reached => Self::Reached,
            ContactArg::NotReached => Self::NotReached,
        }
    }
}

/// Tardiness reason argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReasonArg {
    /// Public transit delay
    TransitDelay,
    /// Scheduled medical appointment
    MedicalAppointment,
    /// Feeling unwell
    Unwell,
    /// Overslept
    Overslept,
    /// Went back for a forgotten item
    ForgotItem,
    /// Anything else (requires --detail)
    Other,
}

impl From<ReasonArg> for TardyReason {
    fn from(arg: ReasonArg) -> Self {
        match arg {
            ReasonArg::TransitDelay => Self::TransitDelay,
            ReasonArg::MedicalAppointment => Self::MedicalAppointment,
            ReasonArg::Unwell => Self::Unwell,
            ReasonArg::Overslept => Self::Overslept,
            ReasonArg::ForgotItem => Self::ForgotItem,
            ReasonArg::Other => Self::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_arg_conversion() {
        assert_eq!(
            ContactStatus::from(ContactArg::Reached),
            ContactStatus::Reached
        );
        assert_eq!(
            ContactStatus::from(ContactArg::NotReached),
            ContactStatus::NotReached
        );
    }

    #[test]
    fn test_reason_arg_conversion() {
        assert_eq!(
            TardyReason::from(ReasonArg::TransitDelay),
            TardyReason::TransitDelay
        );
        assert_eq!(TardyReason::from(ReasonArg::Other), TardyReason::Other);
    }

    #[test]
    fn test_scan_command_debug() {
        let cmd = ScanCommand {
            simulate: vec!["12344321".to_string()],
            once: true,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("simulate"));
        assert!(debug_str.contains("12344321"));
    }

    #[test]
    fn test_roster_command_debug() {
        let cmd = RosterCommand::Seed;
        assert!(format!("{cmd:?}").contains("Seed"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        assert!(format!("{cmd:?}").contains("Show"));
    }
}
