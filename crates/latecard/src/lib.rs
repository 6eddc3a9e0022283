//! `latecard` - A QR scan station for issuing student tardiness cards
//!
//! This library provides the core functionality for running a camera-backed
//! scan session, resolving decoded student ids against a local roster, and
//! issuing tardiness cards as printable output or endpoint submissions.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod prefs;
pub mod print;
pub mod record;
pub mod roster;
pub mod scan;
pub mod session;
pub mod submit;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use prefs::TeacherPrefs;
pub use print::render_card;
pub use record::TardinessRecord;
pub use roster::{LookupOutcome, Roster, Student};
pub use scan::{CameraBackend, CameraStream, PayloadDecoder, ScanEvent};
pub use session::{ScanOptions, ScanSession, SessionStatus};
pub use submit::{SubmissionOutcome, SubmissionSink};
