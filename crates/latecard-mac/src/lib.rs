//! macOS-specific implementation for latecard.
//!
//! This crate provides macOS-specific functionality for the latecard
//! project. Camera access on macOS goes through AVFoundation; until a
//! native backend lands this crate only reports the platform and the
//! default device label.

#![cfg(target_os = "macos")]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

/// Initialize macOS-specific components.
///
/// # Errors
///
/// Returns an error if initialization fails.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Initializing macOS platform components");
    Ok(())
}

/// Get the platform name.
#[must_use]
pub fn platform_name() -> &'static str {
    "macOS"
}

/// Label AVFoundation reports for the built-in camera on most Macs.
#[must_use]
pub fn default_camera_label() -> &'static str {
    "FaceTime HD Camera"
}
