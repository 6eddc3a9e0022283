//! Linux-specific implementation for latecard.
//!
//! This crate provides Linux-specific functionality for the latecard project,
//! currently V4L2 capture device discovery.

#![cfg(target_os = "linux")]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

/// Initialize Linux-specific components.
///
/// # Errors
///
/// Returns an error if initialization fails.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let devices = video_device_paths();
    tracing::info!("Found {} V4L2 capture device(s)", devices.len());
    for device in &devices {
        tracing::debug!("Capture device: {}", device.display());
    }
    Ok(())
}

/// Get the platform name.
#[must_use]
pub fn platform_name() -> &'static str {
    "Linux"
}

/// List V4L2 capture device nodes (`/dev/video*`), sorted.
#[must_use]
pub fn video_device_paths() -> Vec<PathBuf> {
    video_device_paths_in(Path::new("/dev"))
}

fn video_device_paths_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut devices: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("video"))
        })
        .collect();
    devices.sort();
    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        assert!(init().is_ok());
    }

    #[test]
    fn test_platform_name() {
        assert_eq!(platform_name(), "Linux");
    }

    #[test]
    fn test_device_discovery_missing_dir() {
        assert!(video_device_paths_in(Path::new("/nonexistent")).is_empty());
    }

    #[test]
    fn test_device_discovery_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("video1"), []).unwrap();
        std::fs::write(dir.path().join("video0"), []).unwrap();
        std::fs::write(dir.path().join("null"), []).unwrap();

        let devices = video_device_paths_in(dir.path());
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0], dir.path().join("video0"));
        assert_eq!(devices[1], dir.path().join("video1"));
    }
}
