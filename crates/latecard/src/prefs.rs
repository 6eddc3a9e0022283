//! Station-local preferences.
//!
//! One preference exists: the default responsible teacher, kept per station
//! so the operator only selects it once. It is read on startup, written on
//! every change, and the file is removed when the preference is cleared.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// On-disk preference format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PrefsFile {
    default_teacher: String,
}

/// Handle to the station preference file.
#[derive(Debug, Clone)]
pub struct TeacherPrefs {
    path: PathBuf,
}

impl TeacherPrefs {
    /// Create a handle for the given preference file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to the preference file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the default teacher, if one is set.
    ///
    /// A missing file means no preference; a corrupt file is treated the
    /// same way rather than blocking startup.
    #[must_use]
    pub fn load(&self) -> Option<String> {
        let data = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<PrefsFile>(&data) {
            Ok(prefs) if !prefs.default_teacher.trim().is_empty() => Some(prefs.default_teacher),
            Ok(_) => None,
            Err(err) => {
                debug!(error = %err, "ignoring corrupt preference file");
                None
            }
        }
    }

    /// Persist the default teacher.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its parent directory cannot be
    /// written.
    pub fn set(&self, teacher: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let prefs = PrefsFile {
            default_teacher: teacher.trim().to_string(),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&prefs)?)?;
        debug!("default teacher set to {}", prefs.default_teacher);
        Ok(())
    }

    /// Clear the preference, removing the file.
    ///
    /// A no-op when no preference is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("default teacher cleared");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs_in(dir: &tempfile::TempDir) -> TeacherPrefs {
        TeacherPrefs::new(dir.path().join("teacher.json"))
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(prefs_in(&dir).load(), None);
    }

    #[test]
    fn test_set_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = prefs_in(&dir);
        prefs.set("Yamamoto").unwrap();
        assert_eq!(prefs.load(), Some("Yamamoto".to_string()));
    }

    #[test]
    fn test_set_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = prefs_in(&dir);
        prefs.set("Yamamoto").unwrap();
        prefs.set("Sato").unwrap();
        assert_eq!(prefs.load(), Some("Sato".to_string()));
    }

    #[test]
    fn test_set_trims_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = prefs_in(&dir);
        prefs.set("  Suzuki  ").unwrap();
        assert_eq!(prefs.load(), Some("Suzuki".to_string()));
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = prefs_in(&dir);
        prefs.set("Yamamoto").unwrap();
        prefs.clear().unwrap();
        assert!(!prefs.path().exists());
        assert_eq!(prefs.load(), None);
    }

    #[test]
    fn test_clear_when_unset_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = prefs_in(&dir);
        prefs.clear().unwrap();
        prefs.clear().unwrap();
    }

    #[test]
    fn test_load_corrupt_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = prefs_in(&dir);
        std::fs::write(prefs.path(), "not json").unwrap();
        assert_eq!(prefs.load(), None);
    }

    #[test]
    fn test_load_empty_teacher_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = prefs_in(&dir);
        std::fs::write(prefs.path(), r#"{"default_teacher": "  "}"#).unwrap();
        assert_eq!(prefs.load(), None);
    }

    #[test]
    fn test_set_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = TeacherPrefs::new(dir.path().join("nested").join("teacher.json"));
        prefs.set("Takahashi").unwrap();
        assert_eq!(prefs.load(), Some("Takahashi".to_string()));
    }
}
