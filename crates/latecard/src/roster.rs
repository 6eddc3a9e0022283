//! Student roster storage.
//!
//! This module provides the `SQLite`-backed student directory the scan
//! station resolves decoded payloads against: student id -> {class, name}.
//! Unknown ids are an expected outcome, not an error; the caller may proceed
//! with manual entry when a lookup misses.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    /// Student id as encoded in the QR code.
    pub id: String,
    /// Class label, e.g. `3-A`.
    pub class: String,
    /// Student name.
    pub name: String,
}

/// Outcome of a roster lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The id matched a roster entry.
    Found(Student),
    /// No matching entry; carries a display-ready reason.
    NotFound {
        /// Human-readable reason suitable for inline display.
        reason: String,
    },
}

impl LookupOutcome {
    /// The matched student, if any.
    #[must_use]
    pub fn student(&self) -> Option<&Student> {
        match self {
            Self::Found(student) => Some(student),
            Self::NotFound { .. } => None,
        }
    }
}

/// The student directory.
#[derive(Debug)]
pub struct Roster {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Roster {
    /// Open or create a roster database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening roster database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::RosterOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::initialize_schema(&conn)?;

        info!("Roster database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory roster for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::RosterOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        Self::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS students (
                id    TEXT PRIMARY KEY,
                class TEXT NOT NULL,
                name  TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a student by id.
    ///
    /// Ids are trimmed before lookup; an empty or unknown id produces
    /// [`LookupOutcome::NotFound`], never an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the database operation itself fails.
    pub fn lookup(&self, student_id: &str) -> Result<LookupOutcome> {
        let student_id = student_id.trim();
        if student_id.is_empty() {
            return Ok(LookupOutcome::NotFound {
                reason: "empty student id".to_string(),
            });
        }

        let found = self
            .conn
            .query_row(
                "SELECT id, class, name FROM students WHERE id = ?1",
                [student_id],
                |row| {
                    Ok(Student {
                        id: row.get(0)?,
                        class: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(match found {
            Some(student) => {
                debug!("Roster hit for id {}", student.id);
                LookupOutcome::Found(student)
            }
            None => {
                debug!("Roster miss for id {student_id}");
                LookupOutcome::NotFound {
                    reason: format!("no student record for id {student_id}"),
                }
            }
        })
    }

    /// Insert or replace a roster entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn upsert(&self, student: &Student) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO students (id, class, name) VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET class = excluded.class, name = excluded.name
            ",
            params![student.id.trim(), student.class, student.name],
        )?;
        Ok(())
    }

    /// Remove a roster entry. Returns whether an entry was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove(&self, student_id: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM students WHERE id = ?1", [student_id.trim()])?;
        Ok(affected > 0)
    }

    /// List all roster entries, ordered by class then name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self) -> Result<Vec<Student>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, class, name FROM students ORDER BY class, name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Student {
                id: row.get(0)?,
                class: row.get(1)?,
                name: row.get(2)?,
            })
        })?;

        let mut students = Vec::new();
        for student in rows {
            students.push(student?);
        }
        Ok(students)
    }

    /// Number of roster entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Seed the original station fixtures if the roster is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn seed_fixtures(&self) -> Result<()> {
        if self.count()? > 0 {
            return Ok(());
        }
        self.upsert(&Student {
            id: "12344321".to_string(),
            class: "3-A".to_string(),
            name: "Taro Yamada".to_string(),
        })?;
        self.upsert(&Student {
            id: "67890".to_string(),
            class: "2-B".to_string(),
            name: "Hanako Sato".to_string(),
        })?;
        info!("Seeded roster fixtures");
        Ok(())
    }
}
