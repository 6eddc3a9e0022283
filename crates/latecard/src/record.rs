//! Tardiness record types.
//!
//! This module defines the assembled set of fields describing one tardiness
//! event, destined for submission or printing: the scanned student identity,
//! the operator-supplied contact/reason metadata, and the responsible
//! teacher.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Whether the student (or guardian) contacted the school beforehand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    /// Prior contact was made.
    Reached,
    /// No prior contact.
    #[default]
    NotReached,
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reached => write!(f, "contacted"),
            Self::NotReached => write!(f, "no contact"),
        }
    }
}

/// Enumerated tardiness reasons offered by the station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TardyReason {
    /// Public transit delay.
    TransitDelay,
    /// Scheduled medical appointment.
    MedicalAppointment,
    /// Feeling unwell.
    Unwell,
    /// Overslept.
    Overslept,
    /// Went back for a forgotten item.
    ForgotItem,
    /// Anything else; requires free-text detail.
    Other,
}

impl std::fmt::Display for TardyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TransitDelay => write!(f, "transit delay"),
            Self::MedicalAppointment => write!(f, "medical appointment"),
            Self::Unwell => write!(f, "unwell"),
            Self::Overslept => write!(f, "overslept"),
            Self::ForgotItem => write!(f, "forgot item"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// One tardiness event, ready for submission or printing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TardinessRecord {
    /// Scanned student id.
    pub student_id: String,
    /// Class label from the roster, if the lookup found one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Student name from the roster, if the lookup found one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// When the card was issued (station wall clock).
    pub issued_at: DateTime<Local>,
    /// Prior-contact status.
    pub contact: ContactStatus,
    /// Selected reason.
    pub reason: TardyReason,
    /// Free-text detail, required when `reason` is [`TardyReason::Other`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_detail: Option<String>,
    /// Responsible teacher.
    pub teacher: String,
    /// Free-text notes.
    #[serde(default)]
    pub notes: String,
}

impl TardinessRecord {
    /// Create a record issued now.
    #[must_use]
    pub fn new(student_id: impl Into<String>, reason: TardyReason, teacher: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            class: None,
            name: None,
            issued_at: Local::now(),
            contact: ContactStatus::default(),
            reason,
            reason_detail: None,
            teacher: teacher.into(),
            notes: String::new(),
        }
    }

    /// The reason as displayed on the card: the free-text detail for
    /// `Other`, the enumerated label otherwise.
    #[must_use]
    pub fn reason_text(&self) -> String {
        match (self.reason, &self.reason_detail) {
            (TardyReason::Other, Some(detail)) if !detail.trim().is_empty() => detail.clone(),
            (TardyReason::Other, _) => "-".to_string(),
            (reason, _) => reason.to_string(),
        }
    }

    /// The issue timestamp formatted for display (`YYYY/MM/DD HH:MM`).
    #[must_use]
    pub fn issued_at_text(&self) -> String {
        self.issued_at.format("%Y/%m/%d %H:%M").to_string()
    }

    /// Validate the record before submission or printing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordInvalid`] when the student id is empty, the
    /// teacher is unset, or reason `Other` lacks detail text.
    pub fn validate(&self) -> Result<()> {
        if self.student_id.trim().is_empty() {
            return Err(Error::record_invalid("student id must not be empty"));
        }
        if self.teacher.trim().is_empty() {
            return Err(Error::record_invalid("responsible teacher must be set"));
        }
        if self.reason == TardyReason::Other
            && self
                .reason_detail
                .as_deref()
                .map_or(true, |d| d.trim().is_empty())
        {
            return Err(Error::record_invalid(
                "reason 'other' requires detail text",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TardinessRecord {
        TardinessRecord::new("12344321", TardyReason::TransitDelay, "Yamamoto")
    }

    #[test]
    fn test_contact_status_display() {
        assert_eq!(ContactStatus::Reached.to_string(), "contacted");
        assert_eq!(ContactStatus::NotReached.to_string(), "no contact");
    }

    #[test]
    fn test_contact_status_default() {
        assert_eq!(ContactStatus::default(), ContactStatus::NotReached);
    }

    #[test]
    fn test_tardy_reason_display() {
        assert_eq!(TardyReason::TransitDelay.to_string(), "transit delay");
        assert_eq!(TardyReason::Other.to_string(), "other");
    }

    #[test]
    fn test_new_record() {
        let record = record();
        assert_eq!(record.student_id, "12344321");
        assert_eq!(record.teacher, "Yamamoto");
        assert!(record.class.is_none());
        assert!(record.notes.is_empty());
    }

    #[test]
    fn test_validate_ok() {
        assert!(record().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_student_id() {
        let mut record = record();
        record.student_id = "  ".to_string();
        let err = record.validate().unwrap_err();
        assert!(err.to_string().contains("student id"));
    }

    #[test]
    fn test_validate_unset_teacher() {
        let mut record = record();
        record.teacher = String::new();
        let err = record.validate().unwrap_err();
        assert!(err.to_string().contains("teacher"));
    }

    #[test]
    fn test_validate_other_requires_detail() {
        let mut record = record();
        record.reason = TardyReason::Other;
        assert!(record.validate().is_err());

        record.reason_detail = Some("family emergency".to_string());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_reason_text_enumerated() {
        assert_eq!(record().reason_text(), "transit delay");
    }

    #[test]
    fn test_reason_text_other_with_detail() {
        let mut record = record();
        record.reason = TardyReason::Other;
        record.reason_detail = Some("family emergency".to_string());
        assert_eq!(record.reason_text(), "family emergency");
    }

    #[test]
    fn test_reason_text_other_without_detail() {
        let mut record = record();
        record.reason = TardyReason::Other;
        assert_eq!(record.reason_text(), "-");
    }

    #[test]
    fn test_issued_at_text_format() {
        let record = record();
        let text = record.issued_at_text();
        // YYYY/MM/DD HH:MM
        assert_eq!(text.len(), 16);
        assert_eq!(&text[4..5], "/");
        assert_eq!(&text[13..14], ":");
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut record = record();
        record.class = Some("3-A".to_string());
        record.name = Some("Taro Yamada".to_string());
        record.notes = "will bring a note tomorrow".to_string();

        let json = serde_json::to_string(&record).unwrap();
        let back: TardinessRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn test_serialization_skips_absent_roster_fields() {
        let json = serde_json::to_string(&record()).unwrap();
        assert!(!json.contains("\"class\""));
        assert!(!json.contains("\"name\""));
    }
}
