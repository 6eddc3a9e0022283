//! Printable tardiness card rendering.
//!
//! Formats a [`TardinessRecord`] into a fixed-width text card the station
//! sends to the printer: header, labeled field grid, responsible-teacher
//! box, issued-at footer. Synchronous and network-free.

use crate::record::TardinessRecord;

/// Card width in characters.
const CARD_WIDTH: usize = 46;

/// Label column width in the field grid.
const LABEL_WIDTH: usize = 12;

/// Render a record as a printable card.
///
/// Roster fields missing after a failed lookup render as `-`; an unset
/// teacher renders as `unassigned` (printing an unvalidated record is
/// allowed for previews).
#[must_use]
pub fn render_card(record: &TardinessRecord) -> String {
    let mut out = String::new();
    let rule = "=".repeat(CARD_WIDTH);
    let thin_rule = "-".repeat(CARD_WIDTH);

    out.push_str(&rule);
    out.push('\n');
    out.push_str(&center("STUDENT TARDINESS CARD"));
    out.push('\n');
    out.push_str(&center("(submit this card to the teacher in charge)"));
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    push_field(&mut out, "Student ID", &dash_if_empty(&record.student_id));
    push_field(&mut out, "Class", &option_or_dash(record.class.as_deref()));
    push_field(&mut out, "Name", &option_or_dash(record.name.as_deref()));
    push_field(&mut out, "Date/Time", &record.issued_at_text());
    push_field(&mut out, "Contact", &record.contact.to_string());
    push_field(&mut out, "Reason", &record.reason_text());
    push_field(&mut out, "Notes", &dash_if_empty(&record.notes));

    out.push_str(&thin_rule);
    out.push('\n');
    let teacher = if record.teacher.trim().is_empty() {
        "unassigned"
    } else {
        record.teacher.trim()
    };
    push_field(&mut out, "Teacher", teacher);
    out.push_str(&thin_rule);
    out.push('\n');
    out.push_str(&format!("Issued: {}\n", record.issued_at_text()));
    out.push_str(&rule);
    out.push('\n');

    out
}

fn center(text: &str) -> String {
    if text.len() >= CARD_WIDTH {
        return text.to_string();
    }
    let pad = (CARD_WIDTH - text.len()) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

fn push_field(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!("{label:<LABEL_WIDTH$}  {value}\n"));
}

fn dash_if_empty(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_string()
    } else {
        value.trim().to_string()
    }
}

fn option_or_dash(value: Option<&str>) -> String {
    value.map_or_else(|| "-".to_string(), dash_if_empty)
}
