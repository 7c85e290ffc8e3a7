//! Timeline error types and formatting.
//!
//! `TimelineError` is a typed enum for reader failures that can be
//! pattern-matched and tested. Use `.into()` to convert to `anyhow::Error`
//! while preserving the type for pattern matching. Display produces styled
//! output for users.

use color_print::cwrite;

use crate::styling::{ERROR_EMOJI, HINT_EMOJI};

/// Parse failures for the event log reader.
///
/// Malformed rows abort the whole read; there is no best-effort recovery.
/// Each variant carries the 1-based line number of the offending row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// A row with fewer than the four mandatory fields.
    TruncatedRow { line: usize, fields: usize },
    /// A mandatory field that failed integer parsing.
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },
}

impl std::error::Error for TimelineError {}

impl std::fmt::Display for TimelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimelineError::TruncatedRow { line, fields } => {
                cwrite!(
                    f,
                    "{ERROR_EMOJI} <red>Malformed row at line <bold>{line}</>: expected at least 4 fields, found {fields}</>\n\n{HINT_EMOJI} <dim>Rows look like: </>event,frame,timestamp,stream<dim>[,flag...]</>"
                )
            }

            TimelineError::InvalidField { line, field, value } => {
                cwrite!(
                    f,
                    "{ERROR_EMOJI} <red>Malformed row at line <bold>{line}</>: invalid {field} <bold>{value}</></>"
                )
            }
        }
    }
}
