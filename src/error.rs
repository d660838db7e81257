//! Typed failures produced by the records engine. Every path through the
//! store, the validators, and the exporters ends in one of these variants so
//! the front-end can render a distinct message per kind.

use thiserror::Error;

/// Errors surfaced by the records engine.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Insert with a roll number (or username) that is already taken.
    #[error("{what} '{key}' already exists.")]
    DuplicateKey { what: &'static str, key: String },

    /// Update, delete, or lookup against a key that is not stored.
    #[error("No student with roll number '{roll_no}'.")]
    NotFound { roll_no: String },

    /// Numeric range whose bounds are inverted or not finite.
    #[error("Invalid marks range {min} to {max}: the lower bound must not exceed the upper.")]
    InvalidRange { min: f64, max: f64 },

    /// Range text that does not read as `<min>-<max>`.
    #[error("Malformed marks range '{input}'. Use the form 70-90.")]
    MalformedRange { input: String },

    /// Marks outside the `[0, 100]` domain.
    #[error("Marks must be between 0 and 100 (got {marks}).")]
    OutOfDomain { marks: f64 },

    /// A required form field was left blank.
    #[error("Please enter {field}.")]
    MissingField { field: &'static str },

    /// A form field whose text does not have the expected shape.
    #[error("Please enter a valid {field}.")]
    InvalidField { field: &'static str },

    /// The backing store could not complete the operation.
    #[error("Store unavailable while trying to {operation}: {source}")]
    StoreUnavailable {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// Rendering or writing an export artifact failed.
    #[error("Export failed: {0}")]
    Export(String),
}

/// Field-free discriminant of [`RecordError`], handy for matching in tests
/// and for mapping errors to UI treatments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DuplicateKey,
    NotFound,
    InvalidRange,
    MalformedRange,
    OutOfDomain,
    MissingField,
    InvalidField,
    StoreUnavailable,
    Export,
}

impl RecordError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecordError::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            RecordError::NotFound { .. } => ErrorKind::NotFound,
            RecordError::InvalidRange { .. } => ErrorKind::InvalidRange,
            RecordError::MalformedRange { .. } => ErrorKind::MalformedRange,
            RecordError::OutOfDomain { .. } => ErrorKind::OutOfDomain,
            RecordError::MissingField { .. } => ErrorKind::MissingField,
            RecordError::InvalidField { .. } => ErrorKind::InvalidField,
            RecordError::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
            RecordError::Export(_) => ErrorKind::Export,
        }
    }

    /// Wrap a raw SQLite failure with the name of the operation that hit it.
    pub(crate) fn store(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| RecordError::StoreUnavailable { operation, source }
    }
}

impl From<csv::Error> for RecordError {
    fn from(err: csv::Error) -> Self {
        RecordError::Export(err.to_string())
    }
}

impl From<std::fmt::Error> for RecordError {
    fn from(err: std::fmt::Error) -> Self {
        RecordError::Export(err.to_string())
    }
}

impl From<std::io::Error> for RecordError {
    fn from(err: std::io::Error) -> Self {
        RecordError::Export(err.to_string())
    }
}

/// Engine-wide result alias.
pub type RecordResult<T> = std::result::Result<T, RecordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let err = RecordError::DuplicateKey {
            what: "Roll number",
            key: "R1".into(),
        };
        assert_eq!(err.to_string(), "Roll number 'R1' already exists.");

        let err = RecordError::OutOfDomain { marks: 101.0 };
        assert_eq!(err.kind(), ErrorKind::OutOfDomain);
        assert!(err.to_string().contains("101"));
    }

    #[test]
    fn store_failures_keep_their_source() {
        let err = RecordError::store("load students")(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn formatting_failures_are_export_errors() {
        let err = RecordError::from(std::fmt::Error);
        assert_eq!(err.kind(), ErrorKind::Export);
    }
}
