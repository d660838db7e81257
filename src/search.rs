//! Routes a free-text query plus a mode selector to the matching store call.

use std::fmt;

use log::debug;
use rusqlite::Connection;

use crate::db::{
    fetch_all_students, search_students_by_department, search_students_by_marks_range,
    search_students_by_name, search_students_by_roll_no,
};
use crate::error::{RecordError, RecordResult};
use crate::models::Student;

/// Which field a search targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    All,
    Name,
    RollNo,
    Department,
    MarksRange,
}

impl SearchMode {
    pub const ALL_MODES: [SearchMode; 5] = [
        SearchMode::All,
        SearchMode::Name,
        SearchMode::RollNo,
        SearchMode::Department,
        SearchMode::MarksRange,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SearchMode::All => "All",
            SearchMode::Name => "Name",
            SearchMode::RollNo => "Roll No",
            SearchMode::Department => "Department",
            SearchMode::MarksRange => "Marks Range",
        }
    }

    /// Map a selector label to a mode. Unknown labels fall back to `All`.
    pub fn from_label(label: &str) -> Self {
        let wanted = label.trim();
        Self::ALL_MODES
            .into_iter()
            .find(|mode| mode.label().eq_ignore_ascii_case(wanted))
            .unwrap_or_default()
    }

    /// The next mode in selector order, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL_MODES
            .iter()
            .position(|mode| *mode == self)
            .unwrap_or(0);
        Self::ALL_MODES[(idx + 1) % Self::ALL_MODES.len()]
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parse `"<min>-<max>"` into two finite bounds. Bound order is not checked
/// here; the store rejects inverted ranges.
pub fn parse_marks_range(text: &str) -> RecordResult<(f64, f64)> {
    let malformed = || RecordError::MalformedRange {
        input: text.to_string(),
    };

    let mut parts = text.split('-');
    let (Some(low), Some(high), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };

    let parse = |token: &str| {
        token
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(malformed)
    };

    Ok((parse(low)?, parse(high)?))
}

/// Run the query selected by `mode`. Blank text always lists everything.
/// When this returns an error no query has been applied, so callers keep
/// whatever results they were showing.
pub fn run_search(conn: &Connection, mode: SearchMode, text: &str) -> RecordResult<Vec<Student>> {
    let text = text.trim();
    debug!("search mode={mode} text={text:?}");

    if text.is_empty() {
        return fetch_all_students(conn);
    }

    match mode {
        SearchMode::All => fetch_all_students(conn),
        SearchMode::Name => search_students_by_name(conn, text),
        SearchMode::RollNo => search_students_by_roll_no(conn, text),
        SearchMode::Department => search_students_by_department(conn, text),
        SearchMode::MarksRange => {
            let (min, max) = parse_marks_range(text)?;
            search_students_by_marks_range(conn, min, max)
        }
    }
}
