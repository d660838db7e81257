//! Checks that run before any write reaches the store: required fields,
//! email/phone shape, marks parsing and domain. The `add_student` and
//! `edit_student` entry points chain validation with the store call so the
//! front-end never writes unchecked input.

use std::sync::OnceLock;

use log::warn;
use regex::Regex;
use rusqlite::Connection;

use crate::db::{fetch_departments, insert_student, roll_no_exists, update_student};
use crate::error::{RecordError, RecordResult};
use crate::models::{Student, StudentDetails};

/// Departments offered even before any record mentions them.
pub const DEFAULT_DEPARTMENTS: [&str; 6] = [
    "Computer Science",
    "Electrical Engineering",
    "Mechanical Engineering",
    "Civil Engineering",
    "Information Technology",
    "Electronics & Communication",
];

pub const MIN_MARKS: f64 = 0.0;
pub const MAX_MARKS: f64 = 100.0;

/// Raw text exactly as typed into the student form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentInput {
    pub name: String,
    pub roll_no: String,
    pub department: String,
    pub email: String,
    pub phone: String,
    pub marks: String,
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9+_.-]+@(.+)$").expect("valid email regex"))
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{10,15}$").expect("valid phone regex"))
}

fn required(value: &str, field: &'static str) -> RecordResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(RecordError::MissingField { field })
    } else {
        Ok(trimmed.to_string())
    }
}

/// Reject marks outside `[0, 100]`.
pub fn validate_marks(marks: f64) -> RecordResult<f64> {
    if (MIN_MARKS..=MAX_MARKS).contains(&marks) {
        Ok(marks)
    } else {
        Err(RecordError::OutOfDomain { marks })
    }
}

/// Parse the marks field and check its domain.
pub fn parse_marks(raw: &str) -> RecordResult<f64> {
    let marks: f64 = raw
        .trim()
        .parse()
        .map_err(|_| RecordError::InvalidField { field: "marks" })?;
    if marks.is_nan() {
        return Err(RecordError::InvalidField { field: "marks" });
    }
    validate_marks(marks)
}

/// Validate form text and produce trimmed, typed details.
pub fn validate_student(input: &StudentInput) -> RecordResult<StudentDetails> {
    let name = required(&input.name, "student name")?;
    let roll_no = required(&input.roll_no, "roll number")?;
    let department = required(&input.department, "a department")?;

    let email = input.email.trim();
    if !email.is_empty() && !email_pattern().is_match(email) {
        return Err(RecordError::InvalidField {
            field: "email address",
        });
    }

    let phone = input.phone.trim();
    if !phone.is_empty() && !phone_pattern().is_match(phone) {
        return Err(RecordError::InvalidField {
            field: "phone number",
        });
    }

    let marks = parse_marks(&input.marks)?;

    Ok(StudentDetails {
        name,
        roll_no,
        department,
        email: email.to_string(),
        phone: phone.to_string(),
        marks,
    })
}

/// Validate and insert. Duplicate roll numbers are caught by an existence
/// check before the write is attempted.
pub fn add_student(conn: &Connection, input: &StudentInput) -> RecordResult<Student> {
    let details = validate_student(input).inspect_err(|err| warn!("rejected new student: {err}"))?;

    if roll_no_exists(conn, &details.roll_no)? {
        warn!("rejected new student: roll number {} taken", details.roll_no);
        return Err(RecordError::DuplicateKey {
            what: "Roll number",
            key: details.roll_no,
        });
    }

    insert_student(conn, &details)
}

/// Validate and update the record keyed by `roll_no`.
pub fn edit_student(conn: &Connection, roll_no: &str, input: &StudentInput) -> RecordResult<Student> {
    let details =
        validate_student(input).inspect_err(|err| warn!("rejected edit of {roll_no}: {err}"))?;
    update_student(conn, roll_no, &details)
}

/// Default departments followed by any extra ones already on file.
pub fn department_choices(conn: &Connection) -> RecordResult<Vec<String>> {
    let mut choices: Vec<String> = DEFAULT_DEPARTMENTS.iter().map(|d| d.to_string()).collect();
    for department in fetch_departments(conn)? {
        if !choices.contains(&department) {
            choices.push(department);
        }
    }
    Ok(choices)
}

impl StudentInput {
    /// Pre-fill the form from a stored record when editing.
    pub fn from_student(student: &Student) -> Self {
        Self {
            name: student.name().to_string(),
            roll_no: student.roll_no().to_string(),
            department: student.department().to_string(),
            email: student.email().to_string(),
            phone: student.phone().to_string(),
            marks: format!("{}", student.marks()),
        }
    }
}
