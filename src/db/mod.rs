//! Persistence module split across logical submodules.

mod accounts;
mod connection;
mod students;

use rusqlite::{ffi, Error as SqlError, ErrorCode};

pub use accounts::{create_account, find_by_credentials};
pub use connection::Session;
pub use students::{
    count_students, delete_student, fetch_all_students, fetch_departments,
    fetch_student_by_roll_no, insert_student, roll_no_exists, search_students_by_department,
    search_students_by_marks_range, search_students_by_name, search_students_by_roll_no,
    update_student,
};

/// True when SQLite rejected a write because a `UNIQUE` column clashed. Other
/// constraint failures (NOT NULL and friends) are not duplicates.
pub(crate) fn is_unique_violation(err: &SqlError) -> bool {
    match err {
        SqlError::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}
