use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Params, Row};

use crate::error::{RecordError, RecordResult};
use crate::models::{Student, StudentDetails};

use super::is_unique_violation;

/// Column list shared by every query that hydrates a [`Student`].
const STUDENT_COLUMNS: &str = "id, name, roll_no, department, email, phone, marks";

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student::new(
        row.get(0)?,
        StudentDetails {
            name: row.get(1)?,
            roll_no: row.get(2)?,
            department: row.get(3)?,
            email: row.get(4)?,
            phone: row.get(5)?,
            marks: row.get(6)?,
        },
    ))
}

/// Run a student query and collect every row, tagging failures with
/// `operation`.
fn query_students<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    operation: &'static str,
) -> RecordResult<Vec<Student>> {
    let mut stmt = conn.prepare(sql).map_err(RecordError::store(operation))?;
    let students = stmt
        .query_map(params, student_from_row)
        .map_err(RecordError::store(operation))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(RecordError::store(operation))?;
    debug!("{operation}: {} row(s)", students.len());
    Ok(students)
}

/// SQLite binds NaN as NULL, so a non-finite score must never reach a write.
fn ensure_storable_marks(marks: f64) -> RecordResult<()> {
    if marks.is_finite() {
        Ok(())
    } else {
        Err(RecordError::OutOfDomain { marks })
    }
}

/// Persist a new record and return it with its assigned id. Finite marks are
/// stored as given; range checks belong to the caller.
pub fn insert_student(conn: &Connection, details: &StudentDetails) -> RecordResult<Student> {
    ensure_storable_marks(details.marks)?;
    conn.execute(
        "INSERT INTO students (name, roll_no, department, email, phone, marks)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            details.name,
            details.roll_no,
            details.department,
            details.email,
            details.phone,
            details.marks
        ],
    )
    .map_err(|err| {
        if is_unique_violation(&err) {
            RecordError::DuplicateKey {
                what: "Roll number",
                key: details.roll_no.clone(),
            }
        } else {
            RecordError::store("insert student")(err)
        }
    })?;

    let id = conn.last_insert_rowid();
    info!("inserted student {} as id {id}", details.roll_no);
    Ok(Student::new(id, details.clone()))
}

/// Replace every field of the record keyed by `roll_no` except the roll
/// number itself, which never changes after creation.
pub fn update_student(
    conn: &Connection,
    roll_no: &str,
    details: &StudentDetails,
) -> RecordResult<Student> {
    ensure_storable_marks(details.marks)?;
    let updated = conn
        .execute(
            "UPDATE students
             SET name = ?1, department = ?2, email = ?3, phone = ?4, marks = ?5,
                 updated_at = CURRENT_TIMESTAMP
             WHERE roll_no = ?6",
            params![
                details.name,
                details.department,
                details.email,
                details.phone,
                details.marks,
                roll_no
            ],
        )
        .map_err(RecordError::store("update student"))?;

    if updated == 0 {
        return Err(RecordError::NotFound {
            roll_no: roll_no.to_string(),
        });
    }

    info!("updated student {roll_no}");
    fetch_student_by_roll_no(conn, roll_no)?.ok_or_else(|| RecordError::NotFound {
        roll_no: roll_no.to_string(),
    })
}

pub fn delete_student(conn: &Connection, roll_no: &str) -> RecordResult<()> {
    let deleted = conn
        .execute("DELETE FROM students WHERE roll_no = ?1", params![roll_no])
        .map_err(RecordError::store("delete student"))?;

    if deleted == 0 {
        Err(RecordError::NotFound {
            roll_no: roll_no.to_string(),
        })
    } else {
        info!("deleted student {roll_no}");
        Ok(())
    }
}

/// Every record, in insertion order.
pub fn fetch_all_students(conn: &Connection) -> RecordResult<Vec<Student>> {
    query_students(
        conn,
        &format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY id"),
        [],
        "load students",
    )
}

pub fn fetch_student_by_roll_no(conn: &Connection, roll_no: &str) -> RecordResult<Option<Student>> {
    conn.query_row(
        &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE roll_no = ?1"),
        params![roll_no],
        student_from_row,
    )
    .optional()
    .map_err(RecordError::store("look up student"))
}

/// Case-insensitive substring match on the name. `instr` keeps `%` and `_`
/// in the needle literal.
pub fn search_students_by_name(conn: &Connection, needle: &str) -> RecordResult<Vec<Student>> {
    query_students(
        conn,
        &format!(
            "SELECT {STUDENT_COLUMNS} FROM students
             WHERE instr(LOWER(name), LOWER(?1)) > 0
             ORDER BY id"
        ),
        params![needle],
        "search by name",
    )
}

/// Case-insensitive substring match on the department.
pub fn search_students_by_department(
    conn: &Connection,
    needle: &str,
) -> RecordResult<Vec<Student>> {
    query_students(
        conn,
        &format!(
            "SELECT {STUDENT_COLUMNS} FROM students
             WHERE instr(LOWER(department), LOWER(?1)) > 0
             ORDER BY id"
        ),
        params![needle],
        "search by department",
    )
}

/// Substring match on the roll number, case preserved.
pub fn search_students_by_roll_no(conn: &Connection, needle: &str) -> RecordResult<Vec<Student>> {
    query_students(
        conn,
        &format!(
            "SELECT {STUDENT_COLUMNS} FROM students
             WHERE instr(roll_no, ?1) > 0
             ORDER BY id"
        ),
        params![needle],
        "search by roll number",
    )
}

/// Records with `min <= marks <= max`. Inverted or non-finite bounds are
/// rejected rather than silently matching nothing.
pub fn search_students_by_marks_range(
    conn: &Connection,
    min: f64,
    max: f64,
) -> RecordResult<Vec<Student>> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(RecordError::InvalidRange { min, max });
    }

    query_students(
        conn,
        &format!(
            "SELECT {STUDENT_COLUMNS} FROM students
             WHERE marks BETWEEN ?1 AND ?2
             ORDER BY id"
        ),
        params![min, max],
        "search by marks range",
    )
}

/// Distinct departments on file, for selection lists and autocomplete.
pub fn fetch_departments(conn: &Connection) -> RecordResult<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT DISTINCT department FROM students
             WHERE department <> ''
             ORDER BY LOWER(department), department",
        )
        .map_err(RecordError::store("load departments"))?;

    let departments = stmt
        .query_map([], |row| row.get(0))
        .map_err(RecordError::store("load departments"))?
        .collect::<Result<Vec<String>, _>>()
        .map_err(RecordError::store("load departments"))?;

    Ok(departments)
}

/// Existence probe used by the insert path to report duplicates before
/// attempting the write.
pub fn roll_no_exists(conn: &Connection, roll_no: &str) -> RecordResult<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM students WHERE roll_no = ?1)",
        params![roll_no],
        |row| row.get(0),
    )
    .map_err(RecordError::store("check roll number"))
}

pub fn count_students(conn: &Connection) -> RecordResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))
        .map_err(RecordError::store("count students"))
}
