//! Domain models that mirror the SQLite schema. A record that has not been
//! stored yet is a bare [`StudentDetails`]; once the store hands back an id it
//! becomes a [`Student`]. Neither type offers setters: edits go through a full
//! update in the store and come back as a fresh value.

use std::fmt;

use crate::grade::{self, Grade};

/// Caller-supplied fields of a student record, without an id.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentDetails {
    pub name: String,
    /// Business key, unique across the roster.
    pub roll_no: String,
    pub department: String,
    pub email: String,
    pub phone: String,
    /// Score in `[0, 100]` once it has passed validation.
    pub marks: f64,
}

impl StudentDetails {
    pub fn new(
        name: impl Into<String>,
        roll_no: impl Into<String>,
        department: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        marks: f64,
    ) -> Self {
        Self {
            name: name.into(),
            roll_no: roll_no.into(),
            department: department.into(),
            email: email.into(),
            phone: phone.into(),
            marks,
        }
    }
}

/// A persisted student record.
#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    id: i64,
    details: StudentDetails,
}

impl Student {
    /// Pair store-assigned `id` with the stored fields.
    pub fn new(id: i64, details: StudentDetails) -> Self {
        Self { id, details }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn details(&self) -> &StudentDetails {
        &self.details
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn roll_no(&self) -> &str {
        &self.details.roll_no
    }

    pub fn department(&self) -> &str {
        &self.details.department
    }

    pub fn email(&self) -> &str {
        &self.details.email
    }

    pub fn phone(&self) -> &str {
        &self.details.phone
    }

    pub fn marks(&self) -> f64 {
        self.details.marks
    }

    pub fn grade(&self) -> Grade {
        grade::grade_of(self.details.marks)
    }

    pub fn gpa(&self) -> f64 {
        grade::gpa_of(self.details.marks)
    }

    pub fn passed(&self) -> bool {
        grade::passed(self.details.marks)
    }

    /// `Pass` / `Fail`, as shown in tables and exports.
    pub fn status_label(&self) -> &'static str {
        if self.passed() {
            "Pass"
        } else {
            "Fail"
        }
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.details.name, self.details.roll_no)
    }
}

/// Access level attached to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Admin,
    Staff,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }

    /// Unknown role names fall back to the administrative default.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "staff" => Role::Staff,
            _ => Role::Admin,
        }
    }
}

/// A login account as stored in the `users` table.
#[derive(Debug, Clone, PartialEq)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    /// Opaque credential, compared verbatim.
    pub password: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_fields_follow_marks() {
        let student = Student::new(
            7,
            StudentDetails::new("Asha", "CS-07", "Computer Science", "", "", 84.5),
        );
        assert_eq!(student.id(), 7);
        assert_eq!(student.grade(), Grade::A);
        assert_eq!(student.gpa(), 3.5);
        assert!(student.passed());
        assert_eq!(student.status_label(), "Pass");
        assert_eq!(student.to_string(), "Asha (CS-07)");
    }

    #[test]
    fn role_defaults_to_admin() {
        assert_eq!(Role::default(), Role::Admin);
        assert_eq!(Role::parse("Staff"), Role::Staff);
        assert_eq!(Role::parse("superuser"), Role::Admin);
    }
}
