use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::grade;
use crate::models::Student;
use crate::search::SearchMode;
use crate::validation::{parse_marks, StudentInput};

/// Fields of the student form, in focus order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum StudentField {
    #[default]
    Name,
    RollNo,
    Department,
    Email,
    Phone,
    Marks,
}

impl StudentField {
    const ORDER: [StudentField; 6] = [
        StudentField::Name,
        StudentField::RollNo,
        StudentField::Department,
        StudentField::Email,
        StudentField::Phone,
        StudentField::Marks,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            StudentField::Name => "Name",
            StudentField::RollNo => "Roll No",
            StudentField::Department => "Department",
            StudentField::Email => "Email",
            StudentField::Phone => "Phone",
            StudentField::Marks => "Marks",
        }
    }

    fn required(self) -> bool {
        matches!(
            self,
            StudentField::Name | StudentField::RollNo | StudentField::Department | StudentField::Marks
        )
    }
}

/// Add/edit form state. When editing, the roll number is shown but cannot be
/// focused or changed.
#[derive(Default, Clone)]
pub(crate) struct StudentForm {
    pub(crate) input: StudentInput,
    pub(crate) active: StudentField,
    pub(crate) roll_no_locked: bool,
    pub(crate) error: Option<String>,
    pub(crate) suggestion: Option<String>,
    pub(crate) autocomplete_disabled: bool,
}

impl StudentForm {
    /// Populate the form from an existing record when entering edit mode.
    pub(crate) fn from_student(student: &Student) -> Self {
        Self {
            input: StudentInput::from_student(student),
            roll_no_locked: true,
            ..Self::default()
        }
    }

    pub(crate) fn fields(&self) -> impl Iterator<Item = StudentField> + '_ {
        StudentField::ORDER.into_iter()
    }

    fn value(&self, field: StudentField) -> &str {
        match field {
            StudentField::Name => &self.input.name,
            StudentField::RollNo => &self.input.roll_no,
            StudentField::Department => &self.input.department,
            StudentField::Email => &self.input.email,
            StudentField::Phone => &self.input.phone,
            StudentField::Marks => &self.input.marks,
        }
    }

    fn value_mut(&mut self, field: StudentField) -> &mut String {
        match field {
            StudentField::Name => &mut self.input.name,
            StudentField::RollNo => &mut self.input.roll_no,
            StudentField::Department => &mut self.input.department,
            StudentField::Email => &mut self.input.email,
            StudentField::Phone => &mut self.input.phone,
            StudentField::Marks => &mut self.input.marks,
        }
    }

    fn focusable(&self, field: StudentField) -> bool {
        !(self.roll_no_locked && field == StudentField::RollNo)
    }

    /// Move focus forward (`step = 1`) or backward (`step = -1`), skipping the
    /// locked roll number.
    pub(crate) fn cycle_field(&mut self, step: isize) {
        let len = StudentField::ORDER.len() as isize;
        let mut idx = StudentField::ORDER
            .iter()
            .position(|f| *f == self.active)
            .unwrap_or(0) as isize;
        loop {
            idx = (idx + step).rem_euclid(len);
            let candidate = StudentField::ORDER[idx as usize];
            if self.focusable(candidate) {
                self.active = candidate;
                break;
            }
        }
        if self.active != StudentField::Department {
            self.suggestion = None;
        }
    }

    /// Insert a character into the active field.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        if self.active == StudentField::Marks && !(ch.is_ascii_digit() || ch == '.') {
            return false;
        }
        if self.active == StudentField::Department {
            self.autocomplete_disabled = false;
        }
        let field = self.active;
        self.value_mut(field).push(ch);
        true
    }

    /// Remove a character from the active field.
    pub(crate) fn backspace(&mut self) {
        let field = self.active;
        self.value_mut(field).pop();
        if field == StudentField::Department {
            self.autocomplete_disabled = false;
        }
    }

    /// Suggest a known department whose name starts with the typed text.
    pub(crate) fn update_suggestion(&mut self, departments: &[String]) {
        if self.active != StudentField::Department
            || self.autocomplete_disabled
            || self.input.department.is_empty()
        {
            self.suggestion = None;
            return;
        }

        let typed = self.input.department.to_lowercase();
        self.suggestion = departments
            .iter()
            .find(|candidate| {
                let lower = candidate.to_lowercase();
                lower.starts_with(&typed) && lower != typed
            })
            .cloned();
    }

    /// Replace the department with the suggestion, if any.
    pub(crate) fn accept_suggestion(&mut self) -> bool {
        match self.suggestion.take() {
            Some(candidate) => {
                self.input.department = candidate;
                self.autocomplete_disabled = true;
                true
            }
            None => false,
        }
    }

    /// Characters of the suggestion beyond what has been typed, shown ghosted.
    pub(crate) fn suggestion_suffix(&self) -> Option<String> {
        let candidate = self.suggestion.as_ref()?;
        let typed = self.input.department.chars().count();
        let suffix: String = candidate.chars().skip(typed).collect();
        (!suffix.is_empty()).then_some(suffix)
    }

    /// Grade and status preview for the marks typed so far.
    pub(crate) fn grade_preview(&self) -> Line<'static> {
        match parse_marks(&self.input.marks) {
            Ok(marks) => {
                let grade = grade::grade_of(marks);
                let (status, color) = if grade::passed(marks) {
                    ("Pass", Color::Green)
                } else {
                    ("Fail", Color::Red)
                };
                Line::from(vec![
                    Span::raw(format!("Grade: {grade}  GPA: {:.1}  ", grade::gpa_of(marks))),
                    Span::styled(status, Style::default().fg(color)),
                ])
            }
            Err(_) => Line::from(Span::styled(
                "Grade: -",
                Style::default().fg(Color::DarkGray),
            )),
        }
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: StudentField) -> Line<'static> {
        let value = self.value(field);
        let is_active = self.active == field;
        let locked = !self.focusable(field);

        let display = if value.is_empty() {
            if field.required() {
                "<required>".to_string()
            } else {
                "<optional>".to_string()
            }
        } else {
            value.to_string()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if locked || value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        let mut spans = vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ];
        if is_active && field == StudentField::Department {
            if let Some(suffix) = self.suggestion_suffix() {
                spans.push(Span::styled(suffix, Style::default().fg(Color::DarkGray)));
            }
        }
        Line::from(spans)
    }

    /// Cursor column offset inside the form for the active field.
    pub(crate) fn cursor_offset(&self) -> u16 {
        let prefix = self.active.label().len() + 2;
        (prefix + self.value(self.active).chars().count()) as u16
    }

    /// Row index of the active field inside the form.
    pub(crate) fn cursor_row(&self) -> u16 {
        StudentField::ORDER
            .iter()
            .position(|f| *f == self.active)
            .unwrap_or(0) as u16
    }
}

/// Pending delete, kept until the user confirms.
#[derive(Clone)]
pub(crate) struct ConfirmStudentDelete {
    pub(crate) roll_no: String,
    pub(crate) name: String,
}

impl ConfirmStudentDelete {
    pub(crate) fn from(student: &Student) -> Self {
        Self {
            roll_no: student.roll_no().to_string(),
            name: student.name().to_string(),
        }
    }
}

/// Search bar state: the text being typed and the field it targets.
#[derive(Clone, Default)]
pub(crate) struct SearchState {
    pub(crate) mode: SearchMode,
    pub(crate) query: String,
}

impl SearchState {
    pub(crate) fn prompt(&self) -> String {
        format!("Search [{}]: ", self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudentDetails;

    #[test]
    fn editing_skips_the_locked_roll_number() {
        let student = Student::new(1, StudentDetails::new("A", "R1", "Physics", "", "", 70.0));
        let mut form = StudentForm::from_student(&student);
        assert_eq!(form.active, StudentField::Name);
        form.cycle_field(1);
        assert_eq!(form.active, StudentField::Department);
        form.cycle_field(-1);
        assert_eq!(form.active, StudentField::Name);
        form.cycle_field(-1);
        assert_eq!(form.active, StudentField::Marks);
    }

    #[test]
    fn marks_field_only_takes_numbers() {
        let mut form = StudentForm {
            active: StudentField::Marks,
            ..StudentForm::default()
        };
        assert!(form.push_char('7'));
        assert!(!form.push_char('x'));
        assert!(form.push_char('.'));
        assert!(form.push_char('5'));
        assert_eq!(form.input.marks, "7.5");
    }

    #[test]
    fn department_autocomplete() {
        let departments = vec!["Civil Engineering".to_string(), "Computer Science".to_string()];
        let mut form = StudentForm {
            active: StudentField::Department,
            ..StudentForm::default()
        };
        for ch in "com".chars() {
            form.push_char(ch);
        }
        form.update_suggestion(&departments);
        assert_eq!(form.suggestion_suffix().as_deref(), Some("puter Science"));
        assert!(form.accept_suggestion());
        assert_eq!(form.input.department, "Computer Science");

        form.update_suggestion(&departments);
        assert!(form.suggestion.is_none());
    }
}
