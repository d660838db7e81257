//! CSV and fixed-width text renderings of a roster snapshot. Rendering is
//! pure; [`write_export`] is the only function that touches the filesystem.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use log::info;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::error::{RecordError, RecordResult};
use crate::models::Student;
use crate::stats::StatisticsSnapshot;

pub const CSV_HEADER: [&str; 9] = [
    "ID",
    "Name",
    "Roll No",
    "Department",
    "Email",
    "Phone",
    "Marks",
    "Grade",
    "Status",
];

const REPORT_TITLE: &str = "STUDENT MANAGEMENT SYSTEM - EXPORT REPORT";
const RULE_WIDTH: usize = 80;

/// Column widths of the report table, in `CSV_HEADER` order.
const COLUMN_WIDTHS: [usize; 9] = [5, 20, 10, 20, 25, 15, 8, 6, 6];
const NAME_LIMIT: usize = 18;
const DEPARTMENT_LIMIT: usize = 18;
const EMAIL_LIMIT: usize = 23;
const ELLIPSIS: &str = "...";

const GENERATED_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const FILE_STAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]_[hour][minute][second]");

/// The two export flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Report,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Report => "txt",
        }
    }
}

/// Render one header row plus one row per student. Fields that contain a
/// comma, quote, or line break are quoted with inner quotes doubled; all other
/// fields are written bare.
pub fn students_to_csv(students: &[Student]) -> RecordResult<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for student in students {
        let id = student.id().to_string();
        let marks = format!("{:.2}", student.marks());
        writer.write_record([
            id.as_str(),
            student.name(),
            student.roll_no(),
            student.department(),
            student.email(),
            student.phone(),
            marks.as_str(),
            student.grade().label(),
            student.status_label(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| RecordError::Export(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| RecordError::Export(err.to_string()))
}

/// Cut `text` to `limit` characters, ending in `...` when shortened.
fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(ELLIPSIS.len());
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str(ELLIPSIS);
    cut
}

fn table_row(cells: [&str; 9]) -> String {
    let mut line = String::new();
    for (cell, width) in cells.iter().zip(COLUMN_WIDTHS) {
        // Cells wider than their column push the rest of the row right.
        let _ = write!(line, "{cell:<width$} ");
    }
    line.trim_end().to_string()
}

/// Render the human-readable report: header block, fixed-width table, and a
/// summary of `stats`. `generated_at` is printed verbatim so identical inputs
/// produce identical text.
pub fn students_to_report(
    students: &[Student],
    stats: &StatisticsSnapshot,
    generated_at: OffsetDateTime,
) -> RecordResult<String> {
    let generated = generated_at
        .format(GENERATED_FORMAT)
        .map_err(|err| RecordError::Export(err.to_string()))?;
    let heavy_rule = "=".repeat(RULE_WIDTH);
    let light_rule = "-".repeat(RULE_WIDTH);

    let mut out = String::new();
    writeln!(out, "{REPORT_TITLE}")?;
    writeln!(out, "Generated on: {generated}")?;
    writeln!(out, "Total Students: {}", students.len())?;
    writeln!(out, "{heavy_rule}")?;
    writeln!(out)?;

    writeln!(out, "{}", table_row(CSV_HEADER))?;
    writeln!(out, "{light_rule}")?;
    for student in students {
        let id = student.id().to_string();
        let name = truncate(student.name(), NAME_LIMIT);
        let department = truncate(student.department(), DEPARTMENT_LIMIT);
        let email = truncate(student.email(), EMAIL_LIMIT);
        let marks = format!("{:.2}", student.marks());
        writeln!(
            out,
            "{}",
            table_row([
                id.as_str(),
                name.as_str(),
                student.roll_no(),
                department.as_str(),
                email.as_str(),
                student.phone(),
                marks.as_str(),
                student.grade().label(),
                student.status_label(),
            ])
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{heavy_rule}")?;
    writeln!(out, "SUMMARY:")?;
    writeln!(out, "Total Students: {}", stats.total_count)?;
    writeln!(out, "Passed: {}", stats.passed_count)?;
    writeln!(out, "Failed: {}", stats.failed_count)?;
    writeln!(out, "Pass Percentage: {:.2}%", stats.pass_percentage)?;
    writeln!(out, "Fail Percentage: {:.2}%", stats.fail_percentage)?;
    writeln!(out, "Average Marks: {:.2}", stats.average_marks)?;
    writeln!(out, "Highest Marks: {:.2}", stats.highest_marks)?;
    writeln!(out, "Lowest Marks: {:.2}", stats.lowest_marks)?;

    writeln!(out)?;
    writeln!(out, "GRADE DISTRIBUTION:")?;
    for (grade, count) in stats.grade_distribution() {
        writeln!(out, "{:<3} {count}", format!("{grade}:"))?;
    }

    if !stats.department_counts.is_empty() {
        writeln!(out)?;
        writeln!(out, "DEPARTMENT DISTRIBUTION:")?;
        for (department, count) in &stats.department_counts {
            writeln!(out, "{department}: {count}")?;
        }
    }

    Ok(out)
}

/// `students_YYYYMMDD_HHMMSS.<ext>`.
pub fn default_export_file_name(
    format: ExportFormat,
    at: OffsetDateTime,
) -> RecordResult<String> {
    let stamp = at
        .format(FILE_STAMP_FORMAT)
        .map_err(|err| RecordError::Export(err.to_string()))?;
    Ok(format!("students_{stamp}.{}", format.extension()))
}

/// Local wall-clock time, or UTC when the local offset cannot be determined.
pub fn timestamp_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Write `contents` to `dir/file_name`, creating `dir` when needed.
pub fn write_export(dir: &Path, file_name: &str, contents: &str) -> RecordResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    fs::write(&path, contents)?;
    info!("wrote export {} ({} bytes)", path.display(), contents.len());
    Ok(path)
}

/// Render `students` in `format` and write the result under `dir` with a
/// timestamped file name.
pub fn export_students(
    dir: &Path,
    format: ExportFormat,
    students: &[Student],
    at: OffsetDateTime,
) -> RecordResult<PathBuf> {
    let contents = match format {
        ExportFormat::Csv => students_to_csv(students)?,
        ExportFormat::Report => {
            let stats = StatisticsSnapshot::from_students(students);
            students_to_report(students, &stats, at)?
        }
    };
    let file_name = default_export_file_name(format, at)?;
    write_export(dir, &file_name, &contents)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::models::StudentDetails;

    fn student(id: i64, name: &str, department: &str, email: &str, marks: f64) -> Student {
        Student::new(
            id,
            StudentDetails::new(name, format!("R{id}"), department, email, "9876543210", marks),
        )
    }

    #[test]
    fn csv_has_fixed_header_and_two_decimal_marks() {
        let csv = students_to_csv(&[student(1, "Asha", "Physics", "a@b.c", 95.0)]).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "ID,Name,Roll No,Department,Email,Phone,Marks,Grade,Status");
        assert_eq!(lines[1], "1,Asha,R1,Physics,a@b.c,9876543210,95.00,A+,Pass");
        assert!(csv.ends_with('\n'));
        assert!(!csv.contains('\r'));
    }

    #[test]
    fn csv_quotes_only_fields_that_need_it() {
        let csv = students_to_csv(&[
            student(1, "Doe, \"John\"", "Electronics & Communication", "", 40.0),
            student(2, "Line\nBreak", "Maths", "", 50.0),
        ])
        .unwrap();
        assert!(csv.contains(
            "\n1,\"Doe, \"\"John\"\"\",R1,Electronics & Communication,,9876543210,40.00,F,Fail\n"
        ));
        assert!(csv.contains("\n2,\"Line\nBreak\",R2,Maths,,9876543210,50.00,D,Pass\n"));
    }

    #[test]
    fn truncation_adds_ellipsis_inside_the_limit() {
        assert_eq!(truncate("Short", 18), "Short");
        assert_eq!(truncate("Exactly eighteen!!", 18), "Exactly eighteen!!");
        let cut = truncate("Bartholomew Fitzgerald-Smythe", 18);
        assert_eq!(cut, "Bartholomew Fit...");
        assert_eq!(cut.chars().count(), 18);
    }

    #[test]
    fn report_is_deterministic_and_summarised() {
        let students = [
            student(1, "Asha", "Physics", "asha@example.edu", 95.0),
            student(2, "Bartholomew Fitzgerald-Smythe", "Maths", "b@example.edu", 55.0),
            student(3, "Chen", "Physics", "chen.long.address@example.edu", 40.0),
        ];
        let stats = StatisticsSnapshot::from_students(&students);
        let at = datetime!(2025-03-14 09:26:53 UTC);

        let first = students_to_report(&students, &stats, at).unwrap();
        let second = students_to_report(&students, &stats, at).unwrap();
        assert_eq!(first, second);

        assert!(first.starts_with(
            "STUDENT MANAGEMENT SYSTEM - EXPORT REPORT\nGenerated on: 2025-03-14 09:26:53\nTotal Students: 3\n"
        ));
        assert!(first.contains("Bartholomew Fit..."));
        assert!(first.contains("chen.long.address@ex..."));
        assert!(first.contains("Passed: 2\n"));
        assert!(first.contains("Failed: 1\n"));
        assert!(first.contains("Pass Percentage: 66.67%\n"));
        assert!(first.contains("Average Marks: 63.33\n"));
        assert!(first.contains("Highest Marks: 95.00\n"));
        assert!(first.contains("Lowest Marks: 40.00\n"));
        assert!(first.contains("A+: 1\nA:  0\nB:  0\nC:  0\nD:  1\nF:  1\n"));
        assert!(first.contains("Physics: 2\nMaths: 1\n"));

        let row = first
            .lines()
            .find(|line| line.starts_with("1 "))
            .expect("row for id 1");
        assert_eq!(
            row,
            "1     Asha                 R1         Physics              asha@example.edu          9876543210      95.00    A+     Pass"
        );
    }

    #[test]
    fn empty_report_still_has_a_summary() {
        let stats = StatisticsSnapshot::from_students(&[]);
        let report = students_to_report(&[], &stats, datetime!(2025-01-01 00:00:00 UTC)).unwrap();
        assert!(report.contains("Total Students: 0\n"));
        assert!(report.contains("Average Marks: 0.00\n"));
        assert!(!report.contains("DEPARTMENT DISTRIBUTION"));
    }

    #[test]
    fn export_files_are_timestamped() {
        let at = datetime!(2025-03-14 09:26:53 UTC);
        assert_eq!(
            default_export_file_name(ExportFormat::Csv, at).unwrap(),
            "students_20250314_092653.csv"
        );

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");
        let students = [student(1, "Asha", "Physics", "", 95.0)];
        let path = export_students(&target, ExportFormat::Report, &students, at).unwrap();
        assert_eq!(path, target.join("students_20250314_092653.txt"));
        let written = fs::read_to_string(path).unwrap();
        assert!(written.contains("SUMMARY:"));
    }
}
