//! One-pass roster statistics. Every screen and export that shows counts or
//! extrema goes through [`StatisticsSnapshot::from_students`].

use std::collections::BTreeMap;

use crate::grade::Grade;
use crate::models::Student;

/// Aggregates over a point-in-time list of records. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsSnapshot {
    pub total_count: usize,
    pub passed_count: usize,
    pub failed_count: usize,
    pub pass_percentage: f64,
    pub fail_percentage: f64,
    pub average_marks: f64,
    pub highest_marks: f64,
    pub lowest_marks: f64,
    /// `(department, count)` in the order each department first appears.
    pub department_counts: Vec<(String, usize)>,
    /// Only grades that occur are present; see [`Self::grade_distribution`].
    pub grade_counts: BTreeMap<Grade, usize>,
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

impl StatisticsSnapshot {
    pub fn from_students(students: &[Student]) -> Self {
        let total_count = students.len();
        let passed_count = students.iter().filter(|s| s.passed()).count();
        let failed_count = total_count - passed_count;

        let (average_marks, highest_marks, lowest_marks) = if students.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let sum: f64 = students.iter().map(Student::marks).sum();
            let highest = students
                .iter()
                .map(Student::marks)
                .fold(f64::NEG_INFINITY, f64::max);
            let lowest = students
                .iter()
                .map(Student::marks)
                .fold(f64::INFINITY, f64::min);
            (sum / total_count as f64, highest, lowest)
        };

        let mut department_counts: Vec<(String, usize)> = Vec::new();
        let mut grade_counts = BTreeMap::new();
        for student in students {
            match department_counts
                .iter_mut()
                .find(|(name, _)| name == student.department())
            {
                Some((_, count)) => *count += 1,
                None => department_counts.push((student.department().to_string(), 1)),
            }
            *grade_counts.entry(student.grade()).or_insert(0) += 1;
        }

        Self {
            total_count,
            passed_count,
            failed_count,
            pass_percentage: percentage(passed_count, total_count),
            fail_percentage: percentage(failed_count, total_count),
            average_marks,
            highest_marks,
            lowest_marks,
            department_counts,
            grade_counts,
        }
    }

    /// Count for one grade, zero when absent.
    pub fn grade_count(&self, grade: Grade) -> usize {
        self.grade_counts.get(&grade).copied().unwrap_or(0)
    }

    /// All six grades in canonical order, absent grades as zero.
    pub fn grade_distribution(&self) -> [(Grade, usize); 6] {
        Grade::ALL.map(|grade| (grade, self.grade_count(grade)))
    }

    /// Count for one department, zero when absent.
    pub fn department_count(&self, department: &str) -> usize {
        self.department_counts
            .iter()
            .find(|(name, _)| name == department)
            .map_or(0, |(_, count)| *count)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::models::StudentDetails;

    fn student(id: i64, department: &str, marks: f64) -> Student {
        Student::new(
            id,
            StudentDetails::new(format!("S{id}"), format!("R{id}"), department, "", "", marks),
        )
    }

    #[test]
    fn empty_snapshot_is_all_zero() {
        let stats = StatisticsSnapshot::from_students(&[]);
        assert_eq!(stats.total_count, 0);
        assert_eq!(stats.passed_count + stats.failed_count, 0);
        assert_eq!(stats.pass_percentage, 0.0);
        assert_eq!(stats.fail_percentage, 0.0);
        assert_eq!(stats.average_marks, 0.0);
        assert_eq!(stats.highest_marks, 0.0);
        assert_eq!(stats.lowest_marks, 0.0);
        assert!(stats.department_counts.is_empty());
        assert!(stats.grade_distribution().iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn three_student_scenario() {
        let students = [
            student(1, "Physics", 95.0),
            student(2, "Maths", 55.0),
            student(3, "Physics", 40.0),
        ];
        let stats = StatisticsSnapshot::from_students(&students);

        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.passed_count, 2);
        assert_eq!(stats.failed_count, 1);
        assert!((stats.pass_percentage - 66.666).abs() < 0.01);
        assert!((stats.average_marks - 63.333).abs() < 0.01);
        assert_eq!(stats.highest_marks, 95.0);
        assert_eq!(stats.lowest_marks, 40.0);
        assert_eq!(
            stats.grade_counts,
            BTreeMap::from([(Grade::APlus, 1), (Grade::D, 1), (Grade::F, 1)])
        );
        assert_eq!(stats.grade_count(Grade::B), 0);
    }

    #[test]
    fn departments_keep_first_seen_order() {
        let students = [
            student(1, "Physics", 70.0),
            student(2, "Chemistry", 70.0),
            student(3, "Physics", 70.0),
            student(4, "Biology", 70.0),
            student(5, "physics", 70.0),
        ];
        let stats = StatisticsSnapshot::from_students(&students);
        assert_eq!(
            stats.department_counts,
            vec![
                ("Physics".to_string(), 2),
                ("Chemistry".to_string(), 1),
                ("Biology".to_string(), 1),
                ("physics".to_string(), 1),
            ]
        );
        assert_eq!(stats.department_count("Physics"), 2);
        assert_eq!(stats.department_count("Art"), 0);
    }

    proptest! {
        #[test]
        fn totals_always_add_up(
            rows in prop::collection::vec((0usize..4, 0.0f64..=100.0), 0..40)
        ) {
            let departments = ["Physics", "Maths", "Chemistry", "Biology"];
            let students: Vec<Student> = rows
                .iter()
                .enumerate()
                .map(|(i, (dept, marks))| student(i as i64 + 1, departments[*dept], *marks))
                .collect();
            let stats = StatisticsSnapshot::from_students(&students);

            prop_assert_eq!(stats.passed_count + stats.failed_count, stats.total_count);
            let department_total: usize = stats.department_counts.iter().map(|(_, n)| n).sum();
            prop_assert_eq!(department_total, stats.total_count);
            let grade_total: usize = stats.grade_distribution().iter().map(|(_, n)| n).sum();
            prop_assert_eq!(grade_total, stats.total_count);
            if !students.is_empty() {
                prop_assert!(stats.lowest_marks <= stats.average_marks + 1e-9);
                prop_assert!(stats.average_marks <= stats.highest_marks + 1e-9);
                prop_assert!((stats.pass_percentage + stats.fail_percentage - 100.0).abs() < 1e-9);
            }
        }
    }
}
