use crate::models::Student;
use crate::search::SearchMode;
use crate::stats::StatisticsSnapshot;

/// The roster table: the current result set plus the selection cursor.
pub(crate) struct RosterScreen {
    pub(crate) students: Vec<Student>,
    pub(crate) selected: usize,
    /// Query that produced `students`, `None` when showing everything.
    pub(crate) applied: Option<(SearchMode, String)>,
}

impl RosterScreen {
    pub(crate) fn new(students: Vec<Student>) -> Self {
        Self {
            students,
            selected: 0,
            applied: None,
        }
    }

    pub(crate) fn current_student(&self) -> Option<&Student> {
        self.students.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.students.is_empty() {
            return;
        }
        let last = self.students.len() as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, last) as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.students.len().saturating_sub(1);
    }

    /// Swap in a new result set, keeping the cursor on `focus` when that roll
    /// number is still present.
    pub(crate) fn set_students(&mut self, students: Vec<Student>, focus: Option<&str>) {
        self.students = students;
        if let Some(roll_no) = focus {
            if let Some(idx) = self.students.iter().position(|s| s.roll_no() == roll_no) {
                self.selected = idx;
                return;
            }
        }
        self.ensure_in_bounds();
    }

    pub(crate) fn ensure_in_bounds(&mut self) {
        if self.selected >= self.students.len() {
            self.selected = self.students.len().saturating_sub(1);
        }
    }

    /// Short description of what the table is showing.
    pub(crate) fn title(&self) -> String {
        match &self.applied {
            Some((mode, text)) => format!(
                "Students • {} matching {mode} \"{text}\"",
                self.students.len()
            ),
            None => format!("Students • {} total", self.students.len()),
        }
    }
}

/// Aggregates for the statistics view, computed from the roster on entry.
pub(crate) struct StatisticsScreen {
    pub(crate) stats: StatisticsSnapshot,
    /// True when the numbers cover a filtered result set.
    pub(crate) filtered: bool,
}

impl StatisticsScreen {
    pub(crate) fn from_roster(roster: &RosterScreen) -> Self {
        Self {
            stats: StatisticsSnapshot::from_students(&roster.students),
            filtered: roster.applied.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudentDetails;

    fn roster(rolls: &[&str]) -> RosterScreen {
        RosterScreen::new(
            rolls
                .iter()
                .enumerate()
                .map(|(i, roll)| {
                    Student::new(i as i64 + 1, StudentDetails::new("N", *roll, "D", "", "", 60.0))
                })
                .collect(),
        )
    }

    #[test]
    fn selection_is_clamped() {
        let mut screen = roster(&["R1", "R2", "R3"]);
        screen.move_selection(10);
        assert_eq!(screen.selected, 2);
        screen.move_selection(-10);
        assert_eq!(screen.selected, 0);

        let mut empty = roster(&[]);
        empty.move_selection(1);
        empty.select_last();
        assert_eq!(empty.selected, 0);
        assert!(empty.current_student().is_none());
    }

    #[test]
    fn reload_keeps_focus_on_the_same_record() {
        let mut screen = roster(&["R1", "R2", "R3"]);
        screen.select_last();
        let reordered = roster(&["R3", "R1"]).students;
        screen.set_students(reordered, Some("R3"));
        assert_eq!(screen.current_student().unwrap().roll_no(), "R3");

        screen.set_students(roster(&["R9"]).students, Some("R1"));
        assert_eq!(screen.selected, 0);
    }
}
