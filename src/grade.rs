//! Letter grade, GPA point, and pass/fail derivation. This is the only place
//! the thresholds live; records, statistics, and exports all call into it.

use std::fmt;

/// Letter grades in canonical (best-first) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grade {
    APlus,
    A,
    B,
    C,
    D,
    F,
}

/// `(floor, grade, gpa)` bands, evaluated top to bottom. The first floor the
/// marks reach wins; anything below the last floor is an F worth 0.0.
const BANDS: [(f64, Grade, f64); 5] = [
    (90.0, Grade::APlus, 4.0),
    (80.0, Grade::A, 3.5),
    (70.0, Grade::B, 3.0),
    (60.0, Grade::C, 2.5),
    (50.0, Grade::D, 2.0),
];

fn band_for(marks: f64) -> Option<(Grade, f64)> {
    BANDS
        .iter()
        .find(|(floor, _, _)| marks >= *floor)
        .map(|&(_, grade, gpa)| (grade, gpa))
}

/// Letter grade for `marks`.
pub fn grade_of(marks: f64) -> Grade {
    band_for(marks).map_or(Grade::F, |(grade, _)| grade)
}

/// GPA point for `marks` on the 4.0 scale.
pub fn gpa_of(marks: f64) -> f64 {
    band_for(marks).map_or(0.0, |(_, gpa)| gpa)
}

/// Whether `marks` is a passing score: anything that earns a grade above F.
pub fn passed(marks: f64) -> bool {
    grade_of(marks).is_passing()
}

impl Grade {
    /// Canonical rendering order for distributions.
    pub const ALL: [Grade; 6] = [
        Grade::APlus,
        Grade::A,
        Grade::B,
        Grade::C,
        Grade::D,
        Grade::F,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    pub fn is_passing(self) -> bool {
        self != Grade::F
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_follow_the_threshold_table() {
        let cases = [
            (0.0, Grade::F, 0.0, false),
            (49.99, Grade::F, 0.0, false),
            (50.0, Grade::D, 2.0, true),
            (59.99, Grade::D, 2.0, true),
            (60.0, Grade::C, 2.5, true),
            (69.99, Grade::C, 2.5, true),
            (70.0, Grade::B, 3.0, true),
            (79.99, Grade::B, 3.0, true),
            (80.0, Grade::A, 3.5, true),
            (89.99, Grade::A, 3.5, true),
            (89.999, Grade::A, 3.5, true),
            (90.0, Grade::APlus, 4.0, true),
            (100.0, Grade::APlus, 4.0, true),
        ];

        for (marks, grade, gpa, pass) in cases {
            assert_eq!(grade_of(marks), grade, "grade for {marks}");
            assert_eq!(gpa_of(marks), gpa, "gpa for {marks}");
            assert_eq!(passed(marks), pass, "pass flag for {marks}");
            assert_eq!(grade.is_passing(), pass, "grade pass flag for {marks}");
        }
    }

    #[test]
    fn every_score_below_ninety_stays_consistent() {
        let mut marks = 0.0;
        while marks < 90.0 {
            let grade = grade_of(marks);
            assert_ne!(grade, Grade::APlus);
            assert_eq!(passed(marks), grade.is_passing(), "marks {marks}");
            marks += 0.25;
        }
    }

    #[test]
    fn labels_render_in_canonical_order() {
        let labels: Vec<_> = Grade::ALL.iter().map(|g| g.to_string()).collect();
        assert_eq!(labels, ["A+", "A", "B", "C", "D", "F"]);
    }
}
