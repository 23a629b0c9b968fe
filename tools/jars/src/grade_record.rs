use crate::types::{Gender, Grade, PdRating};
use indexmap::IndexMap;

/// Final Grades sheet row. A score of 0 and a blank letter are the ungraded sentinels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalGrade {
    pub score: u32,
    pub letter: String,
}

impl FinalGrade {
    pub fn has_score(&self) -> bool {
        self.score != 0
    }

    pub fn has_letter(&self) -> bool {
        !self.letter.trim().is_empty()
    }
}

/// Snapshot of one student across the report's sheets.
///
/// Sheet-backed fields are `None` when the student's row is absent from that
/// sheet, which is distinct from a row that is present but ungraded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeRecord {
    pub full_name: String,
    pub short_name: String,
    pub gender: Gender,
    pub per_goal_grades: Option<IndexMap<String, Grade>>,
    pub per_pd_grades: Option<IndexMap<String, PdRating>>,
    pub final_grade: Option<FinalGrade>,
}

impl GradeRecord {
    pub fn new(full_name: impl Into<String>, short_name: impl Into<String>, gender: Gender) -> Self {
        Self {
            full_name: full_name.into(),
            short_name: short_name.into(),
            gender,
            per_goal_grades: Some(IndexMap::new()),
            per_pd_grades: Some(IndexMap::new()),
            final_grade: Some(FinalGrade {
                score: 0,
                letter: String::new(),
            }),
        }
    }

    pub fn with_goal(mut self, goal: impl Into<String>, grade: Grade) -> Self {
        self.per_goal_grades
            .get_or_insert_with(IndexMap::new)
            .insert(goal.into(), grade);
        self
    }

    pub fn with_pd(mut self, item: impl Into<String>, rating: PdRating) -> Self {
        self.per_pd_grades
            .get_or_insert_with(IndexMap::new)
            .insert(item.into(), rating);
        self
    }

    pub fn with_final(mut self, score: u32, letter: impl Into<String>) -> Self {
        self.final_grade = Some(FinalGrade {
            score,
            letter: letter.into(),
        });
        self
    }

    pub fn final_score(&self) -> u32 {
        self.final_grade.as_ref().map(|f| f.score).unwrap_or(0)
    }

    /// Letter grade, or `None` for the blank sentinel or a missing row.
    pub fn final_letter_grade(&self) -> Option<&str> {
        self.final_grade
            .as_ref()
            .filter(|f| f.has_letter())
            .map(|f| f.letter.trim())
    }

    /// Goal grades in report column order; empty when the student has no SNA row.
    pub fn goal_grades(&self) -> impl Iterator<Item = (&str, Grade)> {
        self.per_goal_grades
            .iter()
            .flat_map(|grades| grades.iter().map(|(goal, grade)| (goal.as_str(), *grade)))
    }
}

/// Spreadsheet-style rounding: halves round up, never to even.
///
/// `round_half_up(84.5) == 85` and `round_half_up(85.5) == 86`, whereas
/// banker's rounding would give 84 and 86. Negative and non-finite inputs
/// clamp to 0.
pub fn round_half_up(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let whole = value.trunc();
    let remainder = value - whole;
    let rounded = if remainder >= 0.5 { whole + 1.0 } else { whole };
    if rounded >= u32::MAX as f64 {
        u32::MAX
    } else {
        rounded as u32
    }
}
