use crate::comment_mapping::CommentMapping;
use crate::grade_record::{FinalGrade, GradeRecord};
use crate::types::{Gender, Grade, PdRating};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentEntry {
    pub full_name: String,
    pub short_name: String,
    pub gender: Gender,
}

/// A grader report after loading and data preparation. Sheet rows are keyed
/// by student full name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraderReport {
    pub version: String,
    pub course_info: IndexMap<String, String>,
    pub students: Vec<StudentEntry>,
    pub goals: Vec<String>,
    pub pd_items: Vec<String>,
    pub sna: IndexMap<String, IndexMap<String, Grade>>,
    pub pd: IndexMap<String, IndexMap<String, PdRating>>,
    pub final_grades: IndexMap<String, FinalGrade>,
    pub comment_mapping: CommentMapping,
}

impl GraderReport {
    pub fn goal_count(&self) -> usize {
        self.goals.len()
    }

    /// One record per listed student, in student-list order.
    pub fn records(&self) -> Vec<GradeRecord> {
        self.students
            .iter()
            .map(|student| GradeRecord {
                full_name: student.full_name.clone(),
                short_name: student.short_name.clone(),
                gender: student.gender,
                per_goal_grades: self.sna.get(&student.full_name).cloned(),
                per_pd_grades: self.pd.get(&student.full_name).cloned(),
                final_grade: self.final_grades.get(&student.full_name).cloned(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{GraderReport, StudentEntry};
    use crate::grade_record::FinalGrade;
    use crate::types::{Gender, Grade};
    use indexmap::IndexMap;

    #[test]
    fn records_mark_missing_sheet_rows_as_absent() {
        let mut report = GraderReport {
            goals: vec!["Reading".to_string()],
            ..GraderReport::default()
        };
        for name in ["Ann Lee", "Bo Tan"] {
            report.students.push(StudentEntry {
                full_name: name.to_string(),
                short_name: name.split(' ').next().unwrap_or_default().to_string(),
                gender: Gender::F,
            });
        }
        report.sna.insert(
            "Ann Lee".to_string(),
            IndexMap::from([("Reading".to_string(), Grade::A)]),
        );
        report.final_grades.insert(
            "Bo Tan".to_string(),
            FinalGrade {
                score: 72,
                letter: "C".to_string(),
            },
        );

        let records = report.records();
        assert_eq!(records.len(), 2);
        assert!(records[0].per_goal_grades.is_some());
        assert!(records[0].final_grade.is_none());
        assert!(records[1].per_goal_grades.is_none());
        assert_eq!(records[1].final_score(), 72);
        assert_eq!(report.goal_count(), 1);
    }
}
