use crate::compliance::{evaluate, ComplianceOutcome, ComplianceRules, IndeterminateReason};
use crate::grade_record::GradeRecord;
use crate::logging::append_run_log;
use crate::report::GraderReport;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::json;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    NoStudents,
    CourseInfoBlank,
    FinalScoreMissing,
    FinalGradesRowMissing,
    LetterGradeMissing,
    SkillsRowMissing,
    GoalUngraded,
    PdRowMissing,
    PdUngraded,
    ComplianceViolation,
    ComplianceIndeterminate,
    VersionMismatch,
}

impl WarningKind {
    /// Informational warnings leave the report valid.
    pub fn invalidates(self) -> bool {
        !matches!(self, Self::VersionMismatch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationWarning {
    pub index: usize,
    pub kind: WarningKind,
    pub student: Option<String>,
    pub message: String,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Warning [{}]: {}", self.index, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn count(&self) -> usize {
        self.warnings.len()
    }

    /// Warnings that make the report invalid. Informational ones are excluded.
    pub fn issue_count(&self) -> usize {
        self.warnings.iter().filter(|w| w.kind.invalidates()).count()
    }

    pub fn of_kind(&self, kind: WarningKind) -> impl Iterator<Item = &ValidationWarning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

#[derive(Default)]
struct Collector {
    warnings: Vec<ValidationWarning>,
}

impl Collector {
    fn push(&mut self, kind: WarningKind, student: Option<&str>, message: String) {
        let warning = ValidationWarning {
            index: self.warnings.len() + 1,
            kind,
            student: student.map(str::to_string),
            message,
        };
        append_run_log(
            if kind.invalidates() { "warn" } else { "info" },
            "validation.warning",
            json!({
                "index": warning.index,
                "kind": kind,
                "student": warning.student,
                "message": warning.message
            }),
        );
        self.warnings.push(warning);
    }

    fn finish(self) -> ValidationReport {
        ValidationReport {
            valid: !self.warnings.iter().any(|w| w.kind.invalidates()),
            warnings: self.warnings,
        }
    }
}

/// Validates a loaded report. A version other than `expected_version` adds an
/// informational warning only.
pub fn validate(
    report: &GraderReport,
    rules: &ComplianceRules,
    expected_version: Option<&str>,
) -> ValidationReport {
    let records = report.records();
    let mut collector = Collector::default();
    check_records(
        &mut collector,
        &records,
        &report.course_info,
        report.goal_count(),
        rules,
    );
    if let Some(expected) = expected_version {
        if report.version.trim() != expected {
            collector.push(
                WarningKind::VersionMismatch,
                None,
                format!(
                    "Grader report version '{}' does not match the expected version '{expected}'.",
                    report.version
                ),
            );
        }
    }
    collector.finish()
}

/// Runs every check without short-circuiting; warnings are grouped by check
/// then ordered by student.
pub fn validate_records(
    records: &[GradeRecord],
    course_info: &IndexMap<String, String>,
    goal_count: usize,
    rules: &ComplianceRules,
) -> ValidationReport {
    let mut collector = Collector::default();
    check_records(&mut collector, records, course_info, goal_count, rules);
    collector.finish()
}

fn check_records(
    out: &mut Collector,
    records: &[GradeRecord],
    course_info: &IndexMap<String, String>,
    goal_count: usize,
    rules: &ComplianceRules,
) {
    if records.is_empty() {
        out.push(
            WarningKind::NoStudents,
            None,
            "No students found in the grader report! Please check the 'Student List' sheet."
                .to_string(),
        );
    }

    for (field, value) in course_info {
        if value.trim().is_empty() {
            out.push(
                WarningKind::CourseInfoBlank,
                None,
                format!("Course information '{field}' is not filled! Please check the grader report."),
            );
        }
    }

    for record in records {
        let student = record.full_name.as_str();
        match &record.final_grade {
            None => out.push(
                WarningKind::FinalGradesRowMissing,
                Some(student),
                format!("{student} is not found in the 'Final Grades' sheet!"),
            ),
            Some(final_grade) if !final_grade.has_score() => out.push(
                WarningKind::FinalScoreMissing,
                Some(student),
                format!("{student} has no final score! Please check the grader report."),
            ),
            Some(_) => {}
        }
    }

    for record in records {
        let student = record.full_name.as_str();
        if matches!(&record.final_grade, Some(final_grade) if !final_grade.has_letter()) {
            out.push(
                WarningKind::LetterGradeMissing,
                Some(student),
                format!("{student} has no letter grade! Please check the grader report."),
            );
        }
    }

    for record in records {
        let student = record.full_name.as_str();
        let Some(grades) = &record.per_goal_grades else {
            out.push(
                WarningKind::SkillsRowMissing,
                Some(student),
                format!("{student} is not found in the 'Skills and Assessment' sheet!"),
            );
            continue;
        };
        for (goal, grade) in grades {
            if grade.is_ungraded() {
                out.push(
                    WarningKind::GoalUngraded,
                    Some(student),
                    format!("{student} has no grade for goal '{goal}'! Please check the grader report."),
                );
            }
        }
    }

    for record in records {
        let student = record.full_name.as_str();
        let Some(ratings) = &record.per_pd_grades else {
            out.push(
                WarningKind::PdRowMissing,
                Some(student),
                format!("{student} is not found in the 'Personal Development' sheet!"),
            );
            continue;
        };
        for (item, rating) in ratings {
            if rating.is_ungraded() {
                out.push(
                    WarningKind::PdUngraded,
                    Some(student),
                    format!(
                        "{student} has no grade for personal development item '{item}'! Please check the grader report."
                    ),
                );
            }
        }
    }

    for record in records {
        let student = record.full_name.as_str();
        match evaluate(record, goal_count, rules) {
            ComplianceOutcome::Compliant => {}
            ComplianceOutcome::Violation {
                band,
                grade,
                requirement,
                actual,
            } => out.push(
                WarningKind::ComplianceViolation,
                Some(student),
                format!(
                    "{student} does not meet the SNA compliance rules for band {band}: {} {} required, {actual} found.",
                    requirement,
                    grade.as_str()
                ),
            ),
            ComplianceOutcome::NoMatchingBand { score } => out.push(
                WarningKind::ComplianceViolation,
                Some(student),
                format!("{student} does not meet the SNA compliance rules: no band covers a final score of {score}."),
            ),
            ComplianceOutcome::Indeterminate(reason) => out.push(
                WarningKind::ComplianceIndeterminate,
                Some(student),
                format!(
                    "SNA compliance could not be checked for {student}: {}.",
                    describe(reason)
                ),
            ),
        }
    }
}

fn describe(reason: IndeterminateReason) -> String {
    match reason {
        IndeterminateReason::MissingFinalScore => "missing final score".to_string(),
        IndeterminateReason::NoRuleForGoalCount(n) => format!("no rule for {n} goals"),
        IndeterminateReason::StudentNotInSkillsSheet => {
            "student is not in the 'Skills and Assessment' sheet".to_string()
        }
    }
}
