use jars::compliance::ComplianceRules;
use jars::report_loader::load_report_str;
use jars::validator::{validate, WarningKind};

fn fixture(path: &str) -> String {
    format!("{}/tests/fixtures/{path}", env!("CARGO_MANIFEST_DIR"))
}

fn read(path: &str) -> String {
    std::fs::read_to_string(fixture(path)).expect("fixture readable")
}

fn rules() -> ComplianceRules {
    ComplianceRules::from_json_str(&read("rules/sna_rules.json")).expect("rules parse")
}

#[test]
fn complete_report_is_valid() {
    let report = load_report_str(&read("reports/complete.json")).expect("report");
    let result = validate(&report, &rules(), Some("1.2"));
    assert!(result.valid, "{:?}", result.warnings);
    assert_eq!(result.count(), 0);
}

#[test]
fn incomplete_report_lists_every_issue_in_category_order() {
    let report = load_report_str(&read("reports/incomplete.json")).expect("report");
    let result = validate(&report, &rules(), Some("1.2"));
    assert!(!result.valid);

    let summary = result
        .warnings
        .iter()
        .map(|w| (w.kind, w.student.as_deref()))
        .collect::<Vec<_>>();
    assert_eq!(
        summary,
        vec![
            (WarningKind::CourseInfoBlank, None),
            (WarningKind::FinalGradesRowMissing, Some("Dee Ong")),
            (WarningKind::SkillsRowMissing, Some("Bo Tan")),
            (WarningKind::GoalUngraded, Some("Dee Ong")),
            (WarningKind::PdUngraded, Some("Dee Ong")),
            (WarningKind::ComplianceIndeterminate, Some("Bo Tan")),
            (WarningKind::ComplianceIndeterminate, Some("Dee Ong")),
            (WarningKind::VersionMismatch, None),
        ]
    );
    assert_eq!(
        result.warnings[2].to_string(),
        "Warning [3]: Bo Tan is not found in the 'Skills and Assessment' sheet!"
    );
}

#[test]
fn student_missing_from_skills_sheet_gets_one_warning() {
    let report = load_report_str(&read("reports/incomplete.json")).expect("report");
    let result = validate(&report, &rules(), None);
    let for_bo = |kind: WarningKind| {
        result
            .of_kind(kind)
            .filter(|w| w.student.as_deref() == Some("Bo Tan"))
            .count()
    };
    assert_eq!(for_bo(WarningKind::SkillsRowMissing), 1);
    assert_eq!(for_bo(WarningKind::GoalUngraded), 0);
}

#[test]
fn goal_count_without_rule_is_distinguished_from_violation() {
    let report = load_report_str(&read("reports/complete.json")).expect("report");
    let only_four = ComplianceRules::from_json_str(
        r#"{"rules": {"4": {"0-100": {"A": "0-4", "B": "0-4", "C": "0-4"}}}}"#,
    )
    .expect("rules");
    let result = validate(&report, &only_four, Some("1.2"));
    assert!(!result.valid);
    assert_eq!(result.of_kind(WarningKind::ComplianceIndeterminate).count(), 3);
    assert_eq!(result.of_kind(WarningKind::ComplianceViolation).count(), 0);
}
