use crate::errors::JarsError;
use crate::grade_record::GradeRecord;
use crate::logging::append_run_log;
use crate::types::Grade;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

/// Required number of goals at one grade letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Fixed(u32),
    Range { min: u32, max: u32 },
}

impl Requirement {
    pub fn admits(self, actual: u32) -> bool {
        match self {
            Self::Fixed(required) => actual == required,
            Self::Range { min, max } => (min..=max).contains(&actual),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(n) => write!(f, "{n}"),
            Self::Range { min, max } => write!(f, "{min}-{max}"),
        }
    }
}

/// Final-score band written `"min-max"`; both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBand {
    pub min: u32,
    pub max: u32,
}

impl ScoreBand {
    pub fn contains(self, score: u32) -> bool {
        (self.min..=self.max).contains(&score)
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandRule {
    pub band: ScoreBand,
    pub requirements: Vec<(Grade, Requirement)>,
}

/// Grade-distribution policy keyed by the number of goals in a report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplianceRules {
    by_goal_count: BTreeMap<usize, Vec<BandRule>>,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    rules: IndexMap<String, IndexMap<String, IndexMap<String, RawRequirement>>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRequirement {
    Count(i64),
    Range(String),
}

impl ComplianceRules {
    pub fn from_json_str(text: &str) -> Result<Self, JarsError> {
        let file: RuleFile = serde_json::from_str(text)
            .map_err(|e| JarsError::RuleTable(format!("invalid rule table json: {e}")))?;

        let mut by_goal_count = BTreeMap::new();
        for (count_key, bands) in file.rules {
            let count = count_key.trim().parse::<usize>().map_err(|_| {
                JarsError::RuleTable(format!("goal count '{count_key}' is not an integer"))
            })?;
            let mut band_rules = Vec::with_capacity(bands.len());
            for (band_key, reqs) in bands {
                let (min, max) = parse_range(&band_key)?;
                let mut requirements = Vec::with_capacity(reqs.len());
                for (grade_key, raw) in reqs {
                    let grade = match Grade::parse(&grade_key) {
                        Some(grade @ (Grade::A | Grade::B | Grade::C)) => grade,
                        _ => {
                            return Err(JarsError::RuleTable(format!(
                                "unsupported grade '{grade_key}' in band {band_key}"
                            )))
                        }
                    };
                    requirements.push((grade, parse_requirement(raw)?));
                }
                band_rules.push(BandRule {
                    band: ScoreBand { min, max },
                    requirements,
                });
            }
            by_goal_count.insert(count, band_rules);
        }

        Ok(Self { by_goal_count })
    }

    pub fn insert(&mut self, goal_count: usize, rules: Vec<BandRule>) {
        self.by_goal_count.insert(goal_count, rules);
    }

    pub fn for_goal_count(&self, goal_count: usize) -> Option<&[BandRule]> {
        self.by_goal_count.get(&goal_count).map(Vec::as_slice)
    }
}

fn parse_requirement(raw: RawRequirement) -> Result<Requirement, JarsError> {
    match raw {
        RawRequirement::Count(n) => u32::try_from(n)
            .map(Requirement::Fixed)
            .map_err(|_| JarsError::RuleTable(format!("requirement {n} must be non-negative"))),
        RawRequirement::Range(text) => {
            let (min, max) = parse_range(&text)?;
            Ok(Requirement::Range { min, max })
        }
    }
}

fn parse_range(text: &str) -> Result<(u32, u32), JarsError> {
    let invalid = || JarsError::RuleTable(format!("'{text}' is not a min-max range"));
    let (min, max) = text.split_once('-').ok_or_else(invalid)?;
    let min = min.trim().parse::<u32>().map_err(|_| invalid())?;
    let max = max.trim().parse::<u32>().map_err(|_| invalid())?;
    if min > max {
        return Err(invalid());
    }
    Ok((min, max))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GradeCounts {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl GradeCounts {
    pub fn tally(record: &GradeRecord) -> Self {
        let mut counts = Self::default();
        for (_, grade) in record.goal_grades() {
            match grade {
                Grade::A => counts.a += 1,
                Grade::B => counts.b += 1,
                Grade::C => counts.c += 1,
                Grade::D | Grade::X => {}
            }
        }
        counts
    }

    pub fn get(self, grade: Grade) -> u32 {
        match grade {
            Grade::A => self.a,
            Grade::B => self.b,
            Grade::C => self.c,
            Grade::D | Grade::X => 0,
        }
    }
}

/// Why the policy could not be applied to a student at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndeterminateReason {
    MissingFinalScore,
    NoRuleForGoalCount(usize),
    StudentNotInSkillsSheet,
}

impl IndeterminateReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingFinalScore => "missing_final_score",
            Self::NoRuleForGoalCount(_) => "no_rule_for_goal_count",
            Self::StudentNotInSkillsSheet => "student_not_in_skills_sheet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplianceOutcome {
    Compliant,
    Violation {
        band: ScoreBand,
        grade: Grade,
        requirement: Requirement,
        actual: u32,
    },
    NoMatchingBand {
        score: u32,
    },
    Indeterminate(IndeterminateReason),
}

impl ComplianceOutcome {
    pub fn is_compliant(&self) -> bool {
        matches!(self, Self::Compliant)
    }

    pub fn is_indeterminate(&self) -> bool {
        matches!(self, Self::Indeterminate(_))
    }
}

pub fn evaluate(record: &GradeRecord, goal_count: usize, rules: &ComplianceRules) -> ComplianceOutcome {
    let outcome = evaluate_inner(record, goal_count, rules);
    match &outcome {
        ComplianceOutcome::Indeterminate(reason) => append_run_log(
            "warn",
            "compliance.skipped",
            json!({
                "student": record.full_name,
                "reason": reason.as_str(),
                "goal_count": goal_count
            }),
        ),
        ComplianceOutcome::Violation {
            band,
            grade,
            requirement,
            actual,
        } => append_run_log(
            "info",
            "compliance.violation",
            json!({
                "student": record.full_name,
                "band": band.to_string(),
                "grade": grade.as_str(),
                "required": requirement.to_string(),
                "actual": actual
            }),
        ),
        ComplianceOutcome::NoMatchingBand { score } => append_run_log(
            "info",
            "compliance.no_band",
            json!({
                "student": record.full_name,
                "score": score,
                "goal_count": goal_count
            }),
        ),
        ComplianceOutcome::Compliant => {}
    }
    outcome
}

pub fn is_compliant(record: &GradeRecord, goal_count: usize, rules: &ComplianceRules) -> bool {
    evaluate(record, goal_count, rules).is_compliant()
}

fn evaluate_inner(
    record: &GradeRecord,
    goal_count: usize,
    rules: &ComplianceRules,
) -> ComplianceOutcome {
    let score = record.final_score();
    if score == 0 {
        return ComplianceOutcome::Indeterminate(IndeterminateReason::MissingFinalScore);
    }
    let Some(bands) = rules.for_goal_count(goal_count) else {
        return ComplianceOutcome::Indeterminate(IndeterminateReason::NoRuleForGoalCount(
            goal_count,
        ));
    };
    if record.per_goal_grades.is_none() {
        return ComplianceOutcome::Indeterminate(IndeterminateReason::StudentNotInSkillsSheet);
    }

    let counts = GradeCounts::tally(record);
    let Some(rule) = bands.iter().find(|rule| rule.band.contains(score)) else {
        return ComplianceOutcome::NoMatchingBand { score };
    };

    for (grade, requirement) in &rule.requirements {
        let actual = counts.get(*grade);
        if !requirement.admits(actual) {
            return ComplianceOutcome::Violation {
                band: rule.band,
                grade: *grade,
                requirement: *requirement,
                actual,
            };
        }
    }
    ComplianceOutcome::Compliant
}
