use crate::comment_mapping::CommentMapping;
use crate::config::ProbeConfig;
use crate::correction::GrammarCorrector;
use crate::errors::JarsError;
use crate::generator::{CommentGenerator, GenerationOptions};
use crate::grade_record::GradeRecord;
use crate::logging::append_run_log;
use crate::types::Grade;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;

const PROBE_FULL_NAME: &str = "Probe Student";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeRow {
    pub final_grade: Grade,
    pub grades: IndexMap<String, Grade>,
    pub positive_count: usize,
    pub negative_count: usize,
    pub comment: String,
    pub corrected: Option<String>,
    pub correction_error: Option<String>,
}

/// Number of records the probe would generate for `criteria` goals, if it fits in a u64.
pub fn combination_count(criteria: usize) -> Option<u64> {
    let letters = Grade::LETTERS.len() as u64;
    u32::try_from(criteria)
        .ok()
        .and_then(|k| letters.checked_pow(k))
        .and_then(|n| n.checked_mul(letters))
}

/// Generates a comment for every final grade and every A-D combination over
/// the mapping's criteria, keeping the first row for each distinct comment.
pub fn run_probe(
    mapping: &CommentMapping,
    cfg: &ProbeConfig,
    options: &GenerationOptions,
    corrector: Option<&dyn GrammarCorrector>,
) -> Result<Vec<ProbeRow>, JarsError> {
    let criteria = mapping
        .criteria()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let total = combination_count(criteria.len())
        .filter(|n| *n <= cfg.max_combinations)
        .ok_or_else(|| {
            JarsError::InvalidConfig(format!(
                "{} criteria exceed probe.max_combinations ({})",
                criteria.len(),
                cfg.max_combinations
            ))
        })?;
    append_run_log(
        "info",
        "probe.started",
        json!({ "criteria": criteria, "combinations": total }),
    );

    let generator = CommentGenerator::new(mapping, options, None);
    let mut seen = HashSet::new();
    let mut rows = Vec::new();

    for final_grade in Grade::LETTERS {
        let mut digits = vec![0usize; criteria.len()];
        loop {
            let mut record = GradeRecord::new(PROBE_FULL_NAME, cfg.short_name.as_str(), cfg.gender)
                .with_final(0, final_grade.as_str());
            for (goal, digit) in criteria.iter().zip(&digits) {
                record = record.with_goal(goal.as_str(), Grade::LETTERS[*digit]);
            }
            let generated = generator.generate(&record);
            if seen.insert(generated.text.clone()) {
                rows.push(ProbeRow {
                    final_grade,
                    grades: record.per_goal_grades.unwrap_or_default(),
                    positive_count: generated.positive_count,
                    negative_count: generated.negative_count,
                    comment: generated.text,
                    corrected: None,
                    correction_error: None,
                });
            }
            if !advance(&mut digits, Grade::LETTERS.len()) {
                break;
            }
        }
    }

    if let Some(corrector) = corrector {
        for row in &mut rows {
            match corrector.correct(&row.comment) {
                Ok(text) => row.corrected = Some(text),
                Err(err) => row.correction_error = Some(err.to_string()),
            }
        }
    }

    append_run_log(
        "info",
        "probe.completed",
        json!({ "combinations": total, "unique": rows.len() }),
    );
    Ok(rows)
}

// Odometer increment, last criterion fastest. False once every digit wraps.
fn advance(digits: &mut [usize], base: usize) -> bool {
    for digit in digits.iter_mut().rev() {
        *digit += 1;
        if *digit < base {
            return true;
        }
        *digit = 0;
    }
    false
}
