use crate::comment_mapping::{CommentMapping, FragmentLookup};
use crate::logging::append_run_log;
use crate::types::{Fragment, Grade};
use serde_json::json;

const NEGATIVE_PREFIX: &str = "However";
const NEGATIVE_LEAD: &str = "However,";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Goal row or grade column is absent from the mapping.
    NotInMapping,
    /// Mapping cell exists but is blank.
    BlankFragment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedGoal {
    pub goal: String,
    pub grade: Grade,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedFragments {
    pub positive: Vec<Fragment>,
    pub negative: Vec<Fragment>,
    pub skipped: Vec<SkippedGoal>,
}

impl CollectedFragments {
    pub fn positive_texts(&self) -> Vec<&str> {
        self.positive.iter().map(|f| f.text.as_str()).collect()
    }

    pub fn negative_texts(&self) -> Vec<&str> {
        self.negative.iter().map(|f| f.text.as_str()).collect()
    }
}

/// Buckets each goal's fragment by the "However" prefix convention, in goal order.
///
/// Only the first negative fragment keeps its leading "However,"; later ones
/// have it removed so the conjunction is not repeated.
pub fn collect_fragments<'a>(
    goal_grades: impl IntoIterator<Item = (&'a str, Grade)>,
    mapping: &CommentMapping,
) -> CollectedFragments {
    let mut collected = CollectedFragments::default();

    for (goal, grade) in goal_grades {
        match mapping.lookup(goal, grade.as_str()) {
            FragmentLookup::NotFound => {
                append_run_log(
                    "warn",
                    "comment.fragment.missing",
                    json!({
                        "goal": goal,
                        "grade": grade.as_str(),
                        "hint": "possibly incomplete skills and assessment grading"
                    }),
                );
                collected.skipped.push(SkippedGoal {
                    goal: goal.to_string(),
                    grade,
                    reason: SkipReason::NotInMapping,
                });
            }
            FragmentLookup::Blank => collected.skipped.push(SkippedGoal {
                goal: goal.to_string(),
                grade,
                reason: SkipReason::BlankFragment,
            }),
            FragmentLookup::Text(text) if text.starts_with(NEGATIVE_PREFIX) => {
                let text = if collected.negative.is_empty() {
                    text.to_string()
                } else {
                    text.replace(NEGATIVE_LEAD, "")
                };
                collected.negative.push(Fragment::negative(text));
            }
            FragmentLookup::Text(text) => collected.positive.push(Fragment::positive(text)),
        }
    }

    append_run_log(
        "debug",
        "comment.fragments.collected",
        json!({
            "positive": collected.positive.len(),
            "negative": collected.negative.len(),
            "skipped": collected.skipped.len()
        }),
    );

    collected
}
