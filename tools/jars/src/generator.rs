use crate::assembler::{AlsoStripping, SentenceAssembler};
use crate::collector::collect_fragments;
use crate::comment_mapping::{CommentMapping, CLOSING_ROW, INTRO_ROW};
use crate::correction::GrammarCorrector;
use crate::formatter::format_comment;
use crate::grade_record::GradeRecord;
use crate::logging::append_run_log;
use crate::report::GraderReport;
use crate::types::{Gender, Polarity};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::json;

pub const NAME_PLACEHOLDER: &str = "VDC";

/// Fills `{short_name}`, `{pronoun}` and `{adjective}`.
pub fn render_placeholders(template: &str, short_name: &str, gender: Gender) -> String {
    template
        .replace("{short_name}", short_name)
        .replace("{pronoun}", gender.pronoun())
        .replace("{adjective}", gender.adjective())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    pub stripping: AlsoStripping,
    pub name_placeholder: String,
    pub parallel: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            stripping: AlsoStripping::default(),
            name_placeholder: NAME_PLACEHOLDER.to_string(),
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedComment {
    pub text: String,
    pub positive_count: usize,
    pub negative_count: usize,
    pub corrected: bool,
    pub correction_error: Option<String>,
}

pub struct CommentGenerator<'a> {
    mapping: &'a CommentMapping,
    options: &'a GenerationOptions,
    corrector: Option<&'a dyn GrammarCorrector>,
}

impl<'a> CommentGenerator<'a> {
    pub fn new(
        mapping: &'a CommentMapping,
        options: &'a GenerationOptions,
        corrector: Option<&'a dyn GrammarCorrector>,
    ) -> Self {
        Self {
            mapping,
            options,
            corrector,
        }
    }

    pub fn generate(&self, record: &GradeRecord) -> GeneratedComment {
        let letter = record.final_letter_grade();
        let intro = self.mapping.reserved_text(INTRO_ROW, letter);
        let closing = self.mapping.reserved_text(CLOSING_ROW, letter);

        let collected = collect_fragments(record.goal_grades(), self.mapping);
        let assembler = SentenceAssembler::new(self.options.stripping);
        let positive = assembler.assemble(&collected.positive_texts(), Polarity::Positive);
        let negative = assembler.assemble(&collected.negative_texts(), Polarity::Negative);

        let raw = [intro, positive.as_str(), negative.as_str(), closing].join(". ");
        // The real name goes back in last so formatting and correction never see it.
        let placeholder = self.options.name_placeholder.as_str();
        let rendered = render_placeholders(&raw, placeholder, record.gender);

        let (text, corrected, correction_error) = match self.corrector {
            None => (rendered, false, None),
            Some(corrector) => match corrector.correct(&rendered) {
                Ok(text) => (text, true, None),
                Err(err) => {
                    append_run_log(
                        "warn",
                        "correction.failed",
                        json!({ "student": record.full_name, "error": err.to_string() }),
                    );
                    (rendered, false, Some(err.to_string()))
                }
            },
        };

        let text = format_comment(&text).replace(placeholder, &record.short_name);
        GeneratedComment {
            text,
            positive_count: collected.positive.len(),
            negative_count: collected.negative.len(),
            corrected,
            correction_error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentComment {
    pub full_name: String,
    pub short_name: String,
    pub comment: String,
    pub positive_count: usize,
    pub negative_count: usize,
    pub corrected: bool,
    pub correction_error: Option<String>,
}

/// Generates every student's comment, in student-list order.
pub fn generate_all(
    report: &GraderReport,
    options: &GenerationOptions,
    corrector: Option<&dyn GrammarCorrector>,
) -> Vec<StudentComment> {
    let generator = CommentGenerator::new(&report.comment_mapping, options, corrector);
    let records = report.records();
    let generate_one = |record: &GradeRecord| {
        let generated = generator.generate(record);
        append_run_log(
            "info",
            "generation.student.completed",
            json!({
                "student": record.full_name,
                "positive": generated.positive_count,
                "negative": generated.negative_count,
                "corrected": generated.corrected
            }),
        );
        StudentComment {
            full_name: record.full_name.clone(),
            short_name: record.short_name.clone(),
            comment: generated.text,
            positive_count: generated.positive_count,
            negative_count: generated.negative_count,
            corrected: generated.corrected,
            correction_error: generated.correction_error,
        }
    };

    if options.parallel {
        records.par_iter().map(generate_one).collect()
    } else {
        records.iter().map(generate_one).collect()
    }
}
