use crate::errors::JarsError;
use crate::generator::StudentComment;
use crate::runtime::{Clock, FileSystem};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::UNIX_EPOCH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Done,
    Corrected,
    CorrectionFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub student: String,
    pub comment_chars: usize,
    pub comment_words: usize,
    pub status: EntryStatus,
    pub error: Option<String>,
}

/// Record of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub report_digest: String,
    pub generated_at: u64,
    pub entries: Vec<ManifestEntry>,
}

pub fn report_digest(report_text: &str) -> String {
    format!("{:x}", Sha256::digest(report_text.as_bytes()))
}

impl Manifest {
    pub fn build(report_text: &str, comments: &[StudentComment], clock: &dyn Clock) -> Self {
        let generated_at = clock
            .now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let entries = comments
            .iter()
            .map(|c| ManifestEntry {
                student: c.full_name.clone(),
                comment_chars: c.comment.chars().count(),
                comment_words: c.comment.split_whitespace().count(),
                status: match (&c.correction_error, c.corrected) {
                    (Some(_), _) => EntryStatus::CorrectionFailed,
                    (None, true) => EntryStatus::Corrected,
                    (None, false) => EntryStatus::Done,
                },
                error: c.correction_error.clone(),
            })
            .collect();
        Self {
            report_digest: report_digest(report_text),
            generated_at,
            entries,
        }
    }

    pub fn write(&self, path: &Path, fs: &dyn FileSystem) -> Result<(), JarsError> {
        if let Some(parent) = path.parent() {
            fs.create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self).map_err(|e| JarsError::Io(e.to_string()))?;
        fs.write_string(path, &text)
    }
}
