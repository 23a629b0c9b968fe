use crate::errors::JarsError;
use std::fs;
use std::path::{Path, PathBuf};

/// Deletes the oldest `.jsonl` files in `dir` until they fit in `budget_bytes`.
/// Other files in the directory are neither counted nor touched.
pub fn enforce_total_budget(dir: &Path, budget_bytes: u64) -> Result<Vec<PathBuf>, JarsError> {
    let mut files = fs::read_dir(dir)
        .map_err(|e| JarsError::Io(e.to_string()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl"))
        .map(|path| {
            let meta = fs::metadata(&path).ok();
            let modified = meta.as_ref().and_then(|m| m.modified().ok());
            let len = meta.map(|m| m.len()).unwrap_or(0);
            (path, modified, len)
        })
        .collect::<Vec<_>>();

    let mut total = files.iter().map(|(_, _, len)| *len).sum::<u64>();
    if total <= budget_bytes {
        return Ok(Vec::new());
    }

    files.sort_by(|a, b| a.1.cmp(&b.1));

    let mut deleted = Vec::new();
    for (path, _, len) in files {
        if total <= budget_bytes {
            break;
        }
        fs::remove_file(&path).map_err(|e| JarsError::Io(e.to_string()))?;
        total = total.saturating_sub(len);
        deleted.push(path);
    }

    Ok(deleted)
}
