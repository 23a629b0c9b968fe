use crate::errors::JarsError;
use indexmap::IndexMap;

pub const INTRO_ROW: &str = "Intro";
pub const CLOSING_ROW: &str = "Closing";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentLookup<'a> {
    /// Row or column is not part of the table.
    NotFound,
    /// Cell exists but carries no fragment (blank or a literal `nan`).
    Blank,
    Text(&'a str),
}

/// Goal x letter-grade table of comment fragments, plus the reserved
/// `Intro` and `Closing` rows keyed by final letter grade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentMapping {
    columns: Vec<String>,
    rows: IndexMap<String, IndexMap<String, String>>,
}

impl CommentMapping {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns: columns.into_iter().map(|c| c.trim().to_string()).collect(),
            rows: IndexMap::new(),
        }
    }

    /// Inserts a row. Cells must line up with the table's columns.
    pub fn insert_row(
        &mut self,
        row: impl Into<String>,
        cells: Vec<String>,
    ) -> Result<(), JarsError> {
        let row = row.into().trim().to_string();
        if cells.len() != self.columns.len() {
            return Err(JarsError::ReportParse(format!(
                "comment mapping row '{row}' has {} cells, expected {}",
                cells.len(),
                self.columns.len()
            )));
        }
        let values = self
            .columns
            .iter()
            .cloned()
            .zip(cells.into_iter().map(normalize_cell))
            .collect();
        self.rows.insert(row, values);
        Ok(())
    }

    pub fn with_row(mut self, row: &str, cells: &[&str]) -> Result<Self, JarsError> {
        self.insert_row(row, cells.iter().map(|c| c.to_string()).collect())?;
        Ok(self)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn lookup(&self, row: &str, column: &str) -> FragmentLookup<'_> {
        let Some(cells) = self.rows.get(row) else {
            return FragmentLookup::NotFound;
        };
        match cells.get(column) {
            None => FragmentLookup::NotFound,
            Some(text) if text.is_empty() || text == "nan" => FragmentLookup::Blank,
            Some(text) => FragmentLookup::Text(text.as_str()),
        }
    }

    /// Intro/Closing text for a letter grade; empty for the blank sentinel or an unknown letter.
    pub fn reserved_text(&self, row: &str, letter: Option<&str>) -> &str {
        let Some(letter) = letter else {
            return "";
        };
        match self.lookup(row, letter) {
            FragmentLookup::Text(text) => text,
            FragmentLookup::Blank | FragmentLookup::NotFound => "",
        }
    }

    /// Goal rows in table order, excluding the reserved rows.
    pub fn criteria(&self) -> Vec<&str> {
        self.rows
            .keys()
            .map(String::as_str)
            .filter(|row| *row != INTRO_ROW && *row != CLOSING_ROW)
            .collect()
    }
}

fn normalize_cell(value: String) -> String {
    if value == "nan" {
        String::new()
    } else {
        value
    }
}
