use crate::comment_mapping::CommentMapping;
use crate::errors::JarsError;
use crate::grade_record::{round_half_up, FinalGrade};
use crate::report::{GraderReport, StudentEntry};
use crate::runtime::FileSystem;
use crate::types::{Gender, Grade, PdRating};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const SHORT_NAME_COLUMN: &str = "Short Name";
const GENDER_COLUMN: &str = "Gender";
const FINAL_SCORE_COLUMN: &str = "Final Score";
const LETTER_GRADE_COLUMN: &str = "Letter Grade";
const SNA_HELPER_COLUMNS: [&str; 4] = [
    "Normalized Grade",
    "Student Final Grade",
    "Sanity Check",
    "Add item…",
];

static BLANK: Value = Value::Null;

/// One worksheet: the first column is the row key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sheet {
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ReportExport {
    #[serde(default)]
    version: Value,
    course_information: Sheet,
    student_list: Sheet,
    skills_and_assessment: Sheet,
    personal_development: Sheet,
    final_grades: Sheet,
    comment_mapping: Sheet,
}

pub fn load_report(path: &Path, fs: &dyn FileSystem) -> Result<GraderReport, JarsError> {
    let text = fs.read_to_string(path)?;
    load_report_str(&text)
}

pub fn load_report_str(text: &str) -> Result<GraderReport, JarsError> {
    let export: ReportExport = serde_json::from_str(text)
        .map_err(|e| JarsError::ReportParse(format!("invalid grader report json: {e}")))?;

    let (goals, sna) = prepare_sna(&export.skills_and_assessment)?;
    let (pd_items, pd) = prepare_pd(&export.personal_development)?;

    Ok(GraderReport {
        version: cell_text(&export.version).unwrap_or_default(),
        course_info: prepare_course_info(&export.course_information)?,
        students: prepare_students(&export.student_list)?,
        goals,
        pd_items,
        sna,
        pd,
        final_grades: prepare_final_grades(&export.final_grades)?,
        comment_mapping: prepare_comment_mapping(&export.comment_mapping)?,
    })
}

// Keys trimmed, rows padded to the header width.
fn keyed_rows<'a>(
    sheet: &'a Sheet,
    name: &str,
) -> Result<Vec<(String, Vec<&'a Value>)>, JarsError> {
    if sheet.columns.is_empty() {
        return Err(JarsError::ReportParse(format!("sheet '{name}' has no columns")));
    }
    let width = sheet.columns.len();
    let mut rows = Vec::with_capacity(sheet.rows.len());
    for (index, row) in sheet.rows.iter().enumerate() {
        if row.len() > width {
            return Err(JarsError::ReportParse(format!(
                "sheet '{name}' row {} has {} cells, header has {width}",
                index + 1,
                row.len()
            )));
        }
        let Some(key) = row.first().and_then(cell_text) else {
            continue;
        };
        let cells = (1..width).map(|i| row.get(i).unwrap_or(&BLANK)).collect();
        rows.push((key, cells));
    }
    Ok(rows)
}

fn value_columns(sheet: &Sheet) -> Vec<String> {
    sheet.columns.iter().skip(1).map(|c| c.trim().to_string()).collect()
}

fn column_index(columns: &[String], wanted: &str, sheet: &str) -> Result<usize, JarsError> {
    columns
        .iter()
        .position(|c| c == wanted)
        .ok_or_else(|| JarsError::ReportParse(format!("sheet '{sheet}' is missing column '{wanted}'")))
}

fn cell_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn cell_number(value: &Value, context: &str) -> Result<Option<f64>, JarsError> {
    match value {
        Value::Number(n) => Ok(n.as_f64()),
        other => match cell_text(other) {
            None => Ok(None),
            Some(text) => text.parse::<f64>().map(Some).map_err(|_| {
                JarsError::ReportParse(format!("{context}: '{text}' is not a number"))
            }),
        },
    }
}

fn prepare_course_info(sheet: &Sheet) -> Result<IndexMap<String, String>, JarsError> {
    Ok(keyed_rows(sheet, "course_information")?
        .into_iter()
        .map(|(field, cells)| {
            let value = cells.first().and_then(|v| cell_text(v)).unwrap_or_default();
            (field, value)
        })
        .collect())
}

fn prepare_students(sheet: &Sheet) -> Result<Vec<StudentEntry>, JarsError> {
    let columns = value_columns(sheet);
    let short = column_index(&columns, SHORT_NAME_COLUMN, "student_list")?;
    let gender_col = column_index(&columns, GENDER_COLUMN, "student_list")?;

    let mut students = Vec::new();
    for (full_name, cells) in keyed_rows(sheet, "student_list")? {
        let texts = cells.iter().map(|v| cell_text(v)).collect::<Option<Vec<_>>>();
        let Some(texts) = texts else {
            continue;
        };
        let gender = Gender::parse(&texts[gender_col]).ok_or_else(|| {
            JarsError::ReportParse(format!(
                "{full_name}: gender '{}' is not M or F",
                texts[gender_col]
            ))
        })?;
        students.push(StudentEntry {
            full_name,
            short_name: texts[short].clone(),
            gender,
        });
    }
    Ok(students)
}

fn is_sna_helper(column: &str) -> bool {
    SNA_HELPER_COLUMNS.contains(&column) || column.starts_with("Unnamed")
}

type SheetRows<T> = IndexMap<String, IndexMap<String, T>>;

fn prepare_sna(sheet: &Sheet) -> Result<(Vec<String>, SheetRows<Grade>), JarsError> {
    let columns = value_columns(sheet);
    let kept = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| !is_sna_helper(c))
        .map(|(i, c)| (i, c.clone()))
        .collect::<Vec<_>>();

    let mut rows = IndexMap::new();
    for (student, cells) in keyed_rows(sheet, "skills_and_assessment")? {
        let mut grades = IndexMap::new();
        for (i, goal) in &kept {
            let grade = match cell_text(cells[*i]) {
                None => Grade::X,
                Some(text) => Grade::parse(&text).ok_or_else(|| {
                    JarsError::ReportParse(format!(
                        "{student}: '{text}' is not a grade for goal '{goal}'"
                    ))
                })?,
            };
            grades.insert(goal.clone(), grade);
        }
        rows.insert(student, grades);
    }
    Ok((kept.into_iter().map(|(_, goal)| goal).collect(), rows))
}

fn prepare_pd(sheet: &Sheet) -> Result<(Vec<String>, SheetRows<PdRating>), JarsError> {
    let items = value_columns(sheet);
    let mut rows = IndexMap::new();
    for (student, cells) in keyed_rows(sheet, "personal_development")? {
        let mut ratings = IndexMap::new();
        for (item, value) in items.iter().zip(cells) {
            let context = format!("{student} / {item}");
            let rating = match cell_number(value, &context)? {
                None => PdRating::UNGRADED,
                Some(n) if n.fract() == 0.0 && (0.0..=5.0).contains(&n) => PdRating(n as u8),
                Some(n) => {
                    return Err(JarsError::ReportParse(format!(
                        "{context}: rating {n} is outside 0..=5"
                    )))
                }
            };
            ratings.insert(item.clone(), rating);
        }
        rows.insert(student, ratings);
    }
    Ok((items, rows))
}

fn prepare_final_grades(sheet: &Sheet) -> Result<IndexMap<String, FinalGrade>, JarsError> {
    let columns = value_columns(sheet);
    let score = column_index(&columns, FINAL_SCORE_COLUMN, "final_grades")?;
    let letter = column_index(&columns, LETTER_GRADE_COLUMN, "final_grades")?;

    let mut grades = IndexMap::new();
    for (student, cells) in keyed_rows(sheet, "final_grades")? {
        let raw = cell_number(cells[score], &format!("{student} / {FINAL_SCORE_COLUMN}"))?;
        grades.insert(
            student,
            FinalGrade {
                score: raw.map(round_half_up).unwrap_or(0),
                letter: cell_text(cells[letter]).unwrap_or_default(),
            },
        );
    }
    Ok(grades)
}

fn prepare_comment_mapping(sheet: &Sheet) -> Result<CommentMapping, JarsError> {
    let mut mapping = CommentMapping::new(value_columns(sheet));
    for (row, cells) in keyed_rows(sheet, "comment_mapping")? {
        let texts = cells
            .iter()
            .map(|v| cell_text(v).unwrap_or_default())
            .collect();
        mapping.insert_row(row, texts)?;
    }
    Ok(mapping)
}
