use anyhow::{bail, Context, Result};
use derived::{split_params, SentenceRecord};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// One row of a sentence CSV file: `attr,subject,verb,obj[,action,params]`
#[derive(Debug, Deserialize)]
struct CsvRow {
    attr: String,
    subject: String,
    verb: String,
    #[serde(default)]
    obj: String,
    #[serde(default)]
    action: String,
    #[serde(default)]
    params: String,
}

impl CsvRow {
    fn into_record(self) -> SentenceRecord {
        let mut record = SentenceRecord::new(self.attr, self.subject, self.verb);
        if !self.obj.trim().is_empty() {
            record = record.object(cell_value(&self.obj));
        }
        if !self.action.trim().is_empty() {
            record = record.action(self.action, split_params(&self.params));
        }
        record
    }
}

/// CSV cells are text; numbers and booleans become typed literals
fn cell_value(cell: &str) -> Value {
    let trimmed = cell.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
        _ => Value::String(cell.to_string()),
    }
}

/// Load sentence definitions from a `.csv` or `.json` file
pub fn load_sentences(path: &Path) -> Result<Vec<SentenceRecord>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("csv") => load_csv(path),
        Some("json") => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse sentences from {}", path.display()))
        }
        _ => bail!(
            "Unsupported sentence file '{}': expected a .csv or .json file",
            path.display()
        ),
    }
}

fn load_csv(path: &Path) -> Result<Vec<SentenceRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut records = Vec::new();
    for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row.with_context(|| format!("Invalid row {} in {}", line + 2, path.display()))?;
        records.push(row.into_record());
    }
    Ok(records)
}

/// Load the JSON document to evaluate against
pub fn load_document(path: &Path) -> Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse document {}", path.display()))
}
