//! `path[,size[,heat]]` rows.

use super::types::Record;
use crate::error::{Result, TreemapError};

/// Parse a CSV document into records. Blank lines are skipped; a missing size
/// column means "impute later" and a present heat column marks the record as
/// measured.
pub fn parse_csv(document: &str) -> Result<Vec<Record>> {
    let mut records = Vec::new();

    for (idx, raw) in document.lines().enumerate() {
        let line = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }

        let fields = split_fields(raw, line)?;
        let path = fields[0].trim();
        if path.is_empty() {
            return Err(TreemapError::malformed(line, "empty path"));
        }

        let mut record = Record::sized(path, 0.0);

        if let Some(size) = fields.get(1) {
            let size = parse_number(size, line, "size")?;
            if size < 0.0 {
                return Err(TreemapError::malformed(
                    line,
                    format!("size({size}) is negative"),
                ));
            }
            record.size = size;
        }

        if let Some(heat) = fields.get(2) {
            record.heat = parse_number(heat, line, "heat")?;
            record.has_heat = true;
        }

        records.push(record);
    }

    tracing::debug!("Parsed {} CSV records", records.len());
    Ok(records)
}

fn parse_number(field: &str, line: usize, what: &str) -> Result<f64> {
    let trimmed = field.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(TreemapError::malformed(
            line,
            format!("{what}({trimmed}) is not a finite number"),
        )),
    }
}

/// Split one line into fields, honouring double-quoted fields with `""` escapes.
fn split_fields(line_text: &str, line: usize) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line_text.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            ('"', false) if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            (',', false) => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err(TreemapError::malformed(line, "unterminated quoted field"));
    }
    fields.push(current);
    Ok(fields)
}
