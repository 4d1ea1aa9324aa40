pub mod cover;
pub mod csv;
pub mod types;

pub use types::{DuplicatePolicy, InputFormat, Record};

use crate::error::Result;

/// Records parsed from one input document plus the duplicate policy its
/// adapter requires.
#[derive(Debug)]
pub struct ParsedInput {
    pub format: InputFormat,
    pub records: Vec<Record>,
    pub policy: DuplicatePolicy,
}

/// Parse a document with the given (or sniffed) format.
pub fn parse_document(
    document: &str,
    format: InputFormat,
    count_statements: bool,
) -> Result<ParsedInput> {
    let format = format.detect(document);
    let records = match format {
        InputFormat::Cover => cover::parse_cover_profile(document, count_statements)?,
        InputFormat::Csv | InputFormat::Auto => csv::parse_csv(document)?,
    };

    Ok(ParsedInput {
        format,
        records,
        policy: format.duplicate_policy(),
    })
}
