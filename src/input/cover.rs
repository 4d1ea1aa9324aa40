//! Go coverage profiles (`go test -coverprofile`).
//!
//! ```text
//! mode: set
//! github.com/org/repo/pkg/file.go:10.2,12.16 2 1
//! ```

use std::collections::HashMap;

use super::types::Record;
use crate::error::{Result, TreemapError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BlockPos {
    start_line: u32,
    start_col: u32,
    end_line: u32,
    end_col: u32,
}

#[derive(Debug, Clone, Copy)]
struct Block {
    num_stmt: u64,
    count: u64,
}

/// All blocks of one source file, deduplicated by position.
#[derive(Debug, Default)]
struct FileProfile {
    blocks: Vec<Block>,
    by_pos: HashMap<BlockPos, usize>,
}

impl FileProfile {
    fn total_statements(&self) -> u64 {
        self.blocks.iter().map(|b| b.num_stmt).sum()
    }

    fn covered_ratio(&self) -> f64 {
        let total = self.total_statements();
        if total == 0 {
            return 0.0;
        }
        let covered: u64 = self
            .blocks
            .iter()
            .filter(|b| b.count > 0)
            .map(|b| b.num_stmt)
            .sum();
        covered as f64 / total as f64
    }
}

/// Parse a coverage profile into one record per source file, in first-seen
/// order. With `count_statements` the size is the file's statement count,
/// otherwise every file weighs 1. Heat is the covered-statement ratio.
pub fn parse_cover_profile(document: &str, count_statements: bool) -> Result<Vec<Record>> {
    let mut lines = document
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let set_mode = match lines.next() {
        Some((line, header)) => match header.strip_prefix("mode:") {
            Some(mode) => mode.trim() == "set",
            None => return Err(TreemapError::malformed(line, "missing `mode:` header")),
        },
        None => return Err(TreemapError::EmptyInput),
    };

    let mut order: Vec<String> = Vec::new();
    let mut files: HashMap<String, FileProfile> = HashMap::new();

    for (line, text) in lines {
        let (file, pos, block) = parse_block_line(text, line)?;

        let profile = files.entry(file.to_string()).or_insert_with(|| {
            order.push(file.to_string());
            FileProfile::default()
        });

        match profile.by_pos.get(&pos) {
            Some(&idx) => {
                let existing = &mut profile.blocks[idx];
                if existing.num_stmt != block.num_stmt {
                    return Err(TreemapError::malformed(
                        line,
                        format!(
                            "inconsistent statement count for {file}: {} vs {}",
                            existing.num_stmt, block.num_stmt
                        ),
                    ));
                }
                if set_mode {
                    existing.count |= block.count;
                } else {
                    existing.count = existing.count.saturating_add(block.count);
                }
            }
            None => {
                profile.by_pos.insert(pos, profile.blocks.len());
                profile.blocks.push(block);
            }
        }
    }

    let records: Vec<Record> = order
        .iter()
        .map(|file| {
            let profile = &files[file];
            let size = if count_statements {
                profile.total_statements().max(1)
            } else {
                1
            };
            Record::with_heat(file, size as f64, profile.covered_ratio())
        })
        .collect();

    tracing::debug!(
        "Parsed coverage profile: {} files (set mode: {})",
        records.len(),
        set_mode
    );
    Ok(records)
}

fn parse_block_line(text: &str, line: usize) -> Result<(&str, BlockPos, Block)> {
    let malformed = || TreemapError::malformed(line, format!("bad block line `{text}`"));

    let mut tail = text.rsplitn(3, ' ');
    let count = tail.next().and_then(|s| s.parse::<u64>().ok()).ok_or_else(malformed)?;
    let num_stmt = tail.next().and_then(|s| s.parse::<u64>().ok()).ok_or_else(malformed)?;
    let location = tail.next().ok_or_else(malformed)?;

    let colon = location.rfind(':').ok_or_else(malformed)?;
    let (file, span) = (&location[..colon], &location[colon + 1..]);
    if file.is_empty() {
        return Err(malformed());
    }

    let (start, end) = span.split_once(',').ok_or_else(malformed)?;
    let parse_point = |s: &str| -> Option<(u32, u32)> {
        let (l, c) = s.split_once('.')?;
        Some((l.parse().ok()?, c.parse().ok()?))
    };
    let (start_line, start_col) = parse_point(start).ok_or_else(malformed)?;
    let (end_line, end_col) = parse_point(end).ok_or_else(malformed)?;

    Ok((
        file,
        BlockPos {
            start_line,
            start_col,
            end_line,
            end_col,
        },
        Block { num_stmt, count },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = "mode: set
example.com/app/main.go:5.13,7.2 2 1
example.com/app/main.go:9.13,11.2 2 0
example.com/app/util/strings.go:3.20,5.2 1 1
";

    #[test]
    fn one_record_per_file_in_first_seen_order() {
        let records = parse_cover_profile(PROFILE, true).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].path, "example.com/app/main.go");
        assert_eq!(records[0].size, 4.0);
        assert!((records[0].heat - 0.5).abs() < 1e-12);
        assert!(records[0].has_heat);
        assert_eq!(records[1].path, "example.com/app/util/strings.go");
        assert_eq!(records[1].heat, 1.0);
    }

    #[test]
    fn unit_sizes_without_statement_counting() {
        let records = parse_cover_profile(PROFILE, false).unwrap();
        assert!(records.iter().all(|r| r.size == 1.0));
    }

    #[test]
    fn repeated_blocks_merge_by_position() {
        let doc = "mode: count
a/x.go:1.1,2.2 3 0
a/x.go:1.1,2.2 3 4
";
        let records = parse_cover_profile(doc, true).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].size, 3.0);
        assert_eq!(records[0].heat, 1.0);
    }

    #[test]
    fn inconsistent_statement_counts_are_rejected() {
        let doc = "mode: set
a/x.go:1.1,2.2 3 0
a/x.go:1.1,2.2 4 1
";
        assert!(matches!(
            parse_cover_profile(doc, true),
            Err(TreemapError::MalformedRecord { line: 3, .. })
        ));
    }

    #[test]
    fn files_without_statements_weigh_one_and_are_uncovered() {
        let doc = "mode: set\na/empty.go:1.1,1.2 0 0\n";
        let records = parse_cover_profile(doc, true).unwrap();
        assert_eq!(records[0].size, 1.0);
        assert_eq!(records[0].heat, 0.0);
    }

    #[test]
    fn malformed_documents() {
        assert!(matches!(
            parse_cover_profile("", true),
            Err(TreemapError::EmptyInput)
        ));
        assert!(parse_cover_profile("a/x.go:1.1,2.2 1 1", true).is_err());
        assert!(matches!(
            parse_cover_profile("\n\n  \na/x.go:1.1,2.2 1 1", true),
            Err(TreemapError::MalformedRecord { line: 4, .. })
        ));
        assert!(parse_cover_profile("mode: set\na/x.go 1 1", true).is_err());
        assert!(parse_cover_profile("mode: set\na/x.go:1.1-2.2 1 1", true).is_err());
        assert!(parse_cover_profile("mode: set\n:1.1,2.2 1 1", true).is_err());
    }
}
