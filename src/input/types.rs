use compact_str::CompactString;

/// Raw weighted-path entry collected by an input adapter, before tree construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// `/`-separated path (e.g. "github.com/org/repo/pkg/file.go")
    pub path: CompactString,
    /// Weight driving rectangle area. 0 means "impute later".
    pub size: f64,
    /// Secondary scalar mapped to color
    pub heat: f64,
    /// Whether `heat` is a real measurement
    pub has_heat: bool,
}

impl Record {
    /// Record with a size and no heat measurement.
    pub fn sized(path: &str, size: f64) -> Self {
        Self {
            path: CompactString::new(path),
            size,
            heat: 0.0,
            has_heat: false,
        }
    }

    /// Record with both size and heat.
    pub fn with_heat(path: &str, size: f64, heat: f64) -> Self {
        Self {
            path: CompactString::new(path),
            size,
            heat,
            has_heat: true,
        }
    }
}

/// How the tree builder treats a second record for an already-recorded path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail with `DuplicatePath` (coverage profiles: one entry per file).
    Reject,
    /// Sum sizes, keep the max heat, OR `has_heat` (CSV rows).
    Merge,
}

/// Supported input document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum InputFormat {
    /// Sniff the document: coverage profiles start with a `mode:` line.
    #[default]
    Auto,
    Csv,
    Cover,
}

impl InputFormat {
    /// Resolve `Auto` against the document contents.
    pub fn detect(self, document: &str) -> InputFormat {
        match self {
            InputFormat::Auto => {
                let first = document.lines().map(str::trim).find(|l| !l.is_empty());
                match first {
                    Some(line) if line.starts_with("mode:") => InputFormat::Cover,
                    _ => InputFormat::Csv,
                }
            }
            other => other,
        }
    }

    /// Duplicate handling each adapter needs.
    pub fn duplicate_policy(self) -> DuplicatePolicy {
        match self {
            InputFormat::Cover => DuplicatePolicy::Reject,
            InputFormat::Csv | InputFormat::Auto => DuplicatePolicy::Merge,
        }
    }
}
