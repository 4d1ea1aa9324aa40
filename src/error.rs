//! Error types shared by the input adapters, tree builder and configuration.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the crate.
pub type Result<T> = std::result::Result<T, TreemapError>;

/// Top-level error type. Construction errors abort a request before any
/// transform runs.
#[derive(Debug, Error)]
pub enum TreemapError {
    #[error("[TM-1001] empty input: no records to build a tree from")]
    EmptyInput,

    #[error("[TM-1002] duplicate path: {path}")]
    DuplicatePath { path: String },

    #[error("[TM-1003] no roots, possible cycle in input")]
    CyclicInput,

    #[error("[TM-1004] malformed record at line {line}: {details}")]
    MalformedRecord { line: usize, details: String },

    #[error("[TM-2001] invalid palette: {details}")]
    InvalidPalette { details: String },

    #[error("[TM-2002] unknown palette: {name}")]
    UnknownPalette { name: String },

    #[error("[TM-3001] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[TM-3002] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[TM-4001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[TM-4002] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },
}

impl TreemapError {
    /// Stable machine-parseable error code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "TM-1001",
            Self::DuplicatePath { .. } => "TM-1002",
            Self::CyclicInput => "TM-1003",
            Self::MalformedRecord { .. } => "TM-1004",
            Self::InvalidPalette { .. } => "TM-2001",
            Self::UnknownPalette { .. } => "TM-2002",
            Self::ConfigParse { .. } => "TM-3001",
            Self::InvalidConfig { .. } => "TM-3002",
            Self::Io { .. } => "TM-4001",
            Self::Serialization { .. } => "TM-4002",
        }
    }

    /// Whether the error was raised while turning input into a tree.
    pub const fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput
                | Self::DuplicatePath { .. }
                | Self::CyclicInput
                | Self::MalformedRecord { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn malformed(line: usize, details: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line,
            details: details.into(),
        }
    }
}

impl From<toml::de::Error> for TreemapError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for TreemapError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}
