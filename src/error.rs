//! Error types for the ranking pipeline.
//!
//! Parse and resolution errors are local: callers degrade the affected line or
//! entry and keep going. `InputError` and `RequestError` reject a request before
//! any parsing is attempted.

use std::path::PathBuf;

use thiserror::Error;

/// A ranking line that could not be turned into a `RankingEntry`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed ranking line: {line:?}")]
    Malformed { line: String },

    #[error("duplicate position {position} in line: {line:?}")]
    DuplicatePosition { position: u32, line: String },
}

impl ParseError {
    /// The offending report line.
    pub fn line(&self) -> &str {
        match self {
            Self::Malformed { line } | Self::DuplicatePosition { line, .. } => line,
        }
    }
}

/// A source id that cannot be mapped to an input hostname.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("source id '{source_id}' is not of the form urlN")]
    InvalidSourceId { source_id: String },

    #[error("source id '{source_id}' is out of range for {count} input(s)")]
    OutOfRange { source_id: String, count: usize },

    #[error("input for '{source_id}' is not a valid URL: {url}")]
    InvalidUrl { source_id: String, url: String },
}

/// Rejected comparison input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("please provide at least {min} URLs for comparison (got {count})")]
    TooFew { count: usize, min: usize },

    #[error("at most {max} URLs can be compared (got {count})")]
    TooMany { count: usize, max: usize },

    #[error("URL #{} is not a valid absolute URL: {url}", .index + 1)]
    InvalidUrl { index: usize, url: String },
}

/// A request that cannot be analyzed at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("report text is missing or empty")]
    MissingReport,

    #[error("comparison backend error: {0}")]
    Backend(String),

    #[error("unreadable comparison reply: {0}")]
    InvalidReply(String),

    #[error(transparent)]
    Input(#[from] InputError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("config lists no section names")]
    NoSections,
}
