//! Error taxonomy for the analysis engine.
//!
//! Mirrors the skip-vs-abort distinction every analyzer is expected to
//! honor: parse/IO/diff failures are recorded and the run continues;
//! repository-open and commit-stream failures abort the analyzer that
//! raised them.

use std::path::PathBuf;

use thiserror::Error;

/// Errors an analyzer can surface. Each variant documents its propagation
/// rule; callers should match on the rule, not the message text.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Raised by the VCS reader when the given path is not a repository.
    /// Propagation: abort the calling analyzer; surface to the user.
    #[error("not a repository: {0}")]
    NotARepo(PathBuf),

    /// Raised by the parser facade. Propagation: skip the file, continue.
    #[error("failed to parse {path}: {reason}")]
    ParseFailure { path: PathBuf, reason: String },

    /// Raised by the content source or an LOC reader. Propagation: skip
    /// the file, record a per-file error flag.
    #[error("io failure reading {path}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raised by the VCS reader while iterating commits. Propagation:
    /// abort the analyzer.
    #[error("commit stream error: {0}")]
    CommitStreamError(String),

    /// Raised materializing a single commit's diff. Propagation: skip
    /// the commit, exclude it from all statistics.
    #[error("diff failure for commit {commit}: {reason}")]
    DiffFailure { commit: String, reason: String },

    /// Raised when a cancellation token is observed. Propagation: abort
    /// the analyzer, drain outstanding workers. Partial results are
    /// never surfaced.
    #[error("operation cancelled")]
    OperationCancelled,

    /// Raised by config validation. Propagation: replace with a default
    /// (single out-of-range threshold) or abort (weight vector that
    /// doesn't sum to 1.0) — see `Config::validate`.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// True for errors that mean "skip this unit of work and continue",
    /// false for errors that mean "abort the analyzer".
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::ParseFailure { .. }
                | EngineError::IoFailure { .. }
                | EngineError::DiffFailure { .. }
        )
    }
}
