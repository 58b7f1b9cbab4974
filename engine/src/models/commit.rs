//! VCS-facing data model (spec.md §3): commits, file changes, diff chunks,
//! and the per-commit feature vector the churn and change-risk analyzers
//! both build on.
//!
//! Grounded on `server/src/models/churn.rs` and `server/src/services/
//! git_analysis.rs`'s commit/file-stat shapes, retargeted onto a `git2`-
//! backed abstract VCS reader (see `services::vcs`) instead of shelling
//! out to the `git` CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A source language recognized by the parser facade (component B).
/// Unknown extensions map to `Unknown`, on which most analyzers skip the
/// file (spec.md §4.B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Go,
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Java,
    CSharp,
    C,
    Cpp,
    Ruby,
    Php,
    Kotlin,
    Swift,
    Bash,
    Unknown,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "go" => Language::Go,
            "rs" => Language::Rust,
            "py" | "pyi" => Language::Python,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "java" => Language::Java,
            "cs" => Language::CSharp,
            "c" | "h" => Language::C,
            "cc" | "cpp" | "cxx" | "hpp" | "hh" => Language::Cpp,
            "rb" => Language::Ruby,
            "php" => Language::Php,
            "kt" | "kts" => Language::Kotlin,
            "swift" => Language::Swift,
            "sh" | "bash" => Language::Bash,
            _ => Language::Unknown,
        }
    }

    /// Object-oriented languages the cohesion analyzer (component I)
    /// operates on.
    pub fn is_object_oriented(&self) -> bool {
        matches!(
            self,
            Language::Java
                | Language::TypeScript
                | Language::JavaScript
                | Language::Python
                | Language::CSharp
                | Language::Cpp
                | Language::Ruby
                | Language::Php
        )
    }
}

/// An immutable commit as surfaced by the VCS reader. Created once per
/// commit and never mutated by downstream analyzers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub parent_count: usize,
}

/// The kind of a single diff chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkKind {
    Add,
    Delete,
    Equal,
}

/// A single contiguous diff chunk. `line_count` counts newline separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub kind: ChunkKind,
    pub line_count: usize,
}

/// One file's change within a commit's diff. Exactly one of the paths may
/// be absent (add/delete); `after_path` is preferred when both are absent
/// in application code that must pick one identity for the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub before_path: Option<String>,
    pub after_path: Option<String>,
    pub chunks: Vec<Chunk>,
}

impl FileChange {
    /// `after_path`, falling back to `before_path` per spec.md §3.
    pub fn path(&self) -> Option<&str> {
        self.after_path
            .as_deref()
            .or(self.before_path.as_deref())
    }

    pub fn lines_added(&self) -> usize {
        self.chunks
            .iter()
            .filter(|c| c.kind == ChunkKind::Add)
            .map(|c| c.line_count)
            .sum()
    }

    pub fn lines_deleted(&self) -> usize {
        self.chunks
            .iter()
            .filter(|c| c.kind == ChunkKind::Delete)
            .map(|c| c.line_count)
            .sum()
    }
}

/// Commit-local and (after pass 2) state-dependent features, per spec.md
/// §3/§4.F. `unique_changes`, `num_developers`, and `author_experience`
/// are undefined (zeroed) until pass 2 has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitFeatures {
    pub hash: String,
    pub author: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub is_fix: bool,
    pub is_automated: bool,
    pub lines_added: usize,
    pub lines_deleted: usize,
    pub num_files: usize,
    pub entropy: f64,
    pub files_modified: Vec<String>,
    pub unique_changes: usize,
    pub num_developers: usize,
    pub author_experience: usize,
}
