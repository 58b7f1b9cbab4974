//! Churn model (component E), spec.md §3/§4.E.
//!
//! Grounded on `server/src/models/churn.rs`: `calculate_churn_score`'s
//! exact weighting (`0.6 * commit_factor + 0.4 * change_factor`) is
//! reused verbatim since spec.md §4.E.4 specifies it identically.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChurn {
    pub path: String,
    pub commits: usize,
    pub unique_authors: Vec<String>,
    pub author_counts: HashMap<String, usize>,
    pub lines_added: usize,
    pub lines_deleted: usize,
    pub churn_score: f64,
    pub first_seen: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub total_loc: usize,
    pub relative_churn: f64,
    pub change_frequency: f64,
    pub days_active: i64,
}

impl FileChurn {
    /// `0.6 * commit_factor + 0.4 * change_factor`, clamped to `[0, 1]`.
    /// Mirrors `FileChurnMetrics::calculate_churn_score`.
    pub fn calculate_churn_score(commits: usize, changes: usize, max_commits: usize, max_changes: usize) -> f64 {
        let commit_factor = if max_commits > 0 {
            (commits as f64 / max_commits as f64).min(1.0)
        } else {
            0.0
        };
        let change_factor = if max_changes > 0 {
            (changes as f64 / max_changes as f64).min(1.0)
        } else {
            0.0
        };
        (0.6 * commit_factor + 0.4 * change_factor).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChurnSummary {
    pub mean: f64,
    pub variance: f64,
    pub stddev: f64,
    pub p50: f64,
    pub p95: f64,
    pub hotspot_files: Vec<String>,
    pub stable_files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChurnReport {
    pub files: Vec<FileChurn>,
    pub summary: ChurnSummary,
    pub io_errors: Vec<String>,
}
