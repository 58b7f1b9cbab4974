//! Churn analyzer (component E), spec.md §4.E.
//!
//! Grounded on `server/src/services/git_analysis.rs`'s
//! `analyze_code_churn`/`generate_summary` pipeline: per-file accumulation
//! during a single pass over commits, then a second pass computing
//! `max_commits`/`max_changes` and the hotspot/stable split from the
//! top/bottom ten by `churn_score`. Reworked onto the `VcsReader` trait
//! (component D) instead of shelling out to `git log --numstat`.
//!
//! The per-file LOC read (the only part of this pass that touches the
//! filesystem rather than the commit graph already held in memory) runs
//! across a `rayon` pool sized by `num_cpus`, per spec.md §5's file-level
//! worker-pool parallelism requirement.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rayon::prelude::*;

use crate::error::EngineResult;
use crate::models::churn::{ChurnReport, ChurnSummary, FileChurn};
use crate::models::commit::ChunkKind;
use crate::services::cancellation::CancellationToken;
use crate::services::content_source::ContentSource;
use crate::services::stats::distribution;
use crate::services::vcs::VcsReader;

pub struct ChurnAnalyzer<'a> {
    vcs: &'a dyn VcsReader,
    content: &'a dyn ContentSource,
    cancellation: CancellationToken,
}

/// Ceiling of the active span in whole days: a 1.5-day span counts as 2,
/// never truncated down to 1.
fn days_active_ceil(first: DateTime<Utc>, last: DateTime<Utc>) -> i64 {
    let secs = (last - first).num_seconds().max(0);
    let whole_days = secs / 86_400;
    let remainder = secs % 86_400;
    let days = if remainder > 0 { whole_days + 1 } else { whole_days };
    days.max(1)
}

struct Accum {
    commits: usize,
    author_counts: HashMap<String, usize>,
    lines_added: usize,
    lines_deleted: usize,
    first_seen: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

impl<'a> ChurnAnalyzer<'a> {
    pub fn new(vcs: &'a dyn VcsReader, content: &'a dyn ContentSource) -> Self {
        ChurnAnalyzer { vcs, content, cancellation: CancellationToken::new() }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn analyze(&self, since: DateTime<Utc>, now: DateTime<Utc>) -> EngineResult<ChurnReport> {
        let commits = self.vcs.log(since)?;

        let mut by_file: HashMap<String, Accum> = HashMap::new();
        for commit in &commits {
            self.cancellation.check()?;
            let changes = match self.vcs.diff(&commit.hash) {
                Ok(c) => c,
                Err(_) => continue, // DiffFailure: skip commit, exclude from stats
            };
            for change in changes {
                let Some(path) = change.path().map(str::to_string) else { continue };
                let added: usize = change
                    .chunks
                    .iter()
                    .filter(|c| c.kind == ChunkKind::Add)
                    .map(|c| c.line_count)
                    .sum();
                let deleted: usize = change
                    .chunks
                    .iter()
                    .filter(|c| c.kind == ChunkKind::Delete)
                    .map(|c| c.line_count)
                    .sum();
                let entry = by_file.entry(path).or_insert_with(|| Accum {
                    commits: 0,
                    author_counts: HashMap::new(),
                    lines_added: 0,
                    lines_deleted: 0,
                    first_seen: commit.timestamp,
                    last_modified: commit.timestamp,
                });
                entry.commits += 1;
                *entry.author_counts.entry(commit.author.clone()).or_insert(0) += 1;
                entry.lines_added += added;
                entry.lines_deleted += deleted;
                entry.first_seen = entry.first_seen.min(commit.timestamp);
                entry.last_modified = entry.last_modified.max(commit.timestamp);
            }
        }

        let max_commits = by_file.values().map(|a| a.commits).max().unwrap_or(0);
        let max_changes = by_file
            .values()
            .map(|a| a.lines_added + a.lines_deleted)
            .max()
            .unwrap_or(0);

        let entries: Vec<(String, Accum)> = by_file.into_iter().collect();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_cpus::get().max(1))
            .build()
            .map_err(|e| crate::error::EngineError::InvalidConfiguration(format!("failed to build churn worker pool: {e}")))?;

        let computed: Vec<(FileChurn, Option<String>)> = pool.install(|| {
            entries
                .into_par_iter()
                .map(|(path, a)| {
                    let changes = a.lines_added + a.lines_deleted;
                    let churn_score = FileChurn::calculate_churn_score(a.commits, changes, max_commits, max_changes);
                    let (total_loc, io_error) = match self.content.read(&path) {
                        Ok(bytes) => (bytes.iter().filter(|&&b| b == b'\n').count().max(1), None),
                        Err(_) => (1, Some(path.clone())),
                    };
                    let relative_churn = changes as f64 / total_loc as f64;
                    let days_active = days_active_ceil(a.first_seen, a.last_modified);
                    let mut unique_authors: Vec<String> = a.author_counts.keys().cloned().collect();
                    unique_authors.sort();
                    (
                        FileChurn {
                            path,
                            commits: a.commits,
                            unique_authors,
                            author_counts: a.author_counts,
                            lines_added: a.lines_added,
                            lines_deleted: a.lines_deleted,
                            churn_score,
                            first_seen: a.first_seen,
                            last_modified: a.last_modified,
                            total_loc,
                            relative_churn,
                            change_frequency: relative_churn / days_active as f64,
                            days_active,
                        },
                        io_error,
                    )
                })
                .collect()
        });

        let mut io_errors = Vec::new();
        let mut files: Vec<FileChurn> = Vec::with_capacity(computed.len());
        for (f, err) in computed {
            if let Some(e) = err {
                io_errors.push(e);
            }
            files.push(f);
        }

        files.sort_by(|a, b| b.churn_score.partial_cmp(&a.churn_score).unwrap());

        let top10: Vec<&FileChurn> = files.iter().take(10).collect();
        let hotspot_files: Vec<String> = top10
            .iter()
            .filter(|f| f.churn_score > 0.5)
            .map(|f| f.path.clone())
            .collect();

        let bottom10: Vec<&FileChurn> = files.iter().rev().take(10).collect();
        let stable_files: Vec<String> = bottom10
            .iter()
            .filter(|f| f.churn_score < 0.1 && f.commits > 0)
            .map(|f| f.path.clone())
            .collect();

        let scores: Vec<f64> = files.iter().map(|f| f.churn_score).collect();
        let d = distribution(&scores);
        let _ = now;

        Ok(ChurnReport {
            files,
            summary: ChurnSummary {
                mean: d.mean,
                variance: d.variance,
                stddev: d.stddev,
                p50: d.p50,
                p95: d.p95,
                hotspot_files,
                stable_files,
            },
            io_errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::commit::Commit;
    use crate::services::content_source::MemorySource;

    struct FixtureVcs {
        commits: Vec<Commit>,
    }

    impl VcsReader for FixtureVcs {
        fn log(&self, _since: DateTime<Utc>) -> EngineResult<Vec<Commit>> {
            Ok(self.commits.clone())
        }
        fn diff(&self, _hash: &str) -> EngineResult<Vec<crate::models::commit::FileChange>> {
            Ok(Vec::new())
        }
        fn merge_base(&self, a: &str, _b: &str) -> EngineResult<String> {
            Ok(a.to_string())
        }
        fn diff_range(&self, _from: &str, _to: &str) -> EngineResult<Vec<crate::models::commit::FileChange>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn cancelled_token_aborts_before_first_commit() {
        let vcs = FixtureVcs {
            commits: vec![Commit {
                hash: "a".to_string(),
                author: "alice".to_string(),
                timestamp: Utc::now(),
                message: "touch".to_string(),
                parent_count: 1,
            }],
        };
        let content = MemorySource::new();
        let token = crate::services::cancellation::CancellationToken::new();
        token.cancel();
        let analyzer = ChurnAnalyzer::new(&vcs, &content).with_cancellation(token);
        let result = analyzer.analyze(Utc::now() - chrono::Duration::days(1), Utc::now());
        assert!(matches!(result, Err(crate::error::EngineError::OperationCancelled)));
    }

    #[test]
    fn churn_score_matches_spec_scenario() {
        // commits=50, added=250, deleted=250, max_commits=100, max_changes=1000
        let score = crate::models::churn::FileChurn::calculate_churn_score(50, 500, 100, 1000);
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn days_active_rounds_up_a_partial_day() {
        let first = Utc::now();
        let last = first + chrono::Duration::hours(36);
        assert_eq!(days_active_ceil(first, last), 2);
    }

    #[test]
    fn days_active_never_reports_zero() {
        let now = Utc::now();
        assert_eq!(days_active_ceil(now, now), 1);
    }

    #[test]
    fn churn_score_is_always_in_unit_range() {
        for commits in [0usize, 1, 100, 1_000_000] {
            for changes in [0usize, 1, 100, 1_000_000] {
                let s = crate::models::churn::FileChurn::calculate_churn_score(commits, changes, 100, 1000);
                assert!((0.0..=1.0).contains(&s));
            }
        }
    }
}
