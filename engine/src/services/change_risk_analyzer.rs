//! Change-risk analyzer (component F): just-in-time defect prediction via
//! two-pass commit-feature extraction (spec.md §4.F, §9).
//!
//! No direct upstream file grounds the two-pass design itself — it is new
//! machinery this crate's domain requires that `git_analysis.rs`'s
//! single pass doesn't need. The normalization/weighting style
//! (percentile-robust `safe_normalize`, weighted sum, sigmoid-free linear
//! score) follows `defect_probability.rs`'s general shape, and the regex
//! sets are lifted verbatim from spec.md §6.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::RegexSet;

use crate::config::ChangeRiskWeights;
use crate::error::EngineResult;
use crate::models::commit::{ChunkKind, CommitFeatures};
use crate::models::risk::{ChangeRiskReport, CommitRisk, RiskLevel};
use crate::services::cancellation::CancellationToken;
use crate::services::stats::{entropy, percentile, safe_normalize};
use crate::services::vcs::VcsReader;

static BUG_FIX_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)\bfix(es|ed|ing)?\b",
        r"(?i)\bbug\b",
        r"(?i)\bbugfix\b",
        r"(?i)\bpatch(es|ed|ing)?\b",
        r"(?i)\bresolve[sd]?\b",
        r"(?i)\bclose[sd]?\s+#\d+",
        r"(?i)\bfixes?\s+#\d+",
        r"(?i)\bdefect\b",
        r"(?i)\bissue\b",
        r"(?i)\berror\b",
        r"(?i)\bcrash(es|ed|ing)?\b",
    ])
    .expect("bug-fix regex set is valid")
});

static AUTOMATED_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)^\s*chore:\s*updated?\s+(image\s+)?tag",
        r"(?i)\[skip ci\]",
        r"(?i)^\s*Merge\s+(pull\s+request|branch)",
        r"(?i)^\s*chore\(deps\):",
        r"(?i)^\s*chore:\s*bump\s+version",
        r"(?i)^\s*ci:",
        r"(?i)^\s*docs?:",
        r"(?i)^\s*style:",
    ])
    .expect("automated-commit regex set is valid")
});

fn is_fix(message: &str) -> bool {
    BUG_FIX_PATTERNS.is_match(message)
}

fn is_automated(message: &str) -> bool {
    AUTOMATED_PATTERNS.is_match(message)
}

pub struct ChangeRiskAnalyzer<'a> {
    vcs: &'a dyn VcsReader,
    weights: ChangeRiskWeights,
    /// Injectable reference time for reproducible runs (spec.md §9 Open
    /// Question: `time.Now()` must be overridable in tests).
    reference_time: Option<DateTime<Utc>>,
    cancellation: CancellationToken,
}

impl<'a> ChangeRiskAnalyzer<'a> {
    pub fn new(vcs: &'a dyn VcsReader, weights: ChangeRiskWeights) -> Self {
        ChangeRiskAnalyzer { vcs, weights, reference_time: None, cancellation: CancellationToken::new() }
    }

    pub fn with_reference_time(mut self, t: DateTime<Utc>) -> Self {
        self.reference_time = Some(t);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.reference_time.unwrap_or_else(Utc::now)
    }

    /// Pass 1: as-streamed (newest-first), commit-local features only.
    /// Commits with `parent_count == 0` are skipped per spec.md §4.F.
    fn pass1(&self, since: DateTime<Utc>) -> EngineResult<Vec<CommitFeatures>> {
        let commits = self.vcs.log(since)?;
        let mut out = Vec::with_capacity(commits.len());
        for commit in commits {
            self.cancellation.check()?;
            if commit.parent_count == 0 {
                continue;
            }
            let changes = match self.vcs.diff(&commit.hash) {
                Ok(c) => c,
                Err(_) => continue, // DiffFailure: skip, exclude from stats
            };
            let mut lines_added = 0usize;
            let mut lines_deleted = 0usize;
            let mut files_modified = Vec::new();
            let mut lines_per_file: HashMap<String, i64> = HashMap::new();
            for change in &changes {
                let Some(path) = change.path().map(str::to_string) else { continue };
                let added: usize = change.chunks.iter().filter(|c| c.kind == ChunkKind::Add).map(|c| c.line_count).sum();
                let deleted: usize = change.chunks.iter().filter(|c| c.kind == ChunkKind::Delete).map(|c| c.line_count).sum();
                lines_added += added;
                lines_deleted += deleted;
                *lines_per_file.entry(path.clone()).or_insert(0) += (added + deleted) as i64;
                files_modified.push(path);
            }
            out.push(CommitFeatures {
                hash: commit.hash,
                author: commit.author,
                message: commit.message.clone(),
                timestamp: commit.timestamp,
                is_fix: is_fix(&commit.message),
                is_automated: is_automated(&commit.message),
                lines_added,
                lines_deleted,
                num_files: files_modified.len(),
                entropy: entropy(&lines_per_file),
                files_modified,
                unique_changes: 0,
                num_developers: 0,
                author_experience: 0,
            });
        }
        Ok(out)
    }

    /// Pass 2: reverse to chronological (oldest-first), fill in the
    /// state-dependent features by reading running state strictly before
    /// mutating it (spec.md §4.F, §9 — the off-by-one trap).
    fn pass2(&self, mut features: Vec<CommitFeatures>) -> Vec<CommitFeatures> {
        features.reverse();

        let mut author_commits: HashMap<String, usize> = HashMap::new();
        let mut file_changes: HashMap<String, usize> = HashMap::new();
        let mut file_authors: HashMap<String, HashSet<String>> = HashMap::new();

        for f in features.iter_mut() {
            let mut developers: HashSet<String> = HashSet::new();
            let mut unique_changes = 0usize;
            for file in &f.files_modified {
                if let Some(authors) = file_authors.get(file) {
                    developers.extend(authors.iter().cloned());
                }
                unique_changes += file_changes.get(file).copied().unwrap_or(0);
            }
            f.author_experience = author_commits.get(&f.author).copied().unwrap_or(0);
            f.num_developers = developers.len();
            f.unique_changes = unique_changes;

            *author_commits.entry(f.author.clone()).or_insert(0) += 1;
            for file in &f.files_modified {
                *file_changes.entry(file.clone()).or_insert(0) += 1;
                file_authors.entry(file.clone()).or_default().insert(f.author.clone());
            }
        }

        features
    }

    fn score_commits(&self, features: &[CommitFeatures]) -> Vec<(f64, HashMap<String, f64>)> {
        let max_added = features.iter().map(|f| f.lines_added as f64).fold(0.0, f64::max);
        let p95_added = percentile(&sorted(features.iter().map(|f| f.lines_added as f64)), 95);
        let added_cap = if p95_added > 0.0 { p95_added } else { max_added };

        let max_deleted = features.iter().map(|f| f.lines_deleted as f64).fold(0.0, f64::max);
        let p95_deleted = percentile(&sorted(features.iter().map(|f| f.lines_deleted as f64)), 95);
        let deleted_cap = if p95_deleted > 0.0 { p95_deleted } else { max_deleted };

        let max_entropy = features.iter().map(|f| f.entropy).fold(0.0, f64::max);
        let p95_entropy = percentile(&sorted(features.iter().map(|f| f.entropy)), 95);
        let entropy_cap = if p95_entropy > 0.0 { p95_entropy } else { max_entropy };

        let max_unique = features.iter().map(|f| f.unique_changes as f64).fold(0.0, f64::max);
        let p95_unique = percentile(&sorted(features.iter().map(|f| f.unique_changes as f64)), 95);
        let unique_cap = if p95_unique > 0.0 { p95_unique } else { max_unique };

        let max_files = features.iter().map(|f| f.num_files as f64).fold(0.0, f64::max);
        let p95_files = percentile(&sorted(features.iter().map(|f| f.num_files as f64)), 95);
        let files_cap = if p95_files > 0.0 { p95_files } else { max_files };

        let max_ndev = features.iter().map(|f| f.num_developers as f64).fold(0.0, f64::max);
        let p95_ndev = percentile(&sorted(features.iter().map(|f| f.num_developers as f64)), 95);
        let ndev_cap = if p95_ndev > 0.0 { p95_ndev } else { max_ndev };

        let max_exp = features.iter().map(|f| f.author_experience as f64).fold(0.0, f64::max);
        let p95_exp = percentile(&sorted(features.iter().map(|f| f.author_experience as f64)), 95);
        let exp_cap = if p95_exp > 0.0 { p95_exp } else { max_exp };

        features
            .iter()
            .map(|f| {
                let n_added = safe_normalize(f.lines_added as f64, added_cap);
                let n_deleted = safe_normalize(f.lines_deleted as f64, deleted_cap);
                let n_entropy = safe_normalize(f.entropy, entropy_cap);
                let n_unique = safe_normalize(f.unique_changes as f64, unique_cap);
                let n_files = safe_normalize(f.num_files as f64, files_cap);
                let n_ndev = safe_normalize(f.num_developers as f64, ndev_cap);
                let n_exp = 1.0 - safe_normalize(f.author_experience as f64, exp_cap);

                let mut factors = HashMap::new();
                factors.insert("is_fix".to_string(), if f.is_fix { self.weights.is_fix } else { 0.0 });
                factors.insert("entropy".to_string(), n_entropy * self.weights.entropy);
                factors.insert("lines_added".to_string(), n_added * self.weights.lines_added);
                factors.insert("unique_changes".to_string(), n_unique * self.weights.unique_changes);
                factors.insert("num_files".to_string(), n_files * self.weights.num_files);
                factors.insert("lines_deleted".to_string(), n_deleted * self.weights.lines_deleted);
                factors.insert("num_developers".to_string(), n_ndev * self.weights.num_developers);
                factors.insert("author_experience".to_string(), n_exp * self.weights.author_experience);

                let score: f64 = factors.values().sum();
                (score.clamp(0.0, 1.0), factors)
            })
            .collect()
    }

    fn recommendations(factors: &HashMap<String, f64>) -> Vec<String> {
        let mut recs = Vec::new();
        if factors.get("entropy").copied().unwrap_or(0.0) >= 0.15 {
            recs.push("changes are scattered; consider a focused PR".to_string());
        }
        if factors.get("author_experience").copied().unwrap_or(0.0) >= 0.04 {
            recs.push("primary author is new to these files".to_string());
        }
        recs
    }

    /// Full two-pass analysis over the commit history window, with
    /// percentile-based risk-level thresholds (spec.md §4.F default:
    /// high = p95, medium = p80).
    pub fn analyze(&self, since: DateTime<Utc>) -> EngineResult<ChangeRiskReport> {
        let _ = self.now();
        let pass1 = self.pass1(since)?;
        let features = self.pass2(pass1);
        let scored = self.score_commits(&features);

        let scores_sorted = sorted(scored.iter().map(|(s, _)| *s));
        let high_threshold = percentile(&scores_sorted, 95);
        let medium_threshold = percentile(&scores_sorted, 80);

        let commits = features
            .into_iter()
            .zip(scored.into_iter())
            .map(|(f, (score, factors))| {
                let level = if score >= high_threshold {
                    RiskLevel::High
                } else if score >= medium_threshold {
                    RiskLevel::Medium
                } else {
                    RiskLevel::Low
                };
                let recommendations = if level == RiskLevel::High {
                    Self::recommendations(&factors)
                } else {
                    Vec::new()
                };
                CommitRisk {
                    hash: f.hash,
                    author: f.author,
                    timestamp: f.timestamp,
                    score,
                    level,
                    contributing_factors: factors,
                    recommendations,
                }
            })
            .collect();

        Ok(ChangeRiskReport { commits, high_threshold, medium_threshold })
    }

    /// Branch-diff mode (spec.md §4.F/§6): scores one aggregate "commit"
    /// built from everything between `target`'s merge-base with `HEAD` and
    /// `HEAD` itself, rather than the commit history. There is no real
    /// commit message to classify as a fix and no prior state to derive
    /// `unique_changes`/`num_developers`/`author_experience` from, so those
    /// are zeroed and `is_fix` is forced false; risk is then read off the
    /// fixed thresholds (`risk_level_fixed`) instead of the percentile ones
    /// `analyze` uses, since a single aggregate has no distribution to take
    /// percentiles over.
    pub fn analyze_branch_diff(&self, target: &str) -> EngineResult<CommitRisk> {
        let base = self.vcs.merge_base(target, "HEAD")?;
        let changes = self.vcs.diff_range(&base, "HEAD")?;

        let mut lines_added = 0usize;
        let mut lines_deleted = 0usize;
        let mut files_modified = Vec::new();
        let mut lines_per_file: HashMap<String, i64> = HashMap::new();
        for change in &changes {
            let Some(path) = change.path().map(str::to_string) else { continue };
            let added: usize = change.chunks.iter().filter(|c| c.kind == ChunkKind::Add).map(|c| c.line_count).sum();
            let deleted: usize = change.chunks.iter().filter(|c| c.kind == ChunkKind::Delete).map(|c| c.line_count).sum();
            lines_added += added;
            lines_deleted += deleted;
            *lines_per_file.entry(path.clone()).or_insert(0) += (added + deleted) as i64;
            files_modified.push(path);
        }

        let aggregate = CommitFeatures {
            hash: format!("{base}..HEAD"),
            author: String::new(),
            message: String::new(),
            timestamp: self.now(),
            is_fix: false,
            is_automated: false,
            lines_added,
            lines_deleted,
            num_files: files_modified.len(),
            entropy: entropy(&lines_per_file),
            files_modified,
            unique_changes: 0,
            num_developers: 0,
            author_experience: 0,
        };

        let mut scored = self.score_commits(std::slice::from_ref(&aggregate));
        let (score, factors) = scored.remove(0);
        let level = Self::risk_level_fixed(score);
        let recommendations = if level == RiskLevel::High { Self::recommendations(&factors) } else { Vec::new() };

        Ok(CommitRisk {
            hash: aggregate.hash,
            author: aggregate.author,
            timestamp: aggregate.timestamp,
            score,
            level,
            contributing_factors: factors,
            recommendations,
        })
    }

    /// Single branch-diff mode: fixed thresholds (high >= 0.7, medium >=
    /// 0.4) rather than percentile-derived ones, per spec.md §4.F.
    pub fn risk_level_fixed(score: f64) -> RiskLevel {
        if score >= 0.7 {
            RiskLevel::High
        } else if score >= 0.4 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

fn sorted(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = values.collect();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap());
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineResult;
    use crate::models::commit::{Chunk, ChunkKind, Commit, FileChange};
    use chrono::TimeZone;

    struct FixtureVcs {
        commits: Vec<Commit>,
        diffs: HashMap<String, Vec<FileChange>>,
    }

    impl VcsReader for FixtureVcs {
        fn log(&self, _since: DateTime<Utc>) -> EngineResult<Vec<Commit>> {
            Ok(self.commits.clone())
        }
        fn diff(&self, hash: &str) -> EngineResult<Vec<FileChange>> {
            Ok(self.diffs.get(hash).cloned().unwrap_or_default())
        }
        fn merge_base(&self, a: &str, _b: &str) -> EngineResult<String> {
            Ok(a.to_string())
        }
        fn diff_range(&self, _from: &str, to: &str) -> EngineResult<Vec<FileChange>> {
            Ok(self.diffs.get(to).cloned().unwrap_or_default())
        }
    }

    fn commit(hash: &str, author: &str, hour: i64) -> Commit {
        Commit {
            hash: hash.to_string(),
            author: author.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::hours(hour),
            message: "touch x".to_string(),
            parent_count: 1,
        }
    }

    fn change(path: &str) -> FileChange {
        FileChange {
            before_path: Some(path.to_string()),
            after_path: Some(path.to_string()),
            chunks: vec![Chunk { kind: ChunkKind::Add, line_count: 1 }],
        }
    }

    #[test]
    fn default_weights_sum_to_one() {
        assert!((ChangeRiskWeights::default().sum() - 1.0).abs() < 0.01);
    }

    #[test]
    fn fixed_thresholds_match_spec_scenario() {
        assert_eq!(ChangeRiskAnalyzer::risk_level_fixed(0.39), RiskLevel::Low);
        assert_eq!(ChangeRiskAnalyzer::risk_level_fixed(0.40), RiskLevel::Medium);
        assert_eq!(ChangeRiskAnalyzer::risk_level_fixed(0.69), RiskLevel::Medium);
        assert_eq!(ChangeRiskAnalyzer::risk_level_fixed(0.70), RiskLevel::High);
    }

    #[test]
    fn temporal_order_oldest_has_smallest_state_contributions() {
        // Four commits by Alice touching file X, newest-first as the VCS
        // streams them (spec.md §8 scenario 5).
        let commits = vec![
            commit("c4", "alice", 3),
            commit("c3", "alice", 2),
            commit("c2", "alice", 1),
            commit("c1", "alice", 0),
        ];
        let mut diffs = HashMap::new();
        for c in &commits {
            diffs.insert(c.hash.clone(), vec![change("x.rs")]);
        }
        let vcs = FixtureVcs { commits, diffs };
        let analyzer = ChangeRiskAnalyzer::new(&vcs, ChangeRiskWeights::default());

        let pass1 = analyzer.pass1(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()).unwrap();
        let features = analyzer.pass2(pass1);

        // features is chronological (oldest-first) after pass2.
        let oldest = &features[0];
        let newest = &features[3];
        assert_eq!(oldest.author_experience, 0);
        assert_eq!(oldest.num_developers, 0);
        assert_eq!(oldest.unique_changes, 0);
        assert_eq!(newest.author_experience, 3);
        assert_eq!(newest.unique_changes, 3);
    }

    #[test]
    fn branch_diff_forces_non_fix_and_fixed_thresholds() {
        let mut diffs = HashMap::new();
        diffs.insert("HEAD".to_string(), vec![change("x.rs"), change("y.rs")]);
        let vcs = FixtureVcs { commits: Vec::new(), diffs };
        let analyzer = ChangeRiskAnalyzer::new(&vcs, ChangeRiskWeights::default())
            .with_reference_time(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());

        let risk = analyzer.analyze_branch_diff("feature").unwrap();
        assert_eq!(risk.hash, "feature..HEAD");
        assert_eq!(risk.level, ChangeRiskAnalyzer::risk_level_fixed(risk.score));
        assert_eq!(risk.contributing_factors.get("is_fix").copied(), Some(0.0));
    }
}
