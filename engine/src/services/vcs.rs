//! VCS reader (component D) — abstract stream of commits newest-first,
//! with per-commit diffs against the first parent (spec.md §4.D, §6).
//!
//! Grounded on `server/src/services/git_analysis.rs`, but reworked from
//! its approach (shelling out to `git log --numstat`) into a trait-based
//! reader with a `git2` implementation. spec.md §6 models the VCS reader
//! as an object with `open`/`log`/`diff` operations, which maps naturally
//! onto `git2::Repository` rather than parsing CLI output.

use chrono::{DateTime, TimeZone, Utc};

use crate::error::{EngineError, EngineResult};
use crate::models::commit::{Chunk, ChunkKind, Commit, FileChange};

/// The VCS reader contract (spec.md §6). `log` yields commits newest
/// first; `diff` reports changes against the first parent (initial
/// commits have no diff). `merge_base`/`diff_range` back the branch-diff
/// mode (spec.md §4.F): resolving two refs to their common ancestor and
/// diffing an arbitrary pair of refs, rather than a commit against its
/// parent.
pub trait VcsReader: Send + Sync {
    fn log(&self, since: DateTime<Utc>) -> EngineResult<Vec<Commit>>;
    fn diff(&self, commit_hash: &str) -> EngineResult<Vec<FileChange>>;
    /// Resolves `a` and `b` (branch names, tags, or `HEAD`) and returns the
    /// hash of their merge base.
    fn merge_base(&self, a: &str, b: &str) -> EngineResult<String>;
    /// Diffs the tree at `from` against the tree at `to`, in the same
    /// chunked shape as `diff`.
    fn diff_range(&self, from: &str, to: &str) -> EngineResult<Vec<FileChange>>;
}

/// A `git2`-backed implementation opened against a working tree path.
pub struct Git2VcsReader {
    repo: git2::Repository,
}

impl Git2VcsReader {
    pub fn open(path: &std::path::Path) -> EngineResult<Self> {
        let repo = git2::Repository::open(path).map_err(|_| EngineError::NotARepo(path.to_path_buf()))?;
        Ok(Git2VcsReader { repo })
    }

    fn chunks_from_diff(&self, diff: &git2::Diff) -> Vec<Vec<Chunk>> {
        // One Vec<Chunk> per delta, in delta order; git2's line callback
        // gives us deltas implicitly via hunk boundaries, so we track the
        // active delta index as we walk.
        let mut per_delta: Vec<Vec<Chunk>> = (0..diff.deltas().len()).map(|_| Vec::new()).collect();
        let _ = diff.foreach(
            &mut |_delta, _progress| true,
            None,
            None,
            Some(&mut |delta, _hunk, line| {
                let idx = delta_index(diff, &delta);
                if let Some(idx) = idx {
                    let kind = match line.origin() {
                        '+' => Some(ChunkKind::Add),
                        '-' => Some(ChunkKind::Delete),
                        ' ' => Some(ChunkKind::Equal),
                        _ => None,
                    };
                    if let Some(kind) = kind {
                        if let Some(last) = per_delta[idx].last_mut() {
                            if last.kind == kind {
                                last.line_count += 1;
                                return true;
                            }
                        }
                        per_delta[idx].push(Chunk { kind, line_count: 1 });
                    }
                }
                true
            }),
        );
        per_delta
    }
}

fn delta_index(diff: &git2::Diff, delta: &git2::DiffDelta) -> Option<usize> {
    let new_path = delta.new_file().path();
    for i in 0..diff.deltas().len() {
        if let Some(d) = diff.get_delta(i) {
            if d.new_file().path() == new_path && d.old_file().path() == delta.old_file().path() {
                return Some(i);
            }
        }
    }
    None
}

impl VcsReader for Git2VcsReader {
    fn log(&self, since: DateTime<Utc>) -> EngineResult<Vec<Commit>> {
        let mut revwalk = self
            .repo
            .revwalk()
            .map_err(|e| EngineError::CommitStreamError(e.to_string()))?;
        revwalk
            .push_head()
            .map_err(|e| EngineError::CommitStreamError(e.to_string()))?;
        // git2 yields topological/time order newest-first by default
        // without explicit sorting flags on most repositories; we pin it
        // explicitly to satisfy spec.md §4.D's newest-first contract.
        revwalk
            .set_sorting(git2::Sort::TIME)
            .map_err(|e| EngineError::CommitStreamError(e.to_string()))?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid.map_err(|e| EngineError::CommitStreamError(e.to_string()))?;
            let commit = self
                .repo
                .find_commit(oid)
                .map_err(|e| EngineError::CommitStreamError(e.to_string()))?;
            let when = commit.author().when();
            let ts = Utc
                .timestamp_opt(when.seconds(), 0)
                .single()
                .unwrap_or_else(Utc::now);
            if ts < since {
                continue;
            }
            commits.push(Commit {
                hash: commit.id().to_string(),
                author: commit.author().name().unwrap_or("unknown").to_string(),
                timestamp: ts,
                message: commit.message().unwrap_or("").to_string(),
                parent_count: commit.parent_count(),
            });
        }
        Ok(commits)
    }

    fn diff(&self, commit_hash: &str) -> EngineResult<Vec<FileChange>> {
        let oid = git2::Oid::from_str(commit_hash)
            .map_err(|e| EngineError::DiffFailure { commit: commit_hash.to_string(), reason: e.to_string() })?;
        let commit = self
            .repo
            .find_commit(oid)
            .map_err(|e| EngineError::DiffFailure { commit: commit_hash.to_string(), reason: e.to_string() })?;
        if commit.parent_count() == 0 {
            return Ok(Vec::new());
        }
        let parent = commit
            .parent(0)
            .map_err(|e| EngineError::DiffFailure { commit: commit_hash.to_string(), reason: e.to_string() })?;
        let parent_tree = parent
            .tree()
            .map_err(|e| EngineError::DiffFailure { commit: commit_hash.to_string(), reason: e.to_string() })?;
        let tree = commit
            .tree()
            .map_err(|e| EngineError::DiffFailure { commit: commit_hash.to_string(), reason: e.to_string() })?;
        self.diff_trees(&parent_tree, &tree, commit_hash)
    }

    fn merge_base(&self, a: &str, b: &str) -> EngineResult<String> {
        let oid_a = self
            .repo
            .revparse_single(a)
            .map_err(|e| EngineError::CommitStreamError(e.to_string()))?
            .id();
        let oid_b = self
            .repo
            .revparse_single(b)
            .map_err(|e| EngineError::CommitStreamError(e.to_string()))?
            .id();
        let base = self
            .repo
            .merge_base(oid_a, oid_b)
            .map_err(|e| EngineError::CommitStreamError(e.to_string()))?;
        Ok(base.to_string())
    }

    fn diff_range(&self, from: &str, to: &str) -> EngineResult<Vec<FileChange>> {
        let label = format!("{from}..{to}");
        let from_obj = self
            .repo
            .revparse_single(from)
            .map_err(|e| EngineError::DiffFailure { commit: label.clone(), reason: e.to_string() })?;
        let to_obj = self
            .repo
            .revparse_single(to)
            .map_err(|e| EngineError::DiffFailure { commit: label.clone(), reason: e.to_string() })?;
        let from_tree = from_obj
            .peel_to_tree()
            .map_err(|e| EngineError::DiffFailure { commit: label.clone(), reason: e.to_string() })?;
        let to_tree = to_obj
            .peel_to_tree()
            .map_err(|e| EngineError::DiffFailure { commit: label.clone(), reason: e.to_string() })?;
        self.diff_trees(&from_tree, &to_tree, &label)
    }
}

impl Git2VcsReader {
    /// Shared tree-diffing used by both `diff` (commit against parent) and
    /// `diff_range` (arbitrary ref pair, spec.md §4.F branch-diff mode).
    fn diff_trees(&self, old_tree: &git2::Tree, new_tree: &git2::Tree, label: &str) -> EngineResult<Vec<FileChange>> {
        let diff = self
            .repo
            .diff_tree_to_tree(Some(old_tree), Some(new_tree), None)
            .map_err(|e| EngineError::DiffFailure { commit: label.to_string(), reason: e.to_string() })?;

        let per_delta_chunks = self.chunks_from_diff(&diff);
        let mut changes = Vec::with_capacity(diff.deltas().len());
        for (i, delta) in diff.deltas().enumerate() {
            let before_path = delta
                .old_file()
                .path()
                .map(|p| p.to_string_lossy().into_owned());
            let after_path = delta
                .new_file()
                .path()
                .map(|p| p.to_string_lossy().into_owned());
            changes.push(FileChange {
                before_path,
                after_path,
                chunks: per_delta_chunks.get(i).cloned().unwrap_or_default(),
            });
        }
        Ok(changes)
    }
}
