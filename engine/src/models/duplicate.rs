//! Duplicate-detection model (component H), spec.md §3/§4.H.
//!
//! Grounded on `server/src/services/duplicate_detector.rs`'s type shapes
//! (`Token`/`TokenKind`, `MinHashSignature`, `CloneInstance`/`CloneGroup`/
//! `CloneReport`), renamed `CloneType` variants to match spec.md §3
//! (`EXACT`/`PARAMETRIC`/`STRUCTURAL` rather than upstream's
//! `Type1`/`Type2`/`Type3`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    StringLiteral,
    NumericLiteral,
    Identifier,
    Keyword,
    Operator,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinHashSignature {
    pub values: Vec<u64>,
}

impl MinHashSignature {
    /// Estimated Jaccard similarity: the fraction of matching positions.
    /// Symmetric by construction (spec.md §8 duplicate-symmetry property).
    pub fn jaccard_similarity(&self, other: &MinHashSignature) -> f64 {
        if self.values.is_empty() || self.values.len() != other.values.len() {
            return 0.0;
        }
        let matches = self
            .values
            .iter()
            .zip(other.values.iter())
            .filter(|(a, b)| a == b)
            .count();
        matches as f64 / self.values.len() as f64
    }
}

pub type FragmentId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFragment {
    pub id: FragmentId,
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub token_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloneType {
    Exact,
    Parametric,
    Structural,
}

impl CloneType {
    /// >=0.95 EXACT; >=0.85 PARAMETRIC; else STRUCTURAL (spec.md §4.H.8).
    pub fn classify(average_similarity: f64) -> Self {
        if average_similarity >= 0.95 {
            CloneType::Exact
        } else if average_similarity >= 0.85 {
            CloneType::Parametric
        } else {
            CloneType::Structural
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloneInstance {
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub lines: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloneGroup {
    pub id: usize,
    pub clone_type: CloneType,
    pub instances: Vec<CloneInstance>,
    pub average_similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicationHotspot {
    pub file: String,
    pub duplicate_lines: usize,
    pub group_count: usize,
    pub severity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CloneSummary {
    pub total_fragments: usize,
    pub total_groups: usize,
    pub total_duplicate_lines: usize,
    pub duplication_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CloneReport {
    pub groups: Vec<CloneGroup>,
    pub summary: CloneSummary,
    pub hotspots: Vec<DuplicationHotspot>,
}
