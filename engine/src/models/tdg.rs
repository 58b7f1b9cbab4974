//! TDG model (component N), spec.md §3/§4.N.
//!
//! Grounded on `server/src/models/tdg.rs`, rescaled from its 0-5 scale
//! onto spec.md's 0-100 component-maxima model; the debt-hours
//! formula `2.0 * 1.8^tdg` and the severity-threshold style are reused
//! verbatim where spec.md specifies the identical numbers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    APlus,
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    D,
    F,
}

impl Grade {
    /// Bands per spec.md §4.N.
    pub fn from_total(total: f64) -> Self {
        if total >= 95.0 {
            Grade::APlus
        } else if total >= 90.0 {
            Grade::A
        } else if total >= 85.0 {
            Grade::AMinus
        } else if total >= 80.0 {
            Grade::BPlus
        } else if total >= 75.0 {
            Grade::B
        } else if total >= 70.0 {
            Grade::BMinus
        } else if total >= 65.0 {
            Grade::CPlus
        } else if total >= 60.0 {
            Grade::C
        } else if total >= 55.0 {
            Grade::CMinus
        } else if total >= 50.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TdgSeverity {
    Critical,
    Warning,
    Normal,
}

impl TdgSeverity {
    /// `tdg = (100 - total) / 20`; > 2.5 Critical, > 1.5 Warning, else
    /// Normal — the PMAT-compatible 0-5 scale (spec.md §4.N).
    pub fn from_total(total: f64) -> Self {
        let tdg = (100.0 - total) / 20.0;
        if tdg > 2.5 {
            TdgSeverity::Critical
        } else if tdg > 1.5 {
            TdgSeverity::Warning
        } else {
            TdgSeverity::Normal
        }
    }
}

/// Component maxima summing to 100, plus up to 10 bonus entropy points
/// (spec.md §4.N).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentMaxima {
    pub structural: f64,
    pub semantic: f64,
    pub duplication: f64,
    pub coupling: f64,
    pub doc: f64,
    pub consistency: f64,
    pub hotspot: f64,
    pub temporal_coupling: f64,
    pub entropy: f64,
}

impl Default for ComponentMaxima {
    fn default() -> Self {
        ComponentMaxima {
            structural: 20.0,
            semantic: 15.0,
            duplication: 15.0,
            coupling: 15.0,
            doc: 5.0,
            consistency: 10.0,
            hotspot: 10.0,
            temporal_coupling: 10.0,
            entropy: 10.0,
        }
    }
}

/// A single applied penalty, deduplicated by `issue_id` (spec.md §4.N).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Penalty {
    pub issue_id: String,
    pub category: String,
    pub amount: f64,
    pub description: String,
}

/// Records penalties once per `issue_id`; re-applying the same issue id
/// is a no-op (spec.md §4.N).
#[derive(Debug, Clone, Default)]
pub struct PenaltyTracker {
    applied: HashMap<String, Penalty>,
}

impl PenaltyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, penalty: Penalty) {
        self.applied.entry(penalty.issue_id.clone()).or_insert(penalty);
    }

    pub fn total_for_category(&self, category: &str) -> f64 {
        self.applied.values().filter(|p| p.category == category).map(|p| p.amount).sum()
    }

    pub fn penalties(&self) -> Vec<&Penalty> {
        self.applied.values().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TdgScore {
    pub structural: f64,
    pub semantic: f64,
    pub duplication: f64,
    pub coupling: f64,
    pub doc: f64,
    pub consistency: f64,
    pub hotspot: f64,
    pub temporal_coupling: f64,
    pub entropy: f64,
    pub total: f64,
    pub grade: Grade,
    pub critical_defects_count: usize,
    pub confidence: f64,
}

impl TdgScore {
    /// `2.0 * 1.8^tdg`, where `tdg` is the 0-5 severity scale (spec.md
    /// §4.N); reused verbatim from `estimate_refactoring_hours`.
    pub fn estimated_debt_hours(&self) -> f64 {
        let tdg = (100.0 - self.total) / 20.0;
        2.0 * 1.8f64.powf(tdg)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TdgHotspot {
    pub path: String,
    pub total: f64,
    pub primary_factor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TdgReport {
    pub scores: HashMap<String, TdgScore>,
    pub hotspots: Vec<TdgHotspot>,
    pub total_debt_hours: f64,
}
