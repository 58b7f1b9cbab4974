//! Defect model (component M), spec.md §3/§4.M.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectScore {
    pub probability: f64,
    pub confidence: f64,
    pub risk: RiskLevel,
    pub contributing_factors: HashMap<String, f64>,
    pub recommendations: Vec<String>,
}

/// Per-file raw inputs the defect analyzer normalizes (spec.md §4.M).
/// Missing signals default to 0 and reduce confidence rather than abort.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FileMetrics {
    pub churn_score: Option<f64>,
    pub max_cyclomatic: f64,
    pub duplicate_ratio: f64,
    pub afferent_coupling: Option<f64>,
    pub ownership_diffusion: f64,
    pub loc: usize,
}
