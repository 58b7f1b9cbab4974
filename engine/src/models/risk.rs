//! Change-risk model (component F), spec.md §3/§4.F.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRisk {
    pub hash: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub score: f64,
    pub level: RiskLevel,
    pub contributing_factors: std::collections::HashMap<String, f64>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChangeRiskReport {
    pub commits: Vec<CommitRisk>,
    pub high_threshold: f64,
    pub medium_threshold: f64,
}
