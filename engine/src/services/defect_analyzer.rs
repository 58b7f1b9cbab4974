//! Defect analyzer (component M): combines upstream reports into
//! per-file defect probability, spec.md §4.M.
//!
//! Grounded on `server/src/services/defect_probability.rs`'s CDF-
//! interpolation/sigmoid-calibration pattern, reused structurally but
//! with spec.md's own numbers substituted throughout: a fifth factor
//! (ownership) not present upstream, spec.md's own weight values, and
//! spec.md's exact CDF knots.

use std::collections::HashMap;

use crate::config::DefectWeights;
use crate::models::defect::{DefectScore, FileMetrics, RiskLevel};
use crate::services::stats::interpolate;

const CHURN_KNOTS: &[(f64, f64)] = &[(0.0, 0.0), (0.3, 0.30), (0.5, 0.70), (0.7, 0.93), (1.0, 1.0)];
const COMPLEXITY_KNOTS: &[(f64, f64)] = &[(1.0, 0.1), (5.0, 0.5), (10.0, 0.8), (20.0, 0.95), (50.0, 1.0)];
const COUPLING_KNOTS: &[(f64, f64)] = &[(0.0, 0.1), (3.0, 0.7), (12.0, 0.95), (20.0, 1.0)];
const OWNERSHIP_KNOTS: &[(f64, f64)] = &[(1.0, 0.1), (3.0, 0.5), (8.0, 0.85), (20.0, 1.0)];

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

pub struct DefectAnalyzer {
    weights: DefectWeights,
}

impl DefectAnalyzer {
    pub fn new(weights: DefectWeights) -> Self {
        DefectAnalyzer { weights }
    }

    pub fn score(&self, metrics: &FileMetrics) -> DefectScore {
        let churn_present = metrics.churn_score.is_some();
        let coupling_present = metrics.afferent_coupling.is_some();

        let churn_norm = interpolate(CHURN_KNOTS, metrics.churn_score.unwrap_or(0.0));
        let complexity_norm = interpolate(COMPLEXITY_KNOTS, metrics.max_cyclomatic);
        let duplication_norm = metrics.duplicate_ratio.clamp(0.0, 1.0);
        let coupling_norm = interpolate(COUPLING_KNOTS, metrics.afferent_coupling.unwrap_or(0.0));
        let ownership_norm = interpolate(OWNERSHIP_KNOTS, metrics.ownership_diffusion);

        let mut factors = HashMap::new();
        factors.insert("churn".to_string(), churn_norm * self.weights.churn);
        factors.insert("complexity".to_string(), complexity_norm * self.weights.complexity);
        factors.insert("duplication".to_string(), duplication_norm * self.weights.duplication);
        factors.insert("coupling".to_string(), coupling_norm * self.weights.coupling);
        factors.insert("ownership".to_string(), ownership_norm * self.weights.ownership);

        let raw: f64 = factors.values().sum();
        let probability = sigmoid(10.0 * (raw - 0.5));

        let risk = if probability >= 0.7 {
            RiskLevel::High
        } else if probability >= 0.3 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        let mut confidence = 1.0;
        if metrics.loc < 10 {
            confidence *= 0.5;
        } else if metrics.loc < 50 {
            confidence *= 0.8;
        }
        if !coupling_present {
            confidence *= 0.9;
        }
        if !churn_present {
            confidence *= 0.85;
        }
        confidence = confidence.clamp(0.0, 1.0);

        let recommendations = Self::recommendations(&factors, risk);

        DefectScore { probability, confidence, risk, contributing_factors: factors, recommendations }
    }

    fn recommendations(factors: &HashMap<String, f64>, risk: RiskLevel) -> Vec<String> {
        if risk != RiskLevel::High {
            return Vec::new();
        }
        let mut recs = Vec::new();
        if factors.get("churn").copied().unwrap_or(0.0) > 0.2 {
            recs.push("high recent churn; add regression coverage before further changes".to_string());
        }
        if factors.get("complexity").copied().unwrap_or(0.0) > 0.15 {
            recs.push("extract smaller functions to reduce cyclomatic complexity".to_string());
        }
        if factors.get("duplication").copied().unwrap_or(0.0) > 0.1 {
            recs.push("consolidate duplicated logic flagged by the clone detector".to_string());
        }
        recs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_midpoint_is_one_half() {
        assert!((sigmoid(10.0 * (0.5 - 0.5)) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn all_zero_metrics_give_low_probability() {
        let analyzer = DefectAnalyzer::new(DefectWeights::default());
        let score = analyzer.score(&FileMetrics { churn_score: Some(0.0), loc: 100, afferent_coupling: Some(0.0), ..Default::default() });
        assert!((score.probability - sigmoid(-5.0)).abs() < 1e-6);
    }

    #[test]
    fn probability_is_always_in_unit_range() {
        let analyzer = DefectAnalyzer::new(DefectWeights::default());
        let score = analyzer.score(&FileMetrics {
            churn_score: Some(1.0),
            max_cyclomatic: 50.0,
            duplicate_ratio: 1.0,
            afferent_coupling: Some(20.0),
            ownership_diffusion: 20.0,
            loc: 500,
        });
        assert!((0.0..=1.0).contains(&score.probability));
    }

    #[test]
    fn small_file_reduces_confidence() {
        let analyzer = DefectAnalyzer::new(DefectWeights::default());
        let score = analyzer.score(&FileMetrics { loc: 5, churn_score: Some(0.1), afferent_coupling: Some(1.0), ..Default::default() });
        assert!(score.confidence <= 0.5 + 1e-9);
    }
}
