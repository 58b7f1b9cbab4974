//! TDG aggregator (component N): combines component penalties into a
//! 0-100 score and letter grade, spec.md §4.N.
//!
//! Grounded on `server/src/services/tdg_calculator.rs`'s batch-
//! calculation and hotspot-identification shape, rescaled from its 0-5
//! total onto spec.md's 0-100 component-maxima model with an explicit
//! penalty tracker added (upstream computes components directly, with
//! no dedup-by-issue-id step).

use std::collections::HashMap;

use crate::models::churn::FileChurn;
use crate::models::complexity::FileComplexity;
use crate::models::satd::{SatdItem, SatdSeverity};
use crate::models::tdg::{ComponentMaxima, Grade, Penalty, PenaltyTracker, TdgHotspot, TdgReport, TdgScore};

/// Composes a file's upstream signals into a `PenaltyTracker`: max
/// cyclomatic complexity above 10 hits `structural`, the file's share of
/// duplicated lines hits `duplication`, a churn score above 0.5 hits
/// `hotspot`, and each SATD marker hits `consistency` weighted by
/// severity (spec.md §4.N names these four components as composed from
/// upstream component reports, not computed directly).
pub fn penalties_for_file(
    path: &str,
    churn: Option<&FileChurn>,
    complexity: Option<&FileComplexity>,
    duplicate_ratio: f64,
    satd: &[SatdItem],
) -> PenaltyTracker {
    let mut tracker = PenaltyTracker::new();

    if let Some(c) = complexity {
        if c.max_cyclomatic > 10 {
            let over = (c.max_cyclomatic - 10) as f64;
            tracker.apply(Penalty {
                issue_id: format!("{path}:structural:cyclomatic"),
                category: "structural".into(),
                amount: (over * 0.5).min(20.0),
                description: format!("max cyclomatic complexity {}", c.max_cyclomatic),
            });
        }
    }

    if duplicate_ratio > 0.0 {
        tracker.apply(Penalty {
            issue_id: format!("{path}:duplication:ratio"),
            category: "duplication".into(),
            amount: (duplicate_ratio * 15.0).min(15.0),
            description: format!("{:.0}% duplicated lines", duplicate_ratio * 100.0),
        });
    }

    if let Some(ch) = churn {
        if ch.churn_score > 0.5 {
            tracker.apply(Penalty {
                issue_id: format!("{path}:hotspot:churn"),
                category: "hotspot".into(),
                amount: (ch.churn_score * 10.0).min(10.0),
                description: format!("churn score {:.2}", ch.churn_score),
            });
        }
    }

    for item in satd {
        let amount = match item.severity {
            SatdSeverity::High => 2.0,
            SatdSeverity::Medium => 1.0,
            SatdSeverity::Low => 0.5,
        };
        tracker.apply(Penalty {
            issue_id: format!("{path}:consistency:satd:{}", item.line),
            category: "consistency".into(),
            amount,
            description: format!("{} at line {}: {}", item.marker, item.line, item.text),
        });
    }

    tracker
}

pub struct TdgCalculator {
    maxima: ComponentMaxima,
}

impl Default for TdgCalculator {
    fn default() -> Self {
        TdgCalculator { maxima: ComponentMaxima::default() }
    }
}

impl TdgCalculator {
    pub fn new(maxima: ComponentMaxima) -> Self {
        TdgCalculator { maxima }
    }

    /// `has_critical_defects` auto-fails the file (e.g. `.unwrap()` in
    /// Rust, a naked panic in non-test Go) per spec.md §4.N.
    pub fn calculate(&self, penalties: &PenaltyTracker, has_critical_defects: bool, confidence: f64) -> TdgScore {
        let structural = (self.maxima.structural - penalties.total_for_category("structural")).max(0.0);
        let semantic = (self.maxima.semantic - penalties.total_for_category("semantic")).max(0.0);
        let duplication = (self.maxima.duplication - penalties.total_for_category("duplication")).max(0.0);
        let coupling = (self.maxima.coupling - penalties.total_for_category("coupling")).max(0.0);
        let doc = (self.maxima.doc - penalties.total_for_category("doc")).max(0.0);
        let consistency = (self.maxima.consistency - penalties.total_for_category("consistency")).max(0.0);
        let hotspot = (self.maxima.hotspot - penalties.total_for_category("hotspot")).max(0.0);
        let temporal_coupling = (self.maxima.temporal_coupling - penalties.total_for_category("temporal_coupling")).max(0.0);
        let entropy = (self.maxima.entropy - penalties.total_for_category("entropy")).max(0.0).min(self.maxima.entropy);

        let raw = structural + semantic + duplication + coupling + doc + consistency + hotspot + temporal_coupling + entropy;
        let total = if has_critical_defects {
            0.0
        } else if raw <= 100.0 {
            raw
        } else {
            raw / 110.0 * 100.0
        };

        let grade = if has_critical_defects { Grade::F } else { Grade::from_total(total) };
        let critical_defects_count = if has_critical_defects { 1 } else { 0 };

        TdgScore {
            structural,
            semantic,
            duplication,
            coupling,
            doc,
            consistency,
            hotspot,
            temporal_coupling,
            entropy,
            total,
            grade,
            critical_defects_count,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Identifies, per file, which component carries the largest
    /// penalty (i.e. the biggest gap from its maximum) — the
    /// identify-primary-factor-by-max-weighted-component pattern.
    fn primary_factor(score: &TdgScore, maxima: &ComponentMaxima) -> String {
        let gaps: [(&str, f64); 9] = [
            ("structural", maxima.structural - score.structural),
            ("semantic", maxima.semantic - score.semantic),
            ("duplication", maxima.duplication - score.duplication),
            ("coupling", maxima.coupling - score.coupling),
            ("doc", maxima.doc - score.doc),
            ("consistency", maxima.consistency - score.consistency),
            ("hotspot", maxima.hotspot - score.hotspot),
            ("temporal_coupling", maxima.temporal_coupling - score.temporal_coupling),
            ("entropy", maxima.entropy - score.entropy),
        ];
        gaps.iter().max_by(|a, b| a.1.partial_cmp(&b.1).unwrap()).map(|(name, _)| name.to_string()).unwrap_or_default()
    }

    /// Aggregates per-file scores into a project report: top-10 hotspots
    /// by lowest total, and the summed estimated debt-hours.
    pub fn aggregate(&self, scores: HashMap<String, TdgScore>) -> TdgReport {
        let mut ranked: Vec<(&String, &TdgScore)> = scores.iter().collect();
        ranked.sort_by(|a, b| a.1.total.partial_cmp(&b.1.total).unwrap());
        let hotspots: Vec<TdgHotspot> = ranked
            .into_iter()
            .take(10)
            .map(|(path, score)| TdgHotspot {
                path: path.clone(),
                total: score.total,
                primary_factor: Self::primary_factor(score, &self.maxima),
            })
            .collect();

        let total_debt_hours: f64 = scores.values().map(|s| s.estimated_debt_hours()).sum();

        TdgReport { scores, hotspots, total_debt_hours }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tdg::Penalty;

    #[test]
    fn perfect_file_with_no_penalties_is_a_plus() {
        let calc = TdgCalculator::default();
        let tracker = PenaltyTracker::new();
        let score = calc.calculate(&tracker, false, 1.0);
        assert_eq!(score.total, 100.0);
        assert_eq!(score.grade, Grade::APlus);
    }

    #[test]
    fn critical_defect_forces_zero_and_f() {
        let calc = TdgCalculator::default();
        let tracker = PenaltyTracker::new();
        let score = calc.calculate(&tracker, true, 1.0);
        assert_eq!(score.total, 0.0);
        assert_eq!(score.grade, Grade::F);
    }

    #[test]
    fn duplicate_penalty_ids_apply_once() {
        let mut tracker = PenaltyTracker::new();
        tracker.apply(Penalty { issue_id: "dup-1".into(), category: "duplication".into(), amount: 5.0, description: "clone".into() });
        tracker.apply(Penalty { issue_id: "dup-1".into(), category: "duplication".into(), amount: 5.0, description: "clone".into() });
        assert_eq!(tracker.total_for_category("duplication"), 5.0);
    }

    #[test]
    fn total_is_always_in_zero_to_hundred() {
        let calc = TdgCalculator::default();
        let mut tracker = PenaltyTracker::new();
        for i in 0..20 {
            tracker.apply(Penalty { issue_id: format!("s{i}"), category: "structural".into(), amount: 5.0, description: String::new() });
        }
        let score = calc.calculate(&tracker, false, 1.0);
        assert!((0.0..=100.0).contains(&score.total));
    }

    #[test]
    fn penalties_for_file_scores_each_signal_into_its_own_category() {
        let satd = vec![SatdItem { file: "a.rs".into(), line: 3, marker: "FIXME".into(), text: "leak".into(), severity: SatdSeverity::High }];
        let complexity = FileComplexity { path: "a.rs".into(), max_cyclomatic: 15, ..Default::default() };
        let tracker = penalties_for_file("a.rs", None, Some(&complexity), 0.2, &satd);
        assert_eq!(tracker.total_for_category("structural"), 2.5); // (15-10) * 0.5
        assert_eq!(tracker.total_for_category("duplication"), 3.0); // 0.2 * 15.0
        assert_eq!(tracker.total_for_category("consistency"), 2.0); // high severity
        assert_eq!(tracker.total_for_category("hotspot"), 0.0);
    }

    #[test]
    fn low_complexity_and_no_signals_apply_no_penalties() {
        let complexity = FileComplexity { path: "b.rs".into(), max_cyclomatic: 3, ..Default::default() };
        let tracker = penalties_for_file("b.rs", None, Some(&complexity), 0.0, &[]);
        assert_eq!(tracker.penalties().len(), 0);
    }
}
