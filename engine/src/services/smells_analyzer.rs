//! Smells analyzer (component K): architectural smells from the
//! dependency graph, spec.md §4.K.
//!
//! Grounded on `server/src/services/coupling_analyzer.rs`'s
//! `CouplingMetrics`/instability formula, generalized here into the full
//! CYCLE/HUB/GOD/UNSTABLE_DEPENDENCY smell classification spec.md names.

use std::collections::HashMap;

use crate::config::SmellThresholds;
use crate::models::graph::{DependencyGraph, EdgeKind};
use crate::models::smells::{ComponentCoupling, Severity, Smell, SmellKind};
use crate::services::graph_analyzer::GraphAnalyzer;

pub struct SmellsAnalyzer {
    thresholds: SmellThresholds,
}

impl SmellsAnalyzer {
    pub fn new(mut thresholds: SmellThresholds) -> Self {
        thresholds.sanitize();
        SmellsAnalyzer { thresholds }
    }

    fn coupling(dep_graph: &DependencyGraph) -> HashMap<String, ComponentCoupling> {
        let mut coupling: HashMap<String, ComponentCoupling> = HashMap::new();
        for node in &dep_graph.nodes {
            coupling.entry(node.id.clone()).or_default();
        }
        for edge in &dep_graph.edges {
            if edge.kind == EdgeKind::Reference {
                continue;
            }
            coupling.entry(edge.from.clone()).or_default().fan_out += 1;
            coupling.entry(edge.to.clone()).or_default().fan_in += 1;
        }
        coupling
    }

    pub fn analyze(&self, dep_graph: &DependencyGraph) -> Vec<Smell> {
        let coupling = Self::coupling(dep_graph);
        let analyzer = GraphAnalyzer::new(dep_graph);
        let mut smells = Vec::new();

        for cycle in analyzer.cycles() {
            smells.push(Smell { kind: SmellKind::Cycle, severity: Severity::Critical, components: cycle });
        }

        for (id, c) in &coupling {
            let total = c.fan_in + c.fan_out;
            let is_god = c.fan_in > self.thresholds.god_fan_in && c.fan_out > self.thresholds.god_fan_out;
            if is_god {
                smells.push(Smell { kind: SmellKind::God, severity: Severity::Critical, components: vec![id.clone()] });
            } else if total > self.thresholds.hub_fan_total {
                smells.push(Smell { kind: SmellKind::Hub, severity: Severity::High, components: vec![id.clone()] });
            }
        }

        for edge in &dep_graph.edges {
            let from_coupling = coupling.get(&edge.from).copied().unwrap_or_default();
            let to_coupling = coupling.get(&edge.to).copied().unwrap_or_default();
            if from_coupling.instability() < self.thresholds.stable_instability
                && to_coupling.instability() > self.thresholds.unstable_instability
            {
                smells.push(Smell {
                    kind: SmellKind::UnstableDependency,
                    severity: Severity::Medium,
                    components: vec![edge.from.clone(), edge.to.clone()],
                });
            }
        }

        smells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instability_extremes_match_spec_scenario() {
        let stable = ComponentCoupling { fan_in: 10, fan_out: 0 };
        let unstable = ComponentCoupling { fan_in: 0, fan_out: 10 };
        assert_eq!(stable.instability(), 0.0);
        assert_eq!(unstable.instability(), 1.0);
    }

    #[test]
    fn hub_vs_god_classification() {
        // fan_in=18, fan_out=5, thresholds hub=20 total, god=10/10.
        let thresholds = SmellThresholds { hub_fan_total: 20, god_fan_in: 10, god_fan_out: 10, ..Default::default() };
        let c = ComponentCoupling { fan_in: 18, fan_out: 5 };
        let is_god = c.fan_in > thresholds.god_fan_in && c.fan_out > thresholds.god_fan_out;
        assert!(!is_god);
        assert!(c.fan_in + c.fan_out > thresholds.hub_fan_total);
    }
}
