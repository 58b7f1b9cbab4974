//! Architectural-smells model (component K), spec.md §4.K.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmellKind {
    Cycle,
    Hub,
    God,
    UnstableDependency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Smell {
    pub kind: SmellKind,
    pub severity: Severity,
    /// Rendered as `"A -> ... -> Z"` when the component chain is long
    /// (spec.md §4.K: abbreviated when >= 4 long).
    pub components: Vec<String>,
}

impl Smell {
    pub fn render_path(&self) -> String {
        if self.components.len() >= 4 {
            format!(
                "{} -> ... -> {}",
                self.components.first().unwrap(),
                self.components.last().unwrap()
            )
        } else {
            self.components.join(" -> ")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ComponentCoupling {
    pub fan_in: u32,
    pub fan_out: u32,
}

impl ComponentCoupling {
    /// `fan_out / (fan_in + fan_out)`, 0 when total is 0 (spec.md §4.K).
    pub fn instability(&self) -> f64 {
        let total = self.fan_in + self.fan_out;
        if total == 0 {
            0.0
        } else {
            self.fan_out as f64 / total as f64
        }
    }
}
