//! Self-admitted technical debt (SATD) model — an ambient supplement
//! (SPEC_FULL §C), grounded on `server/src/models/tdg.rs`'s
//! `SatdItem`/`SatdSeverity` tail.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SatdSeverity {
    Low,
    Medium,
    High,
}

impl SatdSeverity {
    pub fn from_marker(marker: &str) -> Self {
        match marker.to_ascii_uppercase().as_str() {
            "FIXME" | "HACK" => SatdSeverity::High,
            "XXX" => SatdSeverity::Medium,
            _ => SatdSeverity::Low, // TODO and anything else
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatdItem {
    pub file: String,
    pub line: usize,
    pub marker: String,
    pub text: String,
    pub severity: SatdSeverity,
}
