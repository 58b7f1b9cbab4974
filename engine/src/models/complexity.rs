//! Complexity model (component G), spec.md §4.G.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionComplexity {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub cyclomatic: u32,
    pub cognitive: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FileComplexity {
    pub path: String,
    pub functions: Vec<FunctionComplexity>,
    pub sum_cyclomatic: u32,
    pub avg_cyclomatic: f64,
    pub max_cyclomatic: u32,
}
