//! Dead-code model (component L), spec.md §3/§4.L.
//!
//! Grounded on `server/src/services/dead_code_analyzer.rs`'s
//! `HierarchicalBitSet`/`ReferenceNode`/`ReferenceEdge`/`ReferenceType`
//! shapes, reimplemented fully (the upstream version is a partial stub
//! with several unpopulated fields and a no-op dynamic-dispatch resolver
//! — see `DESIGN.md`).

use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefKind {
    Function,
    Class,
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Private,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceNode {
    pub id: u32,
    pub name: String,
    pub file: String,
    pub start_line: usize,
    pub kind: DefKind,
    pub visibility: Visibility,
    pub is_entry: bool,
    pub is_exported: bool,
    pub is_test_covered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceType {
    DirectCall,
    DynamicDispatch,
    Import,
    Inherit,
    Reference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub from_id: u32,
    pub to_id: u32,
    pub edge_type: ReferenceType,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceBucket {
    High,
    Medium,
    Low,
}

impl ConfidenceBucket {
    pub fn from_confidence(c: f64) -> Self {
        if c >= 0.85 {
            ConfidenceBucket::High
        } else if c >= 0.5 {
            ConfidenceBucket::Medium
        } else {
            ConfidenceBucket::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadCodeItem {
    pub node: ReferenceNode,
    pub confidence: f64,
    pub bucket: ConfidenceBucket,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnreachableBlock {
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DeadCodeReport {
    pub dead_items: Vec<DeadCodeItem>,
    pub unreachable_blocks: Vec<UnreachableBlock>,
    pub total_definitions: usize,
}

/// One function's source lines, carried alongside the reference graph so
/// `analyze` can run `find_unreachable_blocks` per function (spec.md
/// §4.L step "unreachable statement detection").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionBody {
    pub file: String,
    pub start_line: usize,
    pub lines: Vec<String>,
}

/// Wraps a `RoaringBitmap` as a dense reachability set over `u32` node
/// ids, per spec.md §4.L / §9 ("model as identifier graphs", dense ids
/// used directly as bitset indices).
#[derive(Debug, Clone, Default)]
pub struct HierarchicalBitSet {
    bits: RoaringBitmap,
}

impl HierarchicalBitSet {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set(&mut self, id: u32) {
        self.bits.insert(id);
    }
    pub fn is_set(&self, id: u32) -> bool {
        self.bits.contains(id)
    }
    pub fn count_set(&self) -> u64 {
        self.bits.len()
    }
}
