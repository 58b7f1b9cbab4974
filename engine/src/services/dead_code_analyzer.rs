//! Dead-code analyzer (component L): reference graph reachability with
//! confidence calibration, spec.md §4.L.
//!
//! Grounded on `server/src/services/dead_code_analyzer.rs`'s general
//! shape (bitset reachability, reference graph, vtable-style dynamic
//! dispatch), but that file is a partial stub (several TODO-marked
//! fields, a no-op AVX2 "vectorized" path, a stub dynamic-call resolver)
//! — this module completes the confidence calibration, visibility rules,
//! and entry-point heuristics spec.md §4.L/§6 actually require.

use std::collections::{HashSet, VecDeque};

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::models::dead_code::{
    ConfidenceBucket, DeadCodeItem, DeadCodeReport, FunctionBody, HierarchicalBitSet, ReferenceEdge,
    ReferenceNode, ReferenceType, UnreachableBlock, Visibility,
};
use crate::models::dead_code::DefKind;
use crate::services::parser::ParseResult;

/// `(interface_name, method_name) -> [target_ids]`, used to resolve
/// dynamic-dispatch call sites the static call graph can't (spec.md
/// §4.L "dynamic dispatch"). Most interfaces have a handful of
/// implementors, so the value is inline-stored up to 4 targets.
#[derive(Debug, Default)]
pub struct VTableResolver {
    table: FxHashMap<(String, String), SmallVec<[u32; 4]>>,
}

impl VTableResolver {
    pub fn register(&mut self, interface: &str, method: &str, target: u32) {
        self.table
            .entry((interface.to_string(), method.to_string()))
            .or_default()
            .push(target);
    }

    pub fn resolve(&self, interface: &str, method: &str) -> Option<&[u32]> {
        self.table.get(&(interface.to_string(), method.to_string())).map(|v| v.as_slice())
    }
}

static ENTRY_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"no_mangle|dllexport|wasm_bindgen|#\[get\(|#\[post\(|#\[route\(|@(Get|Post|Put|Delete|RequestMapping)Mapping|router\.(Get|Post|Put|Delete)|app\.(get|post|put|delete)\s*\(")
        .expect("entry-point marker regex is valid")
});

/// `name == "main"`, or one of the few preceding lines carries a marker
/// that makes a function externally invoked even though nothing in this
/// project calls it directly (spec.md §4.L entry-point heuristics).
fn is_entry_point(name: &str, preceding_lines: &[&str]) -> bool {
    if name == "main" {
        return true;
    }
    preceding_lines.iter().rev().take(3).any(|l| ENTRY_MARKERS.is_match(l))
}

/// Go exports by leading-uppercase convention; everything else exports by
/// not starting with `_` (spec.md §4.L).
fn is_exported_name(name: &str, language: crate::models::Language) -> bool {
    if language == crate::models::Language::Go {
        name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
    } else {
        !name.starts_with('_')
    }
}

/// Builds the project-wide reference graph from parsed files: one node per
/// function and class, `DirectCall` edges resolved by matching a callee
/// name against the `:name` suffix of a node id (same lossy cross-file
/// resolution `graph_analyzer::build_graph` uses), and `DynamicDispatch`
/// edges when a call's callee name is registered against more than one
/// class implementing a common parent/interface in the `VTableResolver`.
/// Also returns each function's source lines so `analyze` can run
/// `find_unreachable_blocks` per body.
pub fn build_reference_graph(parsed: &[(String, ParseResult)]) -> (Vec<ReferenceNode>, Vec<ReferenceEdge>, Vec<FunctionBody>) {
    let mut nodes = Vec::new();
    let mut bodies = Vec::new();
    let mut next_id = 0u32;
    let mut id_of: FxHashMap<String, u32> = FxHashMap::default();

    struct FileCtx<'a> {
        path: &'a str,
        parsed: &'a ParseResult,
        lines: Vec<&'a str>,
    }

    let texts: Vec<String> = parsed.iter().map(|(_, p)| String::from_utf8_lossy(&p.source).into_owned()).collect();
    let mut ctxs = Vec::with_capacity(parsed.len());
    for (i, (path, p)) in parsed.iter().enumerate() {
        ctxs.push(FileCtx { path, parsed: p, lines: texts[i].lines().collect() });
    }

    for ctx in &ctxs {
        for f in &ctx.parsed.functions {
            let id = next_id;
            next_id += 1;
            let full_id = format!("{}:{}", ctx.path, f.name);
            id_of.insert(full_id, id);

            let preceding_start = f.start_line.saturating_sub(4);
            let preceding: Vec<&str> = ctx.lines.get(preceding_start..f.start_line.saturating_sub(1).max(preceding_start)).unwrap_or(&[]).to_vec();
            let is_entry = is_entry_point(&f.name, &preceding);
            let is_exported = is_exported_name(&f.name, ctx.parsed.language);

            let start = f.start_line.saturating_sub(1).min(ctx.lines.len());
            let end = f.end_line.min(ctx.lines.len());
            let body_lines: Vec<String> = ctx.lines.get(start..end).unwrap_or(&[]).iter().map(|s| s.to_string()).collect();
            bodies.push(FunctionBody { file: ctx.path.to_string(), start_line: f.start_line, lines: body_lines });

            nodes.push(ReferenceNode {
                id,
                name: f.name.clone(),
                file: ctx.path.to_string(),
                start_line: f.start_line,
                kind: DefKind::Function,
                visibility: if is_exported { Visibility::Public } else { Visibility::Private },
                is_entry,
                is_exported,
                is_test_covered: false,
            });
        }
        for c in &ctx.parsed.classes {
            let id = next_id;
            next_id += 1;
            id_of.insert(format!("{}:{}", ctx.path, c.name), id);
            let is_exported = is_exported_name(&c.name, ctx.parsed.language);
            nodes.push(ReferenceNode {
                id,
                name: c.name.clone(),
                file: ctx.path.to_string(),
                start_line: c.start_line,
                kind: DefKind::Class,
                visibility: if is_exported { Visibility::Public } else { Visibility::Private },
                is_entry: false,
                is_exported,
                is_test_covered: false,
            });
        }
    }

    let function_ids: Vec<(&str, u32)> = id_of.iter().map(|(k, &v)| (k.as_str(), v)).collect();

    // vtable: register each class's methods against its declared parents.
    let mut vtable = VTableResolver::default();
    for ctx in &ctxs {
        for c in &ctx.parsed.classes {
            let parents: Vec<String> = c.parents_text.iter().flat_map(|p| p.split(',').map(|s| s.trim().to_string())).filter(|s| !s.is_empty()).collect();
            if parents.is_empty() {
                continue;
            }
            for f in ctx.parsed.functions.iter().filter(|f| f.start_line >= c.start_line && f.end_line <= c.end_line) {
                let Some(&target) = id_of.get(&format!("{}:{}", ctx.path, f.name)) else { continue };
                for interface in &parents {
                    vtable.register(interface, &f.name, target);
                }
            }
        }
    }

    let mut edges = Vec::new();
    for ctx in &ctxs {
        for f in &ctx.parsed.functions {
            let Some(&from_id) = id_of.get(&format!("{}:{}", ctx.path, f.name)) else { continue };
            for call in ctx.parsed.calls.iter().filter(|c| c.enclosing_function.as_deref() == Some(f.name.as_str())) {
                let ambiguous_targets: Vec<u32> = ctx
                    .parsed
                    .classes
                    .iter()
                    .flat_map(|c| c.parents_text.iter().flat_map(|p| p.split(',').map(|s| s.trim().to_string())))
                    .filter(|s| !s.is_empty())
                    .filter_map(|interface| vtable.resolve(&interface, &call.callee_name))
                    .flat_map(|targets| targets.iter().copied())
                    .collect::<HashSet<u32>>()
                    .into_iter()
                    .collect();

                if ambiguous_targets.len() > 1 {
                    let confidence = 1.0 / ambiguous_targets.len() as f64;
                    for to_id in ambiguous_targets {
                        edges.push(ReferenceEdge { from_id, to_id, edge_type: ReferenceType::DynamicDispatch, confidence });
                    }
                    continue;
                }

                let suffix = format!(":{}", call.callee_name);
                if let Some(&(_, to_id)) = function_ids.iter().find(|(id, _)| id.ends_with(&suffix)) {
                    edges.push(ReferenceEdge { from_id, to_id, edge_type: ReferenceType::DirectCall, confidence: 1.0 });
                }
            }
        }
        for c in &ctx.parsed.classes {
            let Some(&from_id) = id_of.get(&format!("{}:{}", ctx.path, c.name)) else { continue };
            for parent in c.parents_text.iter().flat_map(|p| p.split(',').map(|s| s.trim().to_string())).filter(|s| !s.is_empty()) {
                if let Some(&(_, to_id)) = function_ids.iter().find(|(id, _)| id.ends_with(&format!(":{parent}"))) {
                    edges.push(ReferenceEdge { from_id, to_id, edge_type: ReferenceType::Inherit, confidence: 1.0 });
                }
            }
        }
    }

    (nodes, edges, bodies)
}

pub struct DeadCodeAnalyzer {
    /// Definitions referenced anywhere in the project as a bare string
    /// literal (e.g. reflection lookups, route tables) — feeds the
    /// `-0.1` confidence adjustment.
    pub string_literal_references: HashSet<String>,
    pub confidence_threshold: f64,
}

impl DeadCodeAnalyzer {
    pub fn new(confidence_threshold: f64) -> Self {
        DeadCodeAnalyzer { string_literal_references: HashSet::new(), confidence_threshold }
    }

    /// `DynamicDispatch` edges never mark their target reached — an
    /// ambiguous virtual call isn't proof any one implementation runs —
    /// but every one of them unconditionally records the best confidence
    /// seen for its target, so `confidence()`'s discount applies to
    /// targets that stay in the dead candidate set. Populating
    /// `dispatch_confidence` only for edges that just flipped a node to
    /// reached would make that branch unreachable, since `confidence()`
    /// is only ever consulted for unreached nodes.
    fn reachability(nodes: &[ReferenceNode], edges: &[ReferenceEdge]) -> (HierarchicalBitSet, FxHashMap<u32, f64>) {
        let mut reached = HierarchicalBitSet::new();
        let mut dispatch_confidence: FxHashMap<u32, f64> = FxHashMap::default();
        let mut adjacency: FxHashMap<u32, Vec<&ReferenceEdge>> = FxHashMap::default();
        for e in edges {
            adjacency.entry(e.from_id).or_default().push(e);
            if e.edge_type == ReferenceType::DynamicDispatch {
                dispatch_confidence
                    .entry(e.to_id)
                    .and_modify(|c| {
                        if e.confidence > *c {
                            *c = e.confidence;
                        }
                    })
                    .or_insert(e.confidence);
            }
        }

        let mut queue: VecDeque<u32> = VecDeque::new();
        for n in nodes.iter().filter(|n| n.is_entry) {
            reached.set(n.id);
            queue.push_back(n.id);
        }

        while let Some(current) = queue.pop_front() {
            let Some(out_edges) = adjacency.get(&current) else { continue };
            for edge in out_edges {
                if edge.edge_type == ReferenceType::DynamicDispatch {
                    continue;
                }
                if !reached.is_set(edge.to_id) {
                    reached.set(edge.to_id);
                    queue.push_back(edge.to_id);
                }
            }
        }

        (reached, dispatch_confidence)
    }

    /// Base 0.9; -0.3 exported; -0.1 string-literal referenced; +0.05
    /// private; test-coverage adjustment; clamp to [0,1] (spec.md §4.L).
    fn confidence(&self, node: &ReferenceNode, dispatch_confidence: Option<f64>) -> f64 {
        let mut c = 0.9;
        if node.is_exported {
            c -= 0.3;
        }
        if self.string_literal_references.contains(&node.name) {
            c -= 0.1;
        }
        if matches!(node.visibility, crate::models::dead_code::Visibility::Private) {
            c += 0.05;
        }
        if node.is_test_covered {
            // Reached-but-covered-by-tests items are less confidently
            // dead: tests calling a symbol the call graph missed is the
            // single most common false positive in this style of
            // analysis.
            c -= 0.2;
        }
        if let Some(dc) = dispatch_confidence {
            c *= dc;
        }
        c.clamp(0.0, 1.0)
    }

    pub fn analyze(&self, nodes: Vec<ReferenceNode>, edges: Vec<ReferenceEdge>, bodies: &[FunctionBody]) -> DeadCodeReport {
        let (reached, dispatch_confidence) = Self::reachability(&nodes, &edges);
        let total_definitions = nodes.len();

        let mut dead_items: Vec<DeadCodeItem> = nodes
            .into_iter()
            .filter(|n| !reached.is_set(n.id))
            .map(|n| {
                let confidence = self.confidence(&n, dispatch_confidence.get(&n.id).copied());
                DeadCodeItem { bucket: ConfidenceBucket::from_confidence(confidence), confidence, node: n }
            })
            .filter(|item| item.confidence >= self.confidence_threshold)
            .collect();

        dead_items.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());

        let unreachable_blocks = bodies
            .iter()
            .flat_map(|b| {
                let lines: Vec<&str> = b.lines.iter().map(String::as_str).collect();
                find_unreachable_blocks(&b.file, &lines, b.start_line.saturating_sub(1))
            })
            .collect();

        DeadCodeReport { dead_items, unreachable_blocks, total_definitions }
    }
}

static TERMINATING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(return\b|panic\s*\(|raise\b|throw\b|break\b|continue\b)").expect("terminating-statement regex is valid")
});

/// Detects statements syntactically following a terminating statement
/// within one function body's source lines (spec.md §4.L).
pub fn find_unreachable_blocks(file: &str, body_lines: &[&str], start_line: usize) -> Vec<UnreachableBlock> {
    let mut blocks = Vec::new();
    let mut terminated_at: Option<usize> = None;
    let mut depth_at_termination = 0i32;
    let mut depth = 0i32;

    for (i, line) in body_lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(term_idx) = terminated_at {
            if depth <= depth_at_termination && (trimmed.starts_with('}') || trimmed.is_empty()) {
                terminated_at = None;
            } else {
                blocks.push(UnreachableBlock {
                    file: file.to_string(),
                    start_line: start_line + term_idx + 1,
                    end_line: start_line + i,
                    reason: "statement follows a terminating return/panic/raise/throw".to_string(),
                });
                terminated_at = None; // report once per unreachable run
            }
        }
        depth += line.matches('{').count() as i32 - line.matches('}').count() as i32;
        if TERMINATING.is_match(line) {
            terminated_at = Some(i);
            depth_at_termination = depth;
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dead_code::{DefKind, Visibility};

    fn node(id: u32, is_entry: bool) -> ReferenceNode {
        ReferenceNode {
            id,
            name: format!("fn{id}"),
            file: "a.rs".to_string(),
            start_line: 1,
            kind: DefKind::Function,
            visibility: Visibility::Public,
            is_entry,
            is_exported: false,
            is_test_covered: false,
        }
    }

    #[test]
    fn entry_points_are_always_reached() {
        let nodes = vec![node(0, true), node(1, false)];
        let edges = vec![ReferenceEdge { from_id: 0, to_id: 1, edge_type: ReferenceType::DirectCall, confidence: 1.0 }];
        let analyzer = DeadCodeAnalyzer::new(0.0);
        let report = analyzer.analyze(nodes, edges, &[]);
        assert!(report.dead_items.is_empty());
    }

    #[test]
    fn unreferenced_node_is_dead() {
        let nodes = vec![node(0, true), node(1, false), node(2, false)];
        let edges = vec![ReferenceEdge { from_id: 0, to_id: 1, edge_type: ReferenceType::DirectCall, confidence: 1.0 }];
        let analyzer = DeadCodeAnalyzer::new(0.0);
        let report = analyzer.analyze(nodes, edges, &[]);
        assert_eq!(report.dead_items.len(), 1);
        assert_eq!(report.dead_items[0].node.id, 2);
    }

    #[test]
    fn dynamic_dispatch_target_stays_dead_but_discounted() {
        // Node 1 is only reachable through an ambiguous DynamicDispatch
        // edge from the entry point; it must stay out of the reached set
        // (an ambiguous virtual call isn't proof this implementation
        // runs) while still getting the confidence discount.
        let nodes = vec![node(0, true), node(1, false)];
        let edges = vec![ReferenceEdge { from_id: 0, to_id: 1, edge_type: ReferenceType::DynamicDispatch, confidence: 0.5 }];
        let analyzer = DeadCodeAnalyzer::new(0.0);
        let report = analyzer.analyze(nodes, edges, &[]);
        assert_eq!(report.dead_items.len(), 1);
        // Base confidence 0.9 (public, not string-ref, not test-covered)
        // times the 0.5 dispatch discount.
        assert!((report.dead_items[0].confidence - 0.45).abs() < 1e-9);
    }

    #[test]
    fn build_reference_graph_resolves_direct_call_and_marks_main_entry() {
        use crate::services::parser::{CallView, FunctionView};

        let main_file = ParseResult {
            language: crate::models::Language::Rust,
            source: b"fn main() {\n    helper();\n}\n".to_vec(),
            functions: vec![FunctionView { name: "main".into(), start_line: 1, end_line: 3, body_handle: 0 }],
            classes: Vec::new(),
            identifiers: Vec::new(),
            calls: vec![CallView { callee_name: "helper".into(), line: 2, enclosing_function: Some("main".into()) }],
            imports: Vec::new(),
        };
        let lib_file = ParseResult {
            language: crate::models::Language::Rust,
            source: b"fn helper() {}\n".to_vec(),
            functions: vec![FunctionView { name: "helper".into(), start_line: 1, end_line: 1, body_handle: 0 }],
            classes: Vec::new(),
            identifiers: Vec::new(),
            calls: Vec::new(),
            imports: Vec::new(),
        };
        let (nodes, edges, bodies) = build_reference_graph(&[("main.rs".to_string(), main_file), ("lib.rs".to_string(), lib_file)]);
        assert_eq!(nodes.len(), 2);
        assert_eq!(bodies.len(), 2);
        let main_node = nodes.iter().find(|n| n.name == "main").unwrap();
        assert!(main_node.is_entry);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].edge_type, ReferenceType::DirectCall);
    }

    #[test]
    fn unreachable_block_detected_after_return() {
        let lines = vec!["fn f() {", "    return 1;", "    println!(\"dead\");", "}"];
        let blocks = find_unreachable_blocks("a.rs", &lines, 0);
        assert_eq!(blocks.len(), 1);
    }
}
