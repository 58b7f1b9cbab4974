//! Graph analyzer (component J): dependency graph build, PageRank,
//! Tarjan SCC, betweenness, spec.md §4.J.
//!
//! No direct upstream file grounds this component as a whole. `petgraph`
//! is already used elsewhere in this dependency stack for call-graph
//! work, so its `tarjan_scc` is reused directly for cycle detection;
//! PageRank and betweenness are hand-rolled to match spec.md's exact
//! iteration counts and normalization rather than using a generic graph
//! library's defaults, which would not guarantee the same numbers.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::models::graph::{DependencyGraph, EdgeKind, GraphEdge, GraphMetrics, GraphNode, NodeKind};
use crate::services::parser::ParseResult;

/// Builds a project-wide `DependencyGraph` from parsed files: one `File`
/// node per file, one `Function` node per function (id `path:name`),
/// `Import` edges between files whose path matches an import's resolved
/// path exactly, and `Call` edges resolved lossily by matching a callee
/// name against the `:name` suffix of a function id — the same imprecise
/// cross-file resolution the dead-code analyzer uses, since neither module
/// tracks a real symbol table (spec.md §9 Open Question).
pub fn build_graph(parsed: &[(String, ParseResult)]) -> DependencyGraph {
    let mut nodes = Vec::new();
    let mut known_files: HashSet<&str> = HashSet::new();
    for (path, _) in parsed {
        known_files.insert(path.as_str());
    }

    for (path, p) in parsed {
        nodes.push(GraphNode { id: path.clone(), name: path.clone(), kind: NodeKind::File, file: path.clone(), line: 0 });
        for f in &p.functions {
            nodes.push(GraphNode {
                id: format!("{path}:{}", f.name),
                name: f.name.clone(),
                kind: NodeKind::Function,
                file: path.clone(),
                line: f.start_line,
            });
        }
    }

    let function_ids: Vec<&str> = nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Function)
        .map(|n| n.id.as_str())
        .collect();

    let mut edges = Vec::new();
    for (path, p) in parsed {
        for imp in &p.imports {
            if known_files.contains(imp.resolved_path.as_str()) {
                edges.push(GraphEdge { from: path.clone(), to: imp.resolved_path.clone(), kind: EdgeKind::Import });
            }
        }
        for f in &p.functions {
            let caller_id = format!("{path}:{}", f.name);
            for call in p.calls.iter().filter(|c| c.enclosing_function.as_deref() == Some(f.name.as_str())) {
                let suffix = format!(":{}", call.callee_name);
                if let Some(&target) = function_ids.iter().find(|id| id.ends_with(&suffix)) {
                    edges.push(GraphEdge { from: caller_id.clone(), to: target.to_string(), kind: EdgeKind::Call });
                }
            }
        }
    }

    DependencyGraph { nodes, edges }
}

pub struct GraphAnalyzer {
    graph: DiGraph<String, ()>,
    index_of: HashMap<String, NodeIndex>,
}

impl GraphAnalyzer {
    /// Builds the working graph, resolving edges by exact node id match.
    /// Name-based resolution (substring match of `file:name` against
    /// import text) happens upstream when edges are first discovered;
    /// this analyzer operates on an already-resolved `DependencyGraph`
    /// (spec.md §9 Open Question: the lossy substring resolver is
    /// preserved as-is at the point edges are constructed, not here).
    pub fn new(dep_graph: &DependencyGraph) -> Self {
        let mut graph = DiGraph::new();
        let mut index_of = HashMap::new();
        for node in &dep_graph.nodes {
            let idx = graph.add_node(node.id.clone());
            index_of.insert(node.id.clone(), idx);
        }
        for edge in &dep_graph.edges {
            if let (Some(&from), Some(&to)) = (index_of.get(&edge.from), index_of.get(&edge.to)) {
                graph.add_edge(from, to, ());
            }
        }
        GraphAnalyzer { graph, index_of }
    }

    /// 20 iterations, damping 0.85, dangling-node redistribution over all
    /// nodes (spec.md §4.J).
    pub fn pagerank(&self) -> HashMap<String, f64> {
        let n = self.graph.node_count();
        if n == 0 {
            return HashMap::new();
        }
        let damping = 0.85;
        let mut rank = vec![1.0 / n as f64; n];

        let out_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|idx| self.graph.neighbors(idx).count())
            .collect();

        let incoming: Vec<Vec<usize>> = self
            .graph
            .node_indices()
            .map(|idx| {
                self.graph
                    .neighbors_directed(idx, petgraph::Direction::Incoming)
                    .map(|n| n.index())
                    .collect()
            })
            .collect();

        for _ in 0..20 {
            let dangling_mass: f64 = (0..n).filter(|&i| out_degree[i] == 0).map(|i| rank[i]).sum();
            let base = (1.0 - damping) / n as f64 + damping * dangling_mass / n as f64;
            let mut next = vec![base; n];
            for i in 0..n {
                for &src in &incoming[i] {
                    if out_degree[src] > 0 {
                        next[i] += damping * rank[src] / out_degree[src] as f64;
                    }
                }
            }
            rank = next;
        }

        self.index_of
            .iter()
            .map(|(id, &idx)| (id.clone(), rank[idx.index()]))
            .collect()
    }

    /// BFS-based betweenness centrality, normalized by `(n-1)(n-2)`.
    pub fn betweenness(&self) -> HashMap<String, f64> {
        let n = self.graph.node_count();
        let mut scores = vec![0.0f64; n];
        if n < 3 {
            return self.index_of.iter().map(|(id, &idx)| (id.clone(), scores[idx.index()])).collect();
        }

        for s in self.graph.node_indices() {
            // BFS shortest-path counting (unweighted Brandes-lite: count
            // shortest paths through each intermediate node).
            let mut dist = vec![-1i64; n];
            let mut sigma = vec![0f64; n];
            let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
            dist[s.index()] = 0;
            sigma[s.index()] = 1.0;
            let mut order = Vec::new();
            let mut queue = VecDeque::new();
            queue.push_back(s);
            while let Some(v) = queue.pop_front() {
                order.push(v);
                for w in self.graph.neighbors(v) {
                    if dist[w.index()] < 0 {
                        dist[w.index()] = dist[v.index()] + 1;
                        queue.push_back(w);
                    }
                    if dist[w.index()] == dist[v.index()] + 1 {
                        sigma[w.index()] += sigma[v.index()];
                        preds[w.index()].push(v.index());
                    }
                }
            }
            let mut delta = vec![0f64; n];
            for &w in order.iter().rev() {
                for &v in &preds[w.index()] {
                    if sigma[w.index()] > 0.0 {
                        delta[v] += (sigma[v] / sigma[w.index()]) * (1.0 + delta[w.index()]);
                    }
                }
                if w != s {
                    scores[w.index()] += delta[w.index()];
                }
            }
        }

        let norm = ((n - 1) * (n - 2)) as f64;
        self.index_of
            .iter()
            .map(|(id, &idx)| (id.clone(), if norm > 0.0 { scores[idx.index()] / norm } else { 0.0 }))
            .collect()
    }

    /// Tarjan SCCs of size > 1, reported as cycles.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| scc.iter().map(|&idx| self.graph[idx].clone()).collect())
            .collect()
    }

    pub fn metrics(&self) -> GraphMetrics {
        GraphMetrics {
            pagerank: self.pagerank(),
            betweenness: self.betweenness(),
            cycles: self.cycles(),
        }
    }

    /// Keeps the top-`max_nodes` nodes by PageRank, then edges between
    /// kept nodes up to `max_edges` (spec.md §4.J prune operation).
    pub fn prune(&self, dep_graph: &DependencyGraph, max_nodes: usize, max_edges: usize) -> DependencyGraph {
        let pr = self.pagerank();
        let mut ranked: Vec<&String> = pr.keys().collect();
        ranked.sort_by(|a, b| pr[*b].partial_cmp(&pr[*a]).unwrap());
        let keep: std::collections::HashSet<&String> = ranked.into_iter().take(max_nodes).collect();

        let nodes = dep_graph.nodes.iter().filter(|n| keep.contains(&n.id)).cloned().collect();
        let edges = dep_graph
            .edges
            .iter()
            .filter(|e| keep.contains(&e.from) && keep.contains(&e.to))
            .take(max_edges)
            .cloned()
            .collect();
        DependencyGraph { nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::graph::{EdgeKind, GraphEdge, GraphNode, NodeKind};

    fn node(id: &str) -> GraphNode {
        GraphNode { id: id.to_string(), name: id.to_string(), kind: NodeKind::Module, file: String::new(), line: 0 }
    }
    fn edge(from: &str, to: &str) -> GraphEdge {
        GraphEdge { from: from.to_string(), to: to.to_string(), kind: EdgeKind::Call }
    }

    #[test]
    fn detects_a_three_cycle() {
        let dg = DependencyGraph {
            nodes: vec![node("A"), node("B"), node("C")],
            edges: vec![edge("A", "B"), edge("B", "C"), edge("C", "A")],
        };
        let analyzer = GraphAnalyzer::new(&dg);
        let cycles = analyzer.cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 3);
    }

    #[test]
    fn build_graph_resolves_cross_file_calls_by_name_suffix() {
        use crate::services::parser::{CallView, FunctionView};

        let caller = ParseResult {
            language: crate::models::Language::Rust,
            source: Vec::new(),
            functions: vec![FunctionView { name: "run".into(), start_line: 1, end_line: 3, body_handle: 0 }],
            classes: Vec::new(),
            identifiers: Vec::new(),
            calls: vec![CallView { callee_name: "helper".into(), line: 2, enclosing_function: Some("run".into()) }],
            imports: Vec::new(),
        };
        let callee = ParseResult {
            language: crate::models::Language::Rust,
            source: Vec::new(),
            functions: vec![FunctionView { name: "helper".into(), start_line: 1, end_line: 2, body_handle: 0 }],
            classes: Vec::new(),
            identifiers: Vec::new(),
            calls: Vec::new(),
            imports: Vec::new(),
        };
        let dg = build_graph(&[("a.rs".to_string(), caller), ("b.rs".to_string(), callee)]);
        let call_edges: Vec<_> = dg.edges.iter().filter(|e| e.kind == EdgeKind::Call).collect();
        assert_eq!(call_edges.len(), 1);
        assert_eq!(call_edges[0].from, "a.rs:run");
        assert_eq!(call_edges[0].to, "b.rs:helper");
    }

    #[test]
    fn pagerank_sums_to_roughly_one() {
        let dg = DependencyGraph {
            nodes: vec![node("A"), node("B")],
            edges: vec![edge("A", "B"), edge("B", "A")],
        };
        let analyzer = GraphAnalyzer::new(&dg);
        let pr = analyzer.pagerank();
        let total: f64 = pr.values().sum();
        assert!((total - 1.0).abs() < 0.05);
    }
}
