//! Thresholded adjacency graphs built from a similarity matrix.
//!
//! ```text
//! M (n×n) → upper triangle → keep M[i][j] ≥ τ → simplify → G
//! ```
//!
//! Every matrix row becomes a node, whether or not it keeps an edge. Node `i`
//! of the graph is row `i` of the matrix, and carries the row's name.

use crate::error::{Error, Result};
use crate::matrix::SimilarityMatrix;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::BTreeMap;

/// Undirected weighted graph over matrix rows; node weight is the row name.
pub type SimilarityGraph = UnGraph<String, f64>;

/// Build the simplified adjacency graph of `matrix` at `threshold`.
///
/// Only entries above the diagonal are read. Entries below `threshold`,
/// undefined or infinite produce no edge.
pub fn build_graph(matrix: &SimilarityMatrix, threshold: f64) -> Result<SimilarityGraph> {
    if !threshold.is_finite() {
        return Err(Error::InvalidParameter {
            name: "threshold",
            message: "must be finite",
        });
    }

    let n = matrix.len();
    let mut graph = UnGraph::with_capacity(n, 0);
    for name in matrix.names() {
        let _ = graph.add_node(name.clone());
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let w = matrix.get(i, j);
            if w.is_finite() && w >= threshold {
                let _ = graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), w);
            }
        }
    }

    let graph = simplify(&graph);
    let stats = GraphStats::of(&graph);
    log::info!(
        "threshold {threshold}: {} nodes, {} edges, {} isolated",
        stats.nodes,
        stats.edges,
        stats.isolated
    );
    if stats.nodes > 0 && stats.isolated * 2 > stats.nodes {
        log::warn!("more than half of the nodes are isolated at threshold {threshold}");
    }
    Ok(graph)
}

/// Remove self-loops and collapse parallel edges.
///
/// Parallel edges are replaced by one edge carrying the largest weight. Nodes
/// keep their indices. Applying `simplify` twice gives the same graph as once.
pub fn simplify<N: Clone>(graph: &UnGraph<N, f64>) -> UnGraph<N, f64> {
    let mut kept: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for e in graph.edge_references() {
        let (s, t) = (e.source().index(), e.target().index());
        if s == t {
            continue;
        }
        let key = (s.min(t), s.max(t));
        let w = *e.weight();
        kept.entry(key)
            .and_modify(|cur| *cur = cur.max(w))
            .or_insert(w);
    }

    let mut out = UnGraph::with_capacity(graph.node_count(), kept.len());
    for idx in graph.node_indices() {
        let _ = out.add_node(graph[idx].clone());
    }
    for ((a, b), w) in kept {
        let _ = out.add_edge(NodeIndex::new(a), NodeIndex::new(b), w);
    }
    out
}

/// Edges as `(i, j, weight)` with `i < j`, in edge-index order.
pub fn edge_list<N>(graph: &UnGraph<N, f64>) -> Vec<(usize, usize, f64)> {
    graph
        .edge_references()
        .map(|e| {
            let (s, t) = (e.source().index(), e.target().index());
            (s.min(t), s.max(t), *e.weight())
        })
        .collect()
}

/// Summary counts of a graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphStats {
    /// Node count.
    pub nodes: usize,
    /// Edge count.
    pub edges: usize,
    /// Nodes with no incident edge.
    pub isolated: usize,
    /// `edges / (n choose 2)`; 0 for fewer than two nodes.
    pub density: f64,
}

impl GraphStats {
    /// Compute the stats of `graph`.
    pub fn of<N, E>(graph: &UnGraph<N, E>) -> Self {
        let nodes = graph.node_count();
        let edges = graph.edge_count();
        let isolated = graph
            .node_indices()
            .filter(|&i| graph.neighbors(i).next().is_none())
            .count();
        let pairs = nodes * nodes.saturating_sub(1) / 2;
        let density = if pairs == 0 {
            0.0
        } else {
            edges as f64 / pairs as f64
        };
        Self {
            nodes,
            edges,
            isolated,
            density,
        }
    }
}
