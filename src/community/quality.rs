//! Partition quality.

use super::traits::EdgeWeight;
use crate::error::{Error, Result};
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;

/// Weighted modularity of `partition` at resolution `gamma`:
///
/// ```text
/// Q = Σ_c [ L_c / m - γ (d_c / 2m)² ]
/// ```
///
/// `L_c` is the edge weight inside community `c` and `d_c` its degree sum.
/// A graph without edge weight has `Q = 0`.
pub fn modularity<N, E: EdgeWeight>(
    graph: &UnGraph<N, E>,
    partition: &[usize],
    gamma: f64,
) -> Result<f64> {
    if partition.len() != graph.node_count() {
        return Err(Error::DimensionMismatch {
            expected: graph.node_count(),
            found: partition.len(),
        });
    }
    let n_comms = partition.iter().copied().max().map_or(0, |c| c + 1);
    let mut internal = vec![0.0; n_comms];
    let mut degree = vec![0.0; n_comms];
    let mut m = 0.0;

    for e in graph.edge_references() {
        let w = e.weight().weight();
        let (ci, cj) = (partition[e.source().index()], partition[e.target().index()]);
        degree[ci] += w;
        degree[cj] += w;
        if ci == cj {
            internal[ci] += w;
        }
        m += w;
    }

    if m == 0.0 {
        return Ok(0.0);
    }

    Ok(internal
        .iter()
        .zip(&degree)
        .map(|(l, d)| l / m - gamma * (d / (2.0 * m)).powi(2))
        .sum())
}
