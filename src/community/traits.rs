//! Community detection traits.

use crate::error::Result;
use petgraph::graph::UnGraph;

/// Edge payloads that can be read as a non-negative weight.
pub trait EdgeWeight {
    /// The edge's weight.
    fn weight(&self) -> f64;
}

impl EdgeWeight for f64 {
    fn weight(&self) -> f64 {
        *self
    }
}

impl EdgeWeight for f32 {
    fn weight(&self) -> f64 {
        *self as f64
    }
}

/// Unweighted edges count as 1.
impl EdgeWeight for () {
    fn weight(&self) -> f64 {
        1.0
    }
}

/// Trait for community detection algorithms.
pub trait CommunityDetection {
    /// Detect communities in a graph.
    ///
    /// Returns a mapping from node index to community ID.
    fn detect<N, E: EdgeWeight>(&self, graph: &UnGraph<N, E>) -> Result<Vec<usize>>;

    /// Get the resolution parameter (if applicable).
    fn resolution(&self) -> f64 {
        1.0
    }
}
