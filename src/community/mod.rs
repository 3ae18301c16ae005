//! Community detection algorithms for graphs.
//!
//! Given a graph, find natural groupings where nodes within groups are
//! densely connected, and connections between groups are sparse.
//!
//! ## The Modularity Objective
//!
//! ```text
//! Q = (1/2m) × Σ[A_ij - γ(k_i × k_j)/(2m)] × δ(c_i, c_j)
//! ```
//!
//! Where:
//! - m = total edge weight (sum of all edges)
//! - A_ij = edge weight between i and j
//! - k_i = weighted degree of node i
//! - γ = resolution parameter
//! - δ(c_i, c_j) = 1 if i and j are in same community
//!
//! ## The Resolution Parameter γ
//!
//! - **γ = 1**: Standard modularity (default)
//! - **γ > 1**: Smaller communities (higher penalty for merging)
//! - **γ < 1**: Larger communities (lower penalty for merging)
//!
//! ## Usage
//!
//! ```rust
//! use petgraph::graph::UnGraph;
//! use simnet::community::{relabel_singletons, CommunityDetection, Leiden};
//! use simnet::Label;
//!
//! let mut graph = UnGraph::<(), f64>::new_undirected();
//! let a = graph.add_node(());
//! let b = graph.add_node(());
//! let _c = graph.add_node(());
//! graph.add_edge(a, b, 0.8);
//!
//! let communities = Leiden::new().with_resolution(0.5).detect(&graph).unwrap();
//! let labels = relabel_singletons(&communities);
//! assert_eq!(labels[2], Label::Unassigned);
//! ```
//!
//! ## References
//!
//! - Traag, Waltman, van Eck (2019). "From Louvain to Leiden: guaranteeing
//!   well-connected communities." Scientific Reports 9, 5233.
//! - Newman & Girvan (2004). "Finding and evaluating community structure in networks."

mod leiden;
mod quality;
mod relabel;
mod traits;

pub use leiden::{Leiden, Objective};
pub use quality::modularity;
pub use relabel::{community_sizes, relabel_singletons};
pub use traits::{CommunityDetection, EdgeWeight};
