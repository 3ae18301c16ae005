//! # simnet
//!
//! Co-occurrence networks from a symmetric similarity matrix: threshold the
//! upper triangle into a graph, group the rows three ways (hierarchical cut,
//! k-means, Leiden communities), join the labels onto the graph, and draw it.
//!
//! ```text
//! matrix ─▶ graph ─▶ { hclust, kmeans, community } ─▶ annotated graph ─▶ SVG / HTML
//! ```
//!
//! The stages are plain functions over immutable values; see [`pipeline::run`]
//! for the whole chain. Randomized stages take explicit seeds.
//!
//! **Default build** enables the `parallel` feature (rayon) for the k-means
//! assignment step and the distance matrix.

/// Joining labels and display sizes onto the graph.
pub mod annotate;
pub mod cluster;
pub mod community;
/// Error types used across `simnet`.
pub mod error;
pub mod graph;
pub mod hierarchy;
pub mod label;
pub mod layout;
/// Similarity matrix loading.
pub mod matrix;
pub mod pipeline;
pub mod render;


pub use annotate::{AnnotatedGraph, DisplaySizes, Labeling, NodeRecord};
pub use error::{Error, Result};
pub use graph::{build_graph, simplify, GraphStats, SimilarityGraph};
pub use label::{Label, LabelField};
pub use layout::{ForceLayout, Layout};
pub use matrix::{Delimiter, SimilarityMatrix};
pub use pipeline::{run, write_outputs, OutputPaths, PipelineConfig, PipelineOutput};

pub use cluster::{Clustering, Cut, HierarchicalClustering, Kmeans, Linkage};
pub use community::{relabel_singletons, CommunityDetection, Leiden, Objective};
pub use hierarchy::Dendrogram;
pub use render::{InteractiveView, StaticPlot};
