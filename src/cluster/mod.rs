//! Clustering of feature rows.
//!
//! Both clusterers take the rows of the similarity matrix as feature vectors
//! (row `i` describes item `i` by its similarity to every other item) and
//! return one 0-based label per row.
//!
//! ### K-means
//!
//! Assign each point to the nearest centroid, then update centroids to the
//! mean of their points. Repeat. Minimizes within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! k is fixed in advance.
//!
//! ### Hierarchical (Agglomerative) Clustering
//!
//! Bottom-up: start with each point as its own cluster, repeatedly merge
//! the two closest clusters until one remains. The merge history forms a
//! **dendrogram**, a binary tree you can cut at any height.
//!
//! ## Usage
//!
//! ```rust
//! use simnet::cluster::{Clustering, HierarchicalClustering, Kmeans};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ];
//!
//! let labels = Kmeans::new(2).with_seed(42).fit_predict(&data).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[2]);
//!
//! let labels = HierarchicalClustering::at_height(1.0).fit_predict(&data).unwrap();
//! assert_eq!(labels, vec![0, 0, 1, 1]);
//!
//! // Presented labels are 1-based
//! let labels = HierarchicalClustering::at_height(1.0).fit_labels(&data).unwrap();
//! assert_eq!(labels[3], simnet::Label::Cluster(2));
//! ```

mod hierarchical;
mod kmeans;
mod traits;

pub use hierarchical::{cut_dendrogram, Cut, HierarchicalClustering, Linkage};
pub use kmeans::{Kmeans, KmeansFit};
pub use traits::Clustering;
