//! Hierarchical (agglomerative) clustering.
//!
//! Bottom-up clustering that builds a **dendrogram** by iteratively
//! merging the closest clusters. Unlike K-means you don't need to
//! specify k in advance; cut the tree at a height instead.
//!
//! # Linkage Methods
//!
//! The key choice: how do we define "distance between clusters"?
//!
//! | Linkage | Formula | Effect |
//! |---------|---------|--------|
//! | Single | min(d(a,b)) for a∈A, b∈B | Chaining; elongated clusters |
//! | Complete | max(d(a,b)) | Compact, spherical clusters |
//! | Average | mean(d(a,b)) | Balanced compromise |
//! | Ward | Δ variance | Minimizes within-cluster variance |
//!
//! Complete linkage over Euclidean distance is the default.
//!
//! # Cutting
//!
//! [`Cut::Height`] keeps merges at or below a height, so the number of
//! clusters follows from the tree. [`Cut::Clusters`] asks for exactly k.

use super::traits::Clustering;
use crate::error::{Error, Result};
use crate::hierarchy::Dendrogram;
use kodama::{linkage as kodama_linkage, Method as KodamaMethod};
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Linkage method for hierarchical clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Single linkage: minimum distance between clusters.
    Single,
    /// Complete linkage: maximum distance between clusters.
    #[default]
    Complete,
    /// Average linkage: mean distance between clusters.
    Average,
    /// Ward's method: minimize within-cluster variance.
    Ward,
}

/// Where to cut the dendrogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cut {
    /// Cut every merge above this height.
    Height(f64),
    /// Stop merging at this many clusters.
    Clusters(usize),
}

/// Hierarchical (agglomerative) clustering.
#[derive(Debug, Clone)]
pub struct HierarchicalClustering {
    /// Flat cut applied by `fit_predict`.
    cut: Cut,
    /// Linkage method.
    linkage: Linkage,
}

impl HierarchicalClustering {
    /// Clusterer that cuts the tree at height `h`.
    pub fn at_height(h: f64) -> Self {
        Self {
            cut: Cut::Height(h),
            linkage: Linkage::default(),
        }
    }

    /// Clusterer that cuts the tree into `n_clusters` groups.
    pub fn new(n_clusters: usize) -> Self {
        Self {
            cut: Cut::Clusters(n_clusters),
            linkage: Linkage::default(),
        }
    }

    /// Set linkage method.
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Fit and return the full dendrogram.
    pub fn fit_dendrogram(&self, data: &[Vec<f32>]) -> Result<Dendrogram> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }

        let n = data.len();
        let d = data[0].len();
        if let Some((_, p)) = data.iter().enumerate().find(|(_, p)| p.len() != d) {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: p.len(),
            });
        }

        if n == 1 {
            return Ok(Dendrogram::new(1));
        }

        let mut condensed = condensed_distances(data);

        let method = match self.linkage {
            Linkage::Single => KodamaMethod::Single,
            Linkage::Complete => KodamaMethod::Complete,
            Linkage::Average => KodamaMethod::Average,
            Linkage::Ward => KodamaMethod::Ward,
        };

        // kodama's dendrogram uses SciPy/MATLAB-style cluster labels:
        // - leaves: 0..n-1
        // - each merge i creates cluster id n+i
        let dend = kodama_linkage(&mut condensed, n, method);

        let mut dendro = Dendrogram::new(n);
        for step in dend.steps() {
            dendro.add_merge(step.cluster1, step.cluster2, step.dissimilarity, step.size);
        }

        log::debug!(
            "{:?} linkage over {n} items, root height {:.4}",
            self.linkage,
            dendro.distances().last().copied().unwrap_or(0.0)
        );
        Ok(dendro)
    }
}

/// Apply a cut to a fitted dendrogram.
pub fn cut_dendrogram(dendro: &Dendrogram, cut: Cut) -> Result<Vec<usize>> {
    match cut {
        Cut::Height(h) if h.is_nan() => Err(Error::InvalidParameter {
            name: "cut_height",
            message: "must not be NaN",
        }),
        Cut::Height(h) => Ok(dendro.cut_at_height(h)),
        Cut::Clusters(k) => dendro.cut_to_k(k),
    }
}

/// Upper-triangle Euclidean distances, row-major, length n·(n-1)/2.
fn condensed_distances(data: &[Vec<f32>]) -> Vec<f64> {
    let n = data.len();

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<f64>> = (0..n - 1)
        .into_par_iter()
        .map(|row| {
            ((row + 1)..n)
                .map(|col| euclidean_distance_f64(&data[row], &data[col]))
                .collect()
        })
        .collect();

    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<f64>> = (0..n - 1)
        .map(|row| {
            ((row + 1)..n)
                .map(|col| euclidean_distance_f64(&data[row], &data[col]))
                .collect()
        })
        .collect();

    rows.into_iter().flatten().collect()
}

/// Euclidean distance between two points.
#[inline]
fn euclidean_distance_f64(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let dx = *x as f64 - *y as f64;
            dx * dx
        })
        .sum::<f64>()
        .sqrt()
}

impl Clustering for HierarchicalClustering {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>> {
        let dendro = self.fit_dendrogram(data)?;
        cut_dendrogram(&dendro, self.cut)
    }

    fn n_clusters(&self) -> usize {
        match self.cut {
            Cut::Clusters(k) => k,
            // Determined by the tree
            Cut::Height(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchical_basic() {
        let data = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
        ];

        let labels = HierarchicalClustering::new(2).fit_predict(&data).unwrap();

        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn test_dendrogram() {
        let data = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![10.0, 0.0]];

        let dendro = HierarchicalClustering::new(2).fit_dendrogram(&data).unwrap();

        assert_eq!(dendro.n_items(), 3);
        assert_eq!(dendro.n_merges(), 2);
        // Complete linkage: {0,1} at 1, then {0,1} ∪ {2} at max(10, 9) = 10.
        let heights = dendro.distances();
        assert!((heights[0] - 1.0).abs() < 1e-9);
        assert!((heights[1] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_cut_height_controls_cluster_count() {
        let data = vec![
            vec![0.0],
            vec![1.0],
            vec![5.0],
            vec![6.0],
            vec![20.0],
        ];
        let low = HierarchicalClustering::at_height(0.5).fit_predict(&data).unwrap();
        let mid = HierarchicalClustering::at_height(2.0).fit_predict(&data).unwrap();
        let high = HierarchicalClustering::at_height(100.0).fit_predict(&data).unwrap();

        assert_eq!(low, vec![0, 1, 2, 3, 4]);
        assert_eq!(mid, vec![0, 0, 1, 1, 2]);
        assert_eq!(high, vec![0; 5]);
    }

    #[test]
    fn test_single_item() {
        let labels = HierarchicalClustering::at_height(7.0)
            .fit_predict(&[vec![1.0, 2.0]])
            .unwrap();
        assert_eq!(labels, vec![0]);
    }

    #[test]
    fn test_linkages_agree_on_obvious_structure() {
        let data = vec![
            vec![0.0, 0.0],
            vec![0.2, 0.0],
            vec![8.0, 8.0],
            vec![8.2, 8.0],
        ];
        for linkage in [Linkage::Single, Linkage::Complete, Linkage::Average, Linkage::Ward] {
            let labels = HierarchicalClustering::new(2)
                .with_linkage(linkage)
                .fit_predict(&data)
                .unwrap();
            assert_eq!(labels, vec![0, 0, 1, 1], "{linkage:?}");
        }
    }

    #[test]
    fn test_ragged_rejected() {
        let err = HierarchicalClustering::at_height(1.0)
            .fit_predict(&[vec![0.0, 0.0], vec![1.0]])
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }
}
