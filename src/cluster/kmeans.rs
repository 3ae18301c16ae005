//! K-means clustering.
//!
//! Partitions data into k clusters by minimizing **within-cluster sum of squares**
//! (WCSS).
//!
//! # The Objective
//!
//! ```text
//! WCSS = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids via k-means++
//! 2. **Assign**: Each point → nearest centroid
//! 3. **Update**: Each centroid → mean of assigned points
//! 4. Repeat until the centroids stop moving
//!
//! Lloyd only finds a local minimum, so the fit is restarted `n_init` times
//! and the restart with the lowest WCSS is kept. Restart `r` draws from
//! `StdRng::seed_from_u64(seed + r)`, so a pinned seed pins the whole fit.
//!
//! # Choosing k
//!
//! k is an input. [`Kmeans::elbow_curve`] tabulates WCSS against k so that a
//! person can look for the bend; nothing here picks k automatically.

use super::traits::Clustering;
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1};
use rand::prelude::*;
use rand::rngs::StdRng;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Number of restarts.
    n_init: usize,
    /// Maximum iterations per restart.
    max_iter: usize,
    /// Convergence tolerance on total squared centroid shift.
    tol: f64,
    /// Random seed.
    seed: Option<u64>,
}

/// Result of a k-means fit.
#[derive(Debug, Clone)]
pub struct KmeansFit {
    /// Cluster index in `[0, k)` per point.
    pub labels: Vec<usize>,
    /// `k × d` centroid matrix.
    pub centroids: Array2<f32>,
    /// Within-cluster sum of squares of the kept restart.
    pub inertia: f64,
    /// Lloyd iterations used by the kept restart.
    pub n_iter: usize,
}

impl Kmeans {
    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            n_init: 1,
            max_iter: 100,
            tol: 1e-4,
            seed: None,
        }
    }

    /// Set the number of restarts (at least 1).
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init.max(1);
        self
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fit and return labels, centroids and WCSS of the best restart.
    pub fn fit(&self, data: &[Vec<f32>]) -> Result<KmeansFit> {
        let data_arr = to_array(data)?;
        let n = data_arr.nrows();

        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }

        let base_seed = match self.seed {
            Some(s) => s,
            None => rand::rng().random::<u64>(),
        };

        let mut best: Option<KmeansFit> = None;
        for run in 0..self.n_init {
            let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(run as u64));
            let fit = self.run_once(&data_arr, &mut rng);
            log::debug!(
                "kmeans k={} restart {run}: wcss={:.6} after {} iterations",
                self.k,
                fit.inertia,
                fit.n_iter
            );
            if best.as_ref().map_or(true, |b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        best.ok_or(Error::EmptyInput)
    }

    /// WCSS for every k in `1..=max_k` (capped at the number of points).
    ///
    /// Each k uses this clusterer's restarts, iterations and seed.
    pub fn elbow_curve(&self, data: &[Vec<f32>], max_k: usize) -> Result<Vec<(usize, f64)>> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }
        let upper = max_k.min(data.len());
        (1..=upper)
            .map(|k| {
                let mut km = self.clone();
                km.k = k;
                km.fit(data).map(|fit| (k, fit.inertia))
            })
            .collect()
    }

    /// One Lloyd run from a k-means++ start.
    fn run_once(&self, data: &Array2<f32>, rng: &mut StdRng) -> KmeansFit {
        let n = data.nrows();
        let d = data.ncols();
        let mut centroids = self.init_centroids(data, rng);
        let mut labels = vec![0usize; n];
        let mut n_iter = 0;

        for _iter in 0..self.max_iter {
            n_iter += 1;
            let _ = self.assign(data, &centroids, &mut labels);

            // Update step
            let mut new_centroids = Array2::zeros((self.k, d));
            let mut counts = vec![0usize; self.k];

            for (i, &k) in labels.iter().enumerate() {
                for j in 0..d {
                    new_centroids[[k, j]] += data[[i, j]];
                }
                counts[k] += 1;
            }

            for (k, &count) in counts.iter().enumerate() {
                if count > 0 {
                    for j in 0..d {
                        new_centroids[[k, j]] /= count as f32;
                    }
                } else {
                    // Empty cluster: reinitialize randomly
                    let idx = rng.random_range(0..n);
                    new_centroids.row_mut(k).assign(&data.row(idx));
                }
            }

            let shift: f32 = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();

            centroids = new_centroids;

            if shift < self.tol as f32 {
                break;
            }
        }

        // Final assignment so labels and WCSS match the returned centroids.
        let inertia = self.assign(data, &centroids, &mut labels);

        KmeansFit {
            labels,
            centroids,
            inertia,
            n_iter,
        }
    }

    /// Assign every point to its nearest centroid; returns the WCSS.
    fn assign(&self, data: &Array2<f32>, centroids: &Array2<f32>, labels: &mut [usize]) -> f64 {
        #[cfg(feature = "parallel")]
        let dists: Vec<f32> = labels
            .par_iter_mut()
            .enumerate()
            .map(|(i, label)| {
                let (best, dist) = self.nearest(&data.row(i), centroids);
                *label = best;
                dist
            })
            .collect();

        #[cfg(not(feature = "parallel"))]
        let dists: Vec<f32> = labels
            .iter_mut()
            .enumerate()
            .map(|(i, label)| {
                let (best, dist) = self.nearest(&data.row(i), centroids);
                *label = best;
                dist
            })
            .collect();

        dists.iter().map(|&d| d as f64).sum()
    }

    fn nearest(&self, point: &ArrayView1<'_, f32>, centroids: &Array2<f32>) -> (usize, f32) {
        let mut best_cluster = 0;
        let mut best_dist = f32::MAX;
        for k in 0..self.k {
            let dist = squared_distance(point, &centroids.row(k));
            if dist < best_dist {
                best_dist = dist;
                best_cluster = k;
            }
        }
        (best_cluster, best_dist)
    }

    /// Initialize centroids using k-means++ algorithm.
    fn init_centroids(&self, data: &Array2<f32>, rng: &mut impl Rng) -> Array2<f32> {
        let n = data.nrows();
        let d = data.ncols();
        let mut centroids = Array2::zeros((self.k, d));

        // First centroid: random point
        let first = rng.random_range(0..n);
        centroids.row_mut(0).assign(&data.row(first));

        // Remaining centroids: k-means++ selection
        for i in 1..self.k {
            let distances: Vec<f32> = (0..n)
                .map(|j| {
                    let point = data.row(j);
                    (0..i)
                        .map(|c| squared_distance(&point, &centroids.row(c)))
                        .fold(f32::MAX, f32::min)
                })
                .collect();

            // Sample proportional to squared distance
            let total: f32 = distances.iter().sum();
            if total == 0.0 {
                let idx = rng.random_range(0..n);
                centroids.row_mut(i).assign(&data.row(idx));
                continue;
            }

            let threshold = rng.random::<f32>() * total;
            let mut cumsum = 0.0;
            let mut selected = n - 1;

            for (j, &d) in distances.iter().enumerate() {
                cumsum += d;
                if cumsum >= threshold {
                    selected = j;
                    break;
                }
            }

            centroids.row_mut(i).assign(&data.row(selected));
        }

        centroids
    }
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>> {
        self.fit(data).map(|fit| fit.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

/// Squared Euclidean distance.
fn squared_distance(a: &ArrayView1<'_, f32>, b: &ArrayView1<'_, f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Validate row lengths and convert to ndarray.
pub(crate) fn to_array(data: &[Vec<f32>]) -> Result<Array2<f32>> {
    if data.is_empty() {
        return Err(Error::EmptyInput);
    }
    let n = data.len();
    let d = data[0].len();

    let mut flat: Vec<f32> = Vec::with_capacity(n * d);
    for point in data {
        if point.len() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: point.len(),
            });
        }
        flat.extend(point);
    }
    Array2::from_shape_vec((n, d), flat).map_err(|e| Error::Other(e.to_string()))
}
