//! Dendrogram produced by agglomerative clustering.
//!
//! A dendrogram represents the nested structure of clusters produced
//! by agglomerative (bottom-up) clustering. Cluster ids follow the SciPy
//! convention: leaves are `0..n`, and merge `i` creates cluster `n + i`.
//!
//! Cutting at a height `h` keeps every merge at or below `h` and discards the
//! rest; the surviving connected groups are the flat clusters. Labels are
//! numbered in order of first appearance over the items, so `cut_at_height`
//! returns the same vector every time it is called with the same `h`.

use crate::error::{Error, Result};

/// A dendrogram representing hierarchical cluster merges.
///
/// Each merge combines two clusters into one, recording:
/// - Which clusters were merged
/// - The height at which they merged
/// - The size of the resulting cluster
#[derive(Debug, Clone)]
pub struct Dendrogram {
    /// Merge history in creation order.
    merges: Vec<Merge>,
    /// Number of original items.
    n_items: usize,
}

/// A single merge operation in the dendrogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    /// First cluster being merged (index).
    pub cluster_a: usize,
    /// Second cluster being merged (index).
    pub cluster_b: usize,
    /// Dissimilarity at which the merge occurred.
    pub distance: f64,
    /// Size of resulting cluster.
    pub size: usize,
}

impl Dendrogram {
    /// Create a new dendrogram for n items.
    pub fn new(n_items: usize) -> Self {
        Self {
            merges: Vec::with_capacity(n_items.saturating_sub(1)),
            n_items,
        }
    }

    /// Record a merge operation.
    pub fn add_merge(&mut self, cluster_a: usize, cluster_b: usize, distance: f64, size: usize) {
        self.merges.push(Merge {
            cluster_a,
            cluster_b,
            distance,
            size,
        });
    }

    /// Flat cluster labels at height `h`.
    ///
    /// Merges with `distance > h` are cut. Merge heights are expected to be
    /// monotone (true for single, complete, average and Ward linkage).
    pub fn cut_at_height(&self, h: f64) -> Vec<usize> {
        self.flatten(|_, merge| merge.distance <= h)
    }

    /// Flat cluster labels with exactly `k` clusters (`1 <= k <= n`).
    ///
    /// Applies the `n - k` lowest merges.
    pub fn cut_to_k(&self, k: usize) -> Result<Vec<usize>> {
        if k == 0 || k > self.n_items {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: self.n_items,
            });
        }
        let n_merges = self.n_items - k;
        Ok(self.flatten(|i, _| i < n_merges))
    }

    /// Apply the merges selected by `keep` and label the resulting groups.
    fn flatten(&self, keep: impl Fn(usize, &Merge) -> bool) -> Vec<usize> {
        let n = self.n_items;
        let mut parent: Vec<usize> = (0..n).collect();
        // rep[c] = some leaf inside cluster c
        let mut rep: Vec<usize> = (0..n).collect();
        rep.reserve(self.merges.len());

        for (i, merge) in self.merges.iter().enumerate() {
            let a = rep.get(merge.cluster_a).copied();
            let b = rep.get(merge.cluster_b).copied();
            let (Some(leaf_a), Some(leaf_b)) = (a, b) else {
                // Malformed merge referencing an unknown cluster.
                rep.push(a.or(b).unwrap_or(0));
                continue;
            };
            let ra = find(&mut parent, leaf_a);
            let rb = find(&mut parent, leaf_b);
            if keep(i, merge) && ra != rb {
                parent[rb] = ra;
            }
            rep.push(ra);
        }

        // Renumber roots by first appearance.
        let mut label_of_root = vec![usize::MAX; n];
        let mut next = 0;
        (0..n)
            .map(|item| {
                let root = find(&mut parent, item);
                if label_of_root[root] == usize::MAX {
                    label_of_root[root] = next;
                    next += 1;
                }
                label_of_root[root]
            })
            .collect()
    }

    /// Number of original items.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of merges recorded.
    pub fn n_merges(&self) -> usize {
        self.merges.len()
    }

    /// Iterate over merges.
    pub fn merges(&self) -> impl Iterator<Item = &Merge> {
        self.merges.iter()
    }

    /// Get the merge distances (for visualization).
    pub fn distances(&self) -> Vec<f64> {
        self.merges.iter().map(|m| m.distance).collect()
    }
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ((0 1) 2) (3 4) with heights 1, 2, 3 and root 10.
    fn sample() -> Dendrogram {
        let mut d = Dendrogram::new(5);
        d.add_merge(0, 1, 1.0, 2); // 5
        d.add_merge(5, 2, 2.0, 3); // 6
        d.add_merge(3, 4, 3.0, 2); // 7
        d.add_merge(6, 7, 10.0, 5); // 8
        d
    }

    #[test]
    fn test_dendrogram_creation() {
        let dendro = Dendrogram::new(5);
        assert_eq!(dendro.n_items(), 5);
        assert_eq!(dendro.n_merges(), 0);
        assert_eq!(dendro.cut_at_height(1.0), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_cut_at_height() {
        let d = sample();
        assert_eq!(d.cut_at_height(0.5), vec![0, 1, 2, 3, 4]);
        assert_eq!(d.cut_at_height(1.0), vec![0, 0, 1, 2, 3]);
        assert_eq!(d.cut_at_height(2.5), vec![0, 0, 0, 1, 2]);
        assert_eq!(d.cut_at_height(7.0), vec![0, 0, 0, 1, 1]);
        assert_eq!(d.cut_at_height(f64::MAX), vec![0; 5]);
    }

    #[test]
    fn test_cut_is_deterministic() {
        let d = sample();
        assert_eq!(d.cut_at_height(2.5), d.cut_at_height(2.5));
    }

    #[test]
    fn test_cut_to_k() {
        let d = sample();
        assert_eq!(d.cut_to_k(2).unwrap(), vec![0, 0, 0, 1, 1]);
        assert_eq!(d.cut_to_k(5).unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(d.cut_to_k(1).unwrap(), vec![0; 5]);
        assert!(d.cut_to_k(0).is_err());
        assert!(d.cut_to_k(6).is_err());
    }

    #[test]
    fn test_distances() {
        assert_eq!(sample().distances(), vec![1.0, 2.0, 3.0, 10.0]);
    }
}
