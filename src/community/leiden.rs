//! Leiden algorithm for community detection.
//!
//! An improvement over Louvain that guarantees well-connected communities.
//!
//! ## The Leiden Algorithm (Traag et al. 2019)
//!
//! ### Three Phases
//!
//! 1. **Local Moving**: Visit nodes in random order and move each to the
//!    neighbouring community with the best quality gain (or to an empty
//!    community when every option is worse). Neighbours of a moved node are
//!    queued again.
//!
//! 2. **Refinement**: Within each community from phase 1, split off every
//!    connected component. Splitting a disconnected community never lowers
//!    modularity or CPM, and it guarantees every community is connected.
//!
//! 3. **Aggregation**: Contract each refined community to a node. The
//!    aggregate starts from the phase-1 partition, so refinement only
//!    constrains, never undoes, the moves. Recurse.
//!
//! One **pass** repeats the three phases until refinement no longer merges
//! anything. A further pass starts again on the original graph from the
//! previous pass's partition, so every pass returns a partition at least as
//! good as the one it began with. `n_iterations` counts passes; 0 keeps
//! passing until a pass leaves the partition unchanged.
//!
//! ## Objectives
//!
//! - [`Objective::Modularity`]: gain `k_i,in / m - γ Σ_tot k_i / (2m²)`
//! - [`Objective::Cpm`] (constant Potts model): gain `k_i,in - γ n_c n_i`,
//!   where `n` counts original nodes. CPM penalizes community size directly
//!   and has no resolution limit.
//!
//! ## Determinism
//!
//! The node visit order is the only random choice. It is drawn from a
//! `StdRng` seeded with `seed`, and ties between candidate communities go to
//! the smallest community id, so a fixed seed gives a fixed partition.
//!
//! ## References
//!
//! Traag, Waltman, van Eck (2019). "From Louvain to Leiden: guaranteeing
//! well-connected communities." Scientific Reports 9, 5233.

use super::traits::{CommunityDetection, EdgeWeight};
use crate::error::{Error, Result};
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

const GAIN_EPS: f64 = 1e-12;
/// Pass limit when `n_iterations` is 0.
const MAX_PASSES: usize = 1000;

/// Quality function optimized by [`Leiden`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    /// Newman–Girvan modularity with resolution γ.
    #[default]
    Modularity,
    /// Constant Potts model with resolution γ.
    Cpm,
}

/// Leiden community detection algorithm.
#[derive(Debug, Clone)]
pub struct Leiden {
    /// Quality function.
    objective: Objective,
    /// Resolution parameter (gamma). Higher = smaller communities.
    resolution: f64,
    /// Number of full passes; 0 runs until the partition is stable.
    n_iterations: usize,
    /// Random seed for the node visit order.
    seed: u64,
}

impl Leiden {
    /// Create a new Leiden detector.
    pub fn new() -> Self {
        Self {
            objective: Objective::Modularity,
            resolution: 1.0,
            n_iterations: 2,
            seed: 42,
        }
    }

    /// Set the quality function.
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    /// Set resolution parameter.
    ///
    /// Higher values produce smaller communities.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the number of passes (0: until stable).
    pub fn with_n_iterations(mut self, n_iterations: usize) -> Self {
        self.n_iterations = n_iterations;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for Leiden {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal graph representation for weighted operations.
#[derive(Clone)]
struct WeightedGraph {
    n: usize,
    /// Edges between distinct nodes, `i < j`.
    edges: Vec<(usize, usize, f64)>,
    /// Weight of edges folded into each node by aggregation.
    self_loops: Vec<f64>,
    /// Adjacency: node -> [(neighbor, weight)]
    adj: Vec<Vec<(usize, f64)>>,
    /// Weighted degree, self-loops counted twice.
    degrees: Vec<f64>,
    /// Number of original nodes inside each node.
    sizes: Vec<f64>,
    /// Total edge weight (2m in modularity formula)
    total_weight: f64,
}

impl WeightedGraph {
    fn new(n: usize, edges: Vec<(usize, usize, f64)>, self_loops: Vec<f64>, sizes: Vec<f64>) -> Self {
        let mut adj = vec![Vec::new(); n];
        let mut degrees: Vec<f64> = self_loops.iter().map(|w| 2.0 * w).collect();
        let mut total_weight: f64 = degrees.iter().sum();

        for &(i, j, w) in &edges {
            adj[i].push((j, w));
            adj[j].push((i, w));
            degrees[i] += w;
            degrees[j] += w;
            total_weight += 2.0 * w;
        }

        Self {
            n,
            edges,
            self_loops,
            adj,
            degrees,
            sizes,
            total_weight,
        }
    }

    /// Contract `groups` (ids in `0..n_groups`) to single nodes.
    fn aggregate(&self, groups: &[usize], n_groups: usize) -> Self {
        let mut self_loops = vec![0.0; n_groups];
        let mut sizes = vec![0.0; n_groups];
        for v in 0..self.n {
            self_loops[groups[v]] += self.self_loops[v];
            sizes[groups[v]] += self.sizes[v];
        }

        let mut between: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for &(i, j, w) in &self.edges {
            let (a, b) = (groups[i], groups[j]);
            if a == b {
                self_loops[a] += w;
            } else {
                *between.entry((a.min(b), a.max(b))).or_insert(0.0) += w;
            }
        }

        let edges = between.into_iter().map(|((a, b), w)| (a, b, w)).collect();
        Self::new(n_groups, edges, self_loops, sizes)
    }
}

impl CommunityDetection for Leiden {
    fn detect<N, E: EdgeWeight>(&self, graph: &UnGraph<N, E>) -> Result<Vec<usize>> {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if !self.resolution.is_finite() || self.resolution < 0.0 {
            return Err(Error::InvalidParameter {
                name: "resolution",
                message: "must be finite and non-negative",
            });
        }

        let mut edges: Vec<(usize, usize, f64)> = Vec::with_capacity(graph.edge_count());
        let mut self_loops = vec![0.0; n];
        for e in graph.edge_references() {
            let w = e.weight().weight();
            if !w.is_finite() || w < 0.0 {
                return Err(Error::InvalidParameter {
                    name: "weight",
                    message: "edge weights must be finite and non-negative",
                });
            }
            let (i, j) = (e.source().index(), e.target().index());
            if i == j {
                self_loops[i] += w;
            } else {
                edges.push((i.min(j), i.max(j), w));
            }
        }

        if edges.iter().all(|&(_, _, w)| w == 0.0) {
            return Ok((0..n).collect());
        }

        let base = WeightedGraph::new(n, edges, self_loops, vec![1.0; n]);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let budget = if self.n_iterations == 0 {
            MAX_PASSES
        } else {
            self.n_iterations
        };

        let mut partition: Vec<usize> = (0..n).collect();
        for pass in 0..budget {
            let next = self.pass(&base, &partition, &mut rng);
            let changed = next != partition;
            partition = next;
            log::debug!(
                "leiden pass {pass}: {} communities, changed={changed}",
                partition.iter().max().map_or(0, |c| c + 1)
            );
            if !changed {
                break;
            }
        }
        Ok(partition)
    }

    fn resolution(&self) -> f64 {
        self.resolution
    }
}

impl Leiden {
    /// One full pass over `base` starting from `init`: move, refine and
    /// aggregate until refinement leaves every aggregate node on its own.
    fn pass(&self, base: &WeightedGraph, init: &[usize], rng: &mut StdRng) -> Vec<usize> {
        let mut wg = base.clone();
        // original node -> node of the current aggregate
        let mut membership: Vec<usize> = (0..base.n).collect();
        // aggregate node -> community
        let mut assignment = renumber_communities(init);
        let mut level = 0;

        loop {
            // Phase 1: Local moving
            let moved = self.local_moving(&wg, &mut assignment, rng);

            // Phase 2: Refinement
            let (refined, n_refined) = refine(&wg, &assignment);
            log::debug!(
                "leiden level {level}: {} nodes, moved={moved}, {n_refined} refined communities",
                wg.n
            );

            if n_refined == wg.n {
                let result: Vec<usize> = membership.iter().map(|&v| refined[v]).collect();
                return renumber_communities(&result);
            }

            // Phase 3: Aggregation, starting from the unrefined partition
            let mut lifted = vec![0; n_refined];
            for v in 0..wg.n {
                lifted[refined[v]] = assignment[v];
            }
            membership = membership.iter().map(|&v| refined[v]).collect();
            wg = wg.aggregate(&refined, n_refined);
            assignment = renumber_communities(&lifted);
            level += 1;
        }
    }

    fn node_weights(&self, wg: &WeightedGraph) -> Vec<f64> {
        match self.objective {
            Objective::Modularity => wg.degrees.clone(),
            Objective::Cpm => wg.sizes.clone(),
        }
    }

    /// Gain of adding a node (weight `node_w`, `k_in` links into the target)
    /// to a community of total weight `sigma`.
    fn gain(&self, k_in: f64, sigma: f64, node_w: f64, m: f64) -> f64 {
        match self.objective {
            Objective::Modularity => k_in / m - self.resolution * sigma * node_w / (2.0 * m * m),
            Objective::Cpm => k_in - self.resolution * sigma * node_w,
        }
    }

    /// Phase 1: queue-based local moving. Returns whether any node moved.
    fn local_moving(&self, wg: &WeightedGraph, assignment: &mut [usize], rng: &mut StdRng) -> bool {
        let n = wg.n;
        let m = wg.total_weight / 2.0;
        let node_weight = self.node_weights(wg);

        let mut comm_weight = vec![0.0; n];
        let mut comm_size = vec![0usize; n];
        for v in 0..n {
            comm_weight[assignment[v]] += node_weight[v];
            comm_size[assignment[v]] += 1;
        }
        let mut empty: Vec<usize> = (0..n).rev().filter(|&c| comm_size[c] == 0).collect();

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);
        let mut queue: VecDeque<usize> = order.into();
        let mut in_queue = vec![true; n];
        let mut moved = false;

        while let Some(node) = queue.pop_front() {
            in_queue[node] = false;
            let current = assignment[node];

            // Link weight from node to each neighbouring community
            let mut links: BTreeMap<usize, f64> = BTreeMap::new();
            for &(neighbor, w) in &wg.adj[node] {
                *links.entry(assignment[neighbor]).or_insert(0.0) += w;
            }

            // Take the node out of its community
            comm_weight[current] -= node_weight[node];
            comm_size[current] -= 1;

            let own_links = links.get(&current).copied().unwrap_or(0.0);
            let mut best = current;
            let mut best_gain = self.gain(own_links, comm_weight[current], node_weight[node], m);

            for (&comm, &k_in) in &links {
                if comm == current {
                    continue;
                }
                let gain = self.gain(k_in, comm_weight[comm], node_weight[node], m);
                if gain > best_gain + GAIN_EPS {
                    best_gain = gain;
                    best = comm;
                }
            }

            // An empty community has gain 0.
            if best_gain < -GAIN_EPS {
                if comm_size[current] == 0 {
                    best = current;
                } else if let Some(c) = empty.pop() {
                    best = c;
                }
            }

            comm_weight[best] += node_weight[node];
            comm_size[best] += 1;

            if best != current {
                assignment[node] = best;
                moved = true;
                if comm_size[current] == 0 {
                    empty.push(current);
                }

                for &(neighbor, _) in &wg.adj[node] {
                    if !in_queue[neighbor] && assignment[neighbor] != best {
                        queue.push_back(neighbor);
                        in_queue[neighbor] = true;
                    }
                }
            }
        }

        moved
    }
}

/// Phase 2: split every community into its connected components.
///
/// Returns the component id of each node and the number of components.
/// Components are numbered in order of their smallest node.
fn refine(wg: &WeightedGraph, assignment: &[usize]) -> (Vec<usize>, usize) {
    let mut refined = vec![usize::MAX; wg.n];
    let mut next = 0;
    let mut queue = VecDeque::new();

    for start in 0..wg.n {
        if refined[start] != usize::MAX {
            continue;
        }
        let comm = assignment[start];
        refined[start] = next;
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            for &(neighbor, _) in &wg.adj[node] {
                if refined[neighbor] == usize::MAX && assignment[neighbor] == comm {
                    refined[neighbor] = next;
                    queue.push_back(neighbor);
                }
            }
        }
        next += 1;
    }

    (refined, next)
}

/// Renumber communities to consecutive integers in order of first appearance.
fn renumber_communities(assignment: &[usize]) -> Vec<usize> {
    let mut mapping: BTreeMap<usize, usize> = BTreeMap::new();
    assignment
        .iter()
        .map(|&c| {
            let next = mapping.len();
            *mapping.entry(c).or_insert(next)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::NodeIndex;
    use std::collections::{HashMap, HashSet};

    fn two_triangles() -> UnGraph<(), ()> {
        let mut graph = UnGraph::<(), ()>::new_undirected();
        let n: Vec<_> = (0..6).map(|_| graph.add_node(())).collect();
        for (a, b) in [(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)] {
            let _ = graph.add_edge(n[a], n[b], ());
        }
        graph
    }

    #[test]
    fn test_leiden_basic() {
        let mut graph = UnGraph::<(), ()>::new_undirected();
        let n0 = graph.add_node(());
        let n1 = graph.add_node(());
        let n2 = graph.add_node(());

        let _ = graph.add_edge(n0, n1, ());
        let _ = graph.add_edge(n1, n2, ());
        let _ = graph.add_edge(n0, n2, ());

        let communities = Leiden::new().detect(&graph).unwrap();

        // All in one community (triangle)
        assert_eq!(communities, vec![0, 0, 0]);
    }

    #[test]
    fn test_leiden_two_cliques() {
        let communities = Leiden::new().detect(&two_triangles()).unwrap();

        assert_eq!(communities.len(), 6);
        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[1], communities[2]);
        assert_eq!(communities[3], communities[4]);
        assert_eq!(communities[4], communities[5]);
        assert_ne!(communities[0], communities[3]);
    }

    #[test]
    fn test_leiden_disconnected_components() {
        // A--B--C  D--E
        let mut graph = UnGraph::<(), ()>::new_undirected();
        let a = graph.add_node(());
        let b = graph.add_node(());
        let c = graph.add_node(());
        let d = graph.add_node(());
        let e = graph.add_node(());

        let _ = graph.add_edge(a, b, ());
        let _ = graph.add_edge(b, c, ());
        let _ = graph.add_edge(d, e, ());

        let communities = Leiden::new().detect(&graph).unwrap();

        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[1], communities[2]);
        assert_eq!(communities[3], communities[4]);
        assert_ne!(communities[0], communities[3]);
    }

    #[test]
    fn test_leiden_isolated_node_is_singleton() {
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let a = graph.add_node(());
        let b = graph.add_node(());
        let _lonely = graph.add_node(());
        let _ = graph.add_edge(a, b, 0.9);

        let communities = Leiden::new().detect(&graph).unwrap();
        assert_eq!(communities, vec![0, 0, 1]);
    }

    #[test]
    fn test_leiden_weights_matter() {
        // Square 0-1-2-3-0; heavy edges 0-1 and 2-3.
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let n: Vec<_> = (0..4).map(|_| graph.add_node(())).collect();
        let _ = graph.add_edge(n[0], n[1], 10.0);
        let _ = graph.add_edge(n[1], n[2], 0.1);
        let _ = graph.add_edge(n[2], n[3], 10.0);
        let _ = graph.add_edge(n[3], n[0], 0.1);

        let communities = Leiden::new().detect(&graph).unwrap();
        assert_eq!(communities, vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_leiden_cpm_resolution() {
        let graph = two_triangles();

        let coarse = Leiden::new()
            .with_objective(Objective::Cpm)
            .with_resolution(0.5)
            .detect(&graph)
            .unwrap();
        assert_eq!(coarse[0], coarse[1]);
        assert_eq!(coarse[4], coarse[5]);
        assert_ne!(coarse[0], coarse[5]);

        // γ = 2: any pair costs more than its single edge.
        let fine = Leiden::new()
            .with_objective(Objective::Cpm)
            .with_resolution(2.0)
            .detect(&graph)
            .unwrap();
        assert_eq!(fine, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_leiden_same_seed_same_partition() {
        let mut graph = UnGraph::<(), ()>::new_undirected();
        let nodes: Vec<_> = (0..30).map(|_| graph.add_node(())).collect();
        for i in 0..30 {
            for j in [1, 3, 7] {
                let _ = graph.add_edge(nodes[i], nodes[(i + j) % 30], ());
            }
        }

        let a = Leiden::new().with_seed(7).detect(&graph).unwrap();
        let b = Leiden::new().with_seed(7).detect(&graph).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_leiden_empty_graph() {
        let graph = UnGraph::<(), ()>::new_undirected();
        assert!(Leiden::new().detect(&graph).is_err());
    }

    #[test]
    fn test_leiden_single_node() {
        let mut graph = UnGraph::<(), ()>::new_undirected();
        let _ = graph.add_node(());

        let communities = Leiden::new().detect(&graph).unwrap();
        assert_eq!(communities, vec![0]);
    }

    #[test]
    fn test_leiden_invalid_resolution() {
        let graph = two_triangles();
        let err = Leiden::new().with_resolution(-1.0).detect(&graph).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "resolution", .. }));
    }

    #[test]
    fn test_leiden_connectivity_guarantee() {
        let mut graph = UnGraph::<(), ()>::new_undirected();
        for _ in 0..20 {
            let _ = graph.add_node(());
        }
        for i in 0..15 {
            let _ = graph.add_edge(NodeIndex::new(i), NodeIndex::new(i + 1), ());
        }
        let _ = graph.add_edge(NodeIndex::new(0), NodeIndex::new(5), ());
        let _ = graph.add_edge(NodeIndex::new(10), NodeIndex::new(15), ());

        for objective in [Objective::Modularity, Objective::Cpm] {
            let communities = Leiden::new()
                .with_objective(objective)
                .with_resolution(0.3)
                .detect(&graph)
                .unwrap();

            let mut by_community: HashMap<usize, Vec<usize>> = HashMap::new();
            for (node, &comm) in communities.iter().enumerate() {
                by_community.entry(comm).or_default().push(node);
            }

            for nodes in by_community.values() {
                let node_set: HashSet<usize> = nodes.iter().copied().collect();
                let mut visited = HashSet::new();
                let mut queue = VecDeque::from([nodes[0]]);
                while let Some(node) = queue.pop_front() {
                    if !visited.insert(node) {
                        continue;
                    }
                    for nb in graph.neighbors(NodeIndex::new(node)) {
                        if node_set.contains(&nb.index()) {
                            queue.push_back(nb.index());
                        }
                    }
                }
                assert_eq!(visited.len(), nodes.len(), "community is not connected");
            }
        }
    }

    /// `k` five-cliques in a ring, neighbours joined by one edge.
    fn ring_of_cliques(k: usize) -> UnGraph<(), f64> {
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let nodes: Vec<_> = (0..5 * k).map(|_| graph.add_node(())).collect();
        for c in 0..k {
            for i in 0..5 {
                for j in (i + 1)..5 {
                    let _ = graph.add_edge(nodes[5 * c + i], nodes[5 * c + j], 1.0);
                }
            }
            let _ = graph.add_edge(nodes[5 * c + 4], nodes[(5 * (c + 1)) % (5 * k)], 1.0);
        }
        graph
    }

    #[test]
    fn test_leiden_ring_of_cliques() {
        let graph = ring_of_cliques(10);
        let communities = Leiden::new().detect(&graph).unwrap();
        for c in 0..10 {
            for i in 1..5 {
                assert_eq!(communities[5 * c], communities[5 * c + i]);
            }
        }
        let distinct: HashSet<usize> = communities.iter().copied().collect();
        assert_eq!(distinct.len(), 10);
    }

    #[test]
    fn test_leiden_more_passes_never_worse() {
        use crate::community::quality::modularity;

        let mut graph = ring_of_cliques(30);
        // shortcuts across the ring
        for c in (0..30).step_by(3) {
            let _ = graph.add_edge(NodeIndex::new(5 * c + 2), NodeIndex::new((5 * c + 17) % 150), 1.0);
        }

        let q = |passes: usize| {
            let partition = Leiden::new()
                .with_resolution(0.5)
                .with_n_iterations(passes)
                .detect(&graph)
                .unwrap();
            modularity(&graph, &partition, 0.5).unwrap()
        };
        let (one, two, stable) = (q(1), q(2), q(0));
        assert!(two >= one - 1e-12, "one pass {one}, two passes {two}");
        assert!(stable >= two - 1e-12, "two passes {two}, until stable {stable}");
    }
}
