//! Force-directed 2D layout (Fruchterman–Reingold).
//!
//! Nodes repel each other with force `k² / d`, edges pull their endpoints
//! together with force `w · d² / k`, and a weak gravity keeps disconnected
//! pieces on screen. Displacements are capped by a temperature that cools
//! linearly to zero. Initial positions come from `StdRng::seed_from_u64(seed)`,
//! so the same graph and seed always give the same layout.
//!
//! Positions are returned normalized to the unit square.

use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Node positions in `[0, 1]²`, indexed by node.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    positions: Vec<(f64, f64)>,
}

impl Layout {
    /// Position of node `i`.
    pub fn position(&self, i: usize) -> (f64, f64) {
        self.positions[i]
    }

    /// All positions.
    pub fn positions(&self) -> &[(f64, f64)] {
        &self.positions
    }

    /// Number of positioned nodes.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the layout is empty.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Fruchterman–Reingold layout settings.
#[derive(Debug, Clone)]
pub struct ForceLayout {
    iterations: usize,
    seed: u64,
    gravity: f64,
}

impl ForceLayout {
    /// Default settings: 500 iterations, seed 42.
    pub fn new() -> Self {
        Self {
            iterations: 500,
            seed: 42,
            gravity: 0.05,
        }
    }

    /// Set the number of iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set random seed for the initial placement.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Lay out `graph`. Edge weights scale the attraction.
    pub fn compute<N>(&self, graph: &UnGraph<N, f64>) -> Layout {
        let n = graph.node_count();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut pos: Vec<(f64, f64)> = (0..n)
            .map(|_| (rng.random::<f64>(), rng.random::<f64>()))
            .collect();

        if n <= 1 {
            return Layout {
                positions: vec![(0.5, 0.5); n],
            };
        }

        let edges: Vec<(usize, usize, f64)> = graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), e.weight().max(0.0)))
            .collect();

        let k = (1.0 / n as f64).sqrt();
        let t0 = 0.1;

        for iter in 0..self.iterations {
            let temperature = t0 * (1.0 - iter as f64 / self.iterations as f64);
            let mut disp = vec![(0.0f64, 0.0f64); n];

            // repulsion
            for i in 0..n {
                for j in (i + 1)..n {
                    let (dx, dy) = (pos[i].0 - pos[j].0, pos[i].1 - pos[j].1);
                    let d = (dx * dx + dy * dy).sqrt().max(1e-9);
                    let f = k * k / d;
                    disp[i].0 += dx / d * f;
                    disp[i].1 += dy / d * f;
                    disp[j].0 -= dx / d * f;
                    disp[j].1 -= dy / d * f;
                }
            }

            // attraction
            for &(i, j, w) in &edges {
                let (dx, dy) = (pos[i].0 - pos[j].0, pos[i].1 - pos[j].1);
                let d = (dx * dx + dy * dy).sqrt().max(1e-9);
                let f = w * d * d / k;
                disp[i].0 -= dx / d * f;
                disp[i].1 -= dy / d * f;
                disp[j].0 += dx / d * f;
                disp[j].1 += dy / d * f;
            }

            for (p, d) in pos.iter_mut().zip(disp.iter_mut()) {
                d.0 += self.gravity * (0.5 - p.0);
                d.1 += self.gravity * (0.5 - p.1);
                let len = (d.0 * d.0 + d.1 * d.1).sqrt();
                if len > 0.0 {
                    let step = len.min(temperature);
                    p.0 += d.0 / len * step;
                    p.1 += d.1 / len * step;
                }
            }
        }

        Layout {
            positions: normalize(&pos),
        }
    }
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self::new()
    }
}

/// Rescale to the unit square; a flat axis is centred at 0.5.
fn normalize(pos: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    for &(x, y) in pos {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    let scale = |v: f64, lo: f64, hi: f64| {
        if hi - lo > 1e-12 {
            (v - lo) / (hi - lo)
        } else {
            0.5
        }
    };
    pos.iter()
        .map(|&(x, y)| (scale(x, min_x, max_x), scale(y, min_y, max_y)))
        .collect()
}
