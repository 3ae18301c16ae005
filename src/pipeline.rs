//! End-to-end run: matrix → graph → three clusterings → annotated graph → views.
//!
//! ```text
//! SimilarityMatrix ──build_graph(τ)──────────────▶ SimilarityGraph ──┐
//!        │                                              │            │
//!        ├─feature_rows─▶ hierarchical cut ─────┐       │            │
//!        └─feature_rows─▶ k-means ──────────────┤       ▼            │
//!                                               │   Leiden + relabel │
//!                                               ▼       │            ▼
//!                                          AnnotatedGraph ◀──────────┘
//!                                               │
//!                                     ForceLayout → SVG / HTML / CSV
//! ```
//!
//! Every stage is a plain function of its inputs and [`PipelineConfig`];
//! nothing is kept between runs. Each random stage takes its seed from the
//! config, so a run is reproducible.

use crate::annotate::{sample_display_sizes, AnnotatedGraph, Labeling};
use crate::cluster::{cut_dendrogram, Cut, HierarchicalClustering, Kmeans, KmeansFit, Linkage};
use crate::community::{modularity, relabel_singletons, CommunityDetection, Leiden, Objective};
use crate::error::{Error, Result};
use crate::graph::{build_graph, GraphStats, SimilarityGraph};
use crate::hierarchy::Dendrogram;
use crate::label::{Label, LabelField};
use crate::layout::{ForceLayout, Layout};
use crate::matrix::SimilarityMatrix;
use crate::render::{InteractiveView, StaticPlot};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Parameters of one pipeline run.
///
/// Defaults reproduce the reference analysis: τ = 0.6, complete linkage cut
/// at height 7, k-means with K = 4 and 25 restarts, Leiden modularity at
/// resolution 0.5 with two passes, seed 42 everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Edge threshold τ.
    pub threshold: f64,
    /// Value written over the diagonal before clustering rows, if any.
    pub diagonal: Option<f64>,
    /// Dendrogram cut height.
    pub cut_height: f64,
    /// Linkage for the hierarchical clusterer.
    pub linkage: Linkage,
    /// k-means cluster count.
    pub k: usize,
    /// k-means restarts.
    pub n_init: usize,
    /// Lloyd iterations per restart.
    pub max_iter: usize,
    /// Lloyd stops once the total squared centroid shift is below this.
    pub tol: f64,
    /// Community objective.
    pub objective: Objective,
    /// Community resolution.
    pub resolution: f64,
    /// Leiden passes; 0 repeats passes until the partition is stable.
    pub n_iterations: usize,
    /// Seed shared by k-means, Leiden, display sizes and layout.
    pub seed: u64,
    /// Range that display sizes are drawn from.
    pub size_range: (f64, f64),
    /// Force-layout iterations.
    pub layout_iterations: usize,
    /// Largest K of the elbow curve; `None` skips it.
    pub elbow_max_k: Option<usize>,
    /// Static plot canvas, width by height.
    pub plot_size: (u32, u32),
    /// Edge stroke opacity in the static plots.
    pub edge_opacity: f64,
    /// Edge stroke width in the static plots.
    pub edge_width: f64,
    /// Draw static plot edges as arcs.
    pub curved_edges: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            diagonal: Some(1.0),
            cut_height: 7.0,
            linkage: Linkage::Complete,
            k: 4,
            n_init: 25,
            max_iter: 300,
            tol: 1e-4,
            objective: Objective::Modularity,
            resolution: 0.5,
            n_iterations: 2,
            seed: 42,
            size_range: (1.0, 10.0),
            layout_iterations: 500,
            elbow_max_k: None,
            plot_size: (900, 700),
            edge_opacity: 0.3,
            edge_width: 0.6,
            curved_edges: false,
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Read a JSON config file.
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_json_reader(file)
    }
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Thresholded, simplified graph.
    pub graph: SimilarityGraph,
    /// Counts of `graph`.
    pub stats: GraphStats,
    /// Full hierarchical tree.
    pub dendrogram: Dendrogram,
    /// Best k-means restart.
    pub kmeans: KmeansFit,
    /// Raw community partition, before relabeling.
    pub partition: Vec<usize>,
    /// Modularity of `partition`.
    pub modularity: f64,
    /// Per-method labels by node name.
    pub labelings: [Labeling; 3],
    /// Graph carrying all labels and display sizes.
    pub annotated: AnnotatedGraph,
    /// Node positions shared by every view.
    pub layout: Layout,
    /// `(k, wcss)` pairs, when requested.
    pub elbow: Option<Vec<(usize, f64)>>,
}

/// Dendrogram of the matrix rows and its flat cut at `config.cut_height`.
pub fn hierarchical_labels(
    features: &[Vec<f32>],
    config: &PipelineConfig,
) -> Result<(Dendrogram, Vec<Label>)> {
    let clusterer = HierarchicalClustering::at_height(config.cut_height).with_linkage(config.linkage);
    let dendrogram = clusterer.fit_dendrogram(features)?;
    let assignment = cut_dendrogram(&dendrogram, Cut::Height(config.cut_height))?;
    Ok((dendrogram, Label::from_assignment(&assignment)))
}

/// Best of `config.n_init` seeded k-means restarts.
pub fn kmeans_labels(features: &[Vec<f32>], config: &PipelineConfig) -> Result<(KmeansFit, Vec<Label>)> {
    let fit = kmeans_for(config).fit(features)?;
    let labels = Label::from_assignment(&fit.labels);
    Ok((fit, labels))
}

/// Leiden partition of `graph` and its display labels.
pub fn community_labels(
    graph: &SimilarityGraph,
    config: &PipelineConfig,
) -> Result<(Vec<usize>, Vec<Label>)> {
    let partition = Leiden::new()
        .with_objective(config.objective)
        .with_resolution(config.resolution)
        .with_n_iterations(config.n_iterations)
        .with_seed(config.seed)
        .detect(graph)?;
    let labels = relabel_singletons(&partition);
    Ok((partition, labels))
}

fn kmeans_for(config: &PipelineConfig) -> Kmeans {
    Kmeans::new(config.k)
        .with_n_init(config.n_init)
        .with_max_iter(config.max_iter)
        .with_tol(config.tol)
        .with_seed(config.seed)
}

fn count_groups(labels: &[Label]) -> (usize, usize) {
    let mut groups: Vec<Label> = labels.iter().copied().filter(|l| !l.is_unassigned()).collect();
    groups.sort_unstable();
    groups.dedup();
    let unassigned = labels.iter().filter(|l| l.is_unassigned()).count();
    (groups.len(), unassigned)
}

/// Run every stage on `matrix`.
pub fn run(matrix: &SimilarityMatrix, config: &PipelineConfig) -> Result<PipelineOutput> {
    if matrix.is_empty() {
        return Err(Error::EmptyInput);
    }
    let names = matrix.names().to_vec();

    let graph = build_graph(matrix, config.threshold)?;
    let stats = GraphStats::of(&graph);

    let features = matrix.feature_rows(config.diagonal);

    let (dendrogram, hc) = hierarchical_labels(&features, config)?;
    let (n_hc, _) = count_groups(&hc);
    log::info!("hierarchical: {n_hc} clusters at height {}", config.cut_height);

    let (kmeans, km) = kmeans_labels(&features, config)?;
    log::info!(
        "kmeans: K={} wcss={:.4} ({} iterations)",
        config.k,
        kmeans.inertia,
        kmeans.n_iter
    );

    let (partition, co) = community_labels(&graph, config)?;
    let gamma = match config.objective {
        Objective::Modularity => config.resolution,
        Objective::Cpm => 1.0,
    };
    let q = modularity(&graph, &partition, gamma)?;
    let (n_co, n_unassigned) = count_groups(&co);
    log::info!("communities: {n_co} groups, {n_unassigned} unassigned, modularity {q:.4}");

    let elbow = match config.elbow_max_k {
        Some(max_k) => Some(kmeans_for(config).elbow_curve(&features, max_k)?),
        None => None,
    };

    let labelings = [
        Labeling::from_labels(LabelField::Kmeans, &names, km)?,
        Labeling::from_labels(LabelField::Hierarchical, &names, hc)?,
        Labeling::from_labels(LabelField::Community, &names, co)?,
    ];
    let sizes = sample_display_sizes(&names, config.size_range, config.seed)?;
    let [km_l, hc_l, co_l] = &labelings;
    let annotated = AnnotatedGraph::annotate(&graph, km_l, hc_l, co_l, &sizes)?;

    let layout = ForceLayout::new()
        .with_iterations(config.layout_iterations)
        .with_seed(config.seed)
        .compute(&graph);

    Ok(PipelineOutput {
        graph,
        stats,
        dendrogram,
        kmeans,
        partition,
        modularity: q,
        labelings,
        annotated,
        layout,
        elbow,
    })
}

/// Files written by [`write_outputs`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    /// Static plot coloured by k-means.
    pub kmeans_svg: PathBuf,
    /// Static plot coloured by hierarchical cut.
    pub hclust_svg: PathBuf,
    /// Interactive community view.
    pub interactive_html: PathBuf,
    /// Per-node label table.
    pub nodes_csv: PathBuf,
    /// Elbow curve, written only when the run computed one.
    pub elbow_csv: PathBuf,
}

impl OutputPaths {
    /// Standard file names inside `dir`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            kmeans_svg: dir.join("network_kmeans.svg"),
            hclust_svg: dir.join("network_hclust.svg"),
            interactive_html: dir.join("network_interactive.html"),
            nodes_csv: dir.join("nodes.csv"),
            elbow_csv: dir.join("elbow.csv"),
        }
    }
}

fn static_plot(field: LabelField, config: &PipelineConfig) -> StaticPlot {
    let (width, height) = config.plot_size;
    StaticPlot::new(field)
        .with_size(width, height)
        .with_edge_opacity(config.edge_opacity)
        .with_edge_width(config.edge_width)
        .with_curved_edges(config.curved_edges)
}

/// Write the two static plots, the interactive view and the node table.
pub fn write_outputs(output: &PipelineOutput, config: &PipelineConfig, paths: &OutputPaths) -> Result<()> {
    let mut targets = vec![&paths.kmeans_svg, &paths.hclust_svg, &paths.interactive_html, &paths.nodes_csv];
    if output.elbow.is_some() {
        targets.push(&paths.elbow_csv);
    }
    for path in targets {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
    }

    let kmeans_svg = static_plot(LabelField::Kmeans, config)
        .with_title(format!("k-means, K = {}", config.k))
        .render_svg(&output.annotated, &output.layout)?;
    fs::write(&paths.kmeans_svg, kmeans_svg)?;

    let hclust_svg = static_plot(LabelField::Hierarchical, config)
        .with_title(format!("hierarchical cut at h = {}", config.cut_height))
        .render_svg(&output.annotated, &output.layout)?;
    fs::write(&paths.hclust_svg, hclust_svg)?;

    let html = InteractiveView::new()
        .with_title("Community network")
        .render_html(&output.annotated, &output.layout, LabelField::Community)?;
    fs::write(&paths.interactive_html, html)?;

    let nodes = BufWriter::new(File::create(&paths.nodes_csv)?);
    output.annotated.write_node_table(nodes)?;

    if let Some(curve) = &output.elbow {
        let mut out = BufWriter::new(File::create(&paths.elbow_csv)?);
        writeln!(out, "k,wcss")?;
        for (k, wcss) in curve {
            writeln!(out, "{k},{wcss:.6}")?;
        }
        out.flush()?;
    }

    log::info!(
        "wrote {}, {}, {}, {}",
        paths.kmeans_svg.display(),
        paths.hclust_svg.display(),
        paths.interactive_html.display(),
        paths.nodes_csv.display()
    );
    Ok(())
}
