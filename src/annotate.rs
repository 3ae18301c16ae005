//! Joining cluster labels onto the graph.
//!
//! The annotated graph is built once, after all three clusterings have run,
//! and is the only input every renderer reads. It has no mutating accessors.

use crate::error::{Error, Result};
use crate::graph::SimilarityGraph;
use crate::label::{Label, LabelField};
use crate::matrix::first_duplicate;
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;

/// Node name → label for one clustering method.
#[derive(Debug, Clone, PartialEq)]
pub struct Labeling {
    field: LabelField,
    labels: HashMap<String, Label>,
}

impl Labeling {
    /// Empty labeling for `field`.
    pub fn new(field: LabelField) -> Self {
        Self {
            field,
            labels: HashMap::new(),
        }
    }

    /// Pair `names[i]` with `labels[i]`. A repeated name is an error.
    pub fn from_labels(field: LabelField, names: &[String], labels: Vec<Label>) -> Result<Self> {
        if names.len() != labels.len() {
            return Err(Error::DimensionMismatch {
                expected: names.len(),
                found: labels.len(),
            });
        }
        if let Some(name) = first_duplicate(names) {
            return Err(Error::DuplicateName(name.to_string()));
        }
        Ok(Self {
            field,
            labels: names.iter().cloned().zip(labels).collect(),
        })
    }

    /// Set the label of `name`.
    pub fn insert(&mut self, name: impl Into<String>, label: Label) {
        let _ = self.labels.insert(name.into(), label);
    }

    /// Label of `name`, if present.
    pub fn get(&self, name: &str) -> Option<Label> {
        self.labels.get(name).copied()
    }

    /// Method this labeling belongs to.
    pub fn field(&self) -> LabelField {
        self.field
    }

    /// Number of labelled nodes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no node is labelled.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Node name → display size.
pub type DisplaySizes = HashMap<String, f64>;

/// Draw one size per name uniformly from `[lo, hi)`.
///
/// Sizes are drawn in `names` order from `StdRng::seed_from_u64(seed)`.
pub fn sample_display_sizes(names: &[String], range: (f64, f64), seed: u64) -> Result<DisplaySizes> {
    let (lo, hi) = range;
    if !(lo.is_finite() && hi.is_finite() && lo < hi) {
        return Err(Error::InvalidParameter {
            name: "size_range",
            message: "expected finite lo < hi",
        });
    }
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(names
        .iter()
        .map(|name| (name.clone(), rng.random_range(lo..hi)))
        .collect())
}

/// Everything the renderers know about a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    /// Node name.
    pub name: String,
    /// k-means label.
    pub kmeans: Label,
    /// Hierarchical cut label.
    #[serde(rename = "hclust")]
    pub hierarchical: Label,
    /// Community label, singletons `unassigned`.
    pub community: Label,
    /// Display size.
    pub size: f64,
}

impl NodeRecord {
    /// The label stored under `field`.
    pub fn label(&self, field: LabelField) -> Label {
        match field {
            LabelField::Kmeans => self.kmeans,
            LabelField::Hierarchical => self.hierarchical,
            LabelField::Community => self.community,
        }
    }
}

/// The similarity graph with every node fully labelled.
#[derive(Debug, Clone)]
pub struct AnnotatedGraph {
    graph: UnGraph<NodeRecord, f64>,
}

impl AnnotatedGraph {
    /// Join the three labelings and the display sizes onto `graph` by node name.
    ///
    /// Fails if any labeling or the size map lacks a node, including isolated
    /// ones, or if a labeling is passed for the wrong method.
    pub fn annotate(
        graph: &SimilarityGraph,
        kmeans: &Labeling,
        hierarchical: &Labeling,
        community: &Labeling,
        sizes: &DisplaySizes,
    ) -> Result<Self> {
        for (labeling, expected) in [
            (kmeans, LabelField::Kmeans),
            (hierarchical, LabelField::Hierarchical),
            (community, LabelField::Community),
        ] {
            if labeling.field() != expected {
                return Err(Error::InvalidParameter {
                    name: "labeling",
                    message: "labeling passed for the wrong method",
                });
            }
        }

        let lookup = |labeling: &Labeling, name: &str| {
            labeling.get(name).ok_or_else(|| Error::MissingLabel {
                method: labeling.field().name(),
                node: name.to_string(),
            })
        };

        let mut annotated = UnGraph::with_capacity(graph.node_count(), graph.edge_count());
        for idx in graph.node_indices() {
            let name = &graph[idx];
            let size = sizes.get(name).copied().ok_or_else(|| Error::MissingLabel {
                method: "size",
                node: name.clone(),
            })?;
            let _ = annotated.add_node(NodeRecord {
                name: name.clone(),
                kmeans: lookup(kmeans, name)?,
                hierarchical: lookup(hierarchical, name)?,
                community: lookup(community, name)?,
                size,
            });
        }
        for e in graph.edge_references() {
            let _ = annotated.add_edge(e.source(), e.target(), *e.weight());
        }

        Ok(Self { graph: annotated })
    }

    /// Underlying petgraph graph.
    pub fn graph(&self) -> &UnGraph<NodeRecord, f64> {
        &self.graph
    }

    /// Node count.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Edge count.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node records in index order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        self.graph.node_weights()
    }

    /// Edges as `(source, target, weight)` node indices.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), *e.weight()))
    }

    /// Number of nodes per label of `field`.
    pub fn group_sizes(&self, field: LabelField) -> BTreeMap<Label, usize> {
        let mut sizes = BTreeMap::new();
        for node in self.nodes() {
            *sizes.entry(node.label(field)).or_insert(0) += 1;
        }
        sizes
    }

    /// Write one CSV row per node: name, the three labels, size, degree.
    pub fn write_node_table<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["name", "kmeans", "hclust", "community", "size", "degree"])?;
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let degree = self.graph.neighbors(idx).count();
            wtr.write_record([
                node.name.clone(),
                node.kmeans.to_string(),
                node.hierarchical.to_string(),
                node.community.to_string(),
                format!("{:.3}", node.size),
                degree.to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::matrix::SimilarityMatrix;

    fn graph() -> SimilarityGraph {
        let m = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.9, 0.0],
            vec![0.9, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap();
        build_graph(&m, 0.6).unwrap()
    }

    fn names() -> Vec<String> {
        vec!["V1".into(), "V2".into(), "V3".into()]
    }

    fn labelings() -> (Labeling, Labeling, Labeling) {
        let km = Labeling::from_labels(LabelField::Kmeans, &names(), Label::from_assignment(&[0, 0, 1])).unwrap();
        let hc =
            Labeling::from_labels(LabelField::Hierarchical, &names(), Label::from_assignment(&[0, 1, 2])).unwrap();
        let co = Labeling::from_labels(
            LabelField::Community,
            &names(),
            vec![Label::Cluster(1), Label::Cluster(1), Label::Unassigned],
        )
        .unwrap();
        (km, hc, co)
    }

    #[test]
    fn test_annotate_covers_isolated_node() {
        let (km, hc, co) = labelings();
        let sizes = sample_display_sizes(&names(), (1.0, 5.0), 3).unwrap();
        let ag = AnnotatedGraph::annotate(&graph(), &km, &hc, &co, &sizes).unwrap();

        assert_eq!(ag.node_count(), 3);
        assert_eq!(ag.edge_count(), 1);
        let lonely = ag.nodes().nth(2).unwrap();
        assert_eq!(lonely.name, "V3");
        assert_eq!(lonely.kmeans, Label::Cluster(2));
        assert_eq!(lonely.hierarchical, Label::Cluster(3));
        assert_eq!(lonely.community, Label::Unassigned);
        assert!((1.0..5.0).contains(&lonely.size));
    }

    #[test]
    fn test_missing_label_fails() {
        let (km, hc, _) = labelings();
        let mut co = Labeling::new(LabelField::Community);
        co.insert("V1", Label::Cluster(1));
        co.insert("V2", Label::Cluster(1));
        let sizes = sample_display_sizes(&names(), (1.0, 5.0), 3).unwrap();

        let err = AnnotatedGraph::annotate(&graph(), &km, &hc, &co, &sizes).unwrap_err();
        assert_eq!(
            err,
            Error::MissingLabel {
                method: "community",
                node: "V3".into()
            }
        );
    }

    #[test]
    fn test_missing_size_fails() {
        let (km, hc, co) = labelings();
        let sizes = DisplaySizes::new();
        let err = AnnotatedGraph::annotate(&graph(), &km, &hc, &co, &sizes).unwrap_err();
        assert!(matches!(err, Error::MissingLabel { method: "size", .. }));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let names: Vec<String> = ["a", "b", "a"].map(String::from).to_vec();
        let err = Labeling::from_labels(LabelField::Kmeans, &names, Label::from_assignment(&[0, 0, 1])).unwrap_err();
        assert_eq!(err, Error::DuplicateName("a".into()));
    }

    #[test]
    fn test_wrong_field_rejected() {
        let (km, hc, co) = labelings();
        let sizes = sample_display_sizes(&names(), (1.0, 5.0), 3).unwrap();
        assert!(AnnotatedGraph::annotate(&graph(), &hc, &km, &co, &sizes).is_err());
    }

    #[test]
    fn test_sizes_seeded() {
        let a = sample_display_sizes(&names(), (2.0, 9.0), 11).unwrap();
        let b = sample_display_sizes(&names(), (2.0, 9.0), 11).unwrap();
        assert_eq!(a, b);
        assert!(sample_display_sizes(&names(), (3.0, 3.0), 11).is_err());
    }

    #[test]
    fn test_group_sizes_and_table() {
        let (km, hc, co) = labelings();
        let sizes: DisplaySizes = names().into_iter().map(|n| (n, 2.0)).collect();
        let ag = AnnotatedGraph::annotate(&graph(), &km, &hc, &co, &sizes).unwrap();

        let groups = ag.group_sizes(LabelField::Community);
        assert_eq!(groups[&Label::Cluster(1)], 2);
        assert_eq!(groups[&Label::Unassigned], 1);

        let mut out = Vec::new();
        ag.write_node_table(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "name,kmeans,hclust,community,size,degree");
        assert_eq!(lines[3], "V3,2,3,unassigned,2.000,0");
    }
}
