use super::{escape_xml, group_colors};
use crate::annotate::AnnotatedGraph;
use crate::error::{Error, Result};
use crate::label::{Label, LabelField};
use crate::layout::Layout;
use serde::Serialize;

const TEMPLATE: &str = include_str!("interactive.html");
const DATA_SLOT: &str = "__DATA__";
const TITLE_SLOT: &str = "__TITLE__";

#[derive(Serialize)]
struct ViewData<'a> {
    field: &'static str,
    nodes: Vec<ViewNode<'a>>,
    links: Vec<ViewLink>,
    groups: Vec<ViewGroup>,
}

#[derive(Serialize)]
struct ViewNode<'a> {
    id: usize,
    name: &'a str,
    group: Label,
    size: f64,
    radius: f64,
    x: f64,
    y: f64,
    color: String,
    kmeans: Label,
    hclust: Label,
    community: Label,
}

#[derive(Serialize)]
struct ViewLink {
    source: usize,
    target: usize,
    weight: f64,
}

#[derive(Serialize)]
struct ViewGroup {
    label: Label,
    color: String,
    count: usize,
}

/// Self-contained interactive HTML network view.
///
/// The graph is embedded as JSON; the page needs no network access and
/// offers group filtering, neighbourhood highlighting on hover and a
/// selection panel listing all three labels of the clicked node.
#[derive(Debug, Clone)]
pub struct InteractiveView {
    title: String,
    node_radius: (f64, f64),
}

impl InteractiveView {
    /// View with a default title.
    pub fn new() -> Self {
        Self {
            title: "Similarity network".to_string(),
            node_radius: (4.0, 12.0),
        }
    }

    /// Page title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Radius range that display sizes are mapped onto.
    pub fn with_node_radius(mut self, min: f64, max: f64) -> Self {
        self.node_radius = (min, max);
        self
    }

    /// Render the page, grouping nodes by `group_by`.
    pub fn render_html(
        &self,
        graph: &AnnotatedGraph,
        layout: &Layout,
        group_by: LabelField,
    ) -> Result<String> {
        if layout.len() != graph.node_count() {
            return Err(Error::DimensionMismatch {
                expected: graph.node_count(),
                found: layout.len(),
            });
        }

        let groups = graph.group_sizes(group_by);
        let colors = group_colors(&groups);
        let (min_size, max_size) = graph.nodes().fold((f64::MAX, f64::MIN), |(lo, hi), n| {
            (lo.min(n.size), hi.max(n.size))
        });
        let (r_lo, r_hi) = self.node_radius;

        let nodes = graph
            .nodes()
            .enumerate()
            .map(|(id, node)| {
                let (x, y) = layout.position(id);
                let group = node.label(group_by);
                let radius = if max_size - min_size > 1e-12 {
                    r_lo + (node.size - min_size) / (max_size - min_size) * (r_hi - r_lo)
                } else {
                    (r_lo + r_hi) / 2.0
                };
                ViewNode {
                    id,
                    name: &node.name,
                    group,
                    size: node.size,
                    radius,
                    x,
                    y,
                    color: colors.get(&group).cloned().unwrap_or_default(),
                    kmeans: node.kmeans,
                    hclust: node.hierarchical,
                    community: node.community,
                }
            })
            .collect();

        let data = ViewData {
            field: group_by.name(),
            nodes,
            links: graph
                .edges()
                .map(|(source, target, weight)| ViewLink {
                    source,
                    target,
                    weight,
                })
                .collect(),
            groups: groups
                .iter()
                .map(|(&label, &count)| ViewGroup {
                    label,
                    color: colors.get(&label).cloned().unwrap_or_default(),
                    count,
                })
                .collect(),
        };

        let json = serde_json::to_string(&data)?;
        // Keep the payload from closing its <script> element early
        let json = json.replace("</", "<\\/");

        let (head, tail) = TEMPLATE
            .split_once(DATA_SLOT)
            .ok_or_else(|| Error::Other("interactive template lacks a data slot".into()))?;
        let title = escape_xml(&self.title);

        let mut html = String::with_capacity(TEMPLATE.len() + json.len());
        html.push_str(&head.replace(TITLE_SLOT, &title));
        html.push_str(&json);
        html.push_str(&tail.replace(TITLE_SLOT, &title));
        Ok(html)
    }
}

impl Default for InteractiveView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::{DisplaySizes, Labeling};
    use crate::graph::build_graph;
    use crate::layout::ForceLayout;
    use crate::matrix::SimilarityMatrix;

    fn annotated(names: Vec<String>) -> AnnotatedGraph {
        let m = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.8, 0.0],
            vec![0.8, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap()
        .with_names(names.clone())
        .unwrap();
        let g = build_graph(&m, 0.5).unwrap();
        let km = Labeling::from_labels(LabelField::Kmeans, &names, Label::from_assignment(&[0, 0, 1])).unwrap();
        let hc = Labeling::from_labels(LabelField::Hierarchical, &names, Label::from_assignment(&[0, 1, 1])).unwrap();
        let co = Labeling::from_labels(
            LabelField::Community,
            &names,
            vec![Label::Cluster(1), Label::Cluster(1), Label::Unassigned],
        )
        .unwrap();
        let sizes: DisplaySizes = names.iter().cloned().zip([1.0, 2.0, 3.0]).collect();
        AnnotatedGraph::annotate(&g, &km, &hc, &co, &sizes).unwrap()
    }

    fn embedded_json(html: &str) -> serde_json::Value {
        let start = html.find(r#"id="graph-data">"#).unwrap() + r#"id="graph-data">"#.len();
        let end = start + html[start..].find("</script>").unwrap();
        serde_json::from_str(&html[start..end]).unwrap()
    }

    #[test]
    fn test_page_embeds_graph() {
        let ag = annotated(vec!["a".into(), "b".into(), "c".into()]);
        let layout = ForceLayout::new().with_iterations(10).compute(ag.graph());
        let html = InteractiveView::new()
            .with_title("Communities")
            .render_html(&ag, &layout, LabelField::Community)
            .unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(!html.contains(DATA_SLOT));
        assert!(!html.contains(TITLE_SLOT));
        assert!(html.contains("<title>Communities</title>"));
        assert!(!html.contains("src=\"http"));

        let data = embedded_json(&html);
        assert_eq!(data["field"], "community");
        assert_eq!(data["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(data["links"].as_array().unwrap().len(), 1);
        assert_eq!(data["nodes"][2]["group"], "unassigned");
        assert_eq!(data["nodes"][2]["kmeans"], "2");
        assert_eq!(data["nodes"][1]["hclust"], "2");
        assert_eq!(data["groups"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_script_close_in_name_is_escaped() {
        let ag = annotated(vec!["</script>".into(), "b".into(), "c".into()]);
        let layout = ForceLayout::new().with_iterations(10).compute(ag.graph());
        let html = InteractiveView::new()
            .render_html(&ag, &layout, LabelField::Kmeans)
            .unwrap();
        let data = embedded_json(&html);
        assert_eq!(data["nodes"][0]["name"], "</script>");
    }
}
