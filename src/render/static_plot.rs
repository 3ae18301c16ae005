use super::{escape_xml, group_colors};
use crate::annotate::AnnotatedGraph;
use crate::error::{Error, Result};
use crate::label::LabelField;
use crate::layout::Layout;
use std::fmt::Write as _;

const LEGEND_WIDTH: f64 = 140.0;

/// Static SVG network plot.
#[derive(Debug, Clone)]
pub struct StaticPlot {
    color_by: LabelField,
    width: u32,
    height: u32,
    margin: f64,
    edge_opacity: f64,
    edge_width: f64,
    curved_edges: bool,
    node_radius: (f64, f64),
    title: Option<String>,
}

impl StaticPlot {
    /// Plot coloured by `color_by`, 900×700 px, straight faint edges.
    pub fn new(color_by: LabelField) -> Self {
        Self {
            color_by,
            width: 900,
            height: 700,
            margin: 20.0,
            edge_opacity: 0.3,
            edge_width: 0.6,
            curved_edges: false,
            node_radius: (3.0, 9.0),
            title: None,
        }
    }

    /// Set image size in pixels.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set edge stroke opacity in `[0, 1]`.
    pub fn with_edge_opacity(mut self, opacity: f64) -> Self {
        self.edge_opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Set edge stroke width in pixels.
    pub fn with_edge_width(mut self, width: f64) -> Self {
        self.edge_width = width;
        self
    }

    /// Draw edges as arcs instead of straight lines.
    pub fn with_curved_edges(mut self, curved: bool) -> Self {
        self.curved_edges = curved;
        self
    }

    /// Radius range that display sizes are mapped onto.
    pub fn with_node_radius(mut self, min: f64, max: f64) -> Self {
        self.node_radius = (min, max);
        self
    }

    /// Title drawn at the top left.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Render `graph` at the positions of `layout`.
    pub fn render_svg(&self, graph: &AnnotatedGraph, layout: &Layout) -> Result<String> {
        if layout.len() != graph.node_count() {
            return Err(Error::DimensionMismatch {
                expected: graph.node_count(),
                found: layout.len(),
            });
        }

        let (w, h) = (self.width as f64, self.height as f64);
        let top = if self.title.is_some() { 30.0 } else { 0.0 };
        let plot_w = (w - LEGEND_WIDTH - 2.0 * self.margin).max(1.0);
        let plot_h = (h - top - 2.0 * self.margin).max(1.0);
        let to_px = |(x, y): (f64, f64)| {
            (
                self.margin + x * plot_w,
                top + self.margin + y * plot_h,
            )
        };

        let groups = graph.group_sizes(self.color_by);
        let colors = group_colors(&groups);

        let (min_size, max_size) = graph.nodes().fold((f64::MAX, f64::MIN), |(lo, hi), n| {
            (lo.min(n.size), hi.max(n.size))
        });
        let radius = |size: f64| {
            let (r_lo, r_hi) = self.node_radius;
            if max_size - min_size > 1e-12 {
                r_lo + (size - min_size) / (max_size - min_size) * (r_hi - r_lo)
            } else {
                (r_lo + r_hi) / 2.0
            }
        };

        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
  text {{ font-family: 'DejaVu Sans', Arial, sans-serif; font-size: 12px; }}
  .title {{ font-size: 16px; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="white"/>
"#,
            self.width, self.height, self.width, self.height
        );

        if let Some(title) = &self.title {
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="22" class="title">{}</text>"#,
                self.margin,
                escape_xml(title)
            );
        }

        // Edges below nodes
        let _ = writeln!(
            svg,
            r##"<g fill="none" stroke="#555555" stroke-opacity="{:.2}" stroke-width="{:.2}">"##,
            self.edge_opacity, self.edge_width
        );
        for (s, t, _) in graph.edges() {
            let (x1, y1) = to_px(layout.position(s));
            let (x2, y2) = to_px(layout.position(t));
            if self.curved_edges {
                // Control point offset perpendicular to the chord
                let (mx, my) = ((x1 + x2) / 2.0, (y1 + y2) / 2.0);
                let (cx, cy) = (mx - (y2 - y1) * 0.2, my + (x2 - x1) * 0.2);
                let _ = writeln!(
                    svg,
                    r#"<path d="M{x1:.2},{y1:.2} Q{cx:.2},{cy:.2} {x2:.2},{y2:.2}"/>"#
                );
            } else {
                let _ = writeln!(
                    svg,
                    r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}"/>"#
                );
            }
        }
        svg.push_str("</g>\n");

        svg.push_str("<g stroke=\"white\" stroke-width=\"0.5\">\n");
        for (i, node) in graph.nodes().enumerate() {
            let (x, y) = to_px(layout.position(i));
            let label = node.label(self.color_by);
            let fill = colors.get(&label).map(String::as_str).unwrap_or("#000000");
            let _ = writeln!(
                svg,
                r#"<circle cx="{x:.2}" cy="{y:.2}" r="{:.2}" fill="{fill}"><title>{} ({}: {})</title></circle>"#,
                radius(node.size),
                escape_xml(&node.name),
                self.color_by.name(),
                label
            );
        }
        svg.push_str("</g>\n");

        // Legend
        let lx = w - LEGEND_WIDTH + 10.0;
        let mut ly = top + self.margin + 10.0;
        let _ = writeln!(
            svg,
            r#"<text x="{lx:.2}" y="{ly:.2}" font-weight="bold">{}</text>"#,
            self.color_by.name()
        );
        for (label, count) in &groups {
            ly += 18.0;
            if ly > h - self.margin {
                let _ = writeln!(svg, r#"<text x="{lx:.2}" y="{ly:.2}">…</text>"#);
                break;
            }
            let fill = colors.get(label).map(String::as_str).unwrap_or("#000000");
            let _ = writeln!(
                svg,
                r#"<circle cx="{:.2}" cy="{:.2}" r="5" fill="{fill}"/><text x="{:.2}" y="{:.2}">{label} ({count})</text>"#,
                lx + 5.0,
                ly - 4.0,
                lx + 16.0,
                ly
            );
        }

        svg.push_str("</svg>\n");
        Ok(svg)
    }
}
