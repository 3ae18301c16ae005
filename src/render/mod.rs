//! Views of an annotated graph.
//!
//! Renderers take the [`AnnotatedGraph`](crate::AnnotatedGraph) and a
//! [`Layout`](crate::layout::Layout) and return a document as a `String`;
//! they keep no state between calls.
//!
//! - [`StaticPlot`]: SVG, nodes coloured by one label field
//! - [`InteractiveView`]: single self-contained HTML file with filtering,
//!   neighbourhood highlighting and node selection

mod interactive;
mod static_plot;

pub use interactive::InteractiveView;
pub use static_plot::StaticPlot;

use crate::label::Label;
use std::collections::BTreeMap;

/// Categorical palette, cycled when there are more groups than colours.
const GROUP_COLORS: [(u8, u8, u8); 12] = [
    (228, 26, 28),
    (55, 126, 184),
    (77, 175, 74),
    (152, 78, 163),
    (255, 127, 0),
    (166, 86, 40),
    (247, 129, 191),
    (0, 139, 139),
    (188, 189, 34),
    (31, 58, 147),
    (214, 39, 40),
    (102, 102, 51),
];

/// Colour of `unassigned` nodes.
const UNASSIGNED_COLOR: (u8, u8, u8) = (189, 189, 189);

/// Hex colour for every group, in label order.
pub(crate) fn group_colors(groups: &BTreeMap<Label, usize>) -> BTreeMap<Label, String> {
    let mut next = 0;
    groups
        .keys()
        .map(|&label| {
            let (r, g, b) = if label.is_unassigned() {
                UNASSIGNED_COLOR
            } else {
                let c = GROUP_COLORS[next % GROUP_COLORS.len()];
                next += 1;
                c
            };
            (label, format!("#{r:02x}{g:02x}{b:02x}"))
        })
        .collect()
}

pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unassigned_is_grey() {
        let groups: BTreeMap<Label, usize> =
            [(Label::Cluster(1), 3), (Label::Cluster(2), 2), (Label::Unassigned, 4)].into();
        let colors = group_colors(&groups);
        assert_eq!(colors[&Label::Unassigned], "#bdbdbd");
        assert_eq!(colors[&Label::Cluster(1)], "#e41a1c");
        assert_eq!(colors[&Label::Cluster(2)], "#377eb8");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }
}
