//! Cluster labels shared by every clustering method.

use core::fmt;
use serde::{Serialize, Serializer};

/// A node's group under one clustering method.
///
/// Ids are 1-based, as presented to readers. Clusterers work with 0-based
/// `usize` vectors and convert through [`Label::from_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    /// Member of cluster `id` (1-based).
    Cluster(usize),
    /// Not placed in any multi-member group.
    Unassigned,
}

impl Label {
    /// Label for 0-based cluster index `idx`.
    pub fn from_index(idx: usize) -> Self {
        Label::Cluster(idx + 1)
    }

    /// Convert a 0-based assignment vector.
    pub fn from_assignment(assignment: &[usize]) -> Vec<Self> {
        assignment.iter().map(|&i| Self::from_index(i)).collect()
    }

    /// Whether this is the `unassigned` sentinel.
    pub fn is_unassigned(&self) -> bool {
        matches!(self, Label::Unassigned)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Cluster(id) => write!(f, "{id}"),
            Label::Unassigned => write!(f, "unassigned"),
        }
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Which label of an annotated node to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelField {
    /// Partition (k-means) label.
    Kmeans,
    /// Hierarchical cut label.
    Hierarchical,
    /// Community label after singleton relabeling.
    Community,
}

impl LabelField {
    /// Short name used in file headers and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            LabelField::Kmeans => "kmeans",
            LabelField::Hierarchical => "hclust",
            LabelField::Community => "community",
        }
    }
}
