//! Presentation labels for a community partition.
//!
//! A community with a single member carries no grouping information, so it is
//! shown as [`Label::Unassigned`]. This covers both isolated nodes and
//! connected nodes that the detector left alone. The partition itself is not
//! touched; only its display labels change.

use crate::label::Label;
use std::collections::HashMap;

/// Member count of each community id.
pub fn community_sizes(partition: &[usize]) -> HashMap<usize, usize> {
    let mut sizes = HashMap::new();
    for &c in partition {
        *sizes.entry(c).or_insert(0) += 1;
    }
    sizes
}

/// Display labels: singletons become `unassigned`, other communities are
/// numbered `1, 2, ...` in order of first appearance.
pub fn relabel_singletons(partition: &[usize]) -> Vec<Label> {
    let sizes = community_sizes(partition);
    let mut ids: HashMap<usize, usize> = HashMap::new();

    partition
        .iter()
        .map(|c| {
            if sizes[c] == 1 {
                Label::Unassigned
            } else {
                let next = ids.len();
                Label::from_index(*ids.entry(*c).or_insert(next))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singletons_become_unassigned() {
        let labels = relabel_singletons(&[4, 4, 0, 2, 2, 2, 7]);
        assert_eq!(
            labels,
            vec![
                Label::Cluster(1),
                Label::Cluster(1),
                Label::Unassigned,
                Label::Cluster(2),
                Label::Cluster(2),
                Label::Cluster(2),
                Label::Unassigned,
            ]
        );
    }

    #[test]
    fn test_no_group_of_size_one_and_count_conserved() {
        let partition = [0, 1, 1, 2, 3, 3, 3, 4];
        let labels = relabel_singletons(&partition);
        assert_eq!(labels.len(), partition.len());

        let mut counts: HashMap<Label, usize> = HashMap::new();
        for l in &labels {
            *counts.entry(*l).or_insert(0) += 1;
        }
        for (label, count) in counts {
            if !label.is_unassigned() {
                assert!(count > 1, "{label} has a single member");
            }
        }
    }

    #[test]
    fn test_partition_untouched() {
        let partition = vec![0, 1, 1];
        let _ = relabel_singletons(&partition);
        assert_eq!(partition, vec![0, 1, 1]);
    }
}
