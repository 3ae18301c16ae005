//! Clustering over matrix rows.

use crate::error::Result;
use crate::label::Label;

/// A clusterer that assigns every feature row to one flat group.
pub trait Clustering {
    /// Fit to `data` and return one 0-based cluster index per row.
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>>;

    /// Requested cluster count, 0 when a height cut decides it.
    fn n_clusters(&self) -> usize;

    /// Like [`fit_predict`](Clustering::fit_predict), as 1-based [`Label`]s.
    fn fit_labels(&self, data: &[Vec<f32>]) -> Result<Vec<Label>> {
        Ok(Label::from_assignment(&self.fit_predict(data)?))
    }
}
