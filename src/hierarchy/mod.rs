//! Tree structures produced by agglomerative clustering.
//!
//! ```text
//!         ┌────┴────┐         height
//!       ┌─┴─┐       │          2.0
//!       │ ┌─┴─┐   ┌─┴─┐        1.0
//!       a b   c   d   e        0.0
//! ```
//!
//! A [`Dendrogram`] records the merge history; cutting it at a height (or to
//! a cluster count) yields a flat partition. The clusterer that builds it
//! lives in [`crate::cluster`].

mod dendrogram;

pub use dendrogram::{Dendrogram, Merge};
