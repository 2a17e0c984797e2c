//! Read interface over the photo catalogue.

use std::future::Future;

use common::{Dimension, search_result::{FacetOriginalValue, ItemSummary}};

use crate::api::search::predicate::Predicate;

/// Store queried by the result executor and the facet computer.
///
/// Each call is an independent read; implementations hand out a fresh read
/// handle per call so concurrent facet queries never share mutable state.
pub trait ItemStore: Send + Sync {
    /// Matching items ordered by date taken descending (undated last), then
    /// id ascending.
    fn fetch_page(
        &self,
        predicate: &Predicate,
        limit: u64,
        offset: u64,
    ) -> impl Future<Output = anyhow::Result<Vec<ItemSummary>>> + Send;

    fn count(&self, predicate: &Predicate) -> impl Future<Output = anyhow::Result<u64>> + Send;

    /// Every value of `dimension` present in the store, with the number of
    /// items that carry it and match `predicate`. Most frequent first, at
    /// most `limit` groups; values no matching item carries count 0. Items
    /// without a value are skipped.
    fn group_counts(
        &self,
        dimension: Dimension,
        predicate: &Predicate,
        limit: usize,
    ) -> impl Future<Output = anyhow::Result<Vec<(FacetOriginalValue, u64)>>> + Send;
}
