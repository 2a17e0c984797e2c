//! Result, facet and diagnostics queries for one filter state.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::EngineError;

pub mod predicate;
pub mod search_sql;

mod search_for_results;
pub use search_for_results::search_for_results;

mod search_facets;
pub use search_facets::{compute_facets, facet_dimensions};

pub mod diagnostics;

/// Races a store call against the request's cancellation token.
pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = anyhow::Result<T>>,
) -> Result<T, EngineError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(EngineError::Cancelled),
        result = call => result.map_err(EngineError::Execution),
    }
}
