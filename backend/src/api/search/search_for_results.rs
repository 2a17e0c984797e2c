//! Result page for a filter state.

use common::{filter_state::FilterState, search_result::ResultPage};
use tokio_util::sync::CancellationToken;

use crate::{
    api::search::{cancellable, predicate::build_predicate},
    db_utils::item_store::ItemStore,
    error::EngineError,
};

pub async fn search_for_results<S: ItemStore>(
    store: &S,
    state: &FilterState,
    cancel: &CancellationToken,
) -> Result<ResultPage, EngineError> {
    let start_time = std::time::Instant::now();
    let predicate = build_predicate(state);
    let (limit, offset) = (state.limit(), state.offset());

    let (total, items) = tokio::try_join!(
        cancellable(cancel, store.count(&predicate)),
        cancellable(cancel, store.fetch_page(&predicate, limit, offset)),
    )?;

    tracing::debug!(
        total,
        returned = items.len(),
        limit,
        offset,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "search_for_results"
    );
    Ok(ResultPage::new(items, total, limit, offset))
}
