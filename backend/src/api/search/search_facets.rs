//! Facet values and counts for every dimension of a filter state.

use std::collections::HashSet;

use common::{
    Dimension,
    dimension::ValueOrdering,
    filter_state::FilterState,
    search_result::{Facet, FacetCollection, FacetOriginalValue, FacetValue},
    url_codec::canonical_url,
};
use tokio_util::sync::CancellationToken;

use crate::{
    api::search::{
        cancellable,
        diagnostics::{DiagnosticRecord, Diagnostics},
        predicate::{Predicate, build_predicate_without, value_predicate},
    },
    db_utils::item_store::ItemStore,
    error::EngineError,
};

/// Dimensions shown for `state`. Month needs a year (or a selected month),
/// day needs a month (or a selected day).
pub fn facet_dimensions(state: &FilterState) -> Vec<Dimension> {
    Dimension::ALL
        .into_iter()
        .filter(|dimension| match dimension {
            Dimension::Month => state.year().is_some() || state.month().is_some(),
            Dimension::Day => state.month().is_some() || state.day().is_some(),
            _ => true,
        })
        .collect()
}

/// Computes all visible facets concurrently.
///
/// A dimension whose store query fails is left out of `facets`, listed in
/// `omitted` and recorded; only cancellation fails the whole computation.
pub async fn compute_facets<S: ItemStore>(
    store: &S,
    state: &FilterState,
    value_limit: usize,
    cancel: &CancellationToken,
    diagnostics: &mut Diagnostics,
) -> Result<FacetCollection, EngineError> {
    let start_time = std::time::Instant::now();
    let dimensions = facet_dimensions(state);
    let results = futures::future::join_all(
        dimensions.iter().map(|dimension| search_dimension_facet(store, state, *dimension, value_limit, cancel)),
    )
    .await;

    let mut collection = FacetCollection::default();
    for (dimension, result) in dimensions.into_iter().zip(results) {
        match result {
            Ok(facet) => collection.facets.push(facet),
            Err(EngineError::Cancelled) => return Err(EngineError::Cancelled),
            Err(e) => {
                diagnostics.record(DiagnosticRecord::FacetOmitted { dimension, error: e.to_string() });
                collection.omitted.push(dimension);
            }
        }
    }

    tracing::debug!(
        facets = collection.facets.len(),
        omitted = collection.omitted.len(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "compute_facets"
    );
    Ok(collection)
}

pub async fn search_dimension_facet<S: ItemStore>(
    store: &S,
    state: &FilterState,
    dimension: Dimension,
    value_limit: usize,
    cancel: &CancellationToken,
) -> Result<Facet, EngineError> {
    // other dimensions keep filtering; this one is relaxed so its unselected
    // values stay visible
    let base = build_predicate_without(state, dimension);
    let groups = cancellable(cancel, store.group_counts(dimension, &base, value_limit)).await?;

    let mut present_values = HashSet::new();
    let mut values = Vec::new();
    for (value, count) in groups {
        if !present_values.insert(value.clone()) {
            continue;
        }
        values.push(facet_value(state, dimension, value, count));
    }

    for selected in state.selected_values(dimension) {
        if present_values.contains(&selected) {
            continue;
        }
        let predicate = Predicate::and(vec![base.clone(), value_predicate(dimension, &selected)]);
        let count = cancellable(cancel, store.count(&predicate)).await?;
        present_values.insert(selected.clone());
        values.push(facet_value(state, dimension, selected, count));
    }

    sort_facet_values(dimension, &mut values);
    let descriptor = dimension.descriptor();
    Ok(Facet { dimension, id: descriptor.id.to_string(), label: descriptor.label.to_string(), values })
}

fn facet_value(state: &FilterState, dimension: Dimension, value: FacetOriginalValue, count: u64) -> FacetValue {
    let selected = state.is_selected(dimension, &value);
    let target = if selected { state.without_value(dimension, &value) } else { state.with_value(dimension, &value) };
    FacetValue {
        label: dimension.value_label(&value),
        url: canonical_url(&target),
        enabled: count > 0 || selected,
        count,
        selected,
        value,
    }
}

fn sort_facet_values(dimension: Dimension, values: &mut [FacetValue]) {
    match dimension.descriptor().ordering {
        ValueOrdering::NaturalDescending => values.sort_by(|a, b| b.value.cmp(&a.value)),
        ValueOrdering::CountDescending => {
            values.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)))
        }
    }
}
