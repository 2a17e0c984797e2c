//! One navigation request: decode the address, query results and facets,
//! and assemble the page.

use std::sync::Arc;

use common::{
    breadcrumbs::{ActiveFilterChip, active_filter_chips, build_breadcrumbs, page_title},
    filter_state::FilterState,
    search_result::{NavigationPage, PageLinks, ResultPage},
    url_codec::{canonical_url, decode, page_url},
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{
    api::search::{
        cancellable, compute_facets,
        diagnostics::{
            DiagnosticRecord, Diagnostics, TransitionLog, check_facet_invariants, check_suspicious_zero_result,
        },
        predicate::build_predicate,
        search_for_results,
    },
    config::EngineConfig,
    db_utils::item_store::ItemStore,
    error::EngineError,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationRequest {
    pub path: String,
    /// Raw query string, with or without the leading `?`.
    pub query: String,
    /// Total shown on the page the user navigated from, if the caller knows it.
    pub previous_total: Option<u64>,
}

impl NavigationRequest {
    pub fn new(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self { path: path.into(), query: query.into(), previous_total: None }
    }

    pub fn with_previous_total(mut self, previous_total: u64) -> Self {
        self.previous_total = Some(previous_total);
        self
    }
}

pub struct Navigator<S> {
    store: S,
    config: Arc<EngineConfig>,
}

impl<S: ItemStore> Navigator<S> {
    pub fn new(store: S, config: Arc<EngineConfig>) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn navigate(
        &self,
        request: &NavigationRequest,
        cancel: &CancellationToken,
    ) -> Result<NavigationPage, EngineError> {
        self.navigate_with_diagnostics(request, cancel).await.0
    }

    /// Same as [`Navigator::navigate`], also returning the diagnostic records
    /// raised while serving the request.
    pub async fn navigate_with_diagnostics(
        &self,
        request: &NavigationRequest,
        cancel: &CancellationToken,
    ) -> (Result<NavigationPage, EngineError>, Vec<DiagnosticRecord>) {
        let start_time = std::time::Instant::now();
        let mut diagnostics = Diagnostics::default();
        let result = self.serve(request, cancel, &mut diagnostics).await;
        tracing::info!(
            path = %request.path,
            query = %request.query,
            outcome = match &result {
                Ok(_) => "ok",
                Err(e) => e.kind(),
            },
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "navigate"
        );
        (result, diagnostics.into_records())
    }

    async fn serve(
        &self,
        request: &NavigationRequest,
        cancel: &CancellationToken,
        diagnostics: &mut Diagnostics,
    ) -> Result<NavigationPage, EngineError> {
        let state = match decode(&request.path, &request.query) {
            Ok(state) => state,
            Err(e) => {
                diagnostics.record(DiagnosticRecord::ParseFailed {
                    path: request.path.clone(),
                    query: request.query.clone(),
                    error: e.to_string(),
                });
                return Err(e.into());
            }
        };

        let results = match search_for_results(&self.store, &state, cancel).await {
            Ok(results) => results,
            Err(EngineError::Execution(e)) => {
                diagnostics.record(DiagnosticRecord::ExecutionFailed {
                    path: request.path.clone(),
                    query: request.query.clone(),
                    state: state.clone(),
                    error: format!("{e:#}"),
                });
                return Err(EngineError::Execution(e));
            }
            Err(e) => return Err(e),
        };

        let facets = compute_facets(&self.store, &state, self.config.facet_value_limit, cancel, diagnostics).await?;

        if results.total == 0 {
            diagnostics.record(DiagnosticRecord::NoResults {
                path: request.path.clone(),
                query: request.query.clone(),
                state: state.clone(),
            });
        }
        if let Some(record) = check_suspicious_zero_result(
            &request.path,
            &request.query,
            results.total,
            request.previous_total,
            self.config.suspicious_zero_result_threshold,
        ) {
            diagnostics.record(record);
        }
        for record in check_facet_invariants(&facets) {
            diagnostics.record(record);
        }

        let active_filters = active_filter_chips(&state);
        let removal_counts = self.removal_counts(&state, &active_filters, cancel, diagnostics).await?;
        let transitions = TransitionLog::new(&state, &results, &facets, &active_filters, &removal_counts);
        diagnostics.record(DiagnosticRecord::transitions(&transitions));

        Ok(NavigationPage {
            title: page_title(&state),
            canonical_url: canonical_url(&state),
            breadcrumbs: build_breadcrumbs(&state),
            pagination: page_links(&state, &results),
            active_filters,
            results,
            facets,
            state,
        })
    }

    /// Totals after removing each active value; a failed count is recorded
    /// and left unknown.
    async fn removal_counts(
        &self,
        state: &FilterState,
        chips: &[ActiveFilterChip],
        cancel: &CancellationToken,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<Option<u64>>, EngineError> {
        let counts = futures::future::join_all(chips.iter().map(|chip| {
            let predicate = build_predicate(&state.without_value(chip.dimension, &chip.value));
            async move { cancellable(cancel, self.store.count(&predicate)).await }
        }))
        .await;
        let mut removal_counts = Vec::with_capacity(chips.len());
        for (chip, count) in chips.iter().zip(counts) {
            match count {
                Ok(count) => removal_counts.push(Some(count)),
                Err(EngineError::Cancelled) => return Err(EngineError::Cancelled),
                Err(e) => {
                    diagnostics.record(DiagnosticRecord::RemovalCountFailed {
                        dimension: chip.dimension,
                        value: chip.value.clone(),
                        error: e.to_string(),
                    });
                    removal_counts.push(None);
                }
            }
        }
        Ok(removal_counts)
    }
}

fn page_links(state: &FilterState, results: &ResultPage) -> PageLinks {
    let page = state.page_number();
    PageLinks {
        page,
        prev_url: (page > 1).then(|| page_url(state, page - 1)),
        next_url: results.has_more.then(|| page_url(state, page + 1)),
    }
}
