use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use common::search_result::NavigationPage;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    api::navigate::{NavigationRequest, Navigator},
    db_utils::item_store::ItemStore,
    error::EngineError,
};

/// Total of the page the client came from, used for zero-result diagnostics.
pub const PREVIOUS_TOTAL_HEADER: &str = "x-previous-total";

pub fn navigation_router<S: ItemStore + 'static>(navigator: Arc<Navigator<S>>) -> Router {
    Router::new()
        .route("/", get(navigate_route::<S>))
        .route("/{*path}", get(navigate_route::<S>))
        .with_state(navigator)
}

pub fn status_for(error: &EngineError) -> StatusCode {
    match error {
        EngineError::Decode(_) => StatusCode::BAD_REQUEST,
        EngineError::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn _navigate<S: ItemStore>(
    navigator: &Navigator<S>,
    request: &NavigationRequest,
) -> Result<NavigationPage, EngineError> {
    let cancel = CancellationToken::new();
    // a dropped handler (client gone) cancels whatever is still in flight
    let _guard = cancel.clone().drop_guard();
    tokio::select! {
        result = navigator.navigate(request, &cancel) => result,
        _ = tokio::time::sleep(navigator.config().request_timeout) => {
            cancel.cancel();
            Err(EngineError::Cancelled)
        }
    }
}

pub async fn navigate_route<S: ItemStore + 'static>(
    State(navigator): State<Arc<Navigator<S>>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let request = NavigationRequest {
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
        previous_total: headers
            .get(PREVIOUS_TOTAL_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok()),
    };
    info!("Navigating: {}", uri);

    match _navigate(&navigator, &request).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                tracing::error!("navigate_route: request failed: {:#}", e);
            }
            let body = serde_json::json!({ "error": e.kind(), "message": e.to_string() });
            (status, Json(body)).into_response()
        }
    }
}
