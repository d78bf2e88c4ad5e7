//! Page endpoints.
//!
//! Serves rendered HTML pages and their JSON render contexts. An empty
//! permalink addresses the home page.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Response};
use cms_store::PageContext;

use crate::error::ServerError;
use crate::handlers::{compute_etag, etag_matches};
use crate::state::AppState;
use crate::template;

/// Handle GET / (home page).
pub(crate) async fn get_home(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    render_html(String::new(), &state, &headers).await
}

/// Handle GET /{permalink}.
pub(crate) async fn get_page(
    Path(permalink): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    render_html(permalink, &state, &headers).await
}

/// Handle GET /api/pages/ (home page context).
pub(crate) async fn get_root_page_data(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    page_data(String::new(), &state, &headers).await
}

/// Handle GET /api/pages/{permalink}.
pub(crate) async fn get_page_data(
    Path(permalink): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    page_data(permalink, &state, &headers).await
}

/// Fallback for paths no route matches.
pub(crate) async fn not_found(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    (
        StatusCode::NOT_FOUND,
        Html(template::render_not_found(path)),
    )
        .into_response()
}

/// Load the render context for `permalink`.
async fn load_context(permalink: &str, state: &AppState) -> Result<PageContext, ServerError> {
    let context = state
        .store
        .page_context(permalink, &state.analytics_code)
        .await
        .map_err(ServerError::from);

    if state.verbose
        && let Err(ServerError::PageNotFound(missing)) = &context
    {
        tracing::warn!(permalink = %missing, "Page not found");
    }

    context
}

/// Render the page as HTML; a missing page renders the not-found page.
async fn render_html(
    permalink: String,
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Response, ServerError> {
    let context = match load_context(&permalink, state).await {
        Ok(context) => context,
        Err(ServerError::PageNotFound(missing)) => {
            return Ok((
                StatusCode::NOT_FOUND,
                Html(template::render_not_found(&missing)),
            )
                .into_response());
        }
        Err(e) => return Err(e),
    };

    let html = template::render_page(&context);
    Ok(with_etag(&state.version, html, headers, |body| {
        Html(body).into_response()
    }))
}

/// Return the page context as JSON.
async fn page_data(
    permalink: String,
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Response, ServerError> {
    let context = load_context(&permalink, state).await?;
    let body = serde_json::to_string(&context)?;

    Ok(with_etag(&state.version, body, headers, |body| {
        ([(header::CONTENT_TYPE, "application/json")], body).into_response()
    }))
}

/// Attach an `ETag` to `body`, answering 304 when the client already has it.
fn with_etag(
    version: &str,
    body: String,
    headers: &HeaderMap,
    respond: impl FnOnce(String) -> Response,
) -> Response {
    let etag = compute_etag(version, &body);

    if etag_matches(headers, &etag) {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
    }

    (
        [
            (header::ETAG, etag),
            (header::CACHE_CONTROL, "private, max-age=60".to_owned()),
        ],
        respond(body),
    )
        .into_response()
}
