//! Navigation API endpoint.
//!
//! Returns the active navigation tree.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use cms_store::NavigationNode;
use serde::Serialize;

use crate::error::ServerError;
use crate::state::AppState;

/// Response for GET /api/navigation.
#[derive(Serialize)]
pub(crate) struct NavigationResponse {
    /// Navigation tree items.
    items: Vec<NavigationNode>,
}

/// Handle GET /api/navigation.
pub(crate) async fn get_navigation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<NavigationResponse>, ServerError> {
    let items = state.store.navigation_tree().await?;
    Ok(Json(NavigationResponse { items }))
}
