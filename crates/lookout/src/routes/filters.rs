//! Category navigation endpoints.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::Uri,
    Json,
};
use serde::Serialize;

use argus_common::{ActiveSelection, ArgusError, RenderItem};
use super::ApiError;
use crate::categories::CategoryTreeFilter;
use crate::state::AppState;

#[derive(Serialize)]
pub struct FilterResponse {
    filter: String,
    /// Aliases currently selected, as decoded from the URL
    selection: ActiveSelection,
    items: Vec<RenderItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    canonical_url: Option<String>,
}

/// Render a filter with nothing selected
pub async fn render_filter(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<FilterResponse>, ApiError> {
    render(&state, &name, ActiveSelection::default())
}

/// Render a filter for `/{param}/{aliases}`.
///
/// The alias segment is read from the raw path so that an escaped
/// separator inside an alias is not mistaken for a real one.
pub async fn render_filtered(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    uri: Uri,
) -> Result<Json<FilterResponse>, ApiError> {
    let name = params.get("name").map(String::as_str).unwrap_or_default();
    let filter = state
        .config
        .filter(name)
        .ok_or_else(|| ArgusError::NotFound(format!("filter '{}'", name)))?;

    if params.get("param") != Some(&filter.param_name) {
        return Err(ArgusError::NotFound(format!("filter parameter for '{}'", name)).into());
    }

    let raw_segment = uri.path().rsplit('/').next().unwrap_or_default();
    let selection = ActiveSelection::decode(raw_segment, &filter.separator);

    render(&state, name, selection)
}

fn render(
    state: &AppState,
    name: &str,
    selection: ActiveSelection,
) -> Result<Json<FilterResponse>, ApiError> {
    let config = state
        .config
        .filter(name)
        .ok_or_else(|| ArgusError::NotFound(format!("filter '{}'", name)))?;

    let filter = CategoryTreeFilter::new(state.catalog.as_ref(), &config.target_page, config);
    let items = filter.render(config.root_id, &selection);
    let canonical_url = filter.canonical_url(config.root_id, &selection);

    state.metrics.record_render();
    tracing::debug!(
        filter = %name,
        selected = selection.len(),
        items = items.len(),
        "Rendered category navigation"
    );

    Ok(Json(FilterResponse {
        filter: name.to_string(),
        selection,
        items,
        canonical_url,
    }))
}
