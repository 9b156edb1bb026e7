//! Document retrieval endpoint — streams a blob from its shard.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use crate::api::error::ApiError;
use crate::documents;
use crate::state::AppState;

/// `GET /api/documents/{id}` — raw document bytes from the sharded
/// blob store. The stored documents are PDFs.
pub async fn fetch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = documents::fetch_document(&state.shards_dir, id)?;
    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes))
}
