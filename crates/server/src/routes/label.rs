use crate::error::{ServerError, ServerResult};
use crate::middleware::RequestId;
use crate::routes::KeyQuery;
use crate::state::ServerState;
use axum::extract::{Query, State};
use axum::Extension;
use cache::DocumentKind;
use std::path::PathBuf;
use std::sync::Arc;

/// Barcode label (GET /sampleIdToBarCode?key=...)
///
/// Renders the key as a 200x200 Code 128 PNG, publishes it as `<key>.png`
/// in the cache directory and reports where it landed.
pub async fn sample_id_to_barcode(
    State(state): State<Arc<ServerState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<Vec<(String, String)>>,
) -> ServerResult<String> {
    let key = KeyQuery::from_pairs(params).require_key()?;
    let directory = state.cache_dir().to_path_buf();
    let file_name = DocumentKind::Barcode.file_name(&key);
    let raw_key = key.to_string();

    let path = tokio::task::spawn_blocking(move || -> ServerResult<PathBuf> {
        let png = barcode::render_png(&raw_key)?;
        let mut bytes = png.as_slice();
        let published = cache::materialize(&directory, &file_name, &mut bytes)?;
        Ok(published.path)
    })
    .await
    .map_err(ServerError::from)??;

    tracing::info!(request_id = %request_id, key = %key, path = %path.display(), "barcode_generated");
    Ok(format!("barcode label available at {}\n", path.display()))
}
