use crate::error::{ServerError, ServerResult};
use crate::middleware::RequestId;
use crate::routes::KeyQuery;
use crate::state::ServerState;
use axum::body::Body;
use axum::extract::{Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderValue;
use axum::response::Response;
use axum::Extension;
use cache::DocumentKind;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::Instrument;

/// Attestation PDF (GET /attestation?key=...)
///
/// Serves `<key>.pdf` from the cache, pulling it from the archive first on
/// a miss. Any resolution failure answers `200` with the not-found page.
pub async fn attestation(
    State(state): State<Arc<ServerState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<Vec<(String, String)>>,
    request: Request,
) -> ServerResult<Response> {
    let key = KeyQuery::from_pairs(params).require_key()?;
    let span = tracing::info_span!("attestation", request_id = %request_id, key = %key);

    async move {
        tracing::info!(directory = %state.cache_dir().display(), "attestation_requested");
        let document = state
            .resolver
            .resolve(key, DocumentKind::Attestation)
            .await?;
        tracing::info!(path = %document.path.display(), origin = ?document.origin, "attestation_resolved");
        Ok::<_, ServerError>(serve_document(&document.path, DocumentKind::Attestation, request).await)
    }
    .instrument(span)
    .await
}

/// Stream a cached file, honouring conditional and range headers.
async fn serve_document(path: &Path, kind: DocumentKind, request: Request) -> Response {
    let response = match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    let mut response = response.map(Body::new);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(kind.content_type()));
    response
}
