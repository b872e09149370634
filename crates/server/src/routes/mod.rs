//! HTTP route handlers
//!
//! - `health`: liveness probe driven by the shutdown lifecycle
//! - `attestation`: cache-first PDF delivery with archive fallback
//! - `label`: barcode label generation into the cache directory

pub mod attestation;
pub mod health;
pub mod label;

use crate::error::{ServerError, ServerResult};
use axum::http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use axum::response::IntoResponse;
use cache::DocumentKey;

/// `?key=` query shared by the document endpoints.
///
/// Extracted from `Query<Vec<(String, String)>>` so that a repeated `key`
/// keeps its first value instead of failing to deserialize.
#[derive(Debug, Default)]
pub struct KeyQuery {
    pub key: Option<String>,
}

impl KeyQuery {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let key = pairs
            .into_iter()
            .find_map(|(name, value)| (name == "key").then_some(value));
        Self { key }
    }

    /// The key, or `400` when it is missing or empty.
    pub fn require_key(self) -> ServerResult<DocumentKey> {
        let raw = self
            .key
            .ok_or_else(|| ServerError::BadRequest("missing 'key' query parameter".to_string()))?;
        tracing::debug!(key = %raw, "url_param_key");
        DocumentKey::new(raw).map_err(ServerError::from)
    }
}

/// Root endpoint (GET /)
pub async fn index() -> impl IntoResponse {
    (
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8"),
            (X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        "Hello, Folks!\n",
    )
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_rejected() {
        let err = KeyQuery { key: None }.require_key().unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }

    #[test]
    fn empty_key_is_rejected() {
        let err = KeyQuery {
            key: Some(String::new()),
        }
        .require_key()
        .unwrap_err();
        assert!(matches!(err, ServerError::Resolve(cache::ResolveError::EmptyKey)));
    }

    #[test]
    fn repeated_key_keeps_first_value() {
        let pairs = vec![
            ("other".to_string(), "1".to_string()),
            ("key".to_string(), "first".to_string()),
            ("key".to_string(), "second".to_string()),
        ];
        let key = KeyQuery::from_pairs(pairs).require_key().unwrap();
        assert_eq!(key.as_str(), "first");
    }

    #[test]
    fn pairs_without_key_are_missing() {
        let query = KeyQuery::from_pairs(vec![("other".to_string(), "1".to_string())]);
        assert!(query.key.is_none());
    }

    #[test]
    fn key_passes_through_verbatim() {
        let key = KeyQuery {
            key: Some("VET-2024-001".into()),
        }
        .require_key()
        .unwrap();
        assert_eq!(key.as_str(), "VET-2024-001");
    }
}
