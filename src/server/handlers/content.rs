//! Raw source file serving.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use super::super::AppState;

/// Serve a file from a content category root.
///
/// `path` is relative to the category root (`relative_path/filename`).
/// Anything that escapes the root is reported as not found.
pub async fn serve_content(
    State(state): State<AppState>,
    Path((category, path)): Path<(String, String)>,
) -> Response {
    let Some(root) = state.content_roots.get(&category) else {
        return (StatusCode::NOT_FOUND, "Unknown content category").into_response();
    };

    if path.contains("..") || path.starts_with('/') {
        return (StatusCode::NOT_FOUND, "File not found").into_response();
    }

    let canonical_root = match root.canonicalize() {
        Ok(p) => p,
        Err(_) => {
            tracing::warn!("Content root for '{}' is missing: {}", category, root.display());
            return (StatusCode::NOT_FOUND, "File not found").into_response();
        }
    };

    let canonical_file = match canonical_root.join(&path).canonicalize() {
        Ok(p) => p,
        Err(_) => return (StatusCode::NOT_FOUND, "File not found").into_response(),
    };

    if !canonical_file.starts_with(&canonical_root) || !canonical_file.is_file() {
        return (StatusCode::NOT_FOUND, "File not found").into_response();
    }

    let content = match tokio::fs::read(&canonical_file).await {
        Ok(c) => c,
        Err(_) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file").into_response();
        }
    };

    let mime = mime_guess::from_path(&canonical_file)
        .first_or_octet_stream()
        .to_string();

    ([(header::CONTENT_TYPE, mime)], content).into_response()
}
