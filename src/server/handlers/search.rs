//! Search API handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::super::AppState;
use crate::search::{CorpusSource, SearchError, SearchRequest};

/// Query parameters for `/search` and `/search/compare`.
///
/// Flags are kept as strings: only a case-insensitive "true" turns a flag
/// on, anything else turns it off, and absence leaves the default.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub ocr_engine: Option<String>,
    pub lang: Option<String>,
    pub title_only: Option<String>,
    pub use_tokenizer: Option<String>,
    pub aggregate: Option<String>,
}

fn flag(value: Option<&str>, default: bool) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

impl SearchParams {
    fn to_request(&self) -> SearchRequest {
        SearchRequest {
            query: self.query.clone().unwrap_or_default(),
            title_only: flag(self.title_only.as_deref(), false),
            use_tokenizer: flag(self.use_tokenizer.as_deref(), true),
            aggregate: flag(self.aggregate.as_deref(), true),
        }
    }
}

fn error_response(err: SearchError) -> Response {
    let status = match err {
        SearchError::EmptyQuery | SearchError::UnknownEngine(_) | SearchError::UnknownLang(_) => {
            StatusCode::BAD_REQUEST
        }
        SearchError::CorpusMissing(_) => StatusCode::NOT_FOUND,
        SearchError::Tokenizer(_) => StatusCode::BAD_GATEWAY,
        SearchError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("Search failed: {}", err);
    }
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

/// Search one corpus.
pub async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let engine = params.ocr_engine.as_deref().unwrap_or(state.default_engine.as_str());
    let lang = params.lang.as_deref().unwrap_or(state.default_lang.as_str());
    let request = params.to_request();

    let source = match CorpusSource::resolve(engine, lang) {
        Ok(source) => source,
        Err(e) => return error_response(e),
    };

    match state.search.search(&source, &request).await {
        Ok(results) => Json(serde_json::json!({
            "query": request.query,
            "engine": engine,
            "lang": lang,
            "count": results.len(),
            "results": results,
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Run the same search over every configured engine/language pair.
pub async fn compare(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let request = params.to_request();

    match state.search.compare_engines(&request).await {
        Ok(results) => Json(serde_json::json!({
            "query": request.query,
            "results": results,
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_parsing() {
        assert!(flag(Some("true"), false));
        assert!(flag(Some("TRUE"), false));
        assert!(!flag(Some("yes"), true));
        assert!(!flag(Some("false"), true));
        assert!(flag(None, true));
        assert!(!flag(None, false));
    }
}
