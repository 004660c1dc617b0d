//! HTTP front end for the retrieval layer.
//!
//! Thin parameter parsing over [`SearchService`](crate::search::SearchService)
//! plus a path-scoped file server for the scanned sources.

mod handlers;
mod routes;

pub use routes::create_router;

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::search::{create_tokenizer, SearchService};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub search: SearchService,
    pub default_engine: String,
    pub default_lang: String,
    pub content_roots: Arc<BTreeMap<String, PathBuf>>,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let tokenizer = create_tokenizer(&settings.search)?;
        let search = SearchService::new(
            &settings.text_dir,
            settings.consolidated_store(),
            tokenizer,
            settings.search.compare.clone(),
        );

        Ok(Self {
            search,
            default_engine: settings.search.default_engine.clone(),
            default_lang: settings.search.default_lang.clone(),
            content_roots: Arc::new(settings.content_roots.clone()),
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::tempdir;
    use tower::ServiceExt;

    const CORPUS: &str = "filename,relative_path,page,text\n\
        ระเบียบกระทรวง.pdf,law,0,งบประมาณ\n\
        notice.pdf,law,0,ระเบียบ เทคโนโลยี\n\
        notice.pdf,law,1,ภาคผนวก\n";

    fn setup_test_app() -> (axum::Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut settings = Settings::with_base_dir(dir.path());
        settings.search.tokenizer_endpoint = None;
        settings.search.compare = vec![
            crate::models::VariantSource::new("tesseract", "tha+eng"),
            crate::models::VariantSource::new("tesseract", "tha"),
        ];

        std::fs::create_dir_all(&settings.text_dir).unwrap();
        std::fs::write(settings.text_dir.join("summary_tesseract_tha+eng.csv"), CORPUS).unwrap();
        std::fs::write(
            settings.text_dir.join("summary_tesseract_tha.csv"),
            "filename,relative_path,page,text\nnotice.pdf,law,0,ระเบยีบ\n",
        )
        .unwrap();

        let pdf_dir = settings.content_root("pdf").unwrap().join("law");
        std::fs::create_dir_all(&pdf_dir).unwrap();
        std::fs::write(pdf_dir.join("notice.pdf"), b"%PDF-1.4 test").unwrap();

        let app = create_router(AppState::new(&settings).unwrap());
        (app, dir)
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = get(app, uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = setup_test_app();
        let (status, _) = get(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_search_defaults_aggregate_documents() {
        let (app, _dir) = setup_test_app();
        // ระเบียบ
        let (status, json) =
            get_json(app, "/search?query=%E0%B8%A3%E0%B8%B0%E0%B9%80%E0%B8%9A%E0%B8%B5%E0%B8%A2%E0%B8%9A").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["engine"], "tesseract");
        assert_eq!(json["lang"], "tha+eng");
        assert_eq!(json["count"], 2);
        let results = json["results"].as_array().unwrap();
        assert_eq!(results[1]["filename"], "notice.pdf");
        assert_eq!(results[1]["page"], 0);
        assert_eq!(results[1]["text"], "ระเบียบ เทคโนโลยี ภาคผนวก");
    }

    #[tokio::test]
    async fn test_search_page_level_title_only() {
        let (app, _dir) = setup_test_app();
        let (status, json) = get_json(
            app,
            "/search?query=notice&aggregate=false&title_only=True&use_tokenizer=false",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 2);
        assert_eq!(json["results"][1]["page"], 1);
    }

    #[tokio::test]
    async fn test_search_missing_query() {
        let (app, _dir) = setup_test_app();
        let (status, json) = get_json(app, "/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn test_search_unknown_engine() {
        let (app, _dir) = setup_test_app();
        let (status, _) = get_json(app, "/search?query=x&ocr_engine=abbyy").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_missing_corpus() {
        let (app, _dir) = setup_test_app();
        let (status, json) = get_json(app, "/search?query=x&ocr_engine=easyocr").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].as_str().unwrap().contains("summary_easyocr_tha+eng.csv"));
    }

    #[tokio::test]
    async fn test_compare() {
        let (app, _dir) = setup_test_app();
        let (status, json) = get_json(app, "/search/compare?query=notice").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["results"]["tesseract_tha+eng"].as_array().unwrap().len(), 1);
        assert_eq!(json["results"]["tesseract_tha"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_content_served_with_mime() {
        let (app, _dir) = setup_test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/content/pdf/law/notice.pdf")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get("content-type")
            .map(|v| v.to_str().unwrap_or(""));
        assert_eq!(content_type, Some("application/pdf"));
    }

    #[tokio::test]
    async fn test_content_rejects_traversal_and_unknown_category() {
        let (app, _dir) = setup_test_app();
        let (status, _) = get(app.clone(), "/content/pdf/../text/summary_tesseract_tha.csv").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = get(app.clone(), "/content/video/law/notice.pdf").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = get(app, "/content/pdf/law/missing.pdf").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
