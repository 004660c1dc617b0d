//! Retrieval layer.
//!
//! Every search reloads its corpus from disk, optionally aggregates pages
//! into documents, and keeps the records that match the query. Matching is
//! boolean; there is no index and no ranking.

mod aggregate;
mod corpus;
mod retrieve;
mod tokenizer;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{OcrEngine, OcrLang, SearchableRecord, VariantSource};
use crate::store::{ConsolidatedStore, StoreError};

pub use aggregate::{aggregate_documents, WHOLE_DOCUMENT_PAGE};
pub use corpus::{load_corpus, CorpusSource, CONSOLIDATED_ENGINE};
pub use retrieve::{filter_records, QueryMatch};
pub use tokenizer::{DictionaryTokenizer, HttpTokenizer, TokenizeError, Tokenizer};

/// Errors surfaced to search callers. No partial results accompany them.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Query is empty")]
    EmptyQuery,

    #[error("Unknown OCR engine: {0}")]
    UnknownEngine(String),

    #[error("Unknown OCR language: {0}")]
    UnknownLang(String),

    #[error("Corpus not found: {}", .0.display())]
    CorpusMissing(PathBuf),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Tokenizer(#[from] TokenizeError),
}

/// Search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Engine used when a request names none
    #[serde(default = "default_engine")]
    pub default_engine: String,
    /// Language used when a request names none
    #[serde(default = "default_lang")]
    pub default_lang: String,
    /// Engine/language pairs searched by compare mode
    #[serde(default = "default_compare")]
    pub compare: Vec<VariantSource>,
    /// External segmentation service (built-in segmenter when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer_endpoint: Option<String>,
    /// Word list for the built-in segmenter (bundled Thai list when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<PathBuf>,
}

fn default_engine() -> String {
    OcrEngine::default().as_str().to_string()
}

fn default_lang() -> String {
    OcrLang::default().as_str().to_string()
}

fn default_compare() -> Vec<VariantSource> {
    vec![
        (OcrEngine::Tesseract, OcrLang::Tha).into(),
        (OcrEngine::Tesseract, OcrLang::ThaEng).into(),
        (OcrEngine::EasyOcr, OcrLang::ThaEng).into(),
        (OcrEngine::Gemini, OcrLang::ThaEng).into(),
    ]
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_engine: default_engine(),
            default_lang: default_lang(),
            compare: default_compare(),
            tokenizer_endpoint: None,
            dictionary: None,
        }
    }
}

impl SearchConfig {
    /// Apply environment variable overrides (`TOKENIZER_ENDPOINT`).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("TOKENIZER_ENDPOINT") {
            if !val.is_empty() {
                self.tokenizer_endpoint = Some(val);
            }
        }
        self
    }
}

/// Build the tokenizer selected by the configuration.
pub fn create_tokenizer(config: &SearchConfig) -> Result<Arc<dyn Tokenizer>, TokenizeError> {
    if let Some(endpoint) = &config.tokenizer_endpoint {
        return Ok(Arc::new(HttpTokenizer::new(endpoint.clone())?));
    }
    match &config.dictionary {
        Some(path) => Ok(Arc::new(DictionaryTokenizer::from_file(path)?)),
        None => Ok(Arc::new(DictionaryTokenizer::bundled())),
    }
}

/// One search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub title_only: bool,
    pub use_tokenizer: bool,
    pub aggregate: bool,
}

impl SearchRequest {
    /// Request with the default flags: tokenized, aggregated, title and text.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            title_only: false,
            use_tokenizer: true,
            aggregate: true,
        }
    }
}

/// Stateless search over the stores on disk.
#[derive(Clone)]
pub struct SearchService {
    text_dir: PathBuf,
    consolidated: ConsolidatedStore,
    tokenizer: Arc<dyn Tokenizer>,
    compare: Vec<VariantSource>,
}

impl SearchService {
    pub fn new(
        text_dir: impl Into<PathBuf>,
        consolidated: ConsolidatedStore,
        tokenizer: Arc<dyn Tokenizer>,
        compare: Vec<VariantSource>,
    ) -> Self {
        Self {
            text_dir: text_dir.into(),
            consolidated,
            tokenizer,
            compare,
        }
    }

    /// Turn the request query into a matcher.
    pub async fn prepare_query(&self, request: &SearchRequest) -> Result<QueryMatch, SearchError> {
        if request.query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if !request.use_tokenizer {
            return Ok(QueryMatch::Substring(request.query.clone()));
        }

        let terms: Vec<String> = self
            .tokenizer
            .tokenize(&request.query)
            .await?
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .collect();
        if terms.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        debug!("Query '{}' -> terms {:?}", request.query, terms);
        Ok(QueryMatch::AllTerms(terms))
    }

    fn run(
        &self,
        source: &CorpusSource,
        query: &QueryMatch,
        request: &SearchRequest,
    ) -> Result<Vec<SearchableRecord>, SearchError> {
        let mut records = load_corpus(source, &self.text_dir, &self.consolidated)?;
        if request.aggregate {
            records = aggregate_documents(records);
        }
        let hits = filter_records(records, query, request.title_only);
        debug!("{}: {} matches", source, hits.len());
        Ok(hits)
    }

    /// Search one corpus.
    pub async fn search(
        &self,
        source: &CorpusSource,
        request: &SearchRequest,
    ) -> Result<Vec<SearchableRecord>, SearchError> {
        let query = self.prepare_query(request).await?;
        self.run(source, &query, request)
    }

    /// Run the same request over every configured engine/language pair.
    ///
    /// The query is segmented once. Results are keyed by variant tag.
    pub async fn compare_engines(
        &self,
        request: &SearchRequest,
    ) -> Result<BTreeMap<String, Vec<SearchableRecord>>, SearchError> {
        let query = self.prepare_query(request).await?;
        let mut results = BTreeMap::new();
        for variant in &self.compare {
            let source = CorpusSource::Variant(variant.clone());
            let hits = self.run(&source, &query, request)?;
            results.insert(source.label(), hits);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn write_store(dir: &TempDir, engine: &str, lang: &str, body: &str) {
        let path = dir.path().join(VariantSource::new(engine, lang).file_name());
        fs::write(path, body).unwrap();
    }

    fn service(dir: &TempDir) -> SearchService {
        SearchService::new(
            dir.path(),
            ConsolidatedStore::new(dir.path().join("out.csv")),
            Arc::new(DictionaryTokenizer::default()),
            vec![
                VariantSource::new("tesseract", "tha"),
                VariantSource::new("easyocr", "tha+eng"),
            ],
        )
    }

    fn tesseract_source() -> CorpusSource {
        CorpusSource::Variant(VariantSource::new("tesseract", "tha"))
    }

    const CORPUS: &str = "filename,relative_path,page,text\n\
        ระเบียบกระทรวง.pdf,law,0,งบประมาณ\n\
        notice.pdf,law,0,ระเบียบ เทคโนโลยี\n";

    #[tokio::test]
    async fn test_thai_end_to_end() {
        let dir = tempdir().unwrap();
        write_store(&dir, "tesseract", "tha", CORPUS);
        let service = service(&dir);

        let mut request = SearchRequest::new("ระเบียบ");
        request.aggregate = false;
        let hits = service.search(&tesseract_source(), &request).await.unwrap();
        let names: Vec<&str> = hits.iter().map(|h| h.filename.as_str()).collect();
        assert_eq!(names, vec!["ระเบียบกระทรวง.pdf", "notice.pdf"]);

        request.query = "ระเบียบ เทคโนโลยี".to_string();
        let hits = service.search(&tesseract_source(), &request).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].filename, "notice.pdf");
        assert_eq!(hits[0].text, "ระเบียบ เทคโนโลยี");
    }

    #[tokio::test]
    async fn test_unspaced_query_matches_separated_words() {
        let dir = tempdir().unwrap();
        write_store(
            &dir,
            "tesseract",
            "tha",
            "filename,relative_path,page,text\n\
             it.pdf,law,0,ระเบียบ การใช้ เทคโนโลยี\n\
             budget.pdf,law,0,ระเบียบ งบประมาณ\n",
        );
        let service = SearchService::new(
            dir.path(),
            ConsolidatedStore::new(dir.path().join("out.csv")),
            create_tokenizer(&SearchConfig::default()).unwrap(),
            Vec::new(),
        );

        let query = service
            .prepare_query(&SearchRequest::new("ระเบียบเทคโนโลยี"))
            .await
            .unwrap();
        assert_eq!(
            query,
            QueryMatch::AllTerms(vec!["ระเบียบ".to_string(), "เทคโนโลยี".to_string()])
        );

        let hits = service
            .search(&tesseract_source(), &SearchRequest::new("ระเบียบเทคโนโลยี"))
            .await
            .unwrap();
        let names: Vec<&str> = hits.iter().map(|h| h.filename.as_str()).collect();
        assert_eq!(names, vec!["it.pdf"]);
    }

    #[tokio::test]
    async fn test_aggregated_search_matches_across_pages() {
        let dir = tempdir().unwrap();
        write_store(
            &dir,
            "tesseract",
            "tha",
            "filename,relative_path,page,text\n\
             a.pdf,,1,เทคโนโลยี\n\
             a.pdf,,0,ระเบียบ\n",
        );
        let service = service(&dir);

        let mut request = SearchRequest::new("ระเบียบ เทคโนโลยี");
        let hits = service.search(&tesseract_source(), &request).await.unwrap();
        assert_eq!(hits, vec![SearchableRecord::new("a.pdf", "", 0, "ระเบียบ เทคโนโลยี")]);

        request.aggregate = false;
        assert!(service.search(&tesseract_source(), &request).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_substring_mode_uses_whole_query() {
        let dir = tempdir().unwrap();
        write_store(&dir, "tesseract", "tha", CORPUS);
        let service = service(&dir);

        let mut request = SearchRequest::new("ระเบียบ เทคโนโลยี");
        request.use_tokenizer = false;
        request.title_only = true;
        assert!(service.search(&tesseract_source(), &request).await.unwrap().is_empty());

        request.title_only = false;
        assert_eq!(service.search(&tesseract_source(), &request).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let dir = tempdir().unwrap();
        write_store(&dir, "tesseract", "tha", CORPUS);
        let service = service(&dir);
        for query in ["", "   "] {
            let err = service
                .search(&tesseract_source(), &SearchRequest::new(query))
                .await
                .unwrap_err();
            assert!(matches!(err, SearchError::EmptyQuery));
        }
    }

    #[tokio::test]
    async fn test_compare_engines() {
        let dir = tempdir().unwrap();
        write_store(&dir, "tesseract", "tha", CORPUS);
        write_store(
            &dir,
            "easyocr",
            "tha+eng",
            "filename,relative_path,page,text\nnotice.pdf,law,0,ระเบยีบ\n",
        );
        let service = service(&dir);

        let results = service
            .compare_engines(&SearchRequest::new("ระเบียบ"))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results["tesseract_tha"].len(), 2);
        assert!(results["easyocr_tha+eng"].is_empty());
    }

    #[tokio::test]
    async fn test_compare_fails_when_a_corpus_is_missing() {
        let dir = tempdir().unwrap();
        write_store(&dir, "tesseract", "tha", CORPUS);
        let err = service(&dir)
            .compare_engines(&SearchRequest::new("ระเบียบ"))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::CorpusMissing(_)));
    }

    #[test]
    fn test_config_defaults() {
        let config: SearchConfig = toml::from_str("").unwrap();
        assert_eq!(config.default_engine, "tesseract");
        assert_eq!(config.default_lang, "tha+eng");
        assert_eq!(config.compare.len(), 4);
    }
}
