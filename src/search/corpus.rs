//! Corpus selection and loading.

use std::path::Path;

use tracing::debug;

use super::SearchError;
use crate::models::{OcrEngine, OcrLang, SearchableRecord, VariantSource};
use crate::store::{load_searchable, ConsolidatedStore, StoreError};

/// Engine name that selects the consolidated store instead of a variant store.
pub const CONSOLIDATED_ENGINE: &str = "consolidated";

/// Which store a search runs over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusSource {
    /// One OCR variant store, searched on its `text` column.
    Variant(VariantSource),
    /// Reconciled pages, searched on `clean_text`. Error rows are excluded.
    Consolidated,
}

impl CorpusSource {
    /// Resolve request parameters against known engines and languages.
    pub fn resolve(engine: &str, lang: &str) -> Result<Self, SearchError> {
        if engine.eq_ignore_ascii_case(CONSOLIDATED_ENGINE) {
            return Ok(CorpusSource::Consolidated);
        }
        let engine =
            OcrEngine::from_str(engine).ok_or_else(|| SearchError::UnknownEngine(engine.to_string()))?;
        let lang = OcrLang::from_str(lang).ok_or_else(|| SearchError::UnknownLang(lang.to_string()))?;
        Ok(CorpusSource::Variant(VariantSource::from((engine, lang))))
    }

    /// Key used in comparison results.
    pub fn label(&self) -> String {
        match self {
            CorpusSource::Variant(source) => source.tag(),
            CorpusSource::Consolidated => CONSOLIDATED_ENGINE.to_string(),
        }
    }
}

impl std::fmt::Display for CorpusSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorpusSource::Variant(source) => write!(f, "{}", source),
            CorpusSource::Consolidated => write!(f, "{}", CONSOLIDATED_ENGINE),
        }
    }
}

/// Load page-level records for `source`.
///
/// Read fresh on every call; nothing is cached between searches.
pub fn load_corpus(
    source: &CorpusSource,
    text_dir: &Path,
    consolidated: &ConsolidatedStore,
) -> Result<Vec<SearchableRecord>, SearchError> {
    match source {
        CorpusSource::Variant(variant) => {
            let path = text_dir.join(variant.file_name());
            let (records, report) = load_searchable(&path, "text").map_err(|e| match e {
                StoreError::NotFound(path) => SearchError::CorpusMissing(path),
                other => SearchError::Store(other),
            })?;
            debug!(
                "Loaded {} records from {} ({} coerced, {} skipped)",
                records.len(),
                path.display(),
                report.coerced,
                report.skipped
            );
            Ok(records)
        }
        CorpusSource::Consolidated => {
            if !consolidated.exists() {
                return Err(SearchError::CorpusMissing(consolidated.path().to_path_buf()));
            }
            Ok(consolidated
                .latest()?
                .into_values()
                .filter(|record| !record.is_error())
                .map(|record| {
                    SearchableRecord::new(
                        record.identity.filename,
                        record.identity.relative_path,
                        record.identity.page,
                        record.clean_text,
                    )
                })
                .collect())
        }
    }
}
