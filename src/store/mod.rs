//! Tabular page stores.
//!
//! Two kinds of CSV-backed stores exist:
//! - variant stores, one per OCR engine/language (`filename, relative_path,
//!   page, text`), written by the OCR harvesting step and only read here
//! - the consolidated store, an append-only sink of canonical records
//!
//! Every column declared as text is coerced to a string at load time. Join
//! keys are normalized to (string, string, integer) before anything is
//! compared, and coercions are logged rather than failing deep in matching.

mod consolidated;
mod schema;
mod variant;

use std::path::PathBuf;

use thiserror::Error;

pub use consolidated::ConsolidatedStore;
pub use schema::{coerce_page, LoadReport};
pub use variant::{discover_variant_sources, load_searchable, load_variant_store, VariantStore};

/// Errors from reading or writing page stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("Store not found: {0}")]
    NotFound(PathBuf),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        StoreError::Csv {
            path: path.into(),
            source,
        }
    }
}
