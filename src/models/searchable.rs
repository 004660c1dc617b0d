//! Records handed to the retrieval layer.

use serde::Serialize;

/// A flat record the retrieval layer matches against.
///
/// Page-granular records come straight from a store; document-granular
/// records are produced by the aggregator with `page == 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchableRecord {
    pub filename: String,
    pub relative_path: String,
    pub page: u32,
    pub text: String,
}

impl SearchableRecord {
    pub fn new(
        filename: impl Into<String>,
        relative_path: impl Into<String>,
        page: u32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            relative_path: relative_path.into(),
            page,
            text: text.into(),
        }
    }
}
