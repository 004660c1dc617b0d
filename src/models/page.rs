//! Page identity and per-variant page records.

use serde::{Deserialize, Serialize};

/// Composite key identifying one physical scanned page.
///
/// Shared by every OCR variant of the page and by every pipeline stage.
/// Ordering is (relative_path, filename, page) so sorted collections group
/// pages of the same document together in page order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageIdentity {
    /// Directory of the source file, relative to the ingestion root.
    pub relative_path: String,
    /// Source file name.
    pub filename: String,
    /// Zero-based page index.
    pub page: u32,
}

impl PageIdentity {
    pub fn new(relative_path: impl Into<String>, filename: impl Into<String>, page: u32) -> Self {
        Self {
            relative_path: relative_path.into(),
            filename: filename.into(),
            page,
        }
    }
}

impl std::fmt::Display for PageIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.relative_path.is_empty() {
            write!(f, "{} p{}", self.filename, self.page)
        } else {
            write!(f, "{}/{} p{}", self.relative_path, self.filename, self.page)
        }
    }
}

/// One OCR engine/language transcription of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub identity: PageIdentity,
    /// Engine + language tag, e.g. `tesseract_tha+eng`.
    pub engine_tag: String,
    /// Raw OCR output; empty when the engine produced nothing.
    pub raw_text: String,
}

/// All variants of one page side by side.
///
/// `variants` holds one slot per configured variant store, in store order.
/// Missing variants are empty strings, never absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedPageRecord {
    pub identity: PageIdentity,
    pub variants: Vec<String>,
}

impl MergedPageRecord {
    /// Create a record with `slots` empty variant slots.
    pub fn empty(identity: PageIdentity, slots: usize) -> Self {
        Self {
            identity,
            variants: vec![String::new(); slots],
        }
    }

    /// Whether at least one variant carries text worth reconciling.
    pub fn has_text(&self) -> bool {
        self.variants.iter().any(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ordering_groups_documents() {
        let mut ids = vec![
            PageIdentity::new("b", "x.pdf", 0),
            PageIdentity::new("a", "y.pdf", 2),
            PageIdentity::new("a", "y.pdf", 1),
        ];
        ids.sort();
        assert_eq!(ids[0], PageIdentity::new("a", "y.pdf", 1));
        assert_eq!(ids[1], PageIdentity::new("a", "y.pdf", 2));
        assert_eq!(ids[2], PageIdentity::new("b", "x.pdf", 0));
    }

    #[test]
    fn test_has_text() {
        let mut record = MergedPageRecord::empty(PageIdentity::new("", "a.pdf", 0), 3);
        assert!(!record.has_text());
        record.variants[2] = "ระเบียบ".to_string();
        assert!(record.has_text());
    }

    #[test]
    fn test_display() {
        assert_eq!(PageIdentity::new("", "a.pdf", 3).to_string(), "a.pdf p3");
        assert_eq!(
            PageIdentity::new("law/2020", "a.pdf", 0).to_string(),
            "law/2020/a.pdf p0"
        );
    }
}
