//! Reconciled (canonical) page records.

use serde::Serialize;

use super::PageIdentity;

/// Column order of the consolidated store.
pub const CONSOLIDATED_COLUMNS: [&str; 9] = [
    "relative_path",
    "filename",
    "page",
    "clean_text",
    "meta_type",
    "meta_subject",
    "meta_entities",
    "vector_context",
    "error",
];

/// Terminal output of reconciliation for one page.
///
/// Either a success (all metadata populated, `error` is `None`) or a
/// failure carrying only the identity and an error description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalRecord {
    #[serde(flatten)]
    pub identity: PageIdentity,
    pub clean_text: String,
    pub meta_type: String,
    pub meta_subject: String,
    pub meta_entities: String,
    pub vector_context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CanonicalRecord {
    /// Build a success record. `vector_context` is derived from the metadata.
    pub fn success(
        identity: PageIdentity,
        clean_text: String,
        doc_type: String,
        subject: String,
        entities: String,
    ) -> Self {
        let vector_context = format!(
            "Type: {} | Subject: {} | Entities: {}",
            doc_type, subject, entities
        );
        Self {
            identity,
            clean_text,
            meta_type: doc_type,
            meta_subject: subject,
            meta_entities: entities,
            vector_context,
            error: None,
        }
    }

    /// Build a failure record. No text is fabricated.
    pub fn failure(identity: PageIdentity, error: impl Into<String>) -> Self {
        Self {
            identity,
            clean_text: String::new(),
            meta_type: String::new(),
            meta_subject: String::new(),
            meta_entities: String::new(),
            vector_context: String::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Row values in [`CONSOLIDATED_COLUMNS`] order.
    pub fn to_row(&self) -> [String; 9] {
        [
            self.identity.relative_path.clone(),
            self.identity.filename.clone(),
            self.identity.page.to_string(),
            self.clean_text.clone(),
            self.meta_type.clone(),
            self.meta_subject.clone(),
            self.meta_entities.clone(),
            self.vector_context.clone(),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_builds_vector_context() {
        let record = CanonicalRecord::success(
            PageIdentity::new("", "a.pdf", 0),
            "text".to_string(),
            "ระเบียบ".to_string(),
            "budget rules".to_string(),
            "กระทรวง,2563".to_string(),
        );
        assert_eq!(
            record.vector_context,
            "Type: ระเบียบ | Subject: budget rules | Entities: กระทรวง,2563"
        );
        assert!(!record.is_error());
    }

    #[test]
    fn test_failure_has_no_text() {
        let record = CanonicalRecord::failure(PageIdentity::new("", "a.pdf", 1), "HTTP 429");
        assert!(record.is_error());
        assert!(record.clean_text.is_empty());
        let row = record.to_row();
        assert_eq!(row[2], "1");
        assert_eq!(row[8], "HTTP 429");
    }
}
