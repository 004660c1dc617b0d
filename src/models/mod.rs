//! Data models for ocrjudge.

mod canonical;
mod page;
mod searchable;
mod variant_source;

pub use canonical::{CanonicalRecord, CONSOLIDATED_COLUMNS};
pub use page::{MergedPageRecord, PageIdentity, VariantRecord};
pub use searchable::SearchableRecord;
pub use variant_source::{OcrEngine, OcrLang, VariantSource};
