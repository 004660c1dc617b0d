//! Column lookup and type coercion at the store boundary.

use std::path::Path;

use csv::StringRecord;
use tracing::warn;

use super::StoreError;

/// Counters describing how cleanly a store loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Rows turned into records.
    pub rows: usize,
    /// Fields that needed coercion (missing text, float pages, ...).
    pub coerced: usize,
    /// Rows dropped because their join key could not be recovered.
    pub skipped: usize,
}

/// Column positions resolved from a header row.
#[derive(Debug, Clone)]
pub(crate) struct Columns {
    headers: StringRecord,
}

impl Columns {
    pub fn new(headers: StringRecord) -> Self {
        Self { headers }
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    pub fn require(&self, path: &Path, name: &'static str) -> Result<usize, StoreError> {
        self.find(name).ok_or_else(|| StoreError::MissingColumn {
            path: path.to_path_buf(),
            column: name,
        })
    }
}

/// Read a text field, coercing a missing cell to the empty string.
///
/// Returns the value and whether coercion happened.
pub(crate) fn text_field(record: &StringRecord, index: Option<usize>) -> (String, bool) {
    match index {
        Some(i) => match record.get(i) {
            Some(value) => (value.to_string(), false),
            None => (String::new(), true),
        },
        // Column absent from the whole store: not a per-row anomaly.
        None => (String::new(), false),
    }
}

/// Normalize a page cell to an integer.
///
/// Accepts plain integers and integral floats (`3.0`, as written by tools
/// that widen integer columns holding gaps). Returns the page and whether a
/// float had to be coerced, or `None` when no page can be recovered.
pub fn coerce_page(raw: &str) -> Option<(u32, bool)> {
    let raw = raw.trim();
    if let Ok(page) = raw.parse::<u32>() {
        return Some((page, false));
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Some((value as u32, true))
    } else {
        None
    }
}

/// Parse the page cell of a row, logging coercions.
pub(crate) fn page_field(
    path: &Path,
    line: u64,
    record: &StringRecord,
    index: usize,
    report: &mut LoadReport,
) -> Option<u32> {
    let raw = record.get(index).unwrap_or("");
    match coerce_page(raw) {
        Some((page, coerced)) => {
            if coerced {
                report.coerced += 1;
                warn!(
                    "{}:{}: page '{}' coerced to {}",
                    path.display(),
                    line,
                    raw,
                    page
                );
            }
            Some(page)
        }
        None => {
            report.skipped += 1;
            warn!(
                "{}:{}: unusable page value '{}', row skipped",
                path.display(),
                line,
                raw
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_page() {
        assert_eq!(coerce_page("3"), Some((3, false)));
        assert_eq!(coerce_page(" 12 "), Some((12, false)));
        assert_eq!(coerce_page("3.0"), Some((3, true)));
        assert_eq!(coerce_page("3.5"), None);
        assert_eq!(coerce_page("-1"), None);
        assert_eq!(coerce_page(""), None);
        assert_eq!(coerce_page("NaN"), None);
    }

    #[test]
    fn test_text_field_short_row() {
        let record = StringRecord::from(vec!["a.pdf", "0"]);
        assert_eq!(text_field(&record, Some(1)), ("0".to_string(), false));
        assert_eq!(text_field(&record, Some(5)), (String::new(), true));
        assert_eq!(text_field(&record, None), (String::new(), false));
    }
}
