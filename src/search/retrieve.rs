//! Boolean matching over searchable records.

use crate::models::SearchableRecord;

/// How a query is matched against a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryMatch {
    /// The whole query as one case-sensitive substring.
    Substring(String),
    /// Every term must be present (AND-match), each checked on its own.
    AllTerms(Vec<String>),
}

impl QueryMatch {
    /// Whether `record` matches.
    ///
    /// With `title_only` only the filename is searched. Otherwise each term
    /// may be found in the filename or in the text.
    pub fn matches(&self, record: &SearchableRecord, title_only: bool) -> bool {
        let found = |term: &str| {
            record.filename.contains(term) || (!title_only && record.text.contains(term))
        };
        match self {
            QueryMatch::Substring(query) => found(query),
            QueryMatch::AllTerms(terms) => terms.iter().all(|term| found(term)),
        }
    }
}

/// Keep the records that match, in their original order.
pub fn filter_records(
    records: Vec<SearchableRecord>,
    query: &QueryMatch,
    title_only: bool,
) -> Vec<SearchableRecord> {
    records
        .into_iter()
        .filter(|record| query.matches(record, title_only))
        .collect()
}
