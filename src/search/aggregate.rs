//! Page to document aggregation.

use std::collections::HashMap;

use crate::models::SearchableRecord;

/// Page value of a document-level record.
pub const WHOLE_DOCUMENT_PAGE: u32 = 0;

/// Collapse page records into one record per (filename, relative_path).
///
/// Documents keep the order in which they first appear. Within a document,
/// page texts are joined with a single space in page-number order; empty
/// pages add nothing.
pub fn aggregate_documents(records: Vec<SearchableRecord>) -> Vec<SearchableRecord> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut groups: Vec<(String, String, Vec<(u32, String)>)> = Vec::new();

    for record in records {
        let key = (record.filename.clone(), record.relative_path.clone());
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((record.filename.clone(), record.relative_path.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].2.push((record.page, record.text));
    }

    groups
        .into_iter()
        .map(|(filename, relative_path, mut pages)| {
            pages.sort_by_key(|(page, _)| *page);
            let text = pages
                .into_iter()
                .map(|(_, text)| text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            SearchableRecord::new(filename, relative_path, WHOLE_DOCUMENT_PAGE, text)
        })
        .collect()
}
