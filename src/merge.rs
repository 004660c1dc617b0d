//! Variant merger: full outer join of K variant stores on page identity.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::models::{MergedPageRecord, PageIdentity};
use crate::store::VariantStore;

/// Join variant stores into one record per page.
///
/// Every identity present in any store yields exactly one
/// [`MergedPageRecord`] with `stores.len()` slots; slot `i` holds the text
/// from `stores[i]` or an empty string when that store lacks the page.
/// Output is sorted by identity, so pages of a document are adjacent and in
/// page order.
///
/// Identity keys are already normalized by the store loader, so a page
/// written as `3` in one store and `3.0` in another joins correctly.
pub fn merge_variants(stores: &[VariantStore]) -> Vec<MergedPageRecord> {
    let slots = stores.len();
    let mut merged: BTreeMap<PageIdentity, MergedPageRecord> = BTreeMap::new();

    for (slot, store) in stores.iter().enumerate() {
        for record in &store.records {
            let entry = merged
                .entry(record.identity.clone())
                .or_insert_with(|| MergedPageRecord::empty(record.identity.clone(), slots));

            let current = &mut entry.variants[slot];
            if current.is_empty() {
                *current = record.raw_text.clone();
            } else if !record.raw_text.is_empty() {
                warn!(
                    "Duplicate {} row for {}; keeping the first",
                    record.engine_tag, record.identity
                );
            }
        }
    }

    debug!("Merged {} variant stores into {} pages", slots, merged.len());
    merged.into_values().collect()
}
