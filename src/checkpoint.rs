//! Checkpoint filter: skip pages the consolidated store already holds.
//!
//! Resumption is idempotence-by-skip. A rerun never resubmits a reconciled
//! page to the reviewer; it only works through what is still missing.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{CanonicalRecord, MergedPageRecord, PageIdentity};

/// What to do with identities whose stored record is an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetryPolicy {
    /// Any stored identity is done, success or error.
    #[default]
    Terminal,
    /// Identities whose latest stored record is an error are pending again.
    RetryErrors,
}

impl RetryPolicy {
    /// Policy for a `retry_errors` flag.
    pub fn from_retry_errors(retry_errors: bool) -> Self {
        if retry_errors {
            Self::RetryErrors
        } else {
            Self::Terminal
        }
    }
}

/// Anti-join `pages` against the consolidated store contents.
///
/// `done` maps each stored identity to its latest record. An empty map (first
/// run, or no store yet) returns `pages` unchanged. Input order is kept.
pub fn pending_pages(
    pages: Vec<MergedPageRecord>,
    done: &BTreeMap<PageIdentity, CanonicalRecord>,
    policy: RetryPolicy,
) -> Vec<MergedPageRecord> {
    if done.is_empty() {
        return pages;
    }

    let skip: HashSet<&PageIdentity> = done
        .iter()
        .filter(|(_, record)| match policy {
            RetryPolicy::Terminal => true,
            RetryPolicy::RetryErrors => !record.is_error(),
        })
        .map(|(identity, _)| identity)
        .collect();

    let total = pages.len();
    let pending: Vec<MergedPageRecord> = pages
        .into_iter()
        .filter(|page| !skip.contains(&page.identity))
        .collect();

    info!(
        "Checkpoint: {} of {} pages already reconciled, {} pending",
        total - pending.len(),
        total,
        pending.len()
    );
    pending
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_flag() {
        assert_eq!(RetryPolicy::from_retry_errors(false), RetryPolicy::Terminal);
        assert_eq!(RetryPolicy::from_retry_errors(true), RetryPolicy::RetryErrors);
    }

    fn page(filename: &str, page: u32) -> MergedPageRecord {
        MergedPageRecord {
            identity: PageIdentity::new("", filename, page),
            variants: vec!["text".to_string()],
        }
    }

    fn done(records: Vec<CanonicalRecord>) -> BTreeMap<PageIdentity, CanonicalRecord> {
        records
            .into_iter()
            .map(|r| (r.identity.clone(), r))
            .collect()
    }

    fn ok(filename: &str, p: u32) -> CanonicalRecord {
        CanonicalRecord::success(
            PageIdentity::new("", filename, p),
            "t".into(),
            "d".into(),
            "s".into(),
            "e".into(),
        )
    }

    #[test]
    fn test_empty_store_returns_everything() {
        let pages = vec![page("a.pdf", 0), page("a.pdf", 1)];
        let pending = pending_pages(pages.clone(), &BTreeMap::new(), RetryPolicy::Terminal);
        assert_eq!(pending, pages);
    }

    #[test]
    fn test_excludes_identities_regardless_of_error_state() {
        let pages = vec![page("a.pdf", 0), page("a.pdf", 1), page("b.pdf", 0)];
        let done = done(vec![
            ok("a.pdf", 0),
            CanonicalRecord::failure(PageIdentity::new("", "a.pdf", 1), "429"),
        ]);

        let pending = pending_pages(pages, &done, RetryPolicy::Terminal);
        assert_eq!(pending, vec![page("b.pdf", 0)]);
    }

    #[test]
    fn test_retry_errors_policy_requeues_failures() {
        let pages = vec![page("a.pdf", 0), page("a.pdf", 1)];
        let done = done(vec![
            ok("a.pdf", 0),
            CanonicalRecord::failure(PageIdentity::new("", "a.pdf", 1), "429"),
        ]);

        let pending = pending_pages(pages, &done, RetryPolicy::RetryErrors);
        assert_eq!(pending, vec![page("a.pdf", 1)]);
    }

    #[test]
    fn test_identity_match_is_exact() {
        let pages = vec![MergedPageRecord {
            identity: PageIdentity::new("other", "a.pdf", 0),
            variants: vec!["x".into()],
        }];
        let pending = pending_pages(pages.clone(), &done(vec![ok("a.pdf", 0)]), RetryPolicy::Terminal);
        assert_eq!(pending, pages);
    }
}
