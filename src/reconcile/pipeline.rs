//! The reconciliation run loop.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info};

use super::controller::{FailureAction, RetryController};
use super::engine::ReconciliationEngine;
use crate::checkpoint::{pending_pages, RetryPolicy};
use crate::merge::merge_variants;
use crate::models::{CanonicalRecord, MergedPageRecord, PageIdentity, VariantSource};
use crate::store::{load_variant_store, ConsolidatedStore, StoreError, VariantStore};

/// Errors that stop a run outright.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("No variant stores configured or found in {0}")]
    NoVariants(String),
}

/// How pending pages are selected.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Ignore the checkpoint and resubmit every page.
    pub redo: bool,
    /// Treatment of stored error records.
    pub policy: RetryPolicy,
    /// Submit at most this many pages to the reviewer.
    pub limit: Option<usize>,
}

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Pages handed to the run loop.
    pub pending: usize,
    /// Pages submitted to the reviewer.
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Pages with no text in any variant.
    pub skipped_empty: usize,
    /// The failure streak tripped the circuit breaker.
    pub halted: bool,
}

/// Progress notifications emitted while the run loop works.
#[derive(Debug)]
pub enum PageEvent<'a> {
    Skipped(&'a PageIdentity),
    Reconciled(&'a CanonicalRecord),
    Halted { consecutive: u32 },
}

/// Load the variant stores for `sources` from `text_dir`, in order.
pub fn load_variant_stores(
    text_dir: &Path,
    sources: &[VariantSource],
) -> Result<Vec<VariantStore>, PipelineError> {
    if sources.is_empty() {
        return Err(PipelineError::NoVariants(text_dir.display().to_string()));
    }
    let mut stores = Vec::with_capacity(sources.len());
    for source in sources {
        let path = text_dir.join(source.file_name());
        let store = load_variant_store(&path, source.clone())?;
        info!(
            "Loaded {} ({} rows, {} coerced, {} skipped)",
            source, store.report.rows, store.report.coerced, store.report.skipped
        );
        stores.push(store);
    }
    Ok(stores)
}

/// Merge the variant stores and drop pages the checkpoint says are done.
pub fn select_pending(
    stores: &[VariantStore],
    output: &ConsolidatedStore,
    options: &RunOptions,
) -> Result<Vec<MergedPageRecord>, PipelineError> {
    let merged = merge_variants(stores);
    let pending = if options.redo {
        info!("Redo requested: ignoring {} checkpoint", output.path().display());
        merged
    } else {
        let done = output.latest()?;
        pending_pages(merged, &done, options.policy)
    };
    Ok(pending)
}

/// Sequential reconcile loop with throttling and a circuit breaker.
pub struct Pipeline {
    engine: ReconciliationEngine,
    controller: RetryController,
    output: ConsolidatedStore,
}

impl Pipeline {
    pub fn new(
        engine: ReconciliationEngine,
        controller: RetryController,
        output: ConsolidatedStore,
    ) -> Self {
        Self {
            engine,
            controller,
            output,
        }
    }

    /// Process `pages` one at a time.
    ///
    /// Every result is appended to the consolidated store as soon as it is
    /// produced. The run stops early when the controller halts; the halting
    /// failure is appended first and no cooldown follows it.
    pub async fn run<F>(
        &mut self,
        pages: Vec<MergedPageRecord>,
        limit: Option<usize>,
        mut on_event: F,
    ) -> Result<RunSummary, PipelineError>
    where
        F: FnMut(PageEvent<'_>),
    {
        self.output.ensure_exists()?;

        let mut summary = RunSummary {
            pending: pages.len(),
            ..Default::default()
        };
        let total = pages.len();

        for (i, page) in pages.iter().enumerate() {
            if limit.is_some_and(|limit| summary.processed >= limit) {
                info!("Limit of {} pages reached", summary.processed);
                break;
            }

            if !page.has_text() {
                summary.skipped_empty += 1;
                on_event(PageEvent::Skipped(&page.identity));
                continue;
            }

            let record = self.engine.reconcile(page).await;
            self.output.append(&record)?;
            summary.processed += 1;
            on_event(PageEvent::Reconciled(&record));

            let delay = if record.is_error() {
                summary.failed += 1;
                match self.controller.record_failure() {
                    FailureAction::Cooldown(delay) => delay,
                    FailureAction::Halt { consecutive } => {
                        error!(
                            "Stopping after {} consecutive reviewer failures; rerun to resume",
                            consecutive
                        );
                        summary.halted = true;
                        on_event(PageEvent::Halted { consecutive });
                        break;
                    }
                }
            } else {
                summary.succeeded += 1;
                self.controller.record_success()
            };

            if i + 1 < total {
                pause(delay).await;
            }
        }

        info!(
            "Run finished: {} processed, {} succeeded, {} failed, {} empty",
            summary.processed, summary.succeeded, summary.failed, summary.skipped_empty
        );
        Ok(summary)
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ReviewError, Reviewer};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    /// Fails every call whose index is in `fail_on`.
    struct FlakyReviewer {
        calls: AtomicUsize,
        fail_on: Vec<usize>,
    }

    #[async_trait]
    impl Reviewer for FlakyReviewer {
        fn provider_name(&self) -> &'static str {
            "flaky"
        }

        async fn review(&self, _model: &str, _prompt: &str) -> Result<String, ReviewError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.contains(&n) {
                Err(ReviewError::Connection("boom".into()))
            } else {
                Ok(r#"{"clean_text":"t","doc_type":"d","subject":"s","entities":"e"}"#.into())
            }
        }
    }

    fn pipeline(fail_on: Vec<usize>, threshold: u32, output: ConsolidatedStore) -> (Pipeline, Arc<FlakyReviewer>) {
        let reviewer = Arc::new(FlakyReviewer {
            calls: AtomicUsize::new(0),
            fail_on,
        });
        let engine =
            ReconciliationEngine::new(reviewer.clone(), vec!["m".into()], "{versions}").unwrap();
        let controller = RetryController::new(Duration::ZERO, Duration::ZERO, threshold);
        (Pipeline::new(engine, controller, output), reviewer)
    }

    fn pages(n: u32) -> Vec<MergedPageRecord> {
        (0..n)
            .map(|p| MergedPageRecord {
                identity: PageIdentity::new("", "a.pdf", p),
                variants: vec![format!("page {}", p)],
            })
            .collect()
    }

    #[tokio::test]
    async fn test_empty_pages_are_skipped_without_calls() {
        let dir = tempdir().unwrap();
        let output = ConsolidatedStore::new(dir.path().join("out.csv"));
        let (mut pipeline, reviewer) = pipeline(vec![], 10, output.clone());

        let mut input = pages(2);
        input.insert(1, MergedPageRecord::empty(PageIdentity::new("", "b.pdf", 0), 1));

        let summary = pipeline.run(input, None, |_| {}).await.unwrap();
        assert_eq!(summary.skipped_empty, 1);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(reviewer.calls.load(Ordering::SeqCst), 2);
        assert_eq!(output.load().unwrap().0.len(), 2);
    }

    #[tokio::test]
    async fn test_halts_after_streak() {
        let dir = tempdir().unwrap();
        let output = ConsolidatedStore::new(dir.path().join("out.csv"));
        let (mut pipeline, reviewer) = pipeline(vec![1, 2, 3], 3, output.clone());

        let mut halted_at = None;
        let summary = pipeline
            .run(pages(6), None, |event| {
                if let PageEvent::Halted { consecutive } = event {
                    halted_at = Some(consecutive);
                }
            })
            .await
            .unwrap();

        assert!(summary.halted);
        assert_eq!(halted_at, Some(3));
        assert_eq!(summary.processed, 4);
        assert_eq!(reviewer.calls.load(Ordering::SeqCst), 4);

        let (records, _) = output.load().unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records.iter().filter(|r| r.is_error()).count(), 3);
    }

    #[tokio::test]
    async fn test_limit_caps_reviewer_calls() {
        let dir = tempdir().unwrap();
        let output = ConsolidatedStore::new(dir.path().join("out.csv"));
        let (mut pipeline, _) = pipeline(vec![], 10, output.clone());

        let summary = pipeline.run(pages(5), Some(2), |_| {}).await.unwrap();
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.pending, 5);
    }

    #[tokio::test]
    async fn test_select_pending_respects_redo() {
        let dir = tempdir().unwrap();
        let output = ConsolidatedStore::new(dir.path().join("out.csv"));
        output.ensure_exists().unwrap();
        output
            .append(&CanonicalRecord::failure(PageIdentity::new("", "a.pdf", 0), "x"))
            .unwrap();

        let store = VariantStore {
            source: VariantSource::new("tesseract", "tha"),
            records: vec![crate::models::VariantRecord {
                identity: PageIdentity::new("", "a.pdf", 0),
                engine_tag: "tesseract_tha".into(),
                raw_text: "t".into(),
            }],
            report: Default::default(),
        };
        let stores = vec![store];

        let normal = select_pending(&stores, &output, &RunOptions::default()).unwrap();
        assert!(normal.is_empty());

        let retry = RunOptions {
            policy: RetryPolicy::RetryErrors,
            ..Default::default()
        };
        assert_eq!(select_pending(&stores, &output, &retry).unwrap().len(), 1);

        let redo = RunOptions {
            redo: true,
            ..Default::default()
        };
        assert_eq!(select_pending(&stores, &output, &redo).unwrap().len(), 1);
    }

    #[test]
    fn test_no_sources_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_variant_stores(dir.path(), &[]),
            Err(PipelineError::NoVariants(_))
        ));
    }
}
