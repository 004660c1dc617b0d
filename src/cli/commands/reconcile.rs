//! Reconcile command.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::checkpoint::RetryPolicy;
use crate::cli::icons::{dim_arrow, error, info, success, warn};
use crate::config::Settings;
use crate::llm::{create_reviewer, parse_model_list, OllamaReviewer, ReviewerProvider};
use crate::models::MergedPageRecord;
use crate::reconcile::{
    load_variant_stores, select_pending, PageEvent, Pipeline, ReconciliationEngine,
    RetryController, RunOptions,
};

/// Arguments for the reconcile command.
#[derive(Debug, Clone, Default)]
pub struct ReconcileArgs {
    pub redo: bool,
    pub retry_errors: bool,
    pub limit: Option<usize>,
    pub provider: Option<ReviewerProvider>,
    pub models: Option<String>,
}

/// Pages the run will submit: pages with text, capped by `limit`.
fn progress_len(pending: &[MergedPageRecord], limit: Option<usize>) -> usize {
    let with_text = pending.iter().filter(|p| p.has_text()).count();
    limit.map_or(with_text, |l| l.min(with_text))
}

/// Merge variant stores and reconcile every pending page.
pub async fn cmd_reconcile(settings: &Settings, args: ReconcileArgs) -> anyhow::Result<()> {
    let mut reviewer_config = settings.reviewer.clone();
    if let Some(provider) = args.provider {
        reviewer_config = reviewer_config.with_provider(provider);
    }
    if let Some(models) = args.models.as_deref() {
        reviewer_config = reviewer_config.with_models(parse_model_list(models));
    }
    if let Some(hint) = reviewer_config.availability_hint() {
        anyhow::bail!(hint);
    }

    let sources = settings.variant_sources()?;
    let stores = load_variant_stores(&settings.text_dir, &sources)?;
    println!(
        "{} Loaded {} variant stores from {}",
        info(),
        stores.len(),
        settings.text_dir.display()
    );
    for store in &stores {
        println!(
            "  {} {} ({} rows)",
            dim_arrow(),
            store.source,
            store.report.rows
        );
        if store.report.coerced > 0 || store.report.skipped > 0 {
            println!(
                "    {} {} values coerced, {} rows skipped",
                warn(),
                store.report.coerced,
                store.report.skipped
            );
        }
    }

    let output = settings.consolidated_store();
    let run_options = RunOptions {
        redo: args.redo,
        policy: RetryPolicy::from_retry_errors(
            args.retry_errors || settings.pipeline.retry_errors,
        ),
        limit: args.limit,
    };
    let pending = select_pending(&stores, &output, &run_options)?;

    if pending.is_empty() {
        println!("{} Nothing to reconcile", success());
        return Ok(());
    }

    let models = reviewer_config.models();
    println!(
        "{} Reconciling {} pages with {} ({})",
        info(),
        pending.len(),
        reviewer_config.provider.as_str(),
        models.join(", ")
    );
    println!("  {} Writing to {}", dim_arrow(), output.path().display());

    if reviewer_config.provider == ReviewerProvider::Ollama {
        let ollama = OllamaReviewer::new(reviewer_config.clone())?;
        let installed = ollama.list_models().await.map_err(|e| {
            anyhow::anyhow!(
                "Ollama is not reachable at {}: {}",
                reviewer_config.endpoint(),
                e
            )
        })?;
        for model in models.iter().filter(|m| !installed.contains(m)) {
            println!(
                "  {} Model {} is not installed (ollama pull {})",
                warn(),
                model,
                model
            );
        }
    }

    let reviewer = create_reviewer(&reviewer_config)?;
    let engine = ReconciliationEngine::from_config(reviewer, &reviewer_config)?;
    let controller = RetryController::from_config(&settings.pipeline);
    let mut pipeline = Pipeline::new(engine, controller, output);

    let pb = ProgressBar::new(progress_len(&pending, args.limit) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let summary = pipeline
        .run(pending, args.limit, |event| match event {
            PageEvent::Reconciled(record) => {
                pb.inc(1);
                pb.set_message(record.identity.to_string());
                if let Some(err) = &record.error {
                    pb.println(format!("  {} {}: {}", error(), record.identity, err));
                }
            }
            PageEvent::Skipped(identity) => {
                pb.println(format!("  {} {} has no text, skipped", dim_arrow(), identity));
            }
            PageEvent::Halted { consecutive } => {
                pb.println(format!(
                    "  {} {} consecutive failures, stopping",
                    error(),
                    consecutive
                ));
            }
        })
        .await?;
    pb.finish_and_clear();

    println!(
        "{} {} pages processed: {} succeeded, {} failed",
        if summary.failed == 0 { success() } else { warn() },
        summary.processed,
        style(summary.succeeded).green(),
        style(summary.failed).red()
    );
    if summary.skipped_empty > 0 {
        println!("  {} {} empty pages skipped", dim_arrow(), summary.skipped_empty);
    }

    if summary.halted {
        anyhow::bail!(
            "Run halted after repeated reviewer failures; rerun to resume from the checkpoint"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageIdentity;

    #[test]
    fn test_progress_len_ignores_empty_pages() {
        let mut pending: Vec<MergedPageRecord> = (0..3)
            .map(|p| MergedPageRecord {
                identity: PageIdentity::new("", "a.pdf", p),
                variants: vec![format!("page {}", p)],
            })
            .collect();
        pending.push(MergedPageRecord::empty(PageIdentity::new("", "b.pdf", 0), 2));

        assert_eq!(progress_len(&pending, None), 3);
        assert_eq!(progress_len(&pending, Some(2)), 2);
        assert_eq!(progress_len(&pending, Some(10)), 3);
    }
}
