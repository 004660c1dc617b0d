//! Status command.

use serde::Serialize;

use crate::checkpoint::{pending_pages, RetryPolicy};
use crate::cli::icons::{dim_arrow, info, warn};
use crate::config::Settings;
use crate::merge::merge_variants;
use crate::reconcile::load_variant_stores;

#[derive(Debug, Serialize)]
struct StatusReport {
    text_dir: String,
    output: String,
    variants: Vec<String>,
    merged_pages: usize,
    empty_pages: usize,
    reconciled: usize,
    errors: usize,
    pending: usize,
}

/// Count pages the way `reconcile` would select them.
fn build_report(settings: &Settings) -> anyhow::Result<StatusReport> {
    let sources = settings.variant_sources()?;
    let stores = load_variant_stores(&settings.text_dir, &sources)?;
    let merged = merge_variants(&stores);
    let empty_pages = merged.iter().filter(|p| !p.has_text()).count();

    let output = settings.consolidated_store();
    let done = output.latest()?;
    let errors = done.values().filter(|r| r.is_error()).count();
    let merged_pages = merged.len();
    let policy = RetryPolicy::from_retry_errors(settings.pipeline.retry_errors);
    let pending = pending_pages(merged, &done, policy)
        .iter()
        .filter(|p| p.has_text())
        .count();

    Ok(StatusReport {
        text_dir: settings.text_dir.display().to_string(),
        output: output.path().display().to_string(),
        variants: sources.iter().map(|s| s.tag()).collect(),
        merged_pages,
        empty_pages,
        reconciled: done.len() - errors,
        errors,
        pending,
    })
}

/// Show pipeline progress.
pub async fn cmd_status(settings: &Settings, json: bool) -> anyhow::Result<()> {
    let report = build_report(settings)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} Variant stores in {}", info(), report.text_dir);
    for variant in &report.variants {
        println!("  {} {}", dim_arrow(), variant);
    }
    println!("{} {} pages ({} with no text)", info(), report.merged_pages, report.empty_pages);
    println!("{} Consolidated store {}", info(), report.output);
    println!("  {} {} reconciled", dim_arrow(), report.reconciled);
    if report.errors > 0 {
        println!(
            "  {} {} errors (use `reconcile --retry-errors` to resubmit)",
            warn(),
            report.errors
        );
    }
    println!("  {} {} pending", dim_arrow(), report.pending);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalRecord, PageIdentity};
    use tempfile::tempdir;

    #[test]
    fn test_pending_follows_retry_setting() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("summary_tesseract_tha.csv"),
            "filename,relative_path,page,text\na.pdf,law,0,ระเบียบ\na.pdf,law,1,เทคโนโลยี\na.pdf,law,2,\n",
        )
        .unwrap();
        let mut settings = Settings {
            text_dir: dir.path().to_path_buf(),
            output: dir.path().join("out/consolidated.csv"),
            ..Settings::default()
        };
        settings
            .consolidated_store()
            .append(&CanonicalRecord::failure(
                PageIdentity::new("law", "a.pdf", 0),
                "timeout",
            ))
            .unwrap();

        let report = build_report(&settings).unwrap();
        assert_eq!(report.merged_pages, 3);
        assert_eq!(report.empty_pages, 1);
        assert_eq!(report.errors, 1);
        assert_eq!(report.pending, 1);

        settings.pipeline.retry_errors = true;
        let report = build_report(&settings).unwrap();
        assert_eq!(report.pending, 2);
    }
}
