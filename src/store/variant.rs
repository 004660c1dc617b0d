//! Variant stores: one CSV per OCR engine/language configuration.

use std::path::Path;

use tracing::{debug, warn};

use super::schema::{page_field, text_field, Columns, LoadReport};
use super::StoreError;
use crate::models::{PageIdentity, SearchableRecord, VariantRecord, VariantSource};

/// Contents of one variant store.
#[derive(Debug, Clone)]
pub struct VariantStore {
    pub source: VariantSource,
    pub records: Vec<VariantRecord>,
    pub report: LoadReport,
}

/// Load a variant store with explicit schema coercion.
///
/// Required columns: `filename`, `page`, `text`. A missing `relative_path`
/// column (older harvests) becomes an empty path for every row. Rows with a
/// non-empty `error` column contribute an empty text slot.
pub fn load_variant_store(path: &Path, source: VariantSource) -> Result<VariantStore, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| StoreError::csv(path, e))?;
    let columns = Columns::new(reader.headers().map_err(|e| StoreError::csv(path, e))?.clone());

    let filename_col = columns.require(path, "filename")?;
    let page_col = columns.require(path, "page")?;
    let text_col = columns.require(path, "text")?;
    let path_col = columns.find("relative_path");
    let error_col = columns.find("error");

    if path_col.is_none() {
        warn!(
            "{} has no relative_path column; using an empty path for every row",
            path.display()
        );
    }

    let engine_tag = source.tag();
    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for (i, row) in reader.records().enumerate() {
        let row = row.map_err(|e| StoreError::csv(path, e))?;
        let line = i as u64 + 2;

        let Some(page) = page_field(path, line, &row, page_col, &mut report) else {
            continue;
        };
        let (filename, _) = text_field(&row, Some(filename_col));
        let (relative_path, _) = text_field(&row, path_col);
        let (mut raw_text, coerced) = text_field(&row, Some(text_col));
        if coerced {
            report.coerced += 1;
            warn!("{}:{}: missing text coerced to empty", path.display(), line);
        }

        let (error, _) = text_field(&row, error_col);
        if !error.trim().is_empty() {
            report.coerced += 1;
            warn!(
                "{}:{}: OCR error recorded for {} p{}, treating text as empty: {}",
                path.display(),
                line,
                filename,
                page,
                error
            );
            raw_text.clear();
        }

        records.push(VariantRecord {
            identity: PageIdentity::new(relative_path, filename, page),
            engine_tag: engine_tag.clone(),
            raw_text,
        });
        report.rows += 1;
    }

    debug!(
        "Loaded {} rows from {} ({} coerced, {} skipped)",
        report.rows,
        path.display(),
        report.coerced,
        report.skipped
    );

    Ok(VariantStore {
        source,
        records,
        report,
    })
}

/// Load any page store as flat searchable records.
///
/// `text_column` names the column to search (`text` for variant stores).
pub fn load_searchable(
    path: &Path,
    text_column: &'static str,
) -> Result<(Vec<SearchableRecord>, LoadReport), StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| StoreError::csv(path, e))?;
    let columns = Columns::new(reader.headers().map_err(|e| StoreError::csv(path, e))?.clone());

    let filename_col = columns.require(path, "filename")?;
    let page_col = columns.require(path, "page")?;
    let text_col = columns.find(text_column);
    let path_col = columns.find("relative_path");

    if text_col.is_none() {
        warn!(
            "{} has no '{}' column; matching on filenames only",
            path.display(),
            text_column
        );
    }

    let mut report = LoadReport::default();
    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row.map_err(|e| StoreError::csv(path, e))?;
        let line = i as u64 + 2;

        let Some(page) = page_field(path, line, &row, page_col, &mut report) else {
            continue;
        };
        let (filename, _) = text_field(&row, Some(filename_col));
        let (relative_path, _) = text_field(&row, path_col);
        let (text, coerced) = text_field(&row, text_col);
        if coerced {
            report.coerced += 1;
            warn!("{}:{}: missing text coerced to empty", path.display(), line);
        }

        records.push(SearchableRecord::new(filename, relative_path, page, text));
        report.rows += 1;
    }

    Ok((records, report))
}

/// Find every `summary_{engine}_{lang}.csv` in a directory, sorted by name.
pub fn discover_variant_sources(text_dir: &Path) -> Result<Vec<VariantSource>, StoreError> {
    let entries = std::fs::read_dir(text_dir).map_err(|e| StoreError::io(text_dir, e))?;

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();

    Ok(names
        .iter()
        .filter_map(|name| VariantSource::from_file_name(name))
        .collect())
}
