//! Append-only consolidated store of canonical records.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::schema::{page_field, text_field, Columns, LoadReport};
use super::StoreError;
use crate::models::{CanonicalRecord, PageIdentity, CONSOLIDATED_COLUMNS};

/// CSV sink for reconciled pages.
///
/// The header is written exactly once, when the file is created. Every
/// record is appended as a single row and flushed immediately, so progress
/// survives a crash or a manual stop. The file is never rewritten in place.
#[derive(Debug, Clone)]
pub struct ConsolidatedStore {
    path: PathBuf,
}

impl ConsolidatedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create the store (and parent directories) with only a header row.
    /// Does nothing if the store already exists.
    pub fn ensure_exists(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        let is_empty = file
            .metadata()
            .map_err(|e| StoreError::io(&self.path, e))?
            .len()
            == 0;

        if is_empty {
            debug!("Creating consolidated store at {}", self.path.display());
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file);
            writer
                .write_record(CONSOLIDATED_COLUMNS)
                .map_err(|e| StoreError::csv(&self.path, e))?;
            writer.flush().map_err(|e| StoreError::io(&self.path, e))?;
        }
        Ok(())
    }

    /// Append one record and flush it to disk.
    pub fn append(&self, record: &CanonicalRecord) -> Result<(), StoreError> {
        self.ensure_exists()?;

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer
            .write_record(record.to_row())
            .map_err(|e| StoreError::csv(&self.path, e))?;
        writer.flush().map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }

    /// Read every row in file order. A missing store, or one left without a
    /// header row by an interrupted create, reads as empty.
    pub fn load(&self) -> Result<(Vec<CanonicalRecord>, LoadReport), StoreError> {
        if !self.path.exists() {
            return Ok((Vec::new(), LoadReport::default()));
        }

        let path = self.path.as_path();
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| StoreError::csv(path, e))?;
        let headers = reader.headers().map_err(|e| StoreError::csv(path, e))?.clone();
        if headers.is_empty() {
            debug!("{} has no header row yet", path.display());
            return Ok((Vec::new(), LoadReport::default()));
        }
        let columns = Columns::new(headers);

        let path_col = columns.require(path, "relative_path")?;
        let filename_col = columns.require(path, "filename")?;
        let page_col = columns.require(path, "page")?;
        let clean_col = columns.find("clean_text");
        let type_col = columns.find("meta_type");
        let subject_col = columns.find("meta_subject");
        let entities_col = columns.find("meta_entities");
        let context_col = columns.find("vector_context");
        let error_col = columns.find("error");

        let mut report = LoadReport::default();
        let mut records = Vec::new();
        for (i, row) in reader.records().enumerate() {
            let row = row.map_err(|e| StoreError::csv(path, e))?;
            let line = i as u64 + 2;

            let Some(page) = page_field(path, line, &row, page_col, &mut report) else {
                continue;
            };
            let field = |index: Option<usize>| text_field(&row, index).0;
            let error = field(error_col);

            records.push(CanonicalRecord {
                identity: PageIdentity::new(
                    field(Some(path_col)),
                    field(Some(filename_col)),
                    page,
                ),
                clean_text: field(clean_col),
                meta_type: field(type_col),
                meta_subject: field(subject_col),
                meta_entities: field(entities_col),
                vector_context: field(context_col),
                error: if error.is_empty() { None } else { Some(error) },
            });
            report.rows += 1;
        }

        Ok((records, report))
    }

    /// Latest record per identity; later rows supersede earlier ones.
    pub fn latest(&self) -> Result<BTreeMap<PageIdentity, CanonicalRecord>, StoreError> {
        let (records, _) = self.load()?;
        let mut latest = BTreeMap::new();
        let mut duplicates = 0usize;
        for record in records {
            if latest.insert(record.identity.clone(), record).is_some() {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            warn!(
                "{} holds {} superseded rows",
                self.path.display(),
                duplicates
            );
        }
        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn success(page: u32) -> CanonicalRecord {
        CanonicalRecord::success(
            PageIdentity::new("law", "a.pdf", page),
            "ข้อความ \"quoted\",\nnext line".to_string(),
            "ระเบียบ".to_string(),
            "subject".to_string(),
            "a,b".to_string(),
        )
    }

    #[test]
    fn test_missing_store_loads_empty() {
        let dir = tempdir().unwrap();
        let store = ConsolidatedStore::new(dir.path().join("out.csv"));
        let (records, _) = store.load().unwrap();
        assert!(records.is_empty());
        assert!(!store.exists());
    }

    #[test]
    fn test_zero_byte_store_loads_empty_and_recovers() {
        let dir = tempdir().unwrap();
        let store = ConsolidatedStore::new(dir.path().join("out.csv"));
        fs::write(store.path(), "").unwrap();

        assert!(store.latest().unwrap().is_empty());
        let (records, report) = store.load().unwrap();
        assert!(records.is_empty());
        assert_eq!(report.rows, 0);

        store.append(&success(0)).unwrap();
        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(contents.starts_with("relative_path,filename,page,clean_text"));
        assert_eq!(store.latest().unwrap().len(), 1);
    }

    #[test]
    fn test_ensure_exists_writes_header_once() {
        let dir = tempdir().unwrap();
        let store = ConsolidatedStore::new(dir.path().join("nested/out.csv"));
        store.ensure_exists().unwrap();
        store.ensure_exists().unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.starts_with("relative_path,filename,page,clean_text"));
    }

    #[test]
    fn test_append_and_load_preserves_fields() {
        let dir = tempdir().unwrap();
        let store = ConsolidatedStore::new(dir.path().join("out.csv"));
        store.append(&success(0)).unwrap();
        store
            .append(&CanonicalRecord::failure(
                PageIdentity::new("law", "a.pdf", 1),
                "Gemini API Error: 429",
            ))
            .unwrap();

        let (records, report) = store.load().unwrap();
        assert_eq!(report.rows, 2);
        assert_eq!(records[0], success(0));
        assert_eq!(records[1].error.as_deref(), Some("Gemini API Error: 429"));
        assert!(records[1].clean_text.is_empty());
    }

    #[test]
    fn test_latest_last_row_wins() {
        let dir = tempdir().unwrap();
        let store = ConsolidatedStore::new(dir.path().join("out.csv"));
        let id = PageIdentity::new("law", "a.pdf", 0);
        store
            .append(&CanonicalRecord::failure(id.clone(), "timeout"))
            .unwrap();
        store.append(&success(0)).unwrap();

        let latest = store.latest().unwrap();
        assert_eq!(latest.len(), 1);
        assert!(!latest[&id].is_error());
    }
}
