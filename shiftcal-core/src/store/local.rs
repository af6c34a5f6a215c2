//! File-backed record store: one JSON document per record.
//!
//! Layout: `<root>/<user_id>/<record_id>.json`

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::{ShiftcalError, ShiftcalResult};
use crate::record::{Link, ServiceRecord};
use crate::store::RecordStore;

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create or replace a record document.
    pub fn put_record(&self, record: &ServiceRecord) -> ShiftcalResult<()> {
        validate_segment(&record.user_id)?;
        validate_segment(&record.id)?;

        let dir = self.root.join(&record.user_id);
        std::fs::create_dir_all(&dir)?;

        // A record moved to another user must not leave its old copy behind
        if let Some(existing) = self.find_record_path(&record.id)? {
            if existing.parent() != Some(dir.as_path()) {
                std::fs::remove_file(&existing)?;
            }
        }

        write_record(&dir.join(format!("{}.json", record.id)), record)
    }

    fn find_record_path(&self, record_id: &str) -> ShiftcalResult<Option<PathBuf>> {
        validate_segment(record_id)?;

        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Ok(None);
        };

        let file_name = format!("{}.json", record_id);
        let path = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .map(|dir| dir.join(&file_name))
            .find(|path| path.exists());

        Ok(path)
    }

    fn update_link(&self, record_id: &str, link: &Link) -> ShiftcalResult<()> {
        let path = self
            .find_record_path(record_id)?
            .ok_or_else(|| ShiftcalError::RecordNotFound(record_id.to_string()))?;

        let mut record = read_record(&path)?;
        record.link = link.clone();
        write_record(&path, &record)
    }
}

#[async_trait]
impl RecordStore for LocalStore {
    async fn list_records(&self, user_id: &str) -> ShiftcalResult<Vec<ServiceRecord>> {
        validate_segment(user_id)?;

        let Ok(entries) = std::fs::read_dir(self.root.join(user_id)) else {
            return Ok(Vec::new());
        };

        let mut records: Vec<ServiceRecord> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == "json"))
            .filter_map(|path| match read_record(&path) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Skipping unreadable record {}: {}", path.display(), e);
                    None
                }
            })
            .collect();

        records.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn get_record(&self, record_id: &str) -> ShiftcalResult<Option<ServiceRecord>> {
        match self.find_record_path(record_id)? {
            Some(path) => read_record(&path).map(Some),
            None => Ok(None),
        }
    }

    async fn write_link(&self, record_id: &str, link: &Link) -> ShiftcalResult<()> {
        self.update_link(record_id, link)
    }

    async fn clear_links(&self, record_id: &str) -> ShiftcalResult<()> {
        self.update_link(record_id, &Link::default())
    }

    async fn delete_record(&self, record_id: &str) -> ShiftcalResult<()> {
        if let Some(path) = self.find_record_path(record_id)? {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Ids become file and directory names.
fn validate_segment(id: &str) -> ShiftcalResult<()> {
    let invalid = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\'])
        || id.starts_with('.');

    if invalid {
        return Err(ShiftcalError::Store(format!("Invalid identifier '{}'", id)));
    }
    Ok(())
}

fn read_record(path: &Path) -> ShiftcalResult<ServiceRecord> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| ShiftcalError::Serialization(format!("{}: {}", path.display(), e)))
}

/// Write through a temp file so a crash never leaves a truncated document.
fn write_record(path: &Path, record: &ServiceRecord) -> ShiftcalResult<()> {
    let content = serde_json::to_string_pretty(record)
        .map_err(|e| ShiftcalError::Serialization(e.to_string()))?;

    let temp = path.with_extension("json.tmp");
    std::fs::write(&temp, content)?;
    std::fs::rename(&temp, path)?;
    Ok(())
}
