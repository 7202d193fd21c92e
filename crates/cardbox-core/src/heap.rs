//! Per-record file heap.
//!
//! Each record lives in its own JSON document at
//! `<data_root>/<category>/<id>.json`. The file name is the record id, so a
//! point lookup is a single path construction plus one read, with no shared
//! file to contend on. All writes go through [`crate::safe_io::atomic_write_json`],
//! so a record file is only ever observed in its old or new state.
//!
//! Corruption policy: a file that is missing, empty, or undecodable is
//! treated as an absent record. Reads and scans skip it silently (with a
//! stderr warning from the loader); an update to a corrupt-but-present file
//! rebuilds the record from the incoming fields, keeping the identity from
//! the file name.

use crate::record::{Fields, Record};
use crate::safe_io::{atomic_write_json, load_json_or_default};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File-per-record heap under a single data root.
///
/// Categories ("contacts", "notes", ...) map to subdirectories and are
/// expected to be plain path-safe identifiers. The store holds no in-memory
/// state beyond the root path; every operation goes to disk.
#[derive(Debug, Clone)]
pub struct RecordStore {
    data_root: PathBuf,
}

impl RecordStore {
    /// Opens a heap rooted at `data_root`, creating the directory if needed.
    pub fn new(data_root: impl Into<PathBuf>) -> io::Result<Self> {
        let data_root = data_root.into();
        fs::create_dir_all(&data_root)?;
        Ok(Self { data_root })
    }

    /// Directory holding all records of one category.
    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.data_root.join(category)
    }

    /// Path of a single record file.
    pub fn record_path(&self, category: &str, id: &str) -> PathBuf {
        self.category_dir(category).join(format!("{id}.json"))
    }

    /// Pre-creates a category directory so an empty category is visible on
    /// disk. Writes create it on demand anyway.
    pub fn ensure_category(&self, category: &str) -> io::Result<()> {
        fs::create_dir_all(self.category_dir(category))
    }

    /// Creates a new record from `fields` and persists it.
    ///
    /// The store assigns the id and both timestamps; any `id`, `created_at`
    /// or `updated_at` keys in `fields` are discarded first. Returns the
    /// stored record, including its generated identity.
    pub fn create(&self, category: &str, fields: Fields) -> io::Result<Record> {
        let record = Record::new(fields);
        atomic_write_json(&self.record_path(category, &record.id), &record)?;
        Ok(record)
    }

    /// Reads one record by id. Missing and corrupt files both come back as
    /// `None`; there is no error channel for a point read.
    pub fn read(&self, category: &str, id: &str) -> Option<Record> {
        load_json_or_default::<Option<Record>>(&self.record_path(category, id))
    }

    /// Replaces the stored fields of an existing record.
    ///
    /// Returns `Ok(None)` when no file exists for `id`. Otherwise the whole
    /// field set is swapped for `fields` while `id` and `created_at` are
    /// carried over and `updated_at` is refreshed; the stored successor is
    /// returned so callers can index exactly what landed on disk. If the
    /// existing file no longer decodes, the record is rebuilt around the id
    /// from the file name with fresh timestamps.
    pub fn update(&self, category: &str, id: &str, fields: Fields) -> io::Result<Option<Record>> {
        let path = self.record_path(category, id);
        if !path.exists() {
            return Ok(None);
        }
        let successor = match load_json_or_default::<Option<Record>>(&path) {
            Some(existing) => existing.replaced(fields),
            None => Record::with_id(id, fields),
        };
        atomic_write_json(&path, &successor)?;
        Ok(Some(successor))
    }

    /// Removes a record file. `Ok(false)` when it was already gone; deletion
    /// is terminal, the id is never reused.
    pub fn delete(&self, category: &str, id: &str) -> io::Result<bool> {
        match fs::remove_file(self.record_path(category, id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Lazily walks every decodable record of a category.
    ///
    /// Directory order is whatever the filesystem yields; corrupt files,
    /// dot-files and non-JSON entries are skipped. A missing category
    /// directory is an empty scan, not an error. Each call re-reads the
    /// directory, so the scan reflects the heap at iteration time.
    pub fn scan_all(&self, category: &str) -> io::Result<RecordScan> {
        let dir = match fs::read_dir(self.category_dir(category)) {
            Ok(dir) => Some(dir),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };
        Ok(RecordScan { dir })
    }
}

/// Lazy iterator over the record files of one category.
///
/// Produced by [`RecordStore::scan_all`]; yields records one file at a time
/// instead of materializing the category in memory.
#[derive(Debug)]
pub struct RecordScan {
    dir: Option<fs::ReadDir>,
}

impl Iterator for RecordScan {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let dir = self.dir.as_mut()?;
        for entry in dir {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            if !is_record_file(&path) {
                continue;
            }
            if let Some(record) = load_json_or_default::<Option<Record>>(&path) {
                return Some(record);
            }
        }
        None
    }
}

/// Record files are `<id>.json`; temp files and editor droppings start with
/// a dot and are never picked up by a scan.
fn is_record_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    !name.starts_with('.') && path.extension().is_some_and(|ext| ext == "json")
}
