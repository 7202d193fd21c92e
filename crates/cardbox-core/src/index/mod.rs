//! Secondary indexes over the record heap.
//!
//! Three index families share one layout idea: every entry lives in a small
//! JSON bucket file whose path is computed from the indexed value alone, so
//! locating an entry is pure path arithmetic with no directory-wide search.
//!
//! ```text
//! index_root/
//! ├── contact_first_name/     prefix family, partitioned by first two chars
//! │   ├── j/
//! │   │   └── o.json          { "john": ["id1"], "jonathan": ["id2"] }
//! │   └── _short/
//! │       └── j.json          values shorter than two characters
//! ├── contact_email/          hash family, partitioned by digest prefix
//! │   └── a1/
//! │       └── b2.json         { "<full digest>": ["id1"] }
//! └── note_creation_date/     date family, partitioned by calendar parts
//!     └── 2026/
//!         └── 08/
//!             └── 25.json     { "ids": ["id1", "id2"] }
//! ```
//!
//! Mutations run as load-mutate-rewrite under a per-bucket-file lock from
//! [`crate::lock::PathLocks`]; the rewrite itself goes through the atomic
//! rename in [`crate::safe_io`], so unsynchronized readers observe either the
//! old or the new bucket, never a torn one. Searches take no locks.

mod date;
mod hash;
mod prefix;

pub use date::DateQuery;

use crate::lock::PathLocks;
use crate::safe_io::{atomic_write_json, load_json_or_default};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Bucket file body for the prefix and hash families: full key (normalized
/// value or digest) to the ids currently holding it. `BTreeMap` keeps the
/// serialized form stable across rewrites.
type Bucket = BTreeMap<String, Vec<String>>;

/// Bucket-file index store rooted at a single directory.
///
/// Index names ("contact_first_name", "note_tag", ...) map to subdirectories
/// and are expected to be plain path-safe identifiers. The store is family
/// agnostic: nothing stops a caller from mixing families under one name, the
/// repository layer is what keeps each name on a single family.
#[derive(Debug)]
pub struct IndexStore {
    index_root: PathBuf,
    locks: PathLocks,
}

impl IndexStore {
    /// Opens an index store rooted at `index_root`, creating the directory
    /// if needed.
    pub fn new(index_root: impl Into<PathBuf>) -> io::Result<Self> {
        let index_root = index_root.into();
        fs::create_dir_all(&index_root)?;
        Ok(Self {
            index_root,
            locks: PathLocks::new(),
        })
    }

    /// Directory holding every bucket of one index.
    pub fn index_dir(&self, index: &str) -> PathBuf {
        self.index_root.join(index)
    }

    /// Pre-creates an index directory so an empty index is visible on disk.
    pub fn ensure_index(&self, index: &str) -> io::Result<()> {
        fs::create_dir_all(self.index_dir(index))
    }

    /// Deletes and recreates one index directory, discarding every entry it
    /// held. Nothing here depends on the prior contents, which is what makes
    /// a rebuild immune to accumulated drift.
    pub fn clear_index(&self, index: &str) -> io::Result<()> {
        let dir = self.index_dir(index);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        fs::create_dir_all(&dir)
    }

    /// Load-mutate-rewrite cycle on one bucket file under its path lock.
    ///
    /// A missing or corrupt bucket starts from `B::default()`. The mutation
    /// closure reports whether it changed anything; an unchanged bucket is
    /// not rewritten.
    fn rewrite_bucket<B, F>(&self, path: &Path, mutate: F) -> io::Result<()>
    where
        B: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut B) -> bool,
    {
        let lock = self.locks.acquire(path);
        let _guard = lock.lock().unwrap();
        let mut bucket: B = load_json_or_default(path);
        if mutate(&mut bucket) {
            atomic_write_json(path, &bucket)?;
        }
        Ok(())
    }
}

/// Trim plus Unicode lowercase, applied identically on the write and the
/// query side of the prefix and hash families.
fn normalized(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Bucket files within one directory. A missing directory is an empty list,
/// not an error; dot-files (in-flight temp writes) are never picked up.
fn json_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    list_entries(dir, |path, name| {
        !name.starts_with('.') && path.extension().is_some_and(|ext| ext == "json")
    })
}

/// Immediate subdirectories, with the same missing-directory tolerance.
fn subdirs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    list_entries(dir, |path, name| !name.starts_with('.') && path.is_dir())
}

fn list_entries(dir: &Path, keep: impl Fn(&Path, &str) -> bool) -> io::Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if keep(&path, name) {
            paths.push(path);
        }
    }
    Ok(paths)
}
