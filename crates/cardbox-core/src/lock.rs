//! Per-path lock registry for index bucket files.
//!
//! Every bucket mutation is a load-mutate-rewrite of one small JSON file;
//! interleaved writers on the same bucket would lose updates. [`PathLocks`]
//! hands out one mutex per bucket path with get-or-create semantics, so
//! writers to the same bucket serialize while unrelated buckets stay
//! independent.
//!
//! The registry is owned by the index store instance, not a process global,
//! and is lazily populated. It never shrinks: the set of bucket paths a
//! process touches is small and bounded by the partition scheme. Because all
//! callers construct bucket paths through the same helpers, plain path
//! equality is sufficient keying; no filesystem canonicalization happens.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Lock table mapping bucket file paths to their mutex.
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the lock for a bucket path.
    ///
    /// Returns the shared mutex; the caller locks it for the duration of its
    /// load-mutate-rewrite. The outer table mutex is held only for the
    /// lookup, never across bucket I/O.
    pub fn acquire(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap().len()
    }
}
