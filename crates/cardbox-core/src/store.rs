//! High-level facade for embedding cardbox.
//!
//! The `Store` struct opens the record heap and the index tree under a single
//! home directory and exposes one repository per built-in category. Both
//! repositories share the same roots; their index names are disjoint, so they
//! never touch each other's buckets.
//!
//! # Example
//!
//! ```no_run
//! use cardbox_core::Store;
//!
//! fn main() -> std::io::Result<()> {
//!     let store = Store::open()?;
//!     for contact in store.contacts.scan_all()? {
//!         println!("{}", contact.id);
//!     }
//!     Ok(())
//! }
//! ```

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::bindings::{ContactBinding, NoteBinding};
use crate::config::StoragePaths;
use crate::heap::RecordStore;
use crate::index::IndexStore;
use crate::repository::Repository;

/// An open store: one repository per built-in category, plus the resolved
/// paths they live under.
#[derive(Debug)]
pub struct Store {
    pub contacts: Repository<ContactBinding>,
    pub notes: Repository<NoteBinding>,
    paths: StoragePaths,
}

impl Store {
    /// Opens the store at the default location (`CARDBOX_HOME` or
    /// `~/.cardbox`).
    pub fn open() -> io::Result<Self> {
        Self::open_with(StoragePaths::resolve(None)?)
    }

    /// Opens the store under an explicit home directory, still honoring its
    /// `config.toml` when present.
    pub fn open_at(home: impl Into<PathBuf>) -> io::Result<Self> {
        Self::open_with(StoragePaths::from_home(home.into())?)
    }

    /// Opens the store over fully resolved paths. Creates any missing
    /// directories.
    pub fn open_with(paths: StoragePaths) -> io::Result<Self> {
        fs::create_dir_all(&paths.home)?;
        let contacts = Repository::new(
            RecordStore::new(&paths.data_dir)?,
            IndexStore::new(&paths.index_dir)?,
            ContactBinding,
        )?;
        let notes = Repository::new(
            RecordStore::new(&paths.data_dir)?,
            IndexStore::new(&paths.index_dir)?,
            NoteBinding,
        )?;
        Ok(Self { contacts, notes, paths })
    }

    /// The resolved home, data, and index directories.
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Rebuilds every index of every category from the record heap. Returns
    /// the number of records re-indexed.
    pub fn rebuild_indexes(&self) -> io::Result<usize> {
        Ok(self.contacts.rebuild_indexes()? + self.notes.rebuild_indexes()?)
    }
}
