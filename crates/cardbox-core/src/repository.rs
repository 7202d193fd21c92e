//! Heap and index coordination for one entity category.
//!
//! [`Repository`] is the only component that talks to both the record heap
//! and the index store for its category. Every mutation goes through it, so
//! index entries track heap contents without the two stores knowing about
//! each other. The category-specific wiring (which fields feed which
//! indexes) comes in through an [`IndexBinding`] implementation instead of
//! inheritance; [`crate::bindings`] ships the built-in ones.
//!
//! The sync protocol is deliberately simple and has one known gap: `update`
//! removes the old index entries before touching the heap, so a heap entry
//! that vanishes mid-update leaves its entries removed but nothing
//! reinserted. [`Repository::rebuild_indexes`] is the single repair
//! mechanism for that and for any other accumulated drift.

use crate::heap::{RecordScan, RecordStore};
use crate::index::{DateQuery, IndexStore};
use crate::record::{Fields, Record};
use std::collections::HashSet;
use std::io;

/// Which index family an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Prefix,
    Exact,
    Date,
}

/// One index entry a record should hold: a target index, the family to file
/// it under, and the raw field value (normalization happens in the store).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedField {
    pub index: &'static str,
    pub kind: IndexKind,
    pub value: String,
}

impl IndexedField {
    pub fn prefix(index: &'static str, value: impl Into<String>) -> Self {
        Self { index, kind: IndexKind::Prefix, value: value.into() }
    }

    pub fn exact(index: &'static str, value: impl Into<String>) -> Self {
        Self { index, kind: IndexKind::Exact, value: value.into() }
    }

    pub fn date(index: &'static str, value: impl Into<String>) -> Self {
        Self { index, kind: IndexKind::Date, value: value.into() }
    }
}

/// Category-specific index wiring.
///
/// A binding declares the heap category it covers, the full set of index
/// names it ever writes (so rebuilds know what to clear), and how to derive
/// a record's current index entries. `indexed_fields` must be a pure
/// function of the record: add and remove both call it, and an entry only
/// comes out of an index cleanly if the same record produces the same
/// entries both times.
pub trait IndexBinding {
    /// Heap category this binding covers.
    fn category(&self) -> &'static str;

    /// Every index this binding writes to, whether or not any record
    /// currently populates it.
    fn index_names(&self) -> &'static [&'static str];

    /// Index entries the record should currently hold. Blank or
    /// unparseable values may be included; the index store skips them.
    fn indexed_fields(&self, record: &Record) -> Vec<IndexedField>;
}

/// Indexed record storage for one category.
#[derive(Debug)]
pub struct Repository<B> {
    records: RecordStore,
    indexes: IndexStore,
    binding: B,
}

impl<B: IndexBinding> Repository<B> {
    /// Wires a heap and an index store together under one binding, creating
    /// the category directory and every declared index directory up front.
    pub fn new(records: RecordStore, indexes: IndexStore, binding: B) -> io::Result<Self> {
        records.ensure_category(binding.category())?;
        for index in binding.index_names() {
            indexes.ensure_index(index)?;
        }
        Ok(Self { records, indexes, binding })
    }

    /// The underlying heap, for callers that need paths or raw access.
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// The underlying index store.
    pub fn indexes(&self) -> &IndexStore {
        &self.indexes
    }

    /// Stores a new record and inserts its index entries. The returned
    /// record carries the assigned id and timestamps.
    pub fn create(&self, fields: Fields) -> io::Result<Record> {
        let record = self.records.create(self.binding.category(), fields)?;
        self.add_index_entries(&record)?;
        Ok(record)
    }

    /// Point read. Missing and corrupt heap files both come back as `None`.
    pub fn read(&self, id: &str) -> Option<Record> {
        self.records.read(self.binding.category(), id)
    }

    /// Replaces a record's fields and moves its index entries accordingly.
    ///
    /// Order matters: the old entries are removed first, then the heap file
    /// is rewritten, then entries for the stored successor are inserted.
    /// `Ok(false)` when the record does not exist.
    pub fn update(&self, id: &str, fields: Fields) -> io::Result<bool> {
        let Some(existing) = self.read(id) else {
            return Ok(false);
        };
        self.remove_index_entries(&existing)?;
        match self.records.update(self.binding.category(), id, fields)? {
            Some(stored) => {
                self.add_index_entries(&stored)?;
                Ok(true)
            }
            // The heap entry vanished between the read and the rewrite. The
            // removals above stay removed; rebuild_indexes is the remedy.
            None => Ok(false),
        }
    }

    /// Removes a record and its index entries. When the heap file is
    /// present but unreadable, the file is still deleted; its entries
    /// cannot be derived and stay behind until the next rebuild.
    pub fn delete(&self, id: &str) -> io::Result<bool> {
        if let Some(existing) = self.read(id) {
            self.remove_index_entries(&existing)?;
        }
        self.records.delete(self.binding.category(), id)
    }

    /// Lazy walk over every readable record of the category.
    pub fn scan_all(&self) -> io::Result<RecordScan> {
        self.records.scan_all(self.binding.category())
    }

    /// Discards every declared index and re-derives entries from the heap
    /// alone. Returns the number of records reindexed. This is the sole
    /// repair mechanism for drift between heap and indexes.
    pub fn rebuild_indexes(&self) -> io::Result<usize> {
        for index in self.binding.index_names() {
            self.indexes.clear_index(index)?;
        }
        let mut count = 0;
        for record in self.records.scan_all(self.binding.category())? {
            self.add_index_entries(&record)?;
            count += 1;
        }
        Ok(count)
    }

    /// Records whose indexed value starts with `prefix`, ordered by matched
    /// value. Ids whose heap file is gone are dropped silently.
    pub fn search_by_prefix_field(&self, index: &str, prefix: &str) -> io::Result<Vec<Record>> {
        let hits = self.indexes.search_prefix(index, prefix)?;
        Ok(self.resolve(hits.into_values().flatten()))
    }

    /// Records whose indexed value equals `value` after normalization.
    pub fn search_by_exact_field(&self, index: &str, value: &str) -> io::Result<Vec<Record>> {
        Ok(self.resolve(self.indexes.search_exact(index, value)))
    }

    /// Records indexed within the queried calendar span, ordered by id.
    pub fn search_by_date_field(&self, index: &str, query: DateQuery) -> io::Result<Vec<Record>> {
        let ids = self.indexes.search_date(index, query)?;
        Ok(self.resolve(ids))
    }

    /// Resolves index hits to live records, deduplicating ids (a record can
    /// match through several values of a multi-value field) and dropping
    /// any id whose backing record no longer reads.
    fn resolve(&self, ids: impl IntoIterator<Item = String>) -> Vec<Record> {
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for id in ids {
            if !seen.insert(id.clone()) {
                continue;
            }
            if let Some(record) = self.records.read(self.binding.category(), &id) {
                records.push(record);
            }
        }
        records
    }

    fn add_index_entries(&self, record: &Record) -> io::Result<()> {
        for entry in self.binding.indexed_fields(record) {
            match entry.kind {
                IndexKind::Prefix => self.indexes.add_prefix(entry.index, &entry.value, &record.id)?,
                IndexKind::Exact => self.indexes.add_exact(entry.index, &entry.value, &record.id)?,
                IndexKind::Date => self.indexes.add_date(entry.index, &entry.value, &record.id)?,
            }
        }
        Ok(())
    }

    fn remove_index_entries(&self, record: &Record) -> io::Result<()> {
        for entry in self.binding.indexed_fields(record) {
            match entry.kind {
                IndexKind::Prefix => self.indexes.remove_prefix(entry.index, &entry.value, &record.id)?,
                IndexKind::Exact => self.indexes.remove_exact(entry.index, &entry.value, &record.id)?,
                IndexKind::Date => self.indexes.remove_date(entry.index, &entry.value, &record.id)?,
            }
        }
        Ok(())
    }
}
