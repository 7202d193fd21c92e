//! Built-in index bindings and the index name registry.
//!
//! Index names are shared constants rather than inline literals: the name
//! is a directory on disk, so a typo would silently split an index in two.

use crate::record::Record;
use crate::repository::{IndexBinding, IndexedField};

pub const INDEX_CONTACT_FIRST_NAME: &str = "contact_first_name";
pub const INDEX_CONTACT_LAST_NAME: &str = "contact_last_name";
pub const INDEX_CONTACT_PHONE: &str = "contact_phone";
pub const INDEX_CONTACT_EMAIL: &str = "contact_email";

pub const INDEX_NOTE_TITLE: &str = "note_title";
pub const INDEX_NOTE_TAG: &str = "note_tag";
pub const INDEX_NOTE_CREATION_DATE: &str = "note_creation_date";

pub const CONTACT_INDEXES: &[&str] = &[
    INDEX_CONTACT_FIRST_NAME,
    INDEX_CONTACT_LAST_NAME,
    INDEX_CONTACT_PHONE,
    INDEX_CONTACT_EMAIL,
];

pub const NOTE_INDEXES: &[&str] = &[
    INDEX_NOTE_TITLE,
    INDEX_NOTE_TAG,
    INDEX_NOTE_CREATION_DATE,
];

/// Contacts: names are prefix-searchable, phones and emails exact-match,
/// each element of the multi-value fields indexed on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactBinding;

impl IndexBinding for ContactBinding {
    fn category(&self) -> &'static str {
        "contacts"
    }

    fn index_names(&self) -> &'static [&'static str] {
        CONTACT_INDEXES
    }

    fn indexed_fields(&self, record: &Record) -> Vec<IndexedField> {
        let mut entries = Vec::new();
        if let Some(first_name) = record.str_field("first_name") {
            entries.push(IndexedField::prefix(INDEX_CONTACT_FIRST_NAME, first_name));
        }
        if let Some(last_name) = record.str_field("last_name") {
            entries.push(IndexedField::prefix(INDEX_CONTACT_LAST_NAME, last_name));
        }
        for phone in record.str_items("phones") {
            entries.push(IndexedField::exact(INDEX_CONTACT_PHONE, phone));
        }
        for email in record.str_items("emails") {
            entries.push(IndexedField::exact(INDEX_CONTACT_EMAIL, email));
        }
        entries
    }
}

/// Notes: titles are prefix-searchable, tags exact-match per element, and
/// every note is findable by its creation day.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoteBinding;

impl IndexBinding for NoteBinding {
    fn category(&self) -> &'static str {
        "notes"
    }

    fn index_names(&self) -> &'static [&'static str] {
        NOTE_INDEXES
    }

    fn indexed_fields(&self, record: &Record) -> Vec<IndexedField> {
        let mut entries = Vec::new();
        if let Some(title) = record.str_field("title") {
            entries.push(IndexedField::prefix(INDEX_NOTE_TITLE, title));
        }
        for tag in record.str_items("tags") {
            entries.push(IndexedField::exact(INDEX_NOTE_TAG, tag));
        }
        // The indexed date is the system stamp, not a user field, so it is
        // present on every record and survives full-field replacement.
        entries.push(IndexedField::date(INDEX_NOTE_CREATION_DATE, record.created_at.clone()));
        entries
    }
}
