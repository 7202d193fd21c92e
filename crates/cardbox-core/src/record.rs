//! The record document type.
//!
//! A [`Record`] is a flat JSON document: caller-defined fields plus the two
//! system-owned stamps (`id`, `created_at`/`updated_at`). The store never
//! interprets caller fields; bindings pull indexed values out of them via the
//! string accessors below.

use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller-defined document fields, in insertion order.
///
/// `IndexMap` keeps the on-disk JSON in the order the caller supplied the
/// fields, which keeps diffs of record files readable.
pub type Fields = IndexMap<String, serde_json::Value>;

/// Field names owned by the store; caller-supplied values under these keys
/// are discarded at stamping time so a document never carries duplicates.
const SYSTEM_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

/// One stored document.
///
/// `id` is assigned at creation and immutable; `created_at` survives every
/// update; `updated_at` is refreshed on each rewrite. Everything else lives
/// in `fields` and is opaque to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    /// Stamp a brand-new record: fresh uuid-v4 id, both timestamps set to now.
    pub fn new(fields: Fields) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), fields)
    }

    /// Stamp a new record under a caller-chosen id (used when the previous
    /// version of a document is unreadable but its id is known from the
    /// filename).
    pub fn with_id(id: impl Into<String>, mut fields: Fields) -> Self {
        strip_system_fields(&mut fields);
        let now = now_timestamp();
        Record {
            id: id.into(),
            created_at: now.clone(),
            updated_at: now,
            fields,
        }
    }

    /// Build the successor document for an update: same `id` and
    /// `created_at`, fresh `updated_at`, fields replaced wholesale.
    pub fn replaced(&self, mut fields: Fields) -> Self {
        strip_system_fields(&mut fields);
        Record {
            id: self.id.clone(),
            created_at: self.created_at.clone(),
            updated_at: now_timestamp(),
            fields,
        }
    }

    /// A string-valued field, or `None` when absent or not a string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }

    /// The string elements of an array-valued field. Absent fields,
    /// non-arrays, and non-string elements contribute nothing.
    pub fn str_items<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> {
        self.fields
            .get(name)
            .and_then(|v| v.as_array())
            .into_iter()
            .flatten()
            .filter_map(|v| v.as_str())
    }
}

fn strip_system_fields(fields: &mut Fields) {
    for key in SYSTEM_FIELDS {
        fields.shift_remove(key);
    }
}

/// Current time as an RFC 3339 UTC string (microsecond precision).
///
/// The leading `YYYY-MM-DD` is what the date index partitions on.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
