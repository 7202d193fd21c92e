//! Hash family operations for IndexStore.
//!
//! Exact-match lookups for values like emails and phone numbers. Buckets are
//! addressed by the first four hex characters of a SHA-256 digest, split
//! into two nested directories: `<index>/<d0d1>/<d2d3>.json`. Inside a
//! bucket, entries are keyed by the full digest rather than the raw value,
//! which bounds key length and keeps the values themselves out of the index
//! files.

use super::{Bucket, IndexStore, normalized};
use crate::digest::value_digest;
use crate::safe_io::load_json_or_default;
use std::io;
use std::path::PathBuf;

impl IndexStore {
    /// Bucket file addressed by a digest's leading hex characters.
    fn hash_bucket_path(&self, index: &str, digest: &str) -> PathBuf {
        self.index_dir(index)
            .join(&digest[..2])
            .join(format!("{}.json", &digest[2..4]))
    }

    /// Records that `id` currently holds `value` in the indexed field.
    /// Blank values are not indexable and are skipped.
    pub fn add_exact(&self, index: &str, value: &str, id: &str) -> io::Result<()> {
        let value = normalized(value);
        if value.is_empty() {
            return Ok(());
        }
        let digest = value_digest(&value);
        let path = self.hash_bucket_path(index, &digest);
        self.rewrite_bucket(&path, |bucket: &mut Bucket| {
            let ids = bucket.entry(digest).or_default();
            if ids.iter().any(|known| known == id) {
                return false;
            }
            ids.push(id.to_string());
            true
        })
    }

    /// Drops `id` from the entry for `value`, removing the digest key once
    /// no id holds it. Unknown values and absent buckets are quiet no-ops.
    pub fn remove_exact(&self, index: &str, value: &str, id: &str) -> io::Result<()> {
        let value = normalized(value);
        if value.is_empty() {
            return Ok(());
        }
        let digest = value_digest(&value);
        let path = self.hash_bucket_path(index, &digest);
        if !path.exists() {
            return Ok(());
        }
        self.rewrite_bucket(&path, |bucket: &mut Bucket| {
            let Some(ids) = bucket.get_mut(&digest) else {
                return false;
            };
            let before = ids.len();
            ids.retain(|known| known != id);
            let changed = ids.len() != before;
            let now_empty = ids.is_empty();
            if now_empty {
                bucket.remove(&digest);
            }
            changed
        })
    }

    /// Ids holding exactly `value`, after the same normalization applied on
    /// insert. Point read of a single bucket; no locks, no directory walk.
    pub fn search_exact(&self, index: &str, value: &str) -> Vec<String> {
        let value = normalized(value);
        if value.is_empty() {
            return Vec::new();
        }
        let digest = value_digest(&value);
        let bucket: Bucket = load_json_or_default(&self.hash_bucket_path(index, &digest));
        bucket.get(&digest).cloned().unwrap_or_default()
    }
}
