//! Prefix family operations for IndexStore.
//!
//! Values are bucketed by their first two normalized characters:
//! `<index>/<first>/<second>.json`. Values shorter than that land in a
//! reserved `_short` directory keyed by their only character. A prefix
//! search therefore touches exactly one bucket, except for single-character
//! queries, which fan out over one first-character directory plus the short
//! bucket.

use super::{Bucket, IndexStore, json_files, normalized};
use crate::safe_io::load_json_or_default;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Directory for values too short to have a two-character partition key.
const SHORT_DIR: &str = "_short";

impl IndexStore {
    /// Bucket file for one already-normalized value. `None` when the value
    /// is empty, which no index entry can be made from.
    fn prefix_bucket_path(&self, index: &str, value: &str) -> Option<PathBuf> {
        let mut chars = value.chars();
        let first = chars.next()?;
        let path = match chars.next() {
            Some(second) => self
                .index_dir(index)
                .join(first.to_string())
                .join(format!("{second}.json")),
            None => self
                .index_dir(index)
                .join(SHORT_DIR)
                .join(format!("{first}.json")),
        };
        Some(path)
    }

    /// Records that `id` currently holds `value` in the indexed field.
    /// Blank values are not indexable and are skipped.
    pub fn add_prefix(&self, index: &str, value: &str, id: &str) -> io::Result<()> {
        let value = normalized(value);
        let Some(path) = self.prefix_bucket_path(index, &value) else {
            return Ok(());
        };
        self.rewrite_bucket(&path, |bucket: &mut Bucket| {
            let ids = bucket.entry(value).or_default();
            if ids.iter().any(|known| known == id) {
                return false;
            }
            ids.push(id.to_string());
            true
        })
    }

    /// Drops `id` from the entry for `value`, removing the value's key
    /// entirely once no id holds it. Unknown values and absent buckets are
    /// quiet no-ops.
    pub fn remove_prefix(&self, index: &str, value: &str, id: &str) -> io::Result<()> {
        let value = normalized(value);
        let Some(path) = self.prefix_bucket_path(index, &value) else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }
        self.rewrite_bucket(&path, |bucket: &mut Bucket| {
            let Some(ids) = bucket.get_mut(&value) else {
                return false;
            };
            let before = ids.len();
            ids.retain(|known| known != id);
            let changed = ids.len() != before;
            let now_empty = ids.is_empty();
            if now_empty {
                bucket.remove(&value);
            }
            changed
        })
    }

    /// All indexed values starting with `prefix`, with the ids that hold
    /// them. The empty prefix matches nothing rather than everything; a full
    /// enumeration is the heap's job, not the index's.
    pub fn search_prefix(
        &self,
        index: &str,
        prefix: &str,
    ) -> io::Result<BTreeMap<String, Vec<String>>> {
        let prefix = normalized(prefix);
        let mut results = BTreeMap::new();
        let Some(first) = prefix.chars().next() else {
            return Ok(results);
        };

        if prefix.chars().nth(1).is_none() {
            // Single-character query: matches can sit in the short bucket or
            // in any bucket of the first-character directory.
            let short = self
                .index_dir(index)
                .join(SHORT_DIR)
                .join(format!("{first}.json"));
            collect_matches(&short, &prefix, &mut results);

            for bucket in json_files(&self.index_dir(index).join(first.to_string()))? {
                collect_matches(&bucket, &prefix, &mut results);
            }
        } else if let Some(path) = self.prefix_bucket_path(index, &prefix) {
            collect_matches(&path, &prefix, &mut results);
        }

        Ok(results)
    }
}

fn collect_matches(path: &Path, prefix: &str, results: &mut BTreeMap<String, Vec<String>>) {
    let bucket: Bucket = load_json_or_default(path);
    for (value, ids) in bucket {
        if value.starts_with(prefix) {
            results.insert(value, ids);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const INDEX: &str = "contact_first_name";

    fn store() -> (TempDir, IndexStore) {
        let dir = TempDir::new().unwrap();
        let store = IndexStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn buckets_by_first_two_characters() {
        let (dir, store) = store();
        store.add_prefix(INDEX, "John", "id-1").unwrap();
        assert!(dir.path().join(INDEX).join("j").join("o.json").is_file());
    }

    #[test]
    fn short_values_live_in_the_short_bucket() {
        let (dir, store) = store();
        store.add_prefix(INDEX, "J", "id-1").unwrap();
        assert!(dir.path().join(INDEX).join(SHORT_DIR).join("j.json").is_file());
    }

    #[test]
    fn search_is_case_insensitive_and_groups_by_value() {
        let (_dir, store) = store();
        store.add_prefix(INDEX, "John", "id-1").unwrap();
        store.add_prefix(INDEX, "JOHN", "id-2").unwrap();
        store.add_prefix(INDEX, "Jonathan", "id-3").unwrap();
        store.add_prefix(INDEX, "Jane", "id-4").unwrap();

        let hits = store.search_prefix(INDEX, "Jo").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits["john"], vec!["id-1", "id-2"]);
        assert_eq!(hits["jonathan"], vec!["id-3"]);
    }

    #[test]
    fn single_char_search_spans_short_and_regular_buckets() {
        let (_dir, store) = store();
        store.add_prefix(INDEX, "J", "id-short").unwrap();
        store.add_prefix(INDEX, "John", "id-long").unwrap();
        store.add_prefix(INDEX, "Kim", "id-other").unwrap();

        let hits = store.search_prefix(INDEX, "j").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits["j"], vec!["id-short"]);
        assert_eq!(hits["john"], vec!["id-long"]);
    }

    #[test]
    fn empty_and_blank_inputs_are_inert() {
        let (dir, store) = store();
        store.add_prefix(INDEX, "   ", "id-1").unwrap();
        assert!(!dir.path().join(INDEX).exists());
        assert!(store.search_prefix(INDEX, "").unwrap().is_empty());
        assert!(store.search_prefix(INDEX, "  ").unwrap().is_empty());
    }

    #[test]
    fn duplicate_add_keeps_one_entry() {
        let (_dir, store) = store();
        store.add_prefix(INDEX, "John", "id-1").unwrap();
        store.add_prefix(INDEX, "john ", "id-1").unwrap();
        assert_eq!(store.search_prefix(INDEX, "john").unwrap()["john"], vec!["id-1"]);
    }

    #[test]
    fn remove_drops_value_key_once_no_id_holds_it() {
        let (dir, store) = store();
        store.add_prefix(INDEX, "John", "id-1").unwrap();
        store.add_prefix(INDEX, "John", "id-2").unwrap();

        store.remove_prefix(INDEX, "John", "id-1").unwrap();
        assert_eq!(store.search_prefix(INDEX, "john").unwrap()["john"], vec!["id-2"]);

        store.remove_prefix(INDEX, "John", "id-2").unwrap();
        assert!(store.search_prefix(INDEX, "john").unwrap().is_empty());

        let bucket = dir.path().join(INDEX).join("j").join("o.json");
        let raw = fs::read_to_string(bucket).unwrap();
        assert!(!raw.contains("john"));
    }

    #[test]
    fn remove_of_unindexed_value_writes_nothing() {
        let (dir, store) = store();
        store.remove_prefix(INDEX, "Ghost", "id-1").unwrap();
        assert!(!dir.path().join(INDEX).join("g").exists());
    }

    #[test]
    fn corrupt_bucket_reads_as_empty() {
        let (dir, store) = store();
        store.add_prefix(INDEX, "John", "id-1").unwrap();
        let bucket = dir.path().join(INDEX).join("j").join("o.json");
        fs::write(&bucket, b"{ broken").unwrap();

        assert!(store.search_prefix(INDEX, "john").unwrap().is_empty());
        // The next write starts from an empty bucket and replaces the junk.
        store.add_prefix(INDEX, "John", "id-2").unwrap();
        assert_eq!(store.search_prefix(INDEX, "john").unwrap()["john"], vec!["id-2"]);
    }
}
