//! Date family operations for IndexStore.
//!
//! Timestamps index by their calendar date: the leading `YYYY-MM-DD` of the
//! value picks the leaf file `<index>/<year>/<month>/<day>.json`, which holds
//! nothing but the ids stamped on that day. The directory layout itself is
//! the index, so a month or year query is a bounded walk over one subtree.

use super::{IndexStore, json_files, subdirs};
use crate::safe_io::load_json_or_default;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

/// Granularity of a date search. Month and day narrow the walk to one
/// subdirectory or a single leaf file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateQuery {
    Year(i32),
    Month(i32, u32),
    Day(i32, u32, u32),
}

/// Leaf file body: the ids recorded for one calendar day.
#[derive(Debug, Default, Serialize, Deserialize)]
struct DayLeaf {
    #[serde(default)]
    ids: Vec<String>,
}

impl IndexStore {
    fn year_dir(&self, index: &str, year: i32) -> PathBuf {
        self.index_dir(index).join(format!("{year:04}"))
    }

    fn month_dir(&self, index: &str, year: i32, month: u32) -> PathBuf {
        self.year_dir(index, year).join(format!("{month:02}"))
    }

    fn day_leaf_path(&self, index: &str, year: i32, month: u32, day: u32) -> PathBuf {
        self.month_dir(index, year, month).join(format!("{day:02}.json"))
    }

    /// Records `id` under the calendar date of `value`. Values without a
    /// parseable leading date are not indexable and are skipped.
    pub fn add_date(&self, index: &str, value: &str, id: &str) -> io::Result<()> {
        let Some(date) = leading_date(value) else {
            return Ok(());
        };
        let path = self.day_leaf_path(index, date.year(), date.month(), date.day());
        self.rewrite_bucket(&path, |leaf: &mut DayLeaf| {
            if leaf.ids.iter().any(|known| known == id) {
                return false;
            }
            leaf.ids.push(id.to_string());
            true
        })
    }

    /// Drops `id` from the leaf for `value`'s calendar date. Unparseable
    /// values and absent leaves are quiet no-ops.
    pub fn remove_date(&self, index: &str, value: &str, id: &str) -> io::Result<()> {
        let Some(date) = leading_date(value) else {
            return Ok(());
        };
        let path = self.day_leaf_path(index, date.year(), date.month(), date.day());
        if !path.exists() {
            return Ok(());
        }
        self.rewrite_bucket(&path, |leaf: &mut DayLeaf| {
            let before = leaf.ids.len();
            leaf.ids.retain(|known| known != id);
            leaf.ids.len() != before
        })
    }

    /// Ids recorded within the queried span. A day hits a single leaf; a
    /// month or year unions every leaf below the matching directory.
    pub fn search_date(&self, index: &str, query: DateQuery) -> io::Result<BTreeSet<String>> {
        let mut ids = BTreeSet::new();
        match query {
            DateQuery::Day(year, month, day) => {
                collect_leaf(&self.day_leaf_path(index, year, month, day), &mut ids);
            }
            DateQuery::Month(year, month) => {
                collect_month(&self.month_dir(index, year, month), &mut ids)?;
            }
            DateQuery::Year(year) => {
                for month in subdirs(&self.year_dir(index, year))? {
                    collect_month(&month, &mut ids)?;
                }
            }
        }
        Ok(ids)
    }
}

/// Calendar date at the head of a timestamp-like value. Only the first ten
/// characters are considered, and they must form a real date.
fn leading_date(value: &str) -> Option<NaiveDate> {
    let head = value.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn collect_leaf(path: &Path, ids: &mut BTreeSet<String>) {
    let leaf: DayLeaf = load_json_or_default(path);
    ids.extend(leaf.ids);
}

fn collect_month(dir: &Path, ids: &mut BTreeSet<String>) -> io::Result<()> {
    for leaf in json_files(dir)? {
        collect_leaf(&leaf, ids);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const INDEX: &str = "note_creation_date";

    fn store() -> (TempDir, IndexStore) {
        let dir = TempDir::new().unwrap();
        let store = IndexStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn leaf_path_partitions_by_calendar_parts() {
        let (dir, store) = store();
        store.add_date(INDEX, "2026-08-25T10:30:00.000000Z", "id-1").unwrap();
        assert!(dir.path().join(INDEX).join("2026").join("08").join("25.json").is_file());
    }

    #[test]
    fn day_month_and_year_queries_narrow_correctly() {
        let (_dir, store) = store();
        store.add_date(INDEX, "2026-08-25T10:00:00Z", "a").unwrap();
        store.add_date(INDEX, "2026-08-26T11:00:00Z", "b").unwrap();
        store.add_date(INDEX, "2026-09-01T12:00:00Z", "c").unwrap();
        store.add_date(INDEX, "2025-08-25T13:00:00Z", "d").unwrap();

        let day = store.search_date(INDEX, DateQuery::Day(2026, 8, 25)).unwrap();
        assert_eq!(day.into_iter().collect::<Vec<_>>(), vec!["a"]);

        let month = store.search_date(INDEX, DateQuery::Month(2026, 8)).unwrap();
        assert_eq!(month.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);

        let year = store.search_date(INDEX, DateQuery::Year(2026)).unwrap();
        assert_eq!(year.into_iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn same_day_ids_share_one_leaf() {
        let (dir, store) = store();
        store.add_date(INDEX, "2026-08-25T08:00:00Z", "early").unwrap();
        store.add_date(INDEX, "2026-08-25T23:59:59Z", "late").unwrap();
        store.add_date(INDEX, "2026-08-25T08:00:00Z", "early").unwrap();

        let day = store.search_date(INDEX, DateQuery::Day(2026, 8, 25)).unwrap();
        assert_eq!(day.len(), 2);

        let leaves = fs::read_dir(dir.path().join(INDEX).join("2026").join("08")).unwrap();
        assert_eq!(leaves.count(), 1);
    }

    #[test]
    fn unparseable_dates_are_inert() {
        let (dir, store) = store();
        store.add_date(INDEX, "yesterday", "id-1").unwrap();
        store.add_date(INDEX, "2026-13-40T00:00:00Z", "id-2").unwrap();
        store.add_date(INDEX, "", "id-3").unwrap();
        assert!(!dir.path().join(INDEX).exists());
        store.remove_date(INDEX, "not a date", "id-1").unwrap();
    }

    #[test]
    fn remove_leaves_other_ids_of_the_day() {
        let (_dir, store) = store();
        store.add_date(INDEX, "2026-08-25T08:00:00Z", "keep").unwrap();
        store.add_date(INDEX, "2026-08-25T09:00:00Z", "drop").unwrap();

        store.remove_date(INDEX, "2026-08-25T09:00:00Z", "drop").unwrap();
        let day = store.search_date(INDEX, DateQuery::Day(2026, 8, 25)).unwrap();
        assert_eq!(day.into_iter().collect::<Vec<_>>(), vec!["keep"]);
    }

    #[test]
    fn queries_over_unindexed_spans_are_empty() {
        let (_dir, store) = store();
        assert!(store.search_date(INDEX, DateQuery::Year(1999)).unwrap().is_empty());
        assert!(store.search_date(INDEX, DateQuery::Month(1999, 1)).unwrap().is_empty());
        assert!(store.search_date(INDEX, DateQuery::Day(1999, 1, 1)).unwrap().is_empty());
    }
}
