//! Safe file I/O: atomic writes and the shared corruption policy.
//!
//! Every file the store owns, record documents and index buckets alike, is
//! written through [`atomic_write_json()`]: serialize, write a uniquely-named
//! temporary file in the destination directory, fsync, then rename onto the
//! final path. The target is either fully updated or unchanged; a reader can
//! never observe a half-written file. On any failure the temporary file is
//! removed (best-effort) and the error propagates.
//!
//! Reads go through [`load_json_or_default()`]: a missing file and an
//! unreadable/unparseable file are both treated as the type's default value.
//! That single policy is what lets callers degrade gracefully instead of
//! erroring on corruption; only genuine I/O failures on the write path are
//! ever surfaced.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use uuid::Uuid;

/// Atomically write a value as pretty-printed JSON.
///
/// Serialization failures map to `InvalidData`; everything else is the
/// underlying filesystem error.
pub fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    atomic_write(path, &json)
}

/// Atomically write bytes to a file via temp-file-then-rename.
///
/// The temporary file lives in the same directory as the target (rename must
/// not cross filesystems) and carries a unique `.tmp_` name, so concurrent
/// writers to the same target never trample each other's staging file. Parent
/// directories are created as needed.
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_file_name(format!(".tmp_{}", Uuid::new_v4().simple()));

    match write_and_rename(&tmp_path, path, contents) {
        Ok(()) => Ok(()),
        Err(e) => {
            // The previous version of the target, if any, is still intact;
            // just make sure the staging file doesn't linger.
            let _ = fs::remove_file(&tmp_path);
            Err(e)
        }
    }
}

fn write_and_rename(tmp_path: &Path, path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(tmp_path)?;

    {
        let mut writer = BufWriter::new(&mut file);
        writer.write_all(contents)?;
        writer.flush()?;
    }

    // Sync to disk before rename
    file.sync_all()?;

    fs::rename(tmp_path, path)
}

/// Load a JSON file, falling back to `T::default()` when the file is missing,
/// unreadable, or fails to parse.
///
/// A missing file is the normal "nothing stored yet" case and stays silent;
/// an existing file that can't be decoded gets a `[WARN]` on stderr before
/// being treated as empty. Callers that need to distinguish "absent" from
/// "present" can load an `Option<T>`; both corruption and absence come back
/// as `None`.
pub fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        return T::default();
    }

    let content = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("[WARN] {}: unreadable, treating as empty: {}", path.display(), e);
            return T::default();
        }
    };

    match serde_json::from_slice(&content) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("[WARN] {}: corrupt, treating as empty: {}", path.display(), e);
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_basic() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.txt");

        atomic_write(&path, b"hello world").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "hello world");
    }

    #[test]
    fn atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("test.txt");

        atomic_write(&path, b"nested content").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "nested content");
    }

    #[test]
    fn atomic_write_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.txt");

        atomic_write(&path, b"original").unwrap();
        atomic_write(&path, b"updated").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "updated");
    }

    #[test]
    fn atomic_write_json_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.json");

        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct TestData {
            name: String,
            value: i32,
        }

        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        atomic_write_json(&path, &data).unwrap();

        let parsed: TestData = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, data);
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.txt");

        atomic_write(&path, b"content").unwrap();

        let names: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["test.txt".to_string()]);
    }

    #[test]
    fn failed_rename_keeps_target_and_cleans_temp() {
        let temp_dir = TempDir::new().unwrap();

        // A directory occupying the target path makes the final rename fail
        // after the temp file has been fully written.
        let path = temp_dir.path().join("blocked.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep.txt"), b"survivor").unwrap();

        let result = atomic_write(&path, b"{}");
        assert!(result.is_err());

        // The occupant is untouched and no staging file lingers.
        assert_eq!(fs::read_to_string(path.join("keep.txt")).unwrap(), "survivor");
        let stray: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(".tmp_"))
            .collect();
        assert!(stray.is_empty(), "staging file left behind: {:?}", stray);
    }

    #[test]
    fn load_missing_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");

        let loaded: HashMap<String, Vec<String>> = load_json_or_default(&path);
        assert!(loaded.is_empty());
    }

    #[test]
    fn load_corrupt_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, b"{not json at all").unwrap();

        let loaded: HashMap<String, Vec<String>> = load_json_or_default(&path);
        assert!(loaded.is_empty());
    }

    #[test]
    fn load_valid_file_returns_value() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("good.json");
        fs::write(&path, br#"{"alice": ["id-1", "id-2"]}"#).unwrap();

        let loaded: HashMap<String, Vec<String>> = load_json_or_default(&path);
        assert_eq!(loaded["alice"], vec!["id-1".to_string(), "id-2".to_string()]);
    }

    #[test]
    fn load_optional_treats_corruption_as_absence() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");

        let missing: Option<HashMap<String, String>> = load_json_or_default(&path);
        assert!(missing.is_none());

        fs::write(&path, b"garbage").unwrap();
        let corrupt: Option<HashMap<String, String>> = load_json_or_default(&path);
        assert!(corrupt.is_none());
    }
}
