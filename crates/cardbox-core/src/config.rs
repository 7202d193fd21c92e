//! Storage location resolution.
//!
//! A store lives under a single home directory holding the record heap, the
//! indexes, and an optional `config.toml`. Embedding applications can point
//! at any directory (tests use temp dirs); interactive use falls back to a
//! per-user default.

use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Optional settings from `<home>/config.toml`. The file is optional and so
/// is every field.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Record heap root. Relative paths resolve against the home directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Index root. Relative paths resolve against the home directory.
    #[serde(default)]
    pub index_dir: Option<PathBuf>,
}

impl Config {
    /// Reads `<home>/config.toml`. A missing file yields the defaults; an
    /// unparseable one is an error, never a silent fallback.
    pub fn load(home: &Path) -> io::Result<Self> {
        let path = home.join("config.toml");
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| {
            io::Error::new(
                ErrorKind::InvalidData,
                format!("Failed to parse config: {}", e),
            )
        })
    }
}

/// Resolved storage roots for one store instance.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub home: PathBuf,
    pub data_dir: PathBuf,
    pub index_dir: PathBuf,
}

impl StoragePaths {
    /// Resolves the home directory and the storage roots under it.
    ///
    /// Precedence for the home directory:
    /// 1. the `home_override` parameter
    /// 2. the `CARDBOX_HOME` environment variable
    /// 3. `~/.cardbox`
    pub fn resolve(home_override: Option<PathBuf>) -> io::Result<Self> {
        let home = if let Some(path) = home_override {
            path
        } else if let Ok(cardbox_home) = std::env::var("CARDBOX_HOME") {
            PathBuf::from(cardbox_home)
        } else {
            let home = home_dir()
                .ok_or_else(|| io::Error::new(ErrorKind::NotFound, "Home directory not found"))?;
            home.join(".cardbox")
        };
        Self::from_home(home)
    }

    /// Resolves the roots under an explicit home directory, honoring its
    /// `config.toml` when present. Defaults are `<home>/data` and
    /// `<home>/index`.
    pub fn from_home(home: PathBuf) -> io::Result<Self> {
        let config = Config::load(&home)?;
        let data_dir = resolve_root(&home, config.data_dir, "data");
        let index_dir = resolve_root(&home, config.index_dir, "index");
        Ok(Self { home, data_dir, index_dir })
    }
}

fn resolve_root(home: &Path, configured: Option<PathBuf>, default: &str) -> PathBuf {
    match configured {
        Some(dir) if dir.is_absolute() => dir,
        Some(dir) => home.join(dir),
        None => home.join(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_config_file() {
        let dir = TempDir::new().unwrap();
        let paths = StoragePaths::from_home(dir.path().to_path_buf()).unwrap();
        assert_eq!(paths.home, dir.path());
        assert_eq!(paths.data_dir, dir.path().join("data"));
        assert_eq!(paths.index_dir, dir.path().join("index"));
    }

    #[test]
    fn relative_overrides_resolve_against_home() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "data_dir = \"records\"\n").unwrap();

        let paths = StoragePaths::from_home(dir.path().to_path_buf()).unwrap();
        assert_eq!(paths.data_dir, dir.path().join("records"));
        assert_eq!(paths.index_dir, dir.path().join("index"));
    }

    #[test]
    fn absolute_overrides_are_kept() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            "index_dir = \"/var/lib/cardbox/index\"\n",
        )
        .unwrap();

        let paths = StoragePaths::from_home(dir.path().to_path_buf()).unwrap();
        assert_eq!(paths.index_dir, PathBuf::from("/var/lib/cardbox/index"));
    }

    #[test]
    fn unparseable_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "data_dir = [not toml").unwrap();

        let err = StoragePaths::from_home(dir.path().to_path_buf()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    #[serial]
    fn env_var_names_the_home() {
        let dir = TempDir::new().unwrap();
        // SAFETY: #[serial] tests are the only ones touching this variable.
        unsafe {
            std::env::set_var("CARDBOX_HOME", dir.path());
        }
        let paths = StoragePaths::resolve(None);
        unsafe {
            std::env::remove_var("CARDBOX_HOME");
        }
        assert_eq!(paths.unwrap().home, dir.path());
    }

    #[test]
    #[serial]
    fn explicit_override_beats_env_var() {
        let env_home = TempDir::new().unwrap();
        let chosen = TempDir::new().unwrap();
        // SAFETY: #[serial] tests are the only ones touching this variable.
        unsafe {
            std::env::set_var("CARDBOX_HOME", env_home.path());
        }
        let paths = StoragePaths::resolve(Some(chosen.path().to_path_buf()));
        unsafe {
            std::env::remove_var("CARDBOX_HOME");
        }
        assert_eq!(paths.unwrap().home, chosen.path());
    }
}
