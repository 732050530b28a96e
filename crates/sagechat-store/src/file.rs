use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::kv::KeyValueStore;
use crate::{Result, StoreError};

/// Key-value backend keeping one file per key in a data directory.
///
/// This is the on-disk stand-in for browser local storage used by the
/// terminal client. Values are written as-is, so `chatHistories` is a JSON
/// file and `currentChatId` a plain-text file.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = Self::expand_tilde(data_dir.as_ref());

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir).map_err(|source| StoreError::Io {
                key: data_dir.display().to_string(),
                source,
            })?;
        }

        Ok(Self { data_dir })
    }

    /// Expand ~ to home directory
    fn expand_tilde(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"));
        match (path_str.strip_prefix("~/"), home) {
            (Some(rest), Ok(home)) => PathBuf::from(home).join(rest),
            (None, Ok(home)) if path_str == "~" => PathBuf::from(home),
            _ => path.to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(key)
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);
        debug!(path = %path.display(), bytes = value.len(), "writing stored key");
        fs::write(&path, value).map_err(|source| StoreError::Io {
            key: key.to_string(),
            source,
        })
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}
