use anyhow::{Context, Result};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

use crate::models::RequirementsStore;

/// How long to wait for another process to release the lock
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const LOCK_RETRY: Duration = Duration::from_millis(100);

/// Error type for storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// File is locked by another process
    #[error("Timeout waiting for file lock - another process may be writing: {0:?}")]
    FileLocked(PathBuf),

    #[error("Failed to parse session file {path:?}: {message}")]
    ParseError { path: PathBuf, message: String },
}

#[derive(Clone, Copy)]
enum LockMode {
    Shared,
    Exclusive,
}

/// Saves and loads the session store as YAML, guarded by a sibling lock file
pub struct Storage {
    file_path: PathBuf,
    lock_file_path: PathBuf,
}

impl Storage {
    /// Creates a new Storage instance
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let mut lock_name: OsString = file_path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| OsString::from("prdgen"));
        lock_name.push(".lock");
        let lock_file_path = file_path.with_file_name(lock_name);
        Self {
            file_path,
            lock_file_path,
        }
    }

    /// Returns the path to the storage file
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_file_path
    }

    fn wait_for_lock(&self, lock_file: &File, mode: LockMode) -> Result<()> {
        let start = Instant::now();
        loop {
            let attempt = match mode {
                // fs2's trait methods, not std's inherent `File` locks
                LockMode::Shared => FileExt::try_lock_shared(lock_file),
                LockMode::Exclusive => FileExt::try_lock_exclusive(lock_file),
            };
            match attempt {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > LOCK_TIMEOUT {
                        return Err(StorageError::FileLocked(self.file_path.clone()).into());
                    }
                    std::thread::sleep(LOCK_RETRY);
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to acquire lock on {:?}", self.lock_file_path)
                    })
                }
            }
        }
    }

    /// Acquire an exclusive lock for writing
    /// Returns the lock file handle which must be held during the operation
    fn acquire_write_lock(&self) -> Result<File> {
        if let Some(parent) = self.lock_file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to create lock file: {:?}", self.lock_file_path))?;

        self.wait_for_lock(&lock_file, LockMode::Exclusive)?;

        // Lock holder info, for debugging stale locks
        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );
        Ok(lock_file)
    }

    /// Acquire a shared lock for reading; no lock file means no writer has run
    fn acquire_read_lock(&self) -> Result<Option<File>> {
        if !self.lock_file_path.exists() {
            return Ok(None);
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to open lock file: {:?}", self.lock_file_path))?;

        self.wait_for_lock(&lock_file, LockMode::Shared)?;
        Ok(Some(lock_file))
    }

    fn read_store(&self) -> Result<RequirementsStore> {
        if !self.file_path.exists() {
            debug!(path = ?self.file_path, "session file missing, starting empty");
            return Ok(RequirementsStore::new());
        }

        let file = File::open(&self.file_path)
            .with_context(|| format!("Failed to open file: {:?}", self.file_path))?;
        let reader = BufReader::new(file);

        let store = serde_yaml::from_reader(reader).map_err(|e| StorageError::ParseError {
            path: self.file_path.clone(),
            message: e.to_string(),
        })?;
        Ok(store)
    }

    fn write_store(&self, store: &RequirementsStore) -> Result<()> {
        let yaml = serde_yaml::to_string(store).context("Failed to serialize session")?;
        fs::write(&self.file_path, yaml)
            .with_context(|| format!("Failed to write file: {:?}", self.file_path))?;
        debug!(
            path = ?self.file_path,
            requirements = store.requirements.len(),
            artifacts = store.artifacts.len(),
            "saved session"
        );
        Ok(())
    }

    /// Loads the store; a missing file yields an empty store
    pub fn load(&self) -> Result<RequirementsStore> {
        let _lock = self.acquire_read_lock()?;
        self.read_store()
    }

    /// Saves the store under an exclusive lock
    pub fn save(&self, store: &RequirementsStore) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Lock is released when the handle is dropped
        let _lock = self.acquire_write_lock()?;
        self.write_store(store)
    }

    /// Reloads, applies `update_fn` and saves, all under one exclusive lock
    pub fn update_atomically<F, T>(&self, update_fn: F) -> Result<(RequirementsStore, T)>
    where
        F: FnOnce(&mut RequirementsStore) -> T,
    {
        let _lock = self.acquire_write_lock()?;

        let mut store = self.read_store()?;
        let value = update_fn(&mut store);
        self.write_store(&store)?;

        Ok((store, value))
    }
}
