//! Exclusive lock over the cache directory.
//!
//! Two runs against the same cache would race on clones, build trees and
//! sentinel files, so a run holds an advisory lock on
//! `<cache>/.narcpm.lock` for its whole duration. The operating system
//! drops the lock when the holder exits, killed or not, so a lock file left
//! behind by a dead run never blocks the next one. The file itself stays in
//! place and records the pid of the last holder.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

/// File name of the lock inside the cache root.
pub const LOCK_FILE: &str = ".narcpm.lock";

#[derive(Debug, Error)]
pub enum LockError {
    #[error("cache {} is locked by another narcpm run (pid {owner})", path.display())]
    Locked { path: PathBuf, owner: String },

    #[error("failed to lock {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Guard holding the cache lock. Dropping it releases the lock.
#[derive(Debug)]
pub struct CacheLock {
    path: PathBuf,
    file: File,
}

impl CacheLock {
    /// Take the lock for `cache_root`, creating the directory if needed.
    ///
    /// Fails with [`LockError::Locked`] while another live process holds it.
    pub fn acquire(cache_root: &Path) -> Result<Self, LockError> {
        let path = cache_root.join(LOCK_FILE);
        let io_err = |source| LockError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(cache_root).map_err(io_err)?;
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(io_err)?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.kind() != fs2::lock_contended_error().kind() {
                return Err(io_err(e));
            }
            let owner = fs::read_to_string(&path)
                .map(|s| s.trim().to_string())
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "unknown".to_string());
            return Err(LockError::Locked {
                path: path.clone(),
                owner,
            });
        }

        file.set_len(0)
            .and_then(|()| writeln!(file, "{}", std::process::id()))
            .map_err(io_err)?;
        tracing::debug!("acquired {}", path.display());

        Ok(CacheLock { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("failed to release {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_is_exclusive() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");

        let lock = CacheLock::acquire(&cache).unwrap();
        assert!(lock.path().is_file());

        let err = CacheLock::acquire(&cache).unwrap_err();
        match err {
            LockError::Locked { owner, .. } => {
                assert_eq!(owner, std::process::id().to_string())
            }
            other => panic!("unexpected error: {other}"),
        }

        drop(lock);
        let _again = CacheLock::acquire(&cache).unwrap();
    }

    #[test]
    fn test_lock_left_by_dead_process_is_taken_over() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        fs::create_dir_all(&cache).unwrap();
        fs::write(cache.join(LOCK_FILE), "4194303\n").unwrap();

        let lock = CacheLock::acquire(&cache).unwrap();

        let owner = fs::read_to_string(lock.path()).unwrap();
        assert_eq!(owner.trim(), std::process::id().to_string());
    }
}
