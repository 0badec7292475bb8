//! Named cross-process mutex backed by an advisory file lock

use std::{
    fs::{File, OpenOptions},
    os::fd::AsRawFd,
    os::unix::fs::OpenOptionsExt,
    path::{Path, PathBuf},
};

use log::warn;
use nix::{
    errno::Errno,
    fcntl::{flock, FlockArg},
};

use crate::error::{RegSyncError, Result};

/// A mutex shared by every process opening the same path.
///
/// Backed by `flock(2)`, which locks per open file description: two handles
/// opened separately exclude each other even inside one process, and the
/// kernel drops the lock when its holder exits, however abruptly.
#[derive(Debug)]
pub struct NamedMutex {
    file: File,
    path: PathBuf,
}

impl NamedMutex {
    /// Create or open the lock file at `path`
    pub fn open(path: &Path, permissions: u32) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(permissions)
            .open(path)
            .map_err(|e| RegSyncError::object_creation("mutex", e))?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Block until the mutex is held by this handle
    pub fn lock(&self) -> Result<MutexGuard<'_>> {
        loop {
            match flock(self.file.as_raw_fd(), FlockArg::LockExclusive) {
                Ok(()) => return Ok(MutexGuard::new(self)),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(RegSyncError::lock("lock", e.desc())),
            }
        }
    }

    /// Take the mutex if nobody holds it
    pub fn try_lock(&self) -> Result<Option<MutexGuard<'_>>> {
        match flock(self.file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
            Ok(()) => Ok(Some(MutexGuard::new(self))),
            Err(Errno::EWOULDBLOCK) => Ok(None),
            Err(e) => Err(RegSyncError::lock("lock", e.desc())),
        }
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unlock_raw(&self) -> Result<()> {
        flock(self.file.as_raw_fd(), FlockArg::Unlock).map_err(|e| RegSyncError::lock("unlock", e.desc()))
    }
}

/// Proof that the named mutex is held; releases it when dropped
#[must_use = "the mutex is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct MutexGuard<'a> {
    mutex: &'a NamedMutex,
    released: bool,
}

impl<'a> MutexGuard<'a> {
    fn new(mutex: &'a NamedMutex) -> Self {
        Self {
            mutex,
            released: false,
        }
    }

    /// Release the mutex, reporting failures
    pub fn unlock(mut self) -> Result<()> {
        self.released = true;
        self.mutex.unlock_raw()
    }
}

impl Drop for MutexGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.mutex.unlock_raw() {
            warn!("Failed to release {}: {}", self.mutex.path.display(), e);
        }
    }
}
