//! Named shared memory region backed by a mapped file

use std::{
    fs::{File, OpenOptions},
    os::unix::fs::OpenOptionsExt,
    path::{Path, PathBuf},
};

use log::debug;
use memmap2::{MmapMut, MmapOptions};

use crate::{
    error::{RegSyncError, Result},
    layout::HEADER_SIZE,
};

/// A file mapped shared into every process opening the same path.
///
/// The mapping covers exactly the committed size. When another process
/// resizes the backing file, [`SharedRegion::remap`] brings this mapping
/// back in line; callers do so under the named mutex.
#[derive(Debug)]
pub struct SharedRegion {
    file: File,
    mmap: MmapMut,
    path: PathBuf,
    created: bool,
    max_size: usize,
}

impl SharedRegion {
    /// Create or open the region at `path`.
    ///
    /// A file too short to hold a header counts as created by us and is
    /// extended to `initial_size`. Must be called with the session mutex held.
    pub fn open(path: &Path, initial_size: usize, max_size: usize, permissions: u32) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(permissions)
            .open(path)
            .map_err(|e| RegSyncError::object_creation("memory", e))?;

        let len = file
            .metadata()
            .map_err(|e| RegSyncError::object_creation("memory", e))?
            .len() as usize;

        let created = len < HEADER_SIZE;
        let size = if created {
            file.set_len(initial_size as u64)
                .map_err(|e| RegSyncError::object_creation("memory", e))?;
            initial_size
        } else {
            len
        };

        let mmap = Self::map(&file, size).map_err(|e| match e {
            RegSyncError::Io { source: Some(source), .. } => RegSyncError::object_creation("memory", source),
            other => other,
        })?;

        debug!(
            "Opened shared region {} ({} bytes, created: {})",
            path.display(),
            size,
            created
        );

        Ok(Self {
            file,
            mmap,
            path: path.to_path_buf(),
            created,
            max_size,
        })
    }

    fn map(file: &File, size: usize) -> Result<MmapMut> {
        // SAFETY: the file stays open for the lifetime of the mapping and all
        // concurrent writers coordinate through the session mutex.
        unsafe {
            MmapOptions::new()
                .len(size)
                .map_mut(file)
                .map_err(|e| RegSyncError::from_io(e, "Failed to create memory mapping"))
        }
    }

    /// Whether this handle created (or first initialized) the region
    pub fn created_by_us(&self) -> bool {
        self.created
    }

    /// Number of mapped bytes
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Whether nothing is mapped
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Largest size the region may be resized to
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Current length of the backing file
    pub fn backing_len(&self) -> Result<usize> {
        let meta = self
            .file
            .metadata()
            .map_err(|e| RegSyncError::from_io(e, "Failed to query shared region size"))?;
        Ok(meta.len() as usize)
    }

    /// Map exactly `size` bytes, following a resize by another process
    pub fn remap(&mut self, size: usize) -> Result<()> {
        if size == self.mmap.len() {
            return Ok(());
        }
        let backing = self.backing_len()?;
        if size > backing {
            return Err(RegSyncError::layout(format!(
                "committed size {} exceeds backing file of {} bytes",
                size, backing
            )));
        }
        self.mmap = Self::map(&self.file, size)?;
        Ok(())
    }

    /// Resize the backing file, keeping the first `min(old, new)` bytes, and
    /// remap it
    pub fn resize(&mut self, new_size: usize) -> Result<()> {
        if new_size > self.max_size {
            return Err(RegSyncError::resize(
                new_size,
                format!("limit is {} bytes", self.max_size),
            ));
        }
        if new_size < HEADER_SIZE {
            return Err(RegSyncError::resize(new_size, "smaller than the header"));
        }

        self.mmap
            .flush()
            .map_err(|e| RegSyncError::resize(new_size, e.to_string()))?;
        self.file
            .set_len(new_size as u64)
            .map_err(|e| RegSyncError::resize(new_size, e.to_string()))?;
        self.mmap = Self::map(&self.file, new_size).map_err(|e| RegSyncError::resize(new_size, e.to_string()))?;

        debug!("Resized shared region {} to {} bytes", self.path.display(), new_size);
        Ok(())
    }

    /// Mapped bytes (read-only)
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    /// Mapped bytes (mutable)
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.mmap
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unlink the backing file; used when initialization failed half-way
    pub fn remove(self) -> Result<()> {
        let path = self.path.clone();
        drop(self);
        std::fs::remove_file(&path)
            .map_err(|e| RegSyncError::from_io(e, "Failed to remove shared region"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INITIAL: usize = 4096;

    #[test]
    fn test_first_open_creates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("regs-a.shm");

        let first = SharedRegion::open(&path, INITIAL, 4 * INITIAL, 0o600).unwrap();
        assert!(first.created_by_us());
        assert_eq!(first.len(), INITIAL);
        assert_eq!(first.backing_len().unwrap(), INITIAL);

        let second = SharedRegion::open(&path, INITIAL, 4 * INITIAL, 0o600).unwrap();
        assert!(!second.created_by_us());
        assert_eq!(second.len(), INITIAL);
    }

    #[test]
    fn test_mappings_share_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("regs-b.shm");

        let mut first = SharedRegion::open(&path, INITIAL, 4 * INITIAL, 0o600).unwrap();
        let second = SharedRegion::open(&path, INITIAL, 4 * INITIAL, 0o600).unwrap();

        first.as_mut_slice()[HEADER_SIZE] = 42;
        assert_eq!(second.as_slice()[HEADER_SIZE], 42);
    }

    #[test]
    fn test_resize_preserves_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("regs-c.shm");

        let mut first = SharedRegion::open(&path, INITIAL, 4 * INITIAL, 0o600).unwrap();
        let mut second = SharedRegion::open(&path, INITIAL, 4 * INITIAL, 0o600).unwrap();
        first.as_mut_slice()[10] = 7;

        first.resize(2 * INITIAL).unwrap();
        assert_eq!(first.len(), 2 * INITIAL);
        assert_eq!(first.as_slice()[10], 7);

        second.remap(2 * INITIAL).unwrap();
        first.as_mut_slice()[INITIAL + 1] = 9;
        assert_eq!(second.as_slice()[INITIAL + 1], 9);
    }

    #[test]
    fn test_resize_respects_limit() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("regs-d.shm");

        let mut region = SharedRegion::open(&path, INITIAL, 2 * INITIAL, 0o600).unwrap();
        assert!(matches!(
            region.resize(4 * INITIAL),
            Err(RegSyncError::Resize { requested, .. }) if requested == 4 * INITIAL
        ));
        assert_eq!(region.len(), INITIAL);
    }

    #[test]
    fn test_remap_beyond_backing_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("regs-e.shm");

        let mut region = SharedRegion::open(&path, INITIAL, 4 * INITIAL, 0o600).unwrap();
        assert!(matches!(region.remap(2 * INITIAL), Err(RegSyncError::Layout { .. })));
    }

    #[test]
    fn test_remove_unlinks() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("regs-f.shm");

        let region = SharedRegion::open(&path, INITIAL, INITIAL, 0o600).unwrap();
        region.remove().unwrap();
        assert!(!path.exists());
    }
}
