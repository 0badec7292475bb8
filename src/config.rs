//! Runtime configuration for register synchronization

use std::path::PathBuf;

use crate::{
    error::{RegSyncError, Result},
    layout::HEADER_SIZE,
};

/// Initial committed size of a freshly created region (128KB)
pub const DEFAULT_INITIAL_SIZE: usize = 128 * 1024;

/// Upper bound the region may grow to (128MB)
pub const DEFAULT_MAX_SIZE: usize = 128 * 1024 * 1024;

/// Initial size in test mode, small enough to hit resize paths quickly
pub const TEST_INITIAL_SIZE: usize = 4 * 1024;

/// Maximum size in test mode
pub const TEST_MAX_SIZE: usize = 32 * 1024;

/// Prefix of every object name derived from a session name
pub const OBJECT_PREFIX: &str = "regs-";

/// Environment variable overriding the object directory
pub const DIR_ENV_VAR: &str = "REGSYNC_DIR";

/// Configuration of register sharing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Size a region is created with and never shrinks below
    pub initial_size: usize,
    /// Size a region may never grow beyond
    pub max_size: usize,
    /// Directory holding the mutex and region files
    pub object_dir: Option<PathBuf>,
    /// Permissions for created objects (Unix permissions)
    pub permissions: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            initial_size: DEFAULT_INITIAL_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            object_dir: None,
            permissions: 0o600,
        }
    }
}

impl SyncConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Small limits that exercise growth and shrinking deterministically
    pub fn test_mode() -> Self {
        Self {
            initial_size: TEST_INITIAL_SIZE,
            max_size: TEST_MAX_SIZE,
            ..Self::default()
        }
    }

    /// Default configuration with the object directory taken from
    /// `REGSYNC_DIR` when set
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var_os(DIR_ENV_VAR) {
            Some(dir) if !dir.is_empty() => config.with_object_dir(dir),
            _ => config,
        }
    }

    /// Set the initial size
    pub fn with_initial_size(mut self, size: usize) -> Self {
        self.initial_size = size;
        self
    }

    /// Set the maximum size
    pub fn with_max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }

    /// Set the directory holding shared objects
    pub fn with_object_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.object_dir = Some(dir.into());
        self
    }

    /// Set the permissions of created objects
    pub fn with_permissions(mut self, permissions: u32) -> Self {
        self.permissions = permissions;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.initial_size <= HEADER_SIZE {
            return Err(RegSyncError::invalid_parameter(
                "initial_size",
                format!(
                    "{} bytes leave no room past the {} byte header",
                    self.initial_size, HEADER_SIZE
                ),
            ));
        }

        if self.max_size < self.initial_size {
            return Err(RegSyncError::invalid_parameter(
                "max_size",
                "Maximum size must not be smaller than the initial size",
            ));
        }

        Ok(())
    }

    /// Directory the shared objects live in.
    ///
    /// Prefers `/dev/shm` on Linux so regions stay memory-resident.
    pub fn object_dir(&self) -> PathBuf {
        if let Some(dir) = &self.object_dir {
            return dir.clone();
        }

        #[cfg(target_os = "linux")]
        {
            let shm = PathBuf::from("/dev/shm");
            if shm.is_dir() {
                return shm;
            }
        }

        std::env::temp_dir()
    }
}
