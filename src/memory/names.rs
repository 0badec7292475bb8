//! Derivation of shared object names from session names

use std::path::{Path, PathBuf};

use crate::{
    config::OBJECT_PREFIX,
    error::{RegSyncError, Result},
};

/// Longest session name accepted; keeps file names below common limits
pub const MAX_SESSION_NAME_LEN: usize = 200;

/// Paths of the objects backing one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectNames {
    /// Name shared by both objects, `regs-<session>`
    pub base: String,
    /// Lock file acting as the named mutex
    pub mutex_path: PathBuf,
    /// File mapped as the shared region
    pub region_path: PathBuf,
}

impl ObjectNames {
    /// Derive object paths for `session` inside `dir`
    pub fn derive(session: &str, dir: &Path) -> Result<Self> {
        validate_session_name(session)?;

        let base = format!("{}{}", OBJECT_PREFIX, session);
        Ok(Self {
            mutex_path: dir.join(format!("{}.lock", base)),
            region_path: dir.join(format!("{}.shm", base)),
            base,
        })
    }
}

/// Check that a session name can be embedded in a file name
pub fn validate_session_name(session: &str) -> Result<()> {
    if session.is_empty() {
        return Err(RegSyncError::invalid_parameter("session", "Session name cannot be empty"));
    }
    if session.len() > MAX_SESSION_NAME_LEN {
        return Err(RegSyncError::invalid_parameter(
            "session",
            format!("Session name longer than {} bytes", MAX_SESSION_NAME_LEN),
        ));
    }
    if session.contains(['/', '\\', '\0']) || session == "." || session == ".." {
        return Err(RegSyncError::invalid_parameter(
            "session",
            format!("Session name '{}' is not a valid object name", session.escape_default()),
        ));
    }
    Ok(())
}
