//! Error types and handling for regsync

/// Result type alias for regsync operations
pub type Result<T> = std::result::Result<T, RegSyncError>;

/// Errors raised while sharing registers between processes
#[derive(Debug, thiserror::Error)]
pub enum RegSyncError {
    /// I/O related errors that fit no more specific category
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The named mutex or the shared region could not be created or opened
    #[error("Failed to open/create shared {object} object: {message}")]
    ObjectCreation {
        object: &'static str,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Acquiring or releasing the named mutex failed for a non-contention reason
    #[error("Failed to {action} mutex: {message}")]
    Lock { action: &'static str, message: String },

    /// The backing store could not grow or shrink
    #[error("Shared memory size exceeded: cannot resize to {requested} bytes: {message}")]
    Resize { requested: usize, message: String },

    /// Operation targets a register without storage, or a duplicate path
    #[error("Invalid register '{name}': {message}")]
    InvalidRegister { name: char, message: String },

    /// Shared bytes violate a layout invariant
    #[error("Corrupt shared layout: {message}")]
    Layout { message: String },

    /// Invalid parameters or configuration
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },
}

impl RegSyncError {
    /// Create an I/O error from a standard I/O error
    pub fn from_io(source: std::io::Error, context: &str) -> Self {
        Self::Io {
            message: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    /// Create an object creation error for the mutex or the region
    pub fn object_creation(object: &'static str, source: std::io::Error) -> Self {
        Self::ObjectCreation {
            object,
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create a lock error
    pub fn lock(action: &'static str, message: impl Into<String>) -> Self {
        Self::Lock {
            action,
            message: message.into(),
        }
    }

    /// Create a resize error
    pub fn resize(requested: usize, message: impl Into<String>) -> Self {
        Self::Resize {
            requested,
            message: message.into(),
        }
    }

    /// Create an invalid register error
    pub fn invalid_register(name: char, message: impl Into<String>) -> Self {
        Self::InvalidRegister {
            name,
            message: message.into(),
        }
    }

    /// Create a layout corruption error
    pub fn layout(message: impl Into<String>) -> Self {
        Self::Layout {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for RegSyncError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io(err, "I/O operation failed")
    }
}

impl From<nix::errno::Errno> for RegSyncError {
    fn from(err: nix::errno::Errno) -> Self {
        Self::from_io(std::io::Error::from(err), "System call failed")
    }
}
