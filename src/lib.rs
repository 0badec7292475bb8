//! # regsync - Shared Register Replication
//!
//! Keeps named registers (ordered, duplicate-free lists of file paths) in
//! sync between independent processes through a shared-memory region
//! guarded by a named mutex.
//!
//! ## Features
//!
//! - **Register table**: blackhole, unnamed and 26 letter registers with
//!   uppercase aliases resolved by [`registers::canonicalize`]
//! - **Typed shared layout**: versioned header, per-register metadata and a
//!   bounds-checked data area
//! - **Change detection**: global and per-register write counters
//! - **Growth and shrinking**: the region doubles or halves as data changes
//! - **Diagnostics**: dumps of local and shared state, test mode with small
//!   limits
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │          SessionController (enable/disable)      │
//! ├──────────────────────────────────────────────────┤
//! │  Session: NamedMutex + SharedRegion + SyncEngine │
//! └──────────────────────────────────────────────────┘
//!           │ publish                 ▲ refresh
//!           ▼                         │
//! ┌──────────────────────────────────────────────────┐
//! │ SharedLayout: header │ metadata[28] │ data area  │
//! └──────────────────────────────────────────────────┘
//!           ▲                         │
//!           │                         ▼
//! ┌──────────────────────────────────────────────────┐
//! │          RegisterStore (per process)             │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use regsync::{RegisterStore, SessionController, SyncConfig};
//!
//! let mut store = RegisterStore::new();
//! let mut controller = SessionController::new(SyncConfig::from_env());
//!
//! controller.enable("work", &store)?;
//! controller.refresh(&mut store)?;
//! store.append('a', "/tmp/a");
//! controller.publish(&store)?;
//! controller.disable();
//! # Ok::<(), regsync::RegSyncError>(())
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod layout;
pub mod memory;
pub mod registers;
pub mod sync;

pub use config::SyncConfig;
pub use diagnostics::{CaptureBuffer, ErrorChannel, LogChannel, StreamChannel};
pub use error::{RegSyncError, Result};
pub use layout::{RegisterMetadata, SharedHeader, SharedLayout, HEADER_SIZE};
pub use memory::{NamedMutex, ObjectNames, SharedRegion};
pub use registers::{Register, RegisterStore};
pub use sync::{PublishPlan, Session, SessionController, SyncEngine};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
