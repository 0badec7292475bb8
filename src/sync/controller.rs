//! Enable/disable lifecycle of register sharing
//!
//! The controller holds at most one [`Session`]. Any failure while a session
//! is active disables it and is reported through the [`ErrorChannel`]; the
//! local register table keeps working on its own afterwards.

use std::io::Write;

use log::debug;

use crate::{
    config::SyncConfig,
    diagnostics::{ErrorChannel, LogChannel, StreamChannel, ERROR_TITLE},
    error::{RegSyncError, Result},
    registers::RegisterStore,
};

use super::{
    dump::{self, DUMP_BEGIN, DUMP_END},
    plan::PublishPlan,
    session::Session,
};

/// Owner of the active session, if any
pub struct SessionController {
    config: SyncConfig,
    session: Option<Session>,
    channel: Box<dyn ErrorChannel>,
}

impl SessionController {
    /// Create a disabled controller reporting through the `log` facade
    pub fn new(config: SyncConfig) -> Self {
        Self::with_channel(config, Box::new(LogChannel))
    }

    /// Create a disabled controller reporting through `channel`
    pub fn with_channel(config: SyncConfig, channel: Box<dyn ErrorChannel>) -> Self {
        Self {
            config,
            session: None,
            channel,
        }
    }

    /// Switch to the small test sizes and report errors as plain lines to
    /// `sink`. Takes effect on the next [`enable`](Self::enable).
    pub fn enable_test_mode<W: Write + Send + 'static>(&mut self, sink: W) {
        let mut config = SyncConfig::test_mode().with_permissions(self.config.permissions);
        config.object_dir = self.config.object_dir.take();
        self.config = config;
        self.channel = Box::new(StreamChannel::new(sink));
    }

    /// Current configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Whether a session is active
    pub fn is_enabled(&self) -> bool {
        self.session.is_some()
    }

    /// Active session, if any
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Start sharing registers under `name`, replacing any active session.
    ///
    /// The first process to open `name` seeds the shared region with `store`.
    pub fn enable(&mut self, name: &str, store: &RegisterStore) -> Result<()> {
        self.disable();
        match Session::open(name, &self.config, store) {
            Ok(session) => {
                self.session = Some(session);
                Ok(())
            }
            Err(e) => {
                self.report(&e);
                Err(e)
            }
        }
    }

    /// Drop the active session; does nothing when none is active
    pub fn disable(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("Disabled register session '{}'", session.name());
        }
    }

    /// Write the local table to the shared region.
    ///
    /// Returns `Ok(None)` when no session is active.
    pub fn publish(&mut self, store: &RegisterStore) -> Result<Option<PublishPlan>> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        match session.publish(store, &self.config) {
            Ok(plan) => Ok(Some(plan)),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Load registers other processes changed since the last sync.
    ///
    /// Returns the number of registers replaced, zero when no session is
    /// active.
    pub fn refresh(&mut self, store: &mut RegisterStore) -> Result<usize> {
        let Some(session) = self.session.as_mut() else {
            return Ok(0);
        };
        match session.refresh(store) {
            Ok(count) => Ok(count),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Render the local table and, with an active session, the shared region
    pub fn dump(&mut self, store: &RegisterStore) -> Result<String> {
        let mut out = String::new();
        out.push_str(DUMP_BEGIN);
        out.push('\n');
        dump::render_local(&mut out, store);

        if let Some(session) = self.session.as_mut() {
            if let Err(e) = session.dump_shared(&mut out) {
                return Err(self.fail(e));
            }
        } else {
            out.push_str("| no active session\n");
        }

        out.push_str(DUMP_END);
        out.push('\n');
        Ok(out)
    }

    fn fail(&mut self, error: RegSyncError) -> RegSyncError {
        self.report(&error);
        self.disable();
        error
    }

    fn report(&mut self, error: &RegSyncError) {
        self.channel.report(ERROR_TITLE, &error.to_string());
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CaptureBuffer;
    use tempfile::TempDir;

    fn controller(dir: &TempDir) -> (SessionController, CaptureBuffer) {
        let buffer = CaptureBuffer::new();
        let mut controller = SessionController::new(SyncConfig::new().with_object_dir(dir.path()));
        controller.enable_test_mode(buffer.clone());
        (controller, buffer)
    }

    #[test]
    fn test_disabled_controller_is_noop() {
        let dir = TempDir::new().unwrap();
        let (mut controller, buffer) = controller(&dir);
        let mut store = RegisterStore::new();

        assert!(!controller.is_enabled());
        assert_eq!(controller.publish(&store).unwrap(), None);
        assert_eq!(controller.refresh(&mut store).unwrap(), 0);
        controller.disable();
        controller.disable();
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn test_test_mode_keeps_object_dir() {
        let dir = TempDir::new().unwrap();
        let (controller, _) = controller(&dir);
        assert_eq!(controller.config().object_dir.as_deref(), Some(dir.path()));
        assert_eq!(controller.config().initial_size, crate::config::TEST_INITIAL_SIZE);
    }

    #[test]
    fn test_invalid_session_name_is_reported() {
        let dir = TempDir::new().unwrap();
        let (mut controller, buffer) = controller(&dir);

        assert!(controller.enable("a/b", &RegisterStore::new()).is_err());
        assert!(!controller.is_enabled());
        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("error,"));
    }

    #[test]
    fn test_dump_without_session() {
        let dir = TempDir::new().unwrap();
        let (mut controller, _) = controller(&dir);
        let mut store = RegisterStore::new();
        store.append('a', "/tmp/a");

        let dump = controller.dump(&store).unwrap();
        assert!(dump.starts_with(DUMP_BEGIN));
        assert!(dump.ends_with(&format!("{}\n", DUMP_END)));
        assert!(dump.contains("|     /tmp/a\n"));
        assert!(dump.contains("| no active session\n"));
    }
}
