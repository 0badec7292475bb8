//! Reporting of synchronization failures
//!
//! Every failure of the session goes through one [`ErrorChannel`]. Hosts get
//! log records by default; test mode swaps in a plain text stream.

use std::{
    io::Write,
    sync::{Arc, Mutex},
};

use log::error;

/// Title shown with every reported failure
pub const ERROR_TITLE: &str = "Error in Shared Memory Register Synchronization";

/// Sink for user-visible failure messages
pub trait ErrorChannel: Send {
    /// Report one failure
    fn report(&mut self, title: &str, message: &str);
}

/// Reports through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogChannel;

impl ErrorChannel for LogChannel {
    fn report(&mut self, title: &str, message: &str) {
        error!("{}: {}", title, message);
    }
}

/// Writes `error,<message>` lines to a stream
#[derive(Debug)]
pub struct StreamChannel<W> {
    sink: W,
}

impl<W: Write + Send> StreamChannel<W> {
    /// Wrap a stream
    pub fn new(sink: W) -> Self {
        Self { sink }
    }
}

impl<W: Write + Send> ErrorChannel for StreamChannel<W> {
    fn report(&mut self, _title: &str, message: &str) {
        let _ = writeln!(self.sink, "error,{}", message);
        let _ = self.sink.flush();
    }
}

/// Cloneable in-memory stream; all clones append to the same buffer
#[derive(Debug, Default, Clone)]
pub struct CaptureBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        let bytes = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Lines written so far
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut bytes = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
