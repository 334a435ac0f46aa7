//! In-memory capture of tracing output for assertions.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

/// Shared buffer that collects formatted tracing events.
///
/// Install it with [`CapturedLogs::install`]; the returned guard scopes the
/// subscriber to the current thread, so async tests should run on a
/// current-thread runtime.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    /// Fresh, empty capture buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route every event at `TRACE` and above into this buffer for the
    /// lifetime of the returned guard.
    #[must_use]
    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_target(false)
            .without_time()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Everything captured so far, lossily decoded.
    #[must_use]
    pub fn contents(&self) -> String {
        let guard = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&guard).into_owned()
    }

    /// Captured lines containing `needle`.
    #[must_use]
    pub fn lines_containing(&self, needle: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_owned)
            .collect()
    }

    /// Whether any captured line contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }
}

/// Writer handed out per event.
pub struct CapturedWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_events_while_installed() {
        let logs = CapturedLogs::new();
        {
            let _guard = logs.install();
            tracing::warn!(code = 10000, "captured event");
        }
        tracing::warn!("not captured");
        assert!(logs.contains("captured event"));
        assert!(logs.contains("code=10000"));
        assert!(!logs.contains("not captured"));
        assert_eq!(logs.lines_containing("WARN").len(), 1);
    }
}
