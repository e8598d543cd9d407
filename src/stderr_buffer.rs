//! Holds log output back while the dashboard owns the terminal.

use std::io::{self, Write};
use std::sync::Mutex;
use tracing_subscriber::fmt::MakeWriter;

static BUFFER: Mutex<Option<Vec<String>>> = Mutex::new(None);

fn lock() -> std::sync::MutexGuard<'static, Option<Vec<String>>> {
    // A panic while holding the lock leaves plain data behind; keep using it
    BUFFER.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Activate buffering. While active, log lines are stored instead of being
/// written to stderr.
pub fn activate() {
    *lock() = Some(Vec::new());
}

/// Deactivate buffering and return all collected lines.
pub fn drain() -> Vec<String> {
    lock().take().unwrap_or_default()
}

pub fn is_active() -> bool {
    lock().is_some()
}

/// Store a line if buffering is active, otherwise print it to stderr.
pub fn write_line(line: String) {
    let mut guard = lock();
    if let Some(buf) = guard.as_mut() {
        buf.push(line);
    } else {
        drop(guard);
        eprint!("{}", line);
    }
}

/// `MakeWriter` for the tracing subscriber that routes each event through
/// the buffer.
#[derive(Clone, Copy, Debug, Default)]
pub struct BufferedStderr;

/// Collects one formatted event and hands it over on drop
pub struct EventWriter {
    bytes: Vec<u8>,
}

impl Write for EventWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        if !self.bytes.is_empty() {
            write_line(String::from_utf8_lossy(&self.bytes).into_owned());
        }
    }
}

impl<'a> MakeWriter<'a> for BufferedStderr {
    type Writer = EventWriter;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter { bytes: Vec::new() }
    }
}
