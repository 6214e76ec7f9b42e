//! Buffered standard output that faults can discard.

use std::io::{self, Write};
use std::sync::Mutex;

use once_cell::sync::Lazy;

use super::lock;

static BUFFER: Lazy<Mutex<Vec<u8>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Writer that appends to the process output buffer.
///
/// Bytes reach standard output only on [`flush_output`] (or
/// [`Write::flush`]), so a fault can drop a half-written response with
/// [`discard_output`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BufferedStdout;

impl Write for BufferedStdout {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        lock(&BUFFER).extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        flush_output()
    }
}

/// Writes buffered output to standard output and empties the buffer.
///
/// # Errors
///
/// Returns any error raised while writing to standard output. The buffer is
/// emptied regardless.
pub fn flush_output() -> io::Result<()> {
    let pending = std::mem::take(&mut *lock(&BUFFER));
    let mut stdout = io::stdout().lock();
    stdout.write_all(&pending)?;
    stdout.flush()
}

/// Drops buffered output and returns how many bytes were discarded.
#[must_use]
pub fn discard_output() -> usize {
    let mut buffer = lock(&BUFFER);
    let discarded = buffer.len();
    buffer.clear();
    discarded
}

/// Number of bytes waiting to be flushed.
#[must_use]
pub fn buffered_len() -> usize {
    lock(&BUFFER).len()
}
