//! Cooperative cancellation for readers.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Marker error carried inside the `io::Error` returned by a cancelled read.
#[derive(Debug)]
struct ReadCancelled;

impl std::fmt::Display for ReadCancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "read cancelled")
    }
}

impl std::error::Error for ReadCancelled {}

/// Check whether an I/O error came from a cancelled [`CancellableReader`].
pub fn is_cancellation(err: &io::Error) -> bool {
    err.get_ref().is_some_and(|inner| inner.is::<ReadCancelled>())
}

/// Reader wrapper that fails its next read once the shared flag is set.
pub struct CancellableReader<R> {
    inner: R,
    cancelled: Arc<AtomicBool>,
}

impl<R: Read> CancellableReader<R> {
    pub fn new(inner: R, cancelled: Arc<AtomicBool>) -> Self {
        Self { inner, cancelled }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CancellableReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(io::Error::other(ReadCancelled));
        }
        self.inner.read(buf)
    }
}
