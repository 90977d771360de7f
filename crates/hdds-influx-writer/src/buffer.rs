// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pending buffer shared between producers and the flush task.
//!
//! Records are concatenated into a single flat byte region. The flusher
//! never drains it element by element: it swaps the whole region out under
//! the lock, sends it with the lock released, and on failure puts the
//! unsent bytes back in front of whatever was appended in the meantime.

use parking_lot::Mutex;

/// Lock-guarded, append-only byte buffer with swap hand-off.
///
/// Outside the crate the buffer can only be drained whole with
/// [`swap_out`](Self::swap_out); recycling a spare allocation is internal:
///
/// ```compile_fail
/// let buf = hdds_influx_writer::PendingBuffer::new();
/// buf.append(b"live");
/// let _ = buf.swap(b"stale".to_vec());
/// ```
#[derive(Debug, Default)]
pub struct PendingBuffer {
    buf: Mutex<Vec<u8>>,
}

impl PendingBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a complete record.
    pub fn append(&self, record: &[u8]) {
        self.buf.lock().extend_from_slice(record);
    }

    /// Take everything appended so far, leaving an empty buffer behind.
    ///
    /// Appends that returned before this call are in the result, appends
    /// that start after it are not.
    pub fn swap_out(&self) -> Vec<u8> {
        self.swap(Vec::new())
    }

    /// Exchange the live buffer for `spare` and return the old contents.
    ///
    /// `spare` must be empty. If the live buffer holds nothing, `spare` is
    /// handed straight back so its allocation can be reused.
    pub(crate) fn swap(&self, mut spare: Vec<u8>) -> Vec<u8> {
        debug_assert!(spare.is_empty());
        let mut buf = self.buf.lock();
        if !buf.is_empty() {
            std::mem::swap(&mut *buf, &mut spare);
        }
        spare
    }

    /// Put bytes that could not be sent back in front of the live buffer.
    pub fn unswap(&self, mut unsent: Vec<u8>) {
        let mut buf = self.buf.lock();
        unsent.extend_from_slice(&buf);
        *buf = unsent;
    }

    /// Park an empty allocation as the live buffer if nothing was appended
    /// since the last swap. Otherwise `spare` is dropped.
    pub(crate) fn reclaim(&self, spare: Vec<u8>) {
        debug_assert!(spare.is_empty());
        let mut buf = self.buf.lock();
        if buf.is_empty() && buf.capacity() < spare.capacity() {
            *buf = spare;
        }
    }

    /// Number of bytes waiting to be sent.
    pub fn len(&self) -> usize {
        self.buf.lock().len()
    }

    /// True when nothing is waiting to be sent.
    pub fn is_empty(&self) -> bool {
        self.buf.lock().is_empty()
    }
}
