// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Buffered writer with a background flush thread.
//!
//! ```text
//! producers --append--> PendingBuffer --swap--> flush thread --send--> Transport
//!                            ^                       |
//!                            +-------unswap----------+  (on failure)
//! ```
//!
//! Producers only ever hold the buffer lock for an in-memory append. The
//! flush thread holds it for the swap and, on failure, the unswap, but
//! never across the network call.

use bytes::Bytes;
use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::buffer::PendingBuffer;
use crate::config::WriterConfig;
use crate::error::{ConfigError, TransportError, WriterError};
use crate::transport::{HttpTransport, Transport};

/// Counters maintained by the writer.
#[derive(Debug, Default)]
struct WriterStats {
    bytes_accepted: AtomicU64,
    bytes_sent: AtomicU64,
    sends_ok: AtomicU64,
    sends_failed: AtomicU64,
}

/// Snapshot of writer statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStatsSnapshot {
    /// Bytes accepted from producers.
    pub bytes_accepted: u64,
    /// Bytes delivered by successful sends.
    pub bytes_sent: u64,
    /// Successful transport calls.
    pub sends_ok: u64,
    /// Failed transport calls.
    pub sends_failed: u64,
    /// Bytes currently waiting in the buffer.
    pub pending_bytes: u64,
}

/// State shared with the flush thread.
struct Shared {
    buffer: PendingBuffer,
    transport: Box<dyn Transport>,
    stats: WriterStats,
}

impl Shared {
    fn flush(&self) -> Result<(), TransportError> {
        let mut pending = self.buffer.swap_out();
        while !pending.is_empty() {
            let len = pending.len() as u64;
            let batch = Bytes::from(pending);
            if let Err(e) = self.transport.send(batch.clone()) {
                self.stats.sends_failed.fetch_add(1, Ordering::Relaxed);
                self.buffer.unswap(Vec::from(batch));
                return Err(e);
            }
            self.stats.sends_ok.fetch_add(1, Ordering::Relaxed);
            self.stats.bytes_sent.fetch_add(len, Ordering::Relaxed);

            // Reuse the allocation unless the transport kept a handle to it.
            let spare = match batch.try_into_mut() {
                Ok(mut batch) => {
                    batch.clear();
                    Vec::from(batch)
                }
                Err(_) => Vec::new(),
            };

            // Pick up whatever was appended while the send was in flight.
            pending = self.buffer.swap(spare);
        }
        self.buffer.reclaim(pending);
        Ok(())
    }
}

/// Handle to the background flush thread.
///
/// Dropping the handle stops the thread and waits for it to exit.
struct FlushTask {
    /// Dropping the sender wakes the thread up.
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl FlushTask {
    fn spawn(shared: Arc<Shared>, interval: Duration) -> io::Result<Self> {
        let (stop_tx, stop_rx) = channel::bounded::<()>(0);

        let thread = thread::Builder::new()
            .name("hdds-influx-flush".to_string())
            .spawn(move || run_flusher(&shared, interval, &stop_rx))?;

        Ok(Self {
            stop: Some(stop_tx),
            thread: Some(thread),
        })
    }

    fn stop(&mut self) {
        self.stop.take();
        if let Some(handle) = self.thread.take() {
            // The last writer handle can be released from inside a send. The
            // loop sees the closed channel once that send returns.
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                log::error!("[influx-writer] flush thread panicked");
            }
        }
    }
}

impl Drop for FlushTask {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_flusher(shared: &Shared, interval: Duration, stop: &Receiver<()>) {
    log::debug!("[influx-writer] flush thread started with interval {:?}", interval);
    let ticker = channel::tick(interval);

    loop {
        crossbeam::select! {
            recv(ticker) -> _ => {
                // Cancellation wins over a tick that fired at the same time.
                if let Err(TryRecvError::Disconnected) = stop.try_recv() {
                    break;
                }
                if let Err(e) = shared.flush() {
                    log::error!("[influx-writer] flush failed: {}", e);
                }
            }
            recv(stop) -> _ => break,
        }
    }

    log::debug!("[influx-writer] flush thread stopped");
}

/// Buffered Line Protocol writer.
///
/// Records passed to [`send`](Self::send) are concatenated in memory and
/// delivered as one batch per flush interval by a background thread. A
/// failed batch is put back in front of newer records and retried on the
/// next tick; there is no backoff and no cap on the buffer.
///
/// The writer is `Sync`: share it between producer threads behind an
/// `Arc`. Call [`shutdown`](Self::shutdown) to stop the flush thread.
pub struct Writer {
    shared: Arc<Shared>,
    task: Mutex<Option<FlushTask>>,
}

impl Writer {
    /// Create a writer for an InfluxDB endpoint and start flushing.
    ///
    /// A malformed endpoint URL is reported here and nothing is started.
    pub fn new(config: &WriterConfig) -> Result<Self, WriterError> {
        config.validate()?;
        let transport = HttpTransport::new(config)?;
        log::info!(
            "[influx-writer] writing to {} every {:?}",
            transport.url(),
            config.flush_interval()
        );
        Self::with_transport(transport, config.flush_interval())
    }

    /// Create a writer over any transport and start flushing every `interval`.
    ///
    /// A zero interval is rejected.
    pub fn with_transport<T>(transport: T, interval: Duration) -> Result<Self, WriterError>
    where
        T: Transport + 'static,
    {
        if interval.is_zero() {
            return Err(ConfigError::Invalid("flush interval must be > 0".into()).into());
        }
        let shared = Arc::new(Shared {
            buffer: PendingBuffer::new(),
            transport: Box::new(transport),
            stats: WriterStats::default(),
        });
        let task = FlushTask::spawn(Arc::clone(&shared), interval).map_err(WriterError::Spawn)?;

        Ok(Self {
            shared,
            task: Mutex::new(Some(task)),
        })
    }

    /// Append a fully serialized record.
    ///
    /// Zero-length records are ignored without touching the lock.
    pub fn append(&self, record: &[u8]) {
        if record.is_empty() {
            return;
        }
        self.shared.buffer.append(record);
        self.shared
            .stats
            .bytes_accepted
            .fetch_add(record.len() as u64, Ordering::Relaxed);
    }

    /// Accept a record for delivery, returning the number of bytes taken.
    ///
    /// The record is typically `encode_key(..)` followed by the field set,
    /// the timestamp and a newline. It is always accepted whole.
    pub fn send(&self, record: &[u8]) -> io::Result<usize> {
        self.append(record);
        Ok(record.len())
    }

    /// Deliver everything buffered, including records appended while a
    /// send is in flight.
    ///
    /// On failure the unsent bytes are restored ahead of any newer records
    /// and the error is returned.
    pub fn flush(&self) -> Result<(), TransportError> {
        self.shared.flush()
    }

    /// Stop the background flush thread.
    ///
    /// Blocks until an in-flight send completes. Afterwards the writer makes
    /// no transport calls on its own; buffered records stay put and can
    /// still be delivered with [`flush`](Self::flush). Idempotent.
    pub fn shutdown(&self) {
        let task = self.task.lock().take();
        if let Some(mut task) = task {
            task.stop();
            log::debug!(
                "[influx-writer] shut down with {} bytes pending",
                self.shared.buffer.len()
            );
        }
    }

    /// True while the background flush thread is running.
    pub fn is_running(&self) -> bool {
        self.task.lock().is_some()
    }

    /// Bytes waiting to be sent.
    pub fn pending_bytes(&self) -> usize {
        self.shared.buffer.len()
    }

    /// Current statistics.
    pub fn stats(&self) -> WriterStatsSnapshot {
        let stats = &self.shared.stats;
        WriterStatsSnapshot {
            bytes_accepted: stats.bytes_accepted.load(Ordering::Relaxed),
            bytes_sent: stats.bytes_sent.load(Ordering::Relaxed),
            sends_ok: stats.sends_ok.load(Ordering::Relaxed),
            sends_failed: stats.sends_failed.load(Ordering::Relaxed),
            pending_bytes: self.shared.buffer.len() as u64,
        }
    }
}

impl Drop for Writer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl io::Write for &Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Writer::send(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Writer::flush(self).map_err(io::Error::other)
    }
}

impl io::Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Writer::send(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Writer::flush(self).map_err(io::Error::other)
    }
}
