// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HDDS InfluxDB Writer
//!
//! Buffered client for the InfluxDB 1.x `/write` endpoint.
//!
//! This crate provides:
//! - Line Protocol key encoding (measurement + sorted, escaped tags)
//! - An in-memory pending buffer handed off to the network by swapping
//! - A background flush thread with in-order retry on failure
//! - An HTTP transport and YAML configuration
//!
//! # Overview
//!
//! ```text
//! TagSet --> encode_key --> caller adds fields/timestamp --> Writer::send
//!                                                               |
//!                      Transport <-- flush thread (every 1s) <--+
//! ```
//!
//! # Example
//!
//! ```no_run
//! use hdds_influx_writer::{encode_key, TagSet, Writer, WriterConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WriterConfig::new("http://localhost:8086", "telemetry");
//! let writer = Writer::new(&config)?;
//!
//! let tags: TagSet = [("host", "node-1"), ("region", "eu west")].into_iter().collect();
//! let mut record = encode_key("cpu", &tags);
//! record.extend_from_slice(b" usage=0.42 1700000000000000000\n");
//! writer.send(&record)?;
//!
//! writer.flush()?;
//! writer.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod key;
pub mod tags;
pub mod transport;
pub mod writer;

pub use buffer::PendingBuffer;
pub use bytes::Bytes;
pub use config::WriterConfig;
pub use error::{ConfigError, TransportError, WriterError};
pub use key::{encode_key, escape};
pub use tags::TagSet;
pub use transport::{HttpTransport, Transport};
pub use writer::{Writer, WriterStatsSnapshot};
