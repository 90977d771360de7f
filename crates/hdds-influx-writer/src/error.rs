// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types.

use std::io;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A single send through a [`Transport`](crate::Transport) failed.
///
/// The payload is never partially consumed: on any of these errors the
/// whole batch is retried on the next flush.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, TLS or I/O failure before a response was read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with something other than `204 No Content`.
    #[error("write rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Failure reported by a non-HTTP transport.
    #[error("{0}")]
    Other(String),
}

/// Errors raised while constructing a [`Writer`](crate::Writer).
#[derive(Debug, Error)]
pub enum WriterError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to spawn flush thread: {0}")]
    Spawn(#[source] io::Error),
}
