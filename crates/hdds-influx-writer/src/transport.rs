// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transports that deliver a batch of Line Protocol records.

use bytes::Bytes;
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::WriterConfig;
use crate::error::{TransportError, WriterError};

/// TCP keep-alive for pooled connections.
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

/// Delivers a whole batch or fails as a whole.
///
/// Implementations must not report success for a partially delivered
/// payload: on error the writer resends every byte.
///
/// The payload shares the writer's batch allocation. An implementation that
/// keeps a clone past the call forces the writer to allocate a fresh buffer
/// for the next batch.
pub trait Transport: Send + Sync {
    /// Send a non-empty payload.
    fn send(&self, payload: Bytes) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, payload: Bytes) -> Result<(), TransportError> {
        (**self).send(payload)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, payload: Bytes) -> Result<(), TransportError> {
        (**self).send(payload)
    }
}

/// InfluxDB 1.x HTTP transport.
///
/// POSTs each batch to `<base>/write?db=<database>` and expects
/// `204 No Content`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: Url,
    auth: Option<(String, String)>,
}

impl HttpTransport {
    /// Build the HTTP client from configuration.
    ///
    /// Fails if the endpoint URL is malformed or the client cannot be built.
    pub fn new(config: &WriterConfig) -> Result<Self, WriterError> {
        let url = config.write_url()?;

        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout())
            .tcp_keepalive(TCP_KEEPALIVE)
            .timeout(config.request_timeout());

        // Environment proxies never apply to loopback endpoints.
        if is_loopback(&url) {
            builder = builder.no_proxy();
        }

        if config.skips_tls_verification() {
            log::warn!(
                "[influx-writer] TLS certificate verification disabled for {}",
                config.url
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(WriterError::Client)?;
        let auth = config
            .basic_auth()
            .map(|(user, pass)| (user.to_string(), pass.to_string()));

        Ok(Self { client, url, auth })
    }

    /// Fully resolved write URL, including the `db` query parameter.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Transport for HttpTransport {
    fn send(&self, payload: Bytes) -> Result<(), TransportError> {
        let mut request = self.client.post(self.url.clone()).body(payload);
        if let Some((user, pass)) = &self.auth {
            request = request.basic_auth(user, Some(pass));
        }

        let response = request.send()?;
        let status = response.status();
        // Drain the body so the connection goes back to the pool.
        let body = response.text()?;

        if status != StatusCode::NO_CONTENT {
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transport_resolves_write_url() {
        let config = WriterConfig::new("http://localhost:8086/ignored", "telemetry");
        let transport = HttpTransport::new(&config).expect("transport");
        assert_eq!(transport.url().as_str(), "http://localhost:8086/write?db=telemetry");
        assert!(transport.auth.is_none());
    }

    #[test]
    fn test_http_transport_keeps_credentials() {
        let config = WriterConfig::new("https://localhost:8086", "db")
            .with_credentials("user", "pass")
            .with_insecure_skip_verify(true);
        let transport = HttpTransport::new(&config).expect("transport");
        assert_eq!(
            transport.auth,
            Some(("user".to_string(), "pass".to_string()))
        );
    }

    #[test]
    fn test_http_transport_rejects_malformed_url() {
        let config = WriterConfig::new("::not-a-url::", "db");
        let err = HttpTransport::new(&config).unwrap_err();
        assert!(matches!(
            err,
            WriterError::Config(crate::ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_is_loopback() {
        let loopback = |s: &str| is_loopback(&Url::parse(s).expect("url"));
        assert!(loopback("http://localhost:8086"));
        assert!(loopback("http://127.0.0.1:8086"));
        assert!(loopback("http://[::1]:8086"));
        assert!(!loopback("http://influx.example.com:8086"));
        assert!(!loopback("http://10.0.0.1:8086"));
    }

    #[test]
    fn test_http_transport_connection_refused() {
        // Bind then drop to get a port with nothing listening.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let config = WriterConfig::new(format!("http://127.0.0.1:{}", port), "db");
        let transport = HttpTransport::new(&config).expect("transport");

        let err = transport.send(Bytes::from_static(b"m v=1 1\n")).unwrap_err();
        assert!(matches!(err, TransportError::Http(_)));
    }
}
