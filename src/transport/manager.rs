//! reqwest-backed HTTP interface manager.
//!
//! Owns two clients built from the same [`TransportConfig`]:
//! - an async client for catalog JSON lookups
//! - a blocking client for media streams, which container parsers read
//!   synchronously
//!
//! The blocking client is built lazily on the first stream acquisition, so
//! a manager that only resolves tracks never spins up its worker thread.
//! Acquire streams from a blocking context (a plain thread or
//! `spawn_blocking`), never from inside an async task.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use reqwest::{StatusCode, header, redirect};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use url::Url;

use super::{
    HttpInterface, InterfaceHandle, RangeResponse, StreamTransport, TransportConfig,
    TransportError, parse_content_range_total,
};
use crate::catalog::{JsonFetcher, ResolveError};

/// Pooled HTTP clients shared by every resolution and streaming call.
pub struct HttpInterfaceManager {
    config: RwLock<TransportConfig>,
    client: RwLock<reqwest::Client>,
    blocking: Mutex<Option<reqwest::blocking::Client>>,
    active: Arc<AtomicUsize>,
    closed: AtomicBool,
}

impl HttpInterfaceManager {
    /// Create a manager with the given settings.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let client = build_async_client(&config)?;
        info!(user_agent = %config.user_agent, "Created HTTP interface manager");

        Ok(Self {
            config: RwLock::new(config),
            client: RwLock::new(client),
            blocking: Mutex::new(None),
            active: Arc::new(AtomicUsize::new(0)),
            closed: AtomicBool::new(false),
        })
    }

    /// Current settings.
    pub fn config(&self) -> TransportConfig {
        self.config.read().clone()
    }

    /// Adjust the settings and rebuild the clients.
    ///
    /// Handles already checked out keep using the previous clients.
    pub fn configure<F>(&self, configurator: F) -> Result<(), TransportError>
    where
        F: FnOnce(TransportConfig) -> TransportConfig,
    {
        let updated = configurator(self.config());
        let client = build_async_client(&updated)?;

        *self.client.write() = client;

        // Holding the slot keeps a racing acquisition from caching a client
        // built from the old settings
        let mut slot = self.blocking.lock();
        *self.config.write() = updated;
        let previous = slot.take();
        drop(slot);
        drop(previous);

        debug!("Reconfigured HTTP interface manager");
        Ok(())
    }

    /// Number of stream handles currently checked out.
    pub fn active_handles(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close the manager. Further acquisitions fail.
    ///
    /// Never fails: outstanding handles are reported and left to be
    /// released by their owners.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let outstanding = self.active_handles();
        if outstanding > 0 {
            error!(
                outstanding,
                "Failed to close HTTP interface manager cleanly: handles still checked out"
            );
        } else {
            info!("Closed HTTP interface manager");
        }
    }

    fn blocking_client(&self) -> Result<reqwest::blocking::Client, TransportError> {
        let mut slot = self.blocking.lock();
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let client = build_blocking_client(&self.config.read())?;
        *slot = Some(client.clone());
        Ok(client)
    }
}

impl StreamTransport for HttpInterfaceManager {
    fn acquire(&self) -> Result<InterfaceHandle, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let client = self.blocking_client()?;
        let handle = InterfaceHandle::tracked(
            Box::new(ReqwestInterface { client }),
            Arc::clone(&self.active),
        );
        debug!(active = self.active_handles(), "Acquired HTTP interface");
        Ok(handle)
    }
}

#[async_trait]
impl JsonFetcher for HttpInterfaceManager {
    async fn get_json(&self, url: &str, user_agent: &str) -> Result<Option<Value>, ResolveError> {
        if self.is_closed() {
            return Err(ResolveError::Http(TransportError::Closed.to_string()));
        }

        let client = self.client.read().clone();
        let response = client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| ResolveError::Http(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!(url, "Catalog answered 404, treating as no document");
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Catalog request failed");
            return Err(ResolveError::Status {
                code: status.as_u16(),
                message: format!(
                    "{} - {}",
                    status.canonical_reason().unwrap_or("Unknown"),
                    body.chars().take(200).collect::<String>()
                ),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ResolveError::Http(e.to_string()))?;

        if body.trim().is_empty() {
            return Ok(None);
        }

        let value: Value =
            serde_json::from_str(&body).map_err(|e| ResolveError::Parse(e.to_string()))?;

        Ok((!value.is_null()).then_some(value))
    }
}

/// A single checked-out connection over the blocking client.
struct ReqwestInterface {
    client: reqwest::blocking::Client,
}

impl HttpInterface for ReqwestInterface {
    fn open_range(&self, uri: &Url, offset: u64) -> Result<RangeResponse, TransportError> {
        let response = self
            .client
            .get(uri.clone())
            .header(header::RANGE, format!("bytes={offset}-"))
            .send()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let headers = response.headers();
        let partial = status == StatusCode::PARTIAL_CONTENT;
        let accepts_ranges = partial
            || headers
                .get(header::ACCEPT_RANGES)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.eq_ignore_ascii_case("bytes"));

        let total_length = if partial {
            headers
                .get(header::CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_content_range_total)
        } else {
            response.content_length()
        };

        Ok(RangeResponse {
            status: status.as_u16(),
            total_length,
            accepts_ranges,
            body: Box::new(response),
        })
    }
}

fn build_async_client(config: &TransportConfig) -> Result<reqwest::Client, TransportError> {
    let mut builder = reqwest::Client::builder()
        .gzip(true)
        .user_agent(config.user_agent.as_str())
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .redirect(redirect::Policy::limited(config.max_redirects));

    if let Some(timeout) = config.request_timeout {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| TransportError::Build(e.to_string()))
}

fn build_blocking_client(
    config: &TransportConfig,
) -> Result<reqwest::blocking::Client, TransportError> {
    reqwest::blocking::Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(config.connect_timeout)
        // Playback may legitimately take longer than any request timeout
        .timeout(None::<Duration>)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .redirect(redirect::Policy::limited(config.max_redirects))
        .build()
        .map_err(|e| TransportError::Build(e.to_string()))
}
