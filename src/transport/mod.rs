//! HTTP transport plumbing.
//!
//! Two seams live here:
//! - [`StreamTransport`] hands out [`InterfaceHandle`]s, scoped connection
//!   handles used by exactly one streaming operation and released on drop.
//! - [`HttpInterface`] opens ranged GET requests on behalf of
//!   [`PersistentHttpStream`](crate::stream::PersistentHttpStream).
//!
//! [`HttpInterfaceManager`] implements both (and the catalog's
//! [`JsonFetcher`](crate::catalog::JsonFetcher)) on top of reqwest.

mod manager;

pub use manager::HttpInterfaceManager;

use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use url::Url;

use crate::config::HttpConfig;

/// Settings the HTTP clients are built from.
///
/// Hosts adjust them through
/// [`HttpInterfaceManager::configure`](manager::HttpInterfaceManager::configure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// Applies to JSON lookups only; media streams are unbounded
    pub request_timeout: Option<Duration>,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub max_redirects: usize,
}

impl TransportConfig {
    pub fn from_http(http: &HttpConfig, user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            connect_timeout: Duration::from_millis(http.connect_timeout_ms),
            request_timeout: (http.request_timeout_ms > 0)
                .then(|| Duration::from_millis(http.request_timeout_ms)),
            pool_idle_timeout: Duration::from_millis(http.pool_idle_timeout_ms),
            pool_max_idle_per_host: http.pool_max_idle_per_host,
            max_redirects: http.max_redirects,
        }
    }
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("HTTP interface manager is shut down")]
    Closed,
}

/// Response to a ranged GET.
pub struct RangeResponse {
    /// HTTP status (200 or 206)
    pub status: u16,
    /// Full size of the resource, when the server disclosed it
    pub total_length: Option<u64>,
    /// Whether the server honors `Range` requests
    pub accepts_ranges: bool,
    /// Response body, positioned at the requested offset when status is 206
    pub body: Box<dyn Read + Send>,
}

impl std::fmt::Debug for RangeResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeResponse")
            .field("status", &self.status)
            .field("total_length", &self.total_length)
            .field("accepts_ranges", &self.accepts_ranges)
            .finish_non_exhaustive()
    }
}

impl RangeResponse {
    /// True when the body starts at the requested offset.
    pub fn is_partial(&self) -> bool {
        self.status == 206
    }
}

/// A connection capable of ranged GETs.
pub trait HttpInterface: Send + Sync {
    /// GET `uri` starting at byte `offset` (`Range: bytes={offset}-`).
    fn open_range(&self, uri: &Url, offset: u64) -> Result<RangeResponse, TransportError>;
}

/// Source of scoped connection handles.
pub trait StreamTransport: Send + Sync {
    /// Check out a handle. It is returned when the handle is dropped.
    fn acquire(&self) -> Result<InterfaceHandle, TransportError>;
}

/// A checked-out connection handle.
///
/// Dropping it releases the handle; there is no explicit close.
pub struct InterfaceHandle {
    interface: Box<dyn HttpInterface>,
    active: Option<Arc<AtomicUsize>>,
}

impl InterfaceHandle {
    /// Wrap an interface that is not tracked by any pool.
    pub fn new(interface: Box<dyn HttpInterface>) -> Self {
        Self {
            interface,
            active: None,
        }
    }

    /// Wrap an interface and count it as active until dropped.
    pub fn tracked(interface: Box<dyn HttpInterface>, active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::AcqRel);
        Self {
            interface,
            active: Some(active),
        }
    }
}

impl std::ops::Deref for InterfaceHandle {
    type Target = dyn HttpInterface;

    fn deref(&self) -> &Self::Target {
        self.interface.as_ref()
    }
}

impl Drop for InterfaceHandle {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            let left = active.fetch_sub(1, Ordering::AcqRel).saturating_sub(1);
            tracing::trace!(active = left, "Released HTTP interface");
        }
    }
}

/// Total resource size from a `Content-Range: bytes a-b/total` header.
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let (unit, rest) = value.trim().split_once(' ')?;
    if !unit.eq_ignore_ascii_case("bytes") {
        return None;
    }
    let (_, total) = rest.split_once('/')?;
    total.trim().parse().ok()
}
