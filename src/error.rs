//! Crate-wide error types.
//!
//! Each subsystem has its own `thiserror` enum for detailed handling:
//! [`ResolveError`], [`StreamError`], [`TransportError`], [`ConfigError`]
//! and [`CodecError`]. Hosts that do not care which subsystem failed can
//! work with [`Error`] instead.
//!
//! # Example
//!
//! ```ignore
//! use ripsrc::error::{Result, ResultExt};
//!
//! fn start(text: &str) -> Result<RipSrcSourceManager> {
//!     let config = Config::from_toml_str(text).with_context("Reading plugin config")?;
//!     RipSrcSourceManager::from_config(&config)
//! }
//! ```

use crate::catalog::ResolveError;
use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::stream::StreamError;
use crate::transport::TransportError;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog resolution failed
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Streaming failed
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    /// HTTP plumbing failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Persisted track could not be read or written
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, ConfigError> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Config(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, StreamError> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Stream(e).context(ctx))
    }
}
