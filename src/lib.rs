//! RipSrc - catalog resolver and media stream dispatcher.
//!
//! Resolves `ripsearch:` and `ripisrc:` identifiers against a remote catalog
//! API, persists the resulting tracks, and streams their media to the
//! container parser matching the codec hint in the media URL.
//!
//! ```ignore
//! let config = Config::from_toml_str(&text)?;
//! let manager = RipSrcSourceManager::from_config(&config)?;
//!
//! if let Some(AudioItem::Track(track)) = manager.resolve("ripisrc:USRC17607839").await? {
//!     let dispatcher = manager.dispatcher();
//!     tokio::task::spawn_blocking(move || dispatcher.play(&track, &mut sink)).await??;
//! }
//! ```

pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod resolver;
pub mod source;
pub mod stream;
pub mod transport;

#[cfg(test)]
pub mod test_utils;

pub use catalog::ResolveError;
pub use config::{Config, ResolverSettings};
pub use error::{Error, Result};
pub use model::{AudioItem, Playlist, SearchResult, SearchTypes, TrackInfo, TrackRecord};
pub use resolver::RipSrcSourceManager;
pub use source::AudioSourceManager;
pub use stream::{ContainerKind, FrameSink, StreamDispatcher, StreamError};
