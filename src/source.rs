//! Host plugin interface.
//!
//! A playback host drives every source it knows through
//! [`AudioSourceManager`]: it offers each identifier to each source until one
//! accepts it, persists tracks through `encode_track`/`decode_track`, and
//! shuts sources down on exit.

use std::io::{Read, Write};

use async_trait::async_trait;

use crate::catalog::ResolveError;
use crate::codec::CodecError;
use crate::model::{AudioItem, SearchResult, SearchTypes, TrackInfo, TrackRecord};
use crate::transport::{TransportConfig, TransportError};

/// Adjusts transport settings; see [`AudioSourceManager::configure_transport`].
pub type TransportConfigurator = Box<dyn FnOnce(TransportConfig) -> TransportConfig + Send>;

/// A track source the host can resolve, search, persist and stream through.
#[async_trait]
pub trait AudioSourceManager: Send + Sync {
    /// Name the host stores alongside persisted tracks.
    fn source_name(&self) -> &str;

    /// Resolve an identifier.
    ///
    /// `Ok(None)` means this source does not handle the identifier and the
    /// host should try the next one.
    async fn load_item(&self, identifier: &str) -> Result<Option<AudioItem>, ResolveError>;

    /// Search the catalog for the requested result types.
    async fn load_search(&self, query: &str, types: SearchTypes)
    -> Result<SearchResult, ResolveError>;

    fn is_track_encodable(&self, track: &TrackRecord) -> bool;

    /// Append source-specific fields after the host's generic ones.
    fn encode_track(&self, track: &TrackRecord, output: &mut dyn Write) -> Result<(), CodecError>;

    /// Rebuild a track from the host's generic fields and our appended ones.
    fn decode_track(&self, info: TrackInfo, input: &mut dyn Read)
    -> Result<TrackRecord, CodecError>;

    /// Adjust the HTTP settings used for later requests.
    fn configure_transport(&self, configurator: TransportConfigurator)
    -> Result<(), TransportError>;

    /// Release pooled resources. Failures are logged, never returned.
    fn shutdown(&self);
}
