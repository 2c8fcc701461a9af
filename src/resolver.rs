//! RipSrc source manager - the resolver the host talks to.
//!
//! Ties the pieces together:
//! 1. Parse the identifier into a [`ResolveRequest`]
//! 2. Query the catalog through [`CatalogClient`]
//! 3. Wrap the records into the host's item shapes
//! 4. Persist tracks through [`codec`]
//! 5. Hand out a [`StreamDispatcher`] sharing the same HTTP pool

use std::io::{Read, Write};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::catalog::{
    CatalogClient, JsonFetcher, ResolveError, ResolveRequest, SEARCH_PLAYLIST_PREFIX, SEARCH_PREFIX,
};
use crate::codec::{self, CodecError};
use crate::config::{Config, HttpConfig, ResolverSettings};
use crate::error::{Result, ResultExt};
use crate::model::{AudioItem, Playlist, SearchResult, SearchTypes, TrackInfo, TrackRecord};
use crate::source::{AudioSourceManager, TransportConfigurator};
use crate::stream::StreamDispatcher;
use crate::transport::{HttpInterfaceManager, TransportConfig, TransportError};

/// Resolves `ripsearch:` and `ripisrc:` identifiers against the catalog.
pub struct RipSrcSourceManager {
    client: CatalogClient,
    transport: Arc<HttpInterfaceManager>,
}

impl RipSrcSourceManager {
    /// Create a manager with its own HTTP pool.
    pub fn new(
        settings: ResolverSettings,
        http: &HttpConfig,
    ) -> std::result::Result<Self, TransportError> {
        let transport = Arc::new(HttpInterfaceManager::new(TransportConfig::from_http(
            http,
            settings.user_agent.as_str(),
        ))?);
        let fetcher: Arc<dyn JsonFetcher> = transport.clone();

        info!(
            source = %settings.source_name,
            base_url = %settings.base_url,
            "Created RipSrc source manager"
        );
        Ok(Self {
            client: CatalogClient::new(settings, fetcher),
            transport,
        })
    }

    /// Create a manager from the parsed plugin configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = config
            .ripsrc
            .resolve()
            .with_context("Invalid [ripsrc] section")?;
        Ok(Self::new(settings, &config.http)?)
    }

    /// Create a manager that fetches catalog JSON through `fetcher`.
    ///
    /// Streaming still goes through a fresh HTTP pool.
    pub fn with_fetcher(
        settings: ResolverSettings,
        http: &HttpConfig,
        fetcher: Arc<dyn JsonFetcher>,
    ) -> std::result::Result<Self, TransportError> {
        let transport = Arc::new(HttpInterfaceManager::new(TransportConfig::from_http(
            http,
            settings.user_agent.as_str(),
        ))?);
        Ok(Self {
            client: CatalogClient::new(settings, fetcher),
            transport,
        })
    }

    pub fn settings(&self) -> &ResolverSettings {
        self.client.settings()
    }

    /// The shared HTTP pool.
    pub fn transport(&self) -> &Arc<HttpInterfaceManager> {
        &self.transport
    }

    /// Dispatcher streaming through this manager's pool with the built-in parsers.
    pub fn dispatcher(&self) -> StreamDispatcher {
        StreamDispatcher::with_default_demuxers(self.transport.clone())
    }

    /// Resolve an identifier.
    ///
    /// `Ok(None)` when the identifier carries neither prefix.
    pub async fn resolve(
        &self,
        identifier: &str,
    ) -> std::result::Result<Option<AudioItem>, ResolveError> {
        match ResolveRequest::parse(identifier) {
            ResolveRequest::Search(query) => {
                let tracks = self.client.search(&query).await?;
                let name = format!("{SEARCH_PLAYLIST_PREFIX}{query}");
                Ok(Some(AudioItem::Playlist(Playlist::search_result(name, tracks))))
            }
            ResolveRequest::Isrc(isrc) => {
                let item = match self.client.lookup_isrc(&isrc).await? {
                    Some(record) => AudioItem::Track(record),
                    None => {
                        debug!(isrc, "No catalog match for ISRC");
                        AudioItem::NoTrack
                    }
                };
                Ok(Some(item))
            }
            ResolveRequest::Unrecognized => Ok(None),
        }
    }

    /// Free-text search for the requested result types.
    ///
    /// The catalog indexes tracks only: asking for any other category fails
    /// before a request is made.
    pub async fn search(
        &self,
        query: &str,
        types: SearchTypes,
    ) -> std::result::Result<SearchResult, ResolveError> {
        if !types.tracks_only() {
            return Err(ResolveError::UnsupportedSearchType {
                source_name: self.settings().source_name.clone(),
            });
        }

        let query = query.strip_prefix(SEARCH_PREFIX).unwrap_or(query);
        let tracks = self.client.search(query).await?;
        Ok(SearchResult::tracks(tracks))
    }
}

#[async_trait]
impl AudioSourceManager for RipSrcSourceManager {
    fn source_name(&self) -> &str {
        &self.settings().source_name
    }

    async fn load_item(
        &self,
        identifier: &str,
    ) -> std::result::Result<Option<AudioItem>, ResolveError> {
        self.resolve(identifier).await
    }

    async fn load_search(
        &self,
        query: &str,
        types: SearchTypes,
    ) -> std::result::Result<SearchResult, ResolveError> {
        self.search(query, types).await
    }

    fn is_track_encodable(&self, _track: &TrackRecord) -> bool {
        true
    }

    fn encode_track(
        &self,
        track: &TrackRecord,
        mut output: &mut dyn Write,
    ) -> std::result::Result<(), CodecError> {
        codec::encode_extended(track, &mut output)
    }

    fn decode_track(
        &self,
        info: TrackInfo,
        mut input: &mut dyn Read,
    ) -> std::result::Result<TrackRecord, CodecError> {
        codec::decode_extended(info, &mut input)
    }

    fn configure_transport(
        &self,
        configurator: TransportConfigurator,
    ) -> std::result::Result<(), TransportError> {
        self.transport.configure(configurator)
    }

    fn shutdown(&self) {
        self.transport.shutdown();
    }
}
