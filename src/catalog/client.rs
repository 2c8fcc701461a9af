//! Catalog API client
//!
//! Builds the two templated GET requests the catalog understands and turns
//! their JSON bodies into [`TrackRecord`]s:
//!
//! - search: `{base}?p={key}&q={query}`
//! - ISRC:   `{base}?p={key}&isrcs={isrc}&external={true|false}`
//!
//! Both endpoints answer with a JSON array (or `null`). An empty answer is a
//! normal outcome, never an error.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::domain::ResolveError;
use super::traits::JsonFetcher;
use super::{adapter, dto};
use crate::config::ResolverSettings;
use crate::model::TrackRecord;

/// Catalog API client
pub struct CatalogClient {
    settings: ResolverSettings,
    fetcher: Arc<dyn JsonFetcher>,
}

impl CatalogClient {
    /// Create a client over the given fetch primitive.
    pub fn new(settings: ResolverSettings, fetcher: Arc<dyn JsonFetcher>) -> Self {
        Self { settings, fetcher }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Free-text search. Returns every matched track, possibly none.
    pub async fn search(&self, query: &str) -> Result<Vec<TrackRecord>, ResolveError> {
        let url = self.search_url(query);
        debug!(query, "Searching catalog");

        let body = self.fetcher.get_json(&url, &self.settings.user_agent).await?;
        let tracks = parse_tracks(body)?;

        debug!(query, count = tracks.len(), "Catalog search finished");
        Ok(adapter::to_records(tracks))
    }

    /// Exact ISRC lookup. Returns `None` when the catalog has no match.
    pub async fn lookup_isrc(&self, isrc: &str) -> Result<Option<TrackRecord>, ResolveError> {
        let url = self.isrc_url(isrc);
        debug!(isrc, "Looking up ISRC");

        let body = self.fetcher.get_json(&url, &self.settings.user_agent).await?;
        let Some(first) = parse_items(body)?.into_iter().next() else {
            return Ok(None);
        };

        // The API answers unknown codes with a placeholder whose id is null
        if first.get("id").is_none_or(Value::is_null) {
            return Ok(None);
        }

        let track = parse_track(first)?;
        Ok(Some(adapter::to_record(track)))
    }

    /// `{base}?p={key}&q={urlencoded query}`
    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}?p={}&q={}",
            self.settings.base_url,
            self.settings.api_key,
            urlencoding::encode(query)
        )
    }

    /// `{base}?p={key}&isrcs={urlencoded isrc}&external={flag}`
    pub fn isrc_url(&self, isrc: &str) -> String {
        format!(
            "{}?p={}&isrcs={}&external={}",
            self.settings.base_url,
            self.settings.api_key,
            urlencoding::encode(isrc),
            self.settings.external
        )
    }
}

/// Split a response body into its array elements. No body means no elements.
fn parse_items(body: Option<Value>) -> Result<Vec<Value>, ResolveError> {
    match body {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(ResolveError::Parse(format!(
            "expected a JSON array of tracks, got {other}"
        ))),
    }
}

fn parse_track(item: Value) -> Result<dto::CatalogTrack, ResolveError> {
    serde_json::from_value(item).map_err(|e| ResolveError::Parse(e.to_string()))
}

/// Parse a response body into track objects.
fn parse_tracks(body: Option<Value>) -> Result<Vec<dto::CatalogTrack>, ResolveError> {
    parse_items(body)?.into_iter().map(parse_track).collect()
}
