//! Core data models shared by the resolver, the persistence codec and the
//! stream dispatcher.
//!
//! Defines the primary entities: [`TrackInfo`], [`TrackRecord`],
//! [`Playlist`], [`AudioItem`] and [`SearchResult`].
//!
//! # Ownership
//!
//! - [`TrackInfo`] is the generic, host-shaped part of a track. Hosts hand it
//!   back to us when restoring a persisted track.
//! - [`TrackRecord`] wraps a `TrackInfo` plus the album/artist enrichment
//!   fields. It is immutable: fields are only set by its constructors.

use bitflags::bitflags;

/// Generic track metadata, as exchanged with the host playback system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackInfo {
    /// Catalog-assigned identifier
    pub identifier: String,
    /// Track title
    pub title: String,
    /// Artist name
    pub author: String,
    /// Duration in milliseconds
    pub length_ms: u64,
    /// Live stream flag (the catalog never serves live streams)
    pub is_stream: bool,
    /// Media URL carrying the `codec=` token
    pub uri: Option<String>,
    /// Cover art URL
    pub artwork_url: Option<String>,
    /// International Standard Recording Code
    pub isrc: Option<String>,
}

/// An immutable, resolvable track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRecord {
    info: TrackInfo,
    album_name: Option<String>,
    album_url: Option<String>,
    artist_url: Option<String>,
    artist_artwork_url: Option<String>,
}

impl TrackRecord {
    /// Build a freshly resolved record. Enrichment fields stay absent since
    /// the search API never returns them.
    pub fn new(info: TrackInfo) -> Self {
        Self {
            info,
            album_name: None,
            album_url: None,
            artist_url: None,
            artist_artwork_url: None,
        }
    }

    /// Rebuild a record from its persisted form.
    pub fn with_enrichment(
        info: TrackInfo,
        album_name: Option<String>,
        album_url: Option<String>,
        artist_url: Option<String>,
        artist_artwork_url: Option<String>,
    ) -> Self {
        Self {
            info,
            album_name,
            album_url,
            artist_url,
            artist_artwork_url,
        }
    }

    pub fn info(&self) -> &TrackInfo {
        &self.info
    }

    pub fn id(&self) -> &str {
        &self.info.identifier
    }

    pub fn title(&self) -> &str {
        &self.info.title
    }

    pub fn artist(&self) -> &str {
        &self.info.author
    }

    pub fn duration_ms(&self) -> u64 {
        self.info.length_ms
    }

    pub fn isrc(&self) -> Option<&str> {
        self.info.isrc.as_deref()
    }

    pub fn artwork_url(&self) -> Option<&str> {
        self.info.artwork_url.as_deref()
    }

    /// Media URL, or an empty string when the record carries none.
    pub fn media_url(&self) -> &str {
        self.info.uri.as_deref().unwrap_or_default()
    }

    pub fn is_stream(&self) -> bool {
        self.info.is_stream
    }

    pub fn album_name(&self) -> Option<&str> {
        self.album_name.as_deref()
    }

    pub fn album_url(&self) -> Option<&str> {
        self.album_url.as_deref()
    }

    pub fn artist_url(&self) -> Option<&str> {
        self.artist_url.as_deref()
    }

    pub fn artist_artwork_url(&self) -> Option<&str> {
        self.artist_artwork_url.as_deref()
    }
}

/// A named list of tracks. Search results are returned as playlists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    /// Human-readable title
    pub name: String,
    /// Tracks in result order
    pub tracks: Vec<TrackRecord>,
    /// Index of a preselected track, if any
    pub selected_track: Option<usize>,
    /// Whether this playlist wraps search results
    pub is_search_result: bool,
}

impl Playlist {
    /// Create a playlist wrapping search results.
    pub fn search_result(name: impl Into<String>, tracks: Vec<TrackRecord>) -> Self {
        Self {
            name: name.into(),
            tracks,
            selected_track: None,
            is_search_result: true,
        }
    }
}

/// Outcome of loading an identifier that this source recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioItem {
    /// Exactly one track
    Track(TrackRecord),
    /// Several tracks (search results)
    Playlist(Playlist),
    /// Well-formed response without a matching track
    NoTrack,
}

bitflags! {
    /// Result categories a caller may request from a search.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SearchTypes: u8 {
        const TRACK    = 0b0000_0001;
        const ALBUM    = 0b0000_0010;
        const ARTIST   = 0b0000_0100;
        const PLAYLIST = 0b0000_1000;
        const TEXT     = 0b0001_0000;
    }
}

impl SearchTypes {
    /// True when the request only asks for categories the catalog indexes.
    ///
    /// An empty set means "whatever the source supports".
    pub fn tracks_only(self) -> bool {
        self.is_empty() || Self::TRACK.contains(self)
    }
}

/// Categorized search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub tracks: Vec<TrackRecord>,
    pub albums: Vec<Playlist>,
    pub artists: Vec<Playlist>,
    pub playlists: Vec<Playlist>,
    pub texts: Vec<String>,
}

impl SearchResult {
    /// A result holding tracks only; every other category is empty.
    pub fn tracks(tracks: Vec<TrackRecord>) -> Self {
        Self {
            tracks,
            ..Default::default()
        }
    }
}
