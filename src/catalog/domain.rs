//! Internal domain types for catalog resolution.
//!
//! Identifiers arrive from the host as plain strings. They are parsed once,
//! at the boundary, into a [`ResolveRequest`] and matched exhaustively from
//! there on.

/// Prefix selecting a free-text search.
pub const SEARCH_PREFIX: &str = "ripsearch:";

/// Prefix selecting an exact ISRC lookup.
pub const ISRC_PREFIX: &str = "ripisrc:";

/// Title prefix of the playlist wrapping search results.
pub const SEARCH_PLAYLIST_PREFIX: &str = "RipSrc Search: ";

/// A parsed load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveRequest {
    /// `ripsearch:<query>`
    Search(String),
    /// `ripisrc:<code>`
    Isrc(String),
    /// Anything else; another source should handle it
    Unrecognized,
}

impl ResolveRequest {
    /// Parse an identifier by its prefix tag.
    pub fn parse(identifier: &str) -> Self {
        if let Some(query) = identifier.strip_prefix(SEARCH_PREFIX) {
            return Self::Search(query.to_string());
        }
        if let Some(isrc) = identifier.strip_prefix(ISRC_PREFIX) {
            return Self::Isrc(isrc.to_string());
        }
        Self::Unrecognized
    }
}

/// Errors that can occur while resolving identifiers.
///
/// A well-formed response without matches is NOT an error: it maps to
/// [`AudioItem::NoTrack`](crate::model::AudioItem::NoTrack) or an empty list.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    #[error("{source_name} can only search tracks")]
    UnsupportedSearchType { source_name: String },

    #[error("Network error: {0}")]
    Http(String),

    #[error("Catalog API returned HTTP {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl ResolveError {
    /// Whether the failure happened before any response was parsed.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        assert_eq!(
            ResolveRequest::parse("ripsearch:daft punk"),
            ResolveRequest::Search("daft punk".to_string())
        );
    }

    #[test]
    fn test_parse_isrc() {
        assert_eq!(
            ResolveRequest::parse("ripisrc:USRC17607839"),
            ResolveRequest::Isrc("USRC17607839".to_string())
        );
    }

    #[test]
    fn test_parse_empty_query_keeps_prefix_match() {
        assert_eq!(
            ResolveRequest::parse("ripsearch:"),
            ResolveRequest::Search(String::new())
        );
    }

    #[test]
    fn test_parse_unrecognized() {
        assert_eq!(
            ResolveRequest::parse("ytsearch:daft punk"),
            ResolveRequest::Unrecognized
        );
        assert_eq!(
            ResolveRequest::parse("https://example.com/track.mp3"),
            ResolveRequest::Unrecognized
        );
        // Prefix matching is case sensitive
        assert_eq!(
            ResolveRequest::parse("RIPSEARCH:daft punk"),
            ResolveRequest::Unrecognized
        );
    }

    #[test]
    fn test_unsupported_search_type_message() {
        let err = ResolveError::UnsupportedSearchType {
            source_name: "ripsrc".to_string(),
        };
        assert_eq!(err.to_string(), "ripsrc can only search tracks");
        assert!(!err.is_transport());
    }
}
