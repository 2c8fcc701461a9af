//! Catalog API Data Transfer Objects
//!
//! These types match what the catalog API returns for both the search and
//! the ISRC endpoints: a JSON array of track objects (or `null`).
//! DO NOT use these types outside the catalog module - convert them to
//! [`TrackRecord`](crate::model::TrackRecord) in the adapter.
//!
//! The API is loose about scalar types (ids may be numbers, durations may be
//! strings), so text and integer fields go through lenient deserializers.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A single track object
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogTrack {
    /// Catalog identifier
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    /// Track title
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    /// Artist name
    #[serde(default, deserialize_with = "lenient_text")]
    pub artist: Option<String>,
    /// Duration in seconds
    #[serde(default, deserialize_with = "lenient_integer")]
    pub duration: Option<i64>,
    /// Cover art URL
    #[serde(default, deserialize_with = "lenient_text")]
    pub picture: Option<String>,
    /// ISRC codes; only the first one is used
    #[serde(default, deserialize_with = "lenient_list")]
    pub isrc: Vec<Value>,
    /// Downloadable versions; only the first one is used
    #[serde(default, deserialize_with = "lenient_versions")]
    pub versions: Vec<Version>,
}

/// A downloadable rendition of a track
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Version {
    /// Base media URL (already carries a query string)
    #[serde(default, deserialize_with = "lenient_text")]
    pub url: Option<String>,
    /// Codec token, e.g. `mp4a` or `webm`
    #[serde(default, deserialize_with = "lenient_text")]
    pub codec: Option<String>,
}

/// Render a scalar JSON value as text. `null`, arrays and objects have no
/// text form.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_text))
}

fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    })
}

fn lenient_versions<'de, D>(deserializer: D) -> Result<Vec<Version>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = lenient_list(deserializer)?;
    Ok(items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect())
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs accept what the API returns.
// ============================================================================

#[cfg(test)]
mod contract_tests {
    use super::*;

    #[test]
    fn test_parse_full_track() {
        let json = r#"{
            "id": "1",
            "title": "One More Time",
            "artist": "Daft Punk",
            "duration": 320,
            "picture": "https://cdn/cover.jpg",
            "isrc": ["GBDUW0000053"],
            "versions": [
                {"url": "https://cdn/x?sig=abc", "codec": "mp4a"},
                {"url": "https://cdn/y?sig=def", "codec": "webm"}
            ]
        }"#;

        let track: CatalogTrack = serde_json::from_str(json).expect("Should parse track");

        assert_eq!(track.id.as_deref(), Some("1"));
        assert_eq!(track.title.as_deref(), Some("One More Time"));
        assert_eq!(track.duration, Some(320));
        assert_eq!(track.isrc.len(), 1);
        assert_eq!(track.versions.len(), 2);
        assert_eq!(track.versions[0].codec.as_deref(), Some("mp4a"));
    }

    #[test]
    fn test_parse_minimal_track() {
        let track: CatalogTrack = serde_json::from_str("{}").expect("Should parse empty object");

        assert!(track.id.is_none());
        assert!(track.title.is_none());
        assert!(track.duration.is_none());
        assert!(track.isrc.is_empty());
        assert!(track.versions.is_empty());
    }

    #[test]
    fn test_numeric_id_becomes_text() {
        let track: CatalogTrack =
            serde_json::from_str(r#"{"id": 12345}"#).expect("Should parse numeric id");
        assert_eq!(track.id.as_deref(), Some("12345"));
    }

    #[test]
    fn test_null_fields() {
        let json = r#"{"id": null, "title": null, "isrc": null, "versions": null}"#;
        let track: CatalogTrack = serde_json::from_str(json).expect("Should parse nulls");

        assert!(track.id.is_none());
        assert!(track.title.is_none());
        assert!(track.isrc.is_empty());
        assert!(track.versions.is_empty());
    }

    #[test]
    fn test_duration_variants() {
        let as_string: CatalogTrack = serde_json::from_str(r#"{"duration": "245"}"#).unwrap();
        assert_eq!(as_string.duration, Some(245));

        let as_float: CatalogTrack = serde_json::from_str(r#"{"duration": 245.9}"#).unwrap();
        assert_eq!(as_float.duration, Some(245));

        let garbage: CatalogTrack = serde_json::from_str(r#"{"duration": "long"}"#).unwrap();
        assert_eq!(garbage.duration, None);
    }

    #[test]
    fn test_malformed_version_entry_is_tolerated() {
        let json = r#"{"versions": ["not-an-object"]}"#;
        let track: CatalogTrack = serde_json::from_str(json).expect("Should parse");
        assert_eq!(track.versions.len(), 1);
        assert!(track.versions[0].url.is_none());
    }

    #[test]
    fn test_parse_response_array() {
        let json = r#"[{"id": "1"}, {"id": "2"}]"#;
        let tracks: Option<Vec<CatalogTrack>> = serde_json::from_str(json).unwrap();
        assert_eq!(tracks.map(|t| t.len()), Some(2));

        let null: Option<Vec<CatalogTrack>> = serde_json::from_str("null").unwrap();
        assert!(null.is_none());
    }
}
