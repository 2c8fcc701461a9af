//! Adapter layer: Convert catalog DTOs to domain models
//!
//! This is the ONLY place where DTO types are converted to [`TrackRecord`]s.

use super::dto;
use super::dto::value_text;
use crate::model::{TrackInfo, TrackRecord};

/// Query parameter appended to every media URL to carry the codec token.
pub const CODEC_PARAM: &str = "&codec=";

/// Convert a catalog track object to a freshly resolved record.
///
/// Missing text fields become empty strings. The media URL is built even
/// when `versions` is empty or incomplete; an unusable URL only fails once
/// somebody tries to stream it.
pub fn to_record(track: dto::CatalogTrack) -> TrackRecord {
    let isrc = track
        .isrc
        .first()
        .and_then(value_text)
        .filter(|code| !code.is_empty());

    let info = TrackInfo {
        identifier: track.id.unwrap_or_default(),
        title: track.title.unwrap_or_default(),
        author: track.artist.unwrap_or_default(),
        length_ms: duration_ms(track.duration),
        is_stream: false,
        uri: Some(media_url(track.versions.first())),
        artwork_url: track.picture,
        isrc,
    };

    TrackRecord::new(info)
}

/// Convert every object of a response array.
pub fn to_records(tracks: Vec<dto::CatalogTrack>) -> Vec<TrackRecord> {
    tracks.into_iter().map(to_record).collect()
}

/// Seconds to milliseconds, treating missing or negative values as zero.
pub fn duration_ms(seconds: Option<i64>) -> u64 {
    let seconds = seconds.unwrap_or(0).max(0) as u64;
    seconds.saturating_mul(1000)
}

/// Build `url + "&codec=" + codec` from the first version.
pub fn media_url(version: Option<&dto::Version>) -> String {
    let (url, codec) = version
        .map(|v| {
            (
                v.url.as_deref().unwrap_or_default(),
                v.codec.as_deref().unwrap_or_default(),
            )
        })
        .unwrap_or_default();

    let mut media_url = String::with_capacity(url.len() + CODEC_PARAM.len() + codec.len());
    media_url.push_str(url);
    media_url.push_str(CODEC_PARAM);
    media_url.push_str(codec);
    media_url
}
