//! Persisted track encoding.
//!
//! Two layers:
//! - the **extension**: the four enrichment fields a resolver appends after
//!   the host's generic track fields ([`encode_extended`] / [`decode_extended`])
//! - the **message**: a self-contained, versioned envelope holding the
//!   generic fields and the extension ([`encode_message`] / [`decode_message`])
//!
//! # Wire format
//!
//! All integers are big-endian.
//!
//! ```text
//! text          := u16 byte length, UTF-8 bytes
//! nullable text := u8 presence (0 | 1), text when present
//!
//! extension     := nullable album_name
//!                  nullable album_url
//!                  nullable artist_url
//!                  nullable artist_artwork_url
//!
//! message       := u32 header (payload length | 1 << 30)
//!                  u8 version (3)
//!                  text title, text author, i64 length_ms, text identifier,
//!                  u8 is_stream, nullable uri, nullable artwork_url,
//!                  nullable isrc, text source_name,
//!                  extension,
//!                  i64 position
//! ```

use std::io::{self, Cursor, Read, Write};

use crate::model::{TrackInfo, TrackRecord};

/// Message format version written by [`encode_message`].
pub const MESSAGE_VERSION: u8 = 3;

/// Header bit marking a message that carries a version byte.
const FLAG_VERSIONED: u32 = 1 << 30;

/// Low header bits holding the payload length.
const PAYLOAD_LENGTH_MASK: u32 = FLAG_VERSIONED - 1;

/// Encoding errors
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Text too long to encode: {0} bytes")]
    TextTooLong(usize),

    #[error("Invalid UTF-8 in encoded text")]
    InvalidText,

    #[error("Invalid presence flag {0}")]
    InvalidFlag(u8),

    #[error("Unsupported message version {0}")]
    UnsupportedVersion(u8),

    #[error("Message header declares {declared} payload bytes, found {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("Track belongs to source {found:?}, expected {expected:?}")]
    SourceMismatch { expected: String, found: String },
}

// ============================================================================
// Primitives
// ============================================================================

fn write_u8(output: &mut impl Write, value: u8) -> Result<(), CodecError> {
    output.write_all(&[value])?;
    Ok(())
}

fn read_u8(input: &mut impl Read) -> Result<u8, CodecError> {
    let mut buf = [0u8; 1];
    input.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn write_bool(output: &mut impl Write, value: bool) -> Result<(), CodecError> {
    write_u8(output, u8::from(value))
}

fn read_bool(input: &mut impl Read) -> Result<bool, CodecError> {
    match read_u8(input)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(CodecError::InvalidFlag(other)),
    }
}

fn write_i64(output: &mut impl Write, value: i64) -> Result<(), CodecError> {
    output.write_all(&value.to_be_bytes())?;
    Ok(())
}

fn read_i64(input: &mut impl Read) -> Result<i64, CodecError> {
    let mut buf = [0u8; 8];
    input.read_exact(&mut buf)?;
    Ok(i64::from_be_bytes(buf))
}

/// Write a u16-length-prefixed UTF-8 string.
pub fn write_text(output: &mut impl Write, value: &str) -> Result<(), CodecError> {
    let len = u16::try_from(value.len()).map_err(|_| CodecError::TextTooLong(value.len()))?;
    output.write_all(&len.to_be_bytes())?;
    output.write_all(value.as_bytes())?;
    Ok(())
}

/// Read a u16-length-prefixed UTF-8 string.
pub fn read_text(input: &mut impl Read) -> Result<String, CodecError> {
    let mut len = [0u8; 2];
    input.read_exact(&mut len)?;

    let mut bytes = vec![0u8; u16::from_be_bytes(len) as usize];
    input.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| CodecError::InvalidText)
}

/// Write a presence byte, then the text when present.
pub fn write_nullable_text(output: &mut impl Write, value: Option<&str>) -> Result<(), CodecError> {
    write_bool(output, value.is_some())?;
    if let Some(text) = value {
        write_text(output, text)?;
    }
    Ok(())
}

/// Read a presence byte, then the text when present.
pub fn read_nullable_text(input: &mut impl Read) -> Result<Option<String>, CodecError> {
    if read_bool(input)? {
        read_text(input).map(Some)
    } else {
        Ok(None)
    }
}

// ============================================================================
// Extension
// ============================================================================

/// Append a record's enrichment fields.
///
/// Writes exactly four nullable strings, in the order [`decode_extended`]
/// reads them.
pub fn encode_extended(record: &TrackRecord, output: &mut impl Write) -> Result<(), CodecError> {
    write_nullable_text(output, record.album_name())?;
    write_nullable_text(output, record.album_url())?;
    write_nullable_text(output, record.artist_url())?;
    write_nullable_text(output, record.artist_artwork_url())?;
    Ok(())
}

/// Rebuild a record over host-supplied generic fields.
pub fn decode_extended(info: TrackInfo, input: &mut impl Read) -> Result<TrackRecord, CodecError> {
    let album_name = read_nullable_text(input)?;
    let album_url = read_nullable_text(input)?;
    let artist_url = read_nullable_text(input)?;
    let artist_artwork_url = read_nullable_text(input)?;

    Ok(TrackRecord::with_enrichment(
        info,
        album_name,
        album_url,
        artist_url,
        artist_artwork_url,
    ))
}

// ============================================================================
// Message envelope
// ============================================================================

/// Encode a complete, self-describing track message.
pub fn encode_message(record: &TrackRecord, source_name: &str) -> Result<Vec<u8>, CodecError> {
    let info = record.info();
    let mut payload = Vec::with_capacity(128);

    write_u8(&mut payload, MESSAGE_VERSION)?;
    write_text(&mut payload, &info.title)?;
    write_text(&mut payload, &info.author)?;
    write_i64(&mut payload, i64::try_from(info.length_ms).unwrap_or(i64::MAX))?;
    write_text(&mut payload, &info.identifier)?;
    write_bool(&mut payload, info.is_stream)?;
    write_nullable_text(&mut payload, info.uri.as_deref())?;
    write_nullable_text(&mut payload, info.artwork_url.as_deref())?;
    write_nullable_text(&mut payload, info.isrc.as_deref())?;
    write_text(&mut payload, source_name)?;
    encode_extended(record, &mut payload)?;
    // Playback position is never persisted
    write_i64(&mut payload, 0)?;

    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= PAYLOAD_LENGTH_MASK)
        .ok_or(CodecError::TextTooLong(payload.len()))?;

    let mut message = Vec::with_capacity(payload.len() + 4);
    message.extend_from_slice(&(len | FLAG_VERSIONED).to_be_bytes());
    message.extend_from_slice(&payload);
    Ok(message)
}

/// Decode a message written by [`encode_message`] for `source_name`.
pub fn decode_message(message: &[u8], source_name: &str) -> Result<TrackRecord, CodecError> {
    let mut input = Cursor::new(message);

    let mut header = [0u8; 4];
    input.read_exact(&mut header)?;
    let header = u32::from_be_bytes(header);

    let declared = (header & PAYLOAD_LENGTH_MASK) as usize;
    let actual = message.len() - 4;
    if declared != actual {
        return Err(CodecError::LengthMismatch { declared, actual });
    }

    let version = if header & FLAG_VERSIONED != 0 {
        read_u8(&mut input)?
    } else {
        1
    };
    if version != MESSAGE_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let title = read_text(&mut input)?;
    let author = read_text(&mut input)?;
    let length_ms = u64::try_from(read_i64(&mut input)?).unwrap_or(0);
    let identifier = read_text(&mut input)?;
    let is_stream = read_bool(&mut input)?;
    let uri = read_nullable_text(&mut input)?;
    let artwork_url = read_nullable_text(&mut input)?;
    let isrc = read_nullable_text(&mut input)?;

    let found = read_text(&mut input)?;
    if found != source_name {
        return Err(CodecError::SourceMismatch {
            expected: source_name.to_string(),
            found,
        });
    }

    let info = TrackInfo {
        identifier,
        title,
        author,
        length_ms,
        is_stream,
        uri,
        artwork_url,
        isrc,
    };
    let record = decode_extended(info, &mut input)?;
    let _position = read_i64(&mut input)?;

    Ok(record)
}
