//! Test utilities and fixtures for ripsrc tests.
//!
//! This module provides settings and track fixtures plus in-memory stand-ins
//! for the HTTP pool, the container parsers and the host's playback sink.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{MockDemuxer, MockTransport, RecordingSink};
//!
//! let transport = Arc::new(MockTransport::serving(b"bytes".to_vec()));
//! let demuxer = Arc::new(MockDemuxer::succeeding());
//! // ... dispatch, then assert on transport.released() and demuxer.calls()
//! ```

use std::io::{Cursor, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use symphonia::core::io::MediaSource;
use url::Url;

use crate::config::ResolverSettings;
use crate::model::{TrackInfo, TrackRecord};
use crate::stream::{DecodedFrame, Demuxer, FrameSink, SinkControl, StreamError, StreamFormat};
use crate::transport::{
    HttpInterface, InterfaceHandle, RangeResponse, StreamTransport, TransportError,
};

/// Resolver settings pointing at a fake catalog.
pub fn test_settings() -> ResolverSettings {
    ResolverSettings::new(
        "test-key",
        "https://api.example.com/tracks",
        None,
        None,
        false,
    )
}

/// Creates a resolved TrackRecord with sensible defaults.
///
/// The media URL selects the MPEG family. Customize with
/// [`TrackRecord::new`] and struct update syntax on the info:
///
/// ```ignore
/// let custom = TrackRecord::new(TrackInfo {
///     uri: Some("https://cdn.example.com/x&codec=webm".to_string()),
///     ..mock_track_record().info().clone()
/// });
/// ```
pub fn mock_track_record() -> TrackRecord {
    TrackRecord::new(TrackInfo {
        identifier: "1".to_string(),
        title: "One More Time".to_string(),
        author: "Daft Punk".to_string(),
        length_ms: 320_000,
        is_stream: false,
        uri: Some("https://cdn.example.com/audio/1?id=1&codec=mp4a".to_string()),
        artwork_url: Some("https://cdn.example.com/cover/1.jpg".to_string()),
        isrc: Some("GBDUW0000053".to_string()),
    })
}

// ============================================================================
// HTTP interface
// ============================================================================

#[derive(Debug, Default)]
struct InterfaceState {
    offsets: Vec<u64>,
    truncate_next: Option<usize>,
}

/// In-memory [`HttpInterface`] serving a fixed body.
///
/// Clones share the request log.
#[derive(Clone)]
pub struct MockInterface {
    data: Arc<Vec<u8>>,
    ranges: bool,
    fail_status: Option<u16>,
    state: Arc<Mutex<InterfaceState>>,
}

impl MockInterface {
    /// Serve `data`, honoring range requests.
    pub fn serving(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(data),
            ranges: true,
            fail_status: None,
            state: Arc::default(),
        }
    }

    /// Answer every request with the given HTTP status.
    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Self::serving(Vec::new())
        }
    }

    /// Whether range requests are honored (otherwise 200 with the full body).
    pub fn with_ranges(mut self, ranges: bool) -> Self {
        self.ranges = ranges;
        self
    }

    /// Cut the first response body after `len` bytes while still
    /// announcing the full length.
    pub fn truncate_first_response(self, len: usize) -> Self {
        self.state.lock().truncate_next = Some(len);
        self
    }

    /// Offsets requested so far, in order.
    pub fn offsets(&self) -> Vec<u64> {
        self.state.lock().offsets.clone()
    }
}

impl HttpInterface for MockInterface {
    fn open_range(&self, _uri: &Url, offset: u64) -> Result<RangeResponse, TransportError> {
        let mut state = self.state.lock();
        state.offsets.push(offset);

        if let Some(status) = self.fail_status {
            return Err(TransportError::Status(status));
        }

        let total = self.data.len() as u64;
        let start = if self.ranges { offset } else { 0 };
        // Range Not Satisfiable, as real servers answer `bytes=len-`
        if start > 0 && start >= total {
            return Err(TransportError::Status(416));
        }

        let mut body = self.data[start as usize..].to_vec();
        if let Some(len) = state.truncate_next.take() {
            body.truncate(len);
        }

        Ok(RangeResponse {
            status: if self.ranges { 206 } else { 200 },
            total_length: Some(total),
            accepts_ranges: self.ranges,
            body: Box::new(Cursor::new(body)),
        })
    }
}

/// In-memory [`StreamTransport`] counting acquisitions and releases.
pub struct MockTransport {
    data: Vec<u8>,
    closed: bool,
    acquired: AtomicUsize,
    active: Arc<AtomicUsize>,
}

impl MockTransport {
    /// Hand out interfaces serving `data`.
    pub fn serving(data: Vec<u8>) -> Self {
        Self {
            data,
            closed: false,
            acquired: AtomicUsize::new(0),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A transport whose every acquisition fails.
    pub fn closed() -> Self {
        Self {
            closed: true,
            ..Self::serving(Vec::new())
        }
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::Acquire)
    }

    pub fn released(&self) -> usize {
        self.acquired() - self.active.load(Ordering::Acquire)
    }
}

impl StreamTransport for MockTransport {
    fn acquire(&self) -> Result<InterfaceHandle, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.acquired.fetch_add(1, Ordering::AcqRel);
        Ok(InterfaceHandle::tracked(
            Box::new(MockInterface::serving(self.data.clone())),
            Arc::clone(&self.active),
        ))
    }
}

// ============================================================================
// Demuxing and playback
// ============================================================================

/// Demuxer that drains the stream and records what it saw.
pub struct MockDemuxer {
    error: Option<String>,
    calls: AtomicUsize,
    bytes: Mutex<Vec<u8>>,
}

impl MockDemuxer {
    pub fn succeeding() -> Self {
        Self {
            error: None,
            calls: AtomicUsize::new(0),
            bytes: Mutex::new(Vec::new()),
        }
    }

    /// Fail with a decode error after draining the stream.
    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::succeeding()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Acquire)
    }

    /// Bytes read during the last call.
    pub fn bytes_seen(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }
}

impl Demuxer for MockDemuxer {
    fn demux(
        &self,
        mut source: Box<dyn MediaSource>,
        _track: &TrackRecord,
        sink: &mut dyn FrameSink,
    ) -> Result<(), StreamError> {
        self.calls.fetch_add(1, Ordering::AcqRel);

        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        *self.bytes.lock() = bytes;

        if let Some(message) = &self.error {
            return Err(StreamError::Decode(message.clone()));
        }

        sink.start(StreamFormat {
            sample_rate: 44_100,
            channels: 2,
        })?;
        sink.write(
            &DecodedFrame {
                samples: 1,
                timestamp: Default::default(),
            },
            &[0.0, 0.0],
        )?;
        Ok(())
    }
}

/// Sink recording what it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub format: Option<StreamFormat>,
    pub frames: usize,
    pub samples: usize,
    /// Stop after this many frames
    pub stop_after: Option<usize>,
}

impl FrameSink for RecordingSink {
    fn start(&mut self, format: StreamFormat) -> Result<(), StreamError> {
        self.format = Some(format);
        Ok(())
    }

    fn write(&mut self, _frame: &DecodedFrame, samples: &[f32]) -> Result<SinkControl, StreamError> {
        self.frames += 1;
        self.samples += samples.len();

        match self.stop_after {
            Some(limit) if self.frames >= limit => Ok(SinkControl::Stop),
            _ => Ok(SinkControl::Continue),
        }
    }
}
