//! Media streaming: resumable HTTP byte streams routed to container parsers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 StreamDispatcher::play                   │
//! │  acquire handle → parse URI → open stream → pick parser  │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │ PersistentHttpStream (owns the handle)
//!                              ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │           Demuxer (MPEG family | Matroska family)        │
//! │        reads the stream, pushes frames to FrameSink      │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │ interleaved f32 frames
//!                              ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                  FrameSink (host executor)               │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is blocking and runs on the caller's thread.

mod demux;
mod dispatch;
mod persistent;

pub use demux::SymphoniaDemuxer;
pub use dispatch::{ContainerKind, StreamDispatcher, StreamState};
pub use persistent::PersistentHttpStream;

use std::time::Duration;

use symphonia::core::io::MediaSource;

use crate::model::TrackRecord;
use crate::transport::TransportError;

/// Streaming errors
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("Invalid media URL {url:?}: {reason}")]
    InvalidUri { url: String, reason: String },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Playback sink error: {0}")]
    Sink(String),

    #[error("Playback task failed: {0}")]
    Task(String),
}

/// Format of the decoded audio handed to a [`FrameSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Information about a decoded frame.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Number of samples (per channel) decoded
    pub samples: usize,
    /// Timestamp of this frame
    pub timestamp: Duration,
}

/// What a sink wants after receiving a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkControl {
    Continue,
    Stop,
}

/// Consumer of decoded audio, provided by the host playback pipeline.
pub trait FrameSink {
    /// Called once, before the first frame.
    fn start(&mut self, format: StreamFormat) -> Result<(), StreamError> {
        let _ = format;
        Ok(())
    }

    /// Receive interleaved f32 samples.
    fn write(&mut self, frame: &DecodedFrame, samples: &[f32]) -> Result<SinkControl, StreamError>;
}

/// An external container parser.
///
/// Takes ownership of the stream; it is closed when `demux` returns.
pub trait Demuxer: Send + Sync {
    fn demux(
        &self,
        source: Box<dyn MediaSource>,
        track: &TrackRecord,
        sink: &mut dyn FrameSink,
    ) -> Result<(), StreamError>;
}
