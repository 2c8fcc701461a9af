//! Stream dispatcher: opens a track's media stream and routes it to a parser.

use std::sync::Arc;

use symphonia::core::io::MediaSource;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{Demuxer, FrameSink, PersistentHttpStream, StreamError, SymphoniaDemuxer};
use crate::model::TrackRecord;
use crate::transport::StreamTransport;

/// Token in the media URL that selects the MPEG family.
const MPEG_CODEC_TOKEN: &str = "codec=mp4a";

/// Container family a media URL is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// MPEG family (MP4/AAC)
    Mpeg,
    /// Matroska family (WebM and everything unrecognized)
    Matroska,
}

impl ContainerKind {
    /// Pick the container family from the codec hint in a media URL.
    ///
    /// The hint is matched on the raw text: resolver-built URLs append
    /// `&codec=...` without checking for a `?`.
    pub fn from_media_url(media_url: &str) -> Self {
        if media_url.contains(MPEG_CODEC_TOKEN) {
            ContainerKind::Mpeg
        } else {
            ContainerKind::Matroska
        }
    }
}

/// Lifecycle of one streaming attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    ConnectionAcquired,
    UriResolved,
    StreamOpened,
    DemuxerSelected,
    Delegating,
    ClosedSuccess,
    ClosedError,
}

/// Tracks the state of a single attempt and logs each transition.
struct Attempt<'a> {
    track: &'a str,
    state: StreamState,
}

impl<'a> Attempt<'a> {
    fn new(track: &'a str) -> Self {
        Self {
            track,
            state: StreamState::Idle,
        }
    }

    fn advance(&mut self, next: StreamState) {
        debug!(track = self.track, from = ?self.state, to = ?next, "Stream state");
        self.state = next;
    }

    fn finish<T>(&mut self, result: Result<T, StreamError>) -> Result<T, StreamError> {
        match &result {
            Ok(_) => self.advance(StreamState::ClosedSuccess),
            Err(e) => {
                warn!(track = self.track, state = ?self.state, error = %e, "Streaming attempt failed");
                self.advance(StreamState::ClosedError);
            }
        }
        result
    }
}

/// Opens media streams and hands them to the matching container parser.
#[derive(Clone)]
pub struct StreamDispatcher {
    transport: Arc<dyn StreamTransport>,
    mpeg: Arc<dyn Demuxer>,
    matroska: Arc<dyn Demuxer>,
}

impl StreamDispatcher {
    pub fn new(
        transport: Arc<dyn StreamTransport>,
        mpeg: Arc<dyn Demuxer>,
        matroska: Arc<dyn Demuxer>,
    ) -> Self {
        Self {
            transport,
            mpeg,
            matroska,
        }
    }

    /// Dispatcher using the built-in symphonia parsers.
    pub fn with_default_demuxers(transport: Arc<dyn StreamTransport>) -> Self {
        Self::new(
            transport,
            Arc::new(SymphoniaDemuxer::mpeg()),
            Arc::new(SymphoniaDemuxer::matroska()),
        )
    }

    /// The parser a record's stream would be routed to.
    pub fn demuxer_for(&self, record: &TrackRecord) -> (ContainerKind, &Arc<dyn Demuxer>) {
        let kind = ContainerKind::from_media_url(record.media_url());
        let demuxer = match kind {
            ContainerKind::Mpeg => &self.mpeg,
            ContainerKind::Matroska => &self.matroska,
        };
        (kind, demuxer)
    }

    /// Open the raw resumable stream for a record.
    ///
    /// The returned stream owns its connection handle.
    pub fn open_stream(&self, record: &TrackRecord) -> Result<PersistentHttpStream, StreamError> {
        let mut attempt = Attempt::new(record.id());
        match self.open_with(&mut attempt, record) {
            Ok(stream) => Ok(stream),
            Err(e) => attempt.finish(Err(e)),
        }
    }

    fn open_with(
        &self,
        attempt: &mut Attempt<'_>,
        record: &TrackRecord,
    ) -> Result<PersistentHttpStream, StreamError> {
        let handle = self.transport.acquire()?;
        attempt.advance(StreamState::ConnectionAcquired);

        let media_url = record.media_url();
        let uri = Url::parse(media_url).map_err(|e| StreamError::InvalidUri {
            url: media_url.to_string(),
            reason: e.to_string(),
        })?;
        attempt.advance(StreamState::UriResolved);

        let stream = PersistentHttpStream::open(handle, uri, None)?;
        attempt.advance(StreamState::StreamOpened);
        Ok(stream)
    }

    /// Stream a track into the host sink.
    ///
    /// The stream and its connection handle are released before this
    /// returns, whatever the outcome.
    #[instrument(skip_all, fields(track = record.id()))]
    pub fn play(&self, record: &TrackRecord, sink: &mut dyn FrameSink) -> Result<(), StreamError> {
        let mut attempt = Attempt::new(record.id());
        let result = self.play_with(&mut attempt, record, sink);
        attempt.finish(result)
    }

    /// Stream a track on tokio's blocking pool and hand the sink back.
    ///
    /// For async hosts: the streaming HTTP client must not run on an async
    /// worker thread.
    pub async fn play_blocking<S>(&self, record: TrackRecord, mut sink: S) -> Result<S, StreamError>
    where
        S: FrameSink + Send + 'static,
    {
        let dispatcher = self.clone();
        tokio::task::spawn_blocking(move || dispatcher.play(&record, &mut sink).map(|()| sink))
            .await
            .map_err(|e| StreamError::Task(e.to_string()))?
    }

    fn play_with(
        &self,
        attempt: &mut Attempt<'_>,
        record: &TrackRecord,
        sink: &mut dyn FrameSink,
    ) -> Result<(), StreamError> {
        let stream = self.open_with(attempt, record)?;

        let (kind, demuxer) = self.demuxer_for(record);
        debug!(?kind, "Selected container parser");
        attempt.advance(StreamState::DemuxerSelected);

        attempt.advance(StreamState::Delegating);
        let source: Box<dyn MediaSource> = Box::new(stream);
        demuxer.demux(source, record, sink)
    }
}
