//! Container parsers backed by symphonia.
//!
//! Supported containers:
//! - ISO/MP4 (the MPEG family, AAC audio)
//! - Matroska/WebM (Vorbis, FLAC, PCM audio)

use std::time::Duration;

use symphonia::core::audio::{AudioBufferRef, Layout, SampleBuffer};
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::default::formats::{IsoMp4Reader, MkvReader};
use tracing::{debug, trace};

use super::{ContainerKind, DecodedFrame, Demuxer, FrameSink, SinkControl, StreamError, StreamFormat};
use crate::model::TrackRecord;

/// Demuxes and decodes one container family, pushing f32 frames to the sink.
#[derive(Debug, Clone, Copy)]
pub struct SymphoniaDemuxer {
    kind: ContainerKind,
}

impl SymphoniaDemuxer {
    pub fn mpeg() -> Self {
        Self {
            kind: ContainerKind::Mpeg,
        }
    }

    pub fn matroska() -> Self {
        Self {
            kind: ContainerKind::Matroska,
        }
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    fn open_reader(&self, mss: MediaSourceStream) -> Result<Box<dyn FormatReader>, StreamError> {
        let options = FormatOptions {
            enable_gapless: true,
            ..Default::default()
        };

        let reader: Box<dyn FormatReader> = match self.kind {
            ContainerKind::Mpeg => {
                Box::new(IsoMp4Reader::try_new(mss, &options).map_err(unsupported)?)
            }
            ContainerKind::Matroska => {
                Box::new(MkvReader::try_new(mss, &options).map_err(unsupported)?)
            }
        };
        Ok(reader)
    }
}

fn unsupported(e: SymphoniaError) -> StreamError {
    StreamError::UnsupportedFormat(e.to_string())
}

impl Demuxer for SymphoniaDemuxer {
    fn demux(
        &self,
        source: Box<dyn MediaSource>,
        track: &TrackRecord,
        sink: &mut dyn FrameSink,
    ) -> Result<(), StreamError> {
        let mss = MediaSourceStream::new(source, Default::default());
        let mut reader = self.open_reader(mss)?;

        let audio = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| StreamError::UnsupportedFormat("No audio track found".to_string()))?;

        let track_id = audio.id;
        let codec_params = audio.codec_params.clone();
        let time_base = codec_params.time_base;

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| StreamError::Decode("Unknown sample rate".to_string()))?;
        // Matroska only reports a layout
        let channels = codec_params
            .channels
            .or_else(|| codec_params.channel_layout.map(Layout::into_channels))
            .map(|c| c.count() as u16)
            .unwrap_or(2);

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| StreamError::Decode(e.to_string()))?;

        debug!(
            kind = ?self.kind,
            track = track.id(),
            sample_rate,
            channels,
            "Demuxing media stream"
        );
        sink.start(StreamFormat {
            sample_rate,
            channels,
        })?;

        let mut buffer: Option<SampleBuffer<f32>> = None;
        loop {
            let packet = match reader.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(e) => return Err(StreamError::Decode(e.to_string())),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let timestamp = time_base
                .map(|tb| {
                    let time = tb.calc_time(packet.ts());
                    Duration::from_secs_f64(time.seconds as f64 + time.frac)
                })
                .unwrap_or(Duration::ZERO);

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    trace!(error = e, "Skipping undecodable packet");
                    continue;
                }
                Err(e) => return Err(StreamError::Decode(e.to_string())),
            };

            let channel_count = decoded.spec().channels.count().max(1);
            let samples = interleave(&mut buffer, decoded);
            let frame = DecodedFrame {
                samples: samples.len() / channel_count,
                timestamp,
            };

            if sink.write(&frame, samples)? == SinkControl::Stop {
                debug!(track = track.id(), "Playback sink stopped the stream");
                break;
            }
        }

        Ok(())
    }
}

/// Copy a decoded packet into the reused interleaved buffer.
///
/// The buffer is reallocated when a packet outgrows it and never shrinks.
fn interleave<'a>(
    buffer: &'a mut Option<SampleBuffer<f32>>,
    decoded: AudioBufferRef<'_>,
) -> &'a [f32] {
    let spec = *decoded.spec();
    let frames = decoded.capacity();
    let needed = frames * spec.channels.count();

    if buffer.as_ref().is_some_and(|b| b.capacity() < needed) {
        *buffer = None;
    }
    let samples = buffer.get_or_insert_with(|| SampleBuffer::new(frames as u64, spec));
    samples.copy_interleaved_ref(decoded);
    samples.samples()
}
