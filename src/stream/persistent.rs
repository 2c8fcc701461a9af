//! Resumable HTTP byte stream.
//!
//! Reads a remote resource through ranged GETs. Seeking drops the current
//! response and the next read reconnects at the new offset. A response that
//! ends before the known content length is resumed from the current
//! position, once per read call.

use std::io::{self, Read, Seek, SeekFrom};

use parking_lot::Mutex;
use symphonia::core::io::MediaSource;
use tracing::{debug, warn};
use url::Url;

use super::StreamError;
use crate::transport::InterfaceHandle;

/// A seekable byte stream over HTTP range requests.
///
/// Owns the connection handle it reads through: dropping the stream closes
/// the response first, then releases the handle.
pub struct PersistentHttpStream {
    uri: Url,
    position: u64,
    content_length: Option<u64>,
    seekable: bool,
    body: Option<Mutex<Box<dyn Read + Send>>>,
    // Declared last so it is dropped after the body
    interface: InterfaceHandle,
}

impl PersistentHttpStream {
    /// Connect to `uri` at offset 0.
    ///
    /// `content_length` seeds the expected size; pass `None` when unknown and
    /// it will be learned from the first response.
    pub fn open(
        interface: InterfaceHandle,
        uri: Url,
        content_length: Option<u64>,
    ) -> Result<Self, StreamError> {
        let mut stream = Self {
            uri,
            position: 0,
            content_length,
            seekable: true,
            body: None,
            interface,
        };
        stream.connect()?;
        Ok(stream)
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Open a response positioned at `self.position`.
    fn connect(&mut self) -> Result<(), StreamError> {
        let offset = self.position;
        let response = self.interface.open_range(&self.uri, offset)?;
        debug!(
            uri = %self.uri,
            offset,
            status = response.status,
            total = ?response.total_length,
            "Opened media response"
        );

        if self.content_length.is_none() {
            self.content_length = response.total_length;
        }
        self.seekable = response.accepts_ranges;

        let partial = response.is_partial();
        let mut body = response.body;

        // Server ignored the range: skip forward by hand
        if offset > 0 && !partial {
            let skipped = io::copy(&mut (&mut body).take(offset), &mut io::sink())?;
            if skipped < offset {
                return Err(StreamError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("resource ended at {skipped} before offset {offset}"),
                )));
            }
        }

        self.body = Some(Mutex::new(body));
        Ok(())
    }

    /// Nothing left to fetch; a range request here would be rejected.
    fn at_end(&self) -> bool {
        self.content_length
            .is_some_and(|length| self.position >= length)
    }

    fn ended_early(&self) -> bool {
        self.content_length
            .is_some_and(|length| self.position < length)
    }
}

fn to_io(err: StreamError) -> io::Error {
    match err {
        StreamError::Io(e) => e,
        other => io::Error::other(other),
    }
}

impl Read for PersistentHttpStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.at_end() {
            return Ok(0);
        }

        let mut resumed = false;
        loop {
            if self.body.is_none() {
                self.connect().map_err(to_io)?;
            }

            let read = match self.body.as_mut() {
                Some(body) => body.get_mut().read(buf),
                None => Ok(0),
            };

            match read {
                Ok(0) if self.ended_early() && !resumed => {
                    warn!(position = self.position, "Media response ended early, resuming");
                    self.body = None;
                    resumed = true;
                }
                Ok(n) => {
                    self.position += n as u64;
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if !resumed => {
                    warn!(position = self.position, error = %e, "Media read failed, resuming");
                    self.body = None;
                    resumed = true;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Seek for PersistentHttpStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => {
                let length = self.content_length.ok_or_else(|| {
                    io::Error::new(io::ErrorKind::Unsupported, "stream length is unknown")
                })?;
                length.checked_add_signed(delta)
            }
        }
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "seek before start"))?;

        if target == self.position {
            return Ok(target);
        }

        if !self.seekable {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "server does not accept range requests",
            ));
        }

        // Reconnect lazily on the next read
        self.body = None;
        self.position = target;
        Ok(target)
    }
}

impl MediaSource for PersistentHttpStream {
    fn is_seekable(&self) -> bool {
        self.seekable && self.content_length.is_some()
    }

    fn byte_len(&self) -> Option<u64> {
        self.content_length
    }
}
