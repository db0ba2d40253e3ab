// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Byte stream transport: framing packets out of any [`Read`] and pushing
//! finished frames into any [`Write`].

use std::io::{self, Read, Write};

use bytes::{Buf, BytesMut};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ProtocolError;
use crate::packet::{decode_packet_prefix, OwnedPacket, HEADER_SIZE, PACKET_MARKER};

const READ_CHUNK: usize = 16 * 1024;

/// Errors raised by stream transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying I/O failure, including short writes.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// Packet-level failure surfaced to the caller.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// Stream ended part way through a packet.
    #[error("stream ended inside a packet ({pending} bytes pending)")]
    UnexpectedEof {
        /// Bytes buffered when the stream ended.
        pending: usize,
    },
}

/// Destination for finished frames.
pub trait PacketSink {
    /// Send one complete frame. A short write is an error.
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError>;
}

impl<W: Write> PacketSink for W {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.write_all(frame)?;
        Ok(())
    }
}

/// Counters kept by [`PacketStreamReader`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Packets delivered.
    pub packets: u64,
    /// Packets dropped for CRC mismatch.
    pub crc_failures: u64,
    /// Packets dropped for other framing errors.
    pub malformed: u64,
    /// Bytes skipped while searching for a marker.
    pub skipped_bytes: u64,
}

/// Frames packets out of a byte source.
///
/// Garbage before a marker is skipped and packets failing validation are
/// dropped; the reader then resumes at the next marker.
#[derive(Debug)]
pub struct PacketStreamReader<R> {
    inner: R,
    buf: BytesMut,
    stats: StreamStats,
}

impl<R: Read> PacketStreamReader<R> {
    /// Wrap a byte source.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_CHUNK),
            stats: StreamStats::default(),
        }
    }

    /// Counters so far.
    pub const fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Unwrap the byte source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Next valid packet, or `None` at a clean end of stream.
    pub fn next_packet(&mut self) -> Result<Option<OwnedPacket>, TransportError> {
        loop {
            self.skip_to_marker();
            if self.buf.len() >= HEADER_SIZE {
                match decode_packet_prefix(&self.buf) {
                    Ok((packet, used)) => {
                        let owned = packet.to_owned_packet();
                        self.buf.advance(used);
                        self.stats.packets += 1;
                        return Ok(Some(owned));
                    }
                    Err(ProtocolError::Truncated { .. }) => {}
                    Err(err) => {
                        if matches!(err, ProtocolError::CrcFailure { .. }) {
                            self.stats.crc_failures += 1;
                        } else {
                            self.stats.malformed += 1;
                        }
                        warn!(error = %err, "dropping packet");
                        // Step past this marker so the search resumes after it.
                        self.buf.advance(1);
                        self.stats.skipped_bytes += 1;
                        continue;
                    }
                }
            }
            if self.fill()? == 0 {
                if self.marker_after_start() {
                    // A header that promises more bytes than the stream holds
                    // cannot be valid when another packet follows it.
                    warn!("dropping packet with overlong declared size");
                    self.stats.malformed += 1;
                    self.stats.skipped_bytes += 1;
                    self.buf.advance(1);
                    continue;
                }
                return self.finish_stream();
            }
        }
    }

    fn finish_stream(&mut self) -> Result<Option<OwnedPacket>, TransportError> {
        if self.buf.is_empty() {
            return Ok(None);
        }
        if self.buf.starts_with(&PACKET_MARKER.to_le_bytes()) {
            let pending = self.buf.len();
            self.buf.clear();
            return Err(TransportError::UnexpectedEof { pending });
        }
        // Fewer than four bytes of something that is not a marker.
        debug!(bytes = self.buf.len(), "discarding stream tail");
        self.stats.skipped_bytes += self.buf.len() as u64;
        self.buf.clear();
        Ok(None)
    }

    fn marker_after_start(&self) -> bool {
        let marker = PACKET_MARKER.to_le_bytes();
        self.buf.len() > marker.len()
            && self.buf[1..].windows(marker.len()).any(|w| w == marker)
    }

    fn skip_to_marker(&mut self) {
        let marker = PACKET_MARKER.to_le_bytes();
        let found = self.buf.windows(marker.len()).position(|w| w == marker);
        let skip = match found {
            Some(0) => return,
            Some(at) => at,
            // Keep a possible partial marker at the tail.
            None => self.buf.len().saturating_sub(marker.len() - 1),
        };
        if skip > 0 {
            debug!(skip, "skipping bytes before packet marker");
            self.buf.advance(skip);
            self.stats.skipped_bytes += skip as u64;
        }
    }

    fn fill(&mut self) -> Result<usize, TransportError> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(n);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl<R: Read> Iterator for PacketStreamReader<R> {
    type Item = Result<OwnedPacket, TransportError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_packet().transpose()
    }
}
