//! Chat line codec
//!
//! Frames the inbound byte stream on `\n` (a trailing `\r` is dropped).
//! The length limit applies to the line without its terminator, so CRLF and
//! LF clients get the same limit. Oversized and non-UTF-8 lines are consumed
//! and reported as their own items so the connection survives them.

use std::io;

use bytes::BytesMut;
use log::warn;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};

/// One framed unit of client input.
#[derive(Debug, PartialEq, Eq)]
pub enum InboundLine {
    Line(String),
    /// A line longer than the configured limit; its bytes were discarded.
    TooLong,
    /// A complete line that was not valid UTF-8.
    Malformed,
}

#[derive(Debug)]
pub struct ChatCodec {
    inner: LinesCodec,
    max_length: usize,
}

impl ChatCodec {
    pub fn new(max_length: usize) -> Self {
        // One spare byte for a `\r` that is stripped before the length check below.
        Self {
            inner: LinesCodec::new_with_max_length(max_length.saturating_add(1)),
            max_length,
        }
    }

    fn map(
        &self,
        result: Result<Option<String>, LinesCodecError>,
    ) -> Result<Option<InboundLine>, io::Error> {
        match result {
            Ok(Some(line)) if line.len() > self.max_length => {
                warn!("Discarding line longer than {} bytes", self.max_length);
                Ok(Some(InboundLine::TooLong))
            }
            Ok(line) => Ok(line.map(InboundLine::Line)),
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                warn!("Discarding line longer than {} bytes", self.max_length);
                Ok(Some(InboundLine::TooLong))
            }
            Err(LinesCodecError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                Ok(Some(InboundLine::Malformed))
            }
            Err(LinesCodecError::Io(e)) => Err(e),
        }
    }
}

impl Decoder for ChatCodec {
    type Item = InboundLine;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let result = self.inner.decode(src);
        self.map(result)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let result = self.inner.decode_eof(src);
        self.map(result)
    }
}
