//! Decoder for the chunked transfer coding, see
//! [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1).
//!
//! ```text
//! chunked-body = *chunk last-chunk trailer-section CRLF
//! chunk        = chunk-size [ chunk-ext ] CRLF chunk-data CRLF
//! last-chunk   = 1*("0") [ chunk-ext ] CRLF
//! ```
//!
//! Chunk extensions are ignored and trailer fields are skipped.

use crate::ensure;
use crate::protocol::{ParseError, PayloadItem};
use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

/// Longest size or trailer line accepted before the body is rejected.
const MAX_LINE_BYTES: usize = 4 * 1024;

/// Hex digits of a u64.
const MAX_SIZE_DIGITS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Expecting a chunk-size line
    Size,
    /// Inside chunk-data, with the number of bytes still to read
    Data(u64),
    /// Expecting the CRLF that closes chunk-data
    DataEnd,
    /// Skipping trailer fields until the empty line
    Trailer,
    /// The last chunk and trailer section have been read
    End,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: ChunkedState::Size }
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                ChunkedState::Size => {
                    let Some(line) = take_line(src)? else {
                        return Ok(None);
                    };
                    let size = parse_chunk_size(&line)?;
                    trace!(size, "read chunk size");
                    self.state = if size == 0 { ChunkedState::Trailer } else { ChunkedState::Data(size) };
                }

                ChunkedState::Data(remaining) => {
                    if src.is_empty() {
                        return Ok(None);
                    }

                    let len = usize::try_from(remaining).map_or(src.len(), |remaining| remaining.min(src.len()));
                    let bytes = src.split_to(len).freeze();
                    let remaining = remaining - bytes.len() as u64;

                    self.state = if remaining == 0 { ChunkedState::DataEnd } else { ChunkedState::Data(remaining) };
                    return Ok(Some(PayloadItem::Chunk(bytes)));
                }

                ChunkedState::DataEnd => {
                    let Some(line) = take_line(src)? else {
                        return Ok(None);
                    };
                    ensure!(line.is_empty(), ParseError::invalid_body("chunk data is longer than its size"));
                    self.state = ChunkedState::Size;
                }

                ChunkedState::Trailer => {
                    let Some(line) = take_line(src)? else {
                        return Ok(None);
                    };
                    if line.is_empty() {
                        trace!("finished reading chunked data");
                        self.state = ChunkedState::End;
                    }
                }

                ChunkedState::End => return Ok(Some(PayloadItem::Eof)),
            }
        }
    }
}

/// Splits one line off the front of `src`, without its line ending.
///
/// Returns `Ok(None)` when no complete line is buffered yet.
fn take_line(src: &mut BytesMut) -> Result<Option<BytesMut>, ParseError> {
    let Some(position) = src.iter().position(|b| *b == b'\n') else {
        ensure!(src.len() <= MAX_LINE_BYTES, ParseError::invalid_body("chunk line too long"));
        return Ok(None);
    };

    ensure!(position <= MAX_LINE_BYTES, ParseError::invalid_body("chunk line too long"));

    let mut line = src.split_to(position + 1);
    line.truncate(position);
    if line.last() == Some(&b'\r') {
        line.truncate(position - 1);
    }
    Ok(Some(line))
}

fn parse_chunk_size(line: &[u8]) -> Result<u64, ParseError> {
    let size = match line.iter().position(|b| *b == b';') {
        Some(extension_start) => &line[..extension_start],
        None => line,
    };
    let size = size.trim_ascii();

    ensure!(
        !size.is_empty() && size.len() <= MAX_SIZE_DIGITS && size.iter().all(u8::is_ascii_hexdigit),
        ParseError::invalid_body("invalid chunk size")
    );

    Ok(size.iter().fold(0u64, |acc, b| {
        // fits: at most 16 hex digits
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            _ => b - b'A' + 10,
        };
        (acc << 4) | u64::from(digit)
    }))
}
