//! HTTP request decoder module
//!
//! Combines the head parser and the body framing into one [`Decoder`] that only ever
//! yields complete requests: the head has been parsed and every body byte announced by the
//! framing headers has arrived.
//!
//! # Example
//!
//! ```
//! use simple_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from("POST / HTTP/1.1\r\nHost: x\r\nContent-Length: 4\r\n\r\nte");
//! assert!(decoder.decode(&mut buffer).unwrap().is_none());
//!
//! buffer.extend_from_slice(b"st");
//! let request = decoder.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(request.body().as_ref(), b"test");
//! ```

use crate::codec::body::PayloadDecoder;
use crate::codec::header::HeaderDecoder;
use crate::ensure;
use crate::protocol::{ParseError, PayloadItem, PayloadSize, RequestHeader};
use bytes::{Bytes, BytesMut};
use http::Request;
use tokio_util::codec::Decoder;
use tracing::debug;

/// Upper bound for the body buffer reserved up front from a `Content-Length`.
const MAX_BODY_RESERVE: usize = 64 * 1024;

/// Largest request body accepted unless configured otherwise.
pub const DEFAULT_MAX_BODY_SIZE: u64 = 8 * 1024 * 1024;

/// A decoder for complete HTTP requests.
///
/// # State Machine
///
/// - `pending` is `None`: waiting for a complete request head
/// - `pending` is `Some`: head parsed, collecting the body until the framing reports EOF
///
/// Bodies are buffered whole, so their size is capped: a `Content-Length` above the limit
/// is rejected before any body byte is read, a chunked body once its running total passes it.
#[derive(Debug)]
pub struct RequestDecoder {
    header_decoder: HeaderDecoder,
    pending: Option<PendingRequest>,
    max_body_size: u64,
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::with_max_body_size(DEFAULT_MAX_BODY_SIZE)
    }
}

#[derive(Debug)]
struct PendingRequest {
    header: RequestHeader,
    payload_decoder: PayloadDecoder,
    body: BytesMut,
}

impl PendingRequest {
    fn new(header: RequestHeader, payload_size: PayloadSize) -> Self {
        let capacity = match payload_size {
            PayloadSize::Length(length) => usize::try_from(length).map_or(MAX_BODY_RESERVE, |l| l.min(MAX_BODY_RESERVE)),
            PayloadSize::Chunked | PayloadSize::Empty => 0,
        };
        Self { header, payload_decoder: payload_size.into(), body: BytesMut::with_capacity(capacity) }
    }

    fn into_request(self) -> Request<Bytes> {
        self.header.body(self.body.freeze())
    }
}

impl RequestDecoder {
    /// Creates a new `RequestDecoder` instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_body_size(max_body_size: u64) -> Self {
        Self { header_decoder: HeaderDecoder, pending: None, max_body_size }
    }

    /// Returns true while a request head has been parsed but its body is still incomplete.
    fn is_reading_body(&self) -> bool {
        self.pending.is_some()
    }
}

impl Decoder for RequestDecoder {
    type Item = Request<Bytes>;
    type Error = ParseError;

    /// Attempts to decode one complete HTTP request from the provided buffer
    ///
    /// # Returns
    ///
    /// - `Ok(Some(request))`: head and body are complete, the bytes are consumed
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: the bytes can't form a valid request
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.pending.is_none() {
            let Some((header, payload_size)) = self.header_decoder.decode(src)? else {
                return Ok(None);
            };
            if let PayloadSize::Length(length) = payload_size {
                ensure!(length <= self.max_body_size, ParseError::too_large_body(length, self.max_body_size));
            }
            self.pending = Some(PendingRequest::new(header, payload_size));
        }

        let max_body_size = self.max_body_size;
        let Some(pending) = self.pending.as_mut() else {
            return Ok(None);
        };

        loop {
            match pending.payload_decoder.decode(src)? {
                Some(PayloadItem::Chunk(bytes)) => {
                    let body_size = (pending.body.len() + bytes.len()) as u64;
                    ensure!(body_size <= max_body_size, ParseError::too_large_body(body_size, max_body_size));
                    pending.body.extend_from_slice(&bytes);
                }
                Some(PayloadItem::Eof) => {
                    return Ok(self.pending.take().map(PendingRequest::into_request));
                }
                None => return Ok(None),
            }
        }
    }

    /// The peer closed its side of the stream.
    ///
    /// A partially received request is a disconnect, not a protocol error: the leftover
    /// bytes are dropped and the stream ends.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(request) = self.decode(src)? {
            return Ok(Some(request));
        }

        if !src.is_empty() || self.is_reading_body() {
            debug!(remaining = src.len(), reading_body = self.is_reading_body(), "peer closed stream in the middle of a request");
            src.clear();
            self.pending = None;
        }
        Ok(None)
    }
}
