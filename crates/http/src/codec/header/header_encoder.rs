//! HTTP header encoder implementation for serializing HTTP response heads
//!
//! The status line is always written as `HTTP/1.1`. The framing header comes first and is
//! derived from the [`PayloadSize`], so any `Content-Length` or `Transfer-Encoding` the
//! handler set is replaced by the value matching the body that is actually written. The
//! remaining headers follow in their original order, with names in canonical title case.

use crate::protocol::{PayloadSize, ResponseHead, SendError};

use bytes::{BufMut, BytesMut};

use http::{header, HeaderName};
use std::io;
use std::io::Write;
use tokio_util::codec::Encoder;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Encoder for HTTP response heads implementing the [`Encoder`] trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncoder;

impl Encoder<(ResponseHead, PayloadSize)> for HeaderEncoder {
    type Error = SendError;

    /// Encodes the status line and header block, including the terminating blank line.
    fn encode(&mut self, item: (ResponseHead, PayloadSize), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (head, payload_size) = item;

        dst.reserve(INIT_HEADER_SIZE);
        write!(
            FastWrite(dst),
            "HTTP/1.1 {} {}\r\n",
            head.status().as_str(),
            head.status().canonical_reason().unwrap_or("Unknown")
        )?;

        match payload_size {
            PayloadSize::Length(n) => write!(FastWrite(dst), "Content-Length: {n}\r\n")?,
            PayloadSize::Chunked => dst.put_slice(b"Transfer-Encoding: chunked\r\n"),
            PayloadSize::Empty => dst.put_slice(b"Content-Length: 0\r\n"),
        }

        for (header_name, header_value) in head.headers() {
            if header_name == header::CONTENT_LENGTH || header_name == header::TRANSFER_ENCODING {
                continue;
            }
            put_title_case(dst, header_name);
            dst.put_slice(b": ");
            dst.put_slice(header_value.as_bytes());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// Writes `content-type` as `Content-Type`: the first letter and every letter after a `-`
/// are upper-cased.
fn put_title_case(dst: &mut BytesMut, name: &HeaderName) {
    let mut upper = true;
    for &b in name.as_str().as_bytes() {
        dst.put_u8(if upper { b.to_ascii_uppercase() } else { b });
        upper = b == b'-';
    }
}

/// Writer adapter that appends formatted output to a [`BytesMut`].
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Response, StatusCode};

    fn encode(head: ResponseHead, payload_size: PayloadSize) -> String {
        let mut dst = BytesMut::new();
        HeaderEncoder.encode((head, payload_size), &mut dst).unwrap();
        String::from_utf8(dst.to_vec()).unwrap()
    }

    #[test]
    fn status_line_and_length() {
        let head = Response::builder().status(StatusCode::OK).body(()).unwrap();
        assert_eq!(encode(head, PayloadSize::Length(12)), "HTTP/1.1 200 OK\r\nContent-Length: 12\r\n\r\n");
    }

    #[test]
    fn empty_body_has_zero_length() {
        let head = Response::builder().status(StatusCode::NO_CONTENT).body(()).unwrap();
        assert_eq!(encode(head, PayloadSize::Empty), "HTTP/1.1 204 No Content\r\nContent-Length: 0\r\n\r\n");
    }

    #[test]
    fn framing_header_overwrites_caller_value() {
        let head = Response::builder()
            .status(StatusCode::CREATED)
            .header(header::CONTENT_LENGTH, 999)
            .header(header::TRANSFER_ENCODING, "gzip")
            .body(())
            .unwrap();

        assert_eq!(encode(head, PayloadSize::Length(3)), "HTTP/1.1 201 Created\r\nContent-Length: 3\r\n\r\n");
    }

    #[test]
    fn chunked_framing() {
        let head = Response::builder().status(StatusCode::OK).header(header::CONTENT_LENGTH, 10).body(()).unwrap();
        assert_eq!(encode(head, PayloadSize::Chunked), "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n");
    }

    #[test]
    fn caller_headers_follow_in_order_with_title_case() {
        let head = Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header(header::ALLOW, "GET, HEAD")
            .header("x-custom-header", "a")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(())
            .unwrap();

        assert_eq!(
            encode(head, PayloadSize::Length(1)),
            "HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 1\r\nAllow: GET, HEAD\r\nX-Custom-Header: a\r\nContent-Type: text/plain\r\n\r\n"
        );
    }
}
