//! HTTP header decoder implementation for parsing HTTP request heads
//!
//! This module turns the raw bytes of a request-line and header block into a
//! [`RequestHeader`], and decides how the body that follows is framed.
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum head size: 8KB
//! - Only HTTP/1.0 and HTTP/1.1 are accepted
//!
//! # Tolerance
//!
//! Lines may end with a bare `\n` instead of `\r\n`, and empty lines in front of the
//! request-line are skipped. Header values are trimmed of surrounding whitespace.

use bytes::{Buf, BytesMut};
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Uri, Version};
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;

use crate::protocol::{ParseError, PayloadSize, RequestHeader};

/// Maximum number of headers allowed in a request
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire header section
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Decoder for HTTP request heads implementing the [`Decoder`] trait.
///
/// On success the head bytes are consumed from the buffer and whatever follows (the body,
/// or the next request) is left in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderDecoder;

impl Decoder for HeaderDecoder {
    type Item = (RequestHeader, PayloadSize);
    type Error = ParseError;

    /// Attempts to decode a request head from the provided bytes buffer.
    ///
    /// # Returns
    ///
    /// - `Ok(Some((header, payload_size)))` if a complete head was parsed
    /// - `Ok(None)` if more data is needed
    /// - `Err(ParseError)` if the bytes can never form a valid request head
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut req = httparse::Request::new(&mut headers);

        let head: &[u8] = src.as_ref();
        let body_offset = match req.parse(head).map_err(|e| map_httparse_error(e, head))? {
            Status::Complete(body_offset) => body_offset,
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                return Ok(None);
            }
        };

        trace!(head_size = body_offset, "parsed request head");
        ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

        let version = match req.version {
            Some(0) => Version::HTTP_10,
            Some(1) => Version::HTTP_11,
            // Currently HTTP/2 and HTTP/3 not supported
            v => return Err(ParseError::InvalidVersion(v)),
        };

        let method = req.method.ok_or(ParseError::InvalidMethod)?;
        let method = Method::from_bytes(method.as_bytes()).map_err(|_e| ParseError::InvalidMethod)?;

        let path = req.path.ok_or(ParseError::InvalidUri)?;
        let uri = Uri::try_from(path).map_err(|_e| ParseError::InvalidUri)?;

        let mut request = Request::new(());
        *request.method_mut() = method;
        *request.uri_mut() = uri;
        *request.version_mut() = version;

        let header_map = request.headers_mut();
        header_map.reserve(req.headers.len());
        for header in req.headers.iter() {
            let name = HeaderName::from_bytes(header.name.as_bytes())
                .map_err(|e| ParseError::invalid_header(format!("{}: {e}", header.name)))?;
            let value = HeaderValue::from_bytes(header.value.trim_ascii())
                .map_err(|e| ParseError::invalid_header(format!("{}: {e}", header.name)))?;
            // append keeps every value of a repeated header in arrival order
            header_map.append(name, value);
        }

        src.advance(body_offset);

        let header = RequestHeader::from(request);
        let payload_size = parse_payload(header.headers())?;

        Ok(Some((header, payload_size)))
    }
}

fn map_httparse_error(e: Error, src: &[u8]) -> ParseError {
    match e {
        Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
        Error::Version => ParseError::invalid_request_line("expect HTTP/1.0 or HTTP/1.1 after the request target"),
        Error::Token | Error::Status => ParseError::invalid_request_line(e),
        // httparse reports both a request-line with extra tokens and a broken header line ending as NewLine
        Error::NewLine if !has_three_tokens(first_line(src)) => ParseError::invalid_request_line(e),
        Error::HeaderName | Error::HeaderValue | Error::NewLine => ParseError::invalid_header(e),
    }
}

/// The request-line, skipping the empty lines httparse tolerates in front of it.
fn first_line(src: &[u8]) -> &[u8] {
    let start = src.iter().position(|&b| b != b'\r' && b != b'\n').unwrap_or(src.len());
    let line = src[start..].split(|&b| b == b'\n').next().unwrap_or_default();
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn has_three_tokens(line: &[u8]) -> bool {
    line.split(|&b| b == b' ').count() == 3
}

/// Determines how the request body is framed, refer to RFC 9112 section 6.
///
/// - `Transfer-Encoding` ending with `chunked`: chunked body
/// - `Content-Length: N`: exactly N bytes, for any method
/// - neither: no body
///
/// # Errors
///
/// Returns `ParseError` if:
/// - Both Content-Length and Transfer-Encoding headers are present
/// - Transfer-Encoding does not end with chunked
/// - Content-Length is not a decimal number, or repeated with different values
fn parse_payload(headers: &HeaderMap) -> Result<PayloadSize, ParseError> {
    let content_length = parse_content_length(headers)?;

    if !headers.contains_key(TRANSFER_ENCODING) {
        return Ok(content_length.map_or(PayloadSize::new_empty(), PayloadSize::new_length));
    }

    ensure!(
        content_length.is_none(),
        ParseError::invalid_content_length("transfer_encoding and content_length both present in headers")
    );

    if is_chunked(headers.get_all(TRANSFER_ENCODING).iter().next_back()) {
        Ok(PayloadSize::new_chunked())
    } else {
        Err(ParseError::invalid_body("transfer-encoding of a request must end with chunked"))
    }
}

fn parse_content_length(headers: &HeaderMap) -> Result<Option<u64>, ParseError> {
    let mut content_length = None;

    for cl_value in &headers.get_all(CONTENT_LENGTH) {
        let cl_str = cl_value.to_str().map_err(|e| ParseError::invalid_content_length(format!("value can't to_str: {e}")))?;
        let cl_str = cl_str.trim();

        // u64::from_str also accepts a leading '+', the header only allows digits
        ensure!(
            !cl_str.is_empty() && cl_str.bytes().all(|b| b.is_ascii_digit()),
            ParseError::invalid_content_length(format!("value {cl_str} is not a decimal length"))
        );

        let length =
            cl_str.parse::<u64>().map_err(|e| ParseError::invalid_content_length(format!("value {cl_str} is not u64: {e}")))?;

        match content_length {
            Some(previous) if previous != length => {
                return Err(ParseError::invalid_content_length(format!("conflicting values {previous} and {length}")));
            }
            _ => content_length = Some(length),
        }
    }

    Ok(content_length)
}

/// Checks if the Transfer-Encoding header indicates chunked encoding.
///
/// According to RFC 7230, chunked must be the last encoding if present.
fn is_chunked(header_value: Option<&HeaderValue>) -> bool {
    const CHUNKED: &[u8] = b"chunked";
    if let Some(value) = header_value {
        if let Some(bytes) = value.as_bytes().rsplit(|b| *b == b',').next() {
            return bytes.trim_ascii().eq_ignore_ascii_case(CHUNKED);
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn decode_str(str: &str) -> Result<Option<(RequestHeader, PayloadSize)>, ParseError> {
        let mut bytes = BytesMut::from(str);
        HeaderDecoder.decode(&mut bytes)
    }

    #[test]
    fn check_is_chunked() {
        {
            let headers = HeaderMap::new();
            assert!(!is_chunked(headers.get(http::header::TRANSFER_ENCODING)));
        }

        {
            let mut headers = HeaderMap::new();
            headers.insert("Transfer-Encoding", "gzip, chunked".parse().unwrap());
            assert!(is_chunked(headers.get(http::header::TRANSFER_ENCODING)));
        }

        {
            let mut headers = HeaderMap::new();
            headers.insert("Transfer-Encoding", "chunked, gzip".parse().unwrap());
            assert!(!is_chunked(headers.get(http::header::TRANSFER_ENCODING)));
        }

        {
            let mut headers = HeaderMap::new();
            headers.insert("Transfer-Encoding", "gzip".parse().unwrap());
            assert!(!is_chunked(headers.get(http::header::TRANSFER_ENCODING)));
        }
    }

    #[test]
    fn test_bytes_mut_lens() {
        let str = indoc! {r##"
        POST /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Content-Length: 3
        Accept: */*

        123"##};

        let mut bytes = BytesMut::from(str);

        let (_header, payload_size) = HeaderDecoder.decode(&mut bytes).unwrap().unwrap();

        assert_eq!(payload_size, PayloadSize::Length(3));
        assert_eq!(&bytes[..], &b"123"[..]);
    }

    #[test]
    fn from_curl() {
        let str = indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        "##};

        let (header, payload_size) = decode_str(str).unwrap().unwrap();

        assert!(payload_size.is_empty());

        assert_eq!(header.method(), &Method::GET);
        assert_eq!(header.version(), Version::HTTP_11);
        assert_eq!(header.uri().path(), "/index.html");
        assert_eq!(header.uri().query(), None);

        assert_eq!(header.headers().len(), 3);
        assert_eq!(header.headers().get(http::header::ACCEPT), Some(&HeaderValue::from_static("*/*")));
        assert_eq!(header.headers().get(http::header::HOST), Some(&HeaderValue::from_static("127.0.0.1:8080")));
        assert_eq!(header.headers().get(http::header::USER_AGENT), Some(&HeaderValue::from_static("curl/7.79.1")));
    }

    #[test]
    fn keeps_raw_target_and_query() {
        let (header, _) = decode_str("GET /search%20me?q=test&limit=10 HTTP/1.1\r\nHost: x\r\n\r\n").unwrap().unwrap();

        assert_eq!(header.uri().path(), "/search%20me");
        assert_eq!(header.uri().query(), Some("q=test&limit=10"));
        assert_eq!(header.target(), "/search%20me?q=test&limit=10");
    }

    #[test]
    fn accepts_crlf_and_bare_lf() {
        let (crlf, _) = decode_str("GET / HTTP/1.1\r\nHost: x\r\n\r\n").unwrap().unwrap();
        let (lf, _) = decode_str("GET / HTTP/1.1\nHost: x\n\n").unwrap().unwrap();

        assert_eq!(crlf.headers().get(http::header::HOST), lf.headers().get(http::header::HOST));
    }

    #[test]
    fn duplicate_headers_keep_all_values_in_order() {
        let str = "GET / HTTP/1.1\r\nHost: x\r\nAccept: text/html\r\naccept: application/json\r\n\r\n";
        let (header, _) = decode_str(str).unwrap().unwrap();

        let values: Vec<_> = header.headers().get_all(http::header::ACCEPT).iter().collect();
        assert_eq!(values, vec!["text/html", "application/json"]);
    }

    #[test]
    fn header_value_is_trimmed() {
        let (header, _) = decode_str("GET / HTTP/1.1\r\nHost:    x  \r\nX-Empty:\r\n\r\n").unwrap().unwrap();

        assert_eq!(header.headers().get(http::header::HOST), Some(&HeaderValue::from_static("x")));
        assert_eq!(header.headers().get("x-empty"), Some(&HeaderValue::from_static("")));
    }

    #[test]
    fn missing_host_is_not_a_parse_error() {
        let (header, _) = decode_str("GET / HTTP/1.1\r\n\r\n").unwrap().unwrap();
        assert!(header.is_host_missing());
    }

    #[test]
    fn http_10_is_accepted() {
        let (header, _) = decode_str("GET / HTTP/1.0\r\n\r\n").unwrap().unwrap();
        assert_eq!(header.version(), Version::HTTP_10);
        assert!(!header.is_host_missing());
    }

    #[test]
    fn extension_methods_are_preserved() {
        let (header, _) = decode_str("PATCH /test HTTP/1.1\r\nHost: x\r\n\r\n").unwrap().unwrap();
        assert_eq!(header.method().as_str(), "PATCH");
    }

    #[test]
    fn partial_head_needs_more_bytes() {
        let mut bytes = BytesMut::from("GET / HTTP/1.1\r\nHost: x\r\n");
        assert!(HeaderDecoder.decode(&mut bytes).unwrap().is_none());
        assert_eq!(bytes.len(), 25);

        bytes.extend_from_slice(b"\r\n");
        assert!(HeaderDecoder.decode(&mut bytes).unwrap().is_some());
        assert!(bytes.is_empty());
    }

    #[test]
    fn malformed_request_line() {
        assert!(matches!(decode_str("INVALID REQUEST LINE\r\n\r\n"), Err(ParseError::InvalidRequestLine { .. })));
        assert!(matches!(decode_str("GET /\r\n\r\n"), Err(ParseError::InvalidRequestLine { .. })));
        assert!(matches!(decode_str("GET / HTTP/2.0\r\n\r\n"), Err(ParseError::InvalidRequestLine { .. })));
    }

    #[test]
    fn extra_token_in_request_line() {
        assert!(matches!(decode_str("GET / HTTP/1.1 extra\r\n\r\n"), Err(ParseError::InvalidRequestLine { .. })));
        assert!(matches!(decode_str("\r\nGET / HTTP/1.1 extra\r\nHost: x\r\n\r\n"), Err(ParseError::InvalidRequestLine { .. })));
        assert!(matches!(
            decode_str("GET / HTTP/1.1\r\nHost: x\rbad\r\n\r\n"),
            Err(ParseError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn invalid_utf8_in_request_line() {
        let mut bytes = BytesMut::from(&b"G\xffT / HTTP/1.1\r\nHost: x\r\n\r\n"[..]);
        assert!(HeaderDecoder.decode(&mut bytes).is_err());

        let mut bytes = BytesMut::from(&b"GET /\xc3\x28 HTTP/1.1\r\nHost: x\r\n\r\n"[..]);
        assert!(HeaderDecoder.decode(&mut bytes).is_err());
    }

    #[test]
    fn header_without_colon() {
        assert!(matches!(
            decode_str("GET / HTTP/1.1\r\nHost: x\r\nNoColonHere\r\n\r\n"),
            Err(ParseError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn too_many_headers() {
        let mut str = String::from("GET / HTTP/1.1\r\n");
        for i in 0..=MAX_HEADER_NUM {
            str.push_str(&format!("X-Header-{i}: {i}\r\n"));
        }
        str.push_str("\r\n");

        assert!(matches!(decode_str(&str), Err(ParseError::TooManyHeaders { .. })));
    }

    #[test]
    fn too_large_header() {
        let str = format!("GET / HTTP/1.1\r\nX-Large: {}\r\n", "a".repeat(MAX_HEADER_BYTES));
        assert!(matches!(decode_str(&str), Err(ParseError::TooLargeHeader { .. })));
    }

    #[test]
    fn content_length_framing() {
        let (_, size) = decode_str("GET / HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\n\r\n").unwrap().unwrap();
        assert_eq!(size, PayloadSize::Length(5));

        let (_, size) = decode_str("POST / HTTP/1.1\r\nHost: x\r\nContent-Length: 0\r\n\r\n").unwrap().unwrap();
        assert_eq!(size, PayloadSize::Empty);

        let (_, size) = decode_str("POST / HTTP/1.1\r\nHost: x\r\nContent-Length: 7\r\nContent-Length: 7\r\n\r\n").unwrap().unwrap();
        assert_eq!(size, PayloadSize::Length(7));
    }

    #[test]
    fn invalid_content_length() {
        for value in ["-1", "+5", "abc", "", "5, 6", "99999999999999999999999"] {
            let str = format!("POST / HTTP/1.1\r\nHost: x\r\nContent-Length: {value}\r\n\r\n");
            assert!(matches!(decode_str(&str), Err(ParseError::InvalidContentLength { .. })), "value {value:?}");
        }

        let str = "POST / HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\nContent-Length: 6\r\n\r\n";
        assert!(matches!(decode_str(str), Err(ParseError::InvalidContentLength { .. })));
    }

    #[test]
    fn transfer_encoding_framing() {
        let (_, size) = decode_str("POST / HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: chunked\r\n\r\n").unwrap().unwrap();
        assert!(size.is_chunked());

        let str = "POST / HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: gzip\r\n\r\n";
        assert!(matches!(decode_str(str), Err(ParseError::InvalidBody { .. })));

        let str = "POST / HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: chunked\r\nContent-Length: 3\r\n\r\n";
        assert!(matches!(decode_str(str), Err(ParseError::InvalidContentLength { .. })));
    }
}
