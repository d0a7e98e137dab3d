//! HTTP request header handling implementation.
//!
//! This module wraps the standard `http::Request` type with the connection level queries
//! the server needs: `Host` presence and keep-alive negotiation.

use http::header::{CONNECTION, HOST};
use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri, Version};

/// Represents a parsed HTTP request head: request-line plus header block.
#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
}

impl AsRef<Request<()>> for RequestHeader {
    fn as_ref(&self) -> &Request<()> {
        &self.inner
    }
}

impl AsMut<Request<()>> for RequestHeader {
    fn as_mut(&mut self) -> &mut Request<()> {
        &mut self.inner
    }
}

impl RequestHeader {
    /// Consumes the header and returns the inner `Request<()>`.
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    /// Attaches a body to this header, converting it into a full `Request<T>`.
    pub fn body<T>(self, body: T) -> Request<T> {
        self.inner.map(|()| body)
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    /// Returns a reference to the request's URI.
    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// Returns the raw request-target: path plus optional query, not percent-decoded.
    pub fn target(&self) -> &str {
        self.uri().path_and_query().map_or("/", |path_and_query| path_and_query.as_str())
    }

    /// Returns the request's HTTP version.
    pub fn version(&self) -> Version {
        self.inner.version()
    }

    /// Returns a reference to the request's headers.
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// HTTP/1.1 requests must carry a `Host` header.
    pub fn is_host_missing(&self) -> bool {
        self.version() == Version::HTTP_11 && !self.headers().contains_key(HOST)
    }

    /// Whether the connection stays open after this request has been answered.
    ///
    /// An explicit `Connection: close` always wins. HTTP/1.1 defaults to persistent
    /// connections, HTTP/1.0 only persists with `Connection: keep-alive`.
    pub fn is_keep_alive(&self) -> bool {
        if self.has_connection_option("close") {
            return false;
        }

        match self.version() {
            Version::HTTP_10 => self.has_connection_option("keep-alive"),
            _ => true,
        }
    }

    fn has_connection_option(&self, option: &str) -> bool {
        self.headers()
            .get_all(CONNECTION)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .any(|token| token.trim().eq_ignore_ascii_case(option))
    }
}

/// Converts request parts into a RequestHeader.
impl From<Parts> for RequestHeader {
    #[inline]
    fn from(parts: Parts) -> Self {
        Self { inner: Request::from_parts(parts, ()) }
    }
}

/// Converts a bodyless request into a RequestHeader.
impl From<Request<()>> for RequestHeader {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}
