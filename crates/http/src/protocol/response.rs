//! HTTP response header handling implementation.
//!
//! The head of a response is a `http::Response<()>`; the body is attached separately and
//! streamed through the response encoder.

use http::Response;

/// Type alias for HTTP response headers.
pub type ResponseHead = Response<()>;

/// Extension marker for a response head whose body must not be written.
///
/// Set by the connection for answers to `HEAD` requests: the framing headers still describe
/// the body a `GET` would have produced, but no body bytes follow the head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyOmitted;
