//! HTTP connection handling module
//!
//! [`HttpConnection`] owns one byte stream and runs the request loop on it: read a complete
//! request with a bounded timeout, hand it to the [`Handler`](crate::handler::Handler),
//! write the response with a bounded timeout, then keep the connection or close it.
//!
//! Every error the loop can hit ends up as one of three outcomes:
//!
//! - a request that can't be parsed is answered with `400` and the connection closes
//! - a failing handler is answered with `500` and the connection stays open
//! - a transport failure or timeout closes the connection without a response

mod config;
mod http_connection;

pub use config::ConnectionConfig;
pub use http_connection::HttpConnection;
