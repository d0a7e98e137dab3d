//! A minimal asynchronous HTTP/1.1 server core
//!
//! This crate turns raw byte streams into HTTP requests, dispatches them by method and
//! writes well formed HTTP/1.1 responses back, one request at a time per connection.
//!
//! # Features
//!
//! - HTTP/1.0 and HTTP/1.1 request parsing with `Content-Length` and chunked bodies
//! - Method dispatch to one handler per `GET`, `POST`, `PUT`, `DELETE` and `HEAD`
//! - Byte exact responses with `Content-Length` always set from the real body
//! - Keep-alive connections with read and write timeouts
//! - Graceful shutdown of the listener and its connections
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::{Request, Response};
//! use simple_http::dispatch::Dispatcher;
//! use simple_http::handler::{make_handler, BoxError};
//! use simple_http::server::Server;
//! use tracing::{error, Level};
//! use tracing_subscriber::FmtSubscriber;
//!
//! #[tokio::main]
//! async fn main() {
//!     let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
//!     tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
//!
//!     let dispatcher = Dispatcher::builder().get(make_handler(hello_world)).build();
//!     let server = match Server::builder().address("127.0.0.1:8080").dispatcher(dispatcher).build() {
//!         Ok(server) => server,
//!         Err(e) => {
//!             error!(cause = %e, "build server error");
//!             return;
//!         }
//!     };
//!
//!     let shutdown = async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     };
//!     if let Err(e) = server.run(shutdown).await {
//!         error!(cause = %e, "server error");
//!     }
//! }
//!
//! async fn hello_world(request: Request<Bytes>) -> Result<Response<String>, BoxError> {
//!     Ok(Response::new(format!("Hello World! you asked for {}\r\n", request.uri().path())))
//! }
//! ```
//!
//! # Architecture
//!
//! - [`codec`]: request decoding and response encoding on top of `tokio_util::codec`
//! - [`protocol`]: message types and errors shared by the other modules
//! - [`dispatch`]: the method dispatch table
//! - [`handler`]: the handler trait and function handlers
//! - [`connection`]: the per connection request loop
//! - [`server`]: the TCP listener
//!
//! # Error Handling
//!
//! - [`protocol::HttpError`]: Top-level error type
//! - [`protocol::ParseError`]: Request parsing errors
//! - [`protocol::SendError`]: Response sending errors
//! - [`server::ServerError`]: Listener setup errors
//!
//! # Limitations
//!
//! - HTTP/1.x only, one in-flight request per connection
//! - No TLS support (use a reverse proxy for HTTPS)
//! - Maximum header size: 8KB
//! - Maximum number of headers: 64

pub mod codec;
pub mod connection;
pub mod dispatch;
pub mod handler;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;
