//! Request handler abstraction
//!
//! A [`Handler`] turns one complete request into one response. The connection session is
//! generic over it, so both the method [`Dispatcher`](crate::dispatch::Dispatcher) and a
//! plain async function wrapped with [`make_handler`] can serve a connection.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use http::{Request, Response};
//! use simple_http::handler::{make_handler, BoxError};
//!
//! async fn echo(request: Request<Bytes>) -> Result<Response<String>, BoxError> {
//!     Ok(Response::new(format!("{} bytes", request.body().len())))
//! }
//!
//! let handler = make_handler(echo);
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use http_body::Body;
use std::error::Error;

/// Error type handlers are converted into before they are reported.
pub type BoxError = Box<dyn Error + Send + Sync>;

#[async_trait]
pub trait Handler: Send + Sync {
    type RespBody: Body + Send;
    type Error: Into<BoxError> + Send;

    async fn call(&self, req: Request<Bytes>) -> Result<Response<Self::RespBody>, Self::Error>;
}

/// A [`Handler`] backed by an async function.
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<RespBody, Err, F, Fut> Handler for HandlerFn<F>
where
    RespBody: Body + Send,
    F: Fn(Request<Bytes>) -> Fut + Send + Sync,
    Err: Into<BoxError> + Send,
    Fut: Future<Output = Result<Response<RespBody>, Err>> + Send,
{
    type RespBody = RespBody;
    type Error = Err;

    async fn call(&self, req: Request<Bytes>) -> Result<Response<Self::RespBody>, Self::Error> {
        (self.f)(req).await
    }
}

pub fn make_handler<F, RespBody, Err, Ret>(f: F) -> HandlerFn<F>
where
    RespBody: Body,
    Err: Into<BoxError>,
    Ret: Future<Output = Result<Response<RespBody>, Err>>,
    F: Fn(Request<Bytes>) -> Ret,
{
    HandlerFn { f }
}
