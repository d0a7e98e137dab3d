use super::builtin;
use super::method::{Method, ALLOWED_METHODS};
use crate::handler::{BoxError, Handler};
use crate::protocol::RequestHeader;
use async_trait::async_trait;
use bytes::Bytes;
use futures::FutureExt;
use http::header::{ALLOW, CONTENT_TYPE};
use http::{HeaderValue, Request, Response, StatusCode};
use http_body::Body;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use std::convert::Infallible;
use std::fmt::{Debug, Formatter};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, warn};

/// Body type of every response produced by the [`Dispatcher`].
pub type ResponseBody = UnsyncBoxBody<Bytes, BoxError>;

/// Object safe form of [`Handler`] with the response body boxed.
#[async_trait]
pub(crate) trait DynHandler: Send + Sync {
    async fn invoke(&self, req: Request<Bytes>) -> Result<Response<ResponseBody>, BoxError>;
}

#[async_trait]
impl<H> DynHandler for H
where
    H: Handler,
    H::RespBody: Body<Data = Bytes> + Send + 'static,
    <H::RespBody as Body>::Error: Into<BoxError>,
{
    async fn invoke(&self, req: Request<Bytes>) -> Result<Response<ResponseBody>, BoxError> {
        let response = self.call(req).await.map_err(Into::into)?;
        Ok(response.map(|body| body.map_err(Into::into).boxed_unsync()))
    }
}

/// Routes a request to the handler registered for its method.
///
/// The table holds exactly one handler per [`Method`] and can't change once built. A
/// `Dispatcher` always answers: unknown methods get `405`, an HTTP/1.1 request without
/// `Host` gets `400` and a failing handler gets `500`.
pub struct Dispatcher {
    handlers: [Arc<dyn DynHandler>; 5],
}

impl Debug for Dispatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").field("methods", &ALLOWED_METHODS).finish_non_exhaustive()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub async fn dispatch(&self, request: Request<Bytes>) -> Response<ResponseBody> {
        let (parts, body) = request.into_parts();
        let header = RequestHeader::from(parts);

        if header.is_host_missing() {
            warn!(method = %header.method(), target = header.target(), "HTTP/1.1 request without host header");
            return text_response(StatusCode::BAD_REQUEST, "missing host header\n");
        }

        let method = match Method::try_from(header.method()) {
            Ok(method) => method,
            Err(e) => {
                warn!(cause = %e, target = header.target(), "no handler for request method");
                return method_not_allowed();
            }
        };

        let handler = &self.handlers[method.index()];
        match AssertUnwindSafe(handler.invoke(header.body(body))).catch_unwind().await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!(method = method.as_str(), cause = %e, "handler failed");
                internal_server_error()
            }
            Err(_panic) => {
                error!(method = method.as_str(), "handler panicked");
                internal_server_error()
            }
        }
    }
}

#[async_trait]
impl Handler for Dispatcher {
    type RespBody = ResponseBody;
    type Error = Infallible;

    async fn call(&self, req: Request<Bytes>) -> Result<Response<Self::RespBody>, Self::Error> {
        Ok(self.dispatch(req).await)
    }
}

/// Builds a [`Dispatcher`], methods without a handler get the built-in one.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use http::{Request, Response};
/// use simple_http::dispatch::Dispatcher;
/// use simple_http::handler::{make_handler, BoxError};
///
/// async fn hello(_request: Request<Bytes>) -> Result<Response<String>, BoxError> {
///     Ok(Response::new("hello\n".to_owned()))
/// }
///
/// let dispatcher = Dispatcher::builder().get(make_handler(hello)).build();
/// ```
pub struct DispatcherBuilder {
    handlers: [Option<Arc<dyn DynHandler>>; 5],
}

impl Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let configured = Method::ALL.into_iter().filter(|method| self.handlers[method.index()].is_some()).collect::<Vec<_>>();
        f.debug_struct("DispatcherBuilder").field("configured", &configured).finish()
    }
}

impl DispatcherBuilder {
    fn new() -> Self {
        Self { handlers: Default::default() }
    }

    pub fn handler<H>(mut self, method: Method, handler: H) -> Self
    where
        H: Handler + 'static,
        H::RespBody: Body<Data = Bytes> + Send + 'static,
        <H::RespBody as Body>::Error: Into<BoxError>,
    {
        self.handlers[method.index()] = Some(Arc::new(handler));
        self
    }

    pub fn get<H>(self, handler: H) -> Self
    where
        H: Handler + 'static,
        H::RespBody: Body<Data = Bytes> + Send + 'static,
        <H::RespBody as Body>::Error: Into<BoxError>,
    {
        self.handler(Method::Get, handler)
    }

    pub fn post<H>(self, handler: H) -> Self
    where
        H: Handler + 'static,
        H::RespBody: Body<Data = Bytes> + Send + 'static,
        <H::RespBody as Body>::Error: Into<BoxError>,
    {
        self.handler(Method::Post, handler)
    }

    pub fn put<H>(self, handler: H) -> Self
    where
        H: Handler + 'static,
        H::RespBody: Body<Data = Bytes> + Send + 'static,
        <H::RespBody as Body>::Error: Into<BoxError>,
    {
        self.handler(Method::Put, handler)
    }

    pub fn delete<H>(self, handler: H) -> Self
    where
        H: Handler + 'static,
        H::RespBody: Body<Data = Bytes> + Send + 'static,
        <H::RespBody as Body>::Error: Into<BoxError>,
    {
        self.handler(Method::Delete, handler)
    }

    /// Handler for `HEAD`. When unset, `HEAD` shares the `GET` handler; the connection
    /// drops the body either way.
    pub fn head<H>(self, handler: H) -> Self
    where
        H: Handler + 'static,
        H::RespBody: Body<Data = Bytes> + Send + 'static,
        <H::RespBody as Body>::Error: Into<BoxError>,
    {
        self.handler(Method::Head, handler)
    }

    pub fn build(mut self) -> Dispatcher {
        let get = self.handlers[Method::Get.index()].take().unwrap_or_else(|| builtin::handler_for(Method::Get));
        let head = self.handlers[Method::Head.index()].take().unwrap_or_else(|| Arc::clone(&get));

        let mut take_or_builtin = |method: Method| self.handlers[method.index()].take().unwrap_or_else(|| builtin::handler_for(method));
        let post = take_or_builtin(Method::Post);
        let put = take_or_builtin(Method::Put);
        let delete = take_or_builtin(Method::Delete);

        Dispatcher { handlers: [get, post, put, delete, head] }
    }
}

pub(crate) fn empty_body() -> ResponseBody {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed_unsync()
}

/// A `text/plain` response whose length is known up front.
pub(crate) fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<ResponseBody> {
    let mut response = Response::new(Full::new(body.into()).map_err(|never| match never {}).boxed_unsync());
    *response.status_mut() = status;
    if let Ok(content_type) = HeaderValue::from_str(mime::TEXT_PLAIN_UTF_8.as_ref()) {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    response
}

fn method_not_allowed() -> Response<ResponseBody> {
    let mut response = text_response(StatusCode::METHOD_NOT_ALLOWED, format!("allowed methods: {ALLOWED_METHODS}\n"));
    response.headers_mut().insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    response
}

fn internal_server_error() -> Response<ResponseBody> {
    text_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error\n")
}
