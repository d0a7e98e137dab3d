use std::fmt::Display;
use std::pin::pin;
use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::header::CONNECTION;
use http::{HeaderValue, Method, Request, Response, StatusCode, Version};
use http_body::Body;
use http_body_util::{BodyExt, Empty};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, warn};

use super::ConnectionConfig;
use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::handler::{BoxError, Handler};
use crate::protocol::{BodyOmitted, HttpError, Message, PayloadItem, PayloadSize, RequestHeader, ResponseHead, SendError};

/// An HTTP connection that reads requests and writes responses on one byte stream
///
/// The connection serves one request at a time: read a complete request, hand it to the
/// handler, write the response, then either wait for the next request or close.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
    config: ConnectionConfig,
}

/// What the request decided about the response that answers it.
#[derive(Debug, Clone, Copy)]
struct ResponseContext {
    keep_alive: bool,
    version: Version,
    omit_body: bool,
}

impl ResponseContext {
    fn from_request(header: &RequestHeader) -> Self {
        Self { keep_alive: header.is_keep_alive(), version: header.version(), omit_body: header.method() == Method::HEAD }
    }

    /// For responses to bytes that could not be parsed as a request.
    fn closing() -> Self {
        Self { keep_alive: false, version: Version::HTTP_11, omit_body: false }
    }
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_config(reader, writer, ConnectionConfig::default())
    }

    pub fn with_config(reader: R, writer: W, config: ConnectionConfig) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::with_max_body_size(config.max_body_size()), config.read_buffer_size()),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
            config,
        }
    }

    /// Serves requests until the peer closes, a timeout expires or the connection must close.
    ///
    /// Returns `Ok` for an orderly close. A parse error is answered with `400` before it is
    /// returned; transport errors are returned without writing anything.
    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
        H::RespBody: Body<Data = Bytes>,
        <H::RespBody as Body>::Error: Display,
    {
        loop {
            let next = match timeout(self.config.read_timeout(), self.framed_read.next()).await {
                Ok(next) => next,
                Err(_elapsed) => {
                    debug!(timeout = ?self.config.read_timeout(), "no request within read timeout, connection shutdown");
                    return Ok(());
                }
            };

            match next {
                Some(Ok(request)) => {
                    if !self.do_process(request, &handler).await? {
                        debug!("connection is not persistent, connection shutdown");
                        return Ok(());
                    }
                }

                Some(Err(e)) if e.is_io() => return Err(e.into()),

                Some(Err(e)) => {
                    warn!(cause = %e, "can't parse request, connection shutdown");
                    let error_response = build_error_response(StatusCode::BAD_REQUEST);
                    self.do_send_response(error_response, ResponseContext::closing()).await?;
                    return Err(e.into());
                }

                None => {
                    debug!("cant read more request, connection shutdown");
                    return Ok(());
                }
            }
        }
    }

    /// Returns whether the connection stays open for another request.
    async fn do_process<H>(&mut self, request: Request<Bytes>, handler: &Arc<H>) -> Result<bool, HttpError>
    where
        H: Handler,
        H::RespBody: Body<Data = Bytes>,
        <H::RespBody as Body>::Error: Display,
    {
        let (parts, body) = request.into_parts();
        let header = RequestHeader::from(parts);
        let context = ResponseContext::from_request(&header);
        debug!(method = %header.method(), target = header.target(), body_size = body.len(), "receive request");

        let response_result = handler.call(header.body(body)).await;
        self.send_response(response_result, context).await?;

        Ok(context.keep_alive)
    }

    async fn send_response<T, E>(&mut self, response_result: Result<Response<T>, E>, context: ResponseContext) -> Result<(), HttpError>
    where
        T: Body<Data = Bytes>,
        T::Error: Display,
        E: Into<BoxError>,
    {
        match response_result {
            Ok(response) => self.do_send_response(response, context).await,
            Err(e) => {
                let e: BoxError = e.into();
                error!(cause = %e, "handle response error");
                let error_response = build_error_response(StatusCode::INTERNAL_SERVER_ERROR);
                self.do_send_response(error_response, context).await
            }
        }
    }

    async fn do_send_response<T>(&mut self, response: Response<T>, context: ResponseContext) -> Result<(), HttpError>
    where
        T: Body<Data = Bytes>,
        T::Error: Display,
    {
        let (mut header_parts, body) = response.into_parts();

        let payload_size = {
            let size_hint = body.size_hint();
            match size_hint.exact() {
                Some(length) => PayloadSize::new_length(length),
                None => PayloadSize::Chunked,
            }
        };

        if !context.keep_alive {
            header_parts.headers.insert(CONNECTION, HeaderValue::from_static("close"));
        } else if context.version == Version::HTTP_10 {
            header_parts.headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        }
        if context.omit_body {
            header_parts.extensions.insert(BodyOmitted);
        }

        let write_timeout = self.config.write_timeout();
        let framed_write = &mut self.framed_write;
        let write_response = async move {
            let mut body = pin!(body);

            // HTTP/1.0 has no chunked coding, so a body of unknown size is buffered to learn its length
            if payload_size.is_chunked() && context.version == Version::HTTP_10 && !context.omit_body {
                let collected = body
                    .as_mut()
                    .collect()
                    .await
                    .map_err(|e| SendError::invalid_body(format!("resolve response body error: {e}")))?
                    .to_bytes();

                let header = Message::<_, Bytes>::Header((
                    ResponseHead::from_parts(header_parts, ()),
                    PayloadSize::new_length(collected.len() as u64),
                ));
                framed_write.feed(header).await?;
                if !collected.is_empty() {
                    framed_write.feed(Message::Payload(PayloadItem::Chunk(collected))).await?;
                }
                return framed_write.send(Message::Payload(PayloadItem::<Bytes>::Eof)).await;
            }

            let header = Message::<_, Bytes>::Header((ResponseHead::from_parts(header_parts, ()), payload_size));
            framed_write.feed(header).await?;

            if !context.omit_body {
                while let Some(frame) = body.frame().await {
                    let frame = frame.map_err(|e| SendError::invalid_body(format!("resolve response body error: {e}")))?;
                    // trailers are not written
                    if let Ok(data) = frame.into_data() {
                        framed_write.feed(Message::Payload(PayloadItem::Chunk(data))).await?;
                    }
                }
            }

            // using send instead of feed, because the whole response must reach the peer
            framed_write.send(Message::Payload(PayloadItem::<Bytes>::Eof)).await
        };

        match timeout(write_timeout, write_response).await {
            Ok(result) => result.map_err(HttpError::from),
            Err(_elapsed) => Err(SendError::timeout(write_timeout).into()),
        }
    }
}

fn build_error_response(status_code: StatusCode) -> Response<Empty<Bytes>> {
    let mut response = Response::new(Empty::<Bytes>::new());
    *response.status_mut() = status_code;
    response
}
