//! Placeholder handlers installed for every method the builder was not given one for.

use super::dispatcher::{empty_body, text_response, DynHandler, ResponseBody};
use super::method::Method;
use crate::handler::{BoxError, Handler};
use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response, StatusCode};
use std::sync::Arc;

pub(crate) fn handler_for(method: Method) -> Arc<dyn DynHandler> {
    match method {
        Method::Get | Method::Head => Arc::new(GetHandler),
        Method::Post => Arc::new(PostHandler),
        Method::Put => Arc::new(PutHandler),
        Method::Delete => Arc::new(DeleteHandler),
    }
}

#[derive(Debug)]
struct GetHandler;

#[async_trait]
impl Handler for GetHandler {
    type RespBody = ResponseBody;
    type Error = BoxError;

    async fn call(&self, req: Request<Bytes>) -> Result<Response<ResponseBody>, BoxError> {
        let target = req.uri().path_and_query().map_or("/", |path_and_query| path_and_query.as_str());
        Ok(text_response(StatusCode::OK, format!("Hello from {target}\n")))
    }
}

#[derive(Debug)]
struct PostHandler;

#[async_trait]
impl Handler for PostHandler {
    type RespBody = ResponseBody;
    type Error = BoxError;

    async fn call(&self, req: Request<Bytes>) -> Result<Response<ResponseBody>, BoxError> {
        Ok(text_response(StatusCode::OK, format!("received {} bytes\n", req.body().len())))
    }
}

#[derive(Debug)]
struct PutHandler;

#[async_trait]
impl Handler for PutHandler {
    type RespBody = ResponseBody;
    type Error = BoxError;

    async fn call(&self, req: Request<Bytes>) -> Result<Response<ResponseBody>, BoxError> {
        Ok(text_response(StatusCode::CREATED, format!("stored {} bytes at {}\n", req.body().len(), req.uri().path())))
    }
}

#[derive(Debug)]
struct DeleteHandler;

#[async_trait]
impl Handler for DeleteHandler {
    type RespBody = ResponseBody;
    type Error = BoxError;

    async fn call(&self, _req: Request<Bytes>) -> Result<Response<ResponseBody>, BoxError> {
        let mut response = Response::new(empty_body());
        *response.status_mut() = StatusCode::NO_CONTENT;
        Ok(response)
    }
}
