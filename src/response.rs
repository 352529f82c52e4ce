//! Outgoing HTTP response type and the sink it is written to.
//!
//! Handlers never build a [`Response`] themselves. They record what they want
//! on the [`Context`](crate::Context) and the dispatch loop turns that into
//! exactly one `Response` when the chain is done.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::StatusCode;
use http_body_util::Full;

// ── ContentType ───────────────────────────────────────────────────────────────

/// The two content types kelp writes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Json, // application/json;charset=UTF-8
    Text, // text/plain;charset=UTF-8
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "application/json;charset=UTF-8",
            Self::Text => "text/plain;charset=UTF-8",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// A finalized HTTP response.
#[derive(Clone, Debug)]
pub struct Response {
    status: StatusCode,
    content_type: Option<ContentType>,
    body: Bytes,
}

impl Response {
    /// `200 OK`, `application/json;charset=UTF-8`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self { status: StatusCode::OK, content_type: Some(ContentType::Json), body: body.into() }
    }

    /// A bare status code: no content type, no body. Used for route misses
    /// and transport-level faults.
    pub fn status(code: StatusCode) -> Self {
        Self { status: code, content_type: None, body: Bytes::new() }
    }

    pub(crate) fn new(status: StatusCode, content_type: Option<ContentType>, body: Bytes) -> Self {
        Self { status, content_type, body }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn content_type(&self) -> Option<ContentType> { self.content_type }
    pub fn body(&self) -> &[u8] { &self.body }

    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        if let Some(ct) = self.content_type {
            res.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(ct.as_str()));
        }
        res
    }
}

// ── ResponseSink ──────────────────────────────────────────────────────────────

/// Where [`Router::serve`](crate::Router::serve) writes the one response of a
/// request. Embedders and tests pick the sink; [`Server`](crate::Server)
/// bypasses it and hands [`Router::dispatch`](crate::Router::dispatch)'s
/// result straight to hyper.
pub trait ResponseSink {
    fn write_response(&mut self, response: Response);
}

/// Keeps the last response written.
impl ResponseSink for Option<Response> {
    fn write_response(&mut self, response: Response) {
        *self = Some(response);
    }
}

/// Keeps every response written, in order.
impl ResponseSink for Vec<Response> {
    fn write_response(&mut self, response: Response) {
        self.push(response);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_sets_content_type() {
        let res = Response::json(&b"{}"[..]).into_inner();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[CONTENT_TYPE], "application/json;charset=UTF-8");
    }

    #[test]
    fn bare_status_has_no_content_type() {
        let res = Response::status(StatusCode::NOT_FOUND).into_inner();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.headers().get(CONTENT_TYPE).is_none());
    }
}
