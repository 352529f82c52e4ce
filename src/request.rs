//! Incoming HTTP request type.

use std::net::SocketAddr;

use bytes::Bytes;
use http::{Extensions, HeaderMap, Method, Uri};
use http_body_util::BodyExt;

use crate::error::Error;

/// A request body that has not been read yet.
///
/// `read_to_end` consumes the reader, so a body can be pulled from its source
/// at most once. [`Context::body`](crate::Context::body) caches the result.
pub trait BodyReader: Send {
    fn read_to_end(self: Box<Self>) -> Result<Bytes, Error>;
}

impl BodyReader for Bytes {
    fn read_to_end(self: Box<Self>) -> Result<Bytes, Error> {
        Ok(*self)
    }
}

impl BodyReader for Vec<u8> {
    fn read_to_end(self: Box<Self>) -> Result<Bytes, Error> {
        Ok(Bytes::from(*self))
    }
}

impl BodyReader for String {
    fn read_to_end(self: Box<Self>) -> Result<Bytes, Error> {
        Ok(Bytes::from(*self))
    }
}

impl BodyReader for &'static str {
    fn read_to_end(self: Box<Self>) -> Result<Bytes, Error> {
        Ok(Bytes::from_static(self.as_bytes()))
    }
}

/// No body, e.g. `http::Request::get("/").body(())`.
impl BodyReader for () {
    fn read_to_end(self: Box<Self>) -> Result<Bytes, Error> {
        Ok(Bytes::new())
    }
}

/// A hyper body stream, drained by blocking on the runtime that accepted it.
///
/// Handler chains run on tokio's blocking pool, where `Handle::block_on` is
/// allowed.
pub(crate) struct IncomingBody {
    incoming: hyper::body::Incoming,
    runtime: tokio::runtime::Handle,
}

impl BodyReader for IncomingBody {
    fn read_to_end(self: Box<Self>) -> Result<Bytes, Error> {
        let Self { incoming, runtime } = *self;
        let collected = runtime.block_on(incoming.collect())?;
        Ok(collected.to_bytes())
    }
}

/// An incoming HTTP request.
pub struct Request {
    head: http::request::Parts,
    remote_addr: Option<SocketAddr>,
    body: Option<Box<dyn BodyReader>>,
}

impl Request {
    /// Wraps an `http::Request` whose body has not been read yet.
    pub fn new<B: BodyReader + 'static>(req: http::Request<B>) -> Self {
        let (head, body) = req.into_parts();
        Self { head, remote_addr: None, body: Some(Box::new(body)) }
    }

    pub(crate) fn from_incoming(
        req: hyper::Request<hyper::body::Incoming>,
        remote_addr: SocketAddr,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        let (head, incoming) = req.into_parts();
        Self {
            head,
            remote_addr: Some(remote_addr),
            body: Some(Box::new(IncomingBody { incoming, runtime })),
        }
    }

    /// Sets the peer address, as the server does for accepted connections.
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn method(&self) -> &Method { &self.head.method }
    pub fn uri(&self) -> &Uri { &self.head.uri }
    pub fn path(&self) -> &str { self.head.uri.path() }
    pub fn query(&self) -> Option<&str> { self.head.uri.query() }
    pub fn headers(&self) -> &HeaderMap { &self.head.headers }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }
    pub fn extensions(&self) -> &Extensions { &self.head.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.head.extensions }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub(crate) fn take_body(&mut self) -> Option<Box<dyn BodyReader>> {
        self.body.take()
    }
}

impl<B: BodyReader + 'static> From<http::Request<B>> for Request {
    fn from(req: http::Request<B>) -> Self {
        Self::new(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::new(
            http::Request::get("/").header("X-Real-Ip", "10.0.0.1").body(()).unwrap(),
        );
        assert_eq!(req.header("x-real-ip"), Some("10.0.0.1"));
        assert_eq!(req.header("missing"), None);
    }

    #[test]
    fn body_can_only_be_taken_once() {
        let mut req = Request::new(http::Request::post("/").body("abc").unwrap());
        let body = req.take_body().unwrap().read_to_end().unwrap();
        assert_eq!(&body[..], b"abc");
        assert!(req.take_body().is_none());
    }

    #[test]
    fn splits_path_and_query() {
        let req = Request::new(http::Request::get("/hello?name=a").body(()).unwrap());
        assert_eq!(req.path(), "/hello");
        assert_eq!(req.query(), Some("name=a"));
        assert_eq!(req.method(), Method::GET);
    }
}
