//! Per-request state shared by the handlers of one chain.
//!
//! A [`Context`] is created when a route resolves, driven through its chain
//! by [`Context::next`], and consumed once the chain returns to produce the
//! request's single [`Response`]. It never leaves the task serving its
//! request, so nothing in it is locked.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{Extensions, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::envelope::{self, ErrorResponse};
use crate::handler::Handler;
use crate::logging::Logger;
use crate::request::Request;
use crate::response::{ContentType, Response};

/// The ordered handlers bound to one route.
pub type Chain = Arc<[Handler]>;

static NULL: Value = Value::Null;

/// Per-request execution context.
pub struct Context {
    request: Request,
    query: Vec<(String, String)>,
    metadata: HashMap<String, Value>,
    body: Option<Bytes>,
    chain: Chain,
    index: usize,
    logger: Logger,

    has_response: bool,
    status: StatusCode,
    content_type: Option<ContentType>,
    response_body: Bytes,
}

impl Context {
    pub(crate) fn new(request: Request, chain: Chain, logger: Logger) -> Self {
        let query = request
            .query()
            .and_then(|q| serde_urlencoded::from_str(q).ok())
            .unwrap_or_default();
        Self {
            request,
            query,
            metadata: HashMap::new(),
            body: None,
            chain,
            index: 0,
            logger,
            has_response: false,
            status: StatusCode::OK,
            content_type: None,
            response_body: Bytes::new(),
        }
    }

    // ── Chain control ─────────────────────────────────────────────────────────

    /// Runs the rest of the chain, then returns to the caller.
    ///
    /// A handler that returns without calling `next` ends the chain: nothing
    /// after it runs.
    pub fn next(&mut self) {
        self.index += 1;
        if self.index < self.chain.len() {
            self.process();
        }
    }

    /// Starts the chain at its first handler.
    pub(crate) fn run(&mut self) {
        self.index = 0;
        if !self.chain.is_empty() {
            self.process();
        }
    }

    fn process(&mut self) {
        let chain = Arc::clone(&self.chain);
        let handler = &chain[self.index];
        trace!(index = self.index, handler = handler.name(), "invoking handler");
        handler.call(self);
    }

    /// Builds the one response of this request. Without a recorded response
    /// the result is `{"status":0,"data":{}}`.
    pub(crate) fn finish(self) -> Response {
        if self.has_response {
            Response::new(self.status, self.content_type, self.response_body)
        } else {
            Response::json(envelope::empty_success())
        }
    }

    // ── Request ───────────────────────────────────────────────────────────────

    pub fn request(&self) -> &Request { &self.request }
    pub fn method(&self) -> &Method { self.request.method() }
    pub fn path(&self) -> &str { self.request.path() }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.request.remote_addr() }
    pub fn extensions(&self) -> &Extensions { self.request.extensions() }
    pub fn extensions_mut(&mut self) -> &mut Extensions { self.request.extensions_mut() }
    pub fn logger(&self) -> &Logger { &self.logger }

    /// First value of the query parameter `key`, or `""`.
    pub fn query_param(&self, key: &str) -> &str {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map_or("", |(_, v)| v.as_str())
    }

    /// Value of the header `key` (case-insensitive), or `""`.
    pub fn header(&self, key: &str) -> &str {
        self.request.header(key).unwrap_or("")
    }

    /// Raw request body. Read from the transport on the first call only;
    /// later calls return the cached bytes. A failed read yields an empty
    /// body and a WARN line.
    pub fn body(&mut self) -> &[u8] {
        if self.body.is_none() {
            let bytes = match self.request.take_body() {
                Some(reader) => reader.read_to_end().unwrap_or_else(|e| {
                    self.logger.warn(&[&"read body:", &e]);
                    Bytes::new()
                }),
                None => Bytes::new(),
            };
            self.body = Some(bytes);
        }
        self.body.as_deref().unwrap_or_default()
    }

    /// Decodes the body as JSON. Empty or malformed input gives
    /// `T::default()`; the request carries on.
    pub(crate) fn decode_body<T: DeserializeOwned + Default>(&mut self) -> T {
        let body = self.body();
        if body.is_empty() {
            return T::default();
        }
        match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                self.logger.debug(&[&"request body is not valid json:", &e]);
                T::default()
            }
        }
    }

    // ── Metadata ──────────────────────────────────────────────────────────────

    /// Value stored under `key` by an earlier handler, or `Value::Null`.
    pub fn metadata(&self, key: &str) -> &Value {
        self.metadata.get(key).unwrap_or(&NULL)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    // ── Response ──────────────────────────────────────────────────────────────

    /// Records `{"status":0,"data":<data>}` as the response. A later call
    /// replaces it. If `data` cannot be serialised the response becomes a
    /// bare 500.
    pub fn respond_json<T: Serialize + ?Sized>(&mut self, data: &T) {
        match envelope::encode_success(data) {
            Ok(bytes) => self.set_response(StatusCode::OK, ContentType::Json, bytes.into()),
            Err(e) => {
                self.logger.error(&[&"encode response:", &e]);
                self.fail_with_status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    }

    /// Records a bare status code (`text/plain`, empty body) as the
    /// response, discarding any pending JSON body.
    pub fn fail_with_status(&mut self, code: StatusCode) {
        self.set_response(code, ContentType::Text, Bytes::new());
    }

    pub(crate) fn respond_error(&mut self, err: &ErrorResponse) {
        self.set_response(StatusCode::OK, ContentType::Json, err.encode().into());
    }

    fn set_response(&mut self, status: StatusCode, content_type: ContentType, body: Bytes) {
        self.has_response = true;
        self.status = status;
        self.content_type = Some(content_type);
        self.response_body = body;
    }

    /// Whether any handler has recorded a response yet.
    pub fn has_response(&self) -> bool { self.has_response }
    pub fn pending_status(&self) -> StatusCode { self.status }
    pub fn pending_body(&self) -> &[u8] { &self.response_body }
}
