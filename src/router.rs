//! Exact-match route table, groups and the per-request dispatch loop.
//!
//! One map per HTTP method, keyed by the full path. No patterns, no wildcards:
//! a request either names a registered `(method, path)` pair or it misses.
//!
//! # Groups
//!
//! [`Router::group`] returns a view onto the same table with a longer path
//! prefix and a copy of the parent's middleware. Whatever a group registers
//! lands in the shared table with the group's prefix and middleware spliced
//! in at that moment:
//!
//! ```rust
//! # use kelp::{Context, HandlerResult, Router, middleware};
//! # fn auth(_: &mut Context) -> HandlerResult { Ok(()) }
//! # fn thing(_: &mut Context) -> HandlerResult { Ok(()) }
//! let app = Router::new().use_middleware(middleware::recovery);
//!
//! // chain of POST /api/thing: [recovery, auth, thing]
//! app.group("/api").use_middleware(auth).post("/thing", thing);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, trace};

use crate::context::{Chain, Context};
use crate::handler::{Handler, IntoHandler};
use crate::logging::Logger;
use crate::request::Request;
use crate::response::{Response, ResponseSink};

type RouteTable = HashMap<Method, HashMap<String, Chain>>;

/// Why a lookup found no chain.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum RouteMiss {
    /// Nothing at all is registered for the method.
    #[error("method not allowed")]
    MethodNotAllowed,
    /// The method is known but the path is not.
    #[error("not found")]
    NotFound,
}

impl RouteMiss {
    pub fn status(self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// The application router, or a group view onto one.
///
/// Register everything at startup, then hand the root router to
/// [`Server::serve`](crate::Server::serve). Registration methods take and
/// return `self` so calls chain; the table itself is shared, so a group can be
/// dropped as soon as its routes are in.
pub struct Router {
    table: Arc<RwLock<RouteTable>>,
    base_path: String,
    middleware: Vec<Handler>,
    logger: Logger,
}

impl Router {
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(HashMap::new())),
            base_path: String::new(),
            middleware: Vec::new(),
            logger: Logger::default(),
        }
    }

    /// Replaces the log sink handed to every request's [`Context`]. Groups
    /// copy the logger when they are created.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// A view onto the same table whose registrations get `prefix` appended
    /// to this router's base path and start with a snapshot of this router's
    /// middleware. Later [`use_middleware`](Self::use_middleware) calls on
    /// either side do not reach the other.
    pub fn group(&self, prefix: &str) -> Router {
        Router {
            table: Arc::clone(&self.table),
            base_path: format!("{}{}", self.base_path, prefix),
            middleware: self.middleware.clone(),
            logger: self.logger.clone(),
        }
    }

    /// Appends `handler` to this router's middleware. Only routes registered
    /// afterwards through this router (or groups created afterwards from it)
    /// include it.
    pub fn use_middleware<M>(mut self, handler: impl IntoHandler<M>) -> Self {
        self.middleware.push(handler.into_handler());
        self
    }

    pub fn get<M>(self, path: &str, handler: impl IntoHandler<M>) -> Self {
        self.handle(Method::GET, path, handler)
    }

    pub fn post<M>(self, path: &str, handler: impl IntoHandler<M>) -> Self {
        self.handle(Method::POST, path, handler)
    }

    pub fn put<M>(self, path: &str, handler: impl IntoHandler<M>) -> Self {
        self.handle(Method::PUT, path, handler)
    }

    pub fn patch<M>(self, path: &str, handler: impl IntoHandler<M>) -> Self {
        self.handle(Method::PATCH, path, handler)
    }

    pub fn delete<M>(self, path: &str, handler: impl IntoHandler<M>) -> Self {
        self.handle(Method::DELETE, path, handler)
    }

    /// Registers one handler for `method` + `path`.
    pub fn handle<M>(self, method: Method, path: &str, handler: impl IntoHandler<M>) -> Self {
        self.handle_chain(method, path, [handler.into_handler()])
    }

    /// Registers several handlers at once, run in the given order after this
    /// router's middleware.
    ///
    /// Registering a key that already has a chain appends to it: each call
    /// adds this router's middleware followed by `handlers`.
    pub fn handle_chain(
        self,
        method: Method,
        path: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Self {
        let full_path = format!("{}{}", self.base_path, path);
        {
            let mut table = self.table.write();
            let routes = table.entry(method.clone()).or_default();
            let mut chain: Vec<Handler> =
                routes.get(&full_path).map(|c| c.to_vec()).unwrap_or_default();
            chain.extend(self.middleware.iter().cloned());
            chain.extend(handlers);
            debug!(%method, path = %full_path, handlers = chain.len(), "route registered");
            routes.insert(full_path, chain.into());
        }
        self
    }

    /// Prefix prepended to every path registered through this router.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// The chain registered for exactly `method` + `path`.
    pub fn lookup(&self, method: &Method, path: &str) -> Result<Chain, RouteMiss> {
        let table = self.table.read();
        let routes = table.get(method).ok_or(RouteMiss::MethodNotAllowed)?;
        let chain = routes.get(path).ok_or(RouteMiss::NotFound)?;
        Ok(Arc::clone(chain))
    }

    /// Runs one request to completion and returns its single response.
    ///
    /// A route miss answers `404`/`405` without running any handler.
    /// Otherwise the chain runs from its first handler; whatever it recorded
    /// on the [`Context`] when control returns becomes the response. A panic
    /// that no [`recovery`](crate::middleware::recovery) middleware catches
    /// propagates to the caller.
    pub fn dispatch(&self, req: Request) -> Response {
        let chain = match self.lookup(req.method(), req.path()) {
            Ok(chain) => chain,
            Err(miss) => {
                debug!(method = %req.method(), path = req.path(), "{miss}");
                return Response::status(miss.status());
            }
        };

        trace!(method = %req.method(), path = req.path(), handlers = chain.len(), "route resolved");
        let mut ctx = Context::new(req, chain, self.logger.clone());
        ctx.run();
        ctx.finish()
    }

    /// [`dispatch`](Self::dispatch), writing the response to `sink`.
    pub fn serve<S: ResponseSink + ?Sized>(&self, req: Request, sink: &mut S) {
        sink.write_response(self.dispatch(req));
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerResult;

    fn a(_c: &mut Context) -> HandlerResult { Ok(()) }
    fn b(_c: &mut Context) -> HandlerResult { Ok(()) }
    fn c(_c: &mut Context) -> HandlerResult { Ok(()) }

    fn names(chain: &Chain) -> Vec<&'static str> {
        chain
            .iter()
            .map(|h| h.name().rsplit("::").next().unwrap_or_default())
            .collect()
    }

    #[test]
    fn lookup_returns_chain_in_order() {
        let app = Router::new().handle_chain(
            Method::GET,
            "/x",
            [Handler::context(a), Handler::context(b), Handler::context(c)],
        );
        let chain = app.lookup(&Method::GET, "/x").unwrap();
        assert_eq!(names(&chain), ["a", "b", "c"]);
    }

    #[test]
    fn two_level_miss() {
        let app = Router::new().get("/x", a);
        assert_eq!(app.lookup(&Method::GET, "/y").unwrap_err(), RouteMiss::NotFound);
        assert_eq!(app.lookup(&Method::POST, "/x").unwrap_err(), RouteMiss::MethodNotAllowed);
        assert_eq!(RouteMiss::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(RouteMiss::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn no_prefix_matching() {
        let app = Router::new().get("/api", a);
        assert!(app.lookup(&Method::GET, "/api/").is_err());
        assert!(app.lookup(&Method::GET, "/ap").is_err());
        assert!(app.lookup(&Method::GET, "/api/x").is_err());
    }

    #[test]
    fn group_prepends_prefix_and_middleware_once() {
        let app = Router::new().use_middleware(a);
        app.group("/api").use_middleware(b).post("/thing", c);

        let chain = app.lookup(&Method::POST, "/api/thing").unwrap();
        assert_eq!(names(&chain), ["a", "b", "c"]);
        assert!(app.lookup(&Method::POST, "/thing").is_err());
    }

    #[test]
    fn nested_groups_concatenate_prefixes() {
        let app = Router::new();
        let v1 = app.group("/api").group("/v1");
        assert_eq!(v1.base_path(), "/api/v1");
        v1.get("/users", a);
        assert!(app.lookup(&Method::GET, "/api/v1/users").is_ok());
    }

    #[test]
    fn group_middleware_is_a_snapshot() {
        let parent = Router::new().use_middleware(a);
        let child = parent.group("/child");
        let parent = parent.use_middleware(b);

        child.get("/x", c);
        let parent = parent.get("/y", c);

        assert_eq!(names(&parent.lookup(&Method::GET, "/child/x").unwrap()), ["a", "c"]);
        assert_eq!(names(&parent.lookup(&Method::GET, "/y").unwrap()), ["a", "b", "c"]);
    }

    #[test]
    fn sibling_groups_do_not_share_middleware() {
        let app = Router::new();
        app.group("/one").use_middleware(a).get("/x", c);
        app.group("/two").use_middleware(b).get("/x", c);

        assert_eq!(names(&app.lookup(&Method::GET, "/one/x").unwrap()), ["a", "c"]);
        assert_eq!(names(&app.lookup(&Method::GET, "/two/x").unwrap()), ["b", "c"]);
    }

    #[test]
    fn later_use_does_not_touch_registered_routes() {
        let app = Router::new().get("/x", c).use_middleware(a);
        assert_eq!(names(&app.lookup(&Method::GET, "/x").unwrap()), ["c"]);
    }

    #[test]
    fn re_registering_accumulates() {
        let app = Router::new().use_middleware(a).get("/x", b).get("/x", c);
        assert_eq!(names(&app.lookup(&Method::GET, "/x").unwrap()), ["a", "b", "a", "c"]);
    }

    #[test]
    fn miss_runs_no_handler() {
        let app = Router::new().get("/x", |_c: &mut Context| -> HandlerResult {
            panic!("must not run");
        });
        let res = app.dispatch(Request::new(http::Request::get("/nope").body(()).unwrap()));
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert!(res.body().is_empty());

        let res = app.dispatch(Request::new(http::Request::delete("/x").body(()).unwrap()));
        assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
