//! # kelp
//!
//! A small HTTP dispatch framework: exact `(method, path)` routes, middleware
//! chains with explicit short-circuit, and handlers that take and return typed
//! JSON without any marshalling code.
//!
//! ## The pieces
//!
//! - [`Router`]: exact-match route table with groups (shared prefix, shared
//!   leading middleware).
//! - [`Context`]: per-request state. Query, headers, a lazily read body, a
//!   metadata bag for handler-to-handler values, and the pending response.
//! - [`Handler`]: one of three call shapes, picked from the function signature.
//! - [`Envelope`](envelope::Envelope): every JSON body is
//!   `{"status":0,"data":...}` or `{"status":<n>,"message":"..."}`.
//! - [`Server`]: hyper + tokio, graceful shutdown.
//!
//! Application errors travel in the envelope with HTTP `200`. Only route
//! misses (`404`/`405`), [`Context::fail_with_status`] and faults change the
//! HTTP status.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use kelp::{Context, ErrorResponse, HandlerResult, Router, Server, middleware};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Default, Deserialize)]
//! #[serde(default)]
//! struct Greet { name: String }
//!
//! #[derive(Default, Serialize)]
//! struct Greeting { text: String }
//!
//! // Typed: body decoded into `Greet`, `Greeting` sent back in the envelope.
//! fn greet(input: &Greet, out: &mut Greeting) -> HandlerResult {
//!     if input.name.is_empty() {
//!         return Err(ErrorResponse::new(1001, "name is required"));
//!     }
//!     out.text = format!("Hello {}", input.name);
//!     Ok(())
//! }
//!
//! // Context-only: reads the query, writes the response itself.
//! fn greet_get(c: &mut Context) -> HandlerResult {
//!     let text = format!("Hello {}", c.query_param("name"));
//!     c.respond_json(&serde_json::json!({ "text": text }));
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .use_middleware(middleware::recovery)
//!         .post("/hello", greet)
//!         .get("/hello", greet_get);
//!
//!     Server::bind("0.0.0.0:8080").serve(app).await.unwrap();
//! }
//! ```

mod context;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod client;
pub mod envelope;
pub mod logging;
pub mod middleware;

pub use context::{Chain, Context};
pub use envelope::{Envelope, ErrorResponse};
pub use error::Error;
pub use handler::{Handler, HandlerKind, HandlerResult, IntoHandler};
pub use http::{Method, StatusCode};
pub use logging::Logger;
pub use request::{BodyReader, Request};
pub use response::{ContentType, Response, ResponseSink};
pub use router::{RouteMiss, Router};
pub use server::Server;
