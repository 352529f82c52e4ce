//! Built-in middleware.
//!
//! Middleware is an ordinary `ContextOnly` handler that calls
//! [`Context::next`](crate::Context::next) to let the rest of the chain run,
//! or returns without calling it to stop the request where it is.
//!
//! - [`recovery`] turns a panic anywhere later in the chain into a bare `500`.
//! - [`access_log`] writes one `REQ` line per request.
//!
//! Put `recovery` first so it covers everything after it:
//!
//! ```rust
//! use kelp::{Router, middleware};
//!
//! let app = Router::new()
//!     .use_middleware(middleware::recovery)
//!     .use_middleware(middleware::access_log);
//! ```

mod access_log;
mod recovery;

pub use access_log::{access_log, TRACE_ID_HEADER, UUID_HEADER};
pub use recovery::recovery;
