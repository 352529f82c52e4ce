//! Outbound HTTP helper for handlers that call other services.
//!
//! Returns the raw response body whatever the upstream status; decoding and
//! status interpretation are the caller's business.
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), kelp::Error> {
//! let body = kelp::client::post("http://127.0.0.1:8080/hello", r#"{"name":"Lywane"}"#, None).await?;
//! # Ok(()) }
//! ```

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;

use crate::error::Error;

/// Timeout applied when a call does not pass its own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A reusable client. Cloning shares the connection pool.
#[derive(Clone, Debug, Default)]
pub struct Client {
    inner: reqwest::Client,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    /// `GET url`.
    pub async fn get(&self, url: &str, timeout: Option<Duration>) -> Result<Bytes, Error> {
        self.send(self.inner.get(url), timeout).await
    }

    /// `POST url` with `Content-Type: application/json`.
    pub async fn post(
        &self,
        url: &str,
        body: impl Into<Bytes>,
        timeout: Option<Duration>,
    ) -> Result<Bytes, Error> {
        let req = self
            .inner
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.into());
        self.send(req, timeout).await
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        timeout: Option<Duration>,
    ) -> Result<Bytes, Error> {
        let res = req.timeout(timeout.unwrap_or(DEFAULT_TIMEOUT)).send().await?;
        Ok(res.bytes().await?)
    }
}

/// `GET url` with a throwaway client.
pub async fn get(url: &str, timeout: Option<Duration>) -> Result<Bytes, Error> {
    Client::new().get(url, timeout).await
}

/// `POST url` with a throwaway client.
pub async fn post(url: &str, body: impl Into<Bytes>, timeout: Option<Duration>) -> Result<Bytes, Error> {
    Client::new().post(url, body, timeout).await
}
