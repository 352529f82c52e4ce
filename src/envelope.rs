//! The JSON envelope every JSON response body is wrapped in.
//!
//! ```text
//! {"status":0,"data":{...}}             success
//! {"status":1001,"message":"bad name"}   handler-reported error
//! ```
//!
//! `status == 0` is the only success code. A non-zero status always carries a
//! non-empty `message` and never carries `data`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The status value of a successful envelope.
pub const SUCCESS: i32 = 0;

/// Wire shape `{status, message?, data?}`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Envelope<T = Value> {
    pub status: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self { status: SUCCESS, message: None, data: Some(data) }
    }

    pub fn is_success(&self) -> bool {
        self.status == SUCCESS
    }
}

/// Serialises `data` as `{"status":0,"data":<data>}`.
pub fn encode_success<T: Serialize + ?Sized>(data: &T) -> serde_json::Result<Vec<u8>> {
    #[derive(Serialize)]
    struct Success<'a, T: ?Sized> {
        status: i32,
        data: &'a T,
    }
    serde_json::to_vec(&Success { status: SUCCESS, data })
}

/// `{"status":0,"data":{}}`, written when a chain finishes without a response.
pub fn empty_success() -> Vec<u8> {
    br#"{"status":0,"data":{}}"#.to_vec()
}

// ── ErrorResponse ─────────────────────────────────────────────────────────────

/// Status used when an error is built with `0`, which would read as success.
pub const UNKNOWN_STATUS: i32 = -1;

const UNKNOWN_MESSAGE: &str = "unknown error";

/// An application-level failure returned by a handler.
///
/// Serialised as `{"status":<status>,"message":"<message>"}` and sent with
/// HTTP `200`: the failure lives in the payload, not the transport status.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(from = "RawError")]
pub struct ErrorResponse {
    status: i32,
    message: String,
}

/// Wire form of an [`ErrorResponse`]; decoding goes through
/// [`ErrorResponse::new`] so the invariants hold for parsed values too.
#[derive(Deserialize)]
struct RawError {
    #[serde(default)]
    status: i32,
    #[serde(default)]
    message: String,
}

impl From<RawError> for ErrorResponse {
    fn from(raw: RawError) -> Self {
        Self::new(raw.status, raw.message)
    }
}

impl ErrorResponse {
    /// Builds an error envelope. A `0` status becomes [`UNKNOWN_STATUS`] and an
    /// empty message becomes `"unknown error"`.
    pub fn new(status: i32, message: impl Into<String>) -> Self {
        let status = if status == SUCCESS { UNKNOWN_STATUS } else { status };
        let mut message = message.into();
        if message.is_empty() {
            message = UNKNOWN_MESSAGE.to_owned();
        }
        Self { status, message }
    }

    /// Wraps any displayable error under the given status code.
    pub fn from_error(status: i32, err: impl fmt::Display) -> Self {
        Self::new(status, err.to_string())
    }

    pub fn status(&self) -> i32 {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn encode(&self) -> Vec<u8> {
        // Two plain fields: serialisation cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {})", self.message, self.status)
    }
}

impl std::error::Error for ErrorResponse {}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn success_omits_message() {
        let bytes = encode_success(&json!({"text": "hi"})).unwrap();
        assert_eq!(bytes, br#"{"status":0,"data":{"text":"hi"}}"#);
    }

    #[test]
    fn empty_success_is_an_object() {
        let env: Envelope = serde_json::from_slice(&empty_success()).unwrap();
        assert!(env.is_success());
        assert_eq!(env.data, Some(json!({})));
        assert_eq!(env.message, None);
    }

    #[test]
    fn error_omits_data() {
        let err = ErrorResponse::new(1001, "name is required");
        assert_eq!(err.encode(), br#"{"status":1001,"message":"name is required"}"#);
    }

    #[test]
    fn error_never_reads_as_success() {
        let err = ErrorResponse::new(0, "");
        assert_eq!(err.status(), UNKNOWN_STATUS);
        assert_eq!(err.message(), "unknown error");
    }

    #[test]
    fn decoded_error_never_reads_as_success() {
        let err: ErrorResponse = serde_json::from_str(r#"{"status":0,"message":""}"#).unwrap();
        assert_eq!(err, ErrorResponse::new(UNKNOWN_STATUS, "unknown error"));

        let err: ErrorResponse = serde_json::from_str(r#"{"status":42,"message":"busy"}"#).unwrap();
        assert_eq!(err.status(), 42);
        assert_eq!(err.message(), "busy");
    }

    #[test]
    fn from_error_uses_display() {
        let io = std::io::Error::other("disk on fire");
        let err = ErrorResponse::from_error(7, io);
        assert_eq!(err.message(), "disk on fire");
        assert_eq!(err.to_string(), "disk on fire (status 7)");
    }

    #[test]
    fn decodes_error_envelope() {
        let env: Envelope = serde_json::from_str(r#"{"status":3,"message":"nope"}"#).unwrap();
        assert!(!env.is_success());
        assert_eq!(env.message.as_deref(), Some("nope"));
        assert!(env.data.is_none());
    }
}
