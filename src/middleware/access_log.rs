//! One `REQ` line per request.
//!
//! ```text
//! REQ <ip> <YYYY/MM/DD> <HH:MM:SS> <latency ms> <method> <path?query> <trace id> <uuid> """<request body>""" """<response body>"""
//! ```
//!
//! Empty fields print as `-`.

use std::time::Instant;

use crate::context::Context;
use crate::handler::HandlerResult;

/// Header carrying the caller's trace id.
pub const TRACE_ID_HEADER: &str = "kelp-traceid";

/// Header carrying the caller's device/user uuid.
pub const UUID_HEADER: &str = "uuid";

const MAX_LOGGED_RESPONSE: usize = 500;
const LOGGED_RESPONSE_HEAD: usize = 100;

/// Times the rest of the chain and logs the request with its outcome.
pub fn access_log(c: &mut Context) -> HandlerResult {
    let start = Instant::now();
    let ip = client_ip(c);

    c.next();

    let latency = start.elapsed().as_millis();
    let now = chrono::Local::now().format("%Y/%m/%d %H:%M:%S").to_string();
    let method = c.method().to_string();
    let path = match c.request().query() {
        Some(q) if !q.is_empty() => format!("{}?{}", c.path(), q),
        _ => c.path().to_owned(),
    };
    let trace_id = dash(c.header(TRACE_ID_HEADER)).to_owned();
    let uuid = dash(c.header(UUID_HEADER)).to_owned();
    let response = summarize(c.pending_body());
    let request = String::from_utf8_lossy(c.body()).into_owned();

    c.logger().req(&[
        &ip,
        &now,
        &latency,
        &method,
        &path,
        &trace_id,
        &uuid,
        &format!(r#""""{}""""#, dash(&request)),
        &format!(r#""""{}""""#, dash(&response)),
    ]);
    Ok(())
}

/// First `X-Forwarded-For` hop, else `X-Real-Ip`, else the peer address.
fn client_ip(c: &Context) -> String {
    let forwarded = c.header("x-forwarded-for").split(',').next().unwrap_or("").trim();
    if !forwarded.is_empty() {
        return forwarded.to_owned();
    }
    let real_ip = c.header("x-real-ip");
    if !real_ip.is_empty() {
        return real_ip.to_owned();
    }
    c.remote_addr().map_or_else(|| "-".to_owned(), |addr| addr.ip().to_string())
}

fn summarize(body: &[u8]) -> String {
    if body.len() > MAX_LOGGED_RESPONSE {
        format!(
            "response is too large (with {} bytes, head is {}...)",
            body.len(),
            String::from_utf8_lossy(&body[..LOGGED_RESPONSE_HEAD]),
        )
    } else {
        String::from_utf8_lossy(body).into_owned()
    }
}

fn dash(v: &str) -> &str {
    if v.is_empty() { "-" } else { v }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_bodies_are_logged_verbatim() {
        assert_eq!(summarize(br#"{"status":0}"#), r#"{"status":0}"#);
        assert_eq!(summarize(&[b'a'; 500]), "a".repeat(500));
    }

    #[test]
    fn long_bodies_are_summarized() {
        let line = summarize(&[b'x'; 501]);
        assert_eq!(
            line,
            format!("response is too large (with 501 bytes, head is {}...)", "x".repeat(100)),
        );
    }

    #[test]
    fn empty_values_print_as_dash() {
        assert_eq!(dash(""), "-");
        assert_eq!(dash("abc"), "abc");
    }
}
