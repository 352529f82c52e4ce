//! Panic recovery.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use http::StatusCode;

use crate::context::Context;
use crate::handler::HandlerResult;

/// Runs the rest of the chain and converts a panic into a bare `500` with an
/// `ERROR [panic] <message>` log line. The panic does not propagate.
pub fn recovery(c: &mut Context) -> HandlerResult {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| c.next())) {
        let message = panic_message(payload.as_ref());
        c.logger().error(&[&"[panic]", &message]);
        c.fail_with_status(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_str_and_string_payloads() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");

        let boxed: Box<dyn Any + Send> = Box::new(format!("code {}", 7));
        assert_eq!(panic_message(boxed.as_ref()), "code 7");

        let boxed: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
