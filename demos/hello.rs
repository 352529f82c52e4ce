//! kelp demo: typed and context handlers, a guarded group, built-in middleware.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example hello
//!
//! Try:
//!   curl -X POST http://localhost:8080/hello -d '{"name":"Lywane","birthday":"1994-06-25"}'
//!   curl 'http://localhost:8080/hello?name=Lywane&birthday=1994-06-25'
//!   curl -X POST http://localhost:8080/api/thing -H 'authorization: alice' -d '{}'
//!   curl -i -X POST http://localhost:8080/api/thing            → 401

use kelp::logging::LogConfig;
use kelp::{Context, ErrorResponse, HandlerResult, Router, Server, StatusCode, middleware};
use serde::{Deserialize, Serialize};
use serde_json::json;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Default, Deserialize)]
#[serde(default)]
struct In {
    name: String,
    birthday: String,
}

#[derive(Default, Serialize)]
struct Out {
    text: String,
}

fn greeting(name: &str, birthday: &str) -> String {
    let today = chrono::Local::now().format(DATE_FORMAT);
    format!("Hello {name}, today is {today}, your birthday is {birthday}.")
}

// POST /hello: body decoded into `In`, `Out` sent back in the envelope.
fn hello_post(input: &In, out: &mut Out) -> HandlerResult {
    if input.name.is_empty() {
        return Err(ErrorResponse::new(1001, "name is required"));
    }
    out.text = greeting(&input.name, &input.birthday);
    Ok(())
}

// GET /hello: everything from the query string.
fn hello_get(c: &mut Context) -> HandlerResult {
    let text = greeting(c.query_param("name"), c.query_param("birthday"));
    c.respond_json(&json!({ "text": text }));
    Ok(())
}

// Stops the chain with 401 unless an authorization header is present.
fn auth(c: &mut Context) -> HandlerResult {
    let user = c.header("authorization").to_owned();
    if user.is_empty() {
        c.fail_with_status(StatusCode::UNAUTHORIZED);
        return Ok(());
    }
    c.set_metadata("user", user);
    c.next();
    Ok(())
}

// POST /api/thing
fn thing(_input: &serde_json::Value, out: &mut serde_json::Value, c: &mut Context) -> HandlerResult {
    *out = json!({ "owner": c.metadata("user") });
    Ok(())
}

#[tokio::main]
async fn main() {
    let _guard = LogConfig::new().init().expect("logging already initialised");

    let app = Router::new()
        .use_middleware(middleware::recovery)
        .use_middleware(middleware::access_log)
        .post("/hello", hello_post)
        .get("/hello", hello_get);

    app.group("/api").use_middleware(auth).post("/thing", thing);

    Server::bind("0.0.0.0:8080")
        .serve(app)
        .await
        .expect("server error");
}
