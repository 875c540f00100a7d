#![allow(deprecated)]
use std::sync::Arc;

use cucumber::gherkin::Step;
use cucumber::{given, then, when};
use serde_json::Value;

use crate::TodosWorld;
use todos::clock::FixedClock;
use todos::web::{AppState, USER_ID_HEADER, create_router};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Start an in-process axum server over the world's temp database, pinned to
/// the world's clock. Binds to a random free port (port 0).
pub async fn start_test_server(world: &mut TodosWorld) -> u16 {
    let db_path = world
        .db_path
        .as_ref()
        .expect("db_path not set; did you forget 'Given a todo database is initialized'?")
        .clone();

    let db = todos::db::Database::open(&db_path).expect("failed to open database for web server");
    let clock = FixedClock::parse(&world.now).expect("world clock is not RFC 3339");
    let app = create_router(AppState::new(db, Arc::new(clock)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind to ephemeral port");
    let port = listener
        .local_addr()
        .expect("failed to get local addr")
        .port();

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("web server error in test");
    });

    world.server_port = Some(port);
    world.server_handle = Some(handle);

    // Poll until the server accepts connections (up to ~100 ms).
    for _ in 0..20 {
        if world
            .http_client
            .get(format!("http://127.0.0.1:{port}/health"))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    }

    port
}

/// Send a request as the named user (or anonymously) and record the status
/// and body on the world.
pub async fn http_send(
    world: &mut TodosWorld,
    actor: Option<&str>,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (u16, String) {
    let port = world
        .server_port
        .expect("server not started; add 'Given the API server is running'");
    let url = format!("http://127.0.0.1:{port}{path}");
    let method = reqwest::Method::from_bytes(method.as_bytes())
        .unwrap_or_else(|e| panic!("bad HTTP method {method}: {e}"));

    let mut req = world.http_client.request(method.clone(), &url);
    if let Some(name) = actor {
        req = req.header(USER_ID_HEADER, world.user_id(name).to_string());
    }
    if let Some(body) = body {
        req = req.json(&body);
    }
    let resp = req
        .send()
        .await
        .unwrap_or_else(|e| panic!("{method} {url} failed: {e}"));
    let status = resp.status().as_u16();
    let body_text = resp
        .text()
        .await
        .unwrap_or_else(|e| panic!("failed to read response body: {e}"));
    world.last_response_status = Some(status);
    world.last_response_body = Some(body_text.clone());
    (status, body_text)
}

/// Replace `{alias}` placeholders in a path with stored todo ids, and
/// `<name>` placeholders with user ids.
fn resolve_path(world: &TodosWorld, path: &str) -> String {
    let mut out = path.to_string();
    for (alias, id) in &world.todo_ids {
        out = out.replace(&format!("{{{alias}}}"), &id.to_string());
    }
    for (name, id) in &world.user_ids {
        out = out.replace(&format!("<{name}>"), &id.to_string());
    }
    out
}

fn parse_last_response(world: &TodosWorld) -> Value {
    let body = world
        .last_response_body
        .as_deref()
        .expect("no HTTP response body recorded");
    serde_json::from_str(body)
        .unwrap_or_else(|e| panic!("response body is not valid JSON: {e}\nbody: {body}"))
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

#[given("the API server is running")]
async fn the_api_server_is_running(world: &mut TodosWorld) {
    start_test_server(world).await;
}

#[when(expr = "{string} sends {word} {string}")]
async fn sends(world: &mut TodosWorld, actor: String, method: String, path: String) {
    let path = resolve_path(world, &path);
    http_send(world, Some(&actor), &method, &path, None).await;
}

/// The JSON body comes from the step's doc string.
#[when(expr = "{string} sends {word} {string} with body:")]
async fn sends_with_body(
    world: &mut TodosWorld,
    actor: String,
    method: String,
    path: String,
    step: &Step,
) {
    let path = resolve_path(world, &path);
    let raw = step.docstring.as_deref().expect("step has no doc string body");
    let body: Value = serde_json::from_str(raw)
        .unwrap_or_else(|e| panic!("step body is not valid JSON: {e}\n{raw}"));
    http_send(world, Some(&actor), &method, &path, Some(body)).await;
}

#[when(expr = "{string} sends {word} {string} with a {int} character title")]
async fn sends_long_title(
    world: &mut TodosWorld,
    actor: String,
    method: String,
    path: String,
    len: usize,
) {
    let path = resolve_path(world, &path);
    let body = serde_json::json!({ "title": "a".repeat(len) });
    http_send(world, Some(&actor), &method, &path, Some(body)).await;
}

#[when(expr = "an anonymous client sends {word} {string}")]
async fn anonymous_sends(world: &mut TodosWorld, method: String, path: String) {
    let path = resolve_path(world, &path);
    http_send(world, None, &method, &path, None).await;
}

#[when(expr = "a client claiming user id {int} sends {word} {string}")]
async fn unknown_user_sends(world: &mut TodosWorld, user_id: i64, method: String, path: String) {
    let port = world
        .server_port
        .expect("server not started; add 'Given the API server is running'");
    let method = reqwest::Method::from_bytes(method.as_bytes()).expect("bad HTTP method");
    let resp = world
        .http_client
        .request(method, format!("http://127.0.0.1:{port}{path}"))
        .header(USER_ID_HEADER, user_id.to_string())
        .send()
        .await
        .expect("request failed");
    world.last_response_status = Some(resp.status().as_u16());
    world.last_response_body = Some(resp.text().await.expect("failed to read body"));
}

#[then(expr = "the response status is {int}")]
async fn the_response_status_is(world: &mut TodosWorld, expected: u16) {
    let status = world
        .last_response_status
        .expect("no HTTP response status recorded");
    assert_eq!(
        status,
        expected,
        "unexpected status; body: {}",
        world.last_response_body.as_deref().unwrap_or_default()
    );
}

#[then(expr = "the response message is {string}")]
async fn the_response_message_is(world: &mut TodosWorld, message: String) {
    let json = parse_last_response(world);
    assert_eq!(json["message"], message.as_str(), "body: {json}");
}

#[then(expr = "the response message contains {string}")]
async fn the_response_message_contains(world: &mut TodosWorld, fragment: String) {
    let json = parse_last_response(world);
    let message = json["message"]
        .as_str()
        .unwrap_or_else(|| panic!("no message in {json}"));
    assert!(message.contains(&fragment), "message: {message}");
}

/// Compare the value at a JSON pointer (e.g. `/todo/user/id`) with `expected`,
/// which is parsed as JSON when possible and compared as a string otherwise.
#[then(expr = "the response field {string} is {string}")]
async fn the_response_field_is(world: &mut TodosWorld, pointer: String, expected: String) {
    let json = parse_last_response(world);
    let actual = json
        .pointer(&pointer)
        .unwrap_or_else(|| panic!("no field at {pointer} in {json}"));
    let expected = resolve_path(world, &expected);
    let expected: Value =
        serde_json::from_str(&expected).unwrap_or_else(|_| Value::String(expected.clone()));
    assert_eq!(actual, &expected, "body: {json}");
}

#[then(expr = "the response has {int} todos")]
async fn the_response_has_todos(world: &mut TodosWorld, n: usize) {
    let json = parse_last_response(world);
    let data = json["data"].as_array().expect("response has no data array");
    assert_eq!(data.len(), n, "body: {json}");
}

#[then("the response does not expose password hashes")]
async fn no_password_hashes(world: &mut TodosWorld) {
    let body = world
        .last_response_body
        .as_deref()
        .expect("no HTTP response body recorded");
    assert!(!body.contains("password"), "body leaks credentials: {body}");
}
