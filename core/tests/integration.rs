//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives blocks from the
//! endpoint catalog over real HTTP with `UreqTransport`. Validates that
//! request building, the transport, and response parsing agree with an
//! actual server.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use ldapi_core::{
    catalog, execute, ApiClient, ApiError, Credentials, Params, RequestOptions, UreqTransport,
};
use serde_json::{json, Value};

const TOKEN: &str = "api-integration-token";

/// Serve the mock API from a background thread and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, TOKEN).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

/// Answer a single request with `status_line` and exactly `body`, then close.
fn serve_raw_once(status_line: &'static str, body: Vec<u8>) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let head = format!(
            "HTTP/1.1 {status_line}\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n",
            body.len()
        );
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(&body);
    });

    format!("http://{addr}")
}

fn inputs(entries: &[(&str, Option<Value>)]) -> Params {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn invoke(client: &ApiClient, block: &str, params: &Params) -> Result<Value, ApiError> {
    catalog::find(block)
        .unwrap_or_else(|| panic!("unknown block {block}"))
        .invoke(client, &UreqTransport::new(), params)
}

#[test]
fn block_lifecycle() {
    let base_url = start_server();
    let client = ApiClient::new(Credentials::new(TOKEN, Some(&base_url)).unwrap());

    // Step 1: no projects yet.
    let listed = invoke(&client, "listProjects", &inputs(&[("limit", Some(json!(10)))])).unwrap();
    assert_eq!(listed["totalCount"], 0);

    // Step 2: create a project; absent inputs never reach the body.
    let created = invoke(
        &client,
        "createProject",
        &inputs(&[
            ("key", Some(json!("mobile"))),
            ("name", Some(json!("Mobile"))),
            ("tags", None),
        ]),
    )
    .unwrap();
    assert_eq!(created["key"], "mobile");
    assert_eq!(created["tags"], json!([]));

    // Step 3: read it back through a rendered path.
    let project_path = inputs(&[("projectKey", Some(json!("mobile")))]);
    let fetched = invoke(&client, "getProject", &project_path).unwrap();
    assert_eq!(fetched, created);

    // Step 4: create a flag with an explicit null description.
    let flag = invoke(
        &client,
        "createFeatureFlag",
        &inputs(&[
            ("projectKey", Some(json!("mobile"))),
            ("key", Some(json!("dark-mode"))),
            ("name", Some(json!("Dark mode"))),
            ("description", Some(Value::Null)),
        ]),
    )
    .unwrap();
    assert_eq!(flag["key"], "dark-mode");
    assert_eq!(flag["description"], Value::Null);

    // Step 5: paged listing goes through the query string.
    let flags = invoke(
        &client,
        "listFeatureFlags",
        &inputs(&[("projectKey", Some(json!("mobile"))), ("limit", Some(json!(1)))]),
    )
    .unwrap();
    assert_eq!(flags["totalCount"], 1);
    assert_eq!(flags["items"][0]["name"], "Dark mode");

    // Step 6: delete answers 204, which becomes an empty object.
    let flag_path = inputs(&[
        ("projectKey", Some(json!("mobile"))),
        ("featureFlagKey", Some(json!("dark-mode"))),
    ]);
    let deleted = invoke(&client, "deleteFeatureFlag", &flag_path).unwrap();
    assert_eq!(deleted, json!({}));

    // Step 7: the flag is gone.
    let err = invoke(&client, "getFeatureFlag", &flag_path).unwrap_err();
    match err {
        ApiError::Request { status, body } => {
            assert_eq!(status, 404);
            let body: Value = serde_json::from_str(&body).unwrap();
            assert_eq!(body, json!({"code": "not_found", "message": "Unknown flag key"}));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Step 8: clean up the project.
    assert_eq!(invoke(&client, "deleteProject", &project_path).unwrap(), json!({}));
    let err = invoke(&client, "deleteProject", &project_path).unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[test]
fn execute_helper_talks_to_server() {
    let base_url = start_server();

    let identity = execute(
        TOKEN,
        Some(&format!("{base_url}/")),
        "/api/v2/caller-identity",
        &RequestOptions::get(),
    )
    .unwrap();
    assert_eq!(identity["authKind"], "token");

    let created = execute(
        TOKEN,
        Some(&base_url),
        "/api/v2/projects",
        &RequestOptions::post(json!({"key": "web", "name": "Web"})),
    )
    .unwrap();
    assert_eq!(created["name"], "Web");

    let conflict = execute(
        TOKEN,
        Some(&base_url),
        "/api/v2/projects",
        &RequestOptions::post(json!({"key": "web", "name": "Web"})),
    )
    .unwrap_err();
    assert_eq!(conflict.status(), Some(409));
}

#[test]
fn wrong_api_key_is_a_request_error() {
    let base_url = start_server();

    let err = execute(
        "api-wrong",
        Some(&base_url),
        "/api/v2/projects",
        &RequestOptions::get(),
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::Request { status: 401, .. }));
    assert!(err.body().unwrap().contains("unauthorized"));
}

#[test]
fn connection_refused_is_a_transport_error() {
    // Grab a free port, then release it so nothing is listening.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();

    let err = execute(
        TOKEN,
        Some(&format!("http://{addr}")),
        "/api/v2/projects",
        &RequestOptions::get(),
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
    assert_eq!(err.status(), None);
}

#[test]
fn large_success_body_is_returned_whole() {
    let name = "x".repeat(11 * 1024 * 1024);
    let body = format!(r#"{{"items":[{{"key":"big","name":"{name}"}}],"totalCount":1}}"#);
    let base_url = serve_raw_once("200 OK", body.into_bytes());

    let value = execute(
        TOKEN,
        Some(&base_url),
        "/api/v2/flags/default",
        &RequestOptions::get().with_query("expand", "evaluation"),
    )
    .unwrap();
    assert_eq!(value["totalCount"], 1);
    assert_eq!(value["items"][0]["name"].as_str().unwrap().len(), name.len());
}

#[test]
fn non_utf8_error_body_keeps_its_status() {
    let base_url = serve_raw_once("500 Internal Server Error", vec![0xff, 0xfe, b'x']);

    let err = execute(TOKEN, Some(&base_url), "/api/v2/flags/default", &RequestOptions::get())
        .unwrap_err();
    match err {
        ApiError::Request { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "\u{FFFD}\u{FFFD}x");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn non_utf8_success_body_is_a_decode_error() {
    let base_url = serve_raw_once("200 OK", vec![b'"', 0xff, b'"']);

    let err = execute(TOKEN, Some(&base_url), "/api/v2/members", &RequestOptions::get())
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode { status: 200, .. }), "got {err:?}");
}

#[test]
fn silent_server_hits_the_transport_timeout() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        // Accept and hold the connection without ever answering.
        let (_stream, _) = listener.accept().unwrap();
        std::thread::sleep(Duration::from_secs(30));
    });

    let client = ApiClient::new(Credentials::new(TOKEN, Some(&format!("http://{addr}"))).unwrap());
    let transport = UreqTransport::with_timeout(Duration::from_millis(300));

    let started = Instant::now();
    let err = client
        .execute(&transport, "/api/v2/projects", &RequestOptions::get())
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
    assert_eq!(err.status(), None);
    assert!(started.elapsed() < Duration::from_secs(10));
}
