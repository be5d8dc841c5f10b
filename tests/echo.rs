//! Request reflection and middleware pipeline, end to end.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use httpbin::config::HttpBinConfig;
use httpbin::observability::Outcome;
use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn anything_reports_resolved_origin_for_every_method() {
    let server = common::spawn_default().await;
    let client = common::client();

    for method in ["GET", "POST", "PUT", "PATCH", "DELETE"] {
        let method = reqwest::Method::from_bytes(method.as_bytes()).unwrap();

        // no proxy headers: raw peer address
        let body: Value = client
            .request(method.clone(), server.url("/anything/x?y=1"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let origin = body["origin"].as_str().unwrap();
        assert!(origin.starts_with("127.0.0.1:"), "{}: {}", method, origin);

        let body: Value = client
            .request(method.clone(), server.url("/anything"))
            .header("X-Forwarded-For", " 203.0.113.9 , 10.0.0.1")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["origin"], "203.0.113.9");

        let body: Value = client
            .request(method.clone(), server.url("/anything"))
            .header("X-Forwarded-For", "203.0.113.9")
            .header("Fly-Client-IP", "198.51.100.4")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["origin"], "198.51.100.4");
    }

    server.shutdown.trigger();
}

#[tokio::test]
async fn post_json_round_trips() {
    let server = common::spawn_default().await;
    let client = common::client();

    let payloads = [
        json!({"a": 1, "b": [true, null, "x"]}),
        json!([1, 2, 3]),
        json!("just a string"),
        json!({"nested": {"deep": {"value": 1.5}}}),
    ];

    for payload in payloads {
        let body: Value = client
            .post(server.url("/post"))
            .json(&payload)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["json"], payload);
        assert_eq!(body["data"], serde_json::to_string(&payload).unwrap());
    }

    server.shutdown.trigger();
}

#[tokio::test]
async fn envelope_keeps_every_value() {
    let server = common::spawn_default().await;

    let body: Value = common::client()
        .get(server.url("/get?k=1&k=2"))
        .header("X-Multi", "one")
        .header("X-Multi", "two")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["args"]["k"], json!(["1", "2"]));
    assert_eq!(body["headers"]["X-Multi"], json!(["one", "two"]));
    assert_eq!(body["url"], server.url("/get?k=1&k=2"));

    server.shutdown.trigger();
}

#[tokio::test]
async fn form_post_is_parsed() {
    let server = common::spawn_default().await;

    let body: Value = common::client()
        .put(server.url("/put"))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("name=alice&tag=a&tag=b")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["form"]["name"], json!(["alice"]));
    assert_eq!(body["form"]["tag"], json!(["a", "b"]));
    assert_eq!(body["json"], Value::Null);

    server.shutdown.trigger();
}

#[tokio::test]
async fn oversized_body_is_rejected_before_the_handler() {
    let config = HttpBinConfig {
        max_body_size: 64,
        ..Default::default()
    };
    let server = common::spawn_server(config).await;

    let res = common::client()
        .post(server.url("/post"))
        .body(vec![b'x'; 1000])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 413);

    let res = common::client()
        .post(server.url("/post"))
        .body(vec![b'x'; 32])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    server.shutdown.trigger();
}

#[tokio::test]
async fn head_is_derived_from_get() {
    let server = common::spawn_default().await;

    let res = common::client().head(server.url("/get")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("content-length"));
    assert!(res.bytes().await.unwrap().is_empty());

    server.shutdown.trigger();
}

#[tokio::test]
async fn preflight_never_reaches_routes() {
    let server = common::spawn_default().await;

    let res = common::client()
        .request(reqwest::Method::OPTIONS, server.url("/status/500"))
        .header("Origin", "https://example.com")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()["access-control-allow-origin"],
        "https://example.com"
    );

    server.shutdown.trigger();
}

#[tokio::test]
async fn response_headers_are_set_from_query() {
    let server = common::spawn_default().await;

    let res = common::client()
        .get(server.url("/response-headers?X-Test=a&X-Test=b"))
        .send()
        .await
        .unwrap();
    let values: Vec<_> = res
        .headers()
        .get_all("x-test")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(values, vec!["a", "b"]);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["X-Test"], json!(["a", "b"]));

    server.shutdown.trigger();
}

#[tokio::test]
async fn observer_sees_every_request() {
    let seen: Arc<Mutex<Vec<Outcome>>> = Arc::default();
    let sink = seen.clone();
    let server = common::spawn_server_with(HttpBinConfig::default(), move |o: &Outcome| {
        sink.lock().unwrap().push(o.clone());
    })
    .await;
    let client = common::client();

    client.get(server.url("/get")).send().await.unwrap().bytes().await.unwrap();
    client.get(server.url("/status/404")).send().await.unwrap().bytes().await.unwrap();
    let streamed = client
        .get(server.url("/stream-bytes/300?chunk_size=100"))
        .send()
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(streamed.len(), 300);

    // the observer fires after the body completes, slightly after the client sees it
    tokio::time::sleep(Duration::from_millis(100)).await;

    let outcomes = seen.lock().unwrap();
    assert_eq!(outcomes.len(), 3);
    let by_path = |path: &str| {
        outcomes
            .iter()
            .find(|o| o.uri.path() == path)
            .cloned()
            .unwrap()
    };
    assert_eq!(by_path("/get").status.as_u16(), 200);
    assert_eq!(by_path("/status/404").status.as_u16(), 404);
    assert_eq!(by_path("/stream-bytes/300").size, 300);

    server.shutdown.trigger();
}

#[tokio::test]
async fn observer_records_short_circuited_requests_with_original_method() {
    let seen: Arc<Mutex<Vec<Outcome>>> = Arc::default();
    let sink = seen.clone();
    let config = HttpBinConfig {
        max_body_size: 16,
        ..Default::default()
    };
    let server = common::spawn_server_with(config, move |o: &Outcome| {
        sink.lock().unwrap().push(o.clone());
    })
    .await;
    let client = common::client();

    let res = client.head(server.url("/get")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let res = client
        .request(reqwest::Method::OPTIONS, server.url("/get"))
        .header("Origin", "https://example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let res = client
        .post(server.url("/status/200"))
        .body(vec![b'x'; 100])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 413);

    tokio::time::sleep(Duration::from_millis(100)).await;

    let outcomes = seen.lock().unwrap();
    let summary: Vec<(String, String, u16)> = outcomes
        .iter()
        .map(|o| (o.method.to_string(), o.uri.path().to_string(), o.status.as_u16()))
        .collect();
    assert_eq!(outcomes.len(), 3, "{:?}", summary);
    for expected in [
        ("HEAD", "/get", 200),
        ("OPTIONS", "/get", 200),
        ("POST", "/status/200", 413),
    ] {
        assert!(
            summary
                .iter()
                .any(|(m, p, s)| (m.as_str(), p.as_str(), *s) == expected),
            "missing {:?} in {:?}",
            expected,
            summary
        );
    }

    server.shutdown.trigger();
}
