//! `ReqwestTransport` + `Executor` against a local wiremock server.

use perch_http::{
    BoundRequest, Executor, HttpError, HttpMethod, ReqwestTransport, RetryPolicy, Transport,
};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn url(server: &MockServer, rest: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), rest)).unwrap()
}

#[tokio::test]
async fn get_forwards_query_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/statuses/home_timeline.json"))
        .and(query_param("count", "5"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-ratelimit-remaining", "149")
                .set_body_string(r#"[{"id":1}]"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let request = BoundRequest::new(
        HttpMethod::Get,
        url(&server, "/1/statuses/home_timeline.json?count=5"),
    )
    .with_header("Authorization", "Bearer abc");

    let resp = transport.send(&request).await.unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, br#"[{"id":1}]"#);
    assert_eq!(resp.header("X-RateLimit-Remaining"), Some("149"));
}

#[tokio::test]
async fn post_sends_form_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/statuses/update.json"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("status=hello+world"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":7}"#))
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let request = BoundRequest::new(HttpMethod::Post, url(&server, "/1/statuses/update.json"))
        .with_header("Content-Type", "application/x-www-form-urlencoded")
        .with_body(b"status=hello+world".to_vec());

    let resp = transport.send(&request).await.unwrap();
    assert!(resp.is_success());
}

#[tokio::test]
async fn transport_reports_error_statuses_as_data() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(403).set_body_string(r#"{"error":"Forbidden"}"#))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let request = BoundRequest::new(HttpMethod::Delete, url(&server, "/1/blocks/destroy.json"));
    let resp = transport.send(&request).await.unwrap();
    assert_eq!(resp.status, 403);
}

#[tokio::test]
async fn executor_retries_listed_status_over_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let executor = Executor::new(
        Arc::new(ReqwestTransport::new().unwrap()),
        RetryPolicy::new(2, Duration::ZERO, [502]),
    );
    let resp = executor
        .execute(&BoundRequest::new(HttpMethod::Get, url(&server, "/1/help/test.json")))
        .await
        .unwrap();
    assert_eq!(resp.body, b"ok");
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    // Port 9 (discard) on localhost is almost never listening.
    let executor = Executor::new(
        Arc::new(
            ReqwestTransport::new()
                .unwrap()
                .with_timeout(Duration::from_secs(2)),
        ),
        RetryPolicy::default().with_retry_count(1),
    );
    let request = BoundRequest::new(
        HttpMethod::Get,
        Url::parse("http://127.0.0.1:9/1/help/test.json").unwrap(),
    );
    let err = executor.execute(&request).await.unwrap_err();
    assert!(matches!(err, HttpError::Network { attempts: 2, .. }));
}
