use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo, XML_DOCUMENT};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str, content_type: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, content_type)
        .body(body.to_string())
        .unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_reflects_json_post() {
    let resp = app()
        .oneshot(request("POST", "/echo", "application/json", r#"{"a":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.path, "/echo");
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    assert_eq!(echo.body, r#"{"a":1}"#);
    assert!(echo.query.is_none());
}

#[tokio::test]
async fn echo_reflects_query_string() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/echo?tags%5B%5D=a&tags%5B%5D=b")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.query.as_deref(), Some("tags%5B%5D=a&tags%5B%5D=b"));
    assert!(echo.body.is_empty());
}

#[tokio::test]
async fn echo_accepts_patch_and_delete() {
    for method in ["PATCH", "DELETE"] {
        let resp = app()
            .oneshot(request(method, "/echo", "text/plain", "x"))
            .await
            .unwrap();
        let echo: Echo = body_json(resp).await;
        assert_eq!(echo.method, method);
    }
}

#[tokio::test]
async fn echo_reports_authorization() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/echo")
                .header(http::header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.authorization.as_deref(), Some("Basic dXNlcjpwYXNz"));
}

// --- xml ---

#[tokio::test]
async fn xml_serves_document() {
    let resp = app()
        .oneshot(Request::builder().uri("/xml").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "application/xml");
    assert_eq!(body_bytes(resp).await, XML_DOCUMENT.as_bytes());
}

// --- status ---

#[tokio::test]
async fn status_returns_requested_code() {
    let resp = app()
        .oneshot(request("POST", "/status/418", "text/plain", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn status_rejects_invalid_code() {
    let resp = app()
        .oneshot(Request::builder().uri("/status/42").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
