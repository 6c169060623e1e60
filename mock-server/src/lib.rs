use axum::{
    body::Bytes,
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What the server saw, returned by `/echo`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

/// Document served by `/xml`.
pub const XML_DOCUMENT: &str =
    "<item><id>7</id><name>widget</name><tags><tag>a</tag><tag>b</tag></tags></item>";

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/xml", get(xml))
        .route("/status/{code}", any(status))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let echo = Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        content_type: header_str(header::CONTENT_TYPE),
        authorization: header_str(header::AUTHORIZATION),
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    tracing::debug!(method = %echo.method, path = %echo.path, body_len = echo.body.len(), "echo");
    Json(echo)
}

async fn xml() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/xml")], XML_DOCUMENT)
}

async fn status(Path(code): Path<u16>) -> Result<StatusCode, StatusCode> {
    StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)
}
