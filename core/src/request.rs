//! Request descriptor and builder.
//!
//! # Design
//! `ApiRequest` is plain configuration: url, method, content type, body,
//! headers, credentials, and encoding options. `build` turns it into an
//! `HttpRequest` without touching the network, and `send` hands that request
//! to a `Transport`. The descriptor is never mutated by either call, so the
//! same value can be built or sent again.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::encode::{encode_json, encode_multipart, encode_text, encode_urlencoded};
use crate::error::ApiError;
use crate::http::{ContentType, HttpMethod, HttpRequest};
use crate::response::ApiResponse;
use crate::transport::{Transport, UreqTransport};
use crate::value::{Body, FieldValue};

/// Encoding options. Deserializable so hosts can keep them in their own
/// configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// Name array elements `field[]` instead of repeating `field`.
    pub array_suffix: bool,
    /// Send the body of a GET request declared as JSON as URL-encoded query
    /// parameters instead.
    pub json_get_as_query: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            array_suffix: false,
            json_get_as_query: true,
        }
    }
}

/// Describes one HTTP call.
///
/// Method and content type are kept as given and validated by `build`, so
/// values read from untyped sources get the same errors as typed ones.
#[derive(Debug, Clone, Default)]
pub struct ApiRequest {
    url: String,
    method: String,
    content_type: String,
    body: Option<Body>,
    headers: Vec<(String, String)>,
    credentials: Option<(String, String)>,
    options: RequestOptions,
}

impl ApiRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn method(mut self, method: impl AsRef<str>) -> Self {
        self.method = method.as_ref().to_string();
        self
    }

    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.content_type = content_type.as_ref().to_string();
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add one named field. A body that is not already a field map is
    /// replaced by one.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let mut fields = match self.body.take() {
            Some(Body::Fields(fields)) => fields,
            _ => BTreeMap::new(),
        };
        fields.insert(name.into(), value.into());
        self.body = Some(Body::Fields(fields));
        self
    }

    /// Add an extra header. A later header with the same name (ignoring
    /// case) replaces the earlier one.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    pub fn array_suffix(mut self, enabled: bool) -> Self {
        self.options.array_suffix = enabled;
        self
    }

    pub fn json_get_as_query(mut self, enabled: bool) -> Self {
        self.options.json_get_as_query = enabled;
        self
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn get_body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Validate the descriptor and encode it into an `HttpRequest`.
    pub fn build(&self) -> Result<HttpRequest, ApiError> {
        if self.url.is_empty() {
            return Err(ApiError::Missing { field: "url" });
        }
        if self.method.is_empty() {
            return Err(ApiError::Missing { field: "method" });
        }
        if self.content_type.is_empty() {
            return Err(ApiError::Missing { field: "content type" });
        }
        let method: HttpMethod = self.method.parse()?;
        let mut content_type: ContentType = self.content_type.parse()?;

        if method == HttpMethod::Get && content_type == ContentType::Json && self.options.json_get_as_query {
            trace!(url = %self.url, "encoding GET json body as query parameters");
            content_type = ContentType::UrlEncoded;
        }

        let body = self.body.as_ref();
        let mut request = HttpRequest::new(method, self.url.clone());
        let mut multipart_header = None;

        match content_type {
            ContentType::Json => request.body = encode_json(body)?,
            ContentType::UrlEncoded => {
                let encoded = encode_urlencoded(body, self.options.array_suffix)?;
                if !encoded.is_empty() {
                    if method == HttpMethod::Get {
                        request.url = append_query(&self.url, &encoded);
                    } else {
                        request.body = Some(encoded.into_bytes());
                    }
                }
            }
            ContentType::Multipart => {
                let (payload, header) = encode_multipart(body, self.options.array_suffix)?;
                request.body = payload;
                multipart_header = Some(header);
            }
            ContentType::Text => request.body = encode_text(body)?,
        }

        if content_type != ContentType::Multipart {
            request.set_header("content-type", content_type.as_str());
        }
        if let Some((username, password)) = &self.credentials {
            request.set_header("authorization", basic_auth_value(username, password));
        }
        for (name, value) in &self.headers {
            request.set_header(name.as_str(), value.as_str());
        }
        // The boundary must match the payload, so it wins over caller headers.
        if let Some(header) = multipart_header {
            request.set_header("content-type", header);
        }

        debug!(
            method = %method,
            url = %request.url,
            content_type = %content_type,
            payload_len = request.body.as_ref().map_or(0, Vec::len),
            "built request"
        );
        Ok(request)
    }

    /// Build and execute the request with a default `ureq` transport.
    pub fn send(&self) -> Result<ApiResponse, ApiError> {
        self.send_with(&UreqTransport::new())
    }

    /// Build and execute the request with the given transport.
    pub fn send_with<T: Transport + ?Sized>(&self, transport: &T) -> Result<ApiResponse, ApiError> {
        let request = self.build()?;
        let response = transport.execute(&request)?;
        debug!(
            status = response.status,
            body_len = response.body.len(),
            url = %request.url,
            "received response"
        );
        Ok(ApiResponse::new(request, response, self.body.clone()))
    }
}

fn append_query(url: &str, query: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

fn basic_auth_value(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::Cell;

    /// Counts calls and answers every request with `{"ok":true}`.
    #[derive(Default)]
    struct Recorder {
        calls: Cell<usize>,
    }

    impl Transport for Recorder {
        fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.calls.set(self.calls.get() + 1);
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: r#"{"ok":true}"#.to_string(),
            })
        }
    }

    fn post_json() -> ApiRequest {
        ApiRequest::new("http://localhost:3000/items")
            .method(HttpMethod::Post)
            .content_type(ContentType::Json)
    }

    #[test]
    fn missing_parts_fail_before_transport() {
        let recorder = Recorder::default();
        let cases = [
            (post_json().content_type(""), "content type"),
            (post_json().method(""), "method"),
            (ApiRequest::new("").method("POST").content_type("text/plain"), "url"),
        ];
        for (request, field) in cases {
            let err = request.send_with(&recorder).unwrap_err();
            assert!(matches!(err, ApiError::Missing { field: f } if f == field), "{field}");
        }
        assert_eq!(recorder.calls.get(), 0);
    }

    #[test]
    fn unsupported_method_and_content_type() {
        let err = post_json().method("HEAD").build().unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedMethod(m) if m == "HEAD"));

        let err = post_json().content_type("application/xml").build().unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedContentType(_)));
    }

    #[test]
    fn json_post_sets_payload_and_header() {
        let req = post_json().field("name", "pen").field("qty", 3u8).build().unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"name": "pen", "qty": 3}));
    }

    #[test]
    fn empty_json_post_has_no_payload() {
        let req = post_json().build().unwrap();
        assert!(req.body.is_none());
        assert_eq!(req.url, "http://localhost:3000/items");
    }

    #[test]
    fn get_json_is_sent_as_query() {
        let req = ApiRequest::new("http://localhost:3000/search")
            .method("GET")
            .content_type("application/json")
            .body(json!({"q": "rust", "page": 2}))
            .build()
            .unwrap();
        assert_eq!(req.url, "http://localhost:3000/search?page=2&q=rust");
        assert!(req.body.is_none());
        assert_eq!(req.header("content-type"), Some("application/x-www-form-urlencoded"));
    }

    #[test]
    fn get_json_rewrite_can_be_disabled() {
        let req = ApiRequest::new("http://localhost:3000/search")
            .method("GET")
            .content_type("application/json")
            .json_get_as_query(false)
            .body(json!({"q": "rust"}))
            .build()
            .unwrap();
        assert_eq!(req.url, "http://localhost:3000/search");
        assert_eq!(req.body_str(), Some(r#"{"q":"rust"}"#));
    }

    #[test]
    fn get_query_extends_existing_query_string() {
        let req = ApiRequest::new("http://localhost:3000/search?lang=en")
            .method(HttpMethod::Get)
            .content_type(ContentType::UrlEncoded)
            .array_suffix(true)
            .field("tags", vec!["a", "b"])
            .build()
            .unwrap();
        assert_eq!(req.url, "http://localhost:3000/search?lang=en&tags%5B%5D=a&tags%5B%5D=b");
    }

    #[test]
    fn get_without_fields_leaves_url_alone() {
        let req = ApiRequest::new("http://localhost:3000/search")
            .method(HttpMethod::Get)
            .content_type(ContentType::UrlEncoded)
            .build()
            .unwrap();
        assert_eq!(req.url, "http://localhost:3000/search");
    }

    #[test]
    fn urlencoded_post_uses_payload() {
        let req = ApiRequest::new("http://localhost:3000/login")
            .method(HttpMethod::Post)
            .content_type(ContentType::UrlEncoded)
            .field("user", "ann")
            .build()
            .unwrap();
        assert_eq!(req.body_str(), Some("user=ann"));
    }

    #[test]
    fn text_body_accepts_json_string() {
        let req = ApiRequest::new("http://localhost:3000/notes")
            .method(HttpMethod::Post)
            .content_type(ContentType::Text)
            .body(json!("hello"))
            .build()
            .unwrap();
        assert_eq!(req.body_str(), Some("hello"));
        assert_eq!(req.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn basic_auth_and_extra_headers() {
        let req = post_json()
            .basic_auth("user", "pass")
            .header("X-Request-Id", "42")
            .header("x-request-id", "43")
            .header("Content-Type", "application/vnd.api+json")
            .build()
            .unwrap();
        assert_eq!(req.header("authorization"), Some("Basic dXNlcjpwYXNz"));
        assert_eq!(req.header("x-request-id"), Some("43"));
        assert_eq!(req.header("content-type"), Some("application/vnd.api+json"));
    }

    #[test]
    fn multipart_boundary_overrides_caller_header() {
        let req = ApiRequest::new("http://localhost:3000/upload")
            .method(HttpMethod::Put)
            .content_type(ContentType::Multipart)
            .header("content-type", "text/plain")
            .field("note", "hi")
            .build()
            .unwrap();
        let header = req.header("content-type").unwrap();
        assert!(header.starts_with("multipart/form-data; boundary="));
        let boundary = header.rsplit('=').next().unwrap();
        assert!(req.body_str().unwrap().contains(boundary));
    }

    #[test]
    fn unsupported_value_in_form() {
        let err = ApiRequest::new("http://localhost:3000/form")
            .method(HttpMethod::Post)
            .content_type(ContentType::UrlEncoded)
            .field("active", true)
            .build()
            .unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedValue { ref type_name, .. } if type_name == "bool"));
    }

    #[test]
    fn descriptor_is_reusable() {
        let request = post_json().field("a", 1i32);
        let recorder = Recorder::default();
        let first = request.send_with(&recorder).unwrap();
        let second = request.send_with(&recorder).unwrap();
        assert_eq!(first.request(), second.request());
        assert_eq!(recorder.calls.get(), 2);
        assert_eq!(first.original_body(), request.get_body());
        assert_eq!(first.json::<serde_json::Value>().unwrap(), json!({"ok": true}));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: RequestOptions = serde_json::from_str(r#"{"array_suffix":true}"#).unwrap();
        assert_eq!(
            options,
            RequestOptions {
                array_suffix: true,
                json_get_as_query: true,
            }
        );
    }
}
