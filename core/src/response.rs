//! The result of an executed request and its decode helpers.

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::value::Body;

/// Everything known about a finished request/response cycle.
///
/// Holds the request exactly as it was sent, the fully read response, and
/// the body the request was built from.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    request: HttpRequest,
    response: HttpResponse,
    original_body: Option<Body>,
}

impl ApiResponse {
    pub fn new(request: HttpRequest, response: HttpResponse, original_body: Option<Body>) -> Self {
        Self {
            request,
            response,
            original_body,
        }
    }

    pub fn status(&self) -> u16 {
        self.response.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.response.status)
    }

    /// The unparsed response body.
    pub fn raw(&self) -> &str {
        &self.response.body
    }

    /// Decode the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.response.body).map_err(ApiError::Deserialization)
    }

    /// Decode the response body as XML.
    pub fn xml<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(quick_xml::de::from_str(&self.response.body)?)
    }

    /// The request as it went out, including the final url and headers.
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn request_headers(&self) -> &[(String, String)] {
        &self.request.headers
    }

    pub fn original_body(&self) -> Option<&Body> {
        self.original_body.as_ref()
    }

    pub fn response(&self) -> &HttpResponse {
        &self.response
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.response.headers
    }
}
