//! Executing a built `HttpRequest`.
//!
//! # Design
//! `Transport` is the I/O seam: the builder never talks to the network
//! itself. `UreqTransport` is the default, a stock `ureq` agent whose only
//! tweak is returning 4xx/5xx responses as data so the caller sees the
//! status code instead of an error.

use ureq::http;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes an `HttpRequest` and returns the fully read response.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by `ureq` with default settings.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Use a caller-configured agent, e.g. one with a proxy or timeouts.
    ///
    /// The agent should be built with `http_status_as_error(false)`,
    /// otherwise error statuses surface as `ApiError::Transport`.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn transport_error<E>(err: E) -> ApiError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ApiError::Transport(Box::new(err))
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut builder = http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let result = match &request.body {
            Some(body) => self.agent.run(builder.body(body.as_slice()).map_err(transport_error)?),
            None => self.agent.run(builder.body(()).map_err(transport_error)?),
        };
        let mut response = result.map_err(transport_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let bytes = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(transport_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}
