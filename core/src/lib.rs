//! Convenience layer for one-shot HTTP calls with form-style bodies.
//!
//! # Overview
//! An `ApiRequest` names a url, method, content type, and body. `build`
//! encodes the body for the content type (JSON, URL-encoded, multipart, or
//! plain text) and produces a plain-data `HttpRequest`; `send` executes it
//! through a `Transport` and returns an `ApiResponse` with the raw body,
//! the status code, and JSON/XML decode helpers.
//!
//! # Design
//! - Building never touches the network, so every encoder is testable on
//!   its own and validation errors surface before any I/O.
//! - Body fields are a closed sum type; values with no form representation
//!   are rejected with an error naming their kind.
//! - The descriptor is immutable during `send`; the response carries the
//!   sent request and the original body for inspection.

mod encode;
pub mod error;
pub mod http;
mod multipart;
pub mod request;
pub mod response;
pub mod transport;
pub mod value;

pub use error::ApiError;
pub use http::{ContentType, HttpMethod, HttpRequest, HttpResponse};
pub use request::{ApiRequest, RequestOptions};
pub use response::ApiResponse;
pub use transport::{Transport, UreqTransport};
pub use value::{Body, FieldValue, FormFile};
