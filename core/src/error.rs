//! Error types for building, sending, and decoding requests.
//!
//! # Design
//! One enum covers the whole lifecycle of a call so callers can match on the
//! phase that failed: descriptor configuration, body shape, individual field
//! values, transport, and result decoding. Nothing is logged or swallowed
//! here; every failure is handed back to the caller.

use std::io;

use thiserror::Error;

/// Errors returned by `ApiRequest` and `ApiResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The url, method, or content type was left empty.
    #[error("{field} is required")]
    Missing { field: &'static str },

    /// The method is not one of GET, POST, PUT, PATCH, DELETE.
    #[error("method {0} is not supported")]
    UnsupportedMethod(String),

    /// The content type is not one of the four supported encodings.
    #[error("content type {0} is not supported")]
    UnsupportedContentType(String),

    /// The body has the wrong overall shape for the content type, e.g. a
    /// plain string sent as a URL-encoded form.
    #[error("{content_type} body must be {expected}")]
    InvalidBody {
        content_type: &'static str,
        expected: &'static str,
    },

    /// A body field holds a value kind the encoder cannot represent.
    #[error("field `{field}`: {type_name} is not supported")]
    UnsupportedValue { field: String, type_name: String },

    /// A file attachment could not be read.
    #[error("failed to read file {name}")]
    File {
        name: String,
        #[source]
        source: io::Error,
    },

    /// The body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The form pairs could not be URL-encoded.
    #[error("url encoding failed: {0}")]
    Encoding(#[from] serde_urlencoded::ser::Error),

    /// The HTTP client failed before a response was available.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The response body is not valid JSON for the requested type.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// The response body is not valid XML for the requested type.
    #[error("xml deserialization failed: {0}")]
    Xml(#[from] quick_xml::DeError),
}

impl ApiError {
    /// True for errors raised while validating or encoding, before any I/O.
    pub fn is_request_error(&self) -> bool {
        !matches!(
            self,
            ApiError::Transport(_) | ApiError::Deserialization(_) | ApiError::Xml(_)
        )
    }
}
