//! In-memory `multipart/form-data` writer.
//!
//! Text fields are written without a part `Content-Type`; file parts carry
//! their file name and `application/octet-stream`.

use uuid::Uuid;

#[derive(Debug)]
pub(crate) struct Form {
    boundary: String,
    parts: Vec<Part>,
}

#[derive(Debug)]
struct Part {
    name: String,
    file_name: Option<String>,
    data: Vec<u8>,
}

impl Form {
    pub(crate) fn new() -> Self {
        Self {
            boundary: format!("apicall-{}", Uuid::new_v4().simple()),
            parts: Vec::new(),
        }
    }

    pub(crate) fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part {
            name: name.into(),
            file_name: None,
            data: value.into().into_bytes(),
        });
        self
    }

    pub(crate) fn file(mut self, name: impl Into<String>, file_name: impl Into<String>, data: Vec<u8>) -> Self {
        self.parts.push(Part {
            name: name.into(),
            file_name: Some(file_name.into()),
            data,
        });
        self
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Value for the request's `Content-Type` header.
    pub(crate) fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub(crate) fn into_body(self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(b"--");
            out.extend_from_slice(self.boundary.as_bytes());
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(part.headers().as_bytes());
            out.extend_from_slice(b"\r\n\r\n");
            out.extend_from_slice(&part.data);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"--");
        out.extend_from_slice(self.boundary.as_bytes());
        out.extend_from_slice(b"--\r\n");
        out
    }
}

impl Part {
    fn headers(&self) -> String {
        let mut header = format!("Content-Disposition: form-data; name=\"{}\"", escape_quotes(&self.name));
        if let Some(file_name) = &self.file_name {
            header.push_str(&format!("; filename=\"{}\"", escape_quotes(file_name)));
            header.push_str("\r\nContent-Type: application/octet-stream");
        }
        header
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}
