//! Body encoders for the JSON, URL-encoded, and plain text content types.
//!
//! Multipart lives in its own module; it shares `form_fields` with the
//! URL-encoded encoder so both name array and map fields the same way.

use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::multipart::Form;
use crate::value::{Body, FieldValue};

/// A flattened form field: either a text value or a file attachment.
pub(crate) enum FormEntry<'a> {
    Text(String, String),
    File(String, &'a crate::value::FormFile),
}

/// Field name for one element of an array value.
fn element_name(name: &str, array_suffix: bool) -> String {
    if array_suffix {
        format!("{name}[]")
    } else {
        name.to_string()
    }
}

fn format_float(v: f64) -> String {
    format!("{v:.6}")
}

/// Render a non-file value as text pairs. Returns false when the value kind
/// has no form representation.
fn text_entries(
    name: &str,
    value: &FieldValue,
    array_suffix: bool,
    skip_empty: bool,
    out: &mut Vec<(String, String)>,
) -> bool {
    match value {
        FieldValue::Str(s) => {
            if !(skip_empty && s.is_empty()) {
                out.push((name.to_string(), s.clone()));
            }
        }
        FieldValue::StrList(items) => {
            for s in items {
                out.push((element_name(name, array_suffix), s.clone()));
            }
        }
        FieldValue::Int(n) => out.push((name.to_string(), n.to_string())),
        FieldValue::IntList(items) => {
            for n in items {
                out.push((element_name(name, array_suffix), n.to_string()));
            }
        }
        FieldValue::Uint(n) => out.push((name.to_string(), n.to_string())),
        FieldValue::UintList(items) => {
            for n in items {
                out.push((element_name(name, array_suffix), n.to_string()));
            }
        }
        FieldValue::Float(v) => out.push((name.to_string(), format_float(*v))),
        FieldValue::Map(map) => {
            for (key, v) in map {
                out.push((format!("{name}[{key}]"), v.clone()));
            }
        }
        // JSON strings, numbers, homogeneous arrays and flat objects render
        // like their native counterparts.
        FieldValue::Json(json) => match FieldValue::from(json.clone()) {
            FieldValue::Json(_) => return false,
            native => return text_entries(name, &native, array_suffix, skip_empty, out),
        },
        FieldValue::File(_) | FieldValue::FileList(_) | FieldValue::Bool(_) => return false,
    }
    true
}

/// Flatten a field map into form entries.
///
/// `skip_empty` drops empty strings and empty arrays, which the URL-encoded
/// form does and multipart does not. Files are only accepted when
/// `allow_files` is set.
pub(crate) fn form_fields(
    fields: &BTreeMap<String, FieldValue>,
    array_suffix: bool,
    skip_empty: bool,
    allow_files: bool,
) -> Result<Vec<FormEntry<'_>>, ApiError> {
    let mut out = Vec::new();
    for (name, value) in fields {
        match value {
            FieldValue::File(file) if allow_files => {
                out.push(FormEntry::File(name.clone(), file));
            }
            FieldValue::FileList(files) if allow_files => {
                for file in files {
                    out.push(FormEntry::File(element_name(name, array_suffix), file));
                }
            }
            other => {
                let mut texts = Vec::new();
                if !text_entries(name, other, array_suffix, skip_empty, &mut texts) {
                    return Err(ApiError::UnsupportedValue {
                        field: name.clone(),
                        type_name: other.type_name().to_string(),
                    });
                }
                out.extend(texts.into_iter().map(|(n, v)| FormEntry::Text(n, v)));
            }
        }
    }
    Ok(out)
}

/// Serialize the body as JSON. Empty bodies produce no payload.
pub(crate) fn encode_json(body: Option<&Body>) -> Result<Option<Vec<u8>>, ApiError> {
    let Some(body) = body.filter(|b| !b.is_empty()) else {
        return Ok(None);
    };
    let bytes = match body {
        Body::Fields(fields) => {
            if let Some((name, value)) = fields.iter().find(|(_, v)| v.is_file()) {
                return Err(ApiError::UnsupportedValue {
                    field: name.clone(),
                    type_name: value.type_name().to_string(),
                });
            }
            serde_json::to_vec(fields)
        }
        Body::Json(value) => serde_json::to_vec(value),
        Body::Text(text) => serde_json::to_vec(text),
    }
    .map_err(ApiError::Serialization)?;
    Ok(Some(bytes))
}

/// Encode the body as `application/x-www-form-urlencoded` pairs.
///
/// Returns the encoded string, empty when there is nothing to send.
pub(crate) fn encode_urlencoded(body: Option<&Body>, array_suffix: bool) -> Result<String, ApiError> {
    let Some(body) = body.filter(|b| !b.is_empty()) else {
        return Ok(String::new());
    };
    let fields = body.to_fields().ok_or(ApiError::InvalidBody {
        content_type: "application/x-www-form-urlencoded",
        expected: "a field map",
    })?;

    let pairs: Vec<(String, String)> = form_fields(&fields, array_suffix, true, false)?
        .into_iter()
        .filter_map(|entry| match entry {
            FormEntry::Text(name, value) => Some((name, value)),
            FormEntry::File(..) => None,
        })
        .collect();
    Ok(serde_urlencoded::to_string(pairs)?)
}

/// Encode the body as `multipart/form-data`.
///
/// Returns the payload (none when there are no fields) and the
/// boundary-carrying content type header.
pub(crate) fn encode_multipart(
    body: Option<&Body>,
    array_suffix: bool,
) -> Result<(Option<Vec<u8>>, String), ApiError> {
    let mut form = Form::new();
    if let Some(body) = body.filter(|b| !b.is_empty()) {
        let fields = body.to_fields().ok_or(ApiError::InvalidBody {
            content_type: "multipart/form-data",
            expected: "a field map",
        })?;
        for entry in form_fields(&fields, array_suffix, false, true)? {
            form = match entry {
                FormEntry::Text(name, value) => form.text(name, value),
                FormEntry::File(name, file) => form.file(name, file.file_name(), file.read()?.into_owned()),
            };
        }
    }
    let content_type = form.content_type();
    let payload = if form.is_empty() { None } else { Some(form.into_body()) };
    Ok((payload, content_type))
}

/// The text encoder sends a string body verbatim. A JSON string counts as
/// a string body.
pub(crate) fn encode_text(body: Option<&Body>) -> Result<Option<Vec<u8>>, ApiError> {
    match body.filter(|b| !b.is_empty()) {
        None => Ok(None),
        Some(Body::Text(text)) | Some(Body::Json(serde_json::Value::String(text))) => {
            Ok(Some(text.clone().into_bytes()))
        }
        Some(_) => Err(ApiError::InvalidBody {
            content_type: "text/plain",
            expected: "a string",
        }),
    }
}
