//! Body model: the values a request body may carry.
//!
//! # Design
//! A body is either a map of named fields, a plain string, or an arbitrary
//! JSON document. Field values are a closed sum type over the kinds the form
//! encoders know how to render. `Bool` and `Json` exist so that values which
//! are perfectly valid JSON but have no form representation can still be
//! placed in a field map; the form encoders reject them with an error naming
//! the kind instead of dropping or coercing them.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::ser::{Error as _, Serialize, Serializer};

use crate::error::ApiError;

/// A single field of a form-shaped body.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    StrList(Vec<String>),
    Int(i64),
    IntList(Vec<i64>),
    Uint(u64),
    UintList(Vec<u64>),
    Float(f64),
    /// Rendered as `field[key]=value` pairs.
    Map(BTreeMap<String, String>),
    /// Multipart only.
    File(FormFile),
    /// Multipart only.
    FileList(Vec<FormFile>),
    Bool(bool),
    /// Any JSON value. Form encoders render strings, numbers, homogeneous
    /// arrays and flat string objects like the matching native variant and
    /// reject every other shape.
    Json(serde_json::Value),
}

impl FieldValue {
    /// Human readable name of the value kind, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Str(_) => "string",
            FieldValue::StrList(_) => "string array",
            FieldValue::Int(_) => "int",
            FieldValue::IntList(_) => "int array",
            FieldValue::Uint(_) => "uint",
            FieldValue::UintList(_) => "uint array",
            FieldValue::Float(_) => "float",
            FieldValue::Map(_) => "string map",
            FieldValue::File(_) => "file",
            FieldValue::FileList(_) => "file array",
            FieldValue::Bool(_) => "bool",
            FieldValue::Json(value) => json_type_name(value),
        }
    }

    pub(crate) fn is_file(&self) -> bool {
        matches!(self, FieldValue::File(_) | FieldValue::FileList(_))
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Str(v) => serializer.serialize_str(v),
            FieldValue::StrList(v) => v.serialize(serializer),
            FieldValue::Int(v) => serializer.serialize_i64(*v),
            FieldValue::IntList(v) => v.serialize(serializer),
            FieldValue::Uint(v) => serializer.serialize_u64(*v),
            FieldValue::UintList(v) => v.serialize(serializer),
            FieldValue::Float(v) if !v.is_finite() => {
                Err(S::Error::custom(format!("{v} cannot be represented in JSON")))
            }
            FieldValue::Float(v) => serializer.serialize_f64(*v),
            FieldValue::Map(v) => v.serialize(serializer),
            FieldValue::Bool(v) => serializer.serialize_bool(*v),
            FieldValue::Json(v) => v.serialize(serializer),
            FieldValue::File(_) | FieldValue::FileList(_) => Err(S::Error::custom(
                "file values can only be sent as multipart/form-data",
            )),
        }
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for FieldValue {
            fn from(v: $t) -> Self {
                FieldValue::Int(v as i64)
            }
        }

        impl From<Vec<$t>> for FieldValue {
            fn from(v: Vec<$t>) -> Self {
                FieldValue::IntList(v.into_iter().map(|n| n as i64).collect())
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for FieldValue {
            fn from(v: $t) -> Self {
                FieldValue::Uint(v as u64)
            }
        }

        impl From<Vec<$t>> for FieldValue {
            fn from(v: Vec<$t>) -> Self {
                FieldValue::UintList(v.into_iter().map(|n| n as u64).collect())
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64, isize);
from_unsigned!(u16, u32, u64, usize);

// `Vec<u8>` is left out so byte buffers are never mistaken for integer lists.
impl From<u8> for FieldValue {
    fn from(v: u8) -> Self {
        FieldValue::Uint(v as u64)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(v as f64)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::StrList(v)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(v: Vec<&str>) -> Self {
        FieldValue::StrList(v.into_iter().map(str::to_string).collect())
    }
}

impl From<BTreeMap<String, String>> for FieldValue {
    fn from(v: BTreeMap<String, String>) -> Self {
        FieldValue::Map(v)
    }
}

impl From<HashMap<String, String>> for FieldValue {
    fn from(v: HashMap<String, String>) -> Self {
        FieldValue::Map(v.into_iter().collect())
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<FormFile> for FieldValue {
    fn from(v: FormFile) -> Self {
        FieldValue::File(v)
    }
}

impl From<Vec<FormFile>> for FieldValue {
    fn from(v: Vec<FormFile>) -> Self {
        FieldValue::FileList(v)
    }
}

/// Maps JSON scalars, homogeneous arrays, and flat string objects onto the
/// matching variant. Anything else is kept as `Json` and rejected later by
/// the form encoders.
impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::String(s) => FieldValue::Str(s),
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    FieldValue::Uint(u)
                } else {
                    FieldValue::Float(n.as_f64().unwrap_or_default())
                }
            }
            Value::Array(items) => {
                if let Some(strings) = items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                {
                    FieldValue::StrList(strings)
                } else if let Some(ints) = items.iter().map(Value::as_i64).collect::<Option<Vec<_>>>() {
                    FieldValue::IntList(ints)
                } else if let Some(uints) = items.iter().map(Value::as_u64).collect::<Option<Vec<_>>>() {
                    FieldValue::UintList(uints)
                } else {
                    FieldValue::Json(Value::Array(items))
                }
            }
            Value::Object(map) => {
                let flat = map
                    .iter()
                    .map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect::<Option<BTreeMap<_, _>>>();
                match flat {
                    Some(flat) => FieldValue::Map(flat),
                    None => FieldValue::Json(Value::Object(map)),
                }
            }
            Value::Null => FieldValue::Json(Value::Null),
        }
    }
}

/// A file attachment for a multipart body.
///
/// The contents are either held in memory or read from disk when the request
/// is built, so a descriptor referencing a path stays cheap to clone.
#[derive(Debug, Clone, PartialEq)]
pub struct FormFile {
    file_name: String,
    source: FileSource,
}

#[derive(Debug, Clone, PartialEq)]
enum FileSource {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

impl FormFile {
    pub fn from_bytes(file_name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            source: FileSource::Bytes(contents.into()),
        }
    }

    /// The file name sent with the part is the path's final component.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        Self {
            file_name,
            source: FileSource::Path(path.to_path_buf()),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub(crate) fn read(&self) -> Result<Cow<'_, [u8]>, ApiError> {
        match &self.source {
            FileSource::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
            FileSource::Path(path) => fs::read(path).map(Cow::Owned).map_err(|source| ApiError::File {
                name: path.display().to_string(),
                source,
            }),
        }
    }
}

/// A request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Named fields; required by the URL-encoded and multipart encoders.
    Fields(BTreeMap<String, FieldValue>),
    /// Sent verbatim by the text encoder.
    Text(String),
    /// Any JSON document. An object is accepted wherever `Fields` is.
    Json(serde_json::Value),
}

impl Body {
    /// Empty bodies produce requests without a payload.
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Fields(fields) => fields.is_empty(),
            Body::Text(text) => text.is_empty(),
            Body::Json(serde_json::Value::String(text)) => text.is_empty(),
            Body::Json(value) => value.is_null(),
        }
    }

    /// View the body as a field map, converting a JSON object if needed.
    pub(crate) fn to_fields(&self) -> Option<Cow<'_, BTreeMap<String, FieldValue>>> {
        match self {
            Body::Fields(fields) => Some(Cow::Borrowed(fields)),
            Body::Json(serde_json::Value::Object(map)) => Some(Cow::Owned(
                map.iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from(v.clone())))
                    .collect(),
            )),
            _ => None,
        }
    }
}

impl From<BTreeMap<String, FieldValue>> for Body {
    fn from(v: BTreeMap<String, FieldValue>) -> Self {
        Body::Fields(v)
    }
}

impl From<&str> for Body {
    fn from(v: &str) -> Self {
        Body::Text(v.to_string())
    }
}

impl From<String> for Body {
    fn from(v: String) -> Self {
        Body::Text(v)
    }
}

impl From<serde_json::Value> for Body {
    fn from(v: serde_json::Value) -> Self {
        Body::Json(v)
    }
}
