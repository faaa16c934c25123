use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;

/// Any value a Firestore document field can hold
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Timestamp(String),
    String(String),
    Bytes(Vec<u8>),
    Reference(String),
    GeoPoint { latitude: f64, longitude: f64 },
    Array(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// The editable view of this value, if it has one
    pub fn as_scalar(&self) -> Option<ScalarValue> {
        match self {
            FieldValue::Integer(n) => Some(ScalarValue::Integer(*n)),
            FieldValue::String(s) => Some(ScalarValue::Text(s.clone())),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Integer(_) => "integer",
            FieldValue::Double(_) => "double",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::String(_) => "string",
            FieldValue::Bytes(_) => "bytes",
            FieldValue::Reference(_) => "reference",
            FieldValue::GeoPoint { .. } => "geo point",
            FieldValue::Array(_) => "array",
            FieldValue::Map(_) => "map",
        }
    }
}

impl From<ScalarValue> for FieldValue {
    fn from(value: ScalarValue) -> Self {
        match value {
            ScalarValue::Integer(n) => FieldValue::Integer(n),
            ScalarValue::Text(s) => FieldValue::String(s),
        }
    }
}

/// A field value the editor can show and change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ScalarValue {
    Integer(i64),
    Text(String),
}

impl ScalarValue {
    /// Convert submitted text to the same kind as `self`
    pub fn coerce(&self, input: &str) -> Option<ScalarValue> {
        match self {
            ScalarValue::Integer(_) => input.trim().parse::<i64>().ok().map(ScalarValue::Integer),
            ScalarValue::Text(_) => Some(ScalarValue::Text(input.to_string())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ScalarValue::Integer(_) => "integer",
            ScalarValue::Text(_) => "string",
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Integer(n) => write!(f, "{}", n),
            ScalarValue::Text(s) => write!(f, "{}", s),
        }
    }
}
