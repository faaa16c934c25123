use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::ScalarValue;

/// Request to change one field of a document
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateFieldRequest {
    pub collection: Option<String>,
    pub doc: Option<String>,
    pub field: Option<String>,
    /// New value, as a string or a number
    #[schema(value_type = Object)]
    pub value: Option<Value>,
}

/// Request to put back a field's previous value
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RestoreFieldRequest {
    pub collection: Option<String>,
    pub doc: Option<String>,
    pub field: Option<String>,
}

/// Response after a successful update or restore
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FieldEditResponse {
    /// Always "success"
    pub status: String,
    /// The value now stored in the field
    pub value: ScalarValue,
}

impl FieldEditResponse {
    pub fn success(value: ScalarValue) -> Self {
        Self { status: "success".to_string(), value }
    }
}
