use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::services::document_store::FilteredDocuments;

/// Request for the documents of a collection
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoadDocumentsRequest {
    pub collection: Option<String>,
}

/// Documents of a collection keyed by document id, each reduced to its editable fields
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentsResponse {
    pub status: String,
    #[schema(value_type = Object)]
    pub documents: FilteredDocuments,
}

/// Top-level collection names
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CollectionsResponse {
    pub status: String,
    pub collections: Vec<String>,
}
