use crate::{
    models::{error_reply, CollectionsResponse, DocumentsResponse, ErrorResponse, LoadDocumentsRequest},
    services::{document_store::require_segment, error::EditError},
    state::AppState,
    utils::json_or_form::JsonOrForm,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

/// Documents of a collection with their editable fields (GET with a query string)
pub async fn load_documents_query(
    State(state): State<AppState>,
    Query(request): Query<LoadDocumentsRequest>,
) -> Result<(StatusCode, Json<DocumentsResponse>), (StatusCode, Json<ErrorResponse>)> {
    load(&state, request).await.map_err(error_reply)
}

/// Documents of a collection with their editable fields (POST with a body)
pub async fn load_documents(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<LoadDocumentsRequest>,
) -> Result<(StatusCode, Json<DocumentsResponse>), (StatusCode, Json<ErrorResponse>)> {
    load(&state, request).await.map_err(error_reply)
}

async fn load(
    state: &AppState,
    request: LoadDocumentsRequest,
) -> Result<(StatusCode, Json<DocumentsResponse>), EditError> {
    let collection = require_segment("collection", request.collection.as_deref())?;

    let documents = state.store.get_filtered_documents(&collection).await?;
    if documents.is_empty() {
        return Err(EditError::NotFound(format!(
            "No documents with editable fields found in collection '{}'",
            collection
        )));
    }

    Ok((StatusCode::OK, Json(DocumentsResponse {
        status: "success".to_string(),
        documents,
    })))
}

/// Names of the top-level collections, for the collection picker
pub async fn list_collections(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CollectionsResponse>), (StatusCode, Json<ErrorResponse>)> {
    let collections = state.store.list_collections().await.map_err(error_reply)?;
    Ok((StatusCode::OK, Json(CollectionsResponse {
        status: "success".to_string(),
        collections,
    })))
}
