use utoipa::OpenApi;
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Document store is connected", body = HealthResponse),
        (status = 503, description = "Document store is not connected", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// Update one field of a document
#[utoipa::path(
    post,
    path = "/api/firestore/update",
    request_body(content = UpdateFieldRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Field updated", body = FieldEditResponse),
        (status = 400, description = "Missing or invalid parameters", body = ErrorResponse),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Document or field not found", body = ErrorResponse),
        (status = 500, description = "Value could not be converted or the store rejected the write", body = ErrorResponse),
        (status = 503, description = "Document store is not connected", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn field_update_doc() {}

/// Restore the previous value of a field
#[utoipa::path(
    post,
    path = "/api/firestore/restore",
    request_body(content = RestoreFieldRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Previous value written back", body = FieldEditResponse),
        (status = 400, description = "Missing or invalid parameters", body = ErrorResponse),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "No previous value recorded", body = ErrorResponse),
        (status = 500, description = "The store rejected the write", body = ErrorResponse),
        (status = 503, description = "Document store is not connected", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn field_restore_doc() {}

/// Load the editable documents of a collection
#[utoipa::path(
    get,
    path = "/api/firestore/documents",
    params(("collection" = String, Query, description = "Collection name")),
    responses(
        (status = 200, description = "Documents keyed by id", body = DocumentsResponse),
        (status = 400, description = "Missing collection", body = ErrorResponse),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "No documents with editable fields", body = ErrorResponse),
        (status = 503, description = "Document store is not connected", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn load_documents_doc() {}

/// List the top-level collections
#[utoipa::path(
    get,
    path = "/api/firestore/collections",
    responses(
        (status = 200, description = "Collection names", body = CollectionsResponse),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 503, description = "Document store is not connected", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn list_collections_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        field_update_doc,
        field_restore_doc,
        load_documents_doc,
        list_collections_doc,
    ),
    components(
        schemas(
            HealthResponse,
            UpdateFieldRequest,
            RestoreFieldRequest,
            FieldEditResponse,
            LoadDocumentsRequest,
            DocumentsResponse,
            CollectionsResponse,
            ErrorResponse,
            ScalarValue,
        )
    ),
    tags(
        (name = "firestore", description = "Document browsing and field editing")
    )
)]
pub struct ApiDoc;
