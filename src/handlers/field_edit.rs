use crate::{
    models::{error_reply, ErrorResponse, FieldEditResponse, RestoreFieldRequest, UpdateFieldRequest},
    state::AppState,
    utils::json_or_form::JsonOrForm,
};
use axum::{extract::State, http::StatusCode, Json};

/// Change one field of a document, keeping its old value for undo
pub async fn field_update(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<UpdateFieldRequest>,
) -> Result<(StatusCode, Json<FieldEditResponse>), (StatusCode, Json<ErrorResponse>)> {
    let value = state.edits.update(&request).await.map_err(error_reply)?;
    Ok((StatusCode::OK, Json(FieldEditResponse::success(value))))
}

/// Put back the value a field had before its last update
pub async fn field_restore(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<RestoreFieldRequest>,
) -> Result<(StatusCode, Json<FieldEditResponse>), (StatusCode, Json<ErrorResponse>)> {
    let value = state.edits.restore(&request).await.map_err(error_reply)?;
    Ok((StatusCode::OK, Json(FieldEditResponse::success(value))))
}
