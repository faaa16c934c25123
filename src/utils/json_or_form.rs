use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Form, Json,
};
use serde::de::DeserializeOwned;

use crate::models::{error_reply, ErrorResponse};
use crate::services::error::EditError;

/// Body extractor accepting either a JSON or a urlencoded form body.
/// The admin UI posts forms; scripts and tests usually post JSON.
pub struct JsonOrForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + 'static,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if content_type.starts_with("application/json") {
            let Json(payload) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| error_reply(EditError::Validation(e.body_text())))?;
            return Ok(Self(payload));
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(payload) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| error_reply(EditError::Validation(e.body_text())))?;
            return Ok(Self(payload));
        }

        Err(error_reply(EditError::Validation(format!(
            "Unsupported content type '{}'; send JSON or form data",
            content_type
        ))))
    }
}
