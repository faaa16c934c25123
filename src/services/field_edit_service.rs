use serde_json::Value;
use tracing::{debug, info};

use crate::models::{RestoreFieldRequest, ScalarValue, UpdateFieldRequest};
use crate::services::document_store::{DocumentStore, FieldRef};
use crate::services::error::EditError;
use crate::services::undo_slots::UndoSlots;

/// Single-field edits with a one-step undo
#[derive(Clone)]
pub struct FieldEditService {
    store: DocumentStore,
    undo: UndoSlots,
}

impl FieldEditService {
    pub fn new(store: DocumentStore) -> Self {
        Self { undo: UndoSlots::new(store.clone()), store }
    }

    /// Replace a field's value, remembering the old one.
    ///
    /// The submitted value is coerced to the kind the field currently holds. The old
    /// value goes to the undo slot in the same write as the new value, so a failed
    /// write leaves both the field and its slot as they were.
    pub async fn update(&self, request: &UpdateFieldRequest) -> Result<ScalarValue, EditError> {
        let target = FieldRef::new(
            request.collection.as_deref(),
            request.doc.as_deref(),
            request.field.as_deref(),
        )?;
        let input = submitted_text(request.value.as_ref())?;

        let current = self.store.read_field(&target).await?;
        let new_value = current.coerce(&input).ok_or_else(|| {
            debug!("Rejected value '{}' for {} field '{}'", input, current.kind(), target);
            EditError::TypeCoercion { value: input.clone(), expected: current.kind() }
        })?;

        self.undo.write_with_undo(&target, current, new_value.clone()).await?;

        info!("Updated '{}'", target);
        Ok(new_value)
    }

    /// Write the recorded previous value back. The slot is kept, so repeating a
    /// restore writes the same value again.
    pub async fn restore(&self, request: &RestoreFieldRequest) -> Result<ScalarValue, EditError> {
        let target = FieldRef::new(
            request.collection.as_deref(),
            request.doc.as_deref(),
            request.field.as_deref(),
        )?;

        let previous = self.undo.fetch(&target).await?;
        self.store.write_field(&target, previous.clone()).await?;

        info!("Restored '{}'", target);
        Ok(previous)
    }
}

/// Text form of the submitted value. Absent, null and fractional values are
/// rejected; an empty string or zero is a legal edit.
fn submitted_text(value: Option<&Value>) -> Result<String, EditError> {
    match value {
        None | Some(Value::Null) => Err(EditError::Validation("Missing required parameter 'value'".to_string())),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        Some(Value::Number(n)) => Err(EditError::Validation(format!(
            "Parameter 'value' must be an integer, got {}",
            n
        ))),
        Some(_) => Err(EditError::Validation(
            "Parameter 'value' must be a string or an integer".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;
    use crate::services::memory_backend::InMemoryBackend;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn setup() -> (Arc<InMemoryBackend>, FieldEditService) {
        let backend = Arc::new(InMemoryBackend::new());
        backend.insert_document(
            "users",
            "ada",
            BTreeMap::from([
                ("age".to_string(), FieldValue::Integer(30)),
                ("name".to_string(), FieldValue::String("Ada".into())),
                ("admin".to_string(), FieldValue::Boolean(true)),
            ]),
        );
        let service = FieldEditService::new(DocumentStore::new(backend.clone()));
        (backend, service)
    }

    fn update(field: &str, value: Value) -> UpdateFieldRequest {
        UpdateFieldRequest {
            collection: Some("users".into()),
            doc: Some("ada".into()),
            field: Some(field.into()),
            value: Some(value),
        }
    }

    fn restore(field: &str) -> RestoreFieldRequest {
        RestoreFieldRequest {
            collection: Some("users".into()),
            doc: Some("ada".into()),
            field: Some(field.into()),
        }
    }

    #[tokio::test]
    async fn edit_then_bad_edit_then_restore() {
        let (backend, service) = setup();

        let written = service.update(&update("age", json!("31"))).await.unwrap();
        assert_eq!(written, ScalarValue::Integer(31));
        assert_eq!(backend.field("users", "ada", "age"), Some(FieldValue::Integer(31)));
        assert_eq!(backend.field("users", "ada", "_previous_age"), Some(FieldValue::Integer(30)));

        let err = service.update(&update("age", json!("thirty"))).await.unwrap_err();
        assert!(matches!(err, EditError::TypeCoercion { expected: "integer", .. }));
        assert_eq!(backend.field("users", "ada", "age"), Some(FieldValue::Integer(31)));
        assert_eq!(backend.field("users", "ada", "_previous_age"), Some(FieldValue::Integer(30)));

        let restored = service.restore(&restore("age")).await.unwrap();
        assert_eq!(restored, ScalarValue::Integer(30));
        assert_eq!(backend.field("users", "ada", "age"), Some(FieldValue::Integer(30)));
    }

    #[tokio::test]
    async fn restore_brings_back_value_from_just_before_the_last_update() {
        let (backend, service) = setup();

        service.update(&update("name", json!("Ada L."))).await.unwrap();
        service.update(&update("name", json!("Ada Lovelace"))).await.unwrap();
        service.restore(&restore("name")).await.unwrap();

        assert_eq!(backend.field("users", "ada", "name"), Some(FieldValue::String("Ada L.".into())));
    }

    #[tokio::test]
    async fn repeated_restore_replays_the_same_value() {
        let (backend, service) = setup();

        service.update(&update("age", json!(40))).await.unwrap();
        service.restore(&restore("age")).await.unwrap();
        let first = backend.field("users", "ada", "age");
        service.restore(&restore("age")).await.unwrap();

        assert_eq!(first, Some(FieldValue::Integer(30)));
        assert_eq!(backend.field("users", "ada", "age"), first);
        assert_eq!(backend.field("users", "ada", "_previous_age"), Some(FieldValue::Integer(30)));
    }

    #[tokio::test]
    async fn restore_without_prior_update_is_not_found_and_writes_nothing() {
        let (backend, service) = setup();

        let err = service.restore(&restore("age")).await.unwrap_err();
        assert!(matches!(err, EditError::NotFound(_)));
        assert_eq!(backend.write_count(), 0);
        assert_eq!(backend.field("users", "ada", "age"), Some(FieldValue::Integer(30)));
    }

    #[tokio::test]
    async fn empty_string_and_zero_are_legal_values() {
        let (backend, service) = setup();

        service.update(&update("name", json!(""))).await.unwrap();
        service.update(&update("age", json!(0))).await.unwrap();

        assert_eq!(backend.field("users", "ada", "name"), Some(FieldValue::String(String::new())));
        assert_eq!(backend.field("users", "ada", "age"), Some(FieldValue::Integer(0)));
    }

    #[tokio::test]
    async fn numbers_submitted_to_text_fields_are_stored_as_text() {
        let (backend, service) = setup();

        service.update(&update("name", json!(42))).await.unwrap();
        assert_eq!(backend.field("users", "ada", "name"), Some(FieldValue::String("42".into())));
    }

    #[tokio::test]
    async fn fractional_numbers_are_rejected() {
        let (backend, service) = setup();

        for value in [json!(31.0), json!(1e20), json!(-0.5)] {
            let err = service.update(&update("name", value)).await.unwrap_err();
            assert!(matches!(err, EditError::Validation(_)));
        }
        assert_eq!(backend.field("users", "ada", "name"), Some(FieldValue::String("Ada".into())));
        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn missing_value_is_a_validation_error() {
        let (backend, service) = setup();

        let mut request = update("age", json!(1));
        request.value = None;
        assert!(matches!(service.update(&request).await, Err(EditError::Validation(_))));

        request.value = Some(Value::Null);
        assert!(matches!(service.update(&request).await, Err(EditError::Validation(_))));

        request.value = Some(json!(true));
        assert!(matches!(service.update(&request).await, Err(EditError::Validation(_))));

        let mut request = update("age", json!(1));
        request.collection = None;
        assert!(matches!(service.update(&request).await, Err(EditError::Validation(_))));

        assert_eq!(backend.read_count(), 0);
        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn missing_document_or_field_is_not_found() {
        let (backend, service) = setup();

        let mut request = update("age", json!("1"));
        request.doc = Some("bob".into());
        assert!(matches!(service.update(&request).await, Err(EditError::NotFound(_))));

        assert!(matches!(service.update(&update("email", json!("a@b.c"))).await, Err(EditError::NotFound(_))));
        assert!(matches!(service.update(&update("admin", json!("false"))).await, Err(EditError::NotFound(_))));
        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn failed_capture_aborts_the_update() {
        let (backend, service) = setup();
        backend.fail_writes_to("_previous_age");

        let err = service.update(&update("age", json!("31"))).await.unwrap_err();
        assert!(matches!(err, EditError::Store { .. }));
        assert_eq!(backend.field("users", "ada", "age"), Some(FieldValue::Integer(30)));
    }

    #[tokio::test]
    async fn failed_write_leaves_old_value() {
        let (backend, service) = setup();
        backend.fail_writes_to("age");

        let err = service.update(&update("age", json!("31"))).await.unwrap_err();
        assert_eq!(err.code(), "store_error");
        assert_eq!(backend.field("users", "ada", "age"), Some(FieldValue::Integer(30)));
        assert_eq!(backend.field("users", "ada", "_previous_age"), None);
    }

    #[tokio::test]
    async fn failed_write_keeps_the_undo_value_of_the_last_good_update() {
        let (backend, service) = setup();
        service.update(&update("age", json!("31"))).await.unwrap();
        backend.fail_writes_to("age");

        let err = service.update(&update("age", json!("32"))).await.unwrap_err();
        assert_eq!(err.code(), "store_error");
        assert_eq!(backend.field("users", "ada", "age"), Some(FieldValue::Integer(31)));
        assert_eq!(backend.field("users", "ada", "_previous_age"), Some(FieldValue::Integer(30)));
        assert_eq!(backend.write_count(), 2);
    }

    #[tokio::test]
    async fn unavailable_store_reports_connection_error() {
        let service = FieldEditService::new(DocumentStore::unavailable("Invalid Firebase credentials JSON"));
        assert!(matches!(service.update(&update("age", json!("1"))).await, Err(EditError::Connection(_))));
        assert!(matches!(service.restore(&restore("age")).await, Err(EditError::Connection(_))));
    }
}
