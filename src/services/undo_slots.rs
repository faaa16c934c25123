use std::collections::BTreeMap;
use tracing::debug;

use crate::models::ScalarValue;
use crate::services::document_store::{DocumentStore, FieldRef};
use crate::services::error::EditError;

/// Prefix of the sibling field that holds a field's previous value
pub const UNDO_SLOT_PREFIX: &str = "_previous_";

pub fn slot_field_name(field: &str) -> String {
    format!("{}{}", UNDO_SLOT_PREFIX, field)
}

pub fn is_undo_slot(field: &str) -> bool {
    field.starts_with(UNDO_SLOT_PREFIX)
}

/// One previous value per field, stored next to the field in the same document
#[derive(Clone)]
pub struct UndoSlots {
    store: DocumentStore,
}

impl UndoSlots {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Write `new_value` to the field and `previous` to its slot in one merge.
    /// If the write fails neither the field nor the slot changes.
    pub async fn write_with_undo(
        &self,
        target: &FieldRef,
        previous: ScalarValue,
        new_value: ScalarValue,
    ) -> Result<(), EditError> {
        debug!("Recording undo value for '{}'", target);
        let fields = BTreeMap::from([
            (slot_field_name(&target.field), previous),
            (target.field.clone(), new_value),
        ]);
        self.store.write_fields(target, fields).await
    }

    pub async fn fetch(&self, target: &FieldRef) -> Result<ScalarValue, EditError> {
        let slot = slot_field_name(&target.field);
        match self.store.read_raw(target, &slot).await? {
            Some(value) => value.as_scalar().ok_or_else(|| {
                EditError::NotFound(format!("Undo value for '{}' is not restorable", target))
            }),
            None => Err(EditError::NotFound(format!("No previous value recorded for '{}'", target))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;
    use crate::services::memory_backend::InMemoryBackend;
    use std::sync::Arc;

    fn setup() -> (Arc<InMemoryBackend>, UndoSlots, FieldRef) {
        let backend = Arc::new(InMemoryBackend::new());
        backend.insert_document(
            "users",
            "ada",
            BTreeMap::from([
                ("age".to_string(), FieldValue::Integer(30)),
                ("name".to_string(), FieldValue::String("Ada".into())),
            ]),
        );
        let slots = UndoSlots::new(DocumentStore::new(backend.clone()));
        let target = FieldRef::new(Some("users"), Some("ada"), Some("age")).unwrap();
        (backend, slots, target)
    }

    #[test]
    fn slot_names_use_reserved_prefix() {
        assert_eq!(slot_field_name("age"), "_previous_age");
        assert!(is_undo_slot("_previous_age"));
        assert!(!is_undo_slot("previous_age"));
    }

    #[tokio::test]
    async fn fetch_without_store_is_not_found() {
        let (_, slots, target) = setup();
        assert!(matches!(slots.fetch(&target).await, Err(EditError::NotFound(_))));
    }

    #[tokio::test]
    async fn write_with_undo_overwrites_slot_and_merges() {
        let (backend, slots, target) = setup();

        slots.write_with_undo(&target, ScalarValue::Integer(30), ScalarValue::Integer(31)).await.unwrap();
        slots.write_with_undo(&target, ScalarValue::Integer(31), ScalarValue::Integer(32)).await.unwrap();

        assert_eq!(slots.fetch(&target).await.unwrap(), ScalarValue::Integer(31));
        assert_eq!(backend.field("users", "ada", "_previous_age"), Some(FieldValue::Integer(31)));
        assert_eq!(backend.field("users", "ada", "age"), Some(FieldValue::Integer(32)));
        assert_eq!(backend.field("users", "ada", "name"), Some(FieldValue::String("Ada".into())));
        assert_eq!(backend.write_count(), 2);
    }

    #[tokio::test]
    async fn failed_write_changes_neither_field_nor_slot() {
        let (backend, slots, target) = setup();
        slots.write_with_undo(&target, ScalarValue::Integer(30), ScalarValue::Integer(31)).await.unwrap();
        backend.fail_writes_to("age");

        let err = slots
            .write_with_undo(&target, ScalarValue::Integer(31), ScalarValue::Integer(32))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "store_error");
        assert_eq!(backend.field("users", "ada", "age"), Some(FieldValue::Integer(31)));
        assert_eq!(backend.field("users", "ada", "_previous_age"), Some(FieldValue::Integer(30)));
    }

    #[tokio::test]
    async fn slots_are_per_field() {
        let (_, slots, age) = setup();
        let name = FieldRef::new(Some("users"), Some("ada"), Some("name")).unwrap();

        slots.write_with_undo(&age, ScalarValue::Integer(30), ScalarValue::Integer(31)).await.unwrap();
        assert!(matches!(slots.fetch(&name).await, Err(EditError::NotFound(_))));
    }
}
