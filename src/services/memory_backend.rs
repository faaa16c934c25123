use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::models::{FieldValue, ScalarValue};
use crate::services::document_store::{DocumentBackend, StoredDocument};
use crate::services::error::StoreError;

type Collections = BTreeMap<String, BTreeMap<String, BTreeMap<String, FieldValue>>>;

/// Document backend kept in process memory.
///
/// Counts every read and write call it receives and can be told to fail, which
/// makes it usable as a spy in tests as well as a throwaway store in development.
#[derive(Default)]
pub struct InMemoryBackend {
    collections: Mutex<Collections>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    failing_fields: Mutex<BTreeSet<String>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn collections(&self) -> MutexGuard<'_, Collections> {
        self.collections.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert_document(&self, collection: &str, doc_id: &str, fields: BTreeMap<String, FieldValue>) {
        self.collections()
            .entry(collection.to_string())
            .or_default()
            .insert(doc_id.to_string(), fields);
    }

    /// Current value of a field, bypassing the call counters
    pub fn field(&self, collection: &str, doc_id: &str, field: &str) -> Option<FieldValue> {
        self.collections()
            .get(collection)
            .and_then(|docs| docs.get(doc_id))
            .and_then(|fields| fields.get(field))
            .cloned()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Reject any update that touches `field`
    pub fn fail_writes_to(&self, field: &str) {
        self.failing_fields
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(field.to_string());
    }

    fn begin_read(&self) -> Result<(), StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected read failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentBackend for InMemoryBackend {
    async fn list_collection_ids(&self) -> Result<Vec<String>, StoreError> {
        self.begin_read()?;
        Ok(self.collections().keys().cloned().collect())
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        self.begin_read()?;
        Ok(self
            .collections()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| StoredDocument { id: id.clone(), fields: fields.clone() })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_document(&self, collection: &str, doc_id: &str) -> Result<Option<StoredDocument>, StoreError> {
        self.begin_read()?;
        Ok(self
            .collections()
            .get(collection)
            .and_then(|docs| docs.get(doc_id))
            .map(|fields| StoredDocument { id: doc_id.to_string(), fields: fields.clone() }))
    }

    async fn update_fields(
        &self,
        collection: &str,
        doc_id: &str,
        fields: BTreeMap<String, ScalarValue>,
    ) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }
        {
            let failing = self.failing_fields.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(field) = fields.keys().find(|f| failing.contains(*f)) {
                return Err(StoreError::Unavailable(format!("injected write failure on '{}'", field)));
            }
        }

        let mut collections = self.collections();
        let document = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(doc_id))
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, doc_id)))?;
        for (name, value) in fields {
            document.insert(name, value.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_reads_and_writes() {
        let backend = InMemoryBackend::new();
        backend.insert_document("users", "ada", BTreeMap::from([("age".to_string(), FieldValue::Integer(1))]));

        backend.get_document("users", "ada").await.unwrap();
        backend.list_documents("users").await.unwrap();
        backend
            .update_fields("users", "ada", BTreeMap::from([("age".to_string(), ScalarValue::Integer(2))]))
            .await
            .unwrap();

        assert_eq!(backend.read_count(), 2);
        assert_eq!(backend.write_count(), 1);
        assert_eq!(backend.field("users", "ada", "age"), Some(FieldValue::Integer(2)));
    }

    #[tokio::test]
    async fn update_of_missing_document_is_not_found() {
        let backend = InMemoryBackend::new();
        let result = backend
            .update_fields("users", "nobody", BTreeMap::from([("age".to_string(), ScalarValue::Integer(2))]))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn injected_field_failure_leaves_document_untouched() {
        let backend = InMemoryBackend::new();
        backend.insert_document("users", "ada", BTreeMap::from([("age".to_string(), FieldValue::Integer(1))]));
        backend.fail_writes_to("age");

        let result = backend
            .update_fields("users", "ada", BTreeMap::from([("age".to_string(), ScalarValue::Integer(2))]))
            .await;
        assert!(result.is_err());
        assert_eq!(backend.field("users", "ada", "age"), Some(FieldValue::Integer(1)));
    }
}
