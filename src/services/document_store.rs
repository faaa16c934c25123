use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::clients::firestore_client::FirestoreClient;
use crate::config::Config;
use crate::models::{FieldValue, ScalarValue};
use crate::services::error::{EditError, StoreError};
use crate::services::memory_backend::InMemoryBackend;
use crate::services::undo_slots::is_undo_slot;

/// Documents of one collection, reduced to their editable fields
pub type FilteredDocuments = BTreeMap<String, BTreeMap<String, ScalarValue>>;

/// A document as returned by a backend
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: BTreeMap<String, FieldValue>,
}

/// Raw access to a document database
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn list_collection_ids(&self) -> Result<Vec<String>, StoreError>;

    async fn list_documents(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError>;

    async fn get_document(&self, collection: &str, doc_id: &str) -> Result<Option<StoredDocument>, StoreError>;

    /// Merge `fields` into an existing document, leaving other fields untouched.
    /// Fails with `StoreError::NotFound` if the document does not exist.
    async fn update_fields(
        &self,
        collection: &str,
        doc_id: &str,
        fields: BTreeMap<String, ScalarValue>,
    ) -> Result<(), StoreError>;
}

/// A validated (collection, document, field) triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub collection: String,
    pub doc: String,
    pub field: String,
}

impl FieldRef {
    pub fn new(
        collection: Option<&str>,
        doc: Option<&str>,
        field: Option<&str>,
    ) -> Result<Self, EditError> {
        let collection = require_segment("collection", collection)?;
        let doc = require_segment("doc", doc)?;
        let field = require("field", field)?;
        if is_undo_slot(&field) {
            return Err(EditError::Validation(format!("Field '{}' is reserved", field)));
        }
        Ok(Self { collection, doc, field })
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.collection, self.doc, self.field)
    }
}

fn require(name: &str, value: Option<&str>) -> Result<String, EditError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
        _ => Err(EditError::Validation(format!("Missing required parameter '{}'", name))),
    }
}

/// Collection and document ids become path segments and may not contain '/'
pub fn require_segment(name: &str, value: Option<&str>) -> Result<String, EditError> {
    let value = require(name, value)?;
    if value.contains('/') {
        return Err(EditError::Validation(format!("Parameter '{}' must not contain '/'", name)));
    }
    Ok(value)
}

/// Adapter over the configured backend. Cheap to clone.
#[derive(Clone)]
pub struct DocumentStore {
    backend: Result<Arc<dyn DocumentBackend>, Arc<str>>,
}

impl DocumentStore {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self { backend: Ok(backend) }
    }

    /// A store whose backend could not be constructed; every call fails with ConnectionError
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self { backend: Err(Arc::from(reason.into())) }
    }

    pub fn is_connected(&self) -> bool {
        self.backend.is_ok()
    }

    fn backend(&self) -> Result<&Arc<dyn DocumentBackend>, EditError> {
        self.backend
            .as_ref()
            .map_err(|reason| EditError::Connection(reason.to_string()))
    }

    /// Names of all top-level collections; empty if the store reports an error
    pub async fn list_collections(&self) -> Result<Vec<String>, EditError> {
        let backend = self.backend()?;
        match backend.list_collection_ids().await {
            Ok(mut ids) => {
                ids.sort();
                Ok(ids)
            }
            Err(e) => {
                error!("Error fetching collections: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Every document of `collection` with only its string and integer fields.
    /// Undo slots are left out and documents without editable fields are omitted.
    pub async fn get_filtered_documents(&self, collection: &str) -> Result<FilteredDocuments, EditError> {
        let backend = self.backend()?;
        let documents = match backend.list_documents(collection).await {
            Ok(documents) => documents,
            Err(e) => {
                error!("Error fetching documents of collection '{}': {}", collection, e);
                return Ok(FilteredDocuments::new());
            }
        };

        let total = documents.len();
        let filtered: FilteredDocuments = documents
            .into_iter()
            .filter_map(|doc| {
                let fields: BTreeMap<String, ScalarValue> = doc
                    .fields
                    .iter()
                    .filter(|(name, _)| !is_undo_slot(name))
                    .filter_map(|(name, value)| value.as_scalar().map(|v| (name.clone(), v)))
                    .collect();
                (!fields.is_empty()).then_some((doc.id, fields))
            })
            .collect();

        info!(
            "Loaded {} of {} documents from collection '{}'",
            filtered.len(),
            total,
            collection
        );
        Ok(filtered)
    }

    /// Raw value of a field, `None` if the document or field does not exist
    pub(crate) async fn read_raw(&self, target: &FieldRef, field: &str) -> Result<Option<FieldValue>, EditError> {
        let backend = self.backend()?;
        let document = backend
            .get_document(&target.collection, &target.doc)
            .await
            .map_err(|e| EditError::from_store("read", target.to_string(), e))?;
        Ok(document.and_then(|mut doc| doc.fields.remove(field)))
    }

    /// Current editable value of a field
    pub async fn read_field(&self, target: &FieldRef) -> Result<ScalarValue, EditError> {
        match self.read_raw(target, &target.field).await? {
            Some(value) => value.as_scalar().ok_or_else(|| {
                EditError::NotFound(format!(
                    "Field '{}' holds a {} value and is not editable",
                    target,
                    value.kind()
                ))
            }),
            None => Err(EditError::NotFound(format!("Field '{}' not found", target))),
        }
    }

    /// Merge `fields` into the document named by `target` in a single backend write.
    /// Either every field is written or none is.
    pub(crate) async fn write_fields(
        &self,
        target: &FieldRef,
        fields: BTreeMap<String, ScalarValue>,
    ) -> Result<(), EditError> {
        let backend = self.backend()?;
        backend
            .update_fields(&target.collection, &target.doc, fields)
            .await
            .map_err(|e| EditError::from_store("write", target.to_string(), e))
    }

    pub async fn write_field(&self, target: &FieldRef, value: ScalarValue) -> Result<(), EditError> {
        self.write_fields(target, BTreeMap::from([(target.field.clone(), value)])).await
    }
}

/// Build the store once at startup. Construction failures are kept and reported
/// as ConnectionError by every operation.
pub fn connect(config: &Config) -> DocumentStore {
    match config.store_backend.to_lowercase().as_str() {
        "memory" => {
            warn!("Using the in-memory document backend; edits will not be persisted");
            DocumentStore::new(Arc::new(InMemoryBackend::new()))
        }
        "firestore" => match FirestoreClient::from_config(config) {
            Ok(client) => {
                info!("Firestore client initialized for project '{}'", client.project_id());
                DocumentStore::new(Arc::new(client))
            }
            Err(e) => {
                error!("Firebase initialization error: {}", e);
                DocumentStore::unavailable(e.to_string())
            }
        },
        other => {
            error!("Unknown store backend '{}'", other);
            DocumentStore::unavailable(format!("Unknown store backend '{}'", other))
        }
    }
}
