use std::sync::Arc;

use crate::config::Config;
use crate::services::document_store::DocumentStore;
use crate::services::field_edit_service::FieldEditService;

/// Shared state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: DocumentStore,
    pub edits: FieldEditService,
}

impl AppState {
    pub fn new(config: Config, store: DocumentStore) -> Self {
        Self {
            config: Arc::new(config),
            edits: FieldEditService::new(store.clone()),
            store,
        }
    }
}
