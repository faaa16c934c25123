pub mod auth_service;
pub mod document_store;
pub mod error;
pub mod field_edit_service;
pub mod memory_backend;
pub mod undo_slots;
