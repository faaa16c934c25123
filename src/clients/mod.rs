pub mod firestore_client;
pub mod service_account;
