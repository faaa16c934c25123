pub mod documents;
pub mod field_edit;
pub mod health;

pub use documents::*;
pub use field_edit::*;
pub use health::*;
