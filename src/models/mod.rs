pub mod documents;
pub mod edit;
pub mod error;
pub mod field_value;
pub mod health;

pub use documents::*;
pub use edit::*;
pub use error::*;
pub use field_value::*;
pub use health::*;
