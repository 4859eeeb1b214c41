//! Schema system - JSON Schema validation of stored documents

pub mod registry;
pub mod validator;

pub use registry::SchemaRegistry;
pub use validator::{ValidationError, Validator};
