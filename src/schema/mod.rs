//! Schema validation module
//!
//! Request bodies and responses are checked through the [`Validator`]
//! capability, so any schema engine can be plugged in.
//!
//! # Built-in validators
//!
//! - **[`TypedSchema`]**: deserialize into a serde type
//! - **[`JsonShape`]**: structural type / required-field checks
//! - **Closures** via [`Schema::from_fn`]

mod types;
mod validator;

pub use types::{JsonShape, JsonType};
pub use validator::{Schema, SchemaViolation, TypedSchema, Validator};

#[cfg(test)]
mod tests;
