//! Validator capability and built-in implementations

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

/// A single schema mismatch
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{path}: {message}")]
pub struct SchemaViolation {
    /// JSON path of the offending value (`$` is the root)
    pub path: String,
    /// What was wrong
    pub message: String,
}

impl SchemaViolation {
    /// Create a violation
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Violation at the root of the document
    pub fn root(message: impl Into<String>) -> Self {
        Self::new("$", message)
    }
}

/// Schema engine capability: check (and possibly normalize) a JSON value
pub trait Validator: Send + Sync {
    /// Validate `input`, returning the value to use downstream
    fn validate(&self, input: &Value) -> Result<Value, SchemaViolation>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "custom"
    }
}

/// Validates by deserializing into `T`; the output is `T` serialized back,
/// so unknown fields are dropped and defaults filled in
pub struct TypedSchema<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    /// Create a typed schema
    pub fn new() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            _marker: PhantomData,
        }
    }
}

impl<T> Default for TypedSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Validator for TypedSchema<T>
where
    T: DeserializeOwned + Serialize,
{
    fn validate(&self, input: &Value) -> Result<Value, SchemaViolation> {
        let typed: T = serde_json::from_value(input.clone())
            .map_err(|e| SchemaViolation::root(e.to_string()))?;
        serde_json::to_value(typed).map_err(|e| SchemaViolation::root(e.to_string()))
    }

    fn name(&self) -> &str {
        self.name
    }
}

struct FnValidator<F> {
    name: String,
    check: F,
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(&Value) -> Result<Value, SchemaViolation> + Send + Sync,
{
    fn validate(&self, input: &Value) -> Result<Value, SchemaViolation> {
        (self.check)(input)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Shared handle to a validator, cheap to clone into request descriptors
#[derive(Clone)]
pub struct Schema {
    inner: Arc<dyn Validator>,
}

impl Schema {
    /// Wrap any validator
    pub fn new(validator: impl Validator + 'static) -> Self {
        Self {
            inner: Arc::new(validator),
        }
    }

    /// Schema backed by a serde type
    pub fn typed<T>() -> Self
    where
        T: DeserializeOwned + Serialize + 'static,
    {
        Self::new(TypedSchema::<T>::new())
    }

    /// Schema backed by a closure
    pub fn from_fn<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, SchemaViolation> + Send + Sync + 'static,
    {
        Self::new(FnValidator {
            name: name.into(),
            check,
        })
    }

    /// Validate `input`
    pub fn validate(&self, input: &Value) -> Result<Value, SchemaViolation> {
        self.inner.validate(input)
    }

    /// Validator name
    pub fn name(&self) -> &str {
        self.inner.name()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Schema").field(&self.name()).finish()
    }
}
