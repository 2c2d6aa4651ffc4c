//! Conversion capabilities between storage types and open JSON values.
//!
//! A storage type may opt into either or both capabilities:
//!
//! - [`AcceptValue`] - construct the storage type from an arbitrary
//!   [`Value`], so wire input and builder-supplied values can be coerced
//!   into it
//! - [`ProduceValue`] - produce the apparent (user-facing) representation
//!   out of the storage representation
//!
//! A type with neither capability is stored and returned verbatim; its
//! apparent type equals its storage type.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::errors::ObjectError;

/// A storage type rejected the value offered to it.
///
/// This is deliberately reason-only: the rejecting type does not know which
/// wire key the value arrived under, so generated code wraps this into
/// [`ObjectError::TypeMismatch`] with the key filled in.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ValueRejected(pub String);

impl ValueRejected {
    /// Convenience constructor for rejection messages.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Coerce an open JSON value into the implementing storage type.
///
/// Implementations should accept every representation the value could
/// plausibly arrive in - both the type's own wire form and the apparent
/// form a builder setter would supply.
pub trait AcceptValue: Sized {
    /// Builds the storage value from `value`, or rejects it with a reason.
    fn accept_value(value: Value) -> Result<Self, ValueRejected>;
}

/// Produce the apparent (user-facing) value out of the storage value.
pub trait ProduceValue {
    /// The apparent type consumers see through typed accessors.
    type Apparent;

    /// Returns the apparent representation of the stored value.
    fn produce_value(&self) -> Self::Apparent;
}

/// Serializes a stored field value into its wire-form [`Value`].
///
/// The storage type's own `Serialize` impl defines the wire form (this is
/// how [`crate::ByteSlice`] becomes a base64 string). Serializer failures
/// are reported against the wire key.
///
/// ## Examples
///
/// ```
/// use serde_json::Value;
/// use stencil_runtime::to_wire;
///
/// let v = to_wire("count", &42i64).unwrap();
/// assert_eq!(v, Value::from(42));
/// ```
pub fn to_wire<T: Serialize>(key: &str, value: &T) -> Result<Value, ObjectError> {
    serde_json::to_value(value).map_err(|e| ObjectError::Unrepresentable {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
