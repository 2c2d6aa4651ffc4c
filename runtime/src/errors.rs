//! Error types returned by generated object operations.

use thiserror::Error;

/// Errors a generated extensible object can return to its caller.
///
/// Every variant is recoverable: generated objects never abort the process.
/// Fatal conditions belong to the generation pipeline, not to runtime
/// objects.
#[derive(Debug, Error)]
pub enum ObjectError {
    /// The key names neither a declared field with a value nor an entry in
    /// extra storage.
    #[error("no value for key `{0}`")]
    NoSuchKey(String),

    /// The supplied value cannot be coerced into the field's storage type.
    #[error("invalid value for key `{key}`: {reason}")]
    TypeMismatch {
        /// The wire key the value was offered under.
        key: String,
        /// Why the storage type rejected the value.
        reason: String,
    },

    /// A builder finished while a required field was still absent.
    #[error("required field `{0}` is not set")]
    RequiredField(String),

    /// The stored value for this key has no wire representation.
    #[error("cannot represent key `{key}` on the wire: {reason}")]
    Unrepresentable {
        /// The wire key being serialized.
        key: String,
        /// The underlying serializer diagnostic.
        reason: String,
    },

    /// Malformed JSON input, or a serializer-level failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
