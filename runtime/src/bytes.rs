//! Byte-sequence storage with transparent base64 wire encoding.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::de::{Deserializer, Error as DeError};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value::{AcceptValue, ProduceValue, ValueRejected};

/// A byte container whose wire representation is a base64 string.
///
/// JSON has no binary type, so byte-sequence fields are carried as base64
/// text. `ByteSlice` keeps that conversion out of generated code: it
/// serializes to a base64 string, deserializes from one, and implements
/// both conversion capabilities so typed accessors still see `Vec<u8>`.
///
/// ## Examples
///
/// ```
/// use stencil_runtime::ByteSlice;
///
/// let b = ByteSlice::from(vec![1u8, 2, 3]);
/// assert_eq!(serde_json::to_string(&b).unwrap(), "\"AQID\"");
///
/// let back: ByteSlice = serde_json::from_str("\"AQID\"").unwrap();
/// assert_eq!(back.as_bytes(), &[1, 2, 3]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteSlice {
    data: Vec<u8>,
}

impl ByteSlice {
    /// Creates an empty byte slice.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the container, returning the raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Number of stored bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when no bytes are stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for ByteSlice {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl From<&[u8]> for ByteSlice {
    fn from(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }
}

impl Serialize for ByteSlice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.data))
    }
}

impl<'de> Deserialize<'de> for ByteSlice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let data = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| D::Error::custom(format!("invalid base64: {e}")))?;
        Ok(Self { data })
    }
}

impl AcceptValue for ByteSlice {
    /// Accepts either the wire form (a base64 string) or the apparent form
    /// (a JSON array of byte values, as produced by serializing `Vec<u8>`).
    fn accept_value(value: Value) -> Result<Self, ValueRejected> {
        match value {
            Value::String(encoded) => {
                let data = STANDARD
                    .decode(encoded.as_bytes())
                    .map_err(|e| ValueRejected::new(format!("invalid base64: {e}")))?;
                Ok(Self { data })
            }
            Value::Array(items) => {
                let mut data = Vec::with_capacity(items.len());
                for item in items {
                    let n = item
                        .as_u64()
                        .filter(|n| *n <= u64::from(u8::MAX))
                        .ok_or_else(|| ValueRejected::new("expected an array of bytes"))?;
                    data.push(n as u8);
                }
                Ok(Self { data })
            }
            other => Err(ValueRejected::new(format!(
                "expected a base64 string or byte array, got {other}"
            ))),
        }
    }
}

impl ProduceValue for ByteSlice {
    type Apparent = Vec<u8>;

    fn produce_value(&self) -> Vec<u8> {
        self.data.clone()
    }
}
