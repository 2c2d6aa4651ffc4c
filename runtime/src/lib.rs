//! Runtime support for stencil-generated extensible objects.
//!
//! Code emitted by `stencil-gen` links against this crate. It provides:
//!
//! - [`AcceptValue`] / [`ProduceValue`] - optional conversion capabilities
//!   a storage type may implement so that open JSON values can be coerced
//!   into it, and typed values produced out of it
//! - [`ByteSlice`] - a byte container that is base64 text on the wire
//! - [`ObjectError`] - the recoverable error type returned by every
//!   generated object operation
//! - lock helpers ([`read_lock`], [`write_lock`], [`lock`]) that absorb
//!   poisoning so generated accessors never panic on a poisoned lock
//!
//! Nothing here is specific to any one generated object; hand-written code
//! may use these types directly, but the main consumer is generated source.

pub mod bytes;
pub mod errors;
pub mod lock;
pub mod value;

pub use bytes::ByteSlice;
pub use errors::ObjectError;
pub use lock::{lock, read_lock, write_lock};
pub use value::{AcceptValue, ProduceValue, ValueRejected, to_wire};
