//! Record, builder, and serializer contracts for Tessera structured data.
//!
//! Every stored value in Tessera is a [`Message`]: an immutable structured
//! value created through its [`MessageBuilder`]. Messages become bytes through
//! a [`Serializer`], which works on open byte streams so that several messages
//! can share one stream.
//!
//! # Key Types
//!
//! - [`Message`] / [`MessageBuilder`] -- immutable value and its staging object
//! - [`MessageDescriptor`] -- static shape identifier for a message type
//! - [`Serializer`] -- byte-stream codec contract
//! - [`BinarySerializer`] -- length + CRC framed bincode
//! - [`JsonSerializer`] -- one JSON document per line

pub mod binary;
pub mod descriptor;
pub mod error;
pub mod json;
pub mod message;
pub mod serializer;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use binary::BinarySerializer;
pub use descriptor::MessageDescriptor;
pub use error::{SerializeError, SerializeResult};
pub use json::JsonSerializer;
pub use message::{build_all, mutate_all, Message, MessageBuilder};
pub use serializer::{at_end_of_stream, Serializer};
