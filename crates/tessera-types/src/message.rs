//! The record/builder pair every stored value is expressed through.
//!
//! A [`Message`] is an immutable structured value. The only way to make a
//! changed copy is to [`mutate`](Message::mutate) it into a
//! [`MessageBuilder`], edit the builder, and [`build`](MessageBuilder::build)
//! a new message. Builders own copies of their field values, so neither side
//! of that exchange can observe later edits to the other.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::descriptor::MessageDescriptor;

/// Immutable structured value with structural equality.
pub trait Message:
    Clone + PartialEq + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The mutable staging type that produces this message.
    type Builder: MessageBuilder<Message = Self>;

    /// Shape descriptor for this message type.
    fn descriptor() -> &'static MessageDescriptor;

    /// Create a builder pre-populated with a copy of this message's fields.
    fn mutate(&self) -> Self::Builder;

    /// Create an empty builder.
    fn builder() -> Self::Builder {
        Self::Builder::default()
    }
}

/// Mutable staging object for a [`Message`].
///
/// `build` borrows the builder: building never consumes or resets it, and
/// further edits to the builder do not affect messages already built.
pub trait MessageBuilder: Clone + Default + Debug + Send + Sync + 'static {
    /// The message type this builder produces.
    type Message: Message<Builder = Self>;

    /// Produce an immutable message from the current builder state.
    fn build(&self) -> Self::Message;
}

/// Build every builder in the slice, preserving order.
pub fn build_all<B: MessageBuilder>(builders: &[B]) -> Vec<B::Message> {
    builders.iter().map(MessageBuilder::build).collect()
}

/// Mutate every message in the slice into a builder, preserving order.
pub fn mutate_all<M: Message>(messages: &[M]) -> Vec<M::Builder> {
    messages.iter().map(Message::mutate).collect()
}
