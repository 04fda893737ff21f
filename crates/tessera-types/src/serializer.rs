use std::io::{BufRead, Write};

use crate::descriptor::MessageDescriptor;
use crate::error::SerializeResult;
use crate::message::Message;

/// Byte-stream codec for messages.
///
/// Implementations must tolerate being called repeatedly on the same open
/// stream: writing N messages back to back and then calling `deserialize`
/// N times on the resulting bytes yields the N messages in order. Callers
/// detect end-of-stream themselves (see [`at_end_of_stream`]).
pub trait Serializer: Send + Sync {
    /// Write one message to `out`. Returns the number of bytes written.
    fn serialize<M: Message>(&self, out: &mut dyn Write, message: &M) -> SerializeResult<usize>;

    /// Read exactly one message of shape `descriptor` from `input`.
    fn deserialize<M: Message>(
        &self,
        input: &mut dyn BufRead,
        descriptor: &MessageDescriptor,
    ) -> SerializeResult<M>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Returns `true` if the buffered stream has no bytes left.
pub fn at_end_of_stream(input: &mut dyn BufRead) -> std::io::Result<bool> {
    Ok(input.fill_buf()?.is_empty())
}
