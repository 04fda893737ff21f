use std::io::{BufRead, Write};

use crate::descriptor::MessageDescriptor;
use crate::error::{SerializeError, SerializeResult};
use crate::message::Message;
use crate::serializer::Serializer;

/// Line-delimited JSON codec.
///
/// Each message is written as one compact JSON document followed by `\n`.
/// Compact `serde_json` output never contains a raw newline (string
/// newlines are escaped), so a line is always exactly one message.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize<M: Message>(&self, out: &mut dyn Write, message: &M) -> SerializeResult<usize> {
        let mut line =
            serde_json::to_vec(message).map_err(|e| SerializeError::Encode(e.to_string()))?;
        line.push(b'\n');
        out.write_all(&line)?;
        Ok(line.len())
    }

    fn deserialize<M: Message>(
        &self,
        input: &mut dyn BufRead,
        descriptor: &MessageDescriptor,
    ) -> SerializeResult<M> {
        let mut line = Vec::new();
        input.read_until(b'\n', &mut line)?;
        if line.last() != Some(&b'\n') {
            return Err(SerializeError::Truncated {
                message: descriptor.qualified_name(),
            });
        }
        line.pop();

        serde_json::from_slice(&line).map_err(|e| SerializeError::Decode {
            message: descriptor.qualified_name(),
            reason: e.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "json"
    }
}
