use std::io::{self, BufRead, Read, Write};

use tracing::trace;

use crate::descriptor::MessageDescriptor;
use crate::error::{SerializeError, SerializeResult};
use crate::message::Message;
use crate::serializer::Serializer;

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Upper bound on a single framed payload (256 MiB).
const MAX_PAYLOAD_SIZE: u32 = 256 * 1024 * 1024;

/// Compact binary codec: bincode payloads with length and CRC framing.
///
/// On-disk format for each message:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized message)]
/// ```
///
/// Frames are self-delimiting, so any number of messages can be
/// concatenated in one stream. A message with no fields encodes to an empty
/// payload (length 0, CRC 0).
#[derive(Clone, Copy, Debug, Default)]
pub struct BinarySerializer;

impl Serializer for BinarySerializer {
    fn serialize<M: Message>(&self, out: &mut dyn Write, message: &M) -> SerializeResult<usize> {
        let payload =
            bincode::serialize(message).map_err(|e| SerializeError::Encode(e.to_string()))?;
        if payload.len() > MAX_PAYLOAD_SIZE as usize {
            return Err(SerializeError::Encode(format!(
                "{} payload of {} bytes exceeds frame limit",
                M::descriptor(),
                payload.len()
            )));
        }

        let length = payload.len() as u32;
        let crc = crc32fast::hash(&payload);

        out.write_all(&length.to_le_bytes())?;
        out.write_all(&crc.to_le_bytes())?;
        out.write_all(&payload)?;

        let descriptor = M::descriptor();
        trace!(message = %descriptor, len = payload.len(), "binary frame written");
        Ok(HEADER_SIZE + payload.len())
    }

    fn deserialize<M: Message>(
        &self,
        input: &mut dyn BufRead,
        descriptor: &MessageDescriptor,
    ) -> SerializeResult<M> {
        let mut header = [0u8; HEADER_SIZE];
        read_frame_part(input, &mut header, descriptor)?;

        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        if length > MAX_PAYLOAD_SIZE {
            return Err(SerializeError::Corrupt {
                message: descriptor.qualified_name(),
                reason: format!("invalid frame length {length}"),
            });
        }

        // Sized by the bytes present, not by the header.
        let mut payload = Vec::new();
        Read::take(&mut *input, u64::from(length)).read_to_end(&mut payload)?;
        if payload.len() < length as usize {
            return Err(SerializeError::Truncated {
                message: descriptor.qualified_name(),
            });
        }

        let actual_crc = crc32fast::hash(&payload);
        if actual_crc != expected_crc {
            return Err(SerializeError::Corrupt {
                message: descriptor.qualified_name(),
                reason: format!("CRC mismatch: expected {expected_crc:#010x}, got {actual_crc:#010x}"),
            });
        }

        bincode::deserialize(&payload).map_err(|e| SerializeError::Decode {
            message: descriptor.qualified_name(),
            reason: e.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "binary"
    }
}

fn read_frame_part(
    input: &mut dyn BufRead,
    buf: &mut [u8],
    descriptor: &MessageDescriptor,
) -> SerializeResult<()> {
    match input.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(SerializeError::Truncated {
            message: descriptor.qualified_name(),
        }),
        Err(e) => Err(e.into()),
    }
}
