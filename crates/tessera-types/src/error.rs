use thiserror::Error;

/// Errors produced while encoding or decoding a message.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// The underlying byte stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode message: {0}")]
    Encode(String),

    /// The payload was read in full but could not be decoded as the
    /// expected message type.
    #[error("failed to decode {message}: {reason}")]
    Decode { message: String, reason: String },

    /// Framing or checksum validation failed.
    #[error("corrupt {message} record: {reason}")]
    Corrupt { message: String, reason: String },

    /// The stream ended in the middle of a record.
    #[error("truncated {message} record")]
    Truncated { message: String },
}

/// Result alias for serializer operations.
pub type SerializeResult<T> = Result<T, SerializeError>;
