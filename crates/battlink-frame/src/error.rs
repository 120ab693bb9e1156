/// Errors that can occur during frame encoding/decoding.
///
/// `Truncated` means "wait for more bytes" and is not a failure. The three
/// corruption variants (`InvalidMagic`, `UnknownMessageId`,
/// `ChecksumMismatch`) drive the scanner's one-byte resynchronization; none
/// of them is ever fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The buffer does not yet hold a complete frame.
    #[error("incomplete frame (need {needed} bytes)")]
    Truncated { needed: usize },

    /// The leading 16 bits are not a recognized frame magic.
    #[error("invalid frame magic 0x{found:04X} (expected 0xB55B or 0xA55A)")]
    InvalidMagic { found: u16 },

    /// The message id is not in the catalog, so the frame length is unknown.
    #[error("unknown message id 0x{id:02X}")]
    UnknownMessageId { id: u8 },

    /// The trailing checksum byte does not match the recomputed value.
    #[error("checksum mismatch (expected 0x{expected:02X}, found 0x{found:02X})")]
    ChecksumMismatch { expected: u8, found: u8 },

    /// A decoded enumeration value is outside the known set.
    #[error("unrecognized {field} value {value}")]
    UnrecognizedEnum { field: &'static str, value: u8 },

    /// A typed decode was handed a frame with a different message id.
    #[error("unexpected message id 0x{found:02X} (expected 0x{expected:02X})")]
    UnexpectedMessage { expected: u8, found: u8 },

    /// A frame payload is shorter than its layout requires.
    #[error("short payload for message 0x{message_id:02X} ({len} bytes, need {needed})")]
    ShortPayload {
        message_id: u8,
        len: usize,
        needed: usize,
    },
}

/// Caller-facing errors when preparing a configuration write.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The field name is not in the registry.
    #[error("unknown config field '{name}' (known fields: {known})")]
    UnknownField { name: String, known: String },

    /// The supplied value cannot be encoded for the field's shape.
    #[error("invalid value '{value}' for {field}: expected {expected}")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, FrameError>;
