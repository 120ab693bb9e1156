//! Framed binary protocol engine for battery/energy monitor peripherals.
//!
//! This is the core value-add layer of battlink. Every message on the wire
//! is a fixed-length frame:
//! - A 2-byte big-endian magic tagging the direction (`0xB55B` device to
//!   controller, `0xA55A` controller to device)
//! - A 1-byte device address and a 1-byte message id
//! - A payload whose length is fixed by the message id
//! - A trailing subtractive checksum byte (one protocol variant, the
//!   name-set command, carries none)
//!
//! The [`FrameScanner`] recovers frame alignment from noisy byte streams by
//! sliding one byte at a time until a valid magic + checksum combination is
//! found. No partial reads, no buffer management in user code.

pub mod catalog;
pub mod codec;
pub mod error;
pub mod registry;
pub mod scanner;

pub use catalog::{BacklightMode, ConfigSnapshot, Telemetry, WriteAck};
pub use codec::{
    checksum, decode_frame, encode_name, encode_query, encode_write_byte, encode_write_short,
    Direction, Frame, CMD_CONFIG_SNAPSHOT, CMD_DEVICE_NAME, CMD_TELEMETRY, COMMAND_FRAME_SIZE,
    MAGIC_CONTROLLER, MAGIC_DEVICE, NAME_FIELD_SIZE, NAME_FRAME_SIZE,
};
pub use error::{ConfigError, FrameError, Result};
pub use registry::{ConfigField, ConfigWrite, ValueShape, WriteValue, FIELDS};
pub use scanner::FrameScanner;
