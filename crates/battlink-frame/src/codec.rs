use bytes::{BufMut, Bytes, BytesMut};

use crate::catalog::{frame_len, has_checksum};
use crate::error::{FrameError, Result};

/// Magic tagging device-to-controller frames.
pub const MAGIC_DEVICE: u16 = 0xB55B;
/// Magic tagging controller-to-device frames.
pub const MAGIC_CONTROLLER: u16 = 0xA55A;

/// Device address field used for frames issued by a controller.
pub const CONTROLLER_ADDRESS: u8 = 0;

/// Frame header: magic (2) + device address (1) + message id (1) = 4 bytes.
pub const HEADER_SIZE: usize = 4;
/// Smallest decodable unit: header + one trailing byte.
pub const MIN_FRAME_SIZE: usize = 5;
/// Fixed length of a controller command frame (header + 8-byte value field + checksum).
pub const COMMAND_FRAME_SIZE: usize = 13;
/// Fixed length of the name-set frame (header + 16 name bytes, no checksum).
pub const NAME_FRAME_SIZE: usize = 20;
/// Width of the name field in a name-set frame.
pub const NAME_FIELD_SIZE: usize = 16;

/// Command code requesting a telemetry report.
pub const CMD_TELEMETRY: u8 = 0x01;
/// Command code requesting a configuration snapshot.
pub const CMD_CONFIG_SNAPSHOT: u8 = 0x02;
/// Command code carrying a device name (checksumless protocol variant).
pub const CMD_DEVICE_NAME: u8 = 0x10;

/// Direction of travel, decoded from the frame magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Device to controller (`0xB55B`): telemetry, snapshots, write acks.
    ToController,
    /// Controller to device (`0xA55A`): queries and configuration writes.
    ToDevice,
}

impl Direction {
    /// The wire magic for this direction.
    pub fn magic(self) -> u16 {
        match self {
            Direction::ToController => MAGIC_DEVICE,
            Direction::ToDevice => MAGIC_CONTROLLER,
        }
    }

    fn from_magic(magic: u16) -> Option<Self> {
        match magic {
            MAGIC_DEVICE => Some(Direction::ToController),
            MAGIC_CONTROLLER => Some(Direction::ToDevice),
            _ => None,
        }
    }
}

/// One complete, validated protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Direction decoded from the magic.
    pub direction: Direction,
    /// Device identifier echoed by the peripheral (0 for controller frames).
    pub device_address: u8,
    /// Message id selecting the catalog entry.
    pub message_id: u8,
    /// Bytes between the header and the checksum (or end of frame for the
    /// checksumless name variant).
    pub payload: Bytes,
}

/// Subtractive 8-bit checksum over every frame byte except the checksum itself.
///
/// Starts at 255 and subtracts each byte modulo 256. Detects corruption
/// only, not tampering.
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(255u8, |acc, &b| acc.wrapping_sub(b))
}

/// Decode one frame from the front of `src`.
///
/// On success returns the frame and the exact byte count consumed (the
/// catalog length for the message id). `Truncated` means the caller should
/// wait for more bytes; the other errors mean the buffer front is not a
/// frame start.
pub fn decode_frame(src: &[u8]) -> Result<(Frame, usize)> {
    if src.len() < MIN_FRAME_SIZE {
        return Err(FrameError::Truncated {
            needed: MIN_FRAME_SIZE,
        });
    }

    let magic = u16::from_be_bytes([src[0], src[1]]);
    let direction =
        Direction::from_magic(magic).ok_or(FrameError::InvalidMagic { found: magic })?;
    let device_address = src[2];
    let message_id = src[3];

    let total = frame_len(direction, message_id)
        .ok_or(FrameError::UnknownMessageId { id: message_id })?;

    if src.len() < total {
        return Err(FrameError::Truncated { needed: total });
    }

    let payload_end = if has_checksum(direction, message_id) {
        let expected = checksum(&src[..total - 1]);
        let found = src[total - 1];
        if expected != found {
            return Err(FrameError::ChecksumMismatch { expected, found });
        }
        total - 1
    } else {
        total
    };

    let frame = Frame {
        direction,
        device_address,
        message_id,
        payload: Bytes::copy_from_slice(&src[HEADER_SIZE..payload_end]),
    };
    Ok((frame, total))
}

fn command_frame(command: u8, value: [u8; 8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(COMMAND_FRAME_SIZE);
    buf.put_u16(MAGIC_CONTROLLER);
    buf.put_u8(CONTROLLER_ADDRESS);
    buf.put_u8(command);
    buf.put_slice(&value);
    let crc = checksum(&buf);
    buf.put_u8(crc);
    buf.freeze()
}

/// Encode a query command (telemetry or configuration read) with an empty
/// value field.
pub fn encode_query(message_id: u8) -> Bytes {
    command_frame(message_id, [0u8; 8])
}

/// Encode a configuration write carrying a single byte value.
pub fn encode_write_byte(command: u8, value: u8) -> Bytes {
    let mut field = [0u8; 8];
    field[0] = value;
    command_frame(command, field)
}

/// Encode a configuration write carrying a big-endian 16-bit value.
pub fn encode_write_short(command: u8, value: u16) -> Bytes {
    let mut field = [0u8; 8];
    field[..2].copy_from_slice(&value.to_be_bytes());
    command_frame(command, field)
}

/// Encode the name-set frame: 16 bytes of name data, truncated and
/// NUL-padded, with no trailing checksum.
///
/// Consumers must not assume NUL termination — a 16-byte name fills the
/// whole field.
pub fn encode_name(name: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(NAME_FRAME_SIZE);
    buf.put_u16(MAGIC_CONTROLLER);
    buf.put_u8(CONTROLLER_ADDRESS);
    buf.put_u8(CMD_DEVICE_NAME);

    let raw = name.as_bytes();
    let take = raw.len().min(NAME_FIELD_SIZE);
    buf.put_slice(&raw[..take]);
    buf.put_bytes(0, NAME_FIELD_SIZE - take);
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_accepts_and_rejects() {
        let body = [0xA5, 0x5A, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let crc = checksum(&body);

        let mut good = body.to_vec();
        good.push(crc);
        assert!(decode_frame(&good).is_ok());

        let mut bad = body.to_vec();
        bad.push(crc.wrapping_add(1));
        assert!(matches!(
            decode_frame(&bad),
            Err(FrameError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn decode_needs_five_bytes() {
        let err = decode_frame(&[0xB5, 0x5B, 0x04]).unwrap_err();
        assert!(matches!(err, FrameError::Truncated { needed: 5 }));
    }

    #[test]
    fn decode_truncated_reports_catalog_length() {
        // Telemetry header with only 6 of 21 bytes available.
        let err = decode_frame(&[0xB5, 0x5B, 0x04, 0x01, 0x5A, 0x0B]).unwrap_err();
        assert!(matches!(err, FrameError::Truncated { needed: 21 }));
    }

    #[test]
    fn decode_invalid_magic() {
        let err = decode_frame(&[0xFF, 0xFF, 0x00, 0x01, 0x00]).unwrap_err();
        assert!(matches!(err, FrameError::InvalidMagic { found: 0xFFFF }));
    }

    #[test]
    fn decode_unknown_message_id() {
        let err = decode_frame(&[0xB5, 0x5B, 0x04, 0x03, 0x00]).unwrap_err();
        assert!(matches!(err, FrameError::UnknownMessageId { id: 0x03 }));
    }

    #[test]
    fn query_frame_layout() {
        let wire = encode_query(CMD_TELEMETRY);
        assert_eq!(wire.len(), COMMAND_FRAME_SIZE);
        assert_eq!(&wire[..4], &[0xA5, 0x5A, 0x00, 0x01]);
        assert_eq!(&wire[4..12], &[0u8; 8]);
        assert_eq!(wire[12], checksum(&wire[..12]));
    }

    #[test]
    fn write_short_places_value_big_endian() {
        let wire = encode_write_short(0x06, 200);
        assert_eq!(wire[3], 0x06);
        assert_eq!(&wire[4..6], &[0x00, 0xC8]);
        assert_eq!(&wire[6..12], &[0u8; 6]);

        let (frame, consumed) = decode_frame(&wire).unwrap();
        assert_eq!(consumed, COMMAND_FRAME_SIZE);
        assert_eq!(frame.direction, Direction::ToDevice);
        assert_eq!(frame.message_id, 0x06);
        assert_eq!(&frame.payload[..2], &[0x00, 0xC8]);
    }

    #[test]
    fn write_byte_pads_value_field() {
        let wire = encode_write_byte(0x0B, 85);
        assert_eq!(wire[4], 85);
        assert_eq!(&wire[5..12], &[0u8; 7]);

        let (frame, _) = decode_frame(&wire).unwrap();
        assert_eq!(frame.payload[0], 85);
    }

    #[test]
    fn name_frame_has_no_checksum() {
        let wire = encode_name("esp32-energy");
        assert_eq!(wire.len(), NAME_FRAME_SIZE);

        let (frame, consumed) = decode_frame(&wire).unwrap();
        assert_eq!(consumed, NAME_FRAME_SIZE);
        assert_eq!(frame.message_id, CMD_DEVICE_NAME);
        assert_eq!(frame.payload.len(), NAME_FIELD_SIZE);
        assert_eq!(&frame.payload[..12], b"esp32-energy");
        assert_eq!(&frame.payload[12..], &[0u8; 4]);
    }

    #[test]
    fn name_longer_than_field_is_truncated() {
        let wire = encode_name("a-very-long-device-name-indeed");
        assert_eq!(wire.len(), NAME_FRAME_SIZE);
        assert_eq!(&wire[4..], b"a-very-long-devi");
    }

    #[test]
    fn decode_consumes_exact_catalog_length() {
        let mut wire = encode_query(CMD_CONFIG_SNAPSHOT).to_vec();
        wire.extend_from_slice(&[0xDE, 0xAD]); // trailing garbage

        let (frame, consumed) = decode_frame(&wire).unwrap();
        assert_eq!(consumed, COMMAND_FRAME_SIZE);
        assert_eq!(frame.message_id, CMD_CONFIG_SNAPSHOT);
    }
}
