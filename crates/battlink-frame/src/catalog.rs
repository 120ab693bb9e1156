//! Message catalog: fixed frame lengths and payload layouts per message id.
//!
//! All multi-byte fields are big-endian. Deci-scaled fields carry the
//! physical value multiplied by 10 on the wire; decode divides, encode
//! multiplies and rounds to nearest.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::{
    checksum, Direction, Frame, CMD_DEVICE_NAME, COMMAND_FRAME_SIZE, MAGIC_DEVICE,
    NAME_FRAME_SIZE,
};
use crate::error::{FrameError, Result};

/// Message id of the telemetry report.
pub const MSG_TELEMETRY: u8 = 1;
/// Message id of the configuration snapshot.
pub const MSG_CONFIG_SNAPSHOT: u8 = 2;
/// Lowest device message id carrying a write acknowledgement.
pub const ACK_ID_MIN: u8 = 4;
/// Highest device message id carrying a write acknowledgement.
pub const ACK_ID_MAX: u8 = 16;

/// Total wire length of a telemetry frame.
pub const TELEMETRY_FRAME_SIZE: usize = 21;
/// Total wire length of a configuration snapshot frame.
pub const CONFIG_FRAME_SIZE: usize = 22;
/// Total wire length of a write-acknowledgement frame.
pub const ACK_FRAME_SIZE: usize = 9;

/// Echo bytes the peripheral places in a write acknowledgement.
pub const ACK_ECHO_FILLER: [u8; 4] = [0x00, 0x00, 0x00, 0xA8];

/// Total frame length for a message id, per direction.
///
/// Returns `None` for ids outside the catalog — those frames cannot be
/// length-validated and are treated as unrecognized. Device message id 3 is
/// deliberately absent.
pub fn frame_len(direction: Direction, message_id: u8) -> Option<usize> {
    match direction {
        Direction::ToController => match message_id {
            MSG_TELEMETRY => Some(TELEMETRY_FRAME_SIZE),
            MSG_CONFIG_SNAPSHOT => Some(CONFIG_FRAME_SIZE),
            ACK_ID_MIN..=ACK_ID_MAX => Some(ACK_FRAME_SIZE),
            _ => None,
        },
        Direction::ToDevice => match message_id {
            0x01..=0x0E => Some(COMMAND_FRAME_SIZE),
            CMD_DEVICE_NAME => Some(NAME_FRAME_SIZE),
            _ => None,
        },
    }
}

/// Whether the last byte of the frame is a checksum.
///
/// The controller's name-set frame is the one protocol variant without one.
pub fn has_checksum(direction: Direction, message_id: u8) -> bool {
    !(direction == Direction::ToDevice && message_id == CMD_DEVICE_NAME)
}

fn deci(raw: u16) -> f64 {
    f64::from(raw) / 10.0
}

fn to_deci(value: f64) -> u16 {
    (value * 10.0).round() as u16
}

/// Display backlight behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklightMode {
    NormallyOn,
    NormallyOff,
    Auto,
}

impl BacklightMode {
    /// Decode from the wire byte. Values outside the known set surface as
    /// an error, never coerced.
    pub fn from_wire(value: u8) -> Result<Self> {
        match value {
            0 => Ok(BacklightMode::NormallyOn),
            1 => Ok(BacklightMode::NormallyOff),
            2 => Ok(BacklightMode::Auto),
            other => Err(FrameError::UnrecognizedEnum {
                field: "backlight_mode",
                value: other,
            }),
        }
    }

    /// The wire byte for this mode.
    pub fn as_wire(self) -> u8 {
        match self {
            BacklightMode::NormallyOn => 0,
            BacklightMode::NormallyOff => 1,
            BacklightMode::Auto => 2,
        }
    }
}

impl std::fmt::Display for BacklightMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BacklightMode::NormallyOn => "normally-on",
            BacklightMode::NormallyOff => "normally-off",
            BacklightMode::Auto => "auto",
        };
        f.write_str(name)
    }
}

/// Decoded telemetry report (message id 1).
#[derive(Debug, Clone, PartialEq)]
pub struct Telemetry {
    pub device_address: u8,
    /// State of charge, percent.
    pub percentage: u8,
    /// Remaining capacity, deci-scaled on the wire.
    pub capacity: f64,
    pub voltage: u16,
    /// Current, deci-scaled on the wire.
    pub current: f64,
    /// 32-bit value reconstructed from two 16-bit halves.
    pub charge_energy: u32,
    pub discharge_energy: u32,
    /// Temperature, deci-scaled on the wire.
    pub temperature: f64,
    pub reserved: u8,
}

impl Telemetry {
    /// Decode from a validated telemetry frame.
    pub fn decode(frame: &Frame) -> Result<Self> {
        if frame.message_id != MSG_TELEMETRY {
            return Err(FrameError::UnexpectedMessage {
                expected: MSG_TELEMETRY,
                found: frame.message_id,
            });
        }
        let needed = TELEMETRY_FRAME_SIZE - 5;
        if frame.payload.len() < needed {
            return Err(FrameError::ShortPayload {
                message_id: frame.message_id,
                len: frame.payload.len(),
                needed,
            });
        }

        let mut p = frame.payload.clone();
        let percentage = p.get_u8();
        let capacity = deci(p.get_u16());
        let voltage = p.get_u16();
        let current = deci(p.get_u16());
        let charge_high = p.get_u8();
        let charge_low = p.get_u16();
        let discharge_high = p.get_u8();
        let discharge_low = p.get_u16();
        let temperature = deci(p.get_u16());
        let reserved = p.get_u8();

        Ok(Self {
            device_address: frame.device_address,
            percentage,
            capacity,
            voltage,
            current,
            charge_energy: (u32::from(charge_high) << 16) | u32::from(charge_low),
            discharge_energy: (u32::from(discharge_high) << 16) | u32::from(discharge_low),
            temperature,
            reserved,
        })
    }

    /// Encode as a complete 21-byte wire frame.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(TELEMETRY_FRAME_SIZE);
        buf.put_u16(MAGIC_DEVICE);
        buf.put_u8(self.device_address);
        buf.put_u8(MSG_TELEMETRY);
        buf.put_u8(self.percentage);
        buf.put_u16(to_deci(self.capacity));
        buf.put_u16(self.voltage);
        buf.put_u16(to_deci(self.current));
        buf.put_u8((self.charge_energy >> 16) as u8);
        buf.put_u16((self.charge_energy & 0xFFFF) as u16);
        buf.put_u8((self.discharge_energy >> 16) as u8);
        buf.put_u16((self.discharge_energy & 0xFFFF) as u16);
        buf.put_u16(to_deci(self.temperature));
        buf.put_u8(self.reserved);
        let crc = checksum(&buf);
        buf.put_u8(crc);
        buf.freeze()
    }
}

/// Decoded configuration snapshot (message id 2).
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSnapshot {
    pub device_address: u8,
    pub backlight_mode: BacklightMode,
    pub full_battery_voltage: f64,
    pub low_voltage_alarm: f64,
    pub high_voltage_alarm: f64,
    pub over_current_alarm: f64,
    pub rated_capacity: f64,
    pub under_battery_voltage: f64,
    /// Four reserved bytes carried through unchanged.
    pub reserved: [u8; 4],
}

impl ConfigSnapshot {
    /// Decode from a validated configuration snapshot frame.
    pub fn decode(frame: &Frame) -> Result<Self> {
        if frame.message_id != MSG_CONFIG_SNAPSHOT {
            return Err(FrameError::UnexpectedMessage {
                expected: MSG_CONFIG_SNAPSHOT,
                found: frame.message_id,
            });
        }
        let needed = CONFIG_FRAME_SIZE - 5;
        if frame.payload.len() < needed {
            return Err(FrameError::ShortPayload {
                message_id: frame.message_id,
                len: frame.payload.len(),
                needed,
            });
        }

        let mut p = frame.payload.clone();
        let backlight_mode = BacklightMode::from_wire(p.get_u8())?;
        let full_battery_voltage = deci(p.get_u16());
        let low_voltage_alarm = deci(p.get_u16());
        let high_voltage_alarm = deci(p.get_u16());
        let over_current_alarm = deci(p.get_u16());
        let rated_capacity = deci(p.get_u16());
        let r0 = p.get_u8();
        let r1 = p.get_u8();
        let under_battery_voltage = deci(p.get_u16());
        let r2 = p.get_u8();
        let r3 = p.get_u8();

        Ok(Self {
            device_address: frame.device_address,
            backlight_mode,
            full_battery_voltage,
            low_voltage_alarm,
            high_voltage_alarm,
            over_current_alarm,
            rated_capacity,
            under_battery_voltage,
            reserved: [r0, r1, r2, r3],
        })
    }

    /// Encode as a complete 22-byte wire frame.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(CONFIG_FRAME_SIZE);
        buf.put_u16(MAGIC_DEVICE);
        buf.put_u8(self.device_address);
        buf.put_u8(MSG_CONFIG_SNAPSHOT);
        buf.put_u8(self.backlight_mode.as_wire());
        buf.put_u16(to_deci(self.full_battery_voltage));
        buf.put_u16(to_deci(self.low_voltage_alarm));
        buf.put_u16(to_deci(self.high_voltage_alarm));
        buf.put_u16(to_deci(self.over_current_alarm));
        buf.put_u16(to_deci(self.rated_capacity));
        buf.put_u8(self.reserved[0]);
        buf.put_u8(self.reserved[1]);
        buf.put_u16(to_deci(self.under_battery_voltage));
        buf.put_u8(self.reserved[2]);
        buf.put_u8(self.reserved[3]);
        let crc = checksum(&buf);
        buf.put_u8(crc);
        buf.freeze()
    }
}

/// Decoded write acknowledgement (message ids 4..=16).
///
/// The peripheral echoes the command code as the message id; the controller
/// correlates on that alone and ignores the echo bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAck {
    pub device_address: u8,
    /// The command code being acknowledged.
    pub command: u8,
    pub echo: [u8; 4],
}

impl WriteAck {
    /// Decode from a validated acknowledgement frame.
    pub fn decode(frame: &Frame) -> Result<Self> {
        if !(ACK_ID_MIN..=ACK_ID_MAX).contains(&frame.message_id) {
            return Err(FrameError::UnexpectedMessage {
                expected: ACK_ID_MIN,
                found: frame.message_id,
            });
        }
        let needed = ACK_FRAME_SIZE - 5;
        if frame.payload.len() < needed {
            return Err(FrameError::ShortPayload {
                message_id: frame.message_id,
                len: frame.payload.len(),
                needed,
            });
        }
        let mut echo = [0u8; 4];
        echo.copy_from_slice(&frame.payload[..4]);
        Ok(Self {
            device_address: frame.device_address,
            command: frame.message_id,
            echo,
        })
    }

    /// Encode as a complete 9-byte wire frame.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(ACK_FRAME_SIZE);
        buf.put_u16(MAGIC_DEVICE);
        buf.put_u8(self.device_address);
        buf.put_u8(self.command);
        buf.put_slice(&self.echo);
        let crc = checksum(&buf);
        buf.put_u8(crc);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_frame;

    // Reference vector: address 4, 90%, capacity 300.0, voltage 720,
    // current 10.0, energies 2000, temperature 22.0, reserved 33.
    const TELEMETRY_VECTOR: [u8; 21] = [
        0xB5, 0x5B, 0x04, 0x01, 0x5A, 0x0B, 0xB8, 0x02, 0xD0, 0x00, 0x64, 0x00, 0x07, 0xD0,
        0x00, 0x07, 0xD0, 0x00, 0xDC, 0x21, 0xEC,
    ];

    #[test]
    fn telemetry_reference_vector_decodes() {
        let (frame, consumed) = decode_frame(&TELEMETRY_VECTOR).unwrap();
        assert_eq!(consumed, TELEMETRY_FRAME_SIZE);

        let telemetry = Telemetry::decode(&frame).unwrap();
        assert_eq!(telemetry.device_address, 4);
        assert_eq!(telemetry.percentage, 90);
        assert_eq!(telemetry.capacity, 300.0);
        assert_eq!(telemetry.voltage, 720);
        assert_eq!(telemetry.current, 10.0);
        assert_eq!(telemetry.charge_energy, 2000);
        assert_eq!(telemetry.discharge_energy, 2000);
        assert_eq!(telemetry.temperature, 22.0);
        assert_eq!(telemetry.reserved, 33);
    }

    #[test]
    fn telemetry_roundtrip() {
        let report = Telemetry {
            device_address: 4,
            percentage: 90,
            capacity: 300.0,
            voltage: 720,
            current: 10.0,
            charge_energy: 0x0107D0,
            discharge_energy: 2000,
            temperature: 22.0,
            reserved: 33,
        };

        let wire = report.encode();
        assert_eq!(wire.len(), TELEMETRY_FRAME_SIZE);

        let (frame, _) = decode_frame(&wire).unwrap();
        assert_eq!(Telemetry::decode(&frame).unwrap(), report);
    }

    #[test]
    fn telemetry_encode_matches_reference_vector() {
        let report = Telemetry {
            device_address: 4,
            percentage: 90,
            capacity: 300.0,
            voltage: 720,
            current: 10.0,
            charge_energy: 2000,
            discharge_energy: 2000,
            temperature: 22.0,
            reserved: 33,
        };
        assert_eq!(report.encode().as_ref(), &TELEMETRY_VECTOR);
    }

    #[test]
    fn snapshot_roundtrip() {
        let snapshot = ConfigSnapshot {
            device_address: 4,
            backlight_mode: BacklightMode::Auto,
            full_battery_voltage: 2.0,
            low_voltage_alarm: 10.0,
            high_voltage_alarm: 30.0,
            over_current_alarm: 4.0,
            rated_capacity: 5.0,
            under_battery_voltage: 5.0,
            reserved: [5, 3, 2, 6],
        };

        let wire = snapshot.encode();
        assert_eq!(wire.len(), CONFIG_FRAME_SIZE);

        let (frame, _) = decode_frame(&wire).unwrap();
        assert_eq!(ConfigSnapshot::decode(&frame).unwrap(), snapshot);
    }

    #[test]
    fn snapshot_rejects_unknown_backlight_value() {
        let snapshot = ConfigSnapshot {
            device_address: 4,
            backlight_mode: BacklightMode::NormallyOn,
            full_battery_voltage: 2.0,
            low_voltage_alarm: 10.0,
            high_voltage_alarm: 30.0,
            over_current_alarm: 4.0,
            rated_capacity: 5.0,
            under_battery_voltage: 5.0,
            reserved: [0, 0, 0, 0],
        };
        let mut wire = snapshot.encode().to_vec();
        wire[4] = 7; // out-of-range backlight enumerant
        let end = wire.len() - 1;
        wire[end] = checksum(&wire[..end]);

        let (frame, _) = decode_frame(&wire).unwrap();
        let err = ConfigSnapshot::decode(&frame).unwrap_err();
        assert!(matches!(
            err,
            FrameError::UnrecognizedEnum {
                field: "backlight_mode",
                value: 7
            }
        ));
    }

    #[test]
    fn ack_roundtrip_with_echo_filler() {
        let ack = WriteAck {
            device_address: 4,
            command: 0x0A,
            echo: ACK_ECHO_FILLER,
        };

        let wire = ack.encode();
        assert_eq!(wire.len(), ACK_FRAME_SIZE);

        let (frame, _) = decode_frame(&wire).unwrap();
        assert_eq!(WriteAck::decode(&frame).unwrap(), ack);
    }

    #[test]
    fn telemetry_decode_rejects_other_ids() {
        let ack = WriteAck {
            device_address: 4,
            command: 0x06,
            echo: ACK_ECHO_FILLER,
        };
        let (frame, _) = decode_frame(&ack.encode()).unwrap();
        assert!(matches!(
            Telemetry::decode(&frame),
            Err(FrameError::UnexpectedMessage { expected: 1, .. })
        ));
    }

    #[test]
    fn ack_decode_rejects_report_ids() {
        let (frame, _) = decode_frame(&TELEMETRY_VECTOR).unwrap();
        assert!(matches!(
            WriteAck::decode(&frame),
            Err(FrameError::UnexpectedMessage { found: 1, .. })
        ));
    }

    #[test]
    fn device_message_id_three_is_not_cataloged() {
        assert_eq!(frame_len(Direction::ToController, 3), None);
        assert_eq!(frame_len(Direction::ToController, 4), Some(ACK_FRAME_SIZE));
        assert_eq!(frame_len(Direction::ToDevice, 0x0E), Some(COMMAND_FRAME_SIZE));
        assert_eq!(frame_len(Direction::ToDevice, 0x0F), None);
    }
}
