//! Config field registry: named configuration fields and their wire shapes.
//!
//! Drives encoding for writes; the deci-scaled fields also appear in the
//! configuration snapshot frame decoded by the catalog.

use bytes::Bytes;

use crate::codec::{encode_name, encode_write_byte, encode_write_short};
use crate::error::ConfigError;

/// How a field value is carried in the command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// Single byte, taken verbatim.
    Byte,
    /// Single byte holding the physical value times 10.
    ByteDeci,
    /// Big-endian 16-bit value, taken verbatim.
    Short,
    /// Big-endian 16-bit value holding the physical value times 10.
    ShortDeci,
    /// 16-byte NUL-padded name, checksumless frame variant.
    Name,
}

impl ValueShape {
    fn expected(self) -> &'static str {
        match self {
            ValueShape::Byte => "an integer in 0..=255",
            ValueShape::ByteDeci => "a number in 0.0..=25.5",
            ValueShape::Short => "an integer in 0..=65535",
            ValueShape::ShortDeci => "a number in 0.0..=6553.5",
            ValueShape::Name => "a device name",
        }
    }
}

/// One named configuration field: command code plus value encoding.
#[derive(Debug, Clone, Copy)]
pub struct ConfigField {
    pub name: &'static str,
    pub command: u8,
    pub shape: ValueShape,
}

/// Every configuration field the peripheral understands.
pub const FIELDS: &[ConfigField] = &[
    ConfigField { name: "calibrating_current", command: 0x04, shape: ValueShape::ShortDeci },
    ConfigField { name: "calibrating_voltage", command: 0x05, shape: ValueShape::ShortDeci },
    ConfigField { name: "full_battery_voltage", command: 0x06, shape: ValueShape::ShortDeci },
    ConfigField { name: "low_voltage_alarm", command: 0x07, shape: ValueShape::ShortDeci },
    ConfigField { name: "high_voltage_alarm", command: 0x08, shape: ValueShape::ShortDeci },
    ConfigField { name: "over_current_alarm", command: 0x09, shape: ValueShape::ShortDeci },
    ConfigField { name: "rated_capacity", command: 0x0A, shape: ValueShape::ShortDeci },
    ConfigField { name: "percentage", command: 0x0B, shape: ValueShape::Byte },
    ConfigField { name: "device_address", command: 0x0C, shape: ValueShape::Byte },
    ConfigField { name: "backlight_mode", command: 0x0D, shape: ValueShape::Byte },
    ConfigField { name: "under_battery_voltage", command: 0x0E, shape: ValueShape::ShortDeci },
    ConfigField { name: "device_name", command: 0x10, shape: ValueShape::Name },
];

/// Look up a field by name.
pub fn lookup(name: &str) -> Result<&'static ConfigField, ConfigError> {
    FIELDS
        .iter()
        .find(|field| field.name == name)
        .ok_or_else(|| ConfigError::UnknownField {
            name: name.to_string(),
            known: known_field_names(),
        })
}

/// Comma-separated list of every registered field name.
pub fn known_field_names() -> String {
    FIELDS
        .iter()
        .map(|field| field.name)
        .collect::<Vec<_>>()
        .join(",")
}

/// A validated field value, ready to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteValue {
    Byte(u8),
    Short(u16),
    Name(String),
}

/// A fully prepared configuration write: field plus converted value.
#[derive(Debug, Clone)]
pub struct ConfigWrite {
    pub field: &'static ConfigField,
    pub value: WriteValue,
}

impl ConfigWrite {
    /// Parse a caller-supplied value for the named field.
    ///
    /// An unknown field name and a malformed value are distinct errors; the
    /// former reports the set of known names.
    pub fn parse(field_name: &str, value_text: &str) -> Result<Self, ConfigError> {
        let field = lookup(field_name)?;
        let invalid = || ConfigError::InvalidValue {
            field: field.name,
            value: value_text.to_string(),
            expected: field.shape.expected(),
        };

        let value = match field.shape {
            ValueShape::Byte => {
                let v: u8 = value_text.trim().parse().map_err(|_| invalid())?;
                WriteValue::Byte(v)
            }
            ValueShape::Short => {
                let v: u16 = value_text.trim().parse().map_err(|_| invalid())?;
                WriteValue::Short(v)
            }
            ValueShape::ByteDeci => {
                let v: f64 = value_text.trim().parse().map_err(|_| invalid())?;
                let scaled = (v * 10.0).round();
                if !(0.0..=255.0).contains(&scaled) {
                    return Err(invalid());
                }
                WriteValue::Byte(scaled as u8)
            }
            ValueShape::ShortDeci => {
                let v: f64 = value_text.trim().parse().map_err(|_| invalid())?;
                let scaled = (v * 10.0).round();
                if !(0.0..=65535.0).contains(&scaled) {
                    return Err(invalid());
                }
                WriteValue::Short(scaled as u16)
            }
            ValueShape::Name => {
                if value_text.is_empty() {
                    return Err(invalid());
                }
                WriteValue::Name(value_text.to_string())
            }
        };

        Ok(Self { field, value })
    }

    /// The command code this write is issued (and acknowledged) under.
    pub fn command(&self) -> u8 {
        self.field.command
    }

    /// Encode the complete wire frame for this write.
    pub fn encode(&self) -> Bytes {
        match &self.value {
            WriteValue::Byte(v) => encode_write_byte(self.field.command, *v),
            WriteValue::Short(v) => encode_write_short(self.field.command, *v),
            WriteValue::Name(name) => encode_name(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{COMMAND_FRAME_SIZE, NAME_FRAME_SIZE};

    #[test]
    fn full_battery_voltage_encodes_deci_scaled() {
        let write = ConfigWrite::parse("full_battery_voltage", "20.0").unwrap();
        assert_eq!(write.command(), 0x06);
        assert_eq!(write.value, WriteValue::Short(200));

        let wire = write.encode();
        assert_eq!(wire.len(), COMMAND_FRAME_SIZE);
        assert_eq!(&wire[4..6], &[0x00, 0xC8]);
    }

    #[test]
    fn deci_rounds_to_nearest() {
        let write = ConfigWrite::parse("rated_capacity", "5.06").unwrap();
        assert_eq!(write.value, WriteValue::Short(51));
    }

    #[test]
    fn byte_field_parses_integer() {
        let write = ConfigWrite::parse("percentage", "85").unwrap();
        assert_eq!(write.command(), 0x0B);
        assert_eq!(write.value, WriteValue::Byte(85));
    }

    #[test]
    fn unknown_field_reports_known_names() {
        let err = ConfigWrite::parse("blink_rate", "1").unwrap_err();
        match err {
            ConfigError::UnknownField { name, known } => {
                assert_eq!(name, "blink_rate");
                assert!(known.contains("full_battery_voltage"));
                assert!(known.contains("device_name"));
            }
            other => panic!("expected UnknownField, got {other:?}"),
        }
    }

    #[test]
    fn malformed_value_is_distinct_from_unknown_field() {
        let err = ConfigWrite::parse("percentage", "many").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "percentage", .. }));

        let err = ConfigWrite::parse("low_voltage_alarm", "-3.0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn name_write_uses_checksumless_frame() {
        let write = ConfigWrite::parse("device_name", "bench-battery").unwrap();
        assert_eq!(write.command(), 0x10);
        assert_eq!(write.encode().len(), NAME_FRAME_SIZE);
    }

    #[test]
    fn registry_names_are_unique() {
        for (i, a) in FIELDS.iter().enumerate() {
            for b in &FIELDS[i + 1..] {
                assert_ne!(a.name, b.name);
                assert_ne!(a.command, b.command);
            }
        }
    }
}
