use battlink_frame::catalog::{ConfigSnapshot, Telemetry};
use battlink_frame::BacklightMode;

/// Reserved snapshot bytes observed on real hardware.
const SNAPSHOT_RESERVED: [u8; 4] = [5, 3, 2, 6];
/// Reserved telemetry trailer byte observed on real hardware.
const TELEMETRY_RESERVED: u8 = 33;

/// Every simulated device value: the configuration fields plus the live
/// telemetry readings.
///
/// Owned exclusively by the [`Emulator`](crate::Emulator); mutated only by
/// validated inbound write frames and read by the outgoing-frame scheduler.
/// Deci-scaled fields are held in engineering units and scaled on encode.
#[derive(Debug, Clone)]
pub struct DeviceState {
    pub device_name: String,
    pub device_address: u8,

    // Configuration fields.
    pub backlight_mode: BacklightMode,
    pub calibrating_current: f64,
    pub calibrating_voltage: f64,
    pub full_battery_voltage: f64,
    pub low_voltage_alarm: f64,
    pub high_voltage_alarm: f64,
    pub over_current_alarm: f64,
    pub rated_capacity: f64,
    pub under_battery_voltage: f64,
    pub percentage: u8,

    // Live telemetry values.
    pub voltage: u16,
    pub capacity: f64,
    pub current: f64,
    pub temperature: f64,
    pub charge_energy: u32,
    pub discharge_energy: u32,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            device_name: "battlink-emu".to_string(),
            device_address: 4,
            backlight_mode: BacklightMode::NormallyOn,
            calibrating_current: 0.0,
            calibrating_voltage: 0.0,
            full_battery_voltage: 2.0,
            low_voltage_alarm: 10.0,
            high_voltage_alarm: 30.0,
            over_current_alarm: 4.0,
            rated_capacity: 5.0,
            under_battery_voltage: 5.0,
            percentage: 90,
            voltage: 720,
            capacity: 300.0,
            current: 10.0,
            temperature: 22.0,
            charge_energy: 2000,
            discharge_energy: 2000,
        }
    }
}

impl DeviceState {
    /// Current telemetry report.
    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            device_address: self.device_address,
            percentage: self.percentage,
            capacity: self.capacity,
            voltage: self.voltage,
            current: self.current,
            charge_energy: self.charge_energy,
            discharge_energy: self.discharge_energy,
            temperature: self.temperature,
            reserved: TELEMETRY_RESERVED,
        }
    }

    /// Current configuration snapshot.
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            device_address: self.device_address,
            backlight_mode: self.backlight_mode,
            full_battery_voltage: self.full_battery_voltage,
            low_voltage_alarm: self.low_voltage_alarm,
            high_voltage_alarm: self.high_voltage_alarm,
            over_current_alarm: self.over_current_alarm,
            rated_capacity: self.rated_capacity,
            under_battery_voltage: self.under_battery_voltage,
            reserved: SNAPSHOT_RESERVED,
        }
    }
}
