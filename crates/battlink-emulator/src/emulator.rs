use std::collections::VecDeque;

use battlink_frame::{
    decode_frame, BacklightMode, Direction, Frame, CMD_CONFIG_SNAPSHOT, CMD_DEVICE_NAME,
    CMD_TELEMETRY, NAME_FIELD_SIZE,
};
use battlink_frame::catalog::ACK_ECHO_FILLER;
use battlink_frame::WriteAck;
use bytes::Bytes;
use tracing::{debug, info, trace, warn};

use crate::state::DeviceState;

/// A pending outbound message, in queue order.
///
/// The queue is explicit and tagged; when it is empty the scheduler
/// defaults to telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outbound {
    Telemetry,
    ConfigSnapshot,
    WriteAck(u8),
}

/// The peripheral state machine.
///
/// One producer context (the inbound-write handler) fills the outbound
/// queue; one consumer context (the periodic scheduler, owned by the
/// caller) drains it via [`next_frame`](Self::next_frame).
#[derive(Debug, Default)]
pub struct Emulator {
    state: DeviceState,
    queue: VecDeque<Outbound>,
}

impl Emulator {
    /// Emulator with reference default state.
    pub fn new() -> Self {
        Self::with_state(DeviceState::default())
    }

    /// Emulator with explicit initial state.
    pub fn with_state(state: DeviceState) -> Self {
        Self {
            state,
            queue: VecDeque::new(),
        }
    }

    /// Mark a (re)connection: eagerly enqueue a telemetry report and a
    /// configuration snapshot so the controller's first poll sees both.
    pub fn connect(&mut self) {
        info!(name = %self.state.device_name, "controller connected");
        self.queue.push_back(Outbound::Telemetry);
        self.queue.push_back(Outbound::ConfigSnapshot);
    }

    /// Process one inbound write from the controller.
    ///
    /// Invalid frames (bad magic, unknown id, bad checksum) are logged and
    /// dropped — they never mutate state. A valid configuration write
    /// mutates the matching field and enqueues its echo acknowledgement
    /// plus a fresh snapshot, so the controller's next poll always sees
    /// updated state.
    pub fn handle_write(&mut self, bytes: &[u8]) {
        match decode_frame(bytes) {
            Ok((frame, _consumed)) => {
                trace!(id = frame.message_id, data = %hex::encode(bytes), "write accepted");
                self.handle_frame(&frame);
            }
            Err(err) => {
                warn!(reason = %err, data = %hex::encode(bytes), "dropping invalid write");
            }
        }
    }

    /// Process an already validated frame (for callers that run their own
    /// scanner over the inbound stream).
    pub fn handle_frame(&mut self, frame: &Frame) {
        if frame.direction != Direction::ToDevice {
            warn!(id = frame.message_id, "dropping frame with device-side magic");
            return;
        }

        match frame.message_id {
            CMD_TELEMETRY => self.queue.push_back(Outbound::Telemetry),
            CMD_CONFIG_SNAPSHOT => self.queue.push_back(Outbound::ConfigSnapshot),
            CMD_DEVICE_NAME => {
                self.set_name(&frame);
                self.queue.push_back(Outbound::WriteAck(CMD_DEVICE_NAME));
            }
            cmd @ 0x04..=0x0E => {
                self.apply_write(cmd, &frame);
                self.queue.push_back(Outbound::WriteAck(cmd));
                self.queue.push_back(Outbound::ConfigSnapshot);
            }
            other => {
                // 0x03 is sent by some display firmware but is absent from
                // every response catalog; echoing it would be unvalidatable.
                debug!(id = other, "ignoring uncatalogued command");
            }
        }
    }

    /// Scheduler hook: encode the oldest pending message, or a telemetry
    /// report when the queue is empty. The periodic clock belongs to the
    /// caller.
    pub fn next_frame(&mut self) -> Bytes {
        let outbound = self.queue.pop_front().unwrap_or(Outbound::Telemetry);
        match outbound {
            Outbound::Telemetry => self.state.telemetry().encode(),
            Outbound::ConfigSnapshot => self.state.snapshot().encode(),
            Outbound::WriteAck(command) => WriteAck {
                device_address: self.state.device_address,
                command,
                echo: ACK_ECHO_FILLER,
            }
            .encode(),
        }
    }

    /// The simulated device state.
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Number of queued outbound messages.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn apply_write(&mut self, cmd: u8, frame: &Frame) {
        let byte_val = frame.payload[0];
        let short_val = u16::from_be_bytes([frame.payload[0], frame.payload[1]]);
        let deci = f64::from(short_val) / 10.0;

        match cmd {
            0x04 => {
                self.state.calibrating_current = deci;
                info!(value = deci, "calibrating current");
            }
            0x05 => {
                self.state.calibrating_voltage = deci;
                info!(value = deci, "calibrating voltage");
            }
            0x06 => {
                self.state.full_battery_voltage = deci;
                info!(value = deci, "full battery voltage");
            }
            0x07 => {
                self.state.low_voltage_alarm = deci;
                info!(value = deci, "low voltage alarm");
            }
            0x08 => {
                self.state.high_voltage_alarm = deci;
                info!(value = deci, "high voltage alarm");
            }
            0x09 => {
                self.state.over_current_alarm = deci;
                info!(value = deci, "over current alarm");
            }
            0x0A => {
                self.state.rated_capacity = deci;
                info!(value = deci, "rated capacity");
            }
            0x0B => {
                self.state.percentage = byte_val;
                info!(value = byte_val, "percentage");
            }
            0x0C => {
                self.state.device_address = byte_val;
                info!(value = byte_val, "device address");
            }
            0x0D => match BacklightMode::from_wire(byte_val) {
                Ok(mode) => {
                    self.state.backlight_mode = mode;
                    info!(%mode, "backlight mode");
                }
                Err(err) => warn!(reason = %err, "backlight write left state unchanged"),
            },
            0x0E => {
                self.state.under_battery_voltage = deci;
                info!(value = deci, "under battery voltage");
            }
            _ => unreachable!("caller matched 0x04..=0x0E"),
        }
    }

    /// Name frames carry a variable-length name: scan the 16-byte window
    /// for a terminating NUL rather than trusting the full field width.
    fn set_name(&mut self, frame: &Frame) {
        let window = &frame.payload[..frame.payload.len().min(NAME_FIELD_SIZE)];
        let end = window.iter().position(|&b| b == 0).unwrap_or(window.len());
        self.state.device_name = String::from_utf8_lossy(&window[..end]).into_owned();
        info!(name = %self.state.device_name, "device name");
    }
}

#[cfg(test)]
mod tests {
    use battlink_frame::catalog::{ConfigSnapshot, Telemetry};
    use battlink_frame::{
        encode_name, encode_query, encode_write_byte, encode_write_short, BacklightMode,
    };

    use super::*;

    #[test]
    fn connect_enqueues_telemetry_then_snapshot() {
        let mut emulator = Emulator::new();
        emulator.connect();
        assert_eq!(emulator.pending(), 2);

        let first = emulator.next_frame();
        let second = emulator.next_frame();
        assert_eq!(first[3], 1);
        assert_eq!(second[3], 2);
    }

    #[test]
    fn empty_queue_defaults_to_telemetry() {
        let mut emulator = Emulator::new();
        assert_eq!(emulator.pending(), 0);

        let wire = emulator.next_frame();
        let (frame, _) = decode_frame(&wire).unwrap();
        let telemetry = Telemetry::decode(&frame).unwrap();
        assert_eq!(telemetry.percentage, 90);
    }

    #[test]
    fn invalid_checksum_never_mutates_state() {
        let mut emulator = Emulator::new();
        let mut wire = encode_write_short(0x06, 200).to_vec();
        let last = wire.len() - 1;
        wire[last] = wire[last].wrapping_add(1);

        emulator.handle_write(&wire);

        assert_eq!(emulator.state().full_battery_voltage, 2.0);
        assert_eq!(emulator.pending(), 0);
    }

    #[test]
    fn config_write_mutates_and_enqueues_ack_plus_snapshot() {
        let mut emulator = Emulator::new();
        emulator.handle_write(&encode_write_short(0x06, 200));

        assert_eq!(emulator.state().full_battery_voltage, 20.0);
        assert_eq!(emulator.pending(), 2);

        let ack_wire = emulator.next_frame();
        let (ack_frame, _) = decode_frame(&ack_wire).unwrap();
        let ack = WriteAck::decode(&ack_frame).unwrap();
        assert_eq!(ack.command, 0x06);
        assert_eq!(ack.echo, ACK_ECHO_FILLER);

        let snap_wire = emulator.next_frame();
        let (snap_frame, _) = decode_frame(&snap_wire).unwrap();
        let snapshot = ConfigSnapshot::decode(&snap_frame).unwrap();
        assert_eq!(snapshot.full_battery_voltage, 20.0);
    }

    #[test]
    fn byte_write_updates_percentage() {
        let mut emulator = Emulator::new();
        emulator.handle_write(&encode_write_byte(0x0B, 55));
        assert_eq!(emulator.state().percentage, 55);
    }

    #[test]
    fn backlight_write_accepts_known_modes_only() {
        let mut emulator = Emulator::new();
        emulator.handle_write(&encode_write_byte(0x0D, 2));
        assert_eq!(emulator.state().backlight_mode, BacklightMode::Auto);

        emulator.handle_write(&encode_write_byte(0x0D, 9));
        assert_eq!(emulator.state().backlight_mode, BacklightMode::Auto);
    }

    #[test]
    fn query_commands_enqueue_reports() {
        let mut emulator = Emulator::new();
        emulator.handle_write(&encode_query(CMD_TELEMETRY));
        emulator.handle_write(&encode_query(CMD_CONFIG_SNAPSHOT));
        assert_eq!(emulator.pending(), 2);
    }

    #[test]
    fn uncatalogued_command_is_ignored() {
        let mut emulator = Emulator::new();
        emulator.handle_write(&encode_query(0x03));
        assert_eq!(emulator.pending(), 0);
    }

    #[test]
    fn name_write_scans_for_nul_within_window() {
        let mut emulator = Emulator::new();
        emulator.handle_write(&encode_name("bench-7"));

        assert_eq!(emulator.state().device_name, "bench-7");
        assert_eq!(emulator.pending(), 1);

        let ack_wire = emulator.next_frame();
        let (frame, _) = decode_frame(&ack_wire).unwrap();
        assert_eq!(frame.message_id, CMD_DEVICE_NAME);
    }

    #[test]
    fn sixteen_byte_name_has_no_terminator() {
        let mut emulator = Emulator::new();
        emulator.handle_write(&encode_name("exactly-16-bytes"));
        assert_eq!(emulator.state().device_name, "exactly-16-bytes");
    }

    #[test]
    fn device_side_magic_is_dropped() {
        let mut emulator = Emulator::new();
        let wire = Emulator::new().next_frame(); // a telemetry frame
        emulator.handle_write(&wire);
        assert_eq!(emulator.pending(), 0);
    }
}
