use std::io::IsTerminal;

use battlink_frame::{ConfigSnapshot, Telemetry, WriteAck};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Text,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct TelemetryOutput {
    device_address: u8,
    percentage: u8,
    capacity: f64,
    voltage: u16,
    current: f64,
    charge_energy: u32,
    discharge_energy: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct SnapshotOutput {
    device_address: u8,
    backlight_mode: u8,
    full_battery_voltage: f64,
    low_voltage_alarm: f64,
    high_voltage_alarm: f64,
    over_current_alarm: f64,
    rated_capacity: f64,
    under_battery_voltage: f64,
}

pub fn print_telemetry(telemetry: &Telemetry, format: OutputFormat) {
    let rows = [
        ("device_address", telemetry.device_address.to_string()),
        ("percentage", telemetry.percentage.to_string()),
        ("capacity", telemetry.capacity.to_string()),
        ("voltage", telemetry.voltage.to_string()),
        ("current", telemetry.current.to_string()),
        ("charge_energy", telemetry.charge_energy.to_string()),
        ("discharge_energy", telemetry.discharge_energy.to_string()),
        ("temperature", telemetry.temperature.to_string()),
    ];

    match format {
        OutputFormat::Json => {
            let out = TelemetryOutput {
                device_address: telemetry.device_address,
                percentage: telemetry.percentage,
                capacity: telemetry.capacity,
                voltage: telemetry.voltage,
                current: telemetry.current,
                charge_energy: telemetry.charge_energy,
                discharge_energy: telemetry.discharge_energy,
                temperature: telemetry.temperature,
            };
            print_json(&out);
        }
        OutputFormat::Table => print_table(&rows),
        OutputFormat::Text => print_text(&rows),
    }
}

pub fn print_snapshot(snapshot: &ConfigSnapshot, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SnapshotOutput {
                device_address: snapshot.device_address,
                backlight_mode: snapshot.backlight_mode.as_wire(),
                full_battery_voltage: snapshot.full_battery_voltage,
                low_voltage_alarm: snapshot.low_voltage_alarm,
                high_voltage_alarm: snapshot.high_voltage_alarm,
                over_current_alarm: snapshot.over_current_alarm,
                rated_capacity: snapshot.rated_capacity,
                under_battery_voltage: snapshot.under_battery_voltage,
            };
            print_json(&out);
        }
        OutputFormat::Table | OutputFormat::Text => {
            let backlight = format!(
                "{} ({})",
                snapshot.backlight_mode.as_wire(),
                snapshot.backlight_mode
            );
            let rows = [
                ("device_address", snapshot.device_address.to_string()),
                ("backlight_mode", backlight),
                (
                    "full_battery_voltage",
                    snapshot.full_battery_voltage.to_string(),
                ),
                ("low_voltage_alarm", snapshot.low_voltage_alarm.to_string()),
                ("high_voltage_alarm", snapshot.high_voltage_alarm.to_string()),
                ("over_current_alarm", snapshot.over_current_alarm.to_string()),
                ("rated_capacity", snapshot.rated_capacity.to_string()),
                (
                    "under_battery_voltage",
                    snapshot.under_battery_voltage.to_string(),
                ),
            ];
            if matches!(format, OutputFormat::Table) {
                print_table(&rows);
            } else {
                print_text(&rows);
            }
        }
    }
}

pub fn print_ack(ack: &WriteAck, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                r#"{{"acknowledged_command":{},"device_address":{}}}"#,
                ack.command, ack.device_address
            );
        }
        OutputFormat::Table | OutputFormat::Text => {
            println!("success (command 0x{:02X} acknowledged)", ack.command);
        }
    }
}

/// CSV column order for the logging loop.
pub fn csv_header() -> &'static str {
    "\"device_address\",\"percentage\",\"capacity\",\"voltage\",\"current\",\"charge_energy\",\"discharge_energy\",\"temperature\""
}

pub fn csv_row(telemetry: &Telemetry) -> String {
    format!(
        "{},{},{},{},{},{},{},{}",
        telemetry.device_address,
        telemetry.percentage,
        telemetry.capacity,
        telemetry.voltage,
        telemetry.current,
        telemetry.charge_energy,
        telemetry.discharge_energy,
        telemetry.temperature
    )
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn print_table(rows: &[(&str, String)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["FIELD", "VALUE"]);
    for (name, value) in rows {
        table.add_row(vec![name.to_string(), value.clone()]);
    }
    println!("{table}");
}

fn print_text(rows: &[(&str, String)]) {
    for (name, value) in rows {
        println!("{name}: {value}");
    }
}
