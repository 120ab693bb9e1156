mod config;
mod emulate;
mod log;
mod read;
mod set;
mod version;

use std::path::PathBuf;
use std::time::Duration;

use battlink_client::{RetryPolicy, Session};
use battlink_transport::SocketTransport;
use clap::{Args, Subcommand};

use crate::exit::{self, CliError, CliResult};
use crate::output::OutputFormat;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read one telemetry report from the device.
    Read(ReadArgs),
    /// Read the device configuration snapshot.
    Config(ConfigArgs),
    /// Write a configuration field and await its acknowledgement.
    Set(SetArgs),
    /// Poll telemetry periodically and emit CSV rows to stdout.
    Log(LogArgs),
    /// Serve a simulated device on a Unix domain socket.
    Emulate(EmulateArgs),
    /// Print version information.
    Version(VersionArgs),
}

/// Connection and retry flags shared by the controller-side commands.
#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Unix domain socket path of the device.
    pub path: PathBuf,

    /// Maximum transmissions per exchange before giving up.
    #[arg(long, value_name = "N", default_value_t = 5)]
    pub max_attempts: u32,

    /// Response polling window per transmission (e.g. 500ms, 2s).
    #[arg(long, value_name = "DURATION", default_value = "1s")]
    pub poll_window: String,
}

impl ConnectArgs {
    fn open_session(&self) -> CliResult<Session<SocketTransport>> {
        let window = parse_duration(&self.poll_window)?;
        let policy = RetryPolicy::default()
            .with_max_attempts(self.max_attempts)
            .with_poll_window(window);
        let transport = SocketTransport::connect(&self.path)
            .map_err(|err| exit::transport_error("connect", err))?;
        Ok(Session::with_policy(transport, policy))
    }
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// Configuration field name (see `battlink set --help` for the list).
    pub field: String,

    /// New value: a number for numeric fields, text for the device name.
    pub value: String,
}

#[derive(Args, Debug)]
pub struct LogArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// Delay between polls (e.g. 500ms, 2s).
    #[arg(long, value_name = "DURATION", default_value = "1s")]
    pub interval: String,

    /// Stop after this many rows; run until interrupted when omitted.
    #[arg(long, value_name = "N")]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct EmulateArgs {
    /// Unix domain socket path to listen on.
    pub path: PathBuf,

    /// Outbound scheduling period (e.g. 200ms).
    #[arg(long, value_name = "DURATION", default_value = "200ms")]
    pub tick: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Include build target details.
    #[arg(long)]
    pub extended: bool,
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Read(args) => read::run(args, format),
        Command::Config(args) => config::run(args, format),
        Command::Set(args) => set::run(args, format),
        Command::Log(args) => log::run(args),
        Command::Emulate(args) => emulate::run(args),
        Command::Version(args) => version::run(args),
    }
}

/// Parse a human duration: bare numbers and `s` suffixes are seconds,
/// `ms` is milliseconds. Zero is rejected.
fn parse_duration(text: &str) -> CliResult<Duration> {
    let trimmed = text.trim();
    let (digits, ms_per_unit) = if let Some(head) = trimmed.strip_suffix("ms") {
        (head, 1u64)
    } else if let Some(head) = trimmed.strip_suffix('s') {
        (head, 1000)
    } else {
        (trimmed, 1000)
    };

    let value: u64 = digits.trim().parse().map_err(|_| {
        CliError::new(
            exit::USAGE,
            format!("invalid duration '{text}': expected forms like 500ms or 2s"),
        )
    })?;
    if value == 0 {
        return Err(CliError::new(
            exit::USAGE,
            format!("invalid duration '{text}': must be positive"),
        ));
    }
    Ok(Duration::from_millis(value * ms_per_unit))
}
