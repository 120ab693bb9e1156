use battlink_frame::ConfigWrite;
use tracing::info;

use crate::cmd::SetArgs;
use crate::exit::{self, CliResult};
use crate::output::{print_ack, OutputFormat};

pub fn run(args: SetArgs, format: OutputFormat) -> CliResult<i32> {
    // Validate the field and value before touching the socket so usage
    // errors never depend on a reachable device.
    let write = ConfigWrite::parse(&args.field, &args.value)
        .map_err(|err| exit::config_error("parse field", err))?;

    let mut session = args.connect.open_session()?;
    let ack = session
        .write_config(&write)
        .map_err(|err| exit::client_error("write config", err))?;

    info!(
        field = %args.field,
        command = format_args!("0x{:02X}", ack.command),
        "write acknowledged"
    );
    print_ack(&ack, format);
    Ok(exit::SUCCESS)
}
