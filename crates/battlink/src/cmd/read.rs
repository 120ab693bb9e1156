use crate::cmd::ReadArgs;
use crate::exit::{self, CliResult};
use crate::output::{print_telemetry, OutputFormat};

pub fn run(args: ReadArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = args.connect.open_session()?;
    let telemetry = session
        .read_telemetry()
        .map_err(|err| exit::client_error("read telemetry", err))?;
    print_telemetry(&telemetry, format);
    Ok(exit::SUCCESS)
}
