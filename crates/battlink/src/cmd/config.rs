use crate::cmd::ConfigArgs;
use crate::exit::{self, CliResult};
use crate::output::{print_snapshot, OutputFormat};

pub fn run(args: ConfigArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = args.connect.open_session()?;
    let snapshot = session
        .read_config()
        .map_err(|err| exit::client_error("read config", err))?;
    print_snapshot(&snapshot, format);
    Ok(exit::SUCCESS)
}
