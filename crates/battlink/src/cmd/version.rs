use crate::cmd::VersionArgs;
use crate::exit::{self, CliResult};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    println!("battlink {}", env!("CARGO_PKG_VERSION"));
    if args.extended {
        let target = option_env!("BATTLINK_BUILD_TARGET").unwrap_or("unknown");
        println!("target: {target}");
    }
    Ok(exit::SUCCESS)
}
