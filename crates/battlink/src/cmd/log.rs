use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::cmd::{parse_duration, LogArgs};
use crate::exit::{self, CliError, CliResult};
use crate::output::{csv_header, csv_row};

const SLEEP_SLICE: Duration = Duration::from_millis(50);

pub fn run(args: LogArgs) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let mut session = args.connect.open_session()?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        })
        .map_err(|err| {
            CliError::new(exit::INTERNAL, format!("install signal handler: {err}"))
        })?;
    }

    println!("{}", csv_header());

    let mut rows = 0usize;
    while running.load(Ordering::SeqCst) {
        let telemetry = session
            .read_telemetry()
            .map_err(|err| exit::client_error("poll telemetry", err))?;
        println!("{}", csv_row(&telemetry));
        rows += 1;

        if let Some(count) = args.count {
            if rows >= count {
                break;
            }
        }

        // Sleep in slices so Ctrl-C cuts the interval short.
        let deadline = Instant::now() + interval;
        while running.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }

    info!(rows, "logging stopped");
    Ok(exit::SUCCESS)
}
