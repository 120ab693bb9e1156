use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use battlink_emulator::Emulator;
use battlink_frame::FrameScanner;
use battlink_transport::{SocketListener, SocketTransport, Transport, TransportError};
use tracing::{info, warn};

use crate::cmd::{parse_duration, EmulateArgs};
use crate::exit::{self, CliError, CliResult};

pub fn run(args: EmulateArgs) -> CliResult<i32> {
    let tick = parse_duration(&args.tick)?;
    let listener =
        SocketListener::bind(&args.path).map_err(|err| exit::transport_error("bind", err))?;

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

    // State outlives connections: a controller that reconnects sees the
    // values it wrote last time.
    let mut emulator = Emulator::new();
    info!(path = %args.path.display(), "emulator listening");

    while running.load(Ordering::SeqCst) {
        // Windowed accept keeps Ctrl-C responsive while idle.
        let transport = match listener.accept_within(tick) {
            Ok(Some(transport)) => transport,
            Ok(None) => continue,
            Err(err) => {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                warn!(reason = %err, "accept failed");
                continue;
            }
        };
        serve_connection(&mut emulator, transport, tick, &running);
    }

    info!("emulator stopped");
    Ok(exit::SUCCESS)
}

/// Drive one connection: each tick, drain inbound writes through the
/// scanner, then transmit the next scheduled frame.
fn serve_connection(
    emulator: &mut Emulator,
    mut transport: SocketTransport,
    tick: std::time::Duration,
    running: &AtomicBool,
) {
    emulator.connect();
    let mut scanner = FrameScanner::new();

    while running.load(Ordering::SeqCst) {
        match transport.recv(tick) {
            Ok(Some(chunk)) => {
                scanner.push(&chunk);
                while let Some(frame) = scanner.next_frame() {
                    emulator.handle_frame(&frame);
                }
            }
            Ok(None) => {}
            Err(TransportError::Closed) => {
                info!("controller disconnected");
                return;
            }
            Err(err) => {
                warn!(reason = %err, "connection lost");
                return;
            }
        }

        if let Err(err) = transport.send(&emulator.next_frame()) {
            info!(reason = %err, "controller went away mid-send");
            return;
        }
    }
}
