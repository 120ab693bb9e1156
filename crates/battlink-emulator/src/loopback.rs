use std::collections::VecDeque;
use std::time::Duration;

use battlink_transport::{Result, Transport};

use crate::emulator::Emulator;

/// Default chunk size: the 20-byte BLE ATT payload that makes stream
/// resynchronization necessary in the first place.
pub const DEFAULT_MTU: usize = 20;

/// In-memory transport wrapping an [`Emulator`].
///
/// `send` feeds the emulator's inbound-write handler; each `recv` ticks the
/// scheduler once and returns the next frame split into MTU-sized chunks.
/// Creating a `Loopback` counts as a connection, so the emulator front-loads
/// a telemetry report and a snapshot.
#[derive(Debug)]
pub struct Loopback {
    emulator: Emulator,
    chunks: VecDeque<Vec<u8>>,
    mtu: usize,
}

impl Loopback {
    pub fn new(emulator: Emulator) -> Self {
        Self::with_mtu(emulator, DEFAULT_MTU)
    }

    pub fn with_mtu(mut emulator: Emulator, mtu: usize) -> Self {
        emulator.connect();
        Self {
            emulator,
            chunks: VecDeque::new(),
            mtu: mtu.max(1),
        }
    }

    /// The wrapped emulator.
    pub fn emulator(&self) -> &Emulator {
        &self.emulator
    }
}

impl Transport for Loopback {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.emulator.handle_write(frame);
        Ok(())
    }

    fn recv(&mut self, _window: Duration) -> Result<Option<Vec<u8>>> {
        if self.chunks.is_empty() {
            let wire = self.emulator.next_frame();
            for chunk in wire.chunks(self.mtu) {
                self.chunks.push_back(chunk.to_vec());
            }
        }
        Ok(self.chunks.pop_front())
    }
}
